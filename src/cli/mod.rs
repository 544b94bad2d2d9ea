pub mod commands;

use clap::{Parser, Subcommand};

use crate::domain::DEFAULT_MAX_RESULTS;

#[derive(Parser)]
#[command(name = "placeharvest")]
#[command(about = "Harvest business listings from a map search", long_about = None)]
pub struct Cli {
    /// Config file to use instead of ~/.config/placeharvest/config.toml
    #[arg(short, long, global = true)]
    pub config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API
    Serve {
        /// Listen address (default: config, PORT env overrides the port)
        #[arg(short, long)]
        bind: Option<String>,
    },
    /// Run one search in the foreground and export the results
    Search {
        /// Kind of business, e.g. "bakery"
        category: String,
        /// Where to search, e.g. "Lisbon"
        location: String,

        /// Maximum number of unique listings
        #[arg(short = 'n', long, default_value_t = DEFAULT_MAX_RESULTS)]
        max_results: usize,

        /// Output format: txt, csv or json
        #[arg(short, long, default_value = "json")]
        format: String,

        /// Output file (default: results_<timestamp>.<ext> in the current directory)
        #[arg(short, long)]
        output: Option<std::path::PathBuf>,

        /// Show the browser window
        #[arg(long)]
        headed: bool,
    },
    /// Show the config file location
    Config {
        /// Print the effective configuration
        #[arg(long)]
        show: bool,
    },
}
