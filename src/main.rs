use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use placeharvest::app::AppContext;
use placeharvest::cli::commands::{self, SearchOptions};
use placeharvest::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("placeharvest=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Config { show } => {
            commands::show_config(cli.config.as_deref(), show)?;
        }
        Commands::Serve { bind } => {
            let ctx = AppContext::new(cli.config)?;
            commands::serve(&ctx, bind.as_deref()).await?;
        }
        Commands::Search {
            category,
            location,
            max_results,
            format,
            output,
            headed,
        } => {
            let ctx = AppContext::new(cli.config)?;
            commands::search(
                &ctx,
                SearchOptions {
                    category,
                    location,
                    max_results,
                    format,
                    output,
                    headed,
                },
            )
            .await?;
        }
    }

    Ok(())
}
