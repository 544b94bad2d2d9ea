//! Configuration management for placeharvest.
//!
//! Configuration is read from `~/.config/placeharvest/config.toml` at startup.
//! If the file doesn't exist, a default configuration with comments is created.

pub mod server;

pub use server::ServerConfig;

use crate::scraper::{HarvestSettings, ScraperConfig, SelectorConfig, ServiceKeywords};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Main configuration struct.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub scraper: ScraperConfig,
    pub selectors: SelectorConfig,
    pub keywords: ServiceKeywords,
    pub server: ServerConfig,
}

impl Config {
    /// Load configuration from the default path.
    ///
    /// If the config file doesn't exist, creates a default one with comments.
    /// If the config file exists but is invalid, returns an error.
    /// Missing fields in the config file will use default values.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::default_config_path()?;
        Self::load_from(&config_path)
    }

    /// Same as [`Config::load`] for an explicit path.
    pub fn load_from(config_path: &Path) -> Result<Self, ConfigError> {
        if !config_path.exists() {
            Self::create_default_config(config_path)?;
            tracing::info!("Created default config at {}", config_path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(config_path).map_err(|e| ConfigError::Io {
            path: config_path.to_path_buf(),
            source: e,
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: config_path.to_path_buf(),
            source: e,
        })?;

        Ok(config)
    }

    /// Get the default config file path: `~/.config/placeharvest/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("placeharvest").join("config.toml"))
    }

    /// Scraper, selector and keyword sections bundled for one harvest.
    pub fn harvest_settings(&self) -> HarvestSettings {
        HarvestSettings {
            scraper: self.scraper.clone(),
            selectors: self.selectors.clone(),
            keywords: self.keywords.clone(),
        }
    }

    /// Effective configuration rendered back to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Create a default config file with comments.
    fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let default_config = Self::default_config_content();

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        file.write_all(default_config.as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;

        Ok(())
    }

    /// Generate the default config file content with comments.
    fn default_config_content() -> String {
        r##"# placeharvest configuration
#
# Every key is optional; anything left out falls back to the built-in default.
#
# Queries starting with "/" or "(" are XPath, anything else is a CSS selector.
# Each field lists queries in priority order; the first one yielding text wins.

[scraper]
# Run browser in headless mode (no visible window)
headless = true

# Page the search starts from
base_url = "https://www.google.com/maps"

# Text typed into the search box
query_template = "{category} em {location}"

# Navigation timeout in seconds
navigation_timeout_secs = 60

# Wait after opening the base page (milliseconds)
initial_load_wait_ms = 5000

# How long to wait for the first results (seconds)
results_timeout_secs = 45

# How long to wait for a listing's name to appear (seconds)
detail_timeout_secs = 15

# Settle delay after each scroll, pause between scrolls (milliseconds)
scroll_settle_ms = 3000
scroll_pause_ms = 500

# Settle delay after opening a listing, pause between listings (milliseconds)
detail_settle_ms = 2500
item_pause_ms = 500

# Polling interval while waiting for elements (milliseconds)
poll_interval_ms = 250

# Stop scrolling after this many attempts
max_scroll_attempts = 100

# Stop scrolling after this many scrolls in a row reveal nothing new
max_no_new_results_streak = 5

[selectors]
search_input = ["#searchboxinput", 'input[name="q"]']
results_ready = [
    '//div[contains(@aria-label, "Resultados para")]',
    '//div[contains(@aria-label, "Results for")]',
    '//a[contains(@href, "https://www.google.com/maps/place")]',
]
feed_container = [
    '//div[contains(@aria-label, "Resultados para")]/..//div[@role="feed"]',
    'div[role="feed"]',
]
candidate_links = ['//a[contains(@href, "https://www.google.com/maps/place")]']
candidate_href_marker = "/maps/place"
name = [
    '//h1[contains(@class, "DUwDvf")]',
    '//h1[contains(@class, "fontHeadlineLarge")]',
]
review_block = ['//div[contains(@class, "F7nice")]']
service_info = [
    '//div[contains(@class, "LTs0Rc")]',
    '//div[contains(@class, "iP2t7d")]',
]

[keywords]
# Case-insensitive substrings that switch on each service flag
store_shopping = ["compra", "shop"]
in_store_pickup = ["retira", "pickup"]
delivery = ["entrega", "delivery"]

[server]
# Address the HTTP API listens on; the PORT environment variable overrides the port
bind = "0.0.0.0:5000"
"##
        .to_string()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Failed to render config: {0}")]
    Serialize(#[from] toml::ser::Error),
}
