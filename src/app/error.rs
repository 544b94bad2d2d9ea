use thiserror::Error;

#[derive(Error, Debug)]
pub enum HarvestError {
    #[error("No results found for '{0}'")]
    NoResultsFound(String),

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("A search is already running. Wait for it to finish.")]
    JobAlreadyRunning,

    #[error("No search is running")]
    NoJobRunning,

    #[error("Invalid search request: {0}")]
    InvalidRequest(String),

    #[error("No results available for export")]
    NoResults,

    #[error("Search cancelled")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("{0}")]
    Other(String),
}

impl HarvestError {
    /// Shorthand used when wrapping chromiumoxide failures.
    pub fn browser(context: &str, err: impl std::fmt::Display) -> Self {
        Self::Browser(format!("{}: {}", context, err))
    }
}

pub type Result<T> = std::result::Result<T, HarvestError>;
