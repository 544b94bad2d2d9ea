use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::app::{HarvestError, Result};

pub const DEFAULT_MAX_RESULTS: usize = 50;

/// Parameters of one search job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchParams {
    pub category: String,
    pub location: String,
    pub max_results: usize,
}

impl SearchParams {
    /// Validate the raw request fields.
    ///
    /// Category and location must be non-blank. A missing, unparseable or
    /// non-positive `max_results` falls back to [`DEFAULT_MAX_RESULTS`].
    pub fn new(
        category: Option<&str>,
        location: Option<&str>,
        max_results: Option<&str>,
    ) -> Result<Self> {
        let category = category.map(str::trim).unwrap_or_default();
        let location = location.map(str::trim).unwrap_or_default();

        if category.is_empty() || location.is_empty() {
            return Err(HarvestError::InvalidRequest(
                "category and location are required".to_string(),
            ));
        }

        Ok(Self {
            category: category.to_string(),
            location: location.to_string(),
            max_results: parse_max_results(max_results),
        })
    }

    /// Free-text query typed into the search box.
    ///
    /// `template` may reference `{category}` and `{location}`.
    pub fn query(&self, template: &str) -> String {
        template
            .replace("{category}", &self.category)
            .replace("{location}", &self.location)
    }
}

fn parse_max_results(raw: Option<&str>) -> usize {
    match raw.map(str::trim).map(str::parse::<i64>) {
        Some(Ok(n)) if n > 0 => n as usize,
        Some(_) => {
            tracing::warn!(
                "Invalid max_results {:?}, using default {}",
                raw,
                DEFAULT_MAX_RESULTS
            );
            DEFAULT_MAX_RESULTS
        }
        None => DEFAULT_MAX_RESULTS,
    }
}

/// Snapshot of the current (or last) job, as exposed to status readers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobStatus {
    pub is_running: bool,
    pub progress: u8,
    pub message: String,
    pub error: Option<String>,
    pub total_found: usize,
    pub unique_results: usize,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl JobStatus {
    pub fn started(now: DateTime<Utc>) -> Self {
        Self {
            is_running: true,
            message: "Starting search...".to_string(),
            started_at: Some(now),
            ..Default::default()
        }
    }
}
