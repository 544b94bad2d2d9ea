use std::path::PathBuf;
use std::sync::Arc;

use crate::app::error::{HarvestError, Result};
use crate::config::Config;
use crate::scraper::{DriverFactory, JobManager};

pub struct AppContext {
    pub config: Config,
    pub jobs: Arc<JobManager>,
}

impl AppContext {
    /// Load the config (default path unless `config_path` is given) and
    /// build a job manager that launches Chrome.
    pub fn new(config_path: Option<PathBuf>) -> Result<Self> {
        let config = match config_path {
            Some(p) => Config::load_from(&p),
            None => Config::load(),
        }
        .map_err(|e| HarvestError::Config(e.to_string()))?;

        Ok(Self::with_config(config))
    }

    pub fn with_config(config: Config) -> Self {
        let jobs = Arc::new(JobManager::new(config.harvest_settings()));
        Self { config, jobs }
    }

    pub fn with_factory(config: Config, factory: Arc<dyn DriverFactory>) -> Self {
        let jobs = Arc::new(JobManager::with_factory(config.harvest_settings(), factory));
        Self { config, jobs }
    }
}
