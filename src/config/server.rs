use serde::{Deserialize, Serialize};

pub const DEFAULT_BIND: &str = "0.0.0.0:5000";

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the API listens on
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
        }
    }
}

impl ServerConfig {
    /// Effective listen address.
    ///
    /// An explicit `--bind` wins; otherwise a valid `PORT` replaces the
    /// port of the configured address.
    pub fn resolve_bind(&self, cli_bind: Option<&str>, port_env: Option<&str>) -> String {
        if let Some(bind) = cli_bind {
            return bind.to_string();
        }
        match port_env.map(str::trim).map(str::parse::<u16>) {
            Some(Ok(port)) => {
                let host = self
                    .bind
                    .rsplit_once(':')
                    .map(|(host, _)| host)
                    .unwrap_or(self.bind.as_str());
                format!("{}:{}", host, port)
            }
            Some(Err(_)) => {
                tracing::warn!("Ignoring invalid PORT value {:?}", port_env);
                self.bind.clone()
            }
            None => self.bind.clone(),
        }
    }
}
