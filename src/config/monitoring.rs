use std::env;
use std::fs;

use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MonitoringConfig {
    /// Constant `hostname` label attached to every exported series
    #[serde(default = "default_hostname")]
    pub hostname: String,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            hostname: default_hostname(),
        }
    }
}

impl MonitoringConfig {
    /// Validates monitoring configuration
    /// # Errors
    /// Returns `Error::InvalidConfig` when the hostname label is blank
    pub fn validate(&self) -> Result<()> {
        if self.hostname.trim().is_empty() {
            return Err(Error::InvalidConfig(
                "monitoring.hostname cannot be empty".into(),
            ));
        }
        Ok(())
    }
}

fn default_hostname() -> String {
    env::var("HOSTNAME")
        .ok()
        .or_else(|| fs::read_to_string("/etc/hostname").ok())
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}
