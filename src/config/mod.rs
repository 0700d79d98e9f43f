//! Configuration management for the PAC relay server.
//!
//! Settings are merged from several sources, later sources winning:
//! 1. Default values (hardcoded)
//! 2. `config/default.toml`
//! 3. File named by `CONFIG_PATH`
//! 4. `config/local.toml`
//! 5. Environment variables with the `PAC__` prefix (highest priority)
//!

mod log;
mod monitoring;
mod server;
pub use log::*;
pub use monitoring::*;
pub use server::*;


//---
use std::env;

use config::Config;
use config::Environment;
use config::File;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Settings {
    /// HTTP listener and upload limits
    #[serde(default)]
    pub server: ServerConfig,
    /// Prometheus labels
    #[serde(default)]
    pub monitoring: MonitoringConfig,
    /// Log filter
    #[serde(default)]
    pub log: LogConfig,
}

impl Settings {
    /// Load settings, picking the override file up from `CONFIG_PATH`.
    pub fn load() -> Result<Self> {
        let path = env::var("CONFIG_PATH").ok();
        Self::load_from(path.as_deref())
    }

    /// Load settings with an explicit override file.
    ///
    /// # Arguments
    /// * `override_path` - Optional TOML file merged on top of `config/default`
    pub fn load_from(override_path: Option<&str>) -> Result<Self> {
        let mut config = Config::builder()
            .add_source(File::with_name("config/default").required(false));

        if let Some(path) = override_path {
            config = config.add_source(File::with_name(path).required(true));
        }

        config = config.add_source(File::with_name("config/local").required(false));

        config = config.add_source(
            Environment::with_prefix("PAC")
                .separator("__")
                .ignore_empty(true)
                .try_parsing(true),
        );

        let settings: Settings = config.build()?.try_deserialize().map_err(Error::Config)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validates every section
    /// # Errors
    /// Returns `Error::InvalidConfig` for the first rule a section violates
    pub fn validate(&self) -> Result<()> {
        self.server.validate()?;
        self.monitoring.validate()?;
        self.log.validate()?;
        Ok(())
    }
}
