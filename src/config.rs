// Configuration - layered files + environment
//
// config/default.toml -> config/{RUN_MODE}.toml -> LIBRARY_* env vars.
// Every file is optional; missing keys fall back to the defaults below.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite file, or `:memory:`
    pub path: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load from `./config` and the environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Path::new("config"))
    }

    pub fn load_from(dir: &Path) -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let config = Config::builder()
            .add_source(File::from(dir.join("default")).required(false))
            .add_source(File::from(dir.join(&run_mode)).required(false))
            // LIBRARY_DATABASE_PATH, LIBRARY_SERVER_PORT, ...
            .add_source(
                Environment::with_prefix("LIBRARY")
                    .separator("_")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "library.db".to_string(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 7070,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}
