//! Configuration for tat-daemon

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tat_engine::EngineConfig;
use tat_types::TatResult;

/// Main daemon configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DaemonConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub engine: EngineSettings,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address
    pub listen_addr: SocketAddr,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub enable_cors: bool,

    /// Maximum request body size in bytes
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            enable_cors: true,
            max_body_size: default_max_body_size(),
        }
    }
}

/// Where the engine's catalogs come from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSettings {
    /// JSON engine configuration; the built-in workflows when unset
    #[serde(default)]
    pub catalogs: Option<String>,

    /// Attach configured collaborators on stage entry
    #[serde(default = "default_true")]
    pub auto_collaborators: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            catalogs: None,
            auto_collaborators: true,
        }
    }
}

impl EngineSettings {
    /// Resolve the engine configuration these settings point at.
    pub fn engine_config(&self) -> TatResult<EngineConfig> {
        let config = match &self.catalogs {
            Some(path) => EngineConfig::from_path(path)?,
            None => EngineConfig::default(),
        };
        Ok(if self.auto_collaborators {
            config
        } else {
            config.without_collaborator_rules()
        })
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_max_body_size() -> usize {
    1024 * 1024
}

fn default_log_level() -> String {
    "info".to_string()
}

impl DaemonConfig {
    /// Layer defaults, an optional file and `TAT_`-prefixed environment
    /// variables (`TAT_SERVER__LISTEN_ADDR`, `TAT_ENGINE__CATALOGS`, ...).
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        builder = builder.add_source(config::Config::try_from(&DaemonConfig::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("TAT")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }
}
