//! Engine configuration.
//!
//! Settings are layered with `figment`, later layers overriding earlier ones:
//!
//! 1. Built-in defaults ([`EngineConfig::default`])
//! 2. A TOML file (`spotgraph.toml` unless another path is given)
//! 3. Environment variables prefixed with `SPOTGRAPH_`, using `__` for
//!    nesting (e.g. `SPOTGRAPH_UNDO__CAPACITY=5000`)
//!
//! ```toml
//! [pool]
//! vertex_chunk = 4096
//! edge_chunk = 4096
//!
//! [undo]
//! capacity = 1000
//!
//! [logging]
//! level = "spotgraph_core=debug"
//! ```

use std::path::Path;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::journal::DEFAULT_UNDO_CAPACITY;
use crate::pool::DEFAULT_CHUNK_RECORDS;

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "spotgraph.toml";

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "SPOTGRAPH_";

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A provider failed or a value has the wrong type.
    #[error("failed to load configuration: {0}")]
    Load(Box<figment::Error>),

    /// A value is out of range.
    #[error("invalid configuration: {0}")]
    Invalid(String),

    /// The configuration could not be rendered as TOML.
    #[error("failed to render configuration: {0}")]
    Render(#[from] toml::ser::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        ConfigError::Load(Box::new(err))
    }
}

/// Record pool sizing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Vertex records added per growth step.
    pub vertex_chunk: usize,
    /// Edge records added per growth step.
    pub edge_chunk: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            vertex_chunk: DEFAULT_CHUNK_RECORDS,
            edge_chunk: DEFAULT_CHUNK_RECORDS,
        }
    }
}

/// Undo journal settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UndoConfig {
    /// Maximum number of edits kept before the oldest is evicted.
    pub capacity: usize,
}

impl Default for UndoConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_UNDO_CAPACITY,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `info` or `spotgraph_core=debug`.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl LoggingConfig {
    /// Installs a global `tracing` subscriber using this filter.
    ///
    /// Returns `false` if a subscriber was already installed. An unparsable
    /// directive falls back to `info`.
    pub fn init(&self) -> bool {
        use tracing_subscriber::layer::SubscriberExt;
        use tracing_subscriber::util::SubscriberInitExt;

        let filter = tracing_subscriber::EnvFilter::try_new(&self.level)
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init()
            .is_ok()
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Record pool sizing.
    pub pool: PoolConfig,
    /// Undo journal settings.
    pub undo: UndoConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

impl EngineConfig {
    /// Loads configuration from `spotgraph.toml` and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Path::new(DEFAULT_CONFIG_FILE))
    }

    /// Loads configuration from the given TOML file and the environment.
    ///
    /// A missing file is not an error; defaults and environment still apply.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let config: Self = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;
        config.validate()?;
        tracing::debug!(?config, "configuration loaded");
        Ok(config)
    }

    /// Parses configuration from a TOML string layered over the defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::string(source))
            .extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pool.vertex_chunk == 0 {
            return Err(ConfigError::Invalid(
                "pool.vertex_chunk must be greater than 0".to_string(),
            ));
        }
        if self.pool.edge_chunk == 0 {
            return Err(ConfigError::Invalid(
                "pool.edge_chunk must be greater than 0".to_string(),
            ));
        }
        if self.undo.capacity == 0 {
            return Err(ConfigError::Invalid(
                "undo.capacity must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Renders the configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}
