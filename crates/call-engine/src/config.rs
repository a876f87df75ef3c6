use std::net::SocketAddr;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::agent;
use crate::error::{CallCenterError, Result};

/// Port the server listens on unless configured otherwise
pub const DEFAULT_PORT: u16 = 5678;

/// Call center configuration
///
/// # Configuration Sections
///
/// - [`dispatcher`]: roster size
/// - [`server`]: TCP gateway addresses and the dispatcher mailbox size
/// - [`logging`]: log level and output format
///
/// Every field has a default, so a TOML file only needs the values it changes:
///
/// ```
/// use switchboard_call_engine::CallCenterConfig;
///
/// let config = CallCenterConfig::from_toml_str("[dispatcher]\nnum_operators = 5\n").unwrap();
/// assert_eq!(config.dispatcher.num_operators, 5);
/// assert_eq!(config.server.bind_addr.port(), 5678);
/// ```
///
/// [`dispatcher`]: CallCenterConfig::dispatcher
/// [`server`]: CallCenterConfig::server
/// [`logging`]: CallCenterConfig::logging
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CallCenterConfig {
    pub dispatcher: DispatcherConfig,
    pub server: ServerConfig,
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Number of operators, 1 through 26; fixed for the process lifetime
    pub num_operators: usize,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self { num_operators: 2 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address `serve` listens on
    pub bind_addr: SocketAddr,
    /// Address `connect` dials
    pub connect_addr: SocketAddr,
    /// Dispatcher mailbox size
    pub channel_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            connect_addr: SocketAddr::from(([127, 0, 0, 1], DEFAULT_PORT)),
            channel_capacity: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl CallCenterConfig {
    /// Load and validate a TOML configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            CallCenterError::configuration(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)
            .map_err(|e| CallCenterError::configuration(format!("invalid config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        agent::validate_operator_count(self.dispatcher.num_operators)?;
        if self.server.channel_capacity == 0 {
            return Err(CallCenterError::configuration(
                "server.channel_capacity must be at least 1",
            ));
        }
        crate::logging::parse_log_level(&self.logging.level)?;
        Ok(())
    }
}
