//! Node configuration, loaded from TOML.

use std::path::Path;

use rawtx_script::{Network, StandardAddressCodec};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::logging::LogFormat;

/// Default admission fee cap: 0.1 coin.
pub const DEFAULT_MAX_TX_FEE: u64 = 10_000_000;

/// Configuration for the raw transaction service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Address and key prefixes in use.
    #[serde(default)]
    pub network: Network,

    /// Highest fee, in base units, a submitted transaction may pay unless
    /// high fees are explicitly allowed.
    #[serde(default = "default_max_tx_fee")]
    pub max_tx_fee: u64,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,
}

fn default_max_tx_fee() -> u64 {
    DEFAULT_MAX_TX_FEE
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            network: Network::default(),
            max_tx_fee: default_max_tx_fee(),
            logging: LoggingConfig::default(),
        }
    }
}

impl NodeConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Address codec for the configured network.
    pub fn address_codec(&self) -> StandardAddressCodec {
        StandardAddressCodec::new(self.network)
    }

    /// WIF version byte for the configured network.
    pub fn secret_key_prefix(&self) -> u8 {
        self.network.params().secret_key_prefix
    }
}
