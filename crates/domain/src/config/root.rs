use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

use super::errors::ConfigError;
use super::logging::LoggingConfig;
use super::nftables::{is_valid_identifier, NftablesConfig};
use super::server::ServerConfig;
use crate::{SetKeyType, TableFamily};

/// Main configuration structure for Ferrous NftSet
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// DNS listener and upstream
    #[serde(default)]
    pub server: ServerConfig,

    /// Packet filter mirroring
    #[serde(default)]
    pub nftables: NftablesConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from file or use defaults
    ///
    /// Priority order:
    /// 1. Explicitly provided path
    /// 2. ferrous-nftset.toml in current directory
    /// 3. /etc/ferrous-nftset/config.toml
    /// 4. Default configuration
    pub fn load(path: Option<&str>, cli_overrides: CliOverrides) -> Result<Self, ConfigError> {
        let mut config = match path.map(str::to_string).or_else(Self::get_config_path) {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };

        config.apply_cli_overrides(cli_overrides);
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.to_string(), e.to_string()))?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    fn apply_cli_overrides(&mut self, overrides: CliOverrides) {
        if let Some(port) = overrides.dns_port {
            self.server.dns_port = port;
        }
        if let Some(bind) = overrides.bind_address {
            self.server.bind_address = bind;
        }
        if let Some(upstream) = overrides.upstream {
            self.server.upstream = upstream;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
        if let Some(async_mode) = overrides.async_mode {
            self.nftables.async_mode = async_mode;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.dns_port == 0 {
            return Err(ConfigError::Validation("DNS port cannot be 0".to_string()));
        }

        if self.server.listen_address().is_err() {
            return Err(ConfigError::Validation(format!(
                "Bind address '{}' is not an ip address",
                self.server.bind_address
            )));
        }

        if self.server.upstream.parse::<SocketAddr>().is_err() {
            return Err(ConfigError::Validation(format!(
                "Upstream '{}' is not an ip:port address",
                self.server.upstream
            )));
        }

        if self.server.query_timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "server.query_timeout_ms must be greater than 0".to_string(),
            ));
        }

        if self.nftables.connection_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "nftables.connection_timeout_secs must be greater than 0".to_string(),
            ));
        }

        for rule in &self.nftables.rules {
            for name in [&rule.table, &rule.set] {
                if !is_valid_identifier(name) {
                    return Err(ConfigError::Validation(format!(
                        "Invalid nftables identifier '{}'",
                        name
                    )));
                }
            }

            let key_type = rule.effective_key_type();
            let mismatched = matches!(
                (rule.family, key_type),
                (TableFamily::Ip, SetKeyType::Ipv6Addr) | (TableFamily::Ip6, SetKeyType::Ipv4Addr)
            );
            if mismatched {
                return Err(ConfigError::Validation(format!(
                    "Set {} {} {}: key type {} does not fit the table family",
                    rule.family,
                    rule.table,
                    rule.set,
                    key_type.as_str()
                )));
            }

            if matches!(rule.family, TableFamily::Arp | TableFamily::Netdev) {
                return Err(ConfigError::Validation(format!(
                    "Table family {} never receives resolved addresses",
                    rule.family
                )));
            }
        }

        Ok(())
    }

    /// Get the path to the configuration file being used
    pub fn get_config_path() -> Option<String> {
        if std::path::Path::new("ferrous-nftset.toml").exists() {
            Some("ferrous-nftset.toml".to_string())
        } else if std::path::Path::new("/etc/ferrous-nftset/config.toml").exists() {
            Some("/etc/ferrous-nftset/config.toml".to_string())
        } else {
            None
        }
    }
}

/// Command-line overrides for configuration
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub dns_port: Option<u16>,
    pub bind_address: Option<String>,
    pub upstream: Option<String>,
    pub log_level: Option<String>,
    pub async_mode: Option<bool>,
}
