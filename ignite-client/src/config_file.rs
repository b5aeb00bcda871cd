//! Declarative configuration loading from YAML, TOML, and environment variables.
//!
//! [`FileConfig`] mirrors [`ClientConfig`](crate::config::ClientConfig) with
//! serde-friendly types and converts into it through the builder API.
//!
//! # Supported Formats
//!
//! - **YAML** (requires `config-file` feature): `ClientConfig::from_yaml("ignite.yaml")`
//! - **TOML** (requires `config-file` feature): `ClientConfig::from_toml("ignite.toml")`
//! - **Environment Variables** (always available): `ClientConfig::from_env()`
//!
//! # Example YAML
//!
//! ```yaml
//! protocol-version: "1.7.0"
//! network:
//!   addresses:
//!     - "10.0.0.1:10800"
//!     - "10.0.0.2"
//!   connection-timeout-ms: 10000
//!   partition-aware: true
//! security:
//!   username: ignite
//!   password: ignite
//! ```

use std::time::Duration;

use ignite_core::ProtocolVersion;
use serde::{Deserialize, Serialize};

use crate::config::{ClientConfig, ClientConfigBuilder, ConfigError, NodeAddress};

/// Top-level file-based configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case", default)]
pub struct FileConfig {
    /// Protocol version offered first, as `major.minor.patch`.
    pub protocol_version: Option<String>,
    /// Network configuration.
    pub network: Option<FileNetworkConfig>,
    /// Credentials.
    pub security: Option<FileSecurityConfig>,
}

/// File-based network configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case", default)]
pub struct FileNetworkConfig {
    /// Node addresses; a missing port means 10800.
    pub addresses: Option<Vec<String>>,
    /// Connection timeout in milliseconds.
    pub connection_timeout_ms: Option<u64>,
    /// Whether to spread requests over all nodes.
    pub partition_aware: Option<bool>,
}

/// File-based security configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case", default)]
pub struct FileSecurityConfig {
    /// Username.
    pub username: Option<String>,
    /// Password.
    pub password: Option<String>,
}

fn parse_protocol_version(s: &str) -> Result<ProtocolVersion, ConfigError> {
    let parts = s
        .trim()
        .split('.')
        .map(|p| p.parse::<i16>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| ConfigError::new(format!("invalid protocol version: {s}")))?;
    match parts.as_slice() {
        [major, minor, patch] => Ok(ProtocolVersion::new(*major, *minor, *patch)),
        [major, minor] => Ok(ProtocolVersion::new(*major, *minor, 0)),
        _ => Err(ConfigError::new(format!("invalid protocol version: {s}"))),
    }
}

impl TryFrom<FileConfig> for ClientConfig {
    type Error = ConfigError;

    fn try_from(file: FileConfig) -> Result<Self, Self::Error> {
        let mut builder = ClientConfigBuilder::new();

        if let Some(version) = file.protocol_version {
            builder = builder.protocol_version(parse_protocol_version(&version)?);
        }

        if let Some(net) = file.network {
            if let Some(addrs) = net.addresses {
                let addresses = addrs
                    .iter()
                    .map(|a| a.parse::<NodeAddress>())
                    .collect::<Result<Vec<_>, _>>()?;
                builder = builder.addresses(addresses);
            }

            if let Some(timeout_ms) = net.connection_timeout_ms {
                builder = builder.connection_timeout(Duration::from_millis(timeout_ms));
            }

            if let Some(enabled) = net.partition_aware {
                builder = builder.partition_aware(enabled);
            }
        }

        if let Some(sec) = file.security {
            builder = builder.security(|mut s| {
                if let Some(u) = sec.username {
                    s = s.username(u);
                }
                if let Some(p) = sec.password {
                    s = s.password(p);
                }
                s
            });
        }

        builder.build()
    }
}

impl ClientConfig {
    /// Loads configuration from a YAML file.
    ///
    /// Requires the `config-file` feature.
    #[cfg(feature = "config-file")]
    pub fn from_yaml<P: AsRef<std::path::Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ConfigError::new(format!("failed to read YAML config file: {e}"))
        })?;
        let file_config: FileConfig = serde_yaml::from_str(&content).map_err(|e| {
            ConfigError::new(format!("failed to parse YAML config: {e}"))
        })?;
        file_config.try_into()
    }

    /// Loads configuration from a TOML file.
    ///
    /// Requires the `config-file` feature.
    #[cfg(feature = "config-file")]
    pub fn from_toml<P: AsRef<std::path::Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ConfigError::new(format!("failed to read TOML config file: {e}"))
        })?;
        let file_config: FileConfig = toml_crate::from_str(&content).map_err(|e| {
            ConfigError::new(format!("failed to parse TOML config: {e}"))
        })?;
        file_config.try_into()
    }

    /// Loads configuration from environment variables.
    ///
    /// | Variable | Maps to |
    /// |----------|---------|
    /// | `IGNITE_ADDRESSES` | Comma-separated addresses (e.g., `10.0.0.1:10800,10.0.0.2`) |
    /// | `IGNITE_CONNECTION_TIMEOUT_MS` | Connection timeout in milliseconds |
    /// | `IGNITE_PARTITION_AWARE` | `"true"` or `"false"` |
    /// | `IGNITE_PROTOCOL_VERSION` | e.g. `1.7.0` |
    /// | `IGNITE_USERNAME` / `IGNITE_PASSWORD` | Credentials |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_vars<F>(var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut file_config = FileConfig::default();

        if let Some(val) = var("IGNITE_ADDRESSES") {
            file_config.network.get_or_insert_with(Default::default).addresses = Some(
                val.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            );
        }

        if let Some(val) = var("IGNITE_CONNECTION_TIMEOUT_MS") {
            let ms = val.parse::<u64>().map_err(|_| {
                ConfigError::new(format!("IGNITE_CONNECTION_TIMEOUT_MS is not a number: {val}"))
            })?;
            file_config.network.get_or_insert_with(Default::default).connection_timeout_ms =
                Some(ms);
        }

        if let Some(val) = var("IGNITE_PARTITION_AWARE") {
            file_config
                .network
                .get_or_insert_with(Default::default)
                .partition_aware = Some(val.eq_ignore_ascii_case("true"));
        }

        if let Some(val) = var("IGNITE_PROTOCOL_VERSION") {
            file_config.protocol_version = Some(val);
        }

        if let Some(val) = var("IGNITE_USERNAME") {
            file_config.security.get_or_insert_with(Default::default).username = Some(val);
        }

        if let Some(val) = var("IGNITE_PASSWORD") {
            file_config.security.get_or_insert_with(Default::default).password = Some(val);
        }

        file_config.try_into()
    }
}

/// Loads a configuration file, detecting the format by extension.
///
/// Supports `.yaml`, `.yml`, and `.toml` extensions.
/// Requires the `config-file` feature.
#[cfg(feature = "config-file")]
pub fn load_config<P: AsRef<std::path::Path>>(path: P) -> Result<ClientConfig, ConfigError> {
    let path = path.as_ref();
    match path.extension().and_then(|e| e.to_str()) {
        Some("yaml" | "yml") => ClientConfig::from_yaml(path),
        Some("toml") => ClientConfig::from_toml(path),
        Some(ext) => Err(ConfigError::new(format!(
            "unsupported config file extension: .{ext} (expected .yaml, .yml, or .toml)"
        ))),
        None => Err(ConfigError::new(
            "config file has no extension; expected .yaml, .yml, or .toml",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_file_config_defaults_produce_valid_client_config() {
        let config: ClientConfig = FileConfig::default().try_into().unwrap();
        assert_eq!(config.network().addresses(), &[NodeAddress::default()]);
    }

    #[test]
    fn test_file_config_with_network() {
        let file_config = FileConfig {
            network: Some(FileNetworkConfig {
                addresses: Some(vec!["127.0.0.1:10801".to_string(), "node-b".to_string()]),
                connection_timeout_ms: Some(10_000),
                partition_aware: Some(true),
            }),
            ..Default::default()
        };
        let config: ClientConfig = file_config.try_into().unwrap();
        assert_eq!(
            config.network().addresses(),
            &[
                NodeAddress::new("127.0.0.1", 10801),
                NodeAddress::new("node-b", 10800)
            ]
        );
        assert_eq!(config.network().connection_timeout(), Duration::from_secs(10));
        assert!(config.network().partition_aware());
    }

    #[test]
    fn test_file_config_bad_address_fails() {
        let file_config = FileConfig {
            network: Some(FileNetworkConfig {
                addresses: Some(vec!["host:port".to_string()]),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(ClientConfig::try_from(file_config).is_err());
    }

    #[test]
    fn test_file_config_protocol_version() {
        let file_config = FileConfig {
            protocol_version: Some("1.4.0".to_string()),
            ..Default::default()
        };
        let config: ClientConfig = file_config.try_into().unwrap();
        assert_eq!(config.protocol_version(), ProtocolVersion::V1_4_0);

        assert!(parse_protocol_version("1.x.0").is_err());
        assert!(parse_protocol_version("1").is_err());
        assert_eq!(
            parse_protocol_version("1.6").unwrap(),
            ProtocolVersion::new(1, 6, 0)
        );
    }

    #[test]
    fn test_file_config_half_credentials_fail() {
        let file_config = FileConfig {
            security: Some(FileSecurityConfig {
                username: Some("ignite".to_string()),
                password: None,
            }),
            ..Default::default()
        };
        assert!(ClientConfig::try_from(file_config).is_err());
    }

    #[test]
    fn test_from_vars() {
        let vars: HashMap<&str, &str> = [
            ("IGNITE_ADDRESSES", "10.0.0.1:10800, 10.0.0.2"),
            ("IGNITE_CONNECTION_TIMEOUT_MS", "1500"),
            ("IGNITE_PARTITION_AWARE", "TRUE"),
            ("IGNITE_USERNAME", "ignite"),
            ("IGNITE_PASSWORD", "secret"),
        ]
        .into_iter()
        .collect();
        let config =
            ClientConfig::from_vars(|k| vars.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(config.network().addresses().len(), 2);
        assert_eq!(config.network().addresses()[1], NodeAddress::new("10.0.0.2", 10800));
        assert_eq!(config.network().connection_timeout(), Duration::from_millis(1500));
        assert!(config.network().partition_aware());
        assert_eq!(config.security().password(), Some("secret"));
    }

    #[test]
    fn test_from_vars_bad_timeout() {
        let result = ClientConfig::from_vars(|k| {
            (k == "IGNITE_CONNECTION_TIMEOUT_MS").then(|| "soon".to_string())
        });
        assert!(result.is_err());
    }

    #[cfg(feature = "config-file")]
    #[test]
    fn test_yaml_parse() {
        let yaml = "
protocol-version: 1.4.0
network:
  addresses: [\"10.0.0.1:10800\"]
  partition-aware: true
";
        let parsed: FileConfig = serde_yaml::from_str(yaml).unwrap();
        let config: ClientConfig = parsed.try_into().unwrap();
        assert!(config.network().partition_aware());
        assert_eq!(config.protocol_version(), ProtocolVersion::V1_4_0);
    }

    #[cfg(feature = "config-file")]
    #[test]
    fn test_toml_round_trip() {
        let file_config = FileConfig {
            network: Some(FileNetworkConfig {
                connection_timeout_ms: Some(750),
                ..Default::default()
            }),
            ..Default::default()
        };
        let toml_str = toml_crate::to_string(&file_config).unwrap();
        let parsed: FileConfig = toml_crate::from_str(&toml_str).unwrap();
        assert_eq!(
            parsed.network.and_then(|n| n.connection_timeout_ms),
            Some(750)
        );
    }

    #[cfg(feature = "config-file")]
    #[test]
    fn test_load_config_rejects_unknown_extension() {
        assert!(load_config("ignite.json").is_err());
    }
}
