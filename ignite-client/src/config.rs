//! Client configuration types and builders.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use ignite_core::protocol::{DEFAULT_HOST, DEFAULT_PORT};
use ignite_core::ProtocolVersion;

/// Default connection timeout.
const DEFAULT_CONNECTION_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration error returned when validation fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    message: String,
}

impl ConfigError {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "configuration error: {}", self.message)
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for ignite_core::IgniteError {
    fn from(e: ConfigError) -> Self {
        ignite_core::IgniteError::Configuration(e.message)
    }
}

/// Host and port of one cluster node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeAddress {
    host: String,
    port: u16,
}

impl NodeAddress {
    /// Creates an address.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Host name or IP literal.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// TCP port.
    pub fn port(&self) -> u16 {
        self.port
    }
}

impl Default for NodeAddress {
    fn default() -> Self {
        Self::new(DEFAULT_HOST, DEFAULT_PORT)
    }
}

impl fmt::Display for NodeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

impl FromStr for NodeAddress {
    type Err = ConfigError;

    /// Parses `host:port`, `[v6]:port` or a bare host (default port).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ConfigError::new("address must not be empty"));
        }

        let (host, port) = if let Some(rest) = s.strip_prefix('[') {
            let (host, tail) = rest
                .split_once(']')
                .ok_or_else(|| ConfigError::new(format!("unterminated IPv6 literal: {s}")))?;
            match tail.strip_prefix(':') {
                Some(port) => (host, Some(port)),
                None if tail.is_empty() => (host, None),
                None => return Err(ConfigError::new(format!("invalid address: {s}"))),
            }
        } else {
            match s.rsplit_once(':') {
                Some((host, port)) if !host.contains(':') => (host, Some(port)),
                _ => (s, None),
            }
        };

        if host.is_empty() {
            return Err(ConfigError::new(format!("missing host in address: {s}")));
        }
        let port = match port {
            Some(p) => p
                .parse::<u16>()
                .map_err(|_| ConfigError::new(format!("invalid port in address: {s}")))?,
            None => DEFAULT_PORT,
        };
        Ok(Self::new(host, port))
    }
}

/// Network configuration for cluster connections.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    addresses: Vec<NodeAddress>,
    connection_timeout: Duration,
    partition_aware: bool,
}

impl NetworkConfig {
    /// Returns the configured node addresses, in failover order.
    pub fn addresses(&self) -> &[NodeAddress] {
        &self.addresses
    }

    /// Returns the bound on a single connect attempt, handshake included.
    pub fn connection_timeout(&self) -> Duration {
        self.connection_timeout
    }

    /// Returns `true` if requests are spread over every node instead of one.
    pub fn partition_aware(&self) -> bool {
        self.partition_aware
    }
}

/// Builder for `NetworkConfig`.
#[derive(Debug, Clone, Default)]
pub struct NetworkConfigBuilder {
    addresses: Vec<NodeAddress>,
    connection_timeout: Option<Duration>,
    partition_aware: Option<bool>,
}

impl NetworkConfigBuilder {
    /// Creates a new network configuration builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node address.
    pub fn add_address(mut self, address: NodeAddress) -> Self {
        self.addresses.push(address);
        self
    }

    /// Sets the node addresses.
    pub fn addresses(mut self, addresses: impl IntoIterator<Item = NodeAddress>) -> Self {
        self.addresses = addresses.into_iter().collect();
        self
    }

    /// Sets the connection timeout.
    pub fn connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = Some(timeout);
        self
    }

    /// Enables or disables partition-aware node selection.
    pub fn partition_aware(mut self, enabled: bool) -> Self {
        self.partition_aware = Some(enabled);
        self
    }

    /// Builds the network configuration, returning an error if validation fails.
    pub fn build(self) -> Result<NetworkConfig, ConfigError> {
        let addresses = if self.addresses.is_empty() {
            vec![NodeAddress::default()]
        } else {
            self.addresses
        };

        if let Some(bad) = addresses.iter().find(|a| a.port == 0) {
            return Err(ConfigError::new(format!("port must not be zero: {bad}")));
        }

        let connection_timeout = self
            .connection_timeout
            .unwrap_or(DEFAULT_CONNECTION_TIMEOUT);
        if connection_timeout.is_zero() {
            return Err(ConfigError::new("connection_timeout must be positive"));
        }

        Ok(NetworkConfig {
            addresses,
            connection_timeout,
            partition_aware: self.partition_aware.unwrap_or(false),
        })
    }
}

/// Security configuration for authentication.
#[derive(Debug, Clone, Default)]
pub struct SecurityConfig {
    username: Option<String>,
    password: Option<String>,
}

impl SecurityConfig {
    /// Returns the configured username.
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Returns the configured password.
    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    /// Returns true if username/password credentials are configured.
    pub fn has_credentials(&self) -> bool {
        self.username.is_some() && self.password.is_some()
    }
}

/// Builder for `SecurityConfig`.
#[derive(Debug, Clone, Default)]
pub struct SecurityConfigBuilder {
    username: Option<String>,
    password: Option<String>,
}

impl SecurityConfigBuilder {
    /// Creates a new security configuration builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the username for authentication.
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Sets the password for authentication.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Sets both username and password for authentication.
    pub fn credentials(self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username(username).password(password)
    }

    /// Builds the security configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if only one of `username` or `password` is set.
    pub fn build(self) -> Result<SecurityConfig, ConfigError> {
        if self.username.is_some() != self.password.is_some() {
            return Err(ConfigError::new(
                "both username and password must be provided together",
            ));
        }

        Ok(SecurityConfig {
            username: self.username,
            password: self.password,
        })
    }
}

/// Main client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    network: NetworkConfig,
    security: SecurityConfig,
    protocol_version: ProtocolVersion,
}

impl ClientConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::new()
    }

    /// Returns the network configuration.
    pub fn network(&self) -> &NetworkConfig {
        &self.network
    }

    /// Returns the security configuration.
    pub fn security(&self) -> &SecurityConfig {
        &self.security
    }

    /// Returns the protocol version offered first in the handshake.
    pub fn protocol_version(&self) -> ProtocolVersion {
        self.protocol_version
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            network: NetworkConfig {
                addresses: vec![NodeAddress::default()],
                connection_timeout: DEFAULT_CONNECTION_TIMEOUT,
                partition_aware: false,
            },
            security: SecurityConfig::default(),
            protocol_version: ProtocolVersion::LATEST,
        }
    }
}

/// Builder for `ClientConfig`.
#[derive(Debug, Clone, Default)]
pub struct ClientConfigBuilder {
    network: NetworkConfigBuilder,
    security: SecurityConfigBuilder,
    protocol_version: Option<ProtocolVersion>,
}

impl ClientConfigBuilder {
    /// Creates a new client configuration builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures network settings using a builder function.
    pub fn network<F>(mut self, f: F) -> Self
    where
        F: FnOnce(NetworkConfigBuilder) -> NetworkConfigBuilder,
    {
        self.network = f(self.network);
        self
    }

    /// Configures security settings using a builder function.
    pub fn security<F>(mut self, f: F) -> Self
    where
        F: FnOnce(SecurityConfigBuilder) -> SecurityConfigBuilder,
    {
        self.security = f(self.security);
        self
    }

    /// Adds a node address.
    pub fn add_address(mut self, address: NodeAddress) -> Self {
        self.network = self.network.add_address(address);
        self
    }

    /// Sets the node addresses.
    pub fn addresses(mut self, addresses: impl IntoIterator<Item = NodeAddress>) -> Self {
        self.network = self.network.addresses(addresses);
        self
    }

    /// Sets the connection timeout.
    pub fn connection_timeout(mut self, timeout: Duration) -> Self {
        self.network = self.network.connection_timeout(timeout);
        self
    }

    /// Enables or disables partition-aware node selection.
    pub fn partition_aware(mut self, enabled: bool) -> Self {
        self.network = self.network.partition_aware(enabled);
        self
    }

    /// Sets credentials for authentication.
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.security = self.security.credentials(username, password);
        self
    }

    /// Sets the protocol version offered first in the handshake.
    pub fn protocol_version(mut self, version: ProtocolVersion) -> Self {
        self.protocol_version = Some(version);
        self
    }

    /// Builds the client configuration, returning an error if validation fails.
    pub fn build(self) -> Result<ClientConfig, ConfigError> {
        let protocol_version = self.protocol_version.unwrap_or(ProtocolVersion::LATEST);
        if protocol_version < ProtocolVersion::V1_2_0 {
            return Err(ConfigError::new(format!(
                "protocol version {protocol_version} is older than the minimum {}",
                ProtocolVersion::V1_2_0
            )));
        }

        Ok(ClientConfig {
            network: self.network.build()?,
            security: self.security.build()?,
            protocol_version,
        })
    }
}
