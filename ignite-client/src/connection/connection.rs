//! Single connection to an Ignite node.

use std::time::Duration;

use bytes::{Bytes, BytesMut};
use ignite_core::protocol::{HandshakeRequest, HandshakeResponse, MessageCodec, Request, Response};
use ignite_core::{IgniteError, ProtocolVersion, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_util::codec::{Decoder, Encoder};
use uuid::Uuid;

use crate::config::{ClientConfig, NodeAddress};

/// Settings for opening a connection: offered version, credentials and
/// the bound on connect plus handshake.
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    version: ProtocolVersion,
    credentials: Option<(String, String)>,
    timeout: Duration,
}

impl ConnectOptions {
    /// Anonymous options offering `version`, with a 5 second timeout.
    pub fn new(version: ProtocolVersion) -> Self {
        Self {
            version,
            credentials: None,
            timeout: Duration::from_secs(5),
        }
    }

    /// Takes version, credentials and timeout from a client configuration.
    pub fn from_config(config: &ClientConfig) -> Self {
        let mut options = Self::new(config.protocol_version())
            .with_timeout(config.network().connection_timeout());
        if let (Some(user), Some(pass)) = (config.security().username(), config.security().password()) {
            options = options.with_credentials(user, pass);
        }
        options
    }

    /// Sets credentials sent in the handshake.
    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.credentials = Some((username.into(), password.into()));
        self
    }

    /// Sets the connect timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Version offered first.
    pub fn version(&self) -> ProtocolVersion {
        self.version
    }

    /// Connect timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn handshake_request(&self, version: ProtocolVersion) -> HandshakeRequest {
        let request = HandshakeRequest::new(version);
        match &self.credentials {
            Some((user, pass)) => request.with_credentials(user.clone(), pass.clone()),
            None => request,
        }
    }
}

/// A handshaken connection to a single Ignite node.
///
/// Requests are strictly sequential: one request is written, then its
/// response is read before anything else is sent.
#[derive(Debug)]
pub struct Connection {
    address: NodeAddress,
    stream: TcpStream,
    codec: MessageCodec,
    read_buffer: BytesMut,
    version: ProtocolVersion,
    node_uuid: Option<Uuid>,
}

impl Connection {
    fn new(stream: TcpStream, address: NodeAddress, version: ProtocolVersion) -> Self {
        Self {
            address,
            stream,
            codec: MessageCodec::new(),
            read_buffer: BytesMut::with_capacity(8192),
            version,
            node_uuid: None,
        }
    }

    /// Returns the remote address of this connection.
    pub fn address(&self) -> &NodeAddress {
        &self.address
    }

    /// Returns the negotiated protocol version.
    pub fn version(&self) -> ProtocolVersion {
        self.version
    }

    /// Returns the node id reported in the handshake (protocol 1.4.0 and later).
    pub fn node_uuid(&self) -> Option<Uuid> {
        self.node_uuid
    }

    /// Connects and handshakes, bounded by the options' timeout.
    ///
    /// A rejected handshake that names an older server version is retried
    /// once with that version on a fresh socket.
    pub async fn open(address: &NodeAddress, options: &ConnectOptions) -> Result<Self> {
        match tokio::time::timeout(options.timeout(), Self::open_inner(address, options)).await {
            Ok(result) => result,
            Err(_) => Err(IgniteError::Timeout(format!(
                "connection to {} timed out after {:?}",
                address,
                options.timeout()
            ))),
        }
    }

    async fn open_inner(address: &NodeAddress, options: &ConnectOptions) -> Result<Self> {
        let mut offered = options.version();
        loop {
            let mut connection = Self::connect(address, offered).await?;
            match connection.handshake(&options.handshake_request(offered)).await? {
                HandshakeResponse::Accepted {
                    features,
                    node_uuid,
                } => {
                    connection.node_uuid = node_uuid;
                    tracing::debug!(
                        address = %address,
                        version = %offered,
                        features = features.len(),
                        "handshake accepted"
                    );
                    return Ok(connection);
                }
                HandshakeResponse::Rejected {
                    server_version,
                    message,
                    ..
                } => {
                    connection.close().await;
                    let can_fall_back = offered == options.version()
                        && server_version < offered
                        && server_version >= ProtocolVersion::V1_2_0;
                    if !can_fall_back {
                        return Err(IgniteError::Connection(format!(
                            "handshake with {} rejected (server version {}): {}",
                            address, server_version, message
                        )));
                    }
                    tracing::info!(
                        address = %address,
                        offered = %offered,
                        server_version = %server_version,
                        "retrying handshake with server version"
                    );
                    offered = server_version;
                }
            }
        }
    }

    async fn connect(address: &NodeAddress, version: ProtocolVersion) -> Result<Self> {
        let stream = TcpStream::connect((address.host(), address.port()))
            .await
            .map_err(|e| IgniteError::Connection(format!("failed to connect to {}: {}", address, e)))?;

        stream.set_nodelay(true).map_err(|e| {
            IgniteError::Connection(format!("failed to set TCP_NODELAY: {}", e))
        })?;

        tracing::debug!(address = %address, "established connection");
        Ok(Self::new(stream, address.clone(), version))
    }

    async fn handshake(&mut self, request: &HandshakeRequest) -> Result<HandshakeResponse> {
        self.send(request.to_body()?).await?;
        let body = self.receive_or_closed().await?;
        HandshakeResponse::parse(&body, request.version())
    }

    /// Sends one request and reads its response.
    ///
    /// A response whose id does not match the request is a protocol error.
    pub async fn request(&mut self, request: &Request) -> Result<Response> {
        self.send(request.to_body()).await?;
        let body = self.receive_or_closed().await?;
        let response = Response::parse(body, self.version)?;
        if response.request_id() != request.request_id() {
            return Err(IgniteError::Protocol(format!(
                "response id {} does not match request id {}",
                response.request_id(),
                request.request_id()
            )));
        }
        Ok(response)
    }

    async fn send(&mut self, body: Bytes) -> Result<()> {
        let mut buf = BytesMut::new();
        self.codec.encode(body, &mut buf)?;

        self.stream.write_all(&buf).await.map_err(|e| {
            IgniteError::Connection(format!("failed to write to {}: {}", self.address, e))
        })?;
        Ok(())
    }

    async fn receive_or_closed(&mut self) -> Result<Bytes> {
        self.receive().await?.ok_or_else(|| {
            IgniteError::Connection(format!("connection to {} closed by peer", self.address))
        })
    }

    /// Receives one message body.
    ///
    /// Returns `None` if the connection is closed cleanly.
    async fn receive(&mut self) -> Result<Option<Bytes>> {
        loop {
            if let Some(body) = self.codec.decode(&mut self.read_buffer)? {
                return Ok(Some(body));
            }

            let bytes_read = self.stream.read_buf(&mut self.read_buffer).await.map_err(|e| {
                IgniteError::Connection(format!("failed to read from {}: {}", self.address, e))
            })?;

            if bytes_read == 0 {
                if self.read_buffer.is_empty() {
                    return Ok(None);
                }
                return Err(IgniteError::Connection(format!(
                    "connection to {} closed unexpectedly",
                    self.address
                )));
            }
        }
    }

    /// Closes this connection.
    pub async fn close(mut self) {
        let _ = self.stream.shutdown().await;
        tracing::debug!(address = %self.address, "connection closed");
    }
}
