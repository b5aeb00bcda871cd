//! Connection handshake.

use bytes::Bytes;
use uuid::Uuid;

use super::constants::*;
use super::version::ProtocolVersion;
use crate::error::{IgniteError, Result};
use crate::serialization::{
    read_data_value, read_string_object, read_uuid_object, write_string_object, DataInput,
    DataOutput, DataValue, ObjectDataInput, ObjectDataOutput,
};

/// Handshake sent as the first message on a new connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakeRequest {
    version: ProtocolVersion,
    features: Vec<u8>,
    username: Option<String>,
    password: Option<String>,
}

impl HandshakeRequest {
    /// Creates an anonymous handshake offering `version`.
    pub fn new(version: ProtocolVersion) -> Self {
        Self {
            version,
            features: Vec::new(),
            username: None,
            password: None,
        }
    }

    /// Attaches credentials.
    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Returns the offered version.
    pub fn version(&self) -> ProtocolVersion {
        self.version
    }

    /// Encodes the handshake body (everything after the length prefix).
    pub fn to_body(&self) -> Result<Bytes> {
        let mut out = ObjectDataOutput::with_capacity(64);
        out.write_byte(HANDSHAKE_CODE)?;
        out.write_short(self.version.major)?;
        out.write_short(self.version.minor)?;
        out.write_short(self.version.patch)?;
        out.write_byte(THIN_CLIENT_CODE)?;
        if self.version.has_feature_flags() {
            out.write_ubyte(TC_BYTE_ARRAY)?;
            out.write_int(self.features.len() as i32)?;
            out.write_bytes(&self.features)?;
        }
        if let Some(username) = &self.username {
            write_string_object(&mut out, Some(username.as_str()))?;
            write_string_object(&mut out, self.password.as_deref())?;
        }
        Ok(out.into_inner().freeze())
    }
}

/// Server reply to a [`HandshakeRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandshakeResponse {
    /// The server accepted the offered version.
    Accepted {
        /// Feature bitmap reported by the server.
        features: Vec<u8>,
        /// Id of the node the connection landed on.
        node_uuid: Option<Uuid>,
    },
    /// The server refused the handshake.
    Rejected {
        /// Version the server supports.
        server_version: ProtocolVersion,
        /// Reason given by the server.
        message: String,
        /// Error code, when the offered version reports one.
        code: Option<i32>,
    },
}

impl HandshakeResponse {
    /// Parses a handshake reply to a request that offered `offered`.
    pub fn parse(body: &[u8], offered: ProtocolVersion) -> Result<Self> {
        let mut input = ObjectDataInput::new(body);
        if input.read_bool()? {
            let features = if offered.has_feature_flags() {
                match read_data_value(&mut input)? {
                    DataValue::ByteArray(bytes) => bytes,
                    DataValue::Null => Vec::new(),
                    other => {
                        return Err(IgniteError::Protocol(format!(
                            "unexpected handshake feature value: {:?}",
                            other
                        )))
                    }
                }
            } else {
                Vec::new()
            };
            let node_uuid = if offered.has_response_flags() {
                read_uuid_object(&mut input)?
            } else {
                None
            };
            Ok(Self::Accepted {
                features,
                node_uuid,
            })
        } else {
            let server_version = ProtocolVersion::new(
                input.read_short()?,
                input.read_short()?,
                input.read_short()?,
            );
            let message = read_string_object(&mut input)?.unwrap_or_default();
            let code = if offered.has_feature_flags() && input.remaining() >= 4 {
                Some(input.read_int()?)
            } else {
                None
            };
            Ok(Self::Rejected {
                server_version,
                message,
                code,
            })
        }
    }
}
