//! Request and response messages of the thin client protocol.

use bytes::{BufMut, Bytes, BytesMut};
use std::sync::atomic::{AtomicI64, Ordering};

use super::constants::*;
use super::version::ProtocolVersion;
use crate::affinity::TopologyVersion;
use crate::error::{IgniteError, Result};
use crate::serialization::{read_string_object, DataInput, ObjectDataInput, ObjectDataOutput};

/// Global request ID counter.
static REQUEST_ID_COUNTER: AtomicI64 = AtomicI64::new(1);

/// Generates a unique request ID.
pub fn next_request_id() -> i64 {
    REQUEST_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// An outbound request: op code, request id and an operation-specific payload.
#[derive(Debug)]
pub struct Request {
    op_code: i16,
    request_id: i64,
    payload: ObjectDataOutput,
}

impl Request {
    /// Creates a request for `op_code` with a fresh request id.
    pub fn new(op_code: i16) -> Self {
        Self::with_request_id(op_code, next_request_id())
    }

    /// Creates a request with an explicit request id.
    pub fn with_request_id(op_code: i16, request_id: i64) -> Self {
        Self {
            op_code,
            request_id,
            payload: ObjectDataOutput::new(),
        }
    }

    /// Returns the operation code.
    pub fn op_code(&self) -> i16 {
        self.op_code
    }

    /// Returns the request id.
    pub fn request_id(&self) -> i64 {
        self.request_id
    }

    /// Returns the payload writer.
    pub fn payload_mut(&mut self) -> &mut ObjectDataOutput {
        &mut self.payload
    }

    /// Returns the payload written so far.
    pub fn payload(&self) -> &[u8] {
        self.payload.as_bytes()
    }

    /// Encodes the message body (everything after the length prefix).
    pub fn to_body(&self) -> Bytes {
        let payload = self.payload.as_bytes();
        let mut buf = BytesMut::with_capacity(REQUEST_HEADER_SIZE + payload.len());
        buf.put_i16_le(self.op_code);
        buf.put_i64_le(self.request_id);
        buf.put_slice(payload);
        buf.freeze()
    }
}

/// A parsed response.
///
/// The header is decoded eagerly; the payload is kept as bytes for the
/// operation-specific decoder.
#[derive(Debug, Clone)]
pub struct Response {
    request_id: i64,
    status: i32,
    error_message: Option<String>,
    topology_version: Option<TopologyVersion>,
    payload: Bytes,
}

impl Response {
    /// Parses a response body received on a connection that negotiated `version`.
    pub fn parse(body: Bytes, version: ProtocolVersion) -> Result<Self> {
        let mut input = ObjectDataInput::new(&body);
        let request_id = input.read_long()?;

        let mut status = STATUS_SUCCESS;
        let mut error_message = None;
        let mut topology_version = None;

        if version.has_response_flags() {
            let flags = input.read_short()?;
            if flags & RESPONSE_FLAG_TOPOLOGY_CHANGED != 0 {
                let major = input.read_long()?;
                let minor = input.read_int()?;
                topology_version = Some(TopologyVersion::new(major, minor));
            }
            if flags & RESPONSE_FLAG_ERROR != 0 {
                status = input.read_int()?;
                error_message = read_string_object(&mut input)?;
                if status == STATUS_SUCCESS {
                    status = STATUS_FAILED;
                }
            }
        } else {
            status = input.read_int()?;
            if status != STATUS_SUCCESS {
                error_message = read_string_object(&mut input)?;
            }
        }

        let payload = body.slice(input.position()..);
        Ok(Self {
            request_id,
            status,
            error_message,
            topology_version,
            payload,
        })
    }

    /// Returns the request id this response answers.
    pub fn request_id(&self) -> i64 {
        self.request_id
    }

    /// Returns the status code; zero means success.
    pub fn status(&self) -> i32 {
        self.status
    }

    /// Returns `true` if the server reported success.
    pub fn is_success(&self) -> bool {
        self.status == STATUS_SUCCESS
    }

    /// Returns the server's error message, if any.
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Returns the new affinity topology version if the server flagged a change.
    pub fn topology_version(&self) -> Option<TopologyVersion> {
        self.topology_version
    }

    /// Returns the operation payload.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Returns a reader positioned at the start of the payload.
    pub fn input(&self) -> ObjectDataInput<'_> {
        ObjectDataInput::new(&self.payload)
    }

    /// Converts a failed status into [`IgniteError::ServerStatus`].
    pub fn into_result(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(IgniteError::ServerStatus {
                code: self.status,
                message: self
                    .error_message
                    .unwrap_or_else(|| "no message".to_string()),
            })
        }
    }
}
