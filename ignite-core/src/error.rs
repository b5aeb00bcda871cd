//! Error types for Ignite thin client operations.

use std::io;
use thiserror::Error;

/// The main error type for Ignite thin client operations.
#[derive(Debug, Error)]
pub enum IgniteError {
    /// Malformed or truncated bytes on the wire.
    ///
    /// Fatal for the connection that produced them: the stream position is
    /// unknown afterwards, so the connection must be closed.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Every candidate node in the pool was tried and none is usable.
    #[error("reconnect error: {0}")]
    Reconnect(String),

    /// The server answered a request with a non-zero status code.
    #[error("server error (status {code}): {message}")]
    ServerStatus {
        /// Status code reported by the server.
        code: i32,
        /// Server-side error message.
        message: String,
    },

    /// A topology response or header reported a version behind the cached one.
    #[error("stale affinity topology: cached {cached:?}, received {received:?}")]
    StaleTopology {
        /// Version currently cached by the client as `(major, minor)`.
        cached: (i64, i32),
        /// Version carried by the discarded response.
        received: (i64, i32),
    },

    /// Connection-related errors (refused, reset, closed mid-response).
    #[error("connection error: {0}")]
    Connection(String),

    /// A value does not match the shape its descriptor requires.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Operation timeout errors.
    #[error("timeout error: {0}")]
    Timeout(String),

    /// Configuration errors (invalid settings).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// I/O errors from the standard library.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl IgniteError {
    /// Returns `true` if the connection that raised this error can no longer be used.
    pub fn is_connection_fatal(&self) -> bool {
        matches!(
            self,
            Self::Protocol(_) | Self::Connection(_) | Self::Io(_) | Self::Timeout(_)
        )
    }
}

/// A specialized `Result` type for Ignite thin client operations.
pub type Result<T> = std::result::Result<T, IgniteError>;
