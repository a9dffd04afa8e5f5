//! Channel error types

use thiserror::Error;

use crate::channel::ChannelState;

/// Channel result type
pub type ChannelResult<T> = Result<T, ChannelError>;

/// Channel error types
#[derive(Debug, Error)]
pub enum ChannelError {
    /// Lifecycle method called out of order
    #[error("Channel '{channel}' cannot move from {from} to {to}")]
    InvalidTransition {
        channel: String,
        from: ChannelState,
        to: ChannelState,
    },

    /// Initialization was rejected by the transport
    #[error("Channel initialization failed: {0}")]
    InitializationFailed(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(String),

    /// The other end went away
    #[error("Connection closed")]
    ConnectionClosed,

    /// The channel implementation panicked
    #[error("Channel panicked: {0}")]
    Panicked(String),
}

impl From<std::io::Error> for ChannelError {
    fn from(err: std::io::Error) -> Self {
        ChannelError::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for ChannelError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_io() {
            ChannelError::IoError(err.to_string())
        } else {
            ChannelError::SerializationError(err.to_string())
        }
    }
}
