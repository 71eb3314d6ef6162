//! Error types for i3 IPC operations

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when communicating with i3 or sway
#[derive(Debug, Error)]
pub enum IpcError {
    /// Neither I3SOCK nor SWAYSOCK is set and `i3 --get-socketpath` gave nothing
    #[error("I3SOCK/SWAYSOCK not set and socket path lookup failed: {reason}")]
    SocketNotSet { reason: String },

    /// The socket path does not exist
    #[error("i3 socket not found at {path}")]
    SocketNotFound { path: PathBuf },

    /// Failed to connect to the socket
    #[error("Failed to connect to i3 socket at {path}: {source}")]
    ConnectionFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to send a message
    #[error("Failed to send message to i3: {0}")]
    SendFailed(#[source] std::io::Error),

    /// Failed to receive a message
    #[error("Failed to receive message from i3: {0}")]
    ReceiveFailed(#[source] std::io::Error),

    /// A frame did not start with the `i3-ipc` magic string
    #[error("Invalid message header: expected i3-ipc magic, got {found:?}")]
    InvalidMagic { found: [u8; 6] },

    /// Failed to serialize a request payload
    #[error("Failed to serialize payload: {0}")]
    SerializeFailed(#[source] serde_json::Error),

    /// A reply did not match the expected shape
    #[error("Failed to deserialize reply: {0}")]
    DeserializeFailed(#[source] serde_json::Error),

    /// An event frame could not be decoded, e.g. a `change` this version of
    /// the protocol types does not know
    #[error("Failed to decode event: {0}")]
    DecodeEvent(#[source] swayipc_types::Error),

    /// i3 answered with a reply of a different type than requested
    #[error("Unexpected reply type: expected {expected}, got {actual}")]
    UnexpectedReply { expected: u32, actual: u32 },

    /// i3 refused a SUBSCRIBE request
    #[error("i3 rejected subscription to {events}")]
    SubscribeRejected { events: String },

    /// Connection was closed unexpectedly
    #[error("Connection to i3 closed unexpectedly")]
    ConnectionClosed,
}

impl IpcError {
    /// Whether another connection attempt could succeed
    ///
    /// Covers a window manager that has not created its socket yet.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            IpcError::SocketNotSet { .. }
                | IpcError::SocketNotFound { .. }
                | IpcError::ConnectionFailed { .. }
        )
    }
}
