//! Error types for the wire layer.

use std::io;

/// Result type alias for the wire layer.
pub type Result<T> = std::result::Result<T, WireError>;

/// Failures while moving frames over a stream.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// Underlying socket failure.
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    /// Peer announced a frame larger than the limit.
    #[error("frame of {len} bytes exceeds limit of {max} bytes")]
    FrameTooLarge { len: usize, max: usize },

    /// Frame payload is not a valid message.
    #[error("malformed frame: {0}")]
    Malformed(String),

    /// Stream ended where a frame was expected.
    #[error("connection closed by peer")]
    Closed,

    /// Connection attempt did not complete in time.
    #[error("connect to {addr} timed out")]
    ConnectTimeout { addr: String },
}

impl WireError {
    /// True if the failure happened at the transport, not in message content.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            WireError::Io(_) | WireError::Closed | WireError::ConnectTimeout { .. }
        )
    }
}
