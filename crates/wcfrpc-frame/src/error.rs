/// Errors that can occur during handshake, frame encoding or decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The peer's SP handshake header is not well formed.
    #[error("invalid SP handshake: {0}")]
    InvalidHandshake(String),

    /// The peer speaks a protocol we cannot pair with.
    #[error("protocol mismatch (expected 0x{expected:04x}, peer sent 0x{actual:04x})")]
    ProtocolMismatch { expected: u16, actual: u16 },

    /// The message is missing or carries an out-of-range pair1 header.
    #[error("malformed pair1 message: {0}")]
    MalformedHeader(String),

    /// The payload exceeds the configured maximum size.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The connection was closed before a complete frame was received.
    #[error("connection closed (incomplete frame)")]
    ConnectionClosed,
}

impl FrameError {
    /// Whether this error is a socket read/write deadline expiry.
    pub fn is_timeout(&self) -> bool {
        match self {
            FrameError::Io(err) => wcfrpc_transport::error::is_timeout_kind(err.kind()),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
