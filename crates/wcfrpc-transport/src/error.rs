use crate::address::Address;

/// Errors that can occur in host transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The address string is not a usable `tcp://host:port` address.
    #[error("invalid address {address:?}: {reason}")]
    InvalidAddress { address: String, reason: String },

    /// Failed to bind to the specified address.
    #[error("failed to bind to {address}: {source}")]
    Bind {
        address: Address,
        source: std::io::Error,
    },

    /// Failed to connect to the specified address.
    #[error("failed to connect to {address}: {source}")]
    Connect {
        address: Address,
        source: std::io::Error,
    },

    /// Failed to accept an incoming connection.
    #[error("failed to accept connection: {0}")]
    Accept(std::io::Error),

    /// An I/O error occurred on the transport stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TransportError {
    /// Whether this error is a socket deadline expiry rather than a failure.
    pub fn is_timeout(&self) -> bool {
        match self {
            TransportError::Io(err) | TransportError::Accept(err) => is_timeout_kind(err.kind()),
            TransportError::Connect { source, .. } => is_timeout_kind(source.kind()),
            _ => false,
        }
    }
}

/// Read/write deadlines surface as `WouldBlock` on Unix and `TimedOut` on Windows.
pub fn is_timeout_kind(kind: std::io::ErrorKind) -> bool {
    matches!(
        kind,
        std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
    )
}

pub type Result<T> = std::result::Result<T, TransportError>;
