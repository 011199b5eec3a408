use wcfrpc_proto::Function;

use crate::client::ClientState;
use crate::connection::ConnectionRole;
use crate::identity::IdentityKind;

/// Errors that can occur in client operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport-level error (dial, socket options).
    #[error("transport error: {0}")]
    Transport(#[from] wcfrpc_transport::TransportError),

    /// Frame-level error (handshake, send, receive).
    #[error("frame error: {0}")]
    Frame(#[from] wcfrpc_frame::FrameError),

    /// Envelope could not be encoded or decoded.
    #[error("decode error: {0}")]
    Decode(#[from] wcfrpc_proto::DecodeError),

    /// The client has no usable command connection.
    #[error("client is not connected (state: {state})")]
    NotConnected { state: ClientState },

    /// The connection was closed, explicitly or after a failed round trip.
    #[error("{role} connection is closed")]
    Closed { role: ConnectionRole },

    /// Every enqueue attempt found the buffer full.
    #[error("message buffer is full (capacity {capacity}, {attempts} attempts)")]
    BufferFull { capacity: usize, attempts: usize },

    /// The cancellation token fired.
    #[error("operation cancelled")]
    Cancelled,

    /// The cancellation token's deadline passed.
    #[error("deadline exceeded")]
    DeadlineExceeded,

    /// The directory could not say whether `id` is a `kind`, even after a refresh.
    #[error("could not determine whether {id} is a {kind}")]
    Indeterminate { id: String, kind: IdentityKind },

    /// A message buffer needs room for at least one message.
    #[error("message buffer capacity must be at least 1")]
    InvalidCapacity,

    /// An event handler reported failure.
    #[error("handler failed: {0}")]
    Handler(String),

    /// A host call failed.
    #[error("{function} failed: {source}")]
    Call {
        function: Function,
        #[source]
        source: Box<ClientError>,
    },
}

impl ClientError {
    /// Attach the function being called.
    pub fn in_call(self, function: Function) -> Self {
        match self {
            already @ ClientError::Call { .. } => already,
            other => ClientError::Call {
                function,
                source: Box::new(other),
            },
        }
    }

    /// The error with any call context removed.
    pub fn root(&self) -> &ClientError {
        match self {
            ClientError::Call { source, .. } => source.root(),
            other => other,
        }
    }

    /// Whether this is a socket deadline expiry.
    pub fn is_timeout(&self) -> bool {
        match self.root() {
            ClientError::Transport(err) => err.is_timeout(),
            ClientError::Frame(err) => err.is_timeout(),
            ClientError::DeadlineExceeded => true,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
