use crate::function::{Function, PayloadKind};

/// Errors produced while decoding or validating envelopes.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The bytes are not a valid protobuf envelope.
    #[error("malformed envelope: {0}")]
    Protobuf(#[from] prost::DecodeError),

    /// The function id is not one the host defines.
    #[error("unknown function id 0x{0:02x}")]
    UnknownFunction(i32),

    /// The request carries a payload the function does not accept.
    #[error("{function} expects payload {expected}, got {actual}")]
    PayloadMismatch {
        function: Function,
        expected: PayloadKind,
        actual: PayloadKind,
    },
}

pub type Result<T> = std::result::Result<T, DecodeError>;
