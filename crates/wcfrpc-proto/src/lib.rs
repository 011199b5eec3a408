//! Request/response envelopes for the automation host.
//!
//! Every call is a protobuf `Request` carrying a [`Function`] id and at most
//! one payload; the host answers with exactly one `Response`. Inbound events
//! arrive on the event stream as `Response` envelopes holding a [`WxMsg`].
//!
//! The message definitions are written with `prost` derives instead of a
//! `.proto` build step so the crate builds without `protoc`.

pub mod codec;
pub mod envelope;
pub mod error;
pub mod function;
pub mod messages;

pub use codec::{decode_request, decode_response, encode_request, encode_response};
pub use envelope::{Request, RequestPayload, Response, ResponseKind, ResponsePayload};
pub use error::{DecodeError, Result};
pub use function::{Function, PayloadKind};
pub use messages::*;
