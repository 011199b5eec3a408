//! Client runtime for an instant-messaging automation host.
//!
//! The host exposes a command socket (request/response) and an event-stream
//! socket (pushed messages), both speaking nng pair1 over TCP with protobuf
//! envelopes.
//!
//! # Crate Structure
//!
//! - [`transport`]: TCP addresses and streams
//! - [`frame`]: SP handshake and length-prefixed framing
//! - [`proto`]: request/response envelopes and function ids
//! - [`client`]: RPC client, event listener, message buffer, contact
//!   directory (behind the `client` feature)

/// Re-export transport types.
pub mod transport {
    pub use wcfrpc_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use wcfrpc_frame::*;
}

/// Re-export envelope types.
pub mod proto {
    pub use wcfrpc_proto::*;
}

/// Re-export client types (requires `client` feature).
#[cfg(feature = "client")]
pub mod client {
    pub use wcfrpc_client::*;
}
