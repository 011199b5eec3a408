//! TCP transport for talking to the automation host.
//!
//! The host exposes two plain TCP endpoints (commands and the event stream),
//! both addressed as `tcp://host:port`. This is the lowest layer of wcfrpc.
//! Everything else builds on top of the [`RpcStream`] type provided here.

pub mod address;
pub mod error;
pub mod stream;
pub mod tcp;

pub use address::{Address, DEFAULT_COMMAND_ADDRESS};
pub use error::{Result, TransportError};
pub use stream::RpcStream;
pub use tcp::TcpTransport;
