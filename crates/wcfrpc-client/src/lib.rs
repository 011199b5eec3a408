//! Client runtime for the automation host.
//!
//! - [`RpcClient`]: typed calls over the command connection, one request in
//!   flight at a time.
//! - [`EventListener`]: receives inbound messages on the event-stream
//!   connection and hands each one to a handler on its own thread.
//! - [`MessageBuffer`]: bounded queue between the listener and consumers.
//! - [`Directory`]: cached, classified view of the contact list.
//! - [`Session`]: wires the four together.

pub mod buffer;
pub mod cancel;
pub mod client;
pub mod config;
pub mod connection;
pub mod directory;
pub mod error;
pub mod identity;
pub mod listener;
pub mod message;
pub mod room;
pub mod session;
pub mod status;

pub use buffer::{MessageBuffer, RejectedMessage, PUT_ATTEMPTS};
pub use cancel::CancelToken;
pub use client::{ClientState, ReceiveFlag, RpcClient};
pub use config::{
    ClientConfig, ConnectionConfig, DEFAULT_BUFFER_CAPACITY, DEFAULT_CONNECT_TIMEOUT,
    DEFAULT_DEADLINE,
};
pub use connection::{Connection, ConnectionRole};
pub use directory::{
    ContactSource, Directory, DirectoryStats, Lookup, RefreshOutcome, SelfProfile,
};
pub use error::{ClientError, Result};
pub use identity::{classify, Gender, Identity, IdentityKind, SpecialAccount};
pub use listener::{EventHandler, EventListener, HandlerFailure};
pub use message::{Message, MessageType, Responder};
pub use room::{ContactInfo, RoomData, RoomQueryError};
pub use session::Session;
pub use status::CallStatus;
