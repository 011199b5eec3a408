//! Message framing for the host's nng sockets.
//!
//! The host speaks nng's scalability protocol (SP) over TCP with the `pair1`
//! protocol. A connection opens with an 8-byte handshake in each direction,
//! after which every message is:
//! - An 8-byte big-endian body length
//! - A 4-byte big-endian pair1 hop count (part of the body)
//! - The payload
//!
//! Callers only ever see complete payloads.

pub mod codec;
pub mod error;
pub mod handshake;
pub mod reader;
pub mod writer;

pub use codec::{
    decode_frame, encode_frame, Frame, FrameConfig, DEFAULT_MAX_PAYLOAD, HEADER_SIZE,
    PAIR1_HEADER_SIZE,
};
pub use error::{FrameError, Result};
pub use handshake::{exchange_handshake, PAIR1_PROTOCOL};
pub use reader::FrameReader;
pub use writer::FrameWriter;
