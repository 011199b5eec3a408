use std::time::Duration;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};

/// SP/TCP length prefix: body length as u64 big-endian.
pub const HEADER_SIZE: usize = 8;

/// pair1 header carried at the front of every body: hop count as u32 big-endian.
pub const PAIR1_HEADER_SIZE: usize = 4;

/// Hop count stamped on messages we originate.
pub const INITIAL_HOPS: u32 = 1;

/// pair1 rejects hop counts that do not fit in the low byte.
pub const MAX_HOPS: u32 = 0xff;

/// Default maximum payload size: 16 MiB.
pub const DEFAULT_MAX_PAYLOAD: usize = 16 * 1024 * 1024;

/// One received pair1 message.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Hop count from the pair1 header.
    pub hops: u32,
    /// The protobuf envelope.
    pub payload: Bytes,
}

/// Append one message to `dst`.
///
/// ```text
/// | body length (8B BE) | hops (4B BE) | payload            |
/// | = 4 + payload len   | = 1          | (protobuf message) |
/// ```
pub fn encode_frame(payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    let body_len = PAIR1_HEADER_SIZE + payload.len();
    dst.reserve(HEADER_SIZE + body_len);
    dst.put_u64(body_len as u64);
    dst.put_u32(INITIAL_HOPS);
    dst.put_slice(payload);
    Ok(())
}

/// Take one complete message off the front of `src`.
///
/// `Ok(None)` means more bytes are needed; `src` is left untouched. The
/// length prefix is checked against `max_payload` as soon as it arrives, so
/// an oversized message is refused before its body is buffered.
pub fn decode_frame(src: &mut BytesMut, max_payload: usize) -> Result<Option<Frame>> {
    let Some(mut prefix) = src.get(..HEADER_SIZE) else {
        return Ok(None);
    };
    let body_len = prefix.get_u64();

    let Some(payload_len) = body_len.checked_sub(PAIR1_HEADER_SIZE as u64) else {
        return Err(FrameError::MalformedHeader(format!(
            "body of {body_len} bytes cannot hold the hop count"
        )));
    };
    let payload_len = usize::try_from(payload_len).unwrap_or(usize::MAX);
    if payload_len > max_payload {
        return Err(FrameError::PayloadTooLarge {
            size: payload_len,
            max: max_payload,
        });
    }

    if src.len() < HEADER_SIZE + PAIR1_HEADER_SIZE + payload_len {
        return Ok(None);
    }

    src.advance(HEADER_SIZE);
    let hops = src.get_u32();
    let payload = src.split_to(payload_len).freeze();
    if hops > MAX_HOPS {
        return Err(FrameError::MalformedHeader(format!(
            "hop count 0x{hops:08x} exceeds 0x{MAX_HOPS:02x}"
        )));
    }

    Ok(Some(Frame { hops, payload }))
}

/// Limits and socket deadlines for one framed stream.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    pub max_payload_size: usize,
    pub read_timeout: Option<Duration>,
    pub write_timeout: Option<Duration>,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_payload_size: DEFAULT_MAX_PAYLOAD,
            read_timeout: None,
            write_timeout: None,
        }
    }
}

impl FrameConfig {
    /// Same deadline for reads and writes.
    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.read_timeout = deadline;
        self.write_timeout = deadline;
        self
    }
}
