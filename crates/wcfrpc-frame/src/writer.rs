use std::io::{ErrorKind, Write};

use bytes::{BufMut, BytesMut};
use tracing::trace;
use wcfrpc_transport::RpcStream;

use crate::codec::{FrameConfig, HEADER_SIZE, INITIAL_HOPS, PAIR1_HEADER_SIZE};
use crate::error::{FrameError, Result};
use crate::reader::transport_to_frame_error;

/// Payloads up to this size are copied behind the header and written once.
const COALESCE_LIMIT: usize = 16 * 1024;

/// Writes pair1 messages to a byte stream.
pub struct FrameWriter<T> {
    inner: T,
    scratch: BytesMut,
    config: FrameConfig,
}

impl<T: Write> FrameWriter<T> {
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            scratch: BytesMut::with_capacity(HEADER_SIZE + PAIR1_HEADER_SIZE + COALESCE_LIMIT),
            config,
        }
    }

    /// Frame and send one payload, then flush.
    ///
    /// A write deadline expiry is returned as an I/O error. The message may
    /// then be partially on the wire, so the stream must not be reused.
    pub fn send(&mut self, payload: &[u8]) -> Result<()> {
        if payload.len() > self.config.max_payload_size {
            return Err(FrameError::PayloadTooLarge {
                size: payload.len(),
                max: self.config.max_payload_size,
            });
        }

        self.scratch.clear();
        self.scratch
            .put_u64((PAIR1_HEADER_SIZE + payload.len()) as u64);
        self.scratch.put_u32(INITIAL_HOPS);

        if payload.len() <= COALESCE_LIMIT {
            self.scratch.put_slice(payload);
            write_fully(&mut self.inner, &self.scratch)?;
        } else {
            write_fully(&mut self.inner, &self.scratch)?;
            write_fully(&mut self.inner, payload)?;
        }

        loop {
            match self.inner.flush() {
                Ok(()) => break,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }

        trace!(size = payload.len(), "frame sent");
        Ok(())
    }
}

impl FrameWriter<RpcStream> {
    /// Writer over a TCP stream with `config.write_timeout` applied to the socket.
    pub fn with_config_stream(inner: RpcStream, config: FrameConfig) -> Result<Self> {
        inner
            .set_write_timeout(config.write_timeout)
            .map_err(transport_to_frame_error)?;
        Ok(Self::with_config(inner, config))
    }
}

/// `write_all` that reports a zero-length write as a hangup.
fn write_fully<W: Write>(dst: &mut W, mut bytes: &[u8]) -> Result<()> {
    while !bytes.is_empty() {
        match dst.write(bytes) {
            Ok(0) => return Err(FrameError::ConnectionClosed),
            Ok(n) => bytes = &bytes[n..],
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(FrameError::Io(err)),
        }
    }
    Ok(())
}
