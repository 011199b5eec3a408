use std::io::{ErrorKind, Read};

use bytes::{Buf, BytesMut};
use tracing::trace;
use wcfrpc_transport::{RpcStream, TransportError};

use crate::codec::{decode_frame, Frame, FrameConfig, HEADER_SIZE};
use crate::error::{FrameError, Result};

/// Smallest read issued once the length prefix is known.
const MIN_READ: usize = 4 * 1024;

/// Largest single read; bigger messages arrive over several reads.
const MAX_READ: usize = 256 * 1024;

/// Reads pair1 messages from a byte stream.
///
/// Reads are sized from the length prefix, so a small message costs one
/// header read plus one body read. A read deadline that fires midway through
/// a message surfaces as a timeout error; the bytes received so far stay
/// buffered and the next `read_frame` call resumes the same message.
pub struct FrameReader<T> {
    inner: T,
    buf: BytesMut,
    config: FrameConfig,
}

impl<T: Read> FrameReader<T> {
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(MIN_READ),
            config,
        }
    }

    /// Block until one complete message is available.
    ///
    /// EOF on a message boundary or inside one is `FrameError::ConnectionClosed`.
    pub fn read_frame(&mut self) -> Result<Frame> {
        loop {
            if let Some(frame) = decode_frame(&mut self.buf, self.config.max_payload_size)? {
                trace!(size = frame.payload.len(), hops = frame.hops, "frame received");
                return Ok(frame);
            }
            self.fill()?;
        }
    }

    /// Bytes received but not yet returned as a frame.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Bytes still needed before the head of the buffer can decode.
    fn missing(&self) -> usize {
        if self.buf.len() < HEADER_SIZE {
            return HEADER_SIZE - self.buf.len();
        }
        let body = (&self.buf[..HEADER_SIZE]).get_u64();
        let total = usize::try_from(body)
            .unwrap_or(usize::MAX)
            .saturating_add(HEADER_SIZE);
        total.saturating_sub(self.buf.len())
    }

    fn fill(&mut self) -> Result<()> {
        let want = if self.buf.len() < HEADER_SIZE {
            self.missing()
        } else {
            self.missing().clamp(MIN_READ, MAX_READ)
        };

        let start = self.buf.len();
        self.buf.resize(start + want, 0);
        loop {
            match self.inner.read(&mut self.buf[start..]) {
                Ok(0) => {
                    self.buf.truncate(start);
                    return Err(FrameError::ConnectionClosed);
                }
                Ok(read) => {
                    self.buf.truncate(start + read);
                    return Ok(());
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => {
                    self.buf.truncate(start);
                    return Err(FrameError::Io(err));
                }
            }
        }
    }
}

impl FrameReader<RpcStream> {
    /// Reader over a TCP stream with `config.read_timeout` applied to the socket.
    pub fn with_config_stream(inner: RpcStream, config: FrameConfig) -> Result<Self> {
        inner
            .set_read_timeout(config.read_timeout)
            .map_err(transport_to_frame_error)?;
        Ok(Self::with_config(inner, config))
    }
}

pub(crate) fn transport_to_frame_error(err: TransportError) -> FrameError {
    match err {
        TransportError::Io(io) | TransportError::Accept(io) => FrameError::Io(io),
        TransportError::Bind { source, .. } | TransportError::Connect { source, .. } => {
            FrameError::Io(source)
        }
        other => FrameError::Io(std::io::Error::other(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::io::{self, Cursor};

    use bytes::BufMut;

    use super::*;
    use crate::codec::encode_frame;

    fn wire(payloads: &[&[u8]]) -> Vec<u8> {
        let mut buf = BytesMut::new();
        for payload in payloads {
            encode_frame(payload, &mut buf).unwrap();
        }
        buf.to_vec()
    }

    /// Replays scripted read results, one per `read` call.
    struct Script(VecDeque<io::Result<Vec<u8>>>);

    impl Read for Script {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.0.pop_front() {
                None => Ok(0),
                Some(Err(err)) => Err(err),
                Some(Ok(mut bytes)) => {
                    if bytes.len() > buf.len() {
                        let rest = bytes.split_off(buf.len());
                        self.0.push_front(Ok(rest));
                    }
                    buf[..bytes.len()].copy_from_slice(&bytes);
                    Ok(bytes.len())
                }
            }
        }
    }

    #[test]
    fn back_to_back_envelopes_keep_order() {
        let mut reader = FrameReader::new(Cursor::new(wire(&[b"\x08\x01", b"", b"\x08\x10"])));

        assert_eq!(reader.read_frame().unwrap().payload.as_ref(), b"\x08\x01");
        assert!(reader.read_frame().unwrap().payload.is_empty());
        assert_eq!(reader.read_frame().unwrap().payload.as_ref(), b"\x08\x10");
        assert_eq!(reader.buffered(), 0);
    }

    #[test]
    fn large_body_spans_several_reads() {
        let payload = vec![0x5a; MAX_READ * 2 + 17];
        let mut reader = FrameReader::new(Cursor::new(wire(&[&payload])));

        let frame = reader.read_frame().unwrap();
        assert_eq!(frame.payload.len(), payload.len());
        assert_eq!(frame.hops, 1);
    }

    #[test]
    fn trailing_bytes_stay_buffered_for_next_frame() {
        let bytes = wire(&[b"first", b"second"]);
        let mut reader = FrameReader::new(Cursor::new(bytes));

        reader.read_frame().unwrap();
        assert_eq!(reader.buffered(), HEADER_SIZE + 4 + b"second".len());
        let second = reader.read_frame().unwrap();
        assert_eq!(second.payload.as_ref(), b"second");
    }

    #[test]
    fn deadline_mid_message_resumes() {
        let bytes = wire(&[b"resumed"]);
        let script = Script(VecDeque::from([
            Ok(bytes[..10].to_vec()),
            Err(io::Error::from(ErrorKind::WouldBlock)),
            Ok(bytes[10..].to_vec()),
        ]));
        let mut reader = FrameReader::new(script);

        let err = reader.read_frame().unwrap_err();
        assert!(err.is_timeout());
        assert_eq!(reader.buffered(), 10);

        assert_eq!(reader.read_frame().unwrap().payload.as_ref(), b"resumed");
    }

    #[test]
    fn interrupted_reads_are_retried() {
        let bytes = wire(&[b"ok"]);
        let script = Script(VecDeque::from([
            Err(io::Error::from(ErrorKind::Interrupted)),
            Ok(bytes),
        ]));

        let frame = FrameReader::new(script).read_frame().unwrap();
        assert_eq!(frame.payload.as_ref(), b"ok");
    }

    #[test]
    fn hangup_is_connection_closed() {
        let mut empty = FrameReader::new(Cursor::new(Vec::new()));
        assert!(matches!(
            empty.read_frame().unwrap_err(),
            FrameError::ConnectionClosed
        ));

        let mut cut = BytesMut::new();
        cut.put_u64(20);
        cut.put_u32(1);
        cut.put_slice(b"partial");
        let mut reader = FrameReader::new(Cursor::new(cut.to_vec()));
        assert!(matches!(
            reader.read_frame().unwrap_err(),
            FrameError::ConnectionClosed
        ));
    }

    #[test]
    fn oversized_length_prefix_is_rejected_before_reading_body() {
        let mut prefix = BytesMut::new();
        prefix.put_u64(1 << 40);
        let config = FrameConfig {
            max_payload_size: 1024,
            ..FrameConfig::default()
        };

        let mut reader = FrameReader::with_config(Cursor::new(prefix.to_vec()), config);
        assert!(matches!(
            reader.read_frame().unwrap_err(),
            FrameError::PayloadTooLarge { max: 1024, .. }
        ));
    }

    #[test]
    fn reads_from_a_tcp_peer() {
        let listener =
            wcfrpc_transport::TcpTransport::bind(&wcfrpc_transport::Address::new("127.0.0.1", 0))
                .unwrap();
        let address = listener.address().clone();

        let server = std::thread::spawn(move || {
            let stream = listener.accept().unwrap();
            let mut reader = FrameReader::with_config_stream(stream, FrameConfig::default())
                .expect("reader should apply timeout");
            reader.read_frame().unwrap()
        });

        let stream = wcfrpc_transport::TcpTransport::connect(&address, None).unwrap();
        crate::writer::FrameWriter::new(stream).send(b"tcp").unwrap();

        assert_eq!(server.join().unwrap().payload.as_ref(), b"tcp");
    }
}
