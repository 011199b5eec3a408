use std::io::{ErrorKind, Read, Write};

use tracing::debug;

use crate::error::{FrameError, Result};

/// SP protocol number for nng `pair1`.
pub const PAIR1_PROTOCOL: u16 = 0x0011;

/// Size of the SP/TCP connection header.
pub const HANDSHAKE_SIZE: usize = 8;

const SP_MAGIC: [u8; 4] = [0x00, b'S', b'P', 0x00];

/// Build the 8-byte SP header announcing `protocol`.
///
/// ```text
/// 0x00 'S' 'P' 0x00 | protocol (2B BE) | reserved 0x0000
/// ```
pub fn encode_handshake(protocol: u16) -> [u8; HANDSHAKE_SIZE] {
    let [hi, lo] = protocol.to_be_bytes();
    [
        SP_MAGIC[0],
        SP_MAGIC[1],
        SP_MAGIC[2],
        SP_MAGIC[3],
        hi,
        lo,
        0,
        0,
    ]
}

/// Validate a received SP header and return the peer's protocol number.
pub fn parse_handshake(header: &[u8; HANDSHAKE_SIZE]) -> Result<u16> {
    if header[..4] != SP_MAGIC {
        return Err(FrameError::InvalidHandshake(format!(
            "bad magic {:02x?}",
            &header[..4]
        )));
    }
    if header[6..] != [0, 0] {
        return Err(FrameError::InvalidHandshake(format!(
            "reserved bytes must be zero, got {:02x?}",
            &header[6..]
        )));
    }
    Ok(u16::from_be_bytes([header[4], header[5]]))
}

/// Exchange SP headers on a freshly connected stream.
///
/// Both ends send first and then read, so the exchange is symmetric and works
/// for the dialing client and for a host accepting the connection. `pair1`
/// only pairs with `pair1`, so the peer must announce the same protocol.
pub fn exchange_handshake<S: Read + Write>(stream: &mut S, protocol: u16) -> Result<u16> {
    stream.write_all(&encode_handshake(protocol))?;
    stream.flush()?;

    let mut header = [0u8; HANDSHAKE_SIZE];
    stream.read_exact(&mut header).map_err(|err| {
        if err.kind() == ErrorKind::UnexpectedEof {
            FrameError::ConnectionClosed
        } else {
            FrameError::Io(err)
        }
    })?;

    let peer = parse_handshake(&header)?;
    if peer != protocol {
        return Err(FrameError::ProtocolMismatch {
            expected: protocol,
            actual: peer,
        });
    }

    debug!(protocol = peer, "SP handshake complete");
    Ok(peer)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    /// In-memory duplex: reads from `input`, records writes.
    struct Duplex {
        input: Cursor<Vec<u8>>,
        written: Vec<u8>,
    }

    impl Duplex {
        fn new(input: &[u8]) -> Self {
            Self {
                input: Cursor::new(input.to_vec()),
                written: Vec::new(),
            }
        }
    }

    impl Read for Duplex {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            self.input.read(buf)
        }
    }

    impl Write for Duplex {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn pair1_header_bytes() {
        assert_eq!(
            encode_handshake(PAIR1_PROTOCOL),
            [0x00, b'S', b'P', 0x00, 0x00, 0x11, 0x00, 0x00]
        );
    }

    #[test]
    fn exchange_accepts_matching_peer() {
        let mut stream = Duplex::new(&encode_handshake(PAIR1_PROTOCOL));
        let peer = exchange_handshake(&mut stream, PAIR1_PROTOCOL).unwrap();

        assert_eq!(peer, PAIR1_PROTOCOL);
        assert_eq!(stream.written, encode_handshake(PAIR1_PROTOCOL));
    }

    #[test]
    fn exchange_rejects_other_protocol() {
        // pair0 is 0x0010.
        let mut stream = Duplex::new(&encode_handshake(0x0010));
        let err = exchange_handshake(&mut stream, PAIR1_PROTOCOL).unwrap_err();

        assert!(matches!(
            err,
            FrameError::ProtocolMismatch {
                expected: PAIR1_PROTOCOL,
                actual: 0x0010
            }
        ));
    }

    #[test]
    fn exchange_rejects_bad_magic() {
        let mut stream = Duplex::new(b"HTTP/1.1");
        let err = exchange_handshake(&mut stream, PAIR1_PROTOCOL).unwrap_err();
        assert!(matches!(err, FrameError::InvalidHandshake(_)));
    }

    #[test]
    fn exchange_rejects_nonzero_reserved() {
        let mut header = encode_handshake(PAIR1_PROTOCOL);
        header[7] = 1;
        let mut stream = Duplex::new(&header);
        let err = exchange_handshake(&mut stream, PAIR1_PROTOCOL).unwrap_err();
        assert!(matches!(err, FrameError::InvalidHandshake(_)));
    }

    #[test]
    fn exchange_reports_closed_on_short_header() {
        let mut stream = Duplex::new(&[0x00, b'S', b'P']);
        let err = exchange_handshake(&mut stream, PAIR1_PROTOCOL).unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }
}
