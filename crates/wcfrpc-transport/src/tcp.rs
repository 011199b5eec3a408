use std::net::{TcpListener, TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::{debug, info};

use crate::address::Address;
use crate::error::{Result, TransportError};
use crate::stream::RpcStream;

/// TCP transport.
///
/// Clients only ever `connect`. The listening half exists so a host (or a
/// stand-in host in tests) can be served from the same types.
pub struct TcpTransport {
    listener: TcpListener,
    address: Address,
}

impl TcpTransport {
    /// Bind and listen on `address`. Port 0 picks a free port.
    pub fn bind(address: &Address) -> Result<Self> {
        let listener =
            TcpListener::bind(address.socket_target()).map_err(|e| TransportError::Bind {
                address: address.clone(),
                source: e,
            })?;
        let local = listener.local_addr().map_err(|e| TransportError::Bind {
            address: address.clone(),
            source: e,
        })?;
        let address = Address::from(local);

        info!(%address, "listening on tcp");

        Ok(Self { listener, address })
    }

    /// Accept an incoming connection (blocking).
    pub fn accept(&self) -> Result<RpcStream> {
        let (stream, peer) = self.listener.accept().map_err(TransportError::Accept)?;
        stream.set_nodelay(true)?;
        debug!(%peer, "accepted connection");
        Ok(RpcStream::from_tcp(stream, Address::from(peer)))
    }

    /// Connect to a listening host (blocking).
    ///
    /// Every resolved socket address is tried once, in order. Failure is
    /// reported immediately; there is no retry loop here.
    pub fn connect(address: &Address, timeout: Option<Duration>) -> Result<RpcStream> {
        let connect_err = |source: std::io::Error| TransportError::Connect {
            address: address.clone(),
            source,
        };

        let candidates = address.socket_target().to_socket_addrs().map_err(connect_err)?;

        let mut last_err = None;
        for candidate in candidates {
            let attempt = match timeout {
                Some(timeout) => TcpStream::connect_timeout(&candidate, timeout),
                None => TcpStream::connect(candidate),
            };
            match attempt {
                Ok(stream) => {
                    stream.set_nodelay(true)?;
                    debug!(%address, %candidate, "connected to host");
                    return Ok(RpcStream::from_tcp(stream, address.clone()));
                }
                Err(err) => last_err = Some(err),
            }
        }

        Err(connect_err(last_err.unwrap_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "address resolved to no socket addresses",
            )
        })))
    }

    /// The address this transport is bound to (with the real port).
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Transport name for diagnostics.
    pub fn transport_name(&self) -> &'static str {
        "tcp"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};

    fn loopback() -> Address {
        Address::new("127.0.0.1", 0)
    }

    #[test]
    fn test_bind_accept_connect() {
        let listener = TcpTransport::bind(&loopback()).unwrap();
        assert_ne!(listener.address().port(), 0);

        let address = listener.address().clone();
        let handle = std::thread::spawn(move || {
            let mut client = TcpTransport::connect(&address, None).unwrap();
            client.write_all(b"hello").unwrap();
        });

        let mut server = listener.accept().unwrap();
        let mut buf = [0u8; 5];
        server.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"hello");

        handle.join().unwrap();
    }

    #[test]
    fn test_connect_refused_reports_address() {
        // Bind then drop to get a port nobody listens on.
        let port = {
            let listener = TcpTransport::bind(&loopback()).unwrap();
            listener.address().port()
        };
        let target = Address::new("127.0.0.1", port);

        let err = TcpTransport::connect(&target, Some(Duration::from_millis(500))).unwrap_err();
        match err {
            TransportError::Connect { address, .. } => assert_eq!(address, target),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_read_timeout_is_reported_as_timeout() {
        let listener = TcpTransport::bind(&loopback()).unwrap();
        let address = listener.address().clone();
        let client = std::thread::spawn(move || TcpTransport::connect(&address, None).unwrap());
        let _server = listener.accept().unwrap();
        let mut client = client.join().unwrap();

        client
            .set_read_timeout(Some(Duration::from_millis(20)))
            .unwrap();
        let mut buf = [0u8; 1];
        let err = client.read(&mut buf).unwrap_err();
        assert!(TransportError::Io(err).is_timeout());
    }

    #[test]
    fn test_shutdown_unblocks_clone() {
        let listener = TcpTransport::bind(&loopback()).unwrap();
        let address = listener.address().clone();
        let client = std::thread::spawn(move || TcpTransport::connect(&address, None).unwrap());
        let _server = listener.accept().unwrap();
        let client = client.join().unwrap();

        let mut reader = client.try_clone().unwrap();
        let blocked = std::thread::spawn(move || {
            let mut buf = [0u8; 1];
            reader.read(&mut buf).unwrap_or(0)
        });

        client.shutdown().unwrap();
        assert_eq!(blocked.join().unwrap(), 0);
    }
}
