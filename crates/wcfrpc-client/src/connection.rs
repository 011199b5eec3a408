use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use bytes::Bytes;
use tracing::{debug, info, warn};
use wcfrpc_frame::{exchange_handshake, FrameReader, FrameWriter, PAIR1_PROTOCOL};
use wcfrpc_transport::{Address, RpcStream, TcpTransport};

use crate::config::ConnectionConfig;
use crate::error::{ClientError, Result};

/// Which of the host's two sockets a connection talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionRole {
    /// Request/response calls.
    Command,
    /// Pushed inbound messages.
    EventStream,
}

impl fmt::Display for ConnectionRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionRole::Command => f.write_str("command"),
            ConnectionRole::EventStream => f.write_str("event-stream"),
        }
    }
}

struct Io {
    reader: FrameReader<RpcStream>,
    writer: FrameWriter<RpcStream>,
}

/// One pair1 socket to the host.
///
/// All I/O goes through a single mutex. The host answers strictly in request
/// order and carries no request ids, so [`Connection::round_trip`] holds the
/// lock across the send and the matching receive.
pub struct Connection {
    role: ConnectionRole,
    address: Address,
    io: Mutex<Option<Io>>,
    // Separate handle so `close` can unblock a reader holding the lock.
    control: RpcStream,
    closed: AtomicBool,
}

impl Connection {
    /// Connect and exchange SP headers. Failure is returned as is, never retried.
    pub fn dial(address: &Address, role: ConnectionRole, config: &ConnectionConfig) -> Result<Self> {
        let mut stream = TcpTransport::connect(address, config.connect_timeout)?;
        stream.set_read_timeout(config.deadline)?;
        stream.set_write_timeout(config.deadline)?;
        exchange_handshake(&mut stream, PAIR1_PROTOCOL)?;

        let reader_stream = stream.try_clone()?;
        let control = stream.try_clone()?;
        let frame_config = config.frame_config();
        let reader = FrameReader::with_config_stream(reader_stream, frame_config.clone())?;
        let writer = FrameWriter::with_config_stream(stream, frame_config)?;

        info!(%role, %address, "connected to host");

        Ok(Self {
            role,
            address: address.clone(),
            io: Mutex::new(Some(Io { reader, writer })),
            control,
            closed: AtomicBool::new(false),
        })
    }

    pub fn role(&self) -> ConnectionRole {
        self.role
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Send one message.
    pub fn send(&self, payload: &[u8]) -> Result<()> {
        let mut guard = self.lock()?;
        let io = guard.as_mut().ok_or_else(|| self.closed_error())?;
        io.writer.send(payload)?;
        Ok(())
    }

    /// Receive one message.
    ///
    /// A deadline expiry comes back as an error for which
    /// [`ClientError::is_timeout`] is true; a partially received message
    /// stays buffered and the next call picks it up.
    pub fn receive(&self) -> Result<Bytes> {
        let mut guard = self.lock()?;
        let io = guard.as_mut().ok_or_else(|| self.closed_error())?;
        let frame = io.reader.read_frame()?;
        Ok(frame.payload)
    }

    /// Send a request and receive its reply under one lock acquisition.
    ///
    /// If either half fails the connection is closed: a late reply would
    /// otherwise be handed to the next caller.
    pub fn round_trip(&self, payload: &[u8]) -> Result<Bytes> {
        let mut guard = self.lock()?;
        let io = guard.as_mut().ok_or_else(|| self.closed_error())?;

        let result = io
            .writer
            .send(payload)
            .and_then(|()| io.reader.read_frame());

        match result {
            Ok(frame) => Ok(frame.payload),
            Err(err) => {
                warn!(role = %self.role, address = %self.address, error = %err, "round trip failed; closing connection");
                guard.take();
                self.shutdown();
                Err(err.into())
            }
        }
    }

    /// Release the socket. Later operations fail with `Closed`. Idempotent.
    pub fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        // Shut down first so a reader blocked under the lock wakes up.
        let shutdown = self.control.shutdown().map_err(ClientError::from);
        self.release(shutdown)
    }

    /// Drop the reader and writer halves whatever `shutdown` returned.
    fn release(&self, shutdown: Result<()>) -> Result<()> {
        if let Err(err) = &shutdown {
            warn!(role = %self.role, address = %self.address, error = %err, "socket shutdown failed");
        }
        self.lock_ignoring_close().take();
        info!(role = %self.role, address = %self.address, "connection closed");
        shutdown
    }

    fn shutdown(&self) {
        self.closed.store(true, Ordering::Release);
        if let Err(err) = self.control.shutdown() {
            debug!(error = %err, "socket shutdown failed");
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Option<Io>>> {
        if self.is_closed() {
            return Err(self.closed_error());
        }
        self.io.lock().map_err(|_| self.closed_error())
    }

    fn lock_ignoring_close(&self) -> MutexGuard<'_, Option<Io>> {
        self.io
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn closed_error(&self) -> ClientError {
        ClientError::Closed { role: self.role }
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        if !self.is_closed() {
            self.shutdown();
        }
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("role", &self.role)
            .field("address", &self.address.to_string())
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    use wcfrpc_frame::FrameError;

    use super::*;

    fn config() -> ConnectionConfig {
        ConnectionConfig::default().with_deadline(Some(Duration::from_millis(200)))
    }

    /// Accepts one connection, handshakes, and echoes every frame back.
    fn echo_host() -> (Address, thread::JoinHandle<()>) {
        let listener = TcpTransport::bind(&Address::new("127.0.0.1", 0)).unwrap();
        let address = listener.address().clone();
        let handle = thread::spawn(move || {
            let mut stream = listener.accept().unwrap();
            exchange_handshake(&mut stream, PAIR1_PROTOCOL).unwrap();
            let mut reader = FrameReader::new(stream.try_clone().unwrap());
            let mut writer = FrameWriter::new(stream);
            while let Ok(frame) = reader.read_frame() {
                if writer.send(&frame.payload).is_err() {
                    break;
                }
            }
        });
        (address, handle)
    }

    #[test]
    fn round_trip_echo() {
        let (address, host) = echo_host();
        let conn = Connection::dial(&address, ConnectionRole::Command, &config()).unwrap();

        assert_eq!(conn.round_trip(b"ping").unwrap().as_ref(), b"ping");
        assert_eq!(conn.role(), ConnectionRole::Command);

        conn.close().unwrap();
        host.join().unwrap();
    }

    #[test]
    fn concurrent_round_trips_stay_correlated() {
        let (address, host) = echo_host();
        let conn = Arc::new(Connection::dial(&address, ConnectionRole::Command, &config()).unwrap());

        let workers: Vec<_> = (0..8)
            .map(|worker| {
                let conn = Arc::clone(&conn);
                thread::spawn(move || {
                    for seq in 0..25 {
                        let request = format!("{worker}:{seq}");
                        let reply = conn.round_trip(request.as_bytes()).unwrap();
                        assert_eq!(reply.as_ref(), request.as_bytes());
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        conn.close().unwrap();
        host.join().unwrap();
    }

    #[test]
    fn operations_after_close_fail() {
        let (address, host) = echo_host();
        let conn = Connection::dial(&address, ConnectionRole::EventStream, &config()).unwrap();

        conn.close().unwrap();
        conn.close().unwrap();

        assert!(matches!(
            conn.send(b"x"),
            Err(ClientError::Closed {
                role: ConnectionRole::EventStream
            })
        ));
        assert!(matches!(conn.receive(), Err(ClientError::Closed { .. })));
        host.join().unwrap();
    }

    #[test]
    fn failed_shutdown_still_releases_the_socket() {
        let (address, host) = echo_host();
        let conn = Connection::dial(&address, ConnectionRole::Command, &config()).unwrap();
        conn.closed.store(true, Ordering::Release);

        let err = conn
            .release(Err(ClientError::Transport(
                wcfrpc_transport::TransportError::Io(std::io::Error::other("shutdown refused")),
            )))
            .unwrap_err();

        assert!(matches!(err, ClientError::Transport(_)));
        assert!(conn.io.lock().unwrap().is_none());
        assert!(matches!(conn.receive(), Err(ClientError::Closed { .. })));
        drop(conn);
        host.join().unwrap();
    }

    #[test]
    fn receive_timeout_is_not_fatal() {
        let (address, host) = echo_host();
        let conn = Connection::dial(&address, ConnectionRole::EventStream, &config()).unwrap();

        let err = conn.receive().unwrap_err();
        assert!(err.is_timeout());
        assert!(!conn.is_closed());

        conn.send(b"late").unwrap();
        assert_eq!(conn.receive().unwrap().as_ref(), b"late");

        conn.close().unwrap();
        host.join().unwrap();
    }

    #[test]
    fn failed_round_trip_poisons_connection() {
        let listener = TcpTransport::bind(&Address::new("127.0.0.1", 0)).unwrap();
        let address = listener.address().clone();
        // Handshakes, swallows one request, never answers.
        let host = thread::spawn(move || {
            let mut stream = listener.accept().unwrap();
            exchange_handshake(&mut stream, PAIR1_PROTOCOL).unwrap();
            let mut reader = FrameReader::new(stream);
            let _ = reader.read_frame();
            let _ = reader.read_frame();
        });

        let conn = Connection::dial(&address, ConnectionRole::Command, &config()).unwrap();
        let err = conn.round_trip(b"unanswered").unwrap_err();
        assert!(err.is_timeout());
        assert!(conn.is_closed());
        assert!(matches!(
            conn.round_trip(b"again"),
            Err(ClientError::Closed { .. })
        ));

        host.join().unwrap();
    }

    #[test]
    fn dial_refused_is_transport_error() {
        let port = {
            let listener = TcpTransport::bind(&Address::new("127.0.0.1", 0)).unwrap();
            listener.address().port()
        };
        let err = Connection::dial(
            &Address::new("127.0.0.1", port),
            ConnectionRole::Command,
            &config(),
        )
        .unwrap_err();
        assert!(matches!(err, ClientError::Transport(_)));
    }

    #[test]
    fn dial_rejects_wrong_protocol() {
        let listener = TcpTransport::bind(&Address::new("127.0.0.1", 0)).unwrap();
        let address = listener.address().clone();
        let host = thread::spawn(move || {
            let mut stream = listener.accept().unwrap();
            // pair0
            let _ = exchange_handshake(&mut stream, 0x0010);
        });

        let err = Connection::dial(&address, ConnectionRole::Command, &config()).unwrap_err();
        assert!(matches!(
            err,
            ClientError::Frame(FrameError::ProtocolMismatch { .. })
        ));
        host.join().unwrap();
    }
}
