use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam::channel::{self, Receiver, Sender};
use serde::Serialize;
use tracing::{debug, info, warn};
use wcfrpc_proto::{decode_response, ResponsePayload, WxMsg};
use wcfrpc_transport::Address;

use crate::cancel::CancelToken;
use crate::client::ReceiveFlag;
use crate::config::ConnectionConfig;
use crate::connection::{Connection, ConnectionRole};
use crate::error::Result;

/// How often the watcher samples the receive flag.
const FLAG_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Consumes inbound events. Each call runs on its own thread.
pub trait EventHandler: Send + Sync + 'static {
    fn handle(&self, event: WxMsg) -> Result<()>;
}

impl<F> EventHandler for F
where
    F: Fn(WxMsg) -> Result<()> + Send + Sync + 'static,
{
    fn handle(&self, event: WxMsg) -> Result<()> {
        self(event)
    }
}

/// An event that was received but not handled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HandlerFailure {
    /// `None` when the frame could not be decoded.
    pub message_id: Option<u64>,
    pub error: String,
}

/// Receives pushed messages on the event-stream connection.
///
/// The loop stops when the receive flag is cleared (returns `Ok`), when the
/// token fires (returns its error), or on a receive error other than a
/// deadline expiry. The connection is closed in every case. There is no
/// reconnect.
///
/// A watcher thread closes the connection as soon as the token fires or the
/// flag is cleared, so a receive blocked without a deadline still returns.
pub struct EventListener {
    address: Address,
    config: ConnectionConfig,
    receiving: ReceiveFlag,
    failures_tx: Sender<HandlerFailure>,
    failures_rx: Receiver<HandlerFailure>,
}

impl EventListener {
    pub fn new(address: Address, config: ConnectionConfig, receiving: ReceiveFlag) -> Self {
        let (failures_tx, failures_rx) = channel::unbounded();
        Self {
            address,
            config,
            receiving,
            failures_tx,
            failures_rx,
        }
    }

    /// Report failures into `sender` instead of the listener's own channel.
    pub fn with_failures(mut self, sender: Sender<HandlerFailure>) -> Self {
        self.failures_tx = sender;
        self
    }

    /// Failures reported into the listener's own channel.
    pub fn failures(&self) -> Receiver<HandlerFailure> {
        self.failures_rx.clone()
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Dial the event stream and dispatch events until stopped.
    pub fn run<H: EventHandler>(&self, token: &CancelToken, handler: H) -> Result<()> {
        let connection = Connection::dial(&self.address, ConnectionRole::EventStream, &self.config)?;
        let handler = Arc::new(handler);
        info!(address = %self.address, "event listener started");

        let result = thread::scope(|scope| {
            let (stop_tx, stop_rx) = channel::bounded::<()>(0);
            let connection = &connection;
            let watcher = thread::Builder::new()
                .name("wcfrpc-event-watch".into())
                .spawn_scoped(scope, move || self.watch(connection, token, &stop_rx));
            if let Err(err) = &watcher {
                warn!(error = %err, "could not spawn event watcher");
            }

            let result = self.receive_loop(connection, token, &handler);
            drop(stop_tx);
            if let Ok(watcher) = watcher {
                if watcher.join().is_err() {
                    warn!("event watcher panicked");
                }
            }
            result
        });

        if let Err(err) = connection.close() {
            debug!(error = %err, "event connection close failed");
        }
        match &result {
            Ok(()) => info!("event listener stopped"),
            Err(err) => info!(error = %err, "event listener stopped"),
        }
        result
    }

    fn receive_loop<H: EventHandler>(
        &self,
        connection: &Connection,
        token: &CancelToken,
        handler: &Arc<H>,
    ) -> Result<()> {
        loop {
            if !self.receiving.is_set() {
                return Ok(());
            }
            token.check()?;

            let bytes = match connection.receive() {
                Ok(bytes) => bytes,
                Err(err) if err.is_timeout() => continue,
                Err(err) => {
                    // Closed by the watcher: report why it stopped instead.
                    if !self.receiving.is_set() {
                        return Ok(());
                    }
                    token.check()?;
                    warn!(error = %err, "event stream receive failed");
                    return Err(err);
                }
            };

            let event = match decode_response(&bytes) {
                Ok(response) => match response.msg {
                    Some(ResponsePayload::Wxmsg(event)) => event,
                    other => {
                        let error = format!("event frame carries no message ({other:?})");
                        warn!(%error, "skipping event");
                        self.report(None, error);
                        continue;
                    }
                },
                Err(err) => {
                    warn!(error = %err, size = bytes.len(), "skipping undecodable event");
                    self.report(None, err.to_string());
                    continue;
                }
            };

            self.dispatch(event, handler);
        }
    }

    /// Close `connection` once the token fires or the flag is cleared.
    /// Returns without closing when `stop` disconnects.
    fn watch(&self, connection: &Connection, token: &CancelToken, stop: &Receiver<()>) {
        let expiry = token
            .deadline()
            .map(channel::at)
            .unwrap_or_else(channel::never::<Instant>);
        let poll = channel::tick(FLAG_POLL_INTERVAL);

        loop {
            crossbeam::select! {
                recv(stop) -> _ => return,
                recv(token.done()) -> _ => break,
                recv(expiry) -> _ => break,
                recv(poll) -> _ => {
                    if !self.receiving.is_set() {
                        break;
                    }
                }
            }
        }

        debug!("event listener stop requested; closing connection");
        if let Err(err) = connection.close() {
            debug!(error = %err, "event connection close failed");
        }
    }

    fn dispatch<H: EventHandler>(&self, event: WxMsg, handler: &Arc<H>) {
        let id = event.id;
        debug!(message_id = id, msg_type = event.r#type, "event received");

        let handler = Arc::clone(handler);
        let failures = self.failures_tx.clone();
        let spawned = thread::Builder::new()
            .name(format!("wcfrpc-event-{id}"))
            .spawn(move || {
                if let Err(err) = handler.handle(event) {
                    warn!(message_id = id, error = %err, "event handler failed");
                    send_failure(
                        &failures,
                        HandlerFailure {
                            message_id: Some(id),
                            error: err.to_string(),
                        },
                    );
                }
            });

        if let Err(err) = spawned {
            warn!(message_id = id, error = %err, "could not spawn event handler");
            self.report(Some(id), err.to_string());
        }
    }

    fn report(&self, message_id: Option<u64>, error: String) {
        send_failure(&self.failures_tx, HandlerFailure { message_id, error });
    }
}

fn send_failure(sender: &Sender<HandlerFailure>, failure: HandlerFailure) {
    if let Err(err) = sender.try_send(failure) {
        debug!(failure = ?err.into_inner(), "failure channel unavailable; dropping report");
    }
}

impl std::fmt::Debug for EventListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventListener")
            .field("address", &self.address.to_string())
            .field("receiving", &self.receiving.is_set())
            .finish_non_exhaustive()
    }
}
