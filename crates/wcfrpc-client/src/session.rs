use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use crossbeam::channel::{self, Receiver, Sender};
use tracing::{debug, info, warn};
use wcfrpc_proto::WxMsg;

use crate::buffer::MessageBuffer;
use crate::cancel::CancelToken;
use crate::client::RpcClient;
use crate::config::ClientConfig;
use crate::directory::{ContactSource, Directory};
use crate::error::{ClientError, Result};
use crate::identity::IdentityKind;
use crate::listener::{EventListener, HandlerFailure};
use crate::message::{Message, Responder};
use crate::status::CallStatus;

/// Replies through the client, friendship through the directory.
struct ClientResponder {
    client: Arc<RpcClient>,
    directory: Arc<Directory>,
}

impl Responder for ClientResponder {
    fn reply_text(&self, to: &str, text: &str, mentions: &[&str]) -> Result<CallStatus> {
        self.client.send_text(to, text, mentions)
    }

    fn is_friend(&self, wxid: &str) -> bool {
        self.directory.is(wxid, IdentityKind::Peer)
    }
}

struct ListenerHandle {
    token: CancelToken,
    thread: JoinHandle<Result<()>>,
}

/// A connected client with its directory, message buffer and event listener.
pub struct Session {
    config: ClientConfig,
    client: Arc<RpcClient>,
    directory: Arc<Directory>,
    buffer: Arc<MessageBuffer>,
    responder: Arc<ClientResponder>,
    failures_tx: Sender<HandlerFailure>,
    failures_rx: Receiver<HandlerFailure>,
    listener: Mutex<Option<ListenerHandle>>,
}

impl Session {
    /// Dial the command connection and set up an idle session.
    pub fn connect(config: ClientConfig) -> Result<Self> {
        let buffer = Arc::new(MessageBuffer::new(config.buffer_capacity)?);
        let client = Arc::new(RpcClient::dial(config.clone())?);
        let source: Arc<dyn ContactSource> = client.clone();
        let directory = Arc::new(Directory::new(source));
        let responder = Arc::new(ClientResponder {
            client: Arc::clone(&client),
            directory: Arc::clone(&directory),
        });
        let (failures_tx, failures_rx) = channel::unbounded();

        Ok(Self {
            config,
            client,
            directory,
            buffer,
            responder,
            failures_tx,
            failures_rx,
            listener: Mutex::new(None),
        })
    }

    pub fn client(&self) -> &Arc<RpcClient> {
        &self.client
    }

    pub fn directory(&self) -> &Arc<Directory> {
        &self.directory
    }

    pub fn buffer(&self) -> &Arc<MessageBuffer> {
        &self.buffer
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Ask the host to publish messages and start buffering them.
    ///
    /// The listener is only started when the host accepted. Calling this
    /// while a listener is running re-sends the request without starting a
    /// second listener.
    pub fn start_receiving(&self) -> Result<CallStatus> {
        let status = self.client.enable_receiving()?;
        if !status.is_success() {
            return Ok(status);
        }

        let mut slot = self.lock_listener();
        if slot.as_ref().is_some_and(|handle| !handle.thread.is_finished()) {
            debug!("event listener already running");
            return Ok(status);
        }
        if let Some(finished) = slot.take() {
            log_listener_exit(finished.thread.join());
        }

        let token = CancelToken::new();
        let listener = EventListener::new(
            self.config.event_address.clone(),
            self.config.connection.clone(),
            self.client.receive_flag(),
        )
        .with_failures(self.failures_tx.clone());

        let buffer = Arc::clone(&self.buffer);
        let responder: Arc<dyn Responder> = self.responder.clone();
        let put_token = token.clone();
        let run_token = token.clone();

        let thread = thread::Builder::new()
            .name("wcfrpc-listener".to_string())
            .spawn(move || {
                listener.run(&run_token, move |event: WxMsg| {
                    let message =
                        Message::from_event(event).with_responder(Arc::clone(&responder));
                    buffer.put(message, &put_token).map_err(ClientError::from)
                })
            })
            .map_err(|err| ClientError::Handler(format!("could not spawn listener: {err}")))?;

        info!(address = %self.config.event_address, "receiving started");
        *slot = Some(ListenerHandle { token, thread });
        Ok(status)
    }

    pub fn is_receiving(&self) -> bool {
        self.lock_listener()
            .as_ref()
            .is_some_and(|handle| !handle.thread.is_finished())
    }

    /// Wait for the next buffered message.
    pub fn next_message(&self, token: &CancelToken) -> Result<Message> {
        self.buffer.get(token)
    }

    /// Failures from event handling: undecodable frames and rejected puts.
    pub fn failures(&self) -> Receiver<HandlerFailure> {
        self.failures_rx.clone()
    }

    /// Stop the listener and tell the host to stop publishing.
    ///
    /// Returns the listener's own result if it ended with an error, otherwise
    /// the result of the disable call.
    pub fn stop_receiving(&self) -> Result<()> {
        let disabled = self.client.disable_receiving();
        if let Err(err) = &disabled {
            warn!(error = %err, "disable receiving failed; stopping listener anyway");
        }

        if let Some(handle) = self.lock_listener().take() {
            handle.token.cancel();
            match handle.thread.join() {
                Ok(Ok(())) | Ok(Err(ClientError::Cancelled)) => {}
                Ok(Err(err)) => return Err(err),
                Err(_) => return Err(ClientError::Handler("event listener panicked".into())),
            }
        }
        disabled.map(|_| ())
    }

    /// Stop receiving and close the command connection.
    pub fn close(&self) -> Result<()> {
        if let Err(err) = self.stop_receiving() {
            debug!(error = %err, "stop receiving during close failed");
        }
        self.client.close()
    }

    fn lock_listener(&self) -> std::sync::MutexGuard<'_, Option<ListenerHandle>> {
        self.listener.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(handle) = self.lock_listener().take() {
            self.client.receive_flag().clear();
            handle.token.cancel();
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("client", &self.client)
            .field("directory", &self.directory)
            .field("buffered", &self.buffer.len())
            .field("receiving", &self.is_receiving())
            .finish()
    }
}

fn log_listener_exit(joined: thread::Result<Result<()>>) {
    match joined {
        Ok(Ok(())) => debug!("previous event listener exited"),
        Ok(Err(err)) => warn!(error = %err, "previous event listener exited with error"),
        Err(_) => warn!("previous event listener panicked"),
    }
}
