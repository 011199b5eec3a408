use crossbeam::channel::{self, Receiver, Sender, TrySendError};
use tracing::{debug, warn};

use crate::cancel::CancelToken;
use crate::error::{ClientError, Result};
use crate::message::Message;

/// Non-blocking enqueue attempts made by [`MessageBuffer::put`].
pub const PUT_ATTEMPTS: usize = 3;

/// A message `put` could not enqueue, handed back to the caller.
#[derive(Debug, thiserror::Error)]
#[error("{error}")]
pub struct RejectedMessage {
    message: Box<Message>,
    #[source]
    error: ClientError,
}

impl RejectedMessage {
    pub fn error(&self) -> &ClientError {
        &self.error
    }

    pub fn into_message(self) -> Message {
        *self.message
    }

    pub fn into_parts(self) -> (Message, ClientError) {
        (*self.message, self.error)
    }
}

impl From<RejectedMessage> for ClientError {
    fn from(rejected: RejectedMessage) -> Self {
        rejected.error
    }
}

/// Fixed-capacity FIFO between the event listener and consumers.
///
/// `put` never blocks: a full buffer rejects the message after
/// [`PUT_ATTEMPTS`] tries. `get` blocks until a message arrives or the
/// token fires.
#[derive(Debug)]
pub struct MessageBuffer {
    tx: Sender<Message>,
    rx: Receiver<Message>,
    capacity: usize,
}

impl MessageBuffer {
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(ClientError::InvalidCapacity);
        }
        let (tx, rx) = channel::bounded(capacity);
        Ok(Self { tx, rx, capacity })
    }

    pub fn put(
        &self,
        message: Message,
        token: &CancelToken,
    ) -> std::result::Result<(), RejectedMessage> {
        let mut message = message;
        for attempt in 1..=PUT_ATTEMPTS {
            if let Err(error) = token.check() {
                return Err(reject(message, error));
            }
            match self.tx.try_send(message) {
                Ok(()) => {
                    debug!(len = self.tx.len(), "message buffered");
                    return Ok(());
                }
                Err(TrySendError::Full(returned)) => {
                    warn!(
                        attempt,
                        attempts = PUT_ATTEMPTS,
                        capacity = self.capacity,
                        "message buffer is full"
                    );
                    message = returned;
                }
                // The buffer holds its own receiver.
                Err(TrySendError::Disconnected(returned)) => {
                    return Err(reject(returned, ClientError::Cancelled));
                }
            }
        }

        warn!(message_id = message.message_id, "dropping message from full buffer");
        Err(reject(
            message,
            ClientError::BufferFull {
                capacity: self.capacity,
                attempts: PUT_ATTEMPTS,
            },
        ))
    }

    /// Wait for the oldest message.
    pub fn get(&self, token: &CancelToken) -> Result<Message> {
        token.check()?;
        let timeout = match token.deadline() {
            Some(deadline) => channel::at(deadline),
            None => channel::never(),
        };
        crossbeam::select! {
            recv(self.rx) -> message => message.map_err(|_| ClientError::Cancelled),
            recv(token.done()) -> _ => Err(ClientError::Cancelled),
            recv(timeout) -> _ => Err(ClientError::DeadlineExceeded),
        }
    }

    /// Take a message if one is ready.
    pub fn try_get(&self) -> Option<Message> {
        self.rx.try_recv().ok()
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

fn reject(message: Message, error: ClientError) -> RejectedMessage {
    RejectedMessage {
        message: Box::new(message),
        error,
    }
}
