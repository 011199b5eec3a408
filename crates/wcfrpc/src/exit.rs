use std::fmt;
use std::io;

use wcfrpc_client::{CallStatus, ClientError};
use wcfrpc_frame::FrameError;
use wcfrpc_transport::TransportError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn usage(message: impl Into<String>) -> Self {
        Self::new(USAGE, message)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::ConnectionRefused
        | io::ErrorKind::ConnectionReset
        | io::ErrorKind::ConnectionAborted
        | io::ErrorKind::NotConnected
        | io::ErrorKind::BrokenPipe => TRANSPORT_ERROR,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::InvalidAddress { .. } => CliError::usage(format!("{context}: {err}")),
        TransportError::Connect { ref source, .. } if !is_timeout(source) => {
            CliError::new(TRANSPORT_ERROR, format!("{context}: {err}"))
        }
        TransportError::Connect { source, .. }
        | TransportError::Bind { source, .. }
        | TransportError::Accept(source)
        | TransportError::Io(source) => io_error(context, source),
    }
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::Io(source) => io_error(context, source),
        FrameError::PayloadTooLarge { .. } | FrameError::MalformedHeader(_) => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        FrameError::ConnectionClosed
        | FrameError::InvalidHandshake(_)
        | FrameError::ProtocolMismatch { .. } => {
            CliError::new(TRANSPORT_ERROR, format!("{context}: {err}"))
        }
    }
}

pub fn client_error(context: &str, err: ClientError) -> CliError {
    match err {
        ClientError::Transport(err) => transport_error(context, err),
        ClientError::Frame(err) => frame_error(context, err),
        ClientError::Decode(_) => CliError::new(DATA_INVALID, format!("{context}: {err}")),
        ClientError::DeadlineExceeded => CliError::new(TIMEOUT, format!("{context}: {err}")),
        ClientError::InvalidCapacity => CliError::usage(format!("{context}: {err}")),
        ClientError::NotConnected { .. } | ClientError::Closed { .. } => {
            CliError::new(TRANSPORT_ERROR, format!("{context}: {err}"))
        }
        ClientError::Call { function, source } => {
            client_error(&format!("{context}: {function}"), *source)
        }
        ClientError::Handler(_) => CliError::new(INTERNAL, format!("{context}: {err}")),
        ClientError::BufferFull { .. }
        | ClientError::Cancelled
        | ClientError::Indeterminate { .. } => CliError::new(FAILURE, format!("{context}: {err}")),
    }
}

/// Exit code for a host status: success or `FAILURE`.
pub fn status_code(status: &CallStatus) -> i32 {
    if status.is_success() {
        SUCCESS
    } else {
        FAILURE
    }
}

fn is_timeout(err: &io::Error) -> bool {
    wcfrpc_transport::error::is_timeout_kind(err.kind())
}
