use std::time::Duration;

use wcfrpc_frame::{FrameConfig, DEFAULT_MAX_PAYLOAD};
use wcfrpc_transport::Address;

use crate::connection::ConnectionRole;
use crate::error::{ClientError, Result};

/// Send/receive deadline applied to host sockets.
pub const DEFAULT_DEADLINE: Duration = Duration::from_millis(5000);

/// Upper bound on establishing the TCP connection.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(5000);

/// Message buffer capacity used when the caller does not pick one.
pub const DEFAULT_BUFFER_CAPACITY: usize = 128;

/// Per-connection settings.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Send and receive deadline. `None` blocks indefinitely.
    pub deadline: Option<Duration>,
    /// TCP connect timeout. `None` uses the OS default.
    pub connect_timeout: Option<Duration>,
    /// Largest accepted message payload.
    pub max_payload_size: usize,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            deadline: Some(DEFAULT_DEADLINE),
            connect_timeout: Some(DEFAULT_CONNECT_TIMEOUT),
            max_payload_size: DEFAULT_MAX_PAYLOAD,
        }
    }
}

impl ConnectionConfig {
    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_max_payload_size(mut self, size: usize) -> Self {
        self.max_payload_size = size;
        self
    }

    pub(crate) fn frame_config(&self) -> FrameConfig {
        FrameConfig {
            max_payload_size: self.max_payload_size,
            ..FrameConfig::default()
        }
        .with_deadline(self.deadline)
    }
}

/// Addresses and settings for a client and its event listener.
///
/// The two connections are configured independently. When only the command
/// address is given, the event stream defaults to the next port on the same
/// host, which is how the host lays them out unless told otherwise.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub command_address: Address,
    pub event_address: Address,
    pub connection: ConnectionConfig,
    pub buffer_capacity: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        let command_address = Address::default();
        let event_address = command_address.with_port(command_address.port() + 1);
        Self {
            command_address,
            event_address,
            connection: ConnectionConfig::default(),
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
        }
    }
}

impl ClientConfig {
    /// Config for a host at `command_address`, events on the next port.
    pub fn new(command_address: Address) -> Result<Self> {
        let event_address = command_address.next_port()?;
        Ok(Self {
            command_address,
            event_address,
            ..Self::default()
        })
    }

    pub fn with_event_address(mut self, address: Address) -> Self {
        self.event_address = address;
        self
    }

    pub fn with_connection(mut self, connection: ConnectionConfig) -> Self {
        self.connection = connection;
        self
    }

    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.connection.deadline = deadline;
        self
    }

    /// Zero is rejected.
    pub fn with_buffer_capacity(mut self, capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(ClientError::InvalidCapacity);
        }
        self.buffer_capacity = capacity;
        Ok(self)
    }

    pub fn address_for(&self, role: ConnectionRole) -> &Address {
        match role {
            ConnectionRole::Command => &self.command_address,
            ConnectionRole::EventStream => &self.event_address,
        }
    }
}
