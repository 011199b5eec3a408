use std::fmt;
use std::str::FromStr;

use crate::error::{Result, TransportError};

/// Default command endpoint of a locally running host.
pub const DEFAULT_COMMAND_ADDRESS: &str = "tcp://127.0.0.1:10086";

const SCHEME: &str = "tcp://";

/// A host endpoint in `tcp://host:port` form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address {
    host: String,
    port: u16,
}

impl Address {
    /// Build an address from its parts.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Parse a `tcp://host:port` string.
    pub fn parse(input: &str) -> Result<Self> {
        let invalid = |reason: &str| TransportError::InvalidAddress {
            address: input.to_string(),
            reason: reason.to_string(),
        };

        let rest = input
            .trim()
            .strip_prefix(SCHEME)
            .ok_or_else(|| invalid("expected tcp:// scheme"))?;
        let (host, port) = rest
            .rsplit_once(':')
            .ok_or_else(|| invalid("missing port"))?;

        let host = host.trim_start_matches('[').trim_end_matches(']');
        if host.is_empty() {
            return Err(invalid("missing host"));
        }
        let port: u16 = port.parse().map_err(|_| invalid("port is not a number"))?;

        Ok(Self::new(host, port))
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Same host, explicit port.
    pub fn with_port(&self, port: u16) -> Self {
        Self::new(self.host.clone(), port)
    }

    /// Same host, port + 1.
    ///
    /// The host publishes its event stream next to the command port by
    /// convention. This only seeds the default event address; callers can
    /// configure the event endpoint independently.
    pub fn next_port(&self) -> Result<Self> {
        let port = self
            .port
            .checked_add(1)
            .ok_or_else(|| TransportError::InvalidAddress {
                address: self.to_string(),
                reason: "no port follows 65535".to_string(),
            })?;
        Ok(self.with_port(port))
    }

    /// `(host, port)` pair suitable for `ToSocketAddrs`.
    pub fn socket_target(&self) -> (&str, u16) {
        (self.host.as_str(), self.port)
    }
}

impl Default for Address {
    fn default() -> Self {
        Self::new("127.0.0.1", 10086)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "{SCHEME}[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{SCHEME}{}:{}", self.host, self.port)
        }
    }
}

impl FromStr for Address {
    type Err = TransportError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl From<std::net::SocketAddr> for Address {
    fn from(addr: std::net::SocketAddr) -> Self {
        Self::new(addr.ip().to_string(), addr.port())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_default_command_address() {
        let addr = Address::parse(DEFAULT_COMMAND_ADDRESS).unwrap();
        assert_eq!(addr.host(), "127.0.0.1");
        assert_eq!(addr.port(), 10086);
        assert_eq!(addr, Address::default());
        assert_eq!(addr.to_string(), DEFAULT_COMMAND_ADDRESS);
    }

    #[test]
    fn parses_bracketed_ipv6() {
        let addr: Address = "tcp://[::1]:9000".parse().unwrap();
        assert_eq!(addr.host(), "::1");
        assert_eq!(addr.to_string(), "tcp://[::1]:9000");
    }

    #[test]
    fn rejects_bad_addresses() {
        for input in [
            "127.0.0.1:10086",
            "ipc:///tmp/host.ipc",
            "tcp://127.0.0.1",
            "tcp://:10086",
            "tcp://host:port",
            "tcp://host:70000",
        ] {
            let err = Address::parse(input).unwrap_err();
            assert!(
                matches!(err, TransportError::InvalidAddress { .. }),
                "{input} should be rejected"
            );
        }
    }

    #[test]
    fn next_port_increments() {
        let addr = Address::default().next_port().unwrap();
        assert_eq!(addr.to_string(), "tcp://127.0.0.1:10087");
    }

    #[test]
    fn next_port_overflow_is_an_error() {
        let addr = Address::new("localhost", u16::MAX);
        assert!(addr.next_port().is_err());
    }
}
