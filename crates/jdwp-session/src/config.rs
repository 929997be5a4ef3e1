//! Runtime settings for a [`Session`](crate::Session).

use std::time::Duration;

/// Default address of a local VM started with `-agentlib:jdwp=transport=dt_socket,server=y`.
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5005;

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_millis(2000);
pub const DEFAULT_IO_TIMEOUT: Duration = Duration::from_millis(2000);

/// Capacity of the queue between callers and the outbound loop.
pub const DEFAULT_SUBMIT_QUEUE_CAPACITY: usize = 10;
/// Capacity of the queue carrying unsolicited packets to the consumer.
pub const DEFAULT_EVENT_QUEUE_CAPACITY: usize = 50;

/// Settings for one session.
///
/// | Field                     | Default     |
/// |---------------------------|-------------|
/// | `host`                    | `127.0.0.1` |
/// | `port`                    | `5005`      |
/// | `connect_timeout`         | 5 s         |
/// | `handshake_write_timeout` | 2 s         |
/// | `handshake_read_timeout`  | 2 s         |
/// | `read_timeout`            | 2 s         |
/// | `write_timeout`           | 2 s         |
/// | `submit_queue_capacity`   | 10          |
/// | `event_queue_capacity`    | 50          |
/// | `verify_handshake`        | `true`      |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub host: String,
    pub port: u16,
    /// Bound on dialling the target in [`Session::connect`](crate::Session::connect).
    pub connect_timeout: Duration,
    pub handshake_write_timeout: Duration,
    pub handshake_read_timeout: Duration,
    /// Bound on receiving the rest of a packet once its first byte arrived.
    ///
    /// Waiting for the *first* byte of a packet is never bounded: a VM can
    /// legitimately stay silent for a long time.
    pub read_timeout: Duration,
    /// Bound on writing one request.
    pub write_timeout: Duration,
    pub submit_queue_capacity: usize,
    pub event_queue_capacity: usize,
    /// Reject the session when the VM's handshake bytes differ from ours.
    pub verify_handshake: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            handshake_write_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
            handshake_read_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
            read_timeout: DEFAULT_IO_TIMEOUT,
            write_timeout: DEFAULT_IO_TIMEOUT,
            submit_queue_capacity: DEFAULT_SUBMIT_QUEUE_CAPACITY,
            event_queue_capacity: DEFAULT_EVENT_QUEUE_CAPACITY,
            verify_handshake: true,
        }
    }
}

impl SessionConfig {
    /// `host:port` string suitable for `TcpStream::connect`.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_matches_documented_values() {
        // Arrange / Act
        let cfg = SessionConfig::default();

        // Assert
        assert_eq!(cfg.address(), "127.0.0.1:5005");
        assert_eq!(cfg.handshake_write_timeout, Duration::from_secs(2));
        assert_eq!(cfg.handshake_read_timeout, Duration::from_secs(2));
        assert_eq!(cfg.read_timeout, Duration::from_secs(2));
        assert_eq!(cfg.write_timeout, Duration::from_secs(2));
        assert_eq!(cfg.submit_queue_capacity, 10);
        assert_eq!(cfg.event_queue_capacity, 50);
        assert!(cfg.verify_handshake);
    }

    #[test]
    fn test_address_formats_ipv6_host_verbatim() {
        let cfg = SessionConfig {
            host: "[::1]".to_string(),
            port: 8000,
            ..SessionConfig::default()
        };
        assert_eq!(cfg.address(), "[::1]:8000");
    }
}
