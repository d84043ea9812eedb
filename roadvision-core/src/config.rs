//! Feed Configuration
//!
//! Broker address and topic are the tunables that matter; the rest default to
//! the values the dashboard has always used.
//!
//! ```rust
//! use std::time::Duration;
//! use roadvision_core::config::FeedConfig;
//!
//! let config = FeedConfig::new("ws://broker.local:9001", "processed_data_topic")
//!     .capacity(50)
//!     .reconnect_delay(Duration::from_millis(1000));
//!
//! assert!(config.validate().is_ok());
//! ```

use std::time::Duration;

use crate::{
    constants::feed::{
        CONNECT_TIMEOUT_MS, DEFAULT_BROKER_URL, DEFAULT_HISTORY_CAPACITY, DEFAULT_MQTT_PORT,
        DEFAULT_TOPIC, DEFAULT_WSS_PORT, DEFAULT_WS_PORT, KEEP_ALIVE_SECS, RECONNECT_DELAY_MS,
    },
    errors::{FeedError, FeedResult},
};

/// What to do when the broker rejects the subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubscribeFailurePolicy {
    /// Record the error and stay connected without retrying
    #[default]
    Surface,
    /// Treat it like a transport failure: back off, reconnect, subscribe again
    Reconnect,
}

/// Transport scheme of a broker address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrokerScheme {
    /// MQTT over WebSocket
    Ws,
    /// MQTT over TLS WebSocket
    Wss,
    /// Plain MQTT over TCP
    Tcp,
}

impl BrokerScheme {
    pub const fn default_port(&self) -> u16 {
        match self {
            BrokerScheme::Ws => DEFAULT_WS_PORT,
            BrokerScheme::Wss => DEFAULT_WSS_PORT,
            BrokerScheme::Tcp => DEFAULT_MQTT_PORT,
        }
    }

    pub const fn is_websocket(&self) -> bool {
        matches!(self, BrokerScheme::Ws | BrokerScheme::Wss)
    }
}

/// Parsed broker endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerAddress {
    pub scheme: BrokerScheme,
    pub host: String,
    pub port: u16,
    /// Request path for WebSocket endpoints, `/` when absent
    pub path: String,
}

impl BrokerAddress {
    /// Parse `scheme://host[:port][/path]`
    ///
    /// Accepted schemes: `ws`, `wss`, `mqtt`, `tcp`.
    pub fn parse(address: &str) -> FeedResult<Self> {
        let address = address.trim();
        let (scheme, rest) = address
            .split_once("://")
            .ok_or_else(|| FeedError::Config(format!("broker address '{address}' has no scheme")))?;

        let scheme = match scheme.to_ascii_lowercase().as_str() {
            "ws" => BrokerScheme::Ws,
            "wss" => BrokerScheme::Wss,
            "mqtt" | "tcp" => BrokerScheme::Tcp,
            other => {
                return Err(FeedError::Config(format!(
                    "unsupported broker scheme '{other}', expected ws, wss, mqtt or tcp"
                )))
            }
        };

        let (authority, path) = match rest.find('/') {
            Some(idx) => (&rest[..idx], &rest[idx..]),
            None => (rest, "/"),
        };

        let (host, port) = match authority.rsplit_once(':') {
            Some((host, port)) => {
                let port = port.parse::<u16>().map_err(|_| {
                    FeedError::Config(format!("invalid port '{port}' in broker address"))
                })?;
                (host, port)
            }
            None => (authority, scheme.default_port()),
        };

        if host.is_empty() {
            return Err(FeedError::Config(format!("broker address '{address}' has no host")));
        }

        Ok(Self {
            scheme,
            host: host.to_string(),
            port,
            path: path.to_string(),
        })
    }

    /// URL handed to a WebSocket client
    pub fn websocket_url(&self) -> String {
        let scheme = match self.scheme {
            BrokerScheme::Wss => "wss",
            _ => "ws",
        };
        format!("{scheme}://{}:{}{}", self.host, self.port, self.path)
    }
}

/// Telemetry feed configuration
#[derive(Debug, Clone, PartialEq)]
pub struct FeedConfig {
    /// Broker endpoint, e.g. `ws://localhost:9001`
    pub address: String,
    /// The single topic to subscribe to
    pub topic: String,
    /// Readings kept in history
    pub capacity: usize,
    /// Fixed delay between a failure and the next connect attempt
    pub reconnect_delay: Duration,
    /// Time allowed to establish a connection
    pub connect_timeout: Duration,
    /// MQTT keep-alive interval
    pub keep_alive: Duration,
    /// MQTT client id; generated when absent
    pub client_id: Option<String>,
    /// Reaction to a rejected subscription
    pub subscribe_failure: SubscribeFailurePolicy,
}

impl FeedConfig {
    /// Configuration for `address` and `topic` with default timing and capacity
    pub fn new(address: impl Into<String>, topic: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            topic: topic.into(),
            capacity: DEFAULT_HISTORY_CAPACITY,
            reconnect_delay: Duration::from_millis(RECONNECT_DELAY_MS),
            connect_timeout: Duration::from_millis(CONNECT_TIMEOUT_MS),
            keep_alive: Duration::from_secs(KEEP_ALIVE_SECS),
            client_id: None,
            subscribe_failure: SubscribeFailurePolicy::default(),
        }
    }

    /// Set history capacity
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Set reconnect backoff delay
    pub fn reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Set connect timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set MQTT keep-alive interval
    pub fn keep_alive(mut self, keep_alive: Duration) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    /// Set a fixed MQTT client id
    pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// Set reaction to a rejected subscription
    pub fn subscribe_failure(mut self, policy: SubscribeFailurePolicy) -> Self {
        self.subscribe_failure = policy;
        self
    }

    /// Parsed broker address
    pub fn broker(&self) -> FeedResult<BrokerAddress> {
        BrokerAddress::parse(&self.address)
    }

    /// Check the constraints `open` relies on
    pub fn validate(&self) -> FeedResult<()> {
        self.broker()?;

        if self.topic.trim().is_empty() {
            return Err(FeedError::Config("topic must not be empty".into()));
        }
        if self.capacity == 0 {
            return Err(FeedError::Config("history capacity must be at least 1".into()));
        }
        if self.connect_timeout.is_zero() {
            return Err(FeedError::Config("connect timeout must be non-zero".into()));
        }
        if !self.keep_alive.is_zero() && self.keep_alive < Duration::from_secs(1) {
            return Err(FeedError::Config("keep alive must be zero or at least 1 s".into()));
        }
        if matches!(&self.client_id, Some(id) if id.trim().is_empty()) {
            return Err(FeedError::Config("client id must not be empty".into()));
        }
        Ok(())
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BROKER_URL, DEFAULT_TOPIC)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_dashboard() {
        let config = FeedConfig::default();
        assert_eq!(config.address, "ws://localhost:9001");
        assert_eq!(config.topic, "processed_data_topic");
        assert_eq!(config.capacity, 100);
        assert_eq!(config.reconnect_delay, Duration::from_millis(1000));
        assert_eq!(config.connect_timeout, Duration::from_millis(4000));
        assert_eq!(config.subscribe_failure, SubscribeFailurePolicy::Surface);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parses_websocket_address() {
        let broker = BrokerAddress::parse("ws://localhost:9001").unwrap();
        assert_eq!(broker.scheme, BrokerScheme::Ws);
        assert_eq!(broker.host, "localhost");
        assert_eq!(broker.port, 9001);
        assert_eq!(broker.path, "/");
        assert_eq!(broker.websocket_url(), "ws://localhost:9001/");

        let broker = BrokerAddress::parse("wss://broker.example.com/mqtt").unwrap();
        assert_eq!(broker.scheme, BrokerScheme::Wss);
        assert_eq!(broker.port, 443);
        assert_eq!(broker.path, "/mqtt");
    }

    #[test]
    fn parses_tcp_address() {
        let broker = BrokerAddress::parse("mqtt://10.0.0.5").unwrap();
        assert_eq!(broker.scheme, BrokerScheme::Tcp);
        assert_eq!(broker.port, 1883);
        assert!(!broker.scheme.is_websocket());
    }

    #[test]
    fn rejects_bad_addresses() {
        for address in ["localhost:9001", "http://localhost", "ws://:9001", "ws://host:port"] {
            assert!(
                matches!(BrokerAddress::parse(address), Err(FeedError::Config(_))),
                "{address} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_empty_topic_and_capacity() {
        assert!(FeedConfig::new("ws://localhost:9001", "  ").validate().is_err());
        assert!(FeedConfig::default().capacity(0).validate().is_err());
        assert!(FeedConfig::default().client_id("").validate().is_err());
    }
}
