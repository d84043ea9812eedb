//! Broker Transports and the Live Telemetry Feed
//!
//! ## Overview
//!
//! This crate connects RoadVision to the message bus. It has two halves:
//!
//! - **Transports** ([`Transport`]): one long-lived pub/sub connection. The
//!   production implementation is [`mqtt::MqttTransport`], MQTT over
//!   WebSocket; tests inject scripted doubles through the same trait.
//! - **The feed** ([`feed`]): drives a transport, subscribes to one topic,
//!   decodes every message into a `SensorReading` and keeps the bounded
//!   history views read from.
//!
//! ## Connection Lifecycle
//!
//! ```text
//! open ──▶ Connecting ──▶ Connected ──▶ Subscribed ──▶ (messages)
//!              ▲              │              │
//!              │              ▼              ▼
//!              └──(1s)─── Errored ◀──────────┘
//! ```
//!
//! Transport failures never end the feed. It waits the reconnect delay,
//! connects again and re-subscribes; the history collected so far is kept.
//!
//! ## Threading
//!
//! The feed is single-threaded. Its driver runs as a `spawn_local` task, so
//! `open` must be called inside a `tokio::task::LocalSet`. All state is owned
//! by the feed and shared through `Rc`, and callbacks run on the driver task.
//!
//! ## Example Usage
//!
//! ```no_run
//! use roadvision_connectors::feed;
//! use roadvision_core::FeedConfig;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let local = tokio::task::LocalSet::new();
//! local.run_until(async {
//!     let handle = feed::open(FeedConfig::default())?;
//!     handle.on_update(|snapshot| {
//!         if let Some(latest) = snapshot.latest() {
//!             println!("road is {}", latest.road_state());
//!         }
//!     })?;
//!     # handle.close();
//!     Ok::<_, roadvision_core::FeedError>(())
//! }).await?;
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use thiserror::Error;

use roadvision_core::FeedError;

pub mod feed;

#[cfg(feature = "mqtt")]
pub mod mqtt;

// Re-export common types
pub use feed::{open_with, FeedHandle};

#[cfg(feature = "mqtt")]
pub use feed::open;

#[cfg(feature = "mqtt")]
pub use mqtt::MqttTransport;

/// Transport-level failures
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TransportError {
    #[error("connect failed: {0}")]
    Connect(String),

    #[error("connect timed out after {0} ms")]
    Timeout(u64),

    #[error("connection lost: {0}")]
    Connection(String),

    #[error("subscribe request failed: {0}")]
    Subscribe(String),
}

impl From<TransportError> for FeedError {
    fn from(err: TransportError) -> Self {
        FeedError::Transport(err.to_string())
    }
}

/// Something a transport observed while being polled
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// Connection (re)established
    Connected,
    /// Broker acknowledged the subscription
    Subscribed,
    /// Broker refused the subscription
    SubscribeRejected(String),
    /// A message published on the subscribed topic
    Message {
        topic: String,
        payload: Vec<u8>,
    },
    /// Protocol traffic with no meaning for the feed (pings, acks)
    Idle,
}

/// A pub/sub connection to one broker
///
/// `poll` drives the connection: the first call connects, and the first call
/// after an error reconnects. Implementations do not retry on their own; the
/// feed decides when to poll again.
#[async_trait(?Send)]
pub trait Transport {
    /// Wait for the next event, connecting first if needed
    async fn poll(&mut self) -> Result<TransportEvent, TransportError>;

    /// Request a subscription to `topic`
    ///
    /// Success only means the request went out; acknowledgement arrives later
    /// through `poll` as `Subscribed` or `SubscribeRejected`, unless
    /// `acknowledges_subscribe` is `false`.
    async fn subscribe(&mut self, topic: &str) -> Result<(), TransportError>;

    /// Whether the broker acknowledges subscriptions
    ///
    /// When `false` the feed treats a successful `subscribe` as subscribed.
    fn acknowledges_subscribe(&self) -> bool {
        true
    }

    /// Release the connection; must be safe to call when never connected
    async fn disconnect(&mut self);
}

/// Counters kept by a feed
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FeedStats {
    /// Messages delivered by the transport
    pub messages_received: u64,
    /// Messages decoded into history
    pub messages_decoded: u64,
    /// Messages dropped: undecodable, or delivered while not subscribed
    pub messages_dropped: u64,
    /// Successful connections after the first
    pub reconnections: u32,
    /// Transport failures seen
    pub transport_errors: u32,
    /// Last error message
    pub last_error: Option<String>,
}
