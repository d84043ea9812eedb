//! Feed Defaults
//!
//! Values observed in the deployed dashboard and its broker setup.

// ===== BROKER =====

/// Default broker endpoint (MQTT over WebSocket).
///
/// Matches the Mosquitto WebSocket listener shipped with the road-vision
/// docker setup.
pub const DEFAULT_BROKER_URL: &str = "ws://localhost:9001";

/// Topic carrying processed (road-state classified) agent data.
pub const DEFAULT_TOPIC: &str = "processed_data_topic";

/// Default port for plain `ws://` endpoints without an explicit port.
pub const DEFAULT_WS_PORT: u16 = 80;

/// Default port for `wss://` endpoints without an explicit port.
pub const DEFAULT_WSS_PORT: u16 = 443;

/// Default port for `mqtt://` and `tcp://` endpoints without an explicit port.
pub const DEFAULT_MQTT_PORT: u16 = 1883;

// ===== HISTORY =====

/// Readings kept by the feed.
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

/// Readings shown by the dashboard table and chart.
pub const DASHBOARD_HISTORY_LEN: usize = 50;

// ===== TIMING =====

/// Fixed delay between a transport failure and the next connect attempt (ms).
pub const RECONNECT_DELAY_MS: u64 = 1000;

/// Time allowed for the transport to establish a connection (ms).
pub const CONNECT_TIMEOUT_MS: u64 = 4000;

/// MQTT keep-alive interval (s).
pub const KEEP_ALIVE_SECS: u64 = 60;

/// Time allowed for a DISCONNECT to be flushed on close (ms).
pub const DISCONNECT_GRACE_MS: u64 = 500;
