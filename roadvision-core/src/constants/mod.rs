//! Constants for RoadVision Core
//!
//! Numeric defaults and limits used across the workspace, grouped by domain:
//! - **Feed**: broker defaults, history sizes, reconnect timing
//! - **Sensors**: measurement ranges and classification thresholds
//!
//! ## Usage Guidelines
//!
//! 1. Always use these constants instead of magic numbers
//! 2. Include units in the name where a value has one
//! 3. Document where each value comes from

/// Feed defaults: broker endpoint, topic, history capacity and timing.
pub mod feed;

/// Measurement ranges and classification thresholds for road sensors.
pub mod sensors;

pub use feed::{
    DEFAULT_BROKER_URL, DEFAULT_TOPIC, DEFAULT_HISTORY_CAPACITY, DASHBOARD_HISTORY_LEN,
    RECONNECT_DELAY_MS, CONNECT_TIMEOUT_MS, KEEP_ALIVE_SECS,
};

pub use sensors::{
    HUMIDITY_MIN_PCT, HUMIDITY_MAX_PCT, ACCEL_LSB_PER_G,
    BUMP_THRESHOLD_G, HOLE_THRESHOLD_G, DARK_THRESHOLD_LUX,
};
