//! Core data model for RoadVision telemetry
//!
//! Decodes processed road-sensor messages, keeps a bounded most-recent-first
//! history of them and tracks the connection state of the feed that delivers
//! them. The transport and the async driver live in `roadvision-connectors`.
//!
//! ```no_run
//! use roadvision_core::{decode_reading, buffer::CircularBuffer, Snapshot};
//! use std::sync::Arc;
//!
//! let mut history = CircularBuffer::new(100).unwrap();
//! # let body: &[u8] = b"{}";
//! match decode_reading(body) {
//!     Ok(reading) => { history.push(Arc::new(reading)); }
//!     Err(e) => { /* dropped, history unchanged */ }
//! }
//! let snapshot = Snapshot::from_history(&history);
//! ```

#![deny(unsafe_code)]

pub mod buffer;
pub mod config;
pub mod constants;
pub mod decode;
pub mod errors;
pub mod observer;
pub mod reading;
pub mod snapshot;
pub mod state;
pub mod validators;

// Public API
pub use config::{BrokerAddress, BrokerScheme, FeedConfig, SubscribeFailurePolicy};
pub use decode::{decode_reading, decode_str};
pub use errors::{DecodeError, FeedError, FeedResult, ValidationError};
pub use observer::{ObserverId, ObserverRegistry, UpdateCallback};
pub use reading::{
    AirQuality, AqiCategory, Axes, GpsPosition, Humidity, Light, Measurement, MeasurementKind,
    RoadState, SensorReading, Status, Temperature, TemperatureUnit, Vibration,
};
pub use snapshot::Snapshot;
pub use state::FeedState;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_exists() {
        assert!(!VERSION.is_empty());
    }
}
