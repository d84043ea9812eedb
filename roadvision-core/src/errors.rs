//! Error Types for Telemetry Ingestion
//!
//! ## Error Categories
//!
//! Errors fall into three groups, and none of them is fatal to a running feed:
//!
//! ### Per-message failures
//! - `DecodeError`: the message body is not UTF-8, not JSON of the canonical
//!   shape, or carries values that fail validation. The message is dropped and
//!   history is untouched. A feed only counts these in its stats; they never
//!   become a `FeedError`.
//! - `ValidationError`: the value-level reason behind `DecodeError::Invalid`.
//!
//! ### Connection failures
//! - `FeedError::Transport`: connection refused, dropped, or timed out. The feed
//!   enters `errored` and reconnects after the backoff delay.
//! - `FeedError::Subscribe`: the broker rejected the topic.
//!
//! ### Misuse
//! - `FeedError::Closed`: an operation that needs a live feed was called on a
//!   closed handle.
//! - `FeedError::Config`: the feed was opened with an invalid configuration.
//! - `FeedError::InvalidTransition`: an event arrived that the state machine
//!   does not accept in its current state.
//!
//! ## Error Handling Strategy
//!
//! ```rust
//! use roadvision_core::{decode_reading, DecodeError};
//!
//! match decode_reading(b"{\"road_state\": \"dry\"}") {
//!     Ok(reading) => { /* push into history */ }
//!     Err(DecodeError::Json(reason)) => { /* malformed or incomplete body */ }
//!     Err(other) => { /* non UTF-8 or values out of range */ }
//! }
//! ```

use thiserror::Error;

use crate::state::FeedState;

/// Result type for feed operations
pub type FeedResult<T> = Result<T, FeedError>;

/// Value-level validation failures found while decoding a reading
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Value outside the range the measurement can physically take
    #[error("{field}: value {value} outside range [{min}, {max}]")]
    OutOfRange {
        /// Dotted path of the offending field
        field: &'static str,
        /// The value that failed validation
        value: f64,
        /// Minimum acceptable value
        min: f64,
        /// Maximum acceptable value
        max: f64,
    },

    /// Value makes no numeric sense (NaN, infinity)
    #[error("{field}: not a finite number")]
    InvalidValue {
        /// Dotted path of the offending field
        field: &'static str,
    },

    /// A categorical field that must carry a label was empty
    #[error("{field}: must not be empty")]
    Empty {
        /// Dotted path of the offending field
        field: &'static str,
    },
}

/// Failures turning a raw message body into a `SensorReading`
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    /// Body is not valid UTF-8
    #[error("message body is not valid UTF-8")]
    Utf8,

    /// Body is not JSON, or required fields are missing or mistyped
    #[error("malformed reading: {0}")]
    Json(String),

    /// Body parsed but a value failed validation
    #[error("invalid reading: {0}")]
    Invalid(#[from] ValidationError),
}

impl From<serde_json::Error> for DecodeError {
    fn from(err: serde_json::Error) -> Self {
        DecodeError::Json(err.to_string())
    }
}

/// Errors surfaced by a telemetry feed
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FeedError {
    /// Connection refused, dropped, or timed out
    #[error("transport error: {0}")]
    Transport(String),

    /// Broker rejected the subscription
    #[error("subscribe to '{topic}' failed: {reason}")]
    Subscribe {
        /// Topic the feed tried to subscribe to
        topic: String,
        /// Reason reported by the transport or broker
        reason: String,
    },

    /// Operation on a handle whose feed has been closed
    #[error("feed is closed")]
    Closed,

    /// Invalid feed configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// Event not accepted by the feed state machine
    #[error("invalid state transition {from:?} -> {to:?}")]
    InvalidTransition {
        /// State the feed was in
        from: FeedState,
        /// State the event asked for
        to: FeedState,
    },
}

impl FeedError {
    /// Whether the feed keeps running after this error
    ///
    /// Only misuse errors are reported back to the caller as failures; everything
    /// else is absorbed by the feed's retry and drop policies.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, FeedError::Closed | FeedError::Config(_))
    }
}
