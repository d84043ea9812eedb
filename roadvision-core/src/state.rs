//! Feed Connection State Machine
//!
//! ```text
//!              open
//!               │
//!               ▼
//!         ┌────────────┐  transport up   ┌───────────┐  suback   ┌────────────┐
//!   ┌────▶│ Connecting │────────────────▶│ Connected │──────────▶│ Subscribed │
//!   │     └─────┬──────┘                 └─────┬─────┘           └─────┬──────┘
//!   │           │ failure                      │ failure               │ failure
//!   │           ▼                              ▼                       ▼
//!   │     ┌──────────────────────────────────────────────────────────────────┐
//!   └─────│                             Errored                              │
//! backoff └──────────────────────────────────────────────────────────────────┘
//!
//!   close from any state ──▶ Closed (terminal)
//! ```
//!
//! Only `Subscribed` lets messages into history. `Errored` is not terminal:
//! the feed waits out the reconnect delay and goes back to `Connecting`.

use core::fmt;

use crate::errors::{FeedError, FeedResult};

/// Lifecycle state of a telemetry feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedState {
    /// Waiting for the transport to come up
    Connecting,
    /// Transport established, subscribe request outstanding
    Connected,
    /// Subscription acknowledged; messages update history
    Subscribed,
    /// Transport or subscribe failure; a reconnect is pending
    Errored,
    /// Closed by the owner; no further transitions
    Closed,
}

impl FeedState {
    pub const fn name(&self) -> &'static str {
        match self {
            FeedState::Connecting => "connecting",
            FeedState::Connected => "connected",
            FeedState::Subscribed => "subscribed",
            FeedState::Errored => "errored",
            FeedState::Closed => "closed",
        }
    }

    /// Whether the state machine allows moving to `next`
    pub const fn can_transition_to(self, next: FeedState) -> bool {
        use FeedState::*;
        match (self, next) {
            (Closed, _) => false,
            (_, Closed) => true,
            (Connecting, Connected) => true,
            (Connected, Subscribed) => true,
            (Connecting | Connected | Subscribed, Errored) => true,
            (Errored, Connecting) => true,
            _ => false,
        }
    }

    /// Validated transition
    pub fn transition(self, next: FeedState) -> FeedResult<FeedState> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(FeedError::InvalidTransition { from: self, to: next })
        }
    }

    /// Whether incoming messages may update history
    pub const fn accepts_messages(self) -> bool {
        matches!(self, FeedState::Subscribed)
    }

    pub const fn is_closed(self) -> bool {
        matches!(self, FeedState::Closed)
    }
}

impl fmt::Display for FeedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
