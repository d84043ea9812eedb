//! Live Telemetry Feed
//!
//! ## Overview
//!
//! A feed owns one transport, subscribes to one topic and turns every message
//! it receives into history:
//!
//! ```text
//!   Transport ──poll──▶ driver task ──decode──▶ CircularBuffer ──▶ Snapshot
//!                                                                    │
//!                                           observers ◀──notify──────┘
//! ```
//!
//! ## Design Decisions
//!
//! ### Single-threaded ownership
//!
//! The driver is a `spawn_local` task and all feed state sits in `Cell` /
//! `RefCell` behind an `Rc`. Handling one message (decode, push, rebuild the
//! snapshot, notify) has no `.await` in it, so observers always see a
//! complete update and never race with the next message.
//!
//! ### Reentrant close
//!
//! No borrow is held while callbacks run. `close` flips the state to
//! `Closed` first, which stops the remaining callbacks of the current update,
//! then wakes the driver so it disconnects instead of polling, subscribing or
//! finishing a reconnect sleep.
//!
//! ### Drop
//!
//! The driver only holds a `Weak` reference. Dropping the last `FeedHandle`
//! tears the feed down like `close`.
//!
//! ## Example Usage
//!
//! ```no_run
//! use roadvision_connectors::feed;
//! use roadvision_core::FeedConfig;
//!
//! # async fn example() -> Result<(), roadvision_core::FeedError> {
//! let handle = feed::open(FeedConfig::default().capacity(50))?;
//! let observer = handle.on_update(|snapshot| println!("{} readings", snapshot.len()))?;
//!
//! // ... later
//! handle.remove_observer(observer)?;
//! handle.shutdown().await;
//! # Ok(())
//! # }
//! ```

use std::{
    cell::{Cell, RefCell},
    rc::{Rc, Weak},
    sync::Arc,
    time::Duration,
};

use log::{debug, info, warn};
use tokio::{sync::Notify, task::JoinHandle};

use roadvision_core::{
    buffer::CircularBuffer, decode_reading, FeedConfig, FeedError, FeedResult, FeedState,
    ObserverId, ObserverRegistry, SensorReading, Snapshot, SubscribeFailurePolicy,
};

use crate::{FeedStats, Transport, TransportError, TransportEvent};

/// Open a feed over MQTT/WebSocket
///
/// Configuration errors are returned immediately; connection problems are not.
/// They show up later through `state()` and `last_error()` while the feed
/// keeps retrying.
///
/// # Panics
///
/// Outside a `tokio::task::LocalSet`.
#[cfg(feature = "mqtt")]
pub fn open(config: FeedConfig) -> FeedResult<FeedHandle> {
    let transport = crate::mqtt::MqttTransport::new(&config)?;
    open_with(config, transport)
}

/// Open a feed over the given transport
///
/// # Panics
///
/// Outside a `tokio::task::LocalSet`.
pub fn open_with<T>(config: FeedConfig, transport: T) -> FeedResult<FeedHandle>
where
    T: Transport + 'static,
{
    config.validate()?;
    let history = CircularBuffer::new(config.capacity)
        .ok_or_else(|| FeedError::Config("history capacity must be at least 1".into()))?;

    let shutdown = Rc::new(Notify::new());
    let shared = Rc::new(FeedShared {
        state: Cell::new(FeedState::Connecting),
        history: RefCell::new(history),
        snapshot: RefCell::new(Snapshot::empty()),
        observers: RefCell::new(ObserverRegistry::new()),
        last_error: RefCell::new(None),
        stats: RefCell::new(FeedStats::default()),
        connected_once: Cell::new(false),
        shutdown: shutdown.clone(),
        task: RefCell::new(None),
        config,
    });

    let driver = Driver {
        feed: Rc::downgrade(&shared),
        shutdown,
        topic: shared.config.topic.clone(),
        reconnect_delay: shared.config.reconnect_delay,
    };
    let task = tokio::task::spawn_local(driver.run(transport));
    *shared.task.borrow_mut() = Some(task);

    info!(
        "opening feed on {} for topic '{}' (history {})",
        shared.config.address, shared.config.topic, shared.config.capacity
    );
    Ok(FeedHandle { shared })
}

/// Owner's handle to a running feed
///
/// Cloning is cheap and every clone refers to the same feed.
#[derive(Clone)]
pub struct FeedHandle {
    shared: Rc<FeedShared>,
}

impl FeedHandle {
    /// Current history, most recent first
    ///
    /// Never fails: empty before the first message and after `close`.
    pub fn snapshot(&self) -> Snapshot {
        self.shared.snapshot.borrow().clone()
    }

    /// Call `callback` with the new snapshot whenever history changes
    ///
    /// Callbacks run on the driver task in message order. A callback that
    /// needs to close the feed should capture a [`WeakFeedHandle`] so it
    /// does not keep the feed alive.
    pub fn on_update<F>(&self, callback: F) -> FeedResult<ObserverId>
    where
        F: Fn(&Snapshot) + 'static,
    {
        self.ensure_open()?;
        Ok(self.shared.observers.borrow_mut().register(Rc::new(callback)))
    }

    /// Unregister a callback; `Ok(false)` if it was not registered
    pub fn remove_observer(&self, id: ObserverId) -> FeedResult<bool> {
        self.ensure_open()?;
        Ok(self.shared.observers.borrow_mut().unregister(id))
    }

    pub fn state(&self) -> FeedState {
        self.shared.state.get()
    }

    pub fn is_closed(&self) -> bool {
        self.state().is_closed()
    }

    /// Transport or subscribe error behind the current state
    ///
    /// Cleared when the feed is subscribed again; `stats().last_error` keeps
    /// the most recent error of any kind.
    pub fn last_error(&self) -> Option<FeedError> {
        self.shared.last_error.borrow().clone()
    }

    pub fn stats(&self) -> FeedStats {
        self.shared.stats.borrow().clone()
    }

    pub fn config(&self) -> &FeedConfig {
        &self.shared.config
    }

    /// Stop the feed
    ///
    /// Idempotent. Once this returns no callback fires again, history is
    /// cleared and the driver is on its way to disconnecting.
    pub fn close(&self) {
        self.shared.close();
    }

    /// Close and wait until the driver has released the connection
    pub async fn shutdown(&self) {
        self.close();
        let task = self.shared.task.borrow_mut().take();
        if let Some(task) = task {
            if let Err(err) = task.await {
                warn!("feed driver ended abnormally: {err}");
            }
        }
    }

    /// Handle that does not keep the feed alive
    pub fn downgrade(&self) -> WeakFeedHandle {
        WeakFeedHandle {
            shared: Rc::downgrade(&self.shared),
        }
    }

    fn ensure_open(&self) -> FeedResult<()> {
        if self.is_closed() {
            Err(FeedError::Closed)
        } else {
            Ok(())
        }
    }
}

impl core::fmt::Debug for FeedHandle {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FeedHandle")
            .field("address", &self.shared.config.address)
            .field("topic", &self.shared.config.topic)
            .field("state", &self.state())
            .field("readings", &self.shared.snapshot.borrow().len())
            .finish()
    }
}

/// Non-owning handle, for callbacks that refer back to their feed
#[derive(Clone, Debug)]
pub struct WeakFeedHandle {
    shared: Weak<FeedShared>,
}

impl WeakFeedHandle {
    pub fn upgrade(&self) -> Option<FeedHandle> {
        self.shared.upgrade().map(|shared| FeedHandle { shared })
    }

    /// Close the feed if it is still alive
    pub fn close(&self) {
        if let Some(shared) = self.shared.upgrade() {
            shared.close();
        }
    }
}

/// What the driver does after handling an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Continue,
    Subscribe,
    Backoff { drop_connection: bool },
    Stop,
}

#[derive(Debug)]
struct FeedShared {
    config: FeedConfig,
    state: Cell<FeedState>,
    history: RefCell<CircularBuffer<Arc<SensorReading>>>,
    snapshot: RefCell<Snapshot>,
    observers: RefCell<ObserverRegistry>,
    last_error: RefCell<Option<FeedError>>,
    stats: RefCell<FeedStats>,
    connected_once: Cell<bool>,
    shutdown: Rc<Notify>,
    task: RefCell<Option<JoinHandle<()>>>,
}

impl FeedShared {
    fn is_closed(&self) -> bool {
        self.state.get().is_closed()
    }

    /// Apply a state change; invalid ones are logged and ignored
    fn set_state(&self, next: FeedState) -> bool {
        match self.state.get().transition(next) {
            Ok(next) => {
                self.state.set(next);
                true
            }
            Err(err) => {
                warn!("feed on '{}': {err}", self.config.topic);
                false
            }
        }
    }

    fn record_error(&self, err: FeedError) {
        self.stats.borrow_mut().last_error = Some(err.to_string());
        *self.last_error.borrow_mut() = Some(err);
    }

    fn on_event(&self, event: TransportEvent) -> Step {
        if self.is_closed() {
            return Step::Stop;
        }

        match event {
            TransportEvent::Connected => {
                if !self.set_state(FeedState::Connected) {
                    return Step::Continue;
                }
                if self.connected_once.replace(true) {
                    self.stats.borrow_mut().reconnections += 1;
                }
                info!("connected to {}", self.config.address);
                Step::Subscribe
            }
            TransportEvent::Subscribed => {
                if self.state.get() == FeedState::Subscribed {
                    debug!("duplicate subscribe acknowledgement for '{}'", self.config.topic);
                } else {
                    self.enter_subscribed();
                }
                Step::Continue
            }
            TransportEvent::SubscribeRejected(reason) => self.subscribe_failed(reason),
            TransportEvent::Message { topic, payload } => {
                self.ingest(&topic, &payload);
                Step::Continue
            }
            TransportEvent::Idle => Step::Continue,
        }
    }

    fn on_transport_error(&self, err: TransportError) -> Step {
        if self.is_closed() {
            return Step::Stop;
        }

        warn!(
            "transport error on {}: {err}; reconnecting in {:?}",
            self.config.address, self.config.reconnect_delay
        );
        self.stats.borrow_mut().transport_errors += 1;
        self.record_error(err.into());
        self.set_state(FeedState::Errored);
        Step::Backoff { drop_connection: false }
    }

    fn on_subscribe_sent(&self, result: Result<(), TransportError>, acknowledged: bool) -> Step {
        if self.is_closed() {
            return Step::Stop;
        }

        match result {
            Ok(()) if !acknowledged => {
                self.enter_subscribed();
                Step::Continue
            }
            Ok(()) => Step::Continue,
            Err(err) => self.subscribe_failed(err.to_string()),
        }
    }

    /// Healthy again: the error that led here is no longer current
    fn enter_subscribed(&self) {
        if self.set_state(FeedState::Subscribed) {
            self.last_error.borrow_mut().take();
            info!("subscribed to '{}'", self.config.topic);
        }
    }

    fn subscribe_failed(&self, reason: String) -> Step {
        let err = FeedError::Subscribe {
            topic: self.config.topic.clone(),
            reason,
        };
        warn!("{err}");
        self.record_error(err);

        match self.config.subscribe_failure {
            SubscribeFailurePolicy::Surface => Step::Continue,
            SubscribeFailurePolicy::Reconnect => {
                self.set_state(FeedState::Errored);
                Step::Backoff { drop_connection: true }
            }
        }
    }

    /// Leave `Errored` after the backoff; `false` once closed
    fn begin_reconnect(&self) -> bool {
        if self.is_closed() {
            return false;
        }
        debug!("reconnecting to {}", self.config.address);
        self.set_state(FeedState::Connecting);
        true
    }

    fn ingest(&self, topic: &str, payload: &[u8]) {
        self.stats.borrow_mut().messages_received += 1;

        if !self.state.get().accepts_messages() {
            debug!("dropping message on '{topic}' while {}", self.state.get());
            self.stats.borrow_mut().messages_dropped += 1;
            return;
        }

        let reading = match decode_reading(payload) {
            Ok(reading) => reading,
            Err(err) => {
                warn!("dropping message on '{topic}': {err}");
                let mut stats = self.stats.borrow_mut();
                stats.messages_dropped += 1;
                stats.last_error = Some(err.to_string());
                return;
            }
        };

        {
            let mut history = self.history.borrow_mut();
            history.push(Arc::new(reading));
            *self.snapshot.borrow_mut() = Snapshot::from_history(&history);
        }
        self.stats.borrow_mut().messages_decoded += 1;
        self.notify();
    }

    fn notify(&self) {
        let snapshot = self.snapshot.borrow().clone();
        let listeners = self.observers.borrow().listeners();

        for (id, callback) in listeners {
            // A callback may have closed the feed or removed a later observer
            if self.is_closed() {
                break;
            }
            if !self.observers.borrow().contains(id) {
                continue;
            }
            callback(&snapshot);
        }
    }

    fn close(&self) {
        if self.is_closed() {
            return;
        }
        self.state.set(FeedState::Closed);
        self.observers.borrow_mut().clear();
        self.history.borrow_mut().clear();
        *self.snapshot.borrow_mut() = Snapshot::empty();
        self.shutdown.notify_one();
        info!("feed for '{}' closed", self.config.topic);
    }
}

impl Drop for FeedShared {
    fn drop(&mut self) {
        self.shutdown.notify_one();
    }
}

/// Task side of a feed: polls the transport and feeds events to the state
struct Driver {
    feed: Weak<FeedShared>,
    shutdown: Rc<Notify>,
    topic: String,
    reconnect_delay: Duration,
}

impl Driver {
    async fn run<T: Transport>(self, mut transport: T) {
        loop {
            let polled = tokio::select! {
                biased;
                _ = self.shutdown.notified() => break,
                polled = transport.poll() => polled,
            };

            let Some(feed) = self.feed.upgrade() else { break };
            let step = match polled {
                Ok(event) => feed.on_event(event),
                Err(err) => feed.on_transport_error(err),
            };
            drop(feed);

            if !self.follow(step, &mut transport).await {
                break;
            }
        }

        transport.disconnect().await;
        debug!("feed driver for '{}' stopped", self.topic);
    }

    /// Carry out a step; `false` when the driver should stop
    async fn follow<T: Transport>(&self, mut step: Step, transport: &mut T) -> bool {
        loop {
            step = match step {
                Step::Continue => return true,
                Step::Stop => return false,
                Step::Subscribe => {
                    let result = tokio::select! {
                        biased;
                        _ = self.shutdown.notified() => return false,
                        result = transport.subscribe(&self.topic) => result,
                    };
                    let Some(feed) = self.feed.upgrade() else { return false };
                    feed.on_subscribe_sent(result, transport.acknowledges_subscribe())
                }
                Step::Backoff { drop_connection } => {
                    if drop_connection {
                        transport.disconnect().await;
                    }
                    tokio::select! {
                        biased;
                        _ = self.shutdown.notified() => return false,
                        _ = tokio::time::sleep(self.reconnect_delay) => {}
                    }
                    match self.feed.upgrade() {
                        Some(feed) if feed.begin_reconnect() => Step::Continue,
                        _ => Step::Stop,
                    }
                }
            };
        }
    }
}
