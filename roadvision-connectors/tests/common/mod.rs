//! Common test utilities for feed integration tests
//!
//! This module provides:
//! - A scripted transport the test drives event by event
//! - Payload builders for processed agent data
//! - Helpers to let the local driver task catch up

#![allow(dead_code)]

use std::{
    cell::RefCell,
    collections::VecDeque,
    rc::Rc,
    time::Duration,
};

use async_trait::async_trait;
use tokio::sync::mpsc;

use roadvision_connectors::{Transport, TransportError, TransportEvent};

pub mod payloads;

type Scripted = Result<TransportEvent, TransportError>;

/// What the feed did to the transport
#[derive(Debug, Default)]
pub struct TransportLog {
    pub polls: usize,
    pub subscribes: Vec<String>,
    pub disconnects: usize,
    subscribe_results: VecDeque<Result<(), TransportError>>,
}

/// Transport whose events come from a [`Script`]
pub struct ScriptedTransport {
    events: mpsc::UnboundedReceiver<Scripted>,
    acknowledges: bool,
    log: Rc<RefCell<TransportLog>>,
}

/// Test side of a [`ScriptedTransport`]
pub struct Script {
    events: mpsc::UnboundedSender<Scripted>,
    log: Rc<RefCell<TransportLog>>,
}

/// Transport that waits for broker acknowledgements
pub fn scripted() -> (ScriptedTransport, Script) {
    build(true)
}

/// Transport that treats a sent subscribe as subscribed
pub fn scripted_without_acks() -> (ScriptedTransport, Script) {
    build(false)
}

fn build(acknowledges: bool) -> (ScriptedTransport, Script) {
    let (tx, rx) = mpsc::unbounded_channel();
    let log = Rc::new(RefCell::new(TransportLog::default()));
    (
        ScriptedTransport {
            events: rx,
            acknowledges,
            log: log.clone(),
        },
        Script { events: tx, log },
    )
}

#[async_trait(?Send)]
impl Transport for ScriptedTransport {
    async fn poll(&mut self) -> Result<TransportEvent, TransportError> {
        self.log.borrow_mut().polls += 1;
        match self.events.recv().await {
            Some(event) => event,
            None => std::future::pending().await,
        }
    }

    async fn subscribe(&mut self, topic: &str) -> Result<(), TransportError> {
        let mut log = self.log.borrow_mut();
        log.subscribes.push(topic.to_string());
        log.subscribe_results.pop_front().unwrap_or(Ok(()))
    }

    fn acknowledges_subscribe(&self) -> bool {
        self.acknowledges
    }

    async fn disconnect(&mut self) {
        self.log.borrow_mut().disconnects += 1;
    }
}

impl Script {
    pub fn send(&self, event: Scripted) {
        // The driver may already be gone in teardown tests
        let _ = self.events.send(event);
    }

    pub fn connect(&self) {
        self.send(Ok(TransportEvent::Connected));
    }

    pub fn ack_subscribe(&self) {
        self.send(Ok(TransportEvent::Subscribed));
    }

    pub fn reject_subscribe(&self, reason: &str) {
        self.send(Ok(TransportEvent::SubscribeRejected(reason.to_string())));
    }

    pub fn message(&self, body: impl Into<Vec<u8>>) {
        self.send(Ok(TransportEvent::Message {
            topic: "processed_data_topic".into(),
            payload: body.into(),
        }));
    }

    pub fn fail(&self, reason: &str) {
        self.send(Err(TransportError::Connection(reason.to_string())));
    }

    /// Make the next `subscribe` call fail
    pub fn fail_next_subscribe(&self, reason: &str) {
        self.log
            .borrow_mut()
            .subscribe_results
            .push_back(Err(TransportError::Subscribe(reason.to_string())));
    }

    pub fn subscribes(&self) -> Vec<String> {
        self.log.borrow().subscribes.clone()
    }

    pub fn disconnects(&self) -> usize {
        self.log.borrow().disconnects
    }
}

/// Give the driver task a chance to drain everything sent so far
pub async fn settle() {
    for _ in 0..32 {
        tokio::task::yield_now().await;
    }
}

/// Move the paused clock forward, then settle
pub async fn advance(duration: Duration) {
    tokio::time::advance(duration).await;
    settle().await;
}
