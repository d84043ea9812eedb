//! MQTT transport for RoadVision
//!
//! MQTT 3.1.1 over WebSocket (or plain TCP) using rumqttc. Subscriptions use
//! QoS 0 and a clean session; the feed re-subscribes after every reconnect.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use log::debug;
use rumqttc::{
    AsyncClient, Event, EventLoop, MqttOptions, Outgoing, Packet, QoS, SubscribeReasonCode,
    Transport as Network,
};

use roadvision_core::{
    constants::feed::DISCONNECT_GRACE_MS, BrokerAddress, BrokerScheme, FeedConfig, FeedResult,
};

use crate::{Transport, TransportError, TransportEvent};

/// Bound of the client request channel
const REQUEST_CAPACITY: usize = 10;

/// rumqttc-backed [`Transport`]
pub struct MqttTransport {
    options: MqttOptions,
    client: AsyncClient,
    eventloop: EventLoop,
    connect_timeout: Duration,
    connected: bool,
}

impl MqttTransport {
    /// Build a transport for `config`; nothing connects until the first poll
    pub fn new(config: &FeedConfig) -> FeedResult<Self> {
        config.validate()?;
        let broker = config.broker()?;
        let client_id = config.client_id.clone().unwrap_or_else(generate_client_id);
        let options = mqtt_options(&broker, client_id, config.keep_alive);
        let (client, eventloop) = AsyncClient::new(options.clone(), REQUEST_CAPACITY);

        Ok(Self {
            options,
            client,
            eventloop,
            connect_timeout: config.connect_timeout,
            connected: false,
        })
    }

    pub fn client_id(&self) -> String {
        self.options.client_id()
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Fresh client and event loop, so the next poll opens a new connection
    fn reset(&mut self) {
        let (client, eventloop) = AsyncClient::new(self.options.clone(), REQUEST_CAPACITY);
        self.client = client;
        self.eventloop = eventloop;
        self.connected = false;
    }
}

#[async_trait(?Send)]
impl Transport for MqttTransport {
    async fn poll(&mut self) -> Result<TransportEvent, TransportError> {
        let event = if self.connected {
            self.eventloop.poll().await
        } else {
            match tokio::time::timeout(self.connect_timeout, self.eventloop.poll()).await {
                Ok(event) => event,
                Err(_) => {
                    return Err(TransportError::Timeout(self.connect_timeout.as_millis() as u64))
                }
            }
        };

        match event {
            Ok(Event::Incoming(Packet::ConnAck(_))) => {
                self.connected = true;
                Ok(TransportEvent::Connected)
            }
            Ok(Event::Incoming(Packet::SubAck(ack))) => {
                let refused = ack
                    .return_codes
                    .iter()
                    .any(|code| matches!(code, SubscribeReasonCode::Failure));
                if refused {
                    Ok(TransportEvent::SubscribeRejected(format!(
                        "broker refused subscription (packet {})",
                        ack.pkid
                    )))
                } else {
                    Ok(TransportEvent::Subscribed)
                }
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => Ok(TransportEvent::Message {
                topic: publish.topic,
                payload: publish.payload.to_vec(),
            }),
            Ok(Event::Incoming(Packet::Disconnect)) => {
                self.connected = false;
                Err(TransportError::Connection("broker sent disconnect".into()))
            }
            Ok(_) => Ok(TransportEvent::Idle),
            Err(err) => {
                let was_connected = std::mem::replace(&mut self.connected, false);
                if was_connected {
                    Err(TransportError::Connection(err.to_string()))
                } else {
                    Err(TransportError::Connect(err.to_string()))
                }
            }
        }
    }

    async fn subscribe(&mut self, topic: &str) -> Result<(), TransportError> {
        self.client
            .subscribe(topic, QoS::AtMostOnce)
            .await
            .map_err(|err| TransportError::Subscribe(err.to_string()))
    }

    async fn disconnect(&mut self) {
        if self.connected && self.client.try_disconnect().is_ok() {
            let eventloop = &mut self.eventloop;
            let flushed = tokio::time::timeout(Duration::from_millis(DISCONNECT_GRACE_MS), async move {
                loop {
                    match eventloop.poll().await {
                        Ok(Event::Outgoing(Outgoing::Disconnect)) | Err(_) => break,
                        Ok(_) => {}
                    }
                }
            })
            .await;
            if flushed.is_err() {
                debug!("disconnect not flushed within {DISCONNECT_GRACE_MS} ms");
            }
        }
        self.reset();
    }
}

impl core::fmt::Debug for MqttTransport {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let (host, port) = self.options.broker_address();
        f.debug_struct("MqttTransport")
            .field("client_id", &self.options.client_id())
            .field("host", &host)
            .field("port", &port)
            .field("connected", &self.connected)
            .finish()
    }
}

fn mqtt_options(broker: &BrokerAddress, client_id: String, keep_alive: Duration) -> MqttOptions {
    let mut options = match broker.scheme {
        // rumqttc takes the full URL as the host for WebSocket transports
        BrokerScheme::Ws | BrokerScheme::Wss => {
            MqttOptions::new(client_id, broker.websocket_url(), broker.port)
        }
        BrokerScheme::Tcp => MqttOptions::new(client_id, broker.host.clone(), broker.port),
    };

    match broker.scheme {
        BrokerScheme::Ws => {
            options.set_transport(Network::Ws);
        }
        BrokerScheme::Wss => {
            options.set_transport(Network::wss_with_default_config());
        }
        BrokerScheme::Tcp => {}
    }

    options.set_keep_alive(keep_alive);
    options.set_clean_session(true);
    options
}

/// `roadvision-<pid>-<millis>`, unique enough per dashboard instance
fn generate_client_id() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() % 1_000_000)
        .unwrap_or_default();
    format!("roadvision-{}-{millis}", std::process::id())
}
