// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The event bus client: one durable websocket per organization.
//!
//! On transport loss the client reconnects with capped exponential backoff
//! and resubscribes transparently; consumers observe only a passive
//! [`TransportStatus`] change, never a semantic event or an error.
//! Delivery is at-most-once with best-effort ordering: reconnection
//! re-establishes the stream going forward and nothing is replayed.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message as WsMessage};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use switchboard_config::model::BusConfig;
use switchboard_core::types::{AdapterType, HealthStatus};
use switchboard_core::{BusEvent, OrgId, PluginAdapter, SwitchboardError, TransportStatus};

use crate::backoff::Backoff;
use crate::decode::decode_frame;

/// Receives decoded events and transport status changes.
///
/// Callbacks are synchronous and must be cheap; a typical implementation
/// forwards into an mpsc channel drained by the runtime's event loop. The
/// kind-specific hooks default to the generic sink, so implementors can
/// either handle kinds separately or take everything in one place.
pub trait EventSubscriber: Send + Sync + 'static {
    /// Fallback sink for every event kind. Called in stream arrival order.
    fn on_event(&self, event: BusEvent);

    /// A message was appended to a conversation.
    fn on_new_message(&self, event: BusEvent) {
        self.on_event(event);
    }

    /// Conversation metadata changed.
    fn on_conversation_updated(&self, event: BusEvent) {
        self.on_event(event);
    }

    /// An operator's presence changed.
    fn on_presence(&self, event: BusEvent) {
        self.on_event(event);
    }

    /// The transport state changed. Passive indicator only.
    fn on_transport(&self, status: TransportStatus) {
        let _ = status;
    }
}

/// Routes a decoded event to the subscriber's kind-specific hook.
fn dispatch(subscriber: &Arc<dyn EventSubscriber>, event: BusEvent) {
    match event {
        e @ BusEvent::NewMessage { .. } => subscriber.on_new_message(e),
        e @ BusEvent::ConversationUpdated { .. } => subscriber.on_conversation_updated(e),
        e @ (BusEvent::PresenceViewing { .. }
        | BusEvent::PresenceLeft { .. }
        | BusEvent::PresenceTyping { .. }) => subscriber.on_presence(e),
    }
}

/// Handle to a live subscription; closing cancels the reconnect loop and
/// awaits the reader task.
pub struct SubscriptionHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl SubscriptionHandle {
    /// Closes the subscription. Idempotent with respect to the underlying
    /// stream: the socket sends a close frame if it is still up.
    pub async fn close(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            if !e.is_cancelled() {
                warn!(error = %e, "bus reader task ended abnormally");
            }
        }
    }
}

/// Push event stream client.
pub struct EventBusClient {
    config: BusConfig,
    last_status: Arc<Mutex<TransportStatus>>,
}

impl EventBusClient {
    pub fn new(config: BusConfig) -> Result<Self, SwitchboardError> {
        let url = config.url.trim();
        if !url.starts_with("ws://") && !url.starts_with("wss://") {
            return Err(SwitchboardError::Config(format!(
                "bus.url `{url}` must be a websocket url"
            )));
        }
        Ok(Self {
            config,
            last_status: Arc::new(Mutex::new(TransportStatus::Closed)),
        })
    }

    /// Opens the organization's stream and dispatches events to the
    /// subscriber until the returned handle is closed.
    pub fn subscribe(
        &self,
        org_id: &OrgId,
        subscriber: Arc<dyn EventSubscriber>,
    ) -> SubscriptionHandle {
        let cancel = CancellationToken::new();
        let task = tokio::spawn(run_stream(
            self.config.clone(),
            org_id.clone(),
            subscriber,
            self.last_status.clone(),
            cancel.clone(),
        ));
        SubscriptionHandle { cancel, task }
    }
}

#[async_trait]
impl PluginAdapter for EventBusClient {
    fn name(&self) -> &str {
        "event-bus"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Bus
    }

    async fn health_check(&self) -> Result<HealthStatus, SwitchboardError> {
        let status = self.last_status.lock().expect("status lock").clone();
        Ok(match status {
            TransportStatus::Connected => HealthStatus::Healthy,
            TransportStatus::Reconnecting { attempt } => {
                HealthStatus::Degraded(format!("reconnecting, attempt {attempt}"))
            }
            TransportStatus::Closed => HealthStatus::Degraded("stream closed".to_string()),
        })
    }

    async fn shutdown(&self) -> Result<(), SwitchboardError> {
        // Subscriptions own their lifecycle through their handles.
        Ok(())
    }
}

/// The stream URL for one organization.
fn stream_url(config: &BusConfig, org_id: &OrgId) -> String {
    format!(
        "{}/orgs/{}/events",
        config.url.trim_end_matches('/'),
        org_id
    )
}

fn publish_status(
    subscriber: &Arc<dyn EventSubscriber>,
    last_status: &Arc<Mutex<TransportStatus>>,
    status: TransportStatus,
) {
    *last_status.lock().expect("status lock") = status.clone();
    subscriber.on_transport(status);
}

async fn run_stream(
    config: BusConfig,
    org_id: OrgId,
    subscriber: Arc<dyn EventSubscriber>,
    last_status: Arc<Mutex<TransportStatus>>,
    cancel: CancellationToken,
) {
    let url = stream_url(&config, &org_id);
    let mut backoff = Backoff::new(
        Duration::from_millis(config.reconnect_base_ms),
        Duration::from_millis(config.reconnect_cap_ms),
    );

    loop {
        match connect_async(url.as_str()).await {
            Ok((stream, _response)) => {
                info!(org_id = %org_id, "event stream connected");
                backoff.reset();
                publish_status(&subscriber, &last_status, TransportStatus::Connected);

                let (mut sink, mut source) = stream.split();
                loop {
                    tokio::select! {
                        _ = cancel.cancelled() => {
                            let _ = sink.send(WsMessage::Close(None)).await;
                            publish_status(&subscriber, &last_status, TransportStatus::Closed);
                            return;
                        }
                        frame = source.next() => {
                            match frame {
                                Some(Ok(WsMessage::Text(text))) => {
                                    if let Some(event) = decode_frame(text.as_str()) {
                                        dispatch(&subscriber, event);
                                    }
                                }
                                Some(Ok(WsMessage::Ping(payload))) => {
                                    if let Err(e) = sink.send(WsMessage::Pong(payload)).await {
                                        warn!(error = %e, "failed to answer ping");
                                        break;
                                    }
                                }
                                Some(Ok(WsMessage::Close(_))) | None => {
                                    debug!(org_id = %org_id, "event stream closed by server");
                                    break;
                                }
                                Some(Ok(_)) => {
                                    // Binary and pong frames carry nothing for us.
                                }
                                Some(Err(e)) => {
                                    warn!(error = %e, "event stream read error");
                                    break;
                                }
                            }
                        }
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, org_id = %org_id, "event stream connect failed");
            }
        }

        if cancel.is_cancelled() {
            publish_status(&subscriber, &last_status, TransportStatus::Closed);
            return;
        }

        let delay = backoff.next_delay();
        publish_status(
            &subscriber,
            &last_status,
            TransportStatus::Reconnecting {
                attempt: backoff.attempt(),
            },
        );
        debug!(
            org_id = %org_id,
            attempt = backoff.attempt(),
            delay_ms = delay.as_millis() as u64,
            "scheduling reconnect"
        );
        tokio::select! {
            _ = cancel.cancelled() => {
                publish_status(&subscriber, &last_status, TransportStatus::Closed);
                return;
            }
            _ = tokio::time::sleep(delay) => {}
        }
    }
}
