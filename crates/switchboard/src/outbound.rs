// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The outbound send pipeline: optimistic append, network delivery,
//! confirmation.
//!
//! Operator replies and rule-engine auto-replies share this path, so both
//! get the same lifecycle: the message appears immediately as `Sending`,
//! the channel send and persistence happen off the store lock, and the
//! result lands back as `Sent` (with ids) or `Error` (kept visible).

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use switchboard_core::events::Notice;
use switchboard_core::traits::{ChannelConnector, MessageHistoryApi, NotificationSink};
use switchboard_core::types::{Direction, Message, MessageDraft, OutboundPayload};
use switchboard_core::{ChannelId, ContactId, MessageId, SwitchboardError};
use switchboard_rules::AutoResponder;
use switchboard_store::{ConversationStore, SendConfirmation};

/// Shared outbound send path.
pub struct SendPipeline {
    store: Arc<Mutex<ConversationStore>>,
    connector: Arc<dyn ChannelConnector>,
    history: Arc<dyn MessageHistoryApi>,
    notifications: Arc<dyn NotificationSink>,
}

impl SendPipeline {
    pub fn new(
        store: Arc<Mutex<ConversationStore>>,
        connector: Arc<dyn ChannelConnector>,
        history: Arc<dyn MessageHistoryApi>,
        notifications: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            store,
            connector,
            history,
            notifications,
        }
    }

    /// Sends a draft through the full optimistic lifecycle.
    ///
    /// Returns the temporary message id on success. On failure the message
    /// stays visible marked `Error`, a notice is emitted, and the error is
    /// returned for callers that track delivery.
    pub async fn send(
        &self,
        contact_id: &ContactId,
        draft: MessageDraft,
    ) -> Result<MessageId, SwitchboardError> {
        // Optimistic append under a short lock; the caller sees the
        // message immediately.
        let (temp_id, channel_id, number, message) = {
            let mut store = self.store.lock().await;
            let temp_id = store.append_optimistic(contact_id, draft);
            let conversation = store
                .conversation(contact_id)
                .expect("conversation exists after optimistic append");
            let message = conversation
                .messages()
                .iter()
                .find(|m| m.id == temp_id)
                .expect("optimistic message present")
                .clone();
            (
                temp_id,
                conversation.channel_id.clone(),
                conversation.number.clone(),
                message,
            )
        };

        // Network work happens off the lock.
        let result = self
            .deliver(contact_id, &channel_id, number.as_deref(), &message)
            .await;

        match result {
            Ok((message_id, external_id)) => {
                let mut store = self.store.lock().await;
                store.confirm_send(
                    contact_id,
                    &temp_id,
                    SendConfirmation::Delivered {
                        message_id,
                        external_id,
                    },
                );
                debug!(contact_id = %contact_id, "outbound message confirmed");
                Ok(temp_id)
            }
            Err(e) => {
                let mut store = self.store.lock().await;
                store.confirm_send(contact_id, &temp_id, SendConfirmation::Failed);
                drop(store);
                warn!(contact_id = %contact_id, error = %e, "outbound send failed");
                self.notifications.notify(Notice::SendFailed {
                    contact_id: contact_id.clone(),
                    message_id: temp_id,
                    detail: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Delivers through the channel connector and persists to the message
    /// store; returns `(store_id, external_id)`.
    async fn deliver(
        &self,
        contact_id: &ContactId,
        channel_id: &Option<ChannelId>,
        number: Option<&str>,
        message: &Message,
    ) -> Result<(Option<MessageId>, Option<String>), SwitchboardError> {
        let external_id = match (channel_id, number) {
            (Some(channel_id), Some(number)) => {
                let payload = OutboundPayload {
                    number: number.to_string(),
                    text: (!message.text.is_empty()).then(|| message.text.clone()),
                    media: message.media.clone(),
                };
                Some(self.connector.send(channel_id, &payload).await?)
            }
            _ => {
                // Internal notes and conversations without a channel
                // binding are persisted without network delivery.
                if message.direction == Direction::OutboundReply {
                    return Err(SwitchboardError::Store(format!(
                        "conversation {contact_id} has no channel binding for outbound send"
                    )));
                }
                None
            }
        };

        let message_id = self.history.persist_message(contact_id, message).await?;
        Ok((Some(message_id), external_id))
    }
}

#[async_trait]
impl AutoResponder for SendPipeline {
    async fn send_automated_reply(
        &self,
        contact_id: &ContactId,
        text: &str,
    ) -> Result<(), SwitchboardError> {
        self.send(contact_id, MessageDraft::automated_reply(text))
            .await
            .map(|_| ())
    }
}
