// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common domain types used across the Switchboard workspace.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

macro_rules! id_type {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            /// Returns the id as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

id_type!(
    /// Unique identifier for an organization (one push stream each).
    OrgId
);
id_type!(
    /// Unique identifier for a contact; conversations are keyed by it.
    ContactId
);
id_type!(
    /// Unique identifier for a message. Store-assigned once confirmed, or a
    /// locally-generated temporary id while the message is still sending.
    MessageId
);
id_type!(
    /// Unique identifier for a human operator.
    OperatorId
);
id_type!(
    /// Unique identifier for a configured automated agent.
    AgentId
);
id_type!(
    /// Unique identifier for a messaging channel binding.
    ChannelId
);
id_type!(
    /// Unique identifier for an automation rule.
    RuleId
);
id_type!(
    /// Reference to a tag attachable to a conversation.
    TagRef
);

/// Direction of a message within a conversation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Direction {
    /// Sent by the contact; immutable once created.
    Inbound,
    /// Sent by an operator or agent into the channel.
    OutboundReply,
    /// Internal note, not delivered to the contact.
    OutboundNote,
}

impl Direction {
    /// Whether this is one of the outbound variants.
    pub fn is_outbound(&self) -> bool {
        matches!(self, Direction::OutboundReply | Direction::OutboundNote)
    }
}

/// Delivery status of a message.
///
/// Only outbound messages transition; inbound messages are created `Sent`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DeliveryStatus {
    /// Appended optimistically, not yet confirmed by the server.
    Sending,
    /// Confirmed delivered to the persistence layer.
    Sent,
    /// Send failed; the message stays visible for manual retry.
    Error,
}

/// Status of a conversation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ConversationStatus {
    /// Waiting for pool pickup; no operator assigned.
    Pending,
    /// Actively handled.
    Open,
    /// Closed out. Conversations are never deleted client-side.
    Resolved,
}

/// Media kind carried by a message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
    Audio,
    Document,
}

/// Descriptor for media attached to a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaDescriptor {
    pub kind: MediaKind,
    /// Resolved URL, or `None` while the upload is still pending.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
}

/// A single message within a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: MessageId,
    pub direction: Direction,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub media: Option<MediaDescriptor>,
    pub status: DeliveryStatus,
    pub timestamp: DateTime<Utc>,
    /// Provider-assigned id, used to correlate delivery-status events.
    #[serde(default)]
    pub external_id: Option<String>,
    /// Set on replies issued by the rule engine. Automated replies are
    /// excluded from rule re-evaluation and from message-count thresholds.
    #[serde(default)]
    pub automated: bool,
}

/// A draft for an outbound message, before the store assigns a temp id.
#[derive(Debug, Clone)]
pub struct MessageDraft {
    pub direction: Direction,
    pub text: String,
    pub media: Option<MediaDescriptor>,
    pub automated: bool,
}

impl MessageDraft {
    /// A plain operator reply draft.
    pub fn reply(text: impl Into<String>) -> Self {
        Self {
            direction: Direction::OutboundReply,
            text: text.into(),
            media: None,
            automated: false,
        }
    }

    /// An automated reply draft issued by the rule engine.
    pub fn automated_reply(text: impl Into<String>) -> Self {
        Self {
            direction: Direction::OutboundReply,
            text: text.into(),
            media: None,
            automated: true,
        }
    }
}

/// Contact fields delivered alongside a `new_message` event, used to
/// construct a conversation that does not exist locally yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactSnapshot {
    pub id: ContactId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub number: Option<String>,
    #[serde(default)]
    pub channel_id: Option<ChannelId>,
}

/// Replacement value for a conversation's assignee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssigneeUpdate {
    /// `None` unassigns (pool pickup).
    pub operator_id: Option<OperatorId>,
    pub operator_name: Option<String>,
}

/// Shallow-merge patch for conversation metadata. `None` fields are left
/// untouched; the message list is never affected by a patch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversationPatch {
    pub status: Option<ConversationStatus>,
    pub assignee: Option<AssigneeUpdate>,
    pub tags: Option<Vec<TagRef>>,
}

/// One page of message history, oldest-first, as returned by the
/// persistence API.
#[derive(Debug, Clone, Default)]
pub struct MessagePage {
    pub messages: Vec<Message>,
    pub has_more: bool,
}

/// Payload for the per-channel send API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboundPayload {
    pub number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(rename = "mediaMessage", skip_serializing_if = "Option::is_none")]
    pub media: Option<MediaDescriptor>,
}

/// An automation rule as served by the rule management API.
///
/// Condition and action payloads arrive as loose JSON; the rule engine
/// compiles them into typed variants at load, never at evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleRecord {
    pub id: RuleId,
    pub agent_id: AgentId,
    pub priority: i32,
    pub active: bool,
    pub condition_type: String,
    #[serde(default)]
    pub condition: serde_json::Value,
    pub action_type: String,
    #[serde(default)]
    pub action: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the type of adapter behind the [`crate::traits::PluginAdapter`] trait.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    /// Push event stream ingress.
    Bus,
    /// REST persistence / management collaborator.
    Api,
    /// Per-channel outbound send connector.
    Connector,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_newtypes_serialize_transparently() {
        let id = ContactId("c-1".into());
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"c-1\"");
        let back: ContactId = serde_json::from_str("\"c-1\"").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn direction_round_trips_through_strings() {
        use std::str::FromStr;
        for d in [
            Direction::Inbound,
            Direction::OutboundReply,
            Direction::OutboundNote,
        ] {
            let s = d.to_string();
            assert_eq!(Direction::from_str(&s).unwrap(), d);
        }
        assert!(Direction::OutboundNote.is_outbound());
        assert!(!Direction::Inbound.is_outbound());
    }

    #[test]
    fn message_deserializes_from_wire_shape() {
        let raw = r#"{
            "id": "m1",
            "direction": "inbound",
            "text": "hello",
            "status": "sent",
            "timestamp": "2026-03-01T12:00:00Z"
        }"#;
        let msg: Message = serde_json::from_str(raw).unwrap();
        assert_eq!(msg.id.as_str(), "m1");
        assert_eq!(msg.direction, Direction::Inbound);
        assert!(msg.media.is_none());
        assert!(!msg.automated);
    }

    #[test]
    fn media_descriptor_pending_url() {
        let raw = r#"{"kind": "image", "caption": "receipt"}"#;
        let media: MediaDescriptor = serde_json::from_str(raw).unwrap();
        assert_eq!(media.kind, MediaKind::Image);
        assert!(media.url.is_none(), "absent url means upload pending");
    }

    #[test]
    fn rule_record_tolerates_missing_payloads() {
        let raw = r#"{
            "id": "r1",
            "agentId": "a1",
            "priority": 10,
            "active": true,
            "conditionType": "always",
            "actionType": "stop_responding",
            "createdAt": "2026-03-01T00:00:00Z"
        }"#;
        let record: RuleRecord = serde_json::from_str(raw).unwrap();
        assert!(record.condition.is_null());
        assert!(record.action.is_null());
    }

    #[test]
    fn outbound_payload_media_field_name() {
        let payload = OutboundPayload {
            number: "5511999".into(),
            text: None,
            media: Some(MediaDescriptor {
                kind: MediaKind::Document,
                url: Some("https://files/doc.pdf".into()),
                caption: None,
            }),
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert!(json.get("mediaMessage").is_some());
        assert!(json.get("text").is_none());
    }
}
