// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed events delivered over the organization push stream, and the
//! notices the engine surfaces back to the operator UI.

use serde::{Deserialize, Serialize};

use crate::types::{
    AgentId, AssigneeUpdate, ContactId, ContactSnapshot, ConversationPatch,
    ConversationStatus, Message, MessageId, OperatorId, RuleId, TagRef,
};

/// Envelope decoded from a push-stream frame.
///
/// Delivery is at-most-once with best-effort ordering: downstream
/// components must degrade gracefully on a missed event (stale unread
/// count, stale presence) rather than corrupt state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BusEvent {
    /// A message was appended to a contact's conversation.
    #[serde(rename_all = "camelCase")]
    NewMessage {
        contact_id: ContactId,
        message: Message,
        /// Present when the server knows the receiver may not hold the
        /// conversation yet; used to construct it locally.
        #[serde(default)]
        contact: Option<ContactSnapshot>,
    },

    /// Conversation metadata changed (status, assignee, tags).
    #[serde(rename_all = "camelCase")]
    ConversationUpdated {
        contact_id: ContactId,
        #[serde(default)]
        status: Option<ConversationStatus>,
        #[serde(default)]
        assignee_id: Option<OperatorId>,
        #[serde(default)]
        assignee_name: Option<String>,
        #[serde(default)]
        tags: Option<Vec<TagRef>>,
    },

    /// Another operator opened a conversation.
    #[serde(rename_all = "camelCase")]
    PresenceViewing {
        operator_id: OperatorId,
        contact_id: ContactId,
    },

    /// Another operator left a conversation.
    #[serde(rename_all = "camelCase")]
    PresenceLeft {
        operator_id: OperatorId,
        contact_id: ContactId,
    },

    /// Another operator is typing; `text` optionally carries the draft for
    /// supervision. An absent `text` on a typing event means typing ended.
    #[serde(rename_all = "camelCase")]
    PresenceTyping {
        operator_id: OperatorId,
        contact_id: ContactId,
        #[serde(default)]
        text: Option<String>,
    },
}

impl BusEvent {
    /// The contact this event concerns.
    pub fn contact_id(&self) -> &ContactId {
        match self {
            BusEvent::NewMessage { contact_id, .. }
            | BusEvent::ConversationUpdated { contact_id, .. }
            | BusEvent::PresenceViewing { contact_id, .. }
            | BusEvent::PresenceLeft { contact_id, .. }
            | BusEvent::PresenceTyping { contact_id, .. } => contact_id,
        }
    }

    /// Builds the store patch for a `conversation_updated` event.
    ///
    /// Returns `None` for other event kinds. An event that names an
    /// assignee field (even as null on the wire) replaces the assignee;
    /// events without assignee fields leave it untouched.
    pub fn as_conversation_patch(&self) -> Option<ConversationPatch> {
        let BusEvent::ConversationUpdated {
            status,
            assignee_id,
            assignee_name,
            tags,
            ..
        } = self
        else {
            return None;
        };

        let assignee = if assignee_id.is_some() || assignee_name.is_some() {
            Some(AssigneeUpdate {
                operator_id: assignee_id.clone(),
                operator_name: assignee_name.clone(),
            })
        } else {
            None
        };

        Some(ConversationPatch {
            status: *status,
            assignee,
            tags: tags.clone(),
        })
    }
}

/// Passive transport state for the push stream, surfaced as a status
/// indicator only, never as a blocking error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportStatus {
    /// Stream is live.
    Connected,
    /// Stream dropped; reconnect in progress.
    Reconnecting { attempt: u32 },
    /// Subscription was closed deliberately.
    Closed,
}

/// Non-blocking notices surfaced to the operator through the notification
/// collaborator (toast surface).
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    /// An outbound send failed; the message stays visible marked `Error`.
    SendFailed {
        contact_id: ContactId,
        message_id: MessageId,
        detail: String,
    },
    /// A rule action failed at a collaborator. The rule's fired
    /// bookkeeping is intentionally NOT rolled back.
    RuleActionFailed {
        rule_id: RuleId,
        contact_id: ContactId,
        detail: String,
    },
    /// Suggest assigning an unassigned conversation the operator is
    /// replying into.
    AssignmentPrompt {
        contact_id: ContactId,
        agent_id: Option<AgentId>,
    },
    /// Push-stream state changed.
    Transport(TransportStatus),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_message_event_decodes() {
        let raw = r#"{
            "type": "new_message",
            "contactId": "c-9",
            "message": {
                "id": "m-1",
                "direction": "inbound",
                "text": "oi",
                "status": "sent",
                "timestamp": "2026-03-01T09:30:00Z"
            },
            "contact": {"id": "c-9", "name": "Ana", "number": "5511988"}
        }"#;
        let event: BusEvent = serde_json::from_str(raw).unwrap();
        let BusEvent::NewMessage {
            contact_id,
            message,
            contact,
        } = event
        else {
            panic!("wrong variant");
        };
        assert_eq!(contact_id.as_str(), "c-9");
        assert_eq!(message.text, "oi");
        assert_eq!(contact.unwrap().name.as_deref(), Some("Ana"));
    }

    #[test]
    fn conversation_updated_builds_patch() {
        let raw = r#"{
            "type": "conversation_updated",
            "contactId": "c-2",
            "status": "open",
            "assigneeId": "op-7",
            "assigneeName": "Rafa"
        }"#;
        let event: BusEvent = serde_json::from_str(raw).unwrap();
        let patch = event.as_conversation_patch().unwrap();
        assert_eq!(patch.status, Some(ConversationStatus::Open));
        let assignee = patch.assignee.unwrap();
        assert_eq!(assignee.operator_id.unwrap().as_str(), "op-7");
        assert!(patch.tags.is_none());
    }

    #[test]
    fn status_only_update_leaves_assignee_untouched() {
        let raw = r#"{"type": "conversation_updated", "contactId": "c-2", "status": "resolved"}"#;
        let event: BusEvent = serde_json::from_str(raw).unwrap();
        let patch = event.as_conversation_patch().unwrap();
        assert_eq!(patch.status, Some(ConversationStatus::Resolved));
        assert!(patch.assignee.is_none());
    }

    #[test]
    fn presence_typing_without_text() {
        let raw = r#"{"type": "presence_typing", "operatorId": "op-1", "contactId": "c-3"}"#;
        let event: BusEvent = serde_json::from_str(raw).unwrap();
        let BusEvent::PresenceTyping { text, .. } = event else {
            panic!("wrong variant");
        };
        assert!(text.is_none());
    }

    #[test]
    fn unknown_event_type_is_a_decode_error() {
        let raw = r#"{"type": "campaign_launched", "contactId": "c-1"}"#;
        assert!(serde_json::from_str::<BusEvent>(raw).is_err());
    }
}
