// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wire types for the persistence and management REST APIs.
//!
//! Response payloads are camelCase; messages arrive as
//! `{id, content, type, direction, status, createdAt, channelId}` with
//! optional media fields, and history pages carry a `hasMore` flag.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use switchboard_core::types::{
    DeliveryStatus, Direction, MediaDescriptor, MediaKind, Message, MessagePage,
};
use switchboard_core::MessageId;

/// One message as served by `GET /messages`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireMessage {
    pub id: String,
    #[serde(default)]
    pub content: String,
    /// Payload kind: `text` or a media kind.
    #[serde(rename = "type", default = "default_kind")]
    pub kind: String,
    pub direction: Direction,
    pub status: DeliveryStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub channel_id: Option<String>,
    #[serde(default)]
    pub media_url: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
}

fn default_kind() -> String {
    "text".to_string()
}

impl WireMessage {
    /// Converts the wire shape into the domain message.
    pub fn into_message(self) -> Message {
        let media = match self.kind.as_str() {
            "image" => Some(MediaKind::Image),
            "video" => Some(MediaKind::Video),
            "audio" => Some(MediaKind::Audio),
            "document" => Some(MediaKind::Document),
            _ => None,
        }
        .map(|kind| MediaDescriptor {
            kind,
            url: self.media_url,
            caption: self.caption,
        });

        Message {
            id: MessageId(self.id),
            direction: self.direction,
            text: self.content,
            media,
            status: self.status,
            timestamp: self.created_at,
            external_id: None,
            automated: false,
        }
    }
}

/// Response of `GET /messages`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagesResponse {
    #[serde(default)]
    pub messages: Vec<WireMessage>,
    #[serde(default)]
    pub has_more: bool,
}

impl MessagesResponse {
    pub fn into_page(self) -> MessagePage {
        MessagePage {
            messages: self
                .messages
                .into_iter()
                .map(WireMessage::into_message)
                .collect(),
            has_more: self.has_more,
        }
    }
}

/// Body of `POST /messages`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistMessageRequest<'a> {
    pub contact_id: &'a str,
    pub content: &'a str,
    #[serde(rename = "type")]
    pub kind: &'a str,
    pub direction: Direction,
}

/// Response of `POST /messages`.
#[derive(Debug, Clone, Deserialize)]
pub struct PersistMessageResponse {
    pub id: String,
}

/// Response of `POST /channels/:id/send`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendResponse {
    pub external_id: String,
}

/// Body of `PATCH /contacts/:id/assign`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignRequest<'a> {
    pub operator_id: Option<&'a str>,
}

/// Body of `PATCH /contacts/:id` for a tag attach.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachTagRequest<'a> {
    pub add_tag: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_message_defaults_to_text_kind() {
        let raw = r#"{
            "id": "m1",
            "content": "oi",
            "direction": "inbound",
            "status": "sent",
            "createdAt": "2026-03-01T10:00:00Z"
        }"#;
        let wire: WireMessage = serde_json::from_str(raw).unwrap();
        let message = wire.into_message();
        assert!(message.media.is_none());
        assert_eq!(message.text, "oi");
    }

    #[test]
    fn wire_message_with_media_maps_descriptor() {
        let raw = r#"{
            "id": "m2",
            "content": "",
            "type": "image",
            "direction": "inbound",
            "status": "sent",
            "createdAt": "2026-03-01T10:00:00Z",
            "mediaUrl": "https://cdn/img.jpg",
            "caption": "foto"
        }"#;
        let wire: WireMessage = serde_json::from_str(raw).unwrap();
        let message = wire.into_message();
        let media = message.media.unwrap();
        assert_eq!(media.kind, MediaKind::Image);
        assert_eq!(media.url.as_deref(), Some("https://cdn/img.jpg"));
        assert_eq!(media.caption.as_deref(), Some("foto"));
    }

    #[test]
    fn messages_response_preserves_has_more() {
        let raw = r#"{"messages": [], "hasMore": true}"#;
        let page = serde_json::from_str::<MessagesResponse>(raw)
            .unwrap()
            .into_page();
        assert!(page.has_more);
        assert!(page.messages.is_empty());
    }
}
