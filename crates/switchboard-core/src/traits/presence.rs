// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound presence publication.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::SwitchboardError;
use crate::types::ContactId;

/// A presence state change published by the local operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PresenceUpdate {
    /// Operator opened the conversation.
    #[serde(rename_all = "camelCase")]
    Viewing { contact_id: ContactId },
    /// Operator left the conversation.
    #[serde(rename_all = "camelCase")]
    Left { contact_id: ContactId },
    /// Operator typing state. `text` carries the draft for supervision
    /// while active; an inactive update clears the typing state.
    #[serde(rename_all = "camelCase")]
    Typing {
        contact_id: ContactId,
        #[serde(default)]
        text: Option<String>,
        active: bool,
    },
}

/// Publishes local presence changes outward.
///
/// Backed by `POST /presence/viewing|left|typing`.
#[async_trait]
pub trait PresenceEgress: Send + Sync {
    async fn publish(&self, update: &PresenceUpdate) -> Result<(), SwitchboardError>;
}
