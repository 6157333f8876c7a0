// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message/contact persistence API (opaque remote store, CRUD calls only).

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::SwitchboardError;
use crate::types::{ContactId, Message, MessageId, MessagePage};

/// Read/write access to the persisted message history of a contact.
///
/// Backed by `GET /messages` and `POST /messages`; pagination is
/// timestamp-cursored and pages arrive oldest-first.
#[async_trait]
pub trait MessageHistoryApi: Send + Sync {
    /// Fetches up to `limit` messages for a contact, older than `before`
    /// when given, ordered oldest-first.
    async fn fetch_messages(
        &self,
        contact_id: &ContactId,
        limit: usize,
        before: Option<DateTime<Utc>>,
    ) -> Result<MessagePage, SwitchboardError>;

    /// Persists an outbound message; returns the store-assigned id.
    async fn persist_message(
        &self,
        contact_id: &ContactId,
        message: &Message,
    ) -> Result<MessageId, SwitchboardError>;
}
