// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Contact mutation APIs: assignment, status transitions, tag attach.

use async_trait::async_trait;

use crate::error::SwitchboardError;
use crate::types::{ContactId, ConversationStatus, OperatorId, TagRef};

/// Assignment and status transitions for a contact's conversation.
///
/// Backed by `PATCH /contacts/:id/assign` and
/// `PATCH /contacts/:id/resolve|open`.
#[async_trait]
pub trait ContactApi: Send + Sync {
    /// Assigns the conversation to an operator, or unassigns it for pool
    /// pickup when `operator_id` is `None`.
    async fn assign(
        &self,
        contact_id: &ContactId,
        operator_id: Option<&OperatorId>,
    ) -> Result<(), SwitchboardError>;

    /// Transitions the conversation status server-side.
    async fn set_status(
        &self,
        contact_id: &ContactId,
        status: ConversationStatus,
    ) -> Result<(), SwitchboardError>;
}

/// Tag attachment for a contact's conversation.
#[async_trait]
pub trait TagApi: Send + Sync {
    /// Attaches a tag. MUST be idempotent: attaching an already-present
    /// tag is a success no-op, never an error.
    async fn attach_tag(
        &self,
        contact_id: &ContactId,
        tag: &TagRef,
    ) -> Result<(), SwitchboardError>;
}
