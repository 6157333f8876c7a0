// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Channel connector trait: the opaque transport to external messaging
//! networks.

use async_trait::async_trait;

use crate::error::SwitchboardError;
use crate::types::{ChannelId, OutboundPayload};

/// Outbound delivery through a messaging channel.
///
/// Backed by `POST /channels/:id/send`. The returned external id
/// correlates later delivery-status events from the push stream.
#[async_trait]
pub trait ChannelConnector: Send + Sync {
    /// Sends a text or media payload to a number through the channel.
    async fn send(
        &self,
        channel_id: &ChannelId,
        payload: &OutboundPayload,
    ) -> Result<String, SwitchboardError>;
}
