// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Event bus client for the Switchboard engine.
//!
//! Maintains one durable push connection per organization, decodes inbound
//! frames into typed [`switchboard_core::BusEvent`]s, and reconnects with
//! capped exponential backoff on drop. Malformed frames are dropped and
//! logged; consumers never observe a connection gap as a semantic event.

pub mod backoff;
pub mod client;
pub mod decode;

pub use backoff::Backoff;
pub use client::{EventBusClient, EventSubscriber, SubscriptionHandle};
pub use decode::decode_frame;
