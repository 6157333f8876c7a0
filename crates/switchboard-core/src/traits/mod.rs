// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator trait definitions for the Switchboard engine.
//!
//! The engine core never talks to the network directly; every boundary
//! (persistence API, channel send API, rule management, presence egress,
//! notification surface) is a trait defined here, with `#[async_trait]`
//! for dynamic dispatch compatibility.

pub mod adapter;
pub mod connector;
pub mod contacts;
pub mod history;
pub mod notify;
pub mod presence;
pub mod rules;

// Re-export all traits at the traits module level for convenience.
pub use adapter::PluginAdapter;
pub use connector::ChannelConnector;
pub use contacts::{ContactApi, TagApi};
pub use history::MessageHistoryApi;
pub use notify::NotificationSink;
pub use presence::PresenceEgress;
pub use rules::RuleSource;
