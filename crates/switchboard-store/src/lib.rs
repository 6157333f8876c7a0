// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation State Store for the Switchboard engine.
//!
//! Owns all per-contact conversation state: the ordered message list, the
//! optimistic-send lifecycle, the backward-pagination cursor, conversation
//! metadata, the unread index, and the recency ordering. All mutations
//! funnel through [`ConversationStore`]'s synchronous single-writer API;
//! the surrounding runtime serializes callers so no partial mutation is
//! ever observable.

pub mod conversation;
pub mod recency;
pub mod store;

pub use conversation::Conversation;
pub use recency::RecencyList;
pub use store::{
    ConversationStore, InboundOutcome, LoadToken, OlderLoadOutcome, SendConfirmation,
};
