// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Presence and supervision tracking for the Switchboard console.
//!
//! Three concerns live here:
//! - [`PresenceTracker`]: the local map of remote operator presence, fed
//!   by push events, with TTL expiry and a view-duration tick.
//! - [`LocalPresence`]: publishes the local operator's viewing/typing
//!   state, with an explicit cancellable typing-idle timer per
//!   conversation.
//! - [`AssignmentPrompter`]: the heuristic for suggesting assignment when
//!   replying into unassigned conversations.

pub mod assignment;
pub mod tracker;
pub mod typing;

pub use assignment::AssignmentPrompter;
pub use tracker::{PresenceEntry, PresenceState, PresenceTracker};
pub use typing::{IdleTimer, LocalPresence};
