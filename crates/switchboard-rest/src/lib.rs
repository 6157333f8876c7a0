// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! REST collaborator client for the Switchboard engine.
//!
//! Implements every boundary trait from `switchboard-core` over the
//! surrounding product's REST API: message history and persistence,
//! contact assignment and status transitions, idempotent tag attach,
//! per-channel outbound send, rule management reads, and presence egress.

pub mod client;
pub mod wire;

pub use client::RestApi;
