// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock collaborators for deterministic testing.
//!
//! Every boundary trait from `switchboard-core` has an in-memory fake here
//! that captures calls for assertion and can be scripted to fail, in the
//! same spirit as the engine's production collaborators but with zero I/O.

pub mod mocks;

pub use mocks::{
    CapturedSend, MockConnector, MockContactApi, MockHistoryApi, MockPresenceEgress,
    MockRuleSource, MockTagApi, RecordingNotificationSink,
};
