// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Non-blocking notification surface (toasts, status indicator).

use crate::events::Notice;

/// Receives operator-facing notices.
///
/// Implementations must not block: the engine calls this from its event
/// loop. A typical implementation pushes onto an unbounded channel drained
/// by the UI layer.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// A sink that drops every notice; useful as a default and in tests that
/// do not assert on notifications.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullNotificationSink;

impl NotificationSink for NullNotificationSink {
    fn notify(&self, _notice: Notice) {}
}
