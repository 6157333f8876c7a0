// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Local presence publication with explicit typing-expiry timers.
//!
//! `set_typing(true)` must auto-expire after an idle window. Rather than
//! ad-hoc debounced closures, expiry is an explicit cancellable
//! [`IdleTimer`] owned per conversation: every keystroke cancels and
//! re-arms it, so timers never stack or leak across rapid input.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use switchboard_core::traits::presence::PresenceUpdate;
use switchboard_core::traits::PresenceEgress;
use switchboard_core::ContactId;

/// A single-shot cancellable timer: `arm` schedules a future after a
/// delay, cancelling whatever was armed before.
#[derive(Debug, Default)]
pub struct IdleTimer {
    handle: Option<JoinHandle<()>>,
}

impl IdleTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms the timer: after `delay`, `after` runs. Re-arming cancels the
    /// previously scheduled run; timers never stack.
    pub fn arm<F>(&mut self, delay: Duration, after: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        self.handle = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            after.await;
        }));
    }

    /// Cancels the pending run, if any.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    pub fn is_armed(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for IdleTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Publishes the local operator's presence outward, owning one typing
/// timer per conversation.
pub struct LocalPresence {
    egress: Arc<dyn PresenceEgress>,
    typing_idle: Duration,
    timers: HashMap<ContactId, IdleTimer>,
}

impl LocalPresence {
    pub fn new(egress: Arc<dyn PresenceEgress>, typing_idle: Duration) -> Self {
        Self {
            egress,
            typing_idle,
            timers: HashMap::new(),
        }
    }

    /// Announces that the operator opened a conversation.
    pub async fn start_viewing(&mut self, contact_id: &ContactId) {
        self.publish(&PresenceUpdate::Viewing {
            contact_id: contact_id.clone(),
        })
        .await;
    }

    /// Announces that the operator left a conversation, cancelling any
    /// pending typing expiry for it.
    pub async fn stop_viewing(&mut self, contact_id: &ContactId) {
        if let Some(mut timer) = self.timers.remove(contact_id) {
            timer.cancel();
        }
        self.publish(&PresenceUpdate::Left {
            contact_id: contact_id.clone(),
        })
        .await;
    }

    /// Reports a keystroke: publishes the typing state (with the draft for
    /// supervision) and re-arms the idle expiry timer.
    pub async fn keystroke(&mut self, contact_id: &ContactId, draft: &str) {
        self.publish(&PresenceUpdate::Typing {
            contact_id: contact_id.clone(),
            text: Some(draft.to_string()),
            active: true,
        })
        .await;

        let egress = Arc::clone(&self.egress);
        let contact = contact_id.clone();
        let timer = self.timers.entry(contact_id.clone()).or_default();
        timer.arm(self.typing_idle, async move {
            debug!(contact_id = %contact, "typing idle window elapsed");
            let update = PresenceUpdate::Typing {
                contact_id: contact,
                text: None,
                active: false,
            };
            if let Err(e) = egress.publish(&update).await {
                warn!(error = %e, "failed to publish typing expiry");
            }
        });
    }

    /// Explicitly ends typing (e.g. the draft was sent or cleared).
    pub async fn stop_typing(&mut self, contact_id: &ContactId) {
        if let Some(timer) = self.timers.get_mut(contact_id) {
            timer.cancel();
        }
        self.publish(&PresenceUpdate::Typing {
            contact_id: contact_id.clone(),
            text: None,
            active: false,
        })
        .await;
    }

    async fn publish(&self, update: &PresenceUpdate) {
        // Presence is best-effort; a failed publish degrades to stale
        // remote state that the receiver's TTL cleans up.
        if let Err(e) = self.egress.publish(update).await {
            warn!(error = %e, "failed to publish presence update");
        }
    }
}
