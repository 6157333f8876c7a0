// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Remote operator presence: who is viewing or typing into which
//! conversation.
//!
//! Records are ephemeral and operator-scoped: each operator only ever
//! writes their own records, so there are no cross-operator write
//! conflicts. A missed presence event degrades to a stale record that the
//! TTL expiry cleans up on the next tick.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::debug;

use switchboard_core::events::BusEvent;
use switchboard_core::{ContactId, OperatorId};

/// Presence state of one operator in one conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceState {
    Viewing,
    Typing,
}

/// One operator's presence in one conversation.
#[derive(Debug, Clone)]
pub struct PresenceEntry {
    pub operator_id: OperatorId,
    pub state: PresenceState,
    pub since: DateTime<Utc>,
    /// Seconds the operator has been in the conversation, advanced by
    /// [`PresenceTracker::tick`] with no network cost.
    pub view_duration_secs: u64,
    /// Draft text carried by a typing event, for supervision.
    pub draft: Option<String>,
    last_seen: DateTime<Utc>,
}

/// Local map of remote operator presence, fed by push events.
#[derive(Debug)]
pub struct PresenceTracker {
    records: HashMap<ContactId, Vec<PresenceEntry>>,
    ttl: Duration,
}

impl PresenceTracker {
    /// Creates a tracker whose records expire after `ttl` without refresh.
    pub fn new(ttl: Duration) -> Self {
        Self {
            records: HashMap::new(),
            ttl,
        }
    }

    /// Applies a presence event from the push stream; other event kinds
    /// are ignored.
    pub fn apply_event(&mut self, event: &BusEvent, now: DateTime<Utc>) {
        match event {
            BusEvent::PresenceViewing {
                operator_id,
                contact_id,
            } => {
                self.upsert(contact_id, operator_id, PresenceState::Viewing, None, now);
            }
            BusEvent::PresenceTyping {
                operator_id,
                contact_id,
                text,
            } => {
                // A typing event with no text means typing ended; the
                // operator is still viewing.
                let state = if text.is_some() {
                    PresenceState::Typing
                } else {
                    PresenceState::Viewing
                };
                self.upsert(contact_id, operator_id, state, text.clone(), now);
            }
            BusEvent::PresenceLeft {
                operator_id,
                contact_id,
            } => {
                if let Some(entries) = self.records.get_mut(contact_id) {
                    entries.retain(|e| &e.operator_id != operator_id);
                    if entries.is_empty() {
                        self.records.remove(contact_id);
                    }
                }
            }
            _ => {}
        }
    }

    /// Advances view durations and expires records whose operator has
    /// gone quiet past the TTL (their `left` event was lost).
    pub fn tick(&mut self, now: DateTime<Utc>) {
        let ttl = chrono::Duration::from_std(self.ttl).unwrap_or(chrono::Duration::MAX);
        self.records.retain(|contact_id, entries| {
            entries.retain(|entry| {
                let alive = now - entry.last_seen <= ttl;
                if !alive {
                    debug!(
                        contact_id = %contact_id,
                        operator_id = %entry.operator_id,
                        "presence record expired"
                    );
                }
                alive
            });
            for entry in entries.iter_mut() {
                entry.view_duration_secs = (now - entry.since).num_seconds().max(0) as u64;
            }
            !entries.is_empty()
        });
    }

    /// Presence entries for a conversation, if any.
    pub fn viewers(&self, contact_id: &ContactId) -> &[PresenceEntry] {
        self.records
            .get(contact_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Total number of live presence records.
    pub fn record_count(&self) -> usize {
        self.records.values().map(Vec::len).sum()
    }

    fn upsert(
        &mut self,
        contact_id: &ContactId,
        operator_id: &OperatorId,
        state: PresenceState,
        draft: Option<String>,
        now: DateTime<Utc>,
    ) {
        let entries = self.records.entry(contact_id.clone()).or_default();
        if let Some(entry) = entries.iter_mut().find(|e| &e.operator_id == operator_id) {
            entry.state = state;
            entry.draft = draft;
            entry.last_seen = now;
        } else {
            entries.push(PresenceEntry {
                operator_id: operator_id.clone(),
                state,
                since: now,
                view_duration_secs: 0,
                draft,
                last_seen: now,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_760_000_000 + secs, 0).unwrap()
    }

    fn viewing(op: &str, contact: &str) -> BusEvent {
        BusEvent::PresenceViewing {
            operator_id: OperatorId(op.into()),
            contact_id: ContactId(contact.into()),
        }
    }

    fn typing(op: &str, contact: &str, text: Option<&str>) -> BusEvent {
        BusEvent::PresenceTyping {
            operator_id: OperatorId(op.into()),
            contact_id: ContactId(contact.into()),
            text: text.map(String::from),
        }
    }

    fn left(op: &str, contact: &str) -> BusEvent {
        BusEvent::PresenceLeft {
            operator_id: OperatorId(op.into()),
            contact_id: ContactId(contact.into()),
        }
    }

    #[test]
    fn viewing_creates_record() {
        let mut tracker = PresenceTracker::new(Duration::from_secs(300));
        tracker.apply_event(&viewing("op-1", "c-1"), now(0));

        let viewers = tracker.viewers(&ContactId("c-1".into()));
        assert_eq!(viewers.len(), 1);
        assert_eq!(viewers[0].state, PresenceState::Viewing);
    }

    #[test]
    fn typing_refreshes_and_carries_draft() {
        let mut tracker = PresenceTracker::new(Duration::from_secs(300));
        tracker.apply_event(&viewing("op-1", "c-1"), now(0));
        tracker.apply_event(&typing("op-1", "c-1", Some("digitando...")), now(5));

        let viewers = tracker.viewers(&ContactId("c-1".into()));
        assert_eq!(viewers[0].state, PresenceState::Typing);
        assert_eq!(viewers[0].draft.as_deref(), Some("digitando..."));
        // since is preserved across refreshes.
        assert_eq!(viewers[0].since, now(0));
    }

    #[test]
    fn typing_without_text_downgrades_to_viewing() {
        let mut tracker = PresenceTracker::new(Duration::from_secs(300));
        tracker.apply_event(&typing("op-1", "c-1", Some("x")), now(0));
        tracker.apply_event(&typing("op-1", "c-1", None), now(2));

        let viewers = tracker.viewers(&ContactId("c-1".into()));
        assert_eq!(viewers[0].state, PresenceState::Viewing);
        assert!(viewers[0].draft.is_none());
    }

    #[test]
    fn left_removes_record() {
        let mut tracker = PresenceTracker::new(Duration::from_secs(300));
        tracker.apply_event(&viewing("op-1", "c-1"), now(0));
        tracker.apply_event(&viewing("op-2", "c-1"), now(1));
        tracker.apply_event(&left("op-1", "c-1"), now(2));

        let viewers = tracker.viewers(&ContactId("c-1".into()));
        assert_eq!(viewers.len(), 1);
        assert_eq!(viewers[0].operator_id.as_str(), "op-2");
    }

    #[test]
    fn tick_advances_view_duration() {
        let mut tracker = PresenceTracker::new(Duration::from_secs(300));
        tracker.apply_event(&viewing("op-1", "c-1"), now(0));
        tracker.tick(now(42));

        let viewers = tracker.viewers(&ContactId("c-1".into()));
        assert_eq!(viewers[0].view_duration_secs, 42);
    }

    #[test]
    fn tick_expires_stale_records() {
        let mut tracker = PresenceTracker::new(Duration::from_secs(60));
        tracker.apply_event(&viewing("op-1", "c-1"), now(0));
        tracker.apply_event(&viewing("op-2", "c-1"), now(50));

        tracker.tick(now(70));
        // op-1 went quiet past the TTL (lost `left` event); op-2 is alive.
        let viewers = tracker.viewers(&ContactId("c-1".into()));
        assert_eq!(viewers.len(), 1);
        assert_eq!(viewers[0].operator_id.as_str(), "op-2");
    }

    #[test]
    fn non_presence_events_are_ignored() {
        let mut tracker = PresenceTracker::new(Duration::from_secs(300));
        let event: BusEvent = serde_json::from_str(
            r#"{"type": "conversation_updated", "contactId": "c-1", "status": "open"}"#,
        )
        .unwrap();
        tracker.apply_event(&event, now(0));
        assert_eq!(tracker.record_count(), 0);
    }
}
