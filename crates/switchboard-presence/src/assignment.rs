// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Assignment prompt heuristic.
//!
//! After an operator replies into an unassigned conversation, the console
//! suggests taking the assignment: on the first reply of the session and
//! again every Nth, unless the operator dismissed the prompt for that
//! contact. Dismissal is a per-contact flag with an explicit lifecycle
//! (set on dismiss, cleared never, readable at prompt time) and a
//! snapshot/restore surface so a host service can persist it.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use switchboard_core::ContactId;

/// Decides when to surface the assignment prompt.
#[derive(Debug)]
pub struct AssignmentPrompter {
    every_n: u32,
    session_replies: HashMap<ContactId, u32>,
    opted_out: HashSet<ContactId>,
}

impl AssignmentPrompter {
    /// `every_n` is the repeat cadence after the first prompt.
    pub fn new(every_n: u32) -> Self {
        Self {
            every_n: every_n.max(1),
            session_replies: HashMap::new(),
            opted_out: HashSet::new(),
        }
    }

    /// Records an operator reply; returns whether to show the prompt.
    ///
    /// Prompts only into unassigned conversations: on the 1st reply of the
    /// session and every `every_n`th after, never for a dismissed contact.
    pub fn note_reply(&mut self, contact_id: &ContactId, conversation_assigned: bool) -> bool {
        let count = self
            .session_replies
            .entry(contact_id.clone())
            .and_modify(|c| *c += 1)
            .or_insert(1);
        let count = *count;

        if conversation_assigned || self.opted_out.contains(contact_id) {
            return false;
        }
        count == 1 || count % self.every_n == 0
    }

    /// Dismisses the prompt for a contact for the rest of the session.
    pub fn dismiss(&mut self, contact_id: &ContactId) {
        debug!(contact_id = %contact_id, "assignment prompt dismissed");
        self.opted_out.insert(contact_id.clone());
    }

    pub fn is_dismissed(&self, contact_id: &ContactId) -> bool {
        self.opted_out.contains(contact_id)
    }

    /// The dismissed-contact set, for persistence by the host service.
    pub fn snapshot(&self) -> Vec<ContactId> {
        let mut contacts: Vec<ContactId> = self.opted_out.iter().cloned().collect();
        contacts.sort();
        contacts
    }

    /// Restores a previously-persisted dismissed set.
    pub fn restore(&mut self, contacts: impl IntoIterator<Item = ContactId>) {
        self.opted_out.extend(contacts);
    }
}
