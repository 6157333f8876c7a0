// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-contact conversation state: the ordered message list and metadata.
//!
//! Invariants owned here:
//! - the message list is non-decreasing by timestamp;
//! - no two messages share an id;
//! - inbound messages are immutable once inserted; only outbound messages
//!   transition `Sending -> Sent | Error`.

use std::collections::{BTreeSet, HashSet};

use chrono::{DateTime, Utc};
use switchboard_core::types::{
    ContactSnapshot, ConversationPatch, ConversationStatus, Message, MessagePage,
};
use switchboard_core::{AgentId, ChannelId, ContactId, MessageId, OperatorId, TagRef};

/// The ordered message history and status metadata for one contact.
#[derive(Debug)]
pub struct Conversation {
    contact_id: ContactId,
    messages: Vec<Message>,
    known_ids: HashSet<MessageId>,

    pub contact_name: Option<String>,
    pub number: Option<String>,
    pub channel_id: Option<ChannelId>,
    pub status: ConversationStatus,
    pub assignee_id: Option<OperatorId>,
    pub assignee_name: Option<String>,
    pub tags: BTreeSet<TagRef>,
    pub unread_count: u32,

    /// The agent currently bound to this conversation for automation.
    pub agent_id: Option<AgentId>,
    /// Set by the `stop_responding` rule action; the rule engine skips
    /// evaluation entirely while this is set, until manually reset.
    pub bot_silenced: bool,

    /// Backward-pagination cursor: timestamp of the oldest loaded message.
    pub oldest_loaded: Option<DateTime<Utc>>,
    pub has_more_before: bool,
}

impl Conversation {
    /// Creates an empty conversation for a contact.
    pub fn new(contact_id: ContactId) -> Self {
        Self {
            contact_id,
            messages: Vec::new(),
            known_ids: HashSet::new(),
            contact_name: None,
            number: None,
            channel_id: None,
            status: ConversationStatus::Pending,
            assignee_id: None,
            assignee_name: None,
            tags: BTreeSet::new(),
            unread_count: 0,
            agent_id: None,
            bot_silenced: false,
            oldest_loaded: None,
            has_more_before: false,
        }
    }

    /// Creates a conversation from the contact snapshot delivered with a
    /// push event.
    pub fn from_snapshot(snapshot: &ContactSnapshot) -> Self {
        let mut conversation = Self::new(snapshot.id.clone());
        conversation.contact_name = snapshot.name.clone();
        conversation.number = snapshot.number.clone();
        conversation.channel_id = snapshot.channel_id.clone();
        conversation
    }

    pub fn contact_id(&self) -> &ContactId {
        &self.contact_id
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    pub fn contains_message(&self, id: &MessageId) -> bool {
        self.known_ids.contains(id)
    }

    /// Inserts a message preserving timestamp order, deduplicating by id.
    ///
    /// Returns `false` for a duplicate (no-op). Messages arrive in
    /// best-effort order, so insertion walks back from the tail; the common
    /// case (newest message) is an O(1) append.
    pub fn insert_ordered(&mut self, message: Message) -> bool {
        if !self.known_ids.insert(message.id.clone()) {
            return false;
        }

        let position = self
            .messages
            .iter()
            .rposition(|existing| existing.timestamp <= message.timestamp)
            .map(|index| index + 1)
            .unwrap_or(0);
        self.messages.insert(position, message);
        true
    }

    /// Replaces the full message list and pagination cursor from a fresh
    /// initial load. Last call wins.
    pub fn replace_messages(&mut self, page: MessagePage) {
        self.known_ids = page.messages.iter().map(|m| m.id.clone()).collect();
        self.oldest_loaded = page.messages.first().map(|m| m.timestamp);
        self.has_more_before = page.has_more;
        self.messages = page.messages;
    }

    /// Prepends an older page (oldest-first) at the front of the list.
    ///
    /// Messages already present are skipped, so a page overlapping a
    /// concurrent live append never duplicates. Returns the number of
    /// messages actually prepended: every previously-present message's
    /// index shifts by exactly that amount.
    pub fn prepend_page(&mut self, page: MessagePage) -> usize {
        let mut fresh: Vec<Message> = page
            .messages
            .into_iter()
            .filter(|m| !self.known_ids.contains(&m.id))
            .collect();
        let prepended = fresh.len();

        for message in &fresh {
            self.known_ids.insert(message.id.clone());
        }
        if let Some(first) = fresh.first() {
            self.oldest_loaded = Some(first.timestamp);
        }
        self.has_more_before = page.has_more;

        fresh.append(&mut self.messages);
        self.messages = fresh;
        prepended
    }

    /// Transitions an optimistic message out of `Sending`.
    ///
    /// The message is looked up by its temporary id; returns a mutable
    /// reference to it, or `None` when no such pending message exists.
    pub fn pending_message_mut(&mut self, temp_id: &MessageId) -> Option<&mut Message> {
        self.messages
            .iter_mut()
            .find(|m| &m.id == temp_id && m.direction.is_outbound())
    }

    /// Rebinds a confirmed message from its temporary id to the
    /// store-assigned id.
    pub fn rebind_message_id(&mut self, temp_id: &MessageId, final_id: MessageId) {
        if let Some(message) = self.messages.iter_mut().find(|m| &m.id == temp_id) {
            self.known_ids.remove(temp_id);
            self.known_ids.insert(final_id.clone());
            message.id = final_id;
        }
    }

    /// Drops a message by id. Used only when a send confirmation collides
    /// with the already-pushed copy of the same message.
    pub fn remove_message(&mut self, id: &MessageId) -> bool {
        if self.known_ids.remove(id) {
            self.messages.retain(|m| &m.id != id);
            true
        } else {
            false
        }
    }

    /// Shallow-merges a metadata patch; the message list is untouched.
    pub fn apply_patch(&mut self, patch: ConversationPatch) {
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(assignee) = patch.assignee {
            self.assignee_id = assignee.operator_id;
            self.assignee_name = assignee.operator_name;
        }
        if let Some(tags) = patch.tags {
            self.tags = tags.into_iter().collect();
        }
    }
}
