// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The Conversation State Store: the single logical writer for all
//! conversation state.
//!
//! Every mutation is a synchronous `&mut self` operation that completes
//! atomically relative to the caller's scheduler; the runtime serializes
//! callers, which is the discipline that keeps dedupe, unread accounting,
//! and bubbling correct without fine-grained locks. Network fetches happen
//! outside the store; their results re-enter through `load_initial` /
//! `apply_older_page`, guarded against staleness by [`LoadToken`].

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use switchboard_core::types::{
    ContactSnapshot, ConversationPatch, DeliveryStatus, Message, MessageDraft, MessagePage,
};
use switchboard_core::{AgentId, ContactId, MessageId, SwitchboardError, TagRef};

use crate::conversation::Conversation;
use crate::recency::RecencyList;

/// Result of applying a pushed message to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundOutcome {
    /// The message id was already present; nothing changed.
    Duplicate,
    /// The message landed in the currently-selected conversation; it is
    /// delivered to the live view and unread stays at 0.
    DeliveredLive,
    /// The message landed in a non-selected conversation; unread was
    /// incremented to the contained value.
    UnreadIncremented(u32),
    /// An outbound echo (another operator or device); appended without
    /// touching unread.
    OutboundEcho,
}

impl InboundOutcome {
    /// Whether the event added a genuinely new inbound message, the only
    /// case that feeds rule evaluation.
    pub fn is_new_inbound(&self) -> bool {
        matches!(
            self,
            InboundOutcome::DeliveredLive | InboundOutcome::UnreadIncremented(_)
        )
    }
}

/// Result of applying an older history page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OlderLoadOutcome {
    /// The page was prepended; existing message indices shifted by
    /// exactly `prepended`.
    Applied { prepended: usize, has_more: bool },
    /// The token was stale (contact reloaded or deselected meanwhile);
    /// the page was discarded and no state changed.
    Stale,
}

/// Stale-response guard for a backward-pagination request.
///
/// Captures the contact and its load generation at request time; the
/// response is applied only if the generation still matches, so a page
/// that resolves after the operator navigated away is discarded instead of
/// mutating a conversation it no longer describes.
#[derive(Debug, Clone)]
pub struct LoadToken {
    contact_id: ContactId,
    generation: u64,
    /// Cursor to pass as `before` to the history fetch.
    pub before: Option<DateTime<Utc>>,
}

impl LoadToken {
    pub fn contact_id(&self) -> &ContactId {
        &self.contact_id
    }
}

/// Confirmation for an optimistic send.
#[derive(Debug, Clone)]
pub enum SendConfirmation {
    /// The server accepted the message; optionally carries the
    /// store-assigned id and the provider external id.
    Delivered {
        message_id: Option<MessageId>,
        external_id: Option<String>,
    },
    /// The send failed; the message stays visible marked `Error`.
    Failed,
}

/// In-memory, per-contact conversation state with a single-writer
/// mutation API.
#[derive(Debug, Default)]
pub struct ConversationStore {
    conversations: HashMap<ContactId, Conversation>,
    recency: RecencyList,
    /// The conversation currently open in the operator's view. Consulted
    /// synchronously by `apply_inbound` to pick the deliver-live vs
    /// increment-unread branch at delivery time.
    active: Option<ContactId>,
    generations: HashMap<ContactId, u64>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    // --- Read surface ---

    pub fn conversation(&self, contact_id: &ContactId) -> Option<&Conversation> {
        self.conversations.get(contact_id)
    }

    pub fn active_contact(&self) -> Option<&ContactId> {
        self.active.as_ref()
    }

    /// Contacts in most-recent-activity-first order.
    pub fn recency_order(&self) -> Vec<ContactId> {
        self.recency.ordered().cloned().collect()
    }

    /// The derived unread index: contact -> unread count, for contacts
    /// with at least one unread message.
    pub fn unread_index(&self) -> HashMap<ContactId, u32> {
        self.conversations
            .iter()
            .filter(|(_, c)| c.unread_count > 0)
            .map(|(id, c)| (id.clone(), c.unread_count))
            .collect()
    }

    // --- Selection ---

    /// Makes `contact_id` the selected conversation (or clears selection
    /// with `None`), zeroing its unread count in the same operation.
    ///
    /// Bumps the load generation of the previously-selected contact so any
    /// in-flight pagination for it is discarded on arrival.
    pub fn select_conversation(&mut self, contact_id: Option<ContactId>) {
        if self.active == contact_id {
            return;
        }
        if let Some(previous) = self.active.take() {
            self.bump_generation(&previous);
        }
        if let Some(ref contact) = contact_id {
            let conversation = self.conversation_entry(contact);
            conversation.unread_count = 0;
        }
        self.active = contact_id;
    }

    /// Zeroes the unread count for a contact without changing selection.
    pub fn mark_all_read(&mut self, contact_id: &ContactId) {
        if let Some(conversation) = self.conversations.get_mut(contact_id) {
            conversation.unread_count = 0;
        }
    }

    // --- History loading ---

    /// Replaces a contact's message list and pagination cursor from a
    /// fresh initial load. Always a full replace; when two initial loads
    /// overlap, the last one applied wins.
    pub fn load_initial(&mut self, contact_id: &ContactId, page: MessagePage) {
        self.bump_generation(contact_id);
        let conversation = self.conversation_entry(contact_id);
        conversation.replace_messages(page);
        debug!(contact_id = %contact_id, "initial history loaded");
    }

    /// Starts a backward-pagination request for a contact.
    ///
    /// Errors only on the programmer-error-class case of paginating a
    /// conversation that was never loaded.
    pub fn begin_older_load(
        &mut self,
        contact_id: &ContactId,
    ) -> Result<LoadToken, SwitchboardError> {
        let conversation = self.conversations.get(contact_id).ok_or_else(|| {
            SwitchboardError::Store(format!(
                "cannot paginate unknown conversation {contact_id}"
            ))
        })?;
        Ok(LoadToken {
            contact_id: contact_id.clone(),
            generation: self.generation(contact_id),
            before: conversation.oldest_loaded,
        })
    }

    /// Applies an older history page if its token is still current.
    ///
    /// Pagination targets the front of the list and live appends target
    /// the tail, so an inbound message that raced this fetch is never
    /// dropped or duplicated (the page skips ids already present).
    pub fn apply_older_page(
        &mut self,
        token: &LoadToken,
        page: MessagePage,
    ) -> OlderLoadOutcome {
        if self.generation(&token.contact_id) != token.generation {
            debug!(
                contact_id = %token.contact_id,
                "discarding stale pagination response"
            );
            return OlderLoadOutcome::Stale;
        }
        let Some(conversation) = self.conversations.get_mut(&token.contact_id) else {
            return OlderLoadOutcome::Stale;
        };
        let has_more = page.has_more;
        let prepended = conversation.prepend_page(page);
        OlderLoadOutcome::Applied { prepended, has_more }
    }

    // --- Outbound (optimistic) path ---

    /// Appends an outbound draft with a temporary id and `Sending` status,
    /// returning the temp id immediately; the caller completes the network
    /// send and reports back through [`confirm_send`](Self::confirm_send).
    pub fn append_optimistic(
        &mut self,
        contact_id: &ContactId,
        draft: MessageDraft,
    ) -> MessageId {
        let temp_id = MessageId(format!("tmp-{}", uuid::Uuid::new_v4()));
        let message = Message {
            id: temp_id.clone(),
            direction: draft.direction,
            text: draft.text,
            media: draft.media,
            status: DeliveryStatus::Sending,
            timestamp: Utc::now(),
            external_id: None,
            automated: draft.automated,
        };
        let conversation = self.conversation_entry(contact_id);
        conversation.insert_ordered(message);
        self.recency.touch(contact_id);
        temp_id
    }

    /// Resolves an optimistic message to `Sent` or `Error`.
    ///
    /// The message is never removed: a failed send stays visible so the
    /// operator can retry, and a silently-disappearing message is treated
    /// as the worse failure mode. If the push stream already delivered the
    /// confirmed copy under its final id, the temporary entry is dropped
    /// in favor of the pushed one.
    pub fn confirm_send(
        &mut self,
        contact_id: &ContactId,
        temp_id: &MessageId,
        confirmation: SendConfirmation,
    ) {
        let Some(conversation) = self.conversations.get_mut(contact_id) else {
            warn!(contact_id = %contact_id, "confirm_send for unknown conversation");
            return;
        };

        match confirmation {
            SendConfirmation::Delivered {
                message_id,
                external_id,
            } => {
                if let Some(ref final_id) = message_id
                    && conversation.contains_message(final_id)
                {
                    // The bus echoed the confirmed message before the HTTP
                    // response resolved; keep the pushed copy.
                    conversation.remove_message(temp_id);
                    debug!(contact_id = %contact_id, message_id = %final_id,
                        "optimistic message superseded by pushed copy");
                    return;
                }
                let Some(message) = conversation.pending_message_mut(temp_id) else {
                    debug!(contact_id = %contact_id, temp_id = %temp_id,
                        "confirm_send found no pending message");
                    return;
                };
                message.status = DeliveryStatus::Sent;
                message.external_id = external_id;
                if let Some(final_id) = message_id {
                    conversation.rebind_message_id(temp_id, final_id);
                }
            }
            SendConfirmation::Failed => {
                if let Some(message) = conversation.pending_message_mut(temp_id) {
                    message.status = DeliveryStatus::Error;
                }
            }
        }
    }

    // --- Push-stream ingestion ---

    /// Applies a pushed message. Duplicate ids are no-ops; unknown
    /// conversations are constructed from the snapshot (or bare). The
    /// deliver-live vs increment-unread branch is decided against the
    /// store's own selection at delivery time.
    pub fn apply_inbound(
        &mut self,
        contact_id: &ContactId,
        message: Message,
        snapshot: Option<&ContactSnapshot>,
    ) -> InboundOutcome {
        let is_active = self.active.as_ref() == Some(contact_id);
        if !self.conversations.contains_key(contact_id) {
            let fresh = snapshot
                .map(Conversation::from_snapshot)
                .unwrap_or_else(|| Conversation::new(contact_id.clone()));
            self.conversations.insert(contact_id.clone(), fresh);
        }
        let conversation = self
            .conversations
            .get_mut(contact_id)
            .expect("conversation ensured above");

        let inbound = !message.direction.is_outbound();
        if !conversation.insert_ordered(message) {
            return InboundOutcome::Duplicate;
        }
        self.recency.touch(contact_id);

        if !inbound {
            return InboundOutcome::OutboundEcho;
        }
        if is_active {
            InboundOutcome::DeliveredLive
        } else {
            let conversation = self
                .conversations
                .get_mut(contact_id)
                .expect("conversation inserted above");
            conversation.unread_count += 1;
            InboundOutcome::UnreadIncremented(conversation.unread_count)
        }
    }

    /// Shallow-merges a metadata patch and bubbles the contact.
    pub fn apply_conversation_update(
        &mut self,
        contact_id: &ContactId,
        patch: ConversationPatch,
    ) {
        let conversation = self.conversation_entry(contact_id);
        conversation.apply_patch(patch);
        self.recency.touch(contact_id);
    }

    // --- Rule-engine-requested mutations ---

    /// Marks or clears bot-silencing for a conversation.
    pub fn set_bot_silenced(&mut self, contact_id: &ContactId, silenced: bool) {
        let conversation = self.conversation_entry(contact_id);
        conversation.bot_silenced = silenced;
    }

    /// Rebinds the conversation to a different automation agent.
    pub fn set_active_agent(&mut self, contact_id: &ContactId, agent_id: Option<AgentId>) {
        let conversation = self.conversation_entry(contact_id);
        conversation.agent_id = agent_id;
    }

    /// Attaches a tag locally. Idempotent: returns `false` when the tag
    /// was already present. Bubbles on a genuine attach.
    pub fn attach_tag(&mut self, contact_id: &ContactId, tag: TagRef) -> bool {
        let conversation = self.conversation_entry(contact_id);
        let added = conversation.tags.insert(tag);
        if added {
            self.recency.touch(contact_id);
        }
        added
    }

    // --- Internals ---

    fn conversation_entry(&mut self, contact_id: &ContactId) -> &mut Conversation {
        self.conversations
            .entry(contact_id.clone())
            .or_insert_with(|| Conversation::new(contact_id.clone()))
    }

    fn generation(&self, contact_id: &ContactId) -> u64 {
        self.generations.get(contact_id).copied().unwrap_or(0)
    }

    fn bump_generation(&mut self, contact_id: &ContactId) {
        *self.generations.entry(contact_id.clone()).or_insert(0) += 1;
    }
}
