// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory fakes for the Switchboard collaborator traits.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use switchboard_core::error::SwitchboardError;
use switchboard_core::events::Notice;
use switchboard_core::traits::presence::PresenceUpdate;
use switchboard_core::traits::{
    ChannelConnector, ContactApi, MessageHistoryApi, NotificationSink, PresenceEgress,
    RuleSource, TagApi,
};
use switchboard_core::types::{
    ContactId, ConversationStatus, Message, MessageId, MessagePage, OperatorId,
    OutboundPayload, RuleRecord, TagRef,
};
use switchboard_core::{AgentId, ChannelId};

fn scripted_failure(what: &str) -> SwitchboardError {
    SwitchboardError::Api {
        message: format!("{what} failed (scripted)"),
        status: Some(500),
        source: None,
    }
}

/// Captures assignment and status calls.
#[derive(Default)]
pub struct MockContactApi {
    pub assignments: Mutex<Vec<(ContactId, Option<OperatorId>)>>,
    pub status_changes: Mutex<Vec<(ContactId, ConversationStatus)>>,
    failing: AtomicBool,
}

impl MockContactApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// All subsequent calls fail with a scripted API error.
    pub fn fail_from_now(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    pub fn assignment_count(&self) -> usize {
        self.assignments.lock().unwrap().len()
    }
}

#[async_trait]
impl ContactApi for MockContactApi {
    async fn assign(
        &self,
        contact_id: &ContactId,
        operator_id: Option<&OperatorId>,
    ) -> Result<(), SwitchboardError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(scripted_failure("assign"));
        }
        self.assignments
            .lock()
            .unwrap()
            .push((contact_id.clone(), operator_id.cloned()));
        Ok(())
    }

    async fn set_status(
        &self,
        contact_id: &ContactId,
        status: ConversationStatus,
    ) -> Result<(), SwitchboardError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(scripted_failure("set_status"));
        }
        self.status_changes
            .lock()
            .unwrap()
            .push((contact_id.clone(), status));
        Ok(())
    }
}

/// Captures tag attaches; attaching twice is a success no-op both times,
/// mirroring the idempotency contract.
#[derive(Default)]
pub struct MockTagApi {
    pub attaches: Mutex<Vec<(ContactId, TagRef)>>,
    failing: AtomicBool,
}

impl MockTagApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_from_now(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    pub fn attach_count(&self) -> usize {
        self.attaches.lock().unwrap().len()
    }
}

#[async_trait]
impl TagApi for MockTagApi {
    async fn attach_tag(
        &self,
        contact_id: &ContactId,
        tag: &TagRef,
    ) -> Result<(), SwitchboardError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(scripted_failure("attach_tag"));
        }
        self.attaches
            .lock()
            .unwrap()
            .push((contact_id.clone(), tag.clone()));
        Ok(())
    }
}

/// One captured outbound send.
#[derive(Debug, Clone)]
pub struct CapturedSend {
    pub channel_id: ChannelId,
    pub number: String,
    pub text: Option<String>,
}

/// Captures channel sends and hands out sequential external ids.
#[derive(Default)]
pub struct MockConnector {
    pub sends: Mutex<Vec<CapturedSend>>,
    counter: AtomicU64,
    failing: AtomicBool,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_from_now(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    pub fn sent_count(&self) -> usize {
        self.sends.lock().unwrap().len()
    }

    pub fn sent_texts(&self) -> Vec<String> {
        self.sends
            .lock()
            .unwrap()
            .iter()
            .filter_map(|s| s.text.clone())
            .collect()
    }
}

#[async_trait]
impl ChannelConnector for MockConnector {
    async fn send(
        &self,
        channel_id: &ChannelId,
        payload: &OutboundPayload,
    ) -> Result<String, SwitchboardError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(SwitchboardError::Transport {
                message: "send failed (scripted)".into(),
                source: None,
            });
        }
        self.sends.lock().unwrap().push(CapturedSend {
            channel_id: channel_id.clone(),
            number: payload.number.clone(),
            text: payload.text.clone(),
        });
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("ext-{n}"))
    }
}

/// Serves scripted history pages per contact, in FIFO order.
#[derive(Default)]
pub struct MockHistoryApi {
    pages: Mutex<HashMap<ContactId, VecDeque<MessagePage>>>,
    pub persisted: Mutex<Vec<(ContactId, Message)>>,
    counter: AtomicU64,
}

impl MockHistoryApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a page to serve for the next fetch for this contact.
    pub fn queue_page(&self, contact_id: &ContactId, page: MessagePage) {
        self.pages
            .lock()
            .unwrap()
            .entry(contact_id.clone())
            .or_default()
            .push_back(page);
    }
}

#[async_trait]
impl MessageHistoryApi for MockHistoryApi {
    async fn fetch_messages(
        &self,
        contact_id: &ContactId,
        _limit: usize,
        _before: Option<DateTime<Utc>>,
    ) -> Result<MessagePage, SwitchboardError> {
        Ok(self
            .pages
            .lock()
            .unwrap()
            .get_mut(contact_id)
            .and_then(|q| q.pop_front())
            .unwrap_or_default())
    }

    async fn persist_message(
        &self,
        contact_id: &ContactId,
        message: &Message,
    ) -> Result<MessageId, SwitchboardError> {
        self.persisted
            .lock()
            .unwrap()
            .push((contact_id.clone(), message.clone()));
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(MessageId(format!("persisted-{n}")))
    }
}

/// Serves a fixed rule record set per agent.
#[derive(Default)]
pub struct MockRuleSource {
    records: Mutex<HashMap<AgentId, Vec<RuleRecord>>>,
}

impl MockRuleSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_rules(&self, agent_id: &AgentId, records: Vec<RuleRecord>) {
        self.records
            .lock()
            .unwrap()
            .insert(agent_id.clone(), records);
    }
}

#[async_trait]
impl RuleSource for MockRuleSource {
    async fn fetch_rules(
        &self,
        agent_id: &AgentId,
    ) -> Result<Vec<RuleRecord>, SwitchboardError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .get(agent_id)
            .cloned()
            .unwrap_or_default())
    }
}

/// Captures presence updates.
#[derive(Default)]
pub struct MockPresenceEgress {
    pub updates: Mutex<Vec<PresenceUpdate>>,
}

impl MockPresenceEgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update_count(&self) -> usize {
        self.updates.lock().unwrap().len()
    }

    pub fn last_update(&self) -> Option<PresenceUpdate> {
        self.updates.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl PresenceEgress for MockPresenceEgress {
    async fn publish(&self, update: &PresenceUpdate) -> Result<(), SwitchboardError> {
        self.updates.lock().unwrap().push(update.clone());
        Ok(())
    }
}

/// Records every notice for assertion.
#[derive(Default)]
pub struct RecordingNotificationSink {
    pub notices: Mutex<Vec<Notice>>,
}

impl RecordingNotificationSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notice_count(&self) -> usize {
        self.notices.lock().unwrap().len()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }
}

impl NotificationSink for RecordingNotificationSink {
    fn notify(&self, notice: Notice) {
        self.notices.lock().unwrap().push(notice);
    }
}
