// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Runtime wiring for the Switchboard conversation engine.
//!
//! The [`InboxLoop`] is the central coordinator that:
//! - Consumes push events in arrival order, one fully handled before the
//!   next (including every store mutation and rule evaluation it causes)
//! - Owns the single-writer [`ConversationStore`] behind one mutex
//! - Feeds genuinely-new inbound messages to the rule engine and applies
//!   the store commands its actions request
//! - Tracks remote presence and ticks view durations
//!
//! The cloneable [`InboxHandle`] is the operator-side surface: selection,
//! sending, pagination, typing, and the assignment prompt. Both share
//! state, but only the loop and the send pipeline mutate the store.

pub mod context;
pub mod outbound;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use switchboard_bus::EventSubscriber;
use switchboard_config::model::SwitchboardConfig;
use switchboard_core::events::Notice;
use switchboard_core::traits::{
    ChannelConnector, ContactApi, MessageHistoryApi, NotificationSink, PresenceEgress,
    RuleSource, TagApi,
};
use switchboard_core::types::{
    AssigneeUpdate, ContactSnapshot, ConversationPatch, Message, MessageDraft,
};
use switchboard_core::{AgentId, BusEvent, ContactId, MessageId, SwitchboardError, TransportStatus};
use switchboard_presence::{AssignmentPrompter, LocalPresence, PresenceEntry, PresenceTracker};
use switchboard_rules::{RuleEngine, StoreCommand};
use switchboard_store::{ConversationStore, OlderLoadOutcome};

use crate::context::build_eval_context;
use crate::outbound::SendPipeline;

/// The external collaborators the engine is wired against.
///
/// In production every field is the same `switchboard-rest` client
/// instance; tests substitute mocks per concern.
#[derive(Clone)]
pub struct Collaborators {
    pub history: Arc<dyn MessageHistoryApi>,
    pub contacts: Arc<dyn ContactApi>,
    pub tags: Arc<dyn TagApi>,
    pub connector: Arc<dyn ChannelConnector>,
    pub rules: Arc<dyn RuleSource>,
    pub presence: Arc<dyn PresenceEgress>,
    pub notifications: Arc<dyn NotificationSink>,
}

#[derive(Clone)]
struct Shared {
    store: Arc<Mutex<ConversationStore>>,
    engine: Arc<Mutex<RuleEngine>>,
    pipeline: Arc<SendPipeline>,
    prompter: Arc<Mutex<AssignmentPrompter>>,
    local_presence: Arc<Mutex<LocalPresence>>,
    history: Arc<dyn MessageHistoryApi>,
    rules_source: Arc<dyn RuleSource>,
    notifications: Arc<dyn NotificationSink>,
    page_size: usize,
}

/// Bridges the bus subscription into the loop's event channel.
///
/// Events are forwarded without blocking; if the loop has fallen so far
/// behind that the channel is full, the event is dropped: consumers are
/// designed so a missed event degrades gracefully rather than corrupting
/// state.
pub struct LoopSubscriber {
    tx: mpsc::Sender<BusEvent>,
    notifications: Arc<dyn NotificationSink>,
}

impl EventSubscriber for LoopSubscriber {
    fn on_event(&self, event: BusEvent) {
        if let Err(e) = self.tx.try_send(event) {
            warn!(error = %e, "event loop backlogged, dropping event");
        }
    }

    fn on_transport(&self, status: TransportStatus) {
        self.notifications.notify(Notice::Transport(status));
    }
}

/// The single consumer of bus events and sole mutator of engine state.
pub struct InboxLoop {
    events_tx: mpsc::Sender<BusEvent>,
    events_rx: mpsc::Receiver<BusEvent>,
    shared: Shared,
    tracker: PresenceTracker,
    tick_interval: Duration,
    default_agent: Option<AgentId>,
}

impl InboxLoop {
    /// Builds the loop and its operator handle from configuration and
    /// collaborators.
    pub fn new(config: &SwitchboardConfig, collaborators: Collaborators) -> (Self, InboxHandle) {
        let store = Arc::new(Mutex::new(ConversationStore::new()));
        let pipeline = Arc::new(SendPipeline::new(
            store.clone(),
            collaborators.connector.clone(),
            collaborators.history.clone(),
            collaborators.notifications.clone(),
        ));
        let engine = Arc::new(Mutex::new(RuleEngine::new(
            collaborators.contacts.clone(),
            collaborators.tags.clone(),
            pipeline.clone(),
            collaborators.notifications.clone(),
        )));
        let local_presence = Arc::new(Mutex::new(LocalPresence::new(
            collaborators.presence.clone(),
            Duration::from_millis(config.presence.typing_idle_ms),
        )));
        let prompter = Arc::new(Mutex::new(AssignmentPrompter::new(
            config.assignment.prompt_every_n,
        )));

        let shared = Shared {
            store,
            engine,
            pipeline,
            prompter,
            local_presence,
            history: collaborators.history.clone(),
            rules_source: collaborators.rules.clone(),
            notifications: collaborators.notifications.clone(),
            page_size: config.api.page_size,
        };

        let (events_tx, events_rx) = mpsc::channel(512);
        let tracker = PresenceTracker::new(Duration::from_secs(config.presence.viewer_ttl_secs));

        let inbox_loop = Self {
            events_tx,
            events_rx,
            shared: shared.clone(),
            tracker,
            tick_interval: Duration::from_secs(config.presence.tick_secs.max(1)),
            default_agent: config
                .console
                .default_agent_id
                .clone()
                .map(AgentId),
        };
        (inbox_loop, InboxHandle { shared })
    }

    /// A subscriber suitable for [`switchboard_bus::EventBusClient::subscribe`].
    pub fn subscriber(&self) -> Arc<LoopSubscriber> {
        Arc::new(LoopSubscriber {
            tx: self.events_tx.clone(),
            notifications: self.shared.notifications.clone(),
        })
    }

    /// Runs until cancelled: consumes events strictly in arrival order and
    /// ticks presence durations.
    pub async fn run(&mut self, cancel: CancellationToken) {
        info!("inbox loop running");
        let mut tick = tokio::time::interval(self.tick_interval);
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                event = self.events_rx.recv() => {
                    match event {
                        Some(event) => self.handle_event(event).await,
                        None => {
                            debug!("event channel closed, stopping loop");
                            break;
                        }
                    }
                }
                _ = tick.tick() => {
                    self.tracker.tick(Utc::now());
                }
                _ = cancel.cancelled() => {
                    info!("shutdown requested, stopping inbox loop");
                    break;
                }
            }
        }
    }

    /// Applies one event completely: store mutation, presence, and any
    /// rule evaluation it triggers.
    pub async fn handle_event(&mut self, event: BusEvent) {
        match event {
            BusEvent::NewMessage {
                contact_id,
                message,
                contact,
            } => {
                self.handle_new_message(contact_id, message, contact).await;
            }
            BusEvent::ConversationUpdated { .. } => {
                let contact_id = event.contact_id().clone();
                let patch = event
                    .as_conversation_patch()
                    .expect("conversation_updated produces a patch");
                let mut store = self.shared.store.lock().await;
                store.apply_conversation_update(&contact_id, patch);
            }
            BusEvent::PresenceViewing { .. }
            | BusEvent::PresenceLeft { .. }
            | BusEvent::PresenceTyping { .. } => {
                self.tracker.apply_event(&event, Utc::now());
            }
        }
    }

    async fn handle_new_message(
        &mut self,
        contact_id: ContactId,
        message: Message,
        contact: Option<ContactSnapshot>,
    ) {
        let automated = message.automated;
        let message_text = message.text.clone();

        let eval_ctx = {
            let mut store = self.shared.store.lock().await;
            let outcome = store.apply_inbound(&contact_id, message, contact.as_ref());
            debug!(contact_id = %contact_id, ?outcome, "message applied");

            // Bind the default agent to conversations that arrive without
            // one, so automation has a rule set to evaluate.
            if let Some(ref default_agent) = self.default_agent
                && store
                    .conversation(&contact_id)
                    .is_some_and(|c| c.agent_id.is_none())
            {
                store.set_active_agent(&contact_id, Some(default_agent.clone()));
            }

            if !outcome.is_new_inbound() || automated {
                None
            } else {
                store.conversation(&contact_id).and_then(|conversation| {
                    conversation.agent_id.clone().map(|agent_id| {
                        build_eval_context(conversation, agent_id, &message_text, Utc::now())
                    })
                })
            }
        };

        let Some(ctx) = eval_ctx else {
            return;
        };

        let commands = self.shared.engine.lock().await.handle_inbound(&ctx).await;
        if commands.is_empty() {
            return;
        }

        let mut store = self.shared.store.lock().await;
        for command in commands {
            apply_store_command(&mut store, &contact_id, command);
        }
    }

    /// Remote presence entries for a conversation.
    pub fn viewers(&self, contact_id: &ContactId) -> Vec<PresenceEntry> {
        self.tracker.viewers(contact_id).to_vec()
    }
}

fn apply_store_command(store: &mut ConversationStore, contact_id: &ContactId, command: StoreCommand) {
    match command {
        StoreCommand::SetBotSilenced(silenced) => store.set_bot_silenced(contact_id, silenced),
        StoreCommand::SetActiveAgent(agent_id) => {
            store.set_active_agent(contact_id, Some(agent_id))
        }
        StoreCommand::SetAssignee(operator_id) => store.apply_conversation_update(
            contact_id,
            ConversationPatch {
                assignee: Some(AssigneeUpdate {
                    operator_id,
                    operator_name: None,
                }),
                ..Default::default()
            },
        ),
        StoreCommand::SetStatus(status) => store.apply_conversation_update(
            contact_id,
            ConversationPatch {
                status: Some(status),
                ..Default::default()
            },
        ),
        StoreCommand::AttachTag(tag) => {
            store.attach_tag(contact_id, tag);
        }
    }
}

/// Operator-side surface over the shared engine state.
#[derive(Clone)]
pub struct InboxHandle {
    shared: Shared,
}

impl InboxHandle {
    /// Selects a conversation (or clears selection), zeroing its unread
    /// count and announcing presence.
    pub async fn select_contact(&self, contact_id: Option<ContactId>) {
        let previous = {
            let mut store = self.shared.store.lock().await;
            let previous = store.active_contact().cloned();
            store.select_conversation(contact_id.clone());
            previous
        };

        let mut presence = self.shared.local_presence.lock().await;
        if let Some(ref previous) = previous
            && previous.as_str() != contact_id.as_ref().map(ContactId::as_str).unwrap_or("")
        {
            presence.stop_viewing(previous).await;
        }
        if let Some(ref contact_id) = contact_id {
            presence.start_viewing(contact_id).await;
        }
    }

    /// Sends an operator reply through the optimistic pipeline and runs
    /// the assignment-prompt heuristic.
    pub async fn send_reply(
        &self,
        contact_id: &ContactId,
        text: &str,
    ) -> Result<MessageId, SwitchboardError> {
        let temp_id = self
            .shared
            .pipeline
            .send(contact_id, MessageDraft::reply(text))
            .await?;

        let (assigned, agent_id) = {
            let store = self.shared.store.lock().await;
            let conversation = store.conversation(contact_id);
            (
                conversation.is_some_and(|c| c.assignee_id.is_some()),
                conversation.and_then(|c| c.agent_id.clone()),
            )
        };
        let should_prompt = self
            .shared
            .prompter
            .lock()
            .await
            .note_reply(contact_id, assigned);
        if should_prompt {
            self.shared.notifications.notify(Notice::AssignmentPrompt {
                contact_id: contact_id.clone(),
                agent_id,
            });
        }

        Ok(temp_id)
    }

    /// Records that the operator dismissed the assignment prompt for this
    /// contact; durable for the session.
    pub async fn dismiss_assignment_prompt(&self, contact_id: &ContactId) {
        self.shared.prompter.lock().await.dismiss(contact_id);
    }

    /// Forwards a keystroke to presence (typing state + idle expiry).
    pub async fn keystroke(&self, contact_id: &ContactId, draft: &str) {
        self.shared
            .local_presence
            .lock()
            .await
            .keystroke(contact_id, draft)
            .await;
    }

    /// Explicitly ends the typing state (draft sent or cleared).
    pub async fn stop_typing(&self, contact_id: &ContactId) {
        self.shared
            .local_presence
            .lock()
            .await
            .stop_typing(contact_id)
            .await;
    }

    /// Replaces a conversation's history with a fresh first page.
    pub async fn load_initial(&self, contact_id: &ContactId) -> Result<(), SwitchboardError> {
        let page = self
            .shared
            .history
            .fetch_messages(contact_id, self.shared.page_size, None)
            .await?;
        self.shared
            .store
            .lock()
            .await
            .load_initial(contact_id, page);
        Ok(())
    }

    /// Loads one older page. The result is discarded (with
    /// [`OlderLoadOutcome::Stale`]) if the operator navigated away or
    /// reloaded while the fetch was in flight.
    pub async fn load_older(
        &self,
        contact_id: &ContactId,
    ) -> Result<OlderLoadOutcome, SwitchboardError> {
        let token = self.shared.store.lock().await.begin_older_load(contact_id)?;
        let page = self
            .shared
            .history
            .fetch_messages(contact_id, self.shared.page_size, token.before)
            .await?;
        Ok(self.shared.store.lock().await.apply_older_page(&token, page))
    }

    /// Fetches and installs an agent's rules from the management API.
    pub async fn refresh_agent_rules(
        &self,
        agent_id: &AgentId,
    ) -> Result<usize, SwitchboardError> {
        let engine = self.shared.engine.lock().await;
        engine
            .refresh_from_source(self.shared.rules_source.as_ref(), agent_id)
            .await
    }

    /// Re-enables automation for a conversation silenced by
    /// `stop_responding` or a human transfer.
    pub async fn reset_bot_silence(&self, contact_id: &ContactId) {
        self.shared
            .store
            .lock()
            .await
            .set_bot_silenced(contact_id, false);
    }

    /// Zeroes the unread count without changing selection.
    pub async fn mark_all_read(&self, contact_id: &ContactId) {
        self.shared.store.lock().await.mark_all_read(contact_id);
    }

    // --- Read surface for the UI layer ---

    pub async fn recency_order(&self) -> Vec<ContactId> {
        self.shared.store.lock().await.recency_order()
    }

    pub async fn unread_count(&self, contact_id: &ContactId) -> u32 {
        self.shared
            .store
            .lock()
            .await
            .conversation(contact_id)
            .map(|c| c.unread_count)
            .unwrap_or(0)
    }

    pub async fn messages(&self, contact_id: &ContactId) -> Vec<Message> {
        self.shared
            .store
            .lock()
            .await
            .conversation(contact_id)
            .map(|c| c.messages().to_vec())
            .unwrap_or_default()
    }

    /// Runs a closure against the store for richer reads without cloning.
    pub async fn with_store<R>(&self, f: impl FnOnce(&ConversationStore) -> R) -> R {
        let store = self.shared.store.lock().await;
        f(&store)
    }
}
