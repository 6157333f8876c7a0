// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rule evaluation and action dispatch.
//!
//! On each genuinely-new inbound message the engine evaluates the active
//! rule set of the agent bound to the conversation, in priority order with
//! creation-order tiebreak, and executes at most one winning action.
//! Firing bookkeeping is committed BEFORE dispatch and never rolled back
//! on collaborator failure, preserving at-most-once firing intent.
//!
//! The engine never mutates the Conversation State Store directly: local
//! state changes are returned as [`StoreCommand`]s for the single writer
//! to apply, while external side effects go through the collaborator
//! traits (assignment API, tag API, messaging path).

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveTime, Utc};
use tracing::{debug, info, warn};

use switchboard_core::events::Notice;
use switchboard_core::traits::{ContactApi, NotificationSink, RuleSource, TagApi};
use switchboard_core::types::ConversationStatus;
use switchboard_core::{AgentId, ContactId, OperatorId, SwitchboardError, TagRef};

use crate::rule::{AutomationRule, RuleAction, RuleCondition};

/// Conversation context a rule condition is evaluated against.
///
/// Built by the runtime from store state; the engine itself holds no
/// reference into the store.
#[derive(Debug, Clone)]
pub struct EvalContext {
    pub contact_id: ContactId,
    /// The agent currently bound to the conversation's channel.
    pub agent_id: AgentId,
    /// Text of the triggering inbound message.
    pub message_text: String,
    /// Contact-authored messages in the conversation so far.
    pub inbound_messages: u32,
    /// Operator-authored (non-automated) messages so far.
    pub operator_messages: u32,
    /// Timestamp of the last agent-authored (automated) message, if any.
    pub last_agent_message_at: Option<DateTime<Utc>>,
    /// Whether an operator replied after the last automated message.
    pub operator_replied_since_agent: bool,
    /// Set by a previous `stop_responding`; skips evaluation entirely.
    pub bot_silenced: bool,
    /// Wall clock for elapsed-time conditions.
    pub now: DateTime<Utc>,
    /// Local wall-clock time for the business-hours window.
    pub local_time: NaiveTime,
}

/// Per-(agent, contact) firing bookkeeping.
#[derive(Debug, Clone, Default)]
pub struct FireState {
    /// Inbound messages this pair has evaluated; 0 means the next message
    /// is the first one (arms the `always` condition).
    evaluations: u32,
    /// Counted-message total at the last `message_count` firing.
    last_fired_count: Option<u32>,
}

/// A store mutation requested by a fired action, applied by the single
/// writer that owns the Conversation State Store.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCommand {
    SetBotSilenced(bool),
    SetActiveAgent(AgentId),
    SetAssignee(Option<OperatorId>),
    SetStatus(ConversationStatus),
    AttachTag(TagRef),
}

/// Dispatches automated replies through the outbound send path.
///
/// Implemented by the runtime so that rule replies share the optimistic
/// append/confirm lifecycle with operator sends; replies sent here are
/// marked automated and never re-enter evaluation.
#[async_trait]
pub trait AutoResponder: Send + Sync {
    async fn send_automated_reply(
        &self,
        contact_id: &ContactId,
        text: &str,
    ) -> Result<(), SwitchboardError>;
}

/// The automation rule engine.
pub struct RuleEngine {
    rules: ArcSwap<HashMap<AgentId, Vec<AutomationRule>>>,
    fired: HashMap<(AgentId, ContactId), FireState>,
    contacts: Arc<dyn ContactApi>,
    tags: Arc<dyn TagApi>,
    responder: Arc<dyn AutoResponder>,
    notifications: Arc<dyn NotificationSink>,
}

impl RuleEngine {
    pub fn new(
        contacts: Arc<dyn ContactApi>,
        tags: Arc<dyn TagApi>,
        responder: Arc<dyn AutoResponder>,
        notifications: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            rules: ArcSwap::from_pointee(HashMap::new()),
            fired: HashMap::new(),
            contacts,
            tags,
            responder,
            notifications,
        }
    }

    /// Replaces the installed rule set for one agent.
    pub fn install_rules(&self, agent_id: AgentId, rules: Vec<AutomationRule>) {
        let mut map = HashMap::clone(&self.rules.load());
        map.insert(agent_id, rules);
        self.rules.store(Arc::new(map));
    }

    /// Fetches, compiles, and installs the agent's rules from the
    /// management API. Returns how many evaluable rules were installed.
    pub async fn refresh_from_source(
        &self,
        source: &dyn RuleSource,
        agent_id: &AgentId,
    ) -> Result<usize, SwitchboardError> {
        let records = source.fetch_rules(agent_id).await?;
        let rules: Vec<AutomationRule> =
            records.iter().map(AutomationRule::compile).collect();
        let evaluable = rules.iter().filter(|r| r.is_evaluable()).count();
        info!(
            agent_id = %agent_id,
            total = rules.len(),
            evaluable,
            "rules refreshed"
        );
        self.install_rules(agent_id.clone(), rules);
        Ok(evaluable)
    }

    /// Evaluates the rule set against an inbound message and executes at
    /// most one winning action.
    ///
    /// Returns the store mutations the winner requested; the caller (the
    /// store's single writer) applies them. Collaborator failures are
    /// surfaced through the notification sink and never propagate.
    pub async fn handle_inbound(&mut self, ctx: &EvalContext) -> Vec<StoreCommand> {
        if ctx.bot_silenced {
            debug!(contact_id = %ctx.contact_id, "conversation silenced, skipping rules");
            return Vec::new();
        }

        let key = (ctx.agent_id.clone(), ctx.contact_id.clone());
        let state = self.fired.get(&key).cloned().unwrap_or_default();

        let winner = {
            let rules = self.rules.load();
            rules
                .get(&ctx.agent_id)
                .and_then(|agent_rules| select_winner(agent_rules, ctx, &state))
                .cloned()
        };

        // Commit bookkeeping before dispatch: a failed action must not
        // re-fire on the next event.
        let entry = self.fired.entry(key).or_default();
        entry.evaluations += 1;
        if let Some(ref rule) = winner
            && let Some(RuleCondition::MessageCount {
                count_operator_messages,
                ..
            }) = rule.condition.as_ref()
        {
            entry.last_fired_count = Some(counted_messages(ctx, *count_operator_messages));
        }

        let Some(rule) = winner else {
            return Vec::new();
        };

        debug!(
            rule_id = %rule.id,
            contact_id = %ctx.contact_id,
            priority = rule.priority,
            "rule matched"
        );
        self.execute(&rule, ctx).await
    }

    async fn execute(&self, rule: &AutomationRule, ctx: &EvalContext) -> Vec<StoreCommand> {
        let action = rule
            .action
            .as_ref()
            .expect("winner is evaluable, action present");
        let mut commands = Vec::new();

        match action {
            RuleAction::TransferHuman { operator_id } => {
                // Transfer always takes the conversation out of pure-bot
                // handling, even if the remote assignment fails.
                commands.push(StoreCommand::SetBotSilenced(true));

                let status = if operator_id.is_some() {
                    ConversationStatus::Open
                } else {
                    ConversationStatus::Pending
                };
                let assigned = self
                    .contacts
                    .assign(&ctx.contact_id, operator_id.as_ref())
                    .await;
                let status_set = self.contacts.set_status(&ctx.contact_id, status).await;

                match (assigned, status_set) {
                    (Ok(()), Ok(())) => {
                        commands.push(StoreCommand::SetAssignee(operator_id.clone()));
                        commands.push(StoreCommand::SetStatus(status));
                        info!(
                            rule_id = %rule.id,
                            contact_id = %ctx.contact_id,
                            "conversation transferred to human handling"
                        );
                    }
                    (assigned, status_set) => {
                        let detail = [assigned.err(), status_set.err()]
                            .into_iter()
                            .flatten()
                            .map(|e| e.to_string())
                            .collect::<Vec<_>>()
                            .join("; ");
                        self.report_failure(rule, ctx, detail);
                    }
                }
            }
            RuleAction::AssignAgent { agent_id } => {
                // Local rebinding only; subsequent evaluations use the new
                // agent's rule set and fresh fire state.
                commands.push(StoreCommand::SetActiveAgent(agent_id.clone()));
                info!(
                    rule_id = %rule.id,
                    contact_id = %ctx.contact_id,
                    agent_id = %agent_id,
                    "conversation rebound to agent"
                );
            }
            RuleAction::StopResponding => {
                commands.push(StoreCommand::SetBotSilenced(true));
                info!(
                    rule_id = %rule.id,
                    contact_id = %ctx.contact_id,
                    "automation silenced for conversation"
                );
            }
            RuleAction::SendMessage { text } => {
                if let Err(e) = self
                    .responder
                    .send_automated_reply(&ctx.contact_id, text)
                    .await
                {
                    self.report_failure(rule, ctx, e.to_string());
                }
            }
            RuleAction::AddTag { tag } => {
                match self.tags.attach_tag(&ctx.contact_id, tag).await {
                    Ok(()) => commands.push(StoreCommand::AttachTag(tag.clone())),
                    Err(e) => self.report_failure(rule, ctx, e.to_string()),
                }
            }
        }

        commands
    }

    fn report_failure(&self, rule: &AutomationRule, ctx: &EvalContext, detail: String) {
        warn!(
            rule_id = %rule.id,
            contact_id = %ctx.contact_id,
            detail = detail.as_str(),
            "rule action failed; firing bookkeeping kept"
        );
        self.notifications.notify(Notice::RuleActionFailed {
            rule_id: rule.id.clone(),
            contact_id: ctx.contact_id.clone(),
            detail,
        });
    }
}

/// Picks the winning rule: active rules for the agent, priority
/// descending, creation order as stable tiebreak, first true condition.
fn select_winner<'a>(
    rules: &'a [AutomationRule],
    ctx: &EvalContext,
    state: &FireState,
) -> Option<&'a AutomationRule> {
    let mut candidates: Vec<&AutomationRule> =
        rules.iter().filter(|r| r.is_evaluable()).collect();
    candidates.sort_by(|a, b| {
        b.priority
            .cmp(&a.priority)
            .then(a.created_at.cmp(&b.created_at))
            .then(a.id.0.cmp(&b.id.0))
    });

    candidates.into_iter().find(|rule| {
        let condition = rule.condition.as_ref().expect("evaluable");
        condition_matches(condition, ctx, state)
    })
}

/// Evaluates one condition. Total: malformed payloads were already
/// compiled away, so evaluation can never fail; a condition that cannot
/// be decided is simply false.
fn condition_matches(condition: &RuleCondition, ctx: &EvalContext, state: &FireState) -> bool {
    match condition {
        RuleCondition::KeywordMatch { keywords } => {
            let text = ctx.message_text.to_lowercase();
            keywords.iter().any(|keyword| text.contains(keyword))
        }
        RuleCondition::MessageCount {
            threshold,
            count_operator_messages,
        } => {
            let counted = counted_messages(ctx, *count_operator_messages);
            counted >= *threshold && state.last_fired_count.unwrap_or(0) < *threshold
        }
        RuleCondition::NoAiResponse { minutes } => match ctx.last_agent_message_at {
            Some(last) => {
                ctx.now - last >= Duration::minutes(*minutes)
                    && !ctx.operator_replied_since_agent
            }
            None => false,
        },
        RuleCondition::HoursOutside { start, end } => {
            ctx.local_time < *start || ctx.local_time >= *end
        }
        RuleCondition::Always => state.evaluations == 0,
    }
}

/// Messages counted toward a `message_count` threshold. Automated replies
/// never count; operator replies count only when the rule opts in.
fn counted_messages(ctx: &EvalContext, count_operator_messages: bool) -> u32 {
    if count_operator_messages {
        ctx.inbound_messages + ctx.operator_messages
    } else {
        ctx.inbound_messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;
    use std::sync::Mutex;
    use switchboard_core::types::RuleRecord;
    use switchboard_core::RuleId;
    use switchboard_test_utils::{MockContactApi, MockTagApi, RecordingNotificationSink};

    #[derive(Default)]
    struct RecordingResponder {
        replies: Mutex<Vec<(ContactId, String)>>,
        failing: std::sync::atomic::AtomicBool,
    }

    #[async_trait]
    impl AutoResponder for RecordingResponder {
        async fn send_automated_reply(
            &self,
            contact_id: &ContactId,
            text: &str,
        ) -> Result<(), SwitchboardError> {
            if self.failing.load(std::sync::atomic::Ordering::SeqCst) {
                return Err(SwitchboardError::Transport {
                    message: "scripted".into(),
                    source: None,
                });
            }
            self.replies
                .lock()
                .unwrap()
                .push((contact_id.clone(), text.to_string()));
            Ok(())
        }
    }

    struct Fixture {
        engine: RuleEngine,
        contacts: Arc<MockContactApi>,
        tags: Arc<MockTagApi>,
        responder: Arc<RecordingResponder>,
        notifications: Arc<RecordingNotificationSink>,
    }

    fn fixture() -> Fixture {
        let contacts = Arc::new(MockContactApi::new());
        let tags = Arc::new(MockTagApi::new());
        let responder = Arc::new(RecordingResponder::default());
        let notifications = Arc::new(RecordingNotificationSink::new());
        let engine = RuleEngine::new(
            contacts.clone(),
            tags.clone(),
            responder.clone(),
            notifications.clone(),
        );
        Fixture {
            engine,
            contacts,
            tags,
            responder,
            notifications,
        }
    }

    fn record(
        id: &str,
        priority: i32,
        condition_type: &str,
        condition: serde_json::Value,
        action_type: &str,
        action: serde_json::Value,
        created_secs: i64,
    ) -> RuleRecord {
        RuleRecord {
            id: RuleId(id.into()),
            agent_id: AgentId("agent-1".into()),
            priority,
            active: true,
            condition_type: condition_type.into(),
            condition,
            action_type: action_type.into(),
            action,
            created_at: Utc.timestamp_opt(1_760_000_000 + created_secs, 0).unwrap(),
        }
    }

    fn install(engine: &RuleEngine, records: &[RuleRecord]) {
        let rules = records.iter().map(AutomationRule::compile).collect();
        engine.install_rules(AgentId("agent-1".into()), rules);
    }

    fn ctx(text: &str, inbound: u32) -> EvalContext {
        EvalContext {
            contact_id: ContactId("c-1".into()),
            agent_id: AgentId("agent-1".into()),
            message_text: text.into(),
            inbound_messages: inbound,
            operator_messages: 0,
            last_agent_message_at: None,
            operator_replied_since_agent: false,
            bot_silenced: false,
            now: Utc.timestamp_opt(1_760_100_000, 0).unwrap(),
            local_time: NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn keyword_rule_transfers_exactly_once() {
        let mut f = fixture();
        install(
            &f.engine,
            &[
                record(
                    "r-keyword",
                    10,
                    "keyword_match",
                    json!({"keywords": ["humano"]}),
                    "transfer_human",
                    serde_json::Value::Null,
                    0,
                ),
                record(
                    "r-tag",
                    5,
                    "always",
                    serde_json::Value::Null,
                    "add_tag",
                    json!({"tag": "novo"}),
                    1,
                ),
            ],
        );

        let commands = f
            .engine
            .handle_inbound(&ctx("quero falar com um humano", 1))
            .await;

        assert_eq!(f.contacts.assignment_count(), 1);
        assert_eq!(
            f.tags.attach_count(),
            0,
            "lower-priority rule must not also fire"
        );
        assert!(commands.contains(&StoreCommand::SetBotSilenced(true)));
        assert!(commands.contains(&StoreCommand::SetStatus(ConversationStatus::Pending)));
    }

    #[tokio::test]
    async fn higher_priority_wins_when_both_match() {
        let mut f = fixture();
        install(
            &f.engine,
            &[
                record(
                    "r-low",
                    1,
                    "keyword_match",
                    json!({"keywords": ["ajuda"]}),
                    "add_tag",
                    json!({"tag": "low"}),
                    0,
                ),
                record(
                    "r-high",
                    9,
                    "keyword_match",
                    json!({"keywords": ["ajuda"]}),
                    "add_tag",
                    json!({"tag": "high"}),
                    1,
                ),
            ],
        );

        f.engine.handle_inbound(&ctx("preciso de ajuda", 1)).await;

        let attaches = f.tags.attaches.lock().unwrap().clone();
        assert_eq!(attaches.len(), 1);
        assert_eq!(attaches[0].1.as_str(), "high");
    }

    #[tokio::test]
    async fn priority_tie_breaks_by_creation_order() {
        let mut f = fixture();
        install(
            &f.engine,
            &[
                record(
                    "r-newer",
                    5,
                    "always",
                    serde_json::Value::Null,
                    "add_tag",
                    json!({"tag": "newer"}),
                    100,
                ),
                record(
                    "r-older",
                    5,
                    "always",
                    serde_json::Value::Null,
                    "add_tag",
                    json!({"tag": "older"}),
                    1,
                ),
            ],
        );

        f.engine.handle_inbound(&ctx("oi", 1)).await;

        let attaches = f.tags.attaches.lock().unwrap().clone();
        assert_eq!(attaches[0].1.as_str(), "older");
    }

    #[tokio::test]
    async fn message_count_fires_once_at_threshold() {
        let mut f = fixture();
        install(
            &f.engine,
            &[record(
                "r-count",
                10,
                "message_count",
                json!({"count": 5}),
                "send_message",
                json!({"text": "posso ajudar?"}),
                0,
            )],
        );

        for n in 1..=8u32 {
            f.engine.handle_inbound(&ctx("mensagem", n)).await;
        }

        let replies = f.responder.replies.lock().unwrap();
        assert_eq!(replies.len(), 1, "must fire at 5 and never at 6, 7, 8");
    }

    #[tokio::test]
    async fn message_count_skipping_threshold_still_fires() {
        let mut f = fixture();
        install(
            &f.engine,
            &[record(
                "r-count",
                10,
                "message_count",
                json!({"count": 5}),
                "send_message",
                json!({"text": "posso ajudar?"}),
                0,
            )],
        );

        // Count jumps straight past the threshold (missed events).
        f.engine.handle_inbound(&ctx("mensagem", 6)).await;
        assert_eq!(f.responder.replies.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn operator_messages_count_only_when_opted_in() {
        let mut f = fixture();
        install(
            &f.engine,
            &[record(
                "r-count",
                10,
                "message_count",
                json!({"count": 4, "countOperatorMessages": true}),
                "add_tag",
                json!({"tag": "engaged"}),
                0,
            )],
        );

        let mut context = ctx("oi", 2);
        context.operator_messages = 2;
        f.engine.handle_inbound(&context).await;
        assert_eq!(f.tags.attach_count(), 1, "2 inbound + 2 operator crosses 4");
    }

    #[tokio::test]
    async fn always_fires_only_on_first_message() {
        let mut f = fixture();
        install(
            &f.engine,
            &[record(
                "r-greet",
                1,
                "always",
                serde_json::Value::Null,
                "send_message",
                json!({"text": "bem-vindo!"}),
                0,
            )],
        );

        f.engine.handle_inbound(&ctx("primeira", 1)).await;
        f.engine.handle_inbound(&ctx("segunda", 2)).await;

        assert_eq!(f.responder.replies.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn no_ai_response_requires_elapsed_and_no_operator() {
        let mut f = fixture();
        install(
            &f.engine,
            &[record(
                "r-idle",
                10,
                "no_ai_response",
                json!({"minutes": 30}),
                "send_message",
                json!({"text": "ainda está aí?"}),
                0,
            )],
        );

        let mut context = ctx("oi", 3);
        context.last_agent_message_at =
            Some(Utc.timestamp_opt(1_760_100_000 - 40 * 60, 0).unwrap());
        f.engine.handle_inbound(&context).await;
        assert_eq!(f.responder.replies.lock().unwrap().len(), 1);

        // Operator replied meanwhile: condition is false.
        let mut context = ctx("oi de novo", 4);
        context.contact_id = ContactId("c-2".into());
        context.last_agent_message_at =
            Some(Utc.timestamp_opt(1_760_100_000 - 40 * 60, 0).unwrap());
        context.operator_replied_since_agent = true;
        f.engine.handle_inbound(&context).await;
        assert_eq!(f.responder.replies.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn hours_outside_matches_off_hours() {
        let mut f = fixture();
        install(
            &f.engine,
            &[record(
                "r-hours",
                10,
                "hours_outside",
                json!({"start": "09:00", "end": "18:00"}),
                "send_message",
                json!({"text": "respondo no horário comercial"}),
                0,
            )],
        );

        let mut context = ctx("oi", 1);
        context.local_time = NaiveTime::from_hms_opt(22, 30, 0).unwrap();
        f.engine.handle_inbound(&context).await;
        assert_eq!(f.responder.replies.lock().unwrap().len(), 1);

        let mut context = ctx("oi", 2);
        context.contact_id = ContactId("c-2".into());
        context.local_time = NaiveTime::from_hms_opt(10, 0, 0).unwrap();
        f.engine.handle_inbound(&context).await;
        assert_eq!(f.responder.replies.lock().unwrap().len(), 1, "inside hours: no reply");
    }

    #[tokio::test]
    async fn silenced_conversation_skips_evaluation() {
        let mut f = fixture();
        install(
            &f.engine,
            &[record(
                "r-greet",
                1,
                "always",
                serde_json::Value::Null,
                "send_message",
                json!({"text": "oi"}),
                0,
            )],
        );

        let mut context = ctx("primeira", 1);
        context.bot_silenced = true;
        let commands = f.engine.handle_inbound(&context).await;
        assert!(commands.is_empty());
        assert_eq!(f.responder.replies.lock().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn malformed_rule_does_not_block_lower_priority() {
        let mut f = fixture();
        install(
            &f.engine,
            &[
                record(
                    "r-broken",
                    99,
                    "message_count",
                    json!({"count": "cinco"}),
                    "add_tag",
                    json!({"tag": "never"}),
                    0,
                ),
                record(
                    "r-ok",
                    1,
                    "always",
                    serde_json::Value::Null,
                    "add_tag",
                    json!({"tag": "greeted"}),
                    1,
                ),
            ],
        );

        f.engine.handle_inbound(&ctx("oi", 1)).await;

        let attaches = f.tags.attaches.lock().unwrap().clone();
        assert_eq!(attaches.len(), 1);
        assert_eq!(attaches[0].1.as_str(), "greeted");
    }

    #[tokio::test]
    async fn assign_agent_switches_rule_set_binding() {
        let mut f = fixture();
        install(
            &f.engine,
            &[record(
                "r-route",
                10,
                "keyword_match",
                json!({"keywords": ["financeiro"]}),
                "assign_agent",
                json!({"agentId": "agent-billing"}),
                0,
            )],
        );

        let commands = f
            .engine
            .handle_inbound(&ctx("quero falar com o financeiro", 1))
            .await;
        assert_eq!(
            commands,
            vec![StoreCommand::SetActiveAgent(AgentId("agent-billing".into()))]
        );
    }

    #[tokio::test]
    async fn failed_action_notifies_and_keeps_bookkeeping() {
        let mut f = fixture();
        install(
            &f.engine,
            &[record(
                "r-count",
                10,
                "message_count",
                json!({"count": 2}),
                "send_message",
                json!({"text": "oi"}),
                0,
            )],
        );
        f.responder
            .failing
            .store(true, std::sync::atomic::Ordering::SeqCst);

        f.engine.handle_inbound(&ctx("segunda", 2)).await;
        assert_eq!(f.notifications.notice_count(), 1);

        // Delivery failed, but the rule must not refire on the next event.
        f.responder
            .failing
            .store(false, std::sync::atomic::Ordering::SeqCst);
        f.engine.handle_inbound(&ctx("terceira", 3)).await;
        assert_eq!(f.responder.replies.lock().unwrap().len(), 0);
        assert_eq!(f.notifications.notice_count(), 1);
    }

    #[tokio::test]
    async fn transfer_failure_still_silences_locally() {
        let mut f = fixture();
        install(
            &f.engine,
            &[record(
                "r-keyword",
                10,
                "keyword_match",
                json!({"keywords": ["humano"]}),
                "transfer_human",
                json!({"operatorId": "op-1"}),
                0,
            )],
        );
        f.contacts.fail_from_now();

        let commands = f.engine.handle_inbound(&ctx("humano por favor", 1)).await;
        assert_eq!(commands, vec![StoreCommand::SetBotSilenced(true)]);
        assert_eq!(f.notifications.notice_count(), 1);
    }

    #[tokio::test]
    async fn refresh_from_source_installs_compiled_rules() {
        let mut f = fixture();
        let source = switchboard_test_utils::MockRuleSource::new();
        let agent = AgentId("agent-1".into());
        source.set_rules(
            &agent,
            vec![
                record(
                    "r-ok",
                    1,
                    "always",
                    serde_json::Value::Null,
                    "add_tag",
                    json!({"tag": "novo"}),
                    0,
                ),
                record("r-bad", 2, "nonsense", json!({}), "add_tag", json!({}), 1),
            ],
        );

        let evaluable = f
            .engine
            .refresh_from_source(&source, &agent)
            .await
            .unwrap();
        assert_eq!(evaluable, 1);

        f.engine.handle_inbound(&ctx("oi", 1)).await;
        assert_eq!(f.tags.attach_count(), 1);
    }
}
