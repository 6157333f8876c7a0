// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rule compilation: loose JSON records into typed conditions and actions.
//!
//! The management API stores condition and action payloads as free-form
//! JSON blobs. Compilation validates them structurally ONCE at load time;
//! evaluation then works on typed variants and can never fail. A rule with
//! a malformed payload compiles to an inert rule that never matches. It
//! is skipped with a warning, never an error, and never blocks
//! lower-priority rules.

use chrono::{DateTime, NaiveTime, Utc};
use serde::Deserialize;
use tracing::warn;

use switchboard_core::types::RuleRecord;
use switchboard_core::{AgentId, OperatorId, RuleId, TagRef};

/// A structurally-validated rule condition.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleCondition {
    /// Case-insensitive substring match of any keyword against the
    /// triggering message text.
    KeywordMatch { keywords: Vec<String> },
    /// Message-count threshold with fire-once semantics.
    MessageCount {
        threshold: u32,
        /// Whether operator-authored messages count toward the threshold.
        /// Automated replies never count.
        count_operator_messages: bool,
    },
    /// No agent-authored reply for the given number of minutes, and no
    /// operator reply meanwhile.
    NoAiResponse { minutes: i64 },
    /// Current local time falls outside `[start, end)`. Window wraps are
    /// not supported; `start < end` is enforced at compile time.
    HoursOutside { start: NaiveTime, end: NaiveTime },
    /// True exactly once, on the first message of a new conversation for
    /// the rule's agent.
    Always,
}

/// A structurally-validated rule action.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleAction {
    /// Hand the conversation to a specific operator, or to the pool when
    /// no operator is named. Either way the conversation leaves pure-bot
    /// handling.
    TransferHuman { operator_id: Option<OperatorId> },
    /// Rebind the conversation to a different agent; subsequent
    /// evaluations use that agent's rule set.
    AssignAgent { agent_id: AgentId },
    /// Silence automation for the conversation until manually reset.
    StopResponding,
    /// Enqueue an automated outbound reply. The reply itself never
    /// re-enters evaluation.
    SendMessage { text: String },
    /// Idempotent tag attach.
    AddTag { tag: TagRef },
}

/// A compiled automation rule.
///
/// `condition` or `action` is `None` when the record's payload failed
/// structural validation; such a rule is inert.
#[derive(Debug, Clone)]
pub struct AutomationRule {
    pub id: RuleId,
    pub agent_id: AgentId,
    pub priority: i32,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub condition: Option<RuleCondition>,
    pub action: Option<RuleAction>,
}

impl AutomationRule {
    /// Compiles a management-API record, validating payload shapes.
    pub fn compile(record: &RuleRecord) -> Self {
        let condition = compile_condition(record);
        let action = compile_action(record);
        if condition.is_none() || action.is_none() {
            warn!(
                rule_id = %record.id,
                condition_type = record.condition_type.as_str(),
                action_type = record.action_type.as_str(),
                "rule payload failed validation; rule is inert"
            );
        }
        Self {
            id: record.id.clone(),
            agent_id: record.agent_id.clone(),
            priority: record.priority,
            active: record.active,
            created_at: record.created_at,
            condition,
            action,
        }
    }

    /// Whether this rule can participate in evaluation at all.
    pub fn is_evaluable(&self) -> bool {
        self.active && self.condition.is_some() && self.action.is_some()
    }
}

#[derive(Deserialize)]
struct KeywordPayload {
    keywords: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessageCountPayload {
    count: u32,
    #[serde(default)]
    count_operator_messages: bool,
}

#[derive(Deserialize)]
struct NoAiResponsePayload {
    minutes: i64,
}

#[derive(Deserialize)]
struct HoursOutsidePayload {
    start: String,
    end: String,
}

fn compile_condition(record: &RuleRecord) -> Option<RuleCondition> {
    match record.condition_type.as_str() {
        "keyword_match" => {
            let payload: KeywordPayload =
                serde_json::from_value(record.condition.clone()).ok()?;
            let keywords: Vec<String> = payload
                .keywords
                .into_iter()
                .map(|k| k.trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect();
            if keywords.is_empty() {
                return None;
            }
            Some(RuleCondition::KeywordMatch { keywords })
        }
        "message_count" => {
            let payload: MessageCountPayload =
                serde_json::from_value(record.condition.clone()).ok()?;
            if payload.count == 0 {
                return None;
            }
            Some(RuleCondition::MessageCount {
                threshold: payload.count,
                count_operator_messages: payload.count_operator_messages,
            })
        }
        "no_ai_response" => {
            let payload: NoAiResponsePayload =
                serde_json::from_value(record.condition.clone()).ok()?;
            if payload.minutes <= 0 {
                return None;
            }
            Some(RuleCondition::NoAiResponse {
                minutes: payload.minutes,
            })
        }
        "hours_outside" => {
            let payload: HoursOutsidePayload =
                serde_json::from_value(record.condition.clone()).ok()?;
            let start = parse_clock(&payload.start)?;
            let end = parse_clock(&payload.end)?;
            if start >= end {
                return None;
            }
            Some(RuleCondition::HoursOutside { start, end })
        }
        "always" => Some(RuleCondition::Always),
        _ => None,
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransferHumanPayload {
    #[serde(default)]
    operator_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssignAgentPayload {
    agent_id: String,
}

#[derive(Deserialize)]
struct SendMessagePayload {
    text: String,
}

#[derive(Deserialize)]
struct AddTagPayload {
    tag: String,
}

fn compile_action(record: &RuleRecord) -> Option<RuleAction> {
    match record.action_type.as_str() {
        "transfer_human" => {
            // An absent payload is a valid pool transfer.
            let payload: TransferHumanPayload = if record.action.is_null() {
                TransferHumanPayload { operator_id: None }
            } else {
                serde_json::from_value(record.action.clone()).ok()?
            };
            Some(RuleAction::TransferHuman {
                operator_id: payload.operator_id.map(OperatorId),
            })
        }
        "assign_agent" => {
            let payload: AssignAgentPayload =
                serde_json::from_value(record.action.clone()).ok()?;
            if payload.agent_id.trim().is_empty() {
                return None;
            }
            Some(RuleAction::AssignAgent {
                agent_id: AgentId(payload.agent_id),
            })
        }
        "stop_responding" => Some(RuleAction::StopResponding),
        "send_message" => {
            let payload: SendMessagePayload =
                serde_json::from_value(record.action.clone()).ok()?;
            if payload.text.trim().is_empty() {
                return None;
            }
            Some(RuleAction::SendMessage { text: payload.text })
        }
        "add_tag" => {
            let payload: AddTagPayload = serde_json::from_value(record.action.clone()).ok()?;
            if payload.tag.trim().is_empty() {
                return None;
            }
            Some(RuleAction::AddTag {
                tag: TagRef(payload.tag),
            })
        }
        _ => None,
    }
}

fn parse_clock(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw.trim(), "%H:%M:%S"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn record(
        condition_type: &str,
        condition: serde_json::Value,
        action_type: &str,
        action: serde_json::Value,
    ) -> RuleRecord {
        RuleRecord {
            id: RuleId("r1".into()),
            agent_id: AgentId("a1".into()),
            priority: 10,
            active: true,
            condition_type: condition_type.into(),
            condition,
            action_type: action_type.into(),
            action,
            created_at: Utc.timestamp_opt(1_760_000_000, 0).unwrap(),
        }
    }

    #[test]
    fn keyword_condition_lowercases_and_trims() {
        let rule = AutomationRule::compile(&record(
            "keyword_match",
            json!({"keywords": [" Humano ", "ATENDENTE"]}),
            "transfer_human",
            serde_json::Value::Null,
        ));
        assert_eq!(
            rule.condition,
            Some(RuleCondition::KeywordMatch {
                keywords: vec!["humano".into(), "atendente".into()]
            })
        );
        assert!(rule.is_evaluable());
    }

    #[test]
    fn empty_keyword_list_is_inert() {
        let rule = AutomationRule::compile(&record(
            "keyword_match",
            json!({"keywords": ["  "]}),
            "transfer_human",
            serde_json::Value::Null,
        ));
        assert!(rule.condition.is_none());
        assert!(!rule.is_evaluable());
    }

    #[test]
    fn malformed_condition_payload_never_matches() {
        let rule = AutomationRule::compile(&record(
            "message_count",
            json!({"count": "five"}),
            "stop_responding",
            serde_json::Value::Null,
        ));
        assert!(rule.condition.is_none());
    }

    #[test]
    fn message_count_defaults_operator_exclusion() {
        let rule = AutomationRule::compile(&record(
            "message_count",
            json!({"count": 5}),
            "stop_responding",
            serde_json::Value::Null,
        ));
        assert_eq!(
            rule.condition,
            Some(RuleCondition::MessageCount {
                threshold: 5,
                count_operator_messages: false
            })
        );
    }

    #[test]
    fn hours_outside_rejects_wrapped_window() {
        let rule = AutomationRule::compile(&record(
            "hours_outside",
            json!({"start": "22:00", "end": "06:00"}),
            "send_message",
            json!({"text": "fora do horário"}),
        ));
        assert!(rule.condition.is_none(), "window wrap is unsupported");
    }

    #[test]
    fn hours_outside_parses_hh_mm() {
        let rule = AutomationRule::compile(&record(
            "hours_outside",
            json!({"start": "09:00", "end": "18:00"}),
            "send_message",
            json!({"text": "volto já"}),
        ));
        let Some(RuleCondition::HoursOutside { start, end }) = rule.condition else {
            panic!("expected hours_outside");
        };
        assert_eq!(start, NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        assert_eq!(end, NaiveTime::from_hms_opt(18, 0, 0).unwrap());
    }

    #[test]
    fn transfer_human_without_payload_is_pool_transfer() {
        let rule = AutomationRule::compile(&record(
            "always",
            serde_json::Value::Null,
            "transfer_human",
            serde_json::Value::Null,
        ));
        assert_eq!(
            rule.action,
            Some(RuleAction::TransferHuman { operator_id: None })
        );
    }

    #[test]
    fn unknown_types_are_inert() {
        let rule = AutomationRule::compile(&record(
            "sentiment_negative",
            json!({}),
            "escalate",
            json!({}),
        ));
        assert!(rule.condition.is_none());
        assert!(rule.action.is_none());
    }

    #[test]
    fn empty_send_message_text_is_inert() {
        let rule = AutomationRule::compile(&record(
            "always",
            serde_json::Value::Null,
            "send_message",
            json!({"text": "   "}),
        ));
        assert!(rule.action.is_none());
    }

    #[test]
    fn inactive_rule_is_not_evaluable() {
        let mut raw = record(
            "always",
            serde_json::Value::Null,
            "stop_responding",
            serde_json::Value::Null,
        );
        raw.active = false;
        let rule = AutomationRule::compile(&raw);
        assert!(!rule.is_evaluable());
    }
}
