// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Builds the rule-evaluation context from conversation state.

use chrono::{DateTime, Local, Utc};

use switchboard_core::types::Direction;
use switchboard_core::AgentId;
use switchboard_rules::EvalContext;
use switchboard_store::Conversation;

/// Derives the evaluation context for an inbound message against the
/// conversation as it stands AFTER the message was applied.
pub fn build_eval_context(
    conversation: &Conversation,
    agent_id: AgentId,
    message_text: &str,
    now: DateTime<Utc>,
) -> EvalContext {
    let mut inbound_messages = 0u32;
    let mut operator_messages = 0u32;
    let mut last_agent_message_at: Option<DateTime<Utc>> = None;
    let mut last_operator_message_at: Option<DateTime<Utc>> = None;

    for message in conversation.messages() {
        match message.direction {
            Direction::Inbound => inbound_messages += 1,
            Direction::OutboundReply | Direction::OutboundNote => {
                if message.automated {
                    last_agent_message_at = Some(message.timestamp);
                } else {
                    operator_messages += 1;
                    last_operator_message_at = Some(message.timestamp);
                }
            }
        }
    }

    let operator_replied_since_agent = match (last_agent_message_at, last_operator_message_at) {
        (Some(agent_at), Some(operator_at)) => operator_at > agent_at,
        (None, Some(_)) => true,
        _ => false,
    };

    EvalContext {
        contact_id: conversation.contact_id().clone(),
        agent_id,
        message_text: message_text.to_string(),
        inbound_messages,
        operator_messages,
        last_agent_message_at,
        operator_replied_since_agent,
        bot_silenced: conversation.bot_silenced,
        now,
        local_time: Local::now().time(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use switchboard_core::types::{DeliveryStatus, Message};
    use switchboard_core::{ContactId, MessageId};

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_760_000_000 + secs, 0).unwrap()
    }

    fn message(id: &str, direction: Direction, automated: bool, secs: i64) -> Message {
        Message {
            id: MessageId(id.into()),
            direction,
            text: "x".into(),
            media: None,
            status: DeliveryStatus::Sent,
            timestamp: ts(secs),
            external_id: None,
            automated,
        }
    }

    #[test]
    fn counts_split_by_authorship() {
        let mut conversation = Conversation::new(ContactId("c".into()));
        conversation.insert_ordered(message("m1", Direction::Inbound, false, 1));
        conversation.insert_ordered(message("m2", Direction::OutboundReply, true, 2));
        conversation.insert_ordered(message("m3", Direction::OutboundReply, false, 3));
        conversation.insert_ordered(message("m4", Direction::Inbound, false, 4));

        let ctx = build_eval_context(&conversation, AgentId("a".into()), "oi", ts(5));
        assert_eq!(ctx.inbound_messages, 2);
        assert_eq!(ctx.operator_messages, 1);
        assert_eq!(ctx.last_agent_message_at, Some(ts(2)));
        assert!(ctx.operator_replied_since_agent);
    }

    #[test]
    fn no_operator_reply_since_agent() {
        let mut conversation = Conversation::new(ContactId("c".into()));
        conversation.insert_ordered(message("m1", Direction::OutboundReply, false, 1));
        conversation.insert_ordered(message("m2", Direction::OutboundReply, true, 2));
        conversation.insert_ordered(message("m3", Direction::Inbound, false, 3));

        let ctx = build_eval_context(&conversation, AgentId("a".into()), "oi", ts(5));
        assert!(!ctx.operator_replied_since_agent);
        assert_eq!(ctx.last_agent_message_at, Some(ts(2)));
    }
}
