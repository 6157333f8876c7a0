// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Automation rule engine for the Switchboard conversation console.
//!
//! Holds the ordered per-agent rule sets (condition, action, priority) and
//! evaluates them against each genuinely-new inbound message, executing at
//! most one winning action per agent per event through the external
//! collaborators. Rules are compiled from loose JSON once at load; a
//! malformed payload yields an inert rule, never an evaluation failure.

pub mod engine;
pub mod rule;

pub use engine::{AutoResponder, EvalContext, RuleEngine, StoreCommand};
pub use rule::{AutomationRule, RuleAction, RuleCondition};
