// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read-only access to the rule management API.

use async_trait::async_trait;

use crate::error::SwitchboardError;
use crate::types::{AgentId, RuleRecord};

/// Fetches automation rules for an agent.
///
/// The engine only reads rules; creation and editing happen through the
/// surrounding management screens, out of scope here.
#[async_trait]
pub trait RuleSource: Send + Sync {
    /// Returns all rule records for the agent, active or not. Filtering
    /// and compilation happen in the rule engine.
    async fn fetch_rules(&self, agent_id: &AgentId) -> Result<Vec<RuleRecord>, SwitchboardError>;
}
