// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Switchboard engine.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Switchboard configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment
/// variable overrides. All sections are optional and default to sensible
/// values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SwitchboardConfig {
    /// Console identity and logging settings.
    #[serde(default)]
    pub console: ConsoleConfig,

    /// REST collaborator API settings.
    #[serde(default)]
    pub api: ApiConfig,

    /// Push event stream settings.
    #[serde(default)]
    pub bus: BusConfig,

    /// Presence tracking settings.
    #[serde(default)]
    pub presence: PresenceConfig,

    /// Assignment prompt heuristic settings.
    #[serde(default)]
    pub assignment: AssignmentConfig,
}

/// Console identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ConsoleConfig {
    /// Organization whose event stream this console consumes.
    #[serde(default)]
    pub org_id: Option<String>,

    /// Identity of the local operator, used for presence and assignment.
    #[serde(default)]
    pub operator_id: Option<String>,

    /// Agent bound to conversations that arrive without one; `None`
    /// disables automation for such conversations.
    #[serde(default)]
    pub default_agent_id: Option<String>,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            org_id: None,
            operator_id: None,
            default_agent_id: None,
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// REST collaborator API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ApiConfig {
    /// Base URL of the persistence/management API.
    #[serde(default = "default_api_base_url")]
    pub base_url: String,

    /// Bearer token for API calls. `None` sends no Authorization header.
    #[serde(default)]
    pub auth_token: Option<String>,

    /// Per-request timeout in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Messages per history page.
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_api_base_url(),
            auth_token: None,
            request_timeout_ms: default_request_timeout_ms(),
            page_size: default_page_size(),
        }
    }
}

fn default_api_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_page_size() -> usize {
    30
}

/// Push event stream configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BusConfig {
    /// Websocket URL of the push event stream.
    #[serde(default = "default_bus_url")]
    pub url: String,

    /// First reconnect delay in milliseconds; doubles per failed attempt.
    #[serde(default = "default_reconnect_base_ms")]
    pub reconnect_base_ms: u64,

    /// Reconnect delay ceiling in milliseconds.
    #[serde(default = "default_reconnect_cap_ms")]
    pub reconnect_cap_ms: u64,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            url: default_bus_url(),
            reconnect_base_ms: default_reconnect_base_ms(),
            reconnect_cap_ms: default_reconnect_cap_ms(),
        }
    }
}

fn default_bus_url() -> String {
    "ws://localhost:8081".to_string()
}

fn default_reconnect_base_ms() -> u64 {
    500
}

fn default_reconnect_cap_ms() -> u64 {
    30_000
}

/// Presence tracking configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PresenceConfig {
    /// Idle window after the last keystroke before typing auto-expires,
    /// in milliseconds.
    #[serde(default = "default_typing_idle_ms")]
    pub typing_idle_ms: u64,

    /// Interval of the local view-duration tick, in seconds.
    #[serde(default = "default_tick_secs")]
    pub tick_secs: u64,

    /// How long a remote presence record survives without refresh, in
    /// seconds.
    #[serde(default = "default_viewer_ttl_secs")]
    pub viewer_ttl_secs: u64,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            typing_idle_ms: default_typing_idle_ms(),
            tick_secs: default_tick_secs(),
            viewer_ttl_secs: default_viewer_ttl_secs(),
        }
    }
}

fn default_typing_idle_ms() -> u64 {
    2_000
}

fn default_tick_secs() -> u64 {
    1
}

fn default_viewer_ttl_secs() -> u64 {
    300
}

/// Assignment prompt configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AssignmentConfig {
    /// After the first prompt, prompt again every Nth operator reply.
    #[serde(default = "default_prompt_every_n")]
    pub prompt_every_n: u32,
}

impl Default for AssignmentConfig {
    fn default() -> Self {
        Self {
            prompt_every_n: default_prompt_every_n(),
        }
    }
}

fn default_prompt_every_n() -> u32 {
    10
}
