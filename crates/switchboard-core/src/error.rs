// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Switchboard conversation engine.

use thiserror::Error;

/// The primary error type used across all Switchboard collaborator traits
/// and core operations.
///
/// Expected conditions (duplicate message ids, malformed event frames,
/// non-matching rule payloads, already-attached tags) are NOT errors; the
/// owning component neutralizes and logs them. Variants here cover real
/// collaborator failures and programmer-error-class violations only.
#[derive(Debug, Error)]
pub enum SwitchboardError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Push-stream transport errors (connect failure, dropped socket).
    #[error("transport error: {message}")]
    Transport {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// REST collaborator errors (persistence API, send API, rule management).
    #[error("api error: {message}")]
    Api {
        message: String,
        status: Option<u16>,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Store contract violations (an operation referenced a conversation
    /// that is mandatory but absent).
    #[error("store error: {0}")]
    Store(String),

    /// Rule action dispatch failed at a collaborator.
    #[error("rule {rule_id} action failed: {message}")]
    Action { rule_id: String, message: String },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}
