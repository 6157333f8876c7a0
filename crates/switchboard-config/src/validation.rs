// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as URL schemes and non-zero timings. All failures are
//! collected; validation never fails fast on the first error.

use crate::diagnostic::ConfigError;
use crate::model::SwitchboardConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)`
/// with every collected validation error.
pub fn validate_config(config: &SwitchboardConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if !LOG_LEVELS.contains(&config.console.log_level.as_str()) {
        errors.push(validation_error(format!(
            "console.log_level `{}` is not one of {}",
            config.console.log_level,
            LOG_LEVELS.join(", ")
        )));
    }

    let api_url = config.api.base_url.trim();
    if api_url.is_empty() {
        errors.push(validation_error("api.base_url must not be empty".into()));
    } else if !api_url.starts_with("http://") && !api_url.starts_with("https://") {
        errors.push(validation_error(format!(
            "api.base_url `{api_url}` must start with http:// or https://"
        )));
    }

    if config.api.request_timeout_ms == 0 {
        errors.push(validation_error(
            "api.request_timeout_ms must be greater than zero".into(),
        ));
    }

    if config.api.page_size == 0 {
        errors.push(validation_error(
            "api.page_size must be greater than zero".into(),
        ));
    }

    let bus_url = config.bus.url.trim();
    if bus_url.is_empty() {
        errors.push(validation_error("bus.url must not be empty".into()));
    } else if !bus_url.starts_with("ws://") && !bus_url.starts_with("wss://") {
        errors.push(validation_error(format!(
            "bus.url `{bus_url}` must start with ws:// or wss://"
        )));
    }

    if config.bus.reconnect_base_ms == 0 {
        errors.push(validation_error(
            "bus.reconnect_base_ms must be greater than zero".into(),
        ));
    }

    if config.bus.reconnect_cap_ms < config.bus.reconnect_base_ms {
        errors.push(validation_error(format!(
            "bus.reconnect_cap_ms ({}) must be at least bus.reconnect_base_ms ({})",
            config.bus.reconnect_cap_ms, config.bus.reconnect_base_ms
        )));
    }

    if config.presence.typing_idle_ms == 0 {
        errors.push(validation_error(
            "presence.typing_idle_ms must be greater than zero".into(),
        ));
    }

    if config.presence.viewer_ttl_secs == 0 {
        errors.push(validation_error(
            "presence.viewer_ttl_secs must be greater than zero".into(),
        ));
    }

    if config.assignment.prompt_every_n == 0 {
        errors.push(validation_error(
            "assignment.prompt_every_n must be at least 1".into(),
        ));
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

fn validation_error(message: String) -> ConfigError {
    ConfigError::Validation { message }
}
