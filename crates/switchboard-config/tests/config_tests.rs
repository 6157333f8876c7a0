// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Switchboard configuration system.

use switchboard_config::diagnostic::{suggest_key, ConfigError};
use switchboard_config::{load_and_validate_str, load_config_from_str};

/// Valid TOML with all known fields deserializes successfully.
#[test]
fn valid_toml_deserializes_into_config() {
    let toml = r#"
[console]
org_id = "org-7"
operator_id = "op-3"
log_level = "debug"

[api]
base_url = "https://api.example.com"
auth_token = "tok-123"
request_timeout_ms = 5000
page_size = 50

[bus]
url = "wss://events.example.com"
reconnect_base_ms = 250
reconnect_cap_ms = 15000

[presence]
typing_idle_ms = 1500
tick_secs = 2
viewer_ttl_secs = 120

[assignment]
prompt_every_n = 5
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.console.org_id.as_deref(), Some("org-7"));
    assert_eq!(config.console.operator_id.as_deref(), Some("op-3"));
    assert_eq!(config.console.log_level, "debug");
    assert_eq!(config.api.base_url, "https://api.example.com");
    assert_eq!(config.api.auth_token.as_deref(), Some("tok-123"));
    assert_eq!(config.api.request_timeout_ms, 5_000);
    assert_eq!(config.api.page_size, 50);
    assert_eq!(config.bus.url, "wss://events.example.com");
    assert_eq!(config.bus.reconnect_base_ms, 250);
    assert_eq!(config.bus.reconnect_cap_ms, 15_000);
    assert_eq!(config.presence.typing_idle_ms, 1_500);
    assert_eq!(config.presence.tick_secs, 2);
    assert_eq!(config.presence.viewer_ttl_secs, 120);
    assert_eq!(config.assignment.prompt_every_n, 5);
}

/// Empty input produces the compiled defaults end-to-end.
#[test]
fn empty_config_validates_with_defaults() {
    let config = load_and_validate_str("").expect("defaults must validate");
    assert_eq!(config.bus.reconnect_base_ms, 500);
    assert_eq!(config.bus.reconnect_cap_ms, 30_000);
}

/// A typoed key yields an UnknownKey diagnostic with a suggestion.
#[test]
fn typoed_key_gets_a_suggestion() {
    let toml = r#"
[api]
base_ulr = "https://api.example.com"
"#;
    let errors = load_and_validate_str(toml).unwrap_err();
    assert!(!errors.is_empty());
    let unknown = errors.iter().find_map(|e| match e {
        ConfigError::UnknownKey { key, suggestion, .. } => Some((key.clone(), suggestion.clone())),
        _ => None,
    });
    let (key, suggestion) = unknown.expect("expected an UnknownKey diagnostic");
    assert_eq!(key, "base_ulr");
    assert_eq!(suggestion.as_deref(), Some("base_url"));
}

/// A wrong-typed value yields an InvalidType diagnostic.
#[test]
fn wrong_type_is_reported() {
    let toml = r#"
[bus]
reconnect_base_ms = "fast"
"#;
    let errors = load_and_validate_str(toml).unwrap_err();
    assert!(errors
        .iter()
        .any(|e| matches!(e, ConfigError::InvalidType { .. } | ConfigError::Other(_))));
}

/// Semantic validation runs after deserialization and collects failures.
#[test]
fn semantic_validation_collects_all_failures() {
    let toml = r#"
[bus]
url = "http://wrong-scheme"

[assignment]
prompt_every_n = 0
"#;
    let errors = load_and_validate_str(toml).unwrap_err();
    assert_eq!(errors.len(), 2);
    assert!(errors
        .iter()
        .all(|e| matches!(e, ConfigError::Validation { .. })));
}

/// The suggestion helper is usable directly.
#[test]
fn suggest_key_matches_section_fields() {
    assert_eq!(
        suggest_key("typing_idl_ms", &["typing_idle_ms", "tick_secs"]),
        Some("typing_idle_ms".to_string())
    );
}

/// Loading from an explicit path works via the tempfile round trip.
#[test]
fn load_from_path_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("switchboard.toml");
    std::fs::write(&path, "[console]\norg_id = \"org-file\"\n").unwrap();

    let config = switchboard_config::load_config_from_path(&path).unwrap();
    assert_eq!(config.console.org_id.as_deref(), Some("org-file"));
}
