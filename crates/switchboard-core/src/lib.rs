// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Switchboard conversation engine.
//!
//! This crate provides the foundational error type, id newtypes, domain
//! types, push-stream event envelope, and collaborator traits used
//! throughout the Switchboard workspace. The event bus client, the
//! conversation store, the rule engine, and the presence tracker all
//! program against the traits defined here.

pub mod error;
pub mod events;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::SwitchboardError;
pub use events::{BusEvent, Notice, TransportStatus};
pub use types::{
    AdapterType, AgentId, ChannelId, ContactId, HealthStatus, MessageId, OperatorId, OrgId,
    RuleId, TagRef,
};

// Re-export all collaborator traits at crate root.
pub use traits::{
    ChannelConnector, ContactApi, MessageHistoryApi, NotificationSink, PluginAdapter,
    PresenceEgress, RuleSource, TagApi,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_variants_construct() {
        let _config = SwitchboardError::Config("bad toml".into());
        let _transport = SwitchboardError::Transport {
            message: "socket dropped".into(),
            source: None,
        };
        let _api = SwitchboardError::Api {
            message: "500 from persistence".into(),
            status: Some(500),
            source: Some(Box::new(std::io::Error::other("boom"))),
        };
        let _store = SwitchboardError::Store("no conversation for contact".into());
        let _action = SwitchboardError::Action {
            rule_id: "r1".into(),
            message: "assign failed".into(),
        };
        let _timeout = SwitchboardError::Timeout {
            duration: std::time::Duration::from_secs(30),
        };
        let _internal = SwitchboardError::Internal("unreachable".into());
    }

    #[test]
    fn all_trait_modules_are_exported() {
        // Compile-time check that every collaborator trait is reachable
        // through the public API.
        fn _assert_plugin_adapter<T: PluginAdapter>() {}
        fn _assert_history<T: MessageHistoryApi>() {}
        fn _assert_contacts<T: ContactApi>() {}
        fn _assert_tags<T: TagApi>() {}
        fn _assert_connector<T: ChannelConnector>() {}
        fn _assert_rules<T: RuleSource>() {}
        fn _assert_presence<T: PresenceEgress>() {}
        fn _assert_notify<T: NotificationSink>() {}
    }

    #[test]
    fn adapter_type_display_round_trip() {
        use std::str::FromStr;
        for t in [AdapterType::Bus, AdapterType::Api, AdapterType::Connector] {
            let s = t.to_string();
            assert_eq!(AdapterType::from_str(&s).unwrap(), t);
        }
    }
}
