// SPDX-FileCopyrightText: 2026 Switchboard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Switchboard boundary collaborators.
//!
//! One [`RestApi`] instance serves every REST contract the engine depends
//! on: message history, contact assignment and status, tag attach, channel
//! send, rule reads, and presence egress. Authentication is a bearer token
//! applied as a default header.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::StatusCode;
use tracing::debug;

use switchboard_config::model::ApiConfig;
use switchboard_core::error::SwitchboardError;
use switchboard_core::traits::presence::PresenceUpdate;
use switchboard_core::traits::{
    ChannelConnector, ContactApi, MessageHistoryApi, PluginAdapter, PresenceEgress, RuleSource,
    TagApi,
};
use switchboard_core::types::{
    AdapterType, ContactId, ConversationStatus, HealthStatus, Message, MessageId, MessagePage,
    OperatorId, OutboundPayload, RuleRecord, TagRef,
};
use switchboard_core::{AgentId, ChannelId};

use crate::wire::{
    AssignRequest, AttachTagRequest, MessagesResponse, PersistMessageRequest,
    PersistMessageResponse, SendResponse,
};

/// REST client for the persistence, send, rule, and presence APIs.
#[derive(Debug, Clone)]
pub struct RestApi {
    client: reqwest::Client,
    base_url: String,
}

impl RestApi {
    /// Builds the client from configuration; fails only on a malformed
    /// auth token or an unbuildable HTTP client.
    pub fn new(config: &ApiConfig) -> Result<Self, SwitchboardError> {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", HeaderValue::from_static("application/json"));
        if let Some(ref token) = config.auth_token {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| SwitchboardError::Config(format!("invalid auth token: {e}")))?;
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| SwitchboardError::Api {
                message: format!("failed to build HTTP client: {e}"),
                status: None,
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn check_status(
        response: reqwest::Response,
        what: &str,
    ) -> Result<reqwest::Response, SwitchboardError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(SwitchboardError::Api {
            message: format!("{what} returned {status}: {body}"),
            status: Some(status.as_u16()),
            source: None,
        })
    }

    fn request_error(what: &str, e: reqwest::Error) -> SwitchboardError {
        SwitchboardError::Api {
            message: format!("{what} request failed: {e}"),
            status: None,
            source: Some(Box::new(e)),
        }
    }
}

#[async_trait]
impl PluginAdapter for RestApi {
    fn name(&self) -> &str {
        "rest-api"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Api
    }

    async fn health_check(&self) -> Result<HealthStatus, SwitchboardError> {
        // The client is stateless; per-call failures surface on use.
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), SwitchboardError> {
        Ok(())
    }
}

#[async_trait]
impl MessageHistoryApi for RestApi {
    async fn fetch_messages(
        &self,
        contact_id: &ContactId,
        limit: usize,
        before: Option<DateTime<Utc>>,
    ) -> Result<MessagePage, SwitchboardError> {
        let mut query: Vec<(&str, String)> = vec![
            ("contactId", contact_id.0.clone()),
            ("limit", limit.to_string()),
        ];
        if let Some(before) = before {
            query.push(("before", before.to_rfc3339_opts(SecondsFormat::Millis, true)));
        }

        let response = self
            .client
            .get(self.url("/messages"))
            .query(&query)
            .send()
            .await
            .map_err(|e| Self::request_error("fetch messages", e))?;
        let response = Self::check_status(response, "fetch messages").await?;

        let parsed: MessagesResponse =
            response.json().await.map_err(|e| SwitchboardError::Api {
                message: format!("failed to parse messages response: {e}"),
                status: None,
                source: Some(Box::new(e)),
            })?;
        let page = parsed.into_page();
        debug!(
            contact_id = %contact_id,
            count = page.messages.len(),
            has_more = page.has_more,
            "history page fetched"
        );
        Ok(page)
    }

    async fn persist_message(
        &self,
        contact_id: &ContactId,
        message: &Message,
    ) -> Result<MessageId, SwitchboardError> {
        let kind = message
            .media
            .as_ref()
            .map(|m| m.kind.to_string())
            .unwrap_or_else(|| "text".to_string());
        let body = PersistMessageRequest {
            contact_id: contact_id.as_str(),
            content: &message.text,
            kind: &kind,
            direction: message.direction,
        };

        let response = self
            .client
            .post(self.url("/messages"))
            .json(&body)
            .send()
            .await
            .map_err(|e| Self::request_error("persist message", e))?;
        let response = Self::check_status(response, "persist message").await?;

        let parsed: PersistMessageResponse =
            response.json().await.map_err(|e| SwitchboardError::Api {
                message: format!("failed to parse persist response: {e}"),
                status: None,
                source: Some(Box::new(e)),
            })?;
        Ok(MessageId(parsed.id))
    }
}

#[async_trait]
impl ContactApi for RestApi {
    async fn assign(
        &self,
        contact_id: &ContactId,
        operator_id: Option<&OperatorId>,
    ) -> Result<(), SwitchboardError> {
        let body = AssignRequest {
            operator_id: operator_id.map(OperatorId::as_str),
        };
        let response = self
            .client
            .patch(self.url(&format!("/contacts/{}/assign", contact_id)))
            .json(&body)
            .send()
            .await
            .map_err(|e| Self::request_error("assign", e))?;
        Self::check_status(response, "assign").await?;
        Ok(())
    }

    async fn set_status(
        &self,
        contact_id: &ContactId,
        status: ConversationStatus,
    ) -> Result<(), SwitchboardError> {
        let action = match status {
            ConversationStatus::Resolved => "resolve",
            // Pending and Open both reopen the conversation server-side.
            ConversationStatus::Pending | ConversationStatus::Open => "open",
        };
        let response = self
            .client
            .patch(self.url(&format!("/contacts/{}/{}", contact_id, action)))
            .send()
            .await
            .map_err(|e| Self::request_error("set status", e))?;
        Self::check_status(response, "set status").await?;
        Ok(())
    }
}

#[async_trait]
impl TagApi for RestApi {
    async fn attach_tag(
        &self,
        contact_id: &ContactId,
        tag: &TagRef,
    ) -> Result<(), SwitchboardError> {
        let body = AttachTagRequest {
            add_tag: tag.as_str(),
        };
        let response = self
            .client
            .patch(self.url(&format!("/contacts/{}", contact_id)))
            .json(&body)
            .send()
            .await
            .map_err(|e| Self::request_error("attach tag", e))?;

        // An already-attached tag is a success no-op.
        if response.status() == StatusCode::CONFLICT {
            debug!(contact_id = %contact_id, tag = %tag, "tag already attached");
            return Ok(());
        }
        Self::check_status(response, "attach tag").await?;
        Ok(())
    }
}

#[async_trait]
impl ChannelConnector for RestApi {
    async fn send(
        &self,
        channel_id: &ChannelId,
        payload: &OutboundPayload,
    ) -> Result<String, SwitchboardError> {
        let response = self
            .client
            .post(self.url(&format!("/channels/{}/send", channel_id)))
            .json(payload)
            .send()
            .await
            .map_err(|e| Self::request_error("channel send", e))?;
        let response = Self::check_status(response, "channel send").await?;

        let parsed: SendResponse = response.json().await.map_err(|e| SwitchboardError::Api {
            message: format!("failed to parse send response: {e}"),
            status: None,
            source: Some(Box::new(e)),
        })?;
        Ok(parsed.external_id)
    }
}

#[async_trait]
impl RuleSource for RestApi {
    async fn fetch_rules(
        &self,
        agent_id: &AgentId,
    ) -> Result<Vec<RuleRecord>, SwitchboardError> {
        let response = self
            .client
            .get(self.url("/rules"))
            .query(&[("agentId", agent_id.as_str())])
            .send()
            .await
            .map_err(|e| Self::request_error("fetch rules", e))?;
        let response = Self::check_status(response, "fetch rules").await?;

        response.json().await.map_err(|e| SwitchboardError::Api {
            message: format!("failed to parse rules response: {e}"),
            status: None,
            source: Some(Box::new(e)),
        })
    }
}

#[async_trait]
impl PresenceEgress for RestApi {
    async fn publish(&self, update: &PresenceUpdate) -> Result<(), SwitchboardError> {
        let (path, body) = match update {
            PresenceUpdate::Viewing { contact_id } => (
                "/presence/viewing",
                serde_json::json!({"contactId": contact_id}),
            ),
            PresenceUpdate::Left { contact_id } => (
                "/presence/left",
                serde_json::json!({"contactId": contact_id}),
            ),
            PresenceUpdate::Typing {
                contact_id,
                text,
                active,
            } => (
                "/presence/typing",
                serde_json::json!({
                    "contactId": contact_id,
                    "text": text,
                    "active": active,
                }),
            ),
        };

        let response = self
            .client
            .post(self.url(path))
            .json(&body)
            .send()
            .await
            .map_err(|e| Self::request_error("publish presence", e))?;
        Self::check_status(response, "publish presence").await?;
        Ok(())
    }
}
