//! ClaudeApiOracle - Anthropic Messages API backend.
//!
//! Configuration priority: secret.json > environment variables
//! (ANTHROPIC_API_KEY, CLAUDE_MODEL_NAME).

use crate::http_error::{map_http_error, map_transport_error, parse_retry_after};
use async_trait::async_trait;
use reqwest::Client;
use scenar_core::config::ClaudeSecret;
use scenar_core::conversation::MessageRole;
use scenar_core::oracle::{Oracle, OracleError, OracleMessage};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CLAUDE_MODEL: &str = "claude-3-opus-20240229";
const BASE_URL: &str = "https://api.anthropic.com/v1";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Oracle that talks to the Claude HTTP API.
#[derive(Clone)]
pub struct ClaudeApiOracle {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    max_tokens: u32,
}

impl ClaudeApiOracle {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            base_url: BASE_URL.to_string(),
            max_tokens: 2000,
        }
    }

    /// Builds the oracle from the `claude` secret, falling back to the
    /// default model.
    pub fn from_secret(secret: &ClaudeSecret) -> Result<Self, OracleError> {
        if secret.api_key.trim().is_empty() {
            return Err(OracleError::Configuration(
                "Claude api_key is empty; set it in secret.json or ANTHROPIC_API_KEY".into(),
            ));
        }
        let model = secret
            .model_name
            .clone()
            .unwrap_or_else(|| DEFAULT_CLAUDE_MODEL.to_string());
        Ok(Self::new(secret.api_key.clone(), model))
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_request(&self, system: &str, messages: &[OracleMessage]) -> CreateMessageRequest {
        CreateMessageRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            system: (!system.trim().is_empty()).then(|| system.to_string()),
            messages: messages
                .iter()
                .map(|m| Message {
                    role: m.role.as_str(),
                    content: m.content.clone(),
                })
                .collect(),
        }
    }

    async fn send_request(&self, body: &CreateMessageRequest) -> Result<String, OracleError> {
        let response = self
            .client
            .post(format!("{}/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|err| map_transport_error("Claude API", err))?;

        if !response.status().is_success() {
            let status = response.status();
            let retry_after = parse_retry_after(response.headers().get("retry-after"));
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read Claude error body".to_string());
            return Err(map_http_error(status, &body_text, retry_after));
        }

        let parsed: CreateMessageResponse = response.json().await.map_err(|err| {
            OracleError::unavailable(format!("Failed to parse Claude response: {err}"))
        })?;

        extract_text_response(parsed)
    }
}

#[async_trait]
impl Oracle for ClaudeApiOracle {
    async fn complete(
        &self,
        system: &str,
        messages: &[OracleMessage],
    ) -> Result<String, OracleError> {
        debug_assert!(
            messages.first().map(|m| m.role) != Some(MessageRole::Assistant),
            "Claude conversations start with a user turn"
        );
        let request = self.build_request(system, messages);
        tracing::debug!(
            target: "scenar::oracle",
            model = %self.model,
            messages = messages.len(),
            "Sending Claude request"
        );
        self.send_request(&request).await
    }

    fn name(&self) -> &str {
        "claude"
    }
}

#[derive(Serialize)]
struct CreateMessageRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<Message>,
}

#[derive(Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct CreateMessageResponse {
    content: Vec<ContentBlockResponse>,
}

#[derive(Deserialize)]
#[serde(tag = "type")]
enum ContentBlockResponse {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Other,
}

fn extract_text_response(response: CreateMessageResponse) -> Result<String, OracleError> {
    let text: String = response
        .content
        .into_iter()
        .filter_map(|block| match block {
            ContentBlockResponse::Text { text } => Some(text),
            ContentBlockResponse::Other => None,
        })
        .collect();

    if text.trim().is_empty() {
        Err(OracleError::EmptyResponse)
    } else {
        Ok(text)
    }
}
