//! OpenAiCompatOracle - Chat Completions backend.
//!
//! Works against any OpenAI-compatible endpoint; the base URL selects the
//! provider (OpenAI by default, Groq via `https://api.groq.com/openai/v1`).

use crate::http_error::{map_http_error, map_transport_error, parse_retry_after};
use async_trait::async_trait;
use reqwest::Client;
use scenar_core::config::OpenAiSecret;
use scenar_core::oracle::{Oracle, OracleError, OracleMessage};
use serde::{Deserialize, Serialize};

pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Clone)]
pub struct OpenAiCompatOracle {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    max_tokens: Option<u32>,
}

impl OpenAiCompatOracle {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            max_tokens: None,
        }
    }

    pub fn from_secret(secret: &OpenAiSecret) -> Result<Self, OracleError> {
        if secret.api_key.trim().is_empty() {
            return Err(OracleError::Configuration(
                "OpenAI api_key is empty; set it in secret.json, OPENAI_API_KEY or GROQ_API_KEY"
                    .into(),
            ));
        }
        let model = secret
            .model_name
            .clone()
            .unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string());
        let oracle = Self::new(secret.api_key.clone(), model);
        Ok(match &secret.base_url {
            Some(base_url) => oracle.with_base_url(base_url.clone()),
            None => oracle,
        })
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
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn build_request(&self, system: &str, messages: &[OracleMessage]) -> ChatCompletionRequest {
        let system_message = (!system.trim().is_empty()).then(|| ChatMessage {
            role: "system",
            content: system.to_string(),
        });

        ChatCompletionRequest {
            model: self.model.clone(),
            messages: system_message
                .into_iter()
                .chain(messages.iter().map(|m| ChatMessage {
                    role: m.role.as_str(),
                    content: m.content.clone(),
                }))
                .collect(),
            max_tokens: self.max_tokens,
        }
    }

    async fn send_request(&self, body: &ChatCompletionRequest) -> Result<String, OracleError> {
        let response = self
            .client
            .post(self.endpoint())
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|err| map_transport_error("OpenAI API", err))?;

        if !response.status().is_success() {
            let status = response.status();
            let retry_after = parse_retry_after(response.headers().get("retry-after"));
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read OpenAI error body".to_string());
            return Err(map_http_error(status, &body_text, retry_after));
        }

        let parsed: ChatCompletionResponse = response.json().await.map_err(|err| {
            OracleError::unavailable(format!("Failed to parse OpenAI response: {err}"))
        })?;

        extract_text_response(parsed)
    }
}

#[async_trait]
impl Oracle for OpenAiCompatOracle {
    async fn complete(
        &self,
        system: &str,
        messages: &[OracleMessage],
    ) -> Result<String, OracleError> {
        let request = self.build_request(system, messages);
        tracing::debug!(
            target: "scenar::oracle",
            model = %self.model,
            endpoint = %self.endpoint(),
            messages = request.messages.len(),
            "Sending chat completion request"
        );
        self.send_request(&request).await
    }

    fn name(&self) -> &str {
        "openai"
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

fn extract_text_response(response: ChatCompletionResponse) -> Result<String, OracleError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|text| !text.trim().is_empty())
        .ok_or(OracleError::EmptyResponse)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_system_directive_is_first_message() {
        let oracle = OpenAiCompatOracle::new("key", "gpt-test").with_max_tokens(100);
        let request = oracle.build_request(
            "Classify.",
            &[OracleMessage::user("hello"), OracleMessage::assistant("hi")],
        );
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(
            body,
            json!({
                "model": "gpt-test",
                "max_tokens": 100,
                "messages": [
                    {"role": "system", "content": "Classify."},
                    {"role": "user", "content": "hello"},
                    {"role": "assistant", "content": "hi"}
                ]
            })
        );
    }

    #[test]
    fn test_max_tokens_omitted_when_unset() {
        let oracle = OpenAiCompatOracle::new("key", "m");
        let body = serde_json::to_value(oracle.build_request("", &[OracleMessage::user("x")]))
            .unwrap();
        assert!(body.get("max_tokens").is_none());
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_base_url_from_secret() {
        let oracle = OpenAiCompatOracle::from_secret(&OpenAiSecret {
            api_key: "gsk".into(),
            model_name: Some("llama-3.1-70b-versatile".into()),
            base_url: Some("https://api.groq.com/openai/v1/".into()),
        })
        .unwrap();
        assert_eq!(
            oracle.endpoint(),
            "https://api.groq.com/openai/v1/chat/completions"
        );
        assert_eq!(oracle.model(), "llama-3.1-70b-versatile");

        let default = OpenAiCompatOracle::from_secret(&OpenAiSecret {
            api_key: "sk".into(),
            model_name: None,
            base_url: None,
        })
        .unwrap();
        assert_eq!(default.base_url(), DEFAULT_OPENAI_BASE_URL);
        assert_eq!(default.model(), DEFAULT_OPENAI_MODEL);
    }

    #[test]
    fn test_missing_content_is_empty_response() {
        let response: ChatCompletionResponse = serde_json::from_value(json!({
            "choices": [{"message": {"role": "assistant", "content": null}}]
        }))
        .unwrap();
        assert_eq!(
            extract_text_response(response),
            Err(OracleError::EmptyResponse)
        );

        let response: ChatCompletionResponse =
            serde_json::from_value(json!({"choices": [{"message": {"content": "ok"}}]})).unwrap();
        assert_eq!(extract_text_response(response).unwrap(), "ok");
    }
}
