use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use crate::error::{BotError, Result};
use crate::secrets::ApiKey;

// Structures matching Mistral's /v1/chat/completions endpoint
#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize, Debug)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize, Debug)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Deserialize, Debug)]
struct AssistantMessage {
    content: Option<String>,
}

#[derive(Clone, Debug)]
pub struct MistralSettings {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<ApiKey>,
}

/// Thin client for Mistral chat completions. One user message per call.
#[derive(Clone, Debug)]
pub struct MistralClient {
    http: Client,
    endpoint: String,
    model: String,
    api_key: Option<ApiKey>,
}

impl MistralClient {
    pub fn new(settings: MistralSettings) -> Self {
        let endpoint = format!(
            "{}/v1/chat/completions",
            settings.base_url.trim_end_matches('/')
        );
        Self {
            http: Client::new(),
            endpoint,
            model: settings.model,
            api_key: settings.api_key,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Sends `prompt` and returns the assistant text exactly as received.
    #[instrument(skip_all, fields(model = %self.model))]
    pub async fn complete(&self, prompt: &str) -> Result<String> {
        self.send(prompt, false).await
    }

    /// Like [`complete`](Self::complete) but asks for a JSON object.
    #[instrument(skip_all, fields(model = %self.model))]
    pub async fn complete_json(&self, prompt: &str) -> Result<String> {
        self.send(prompt, true).await
    }

    async fn send(&self, prompt: &str, json_mode: bool) -> Result<String> {
        let api_key = self.api_key.as_ref().ok_or(BotError::MissingApiKey)?;

        let request_payload = ChatRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            response_format: json_mode.then_some(ResponseFormat {
                kind: "json_object",
            }),
        };

        debug!(prompt_len = prompt.len(), json_mode, "Sending chat completion");

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(api_key.expose())
            .json(&request_payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            error!(%status, %body, "Mistral API request failed");
            return Err(BotError::Api { status, body });
        }

        let bytes = response.bytes().await?;
        let parsed: ChatResponse = serde_json::from_slice(&bytes)?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(BotError::EmptyResponse)?;

        debug!(response_len = content.len(), "Received chat completion");
        Ok(content)
    }
}
