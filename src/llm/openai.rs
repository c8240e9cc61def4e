//! OpenAI chat completions client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::error::LlmError;
use super::{AgentBackend, AgentReply, ChatMessage, Role};
use crate::prompt;

const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Per-request deadline for upstream calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Token cap for a single chat reply.
const MAX_RESPONSE_TOKENS: u32 = 1000;

/// Token cap for the `/api/status` connection test.
const PROBE_MAX_TOKENS: u32 = 10;

const TEMPERATURE: f64 = 0.7;

/// Client for the OpenAI chat completions API.
pub struct OpenAiBackend {
    client: Client,
    api_key: String,
    model: String,
}

impl OpenAiBackend {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_else(|_| Client::new()),
            api_key,
            model,
        }
    }

    async fn execute(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let response = self
            .client
            .post(OPENAI_API_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(LlmError::from_reqwest)?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            return Err(LlmError::from_status(status, &body));
        }

        serde_json::from_str(&body).map_err(|e| {
            LlmError::parse_error(format!("Failed to parse response: {}, body: {}", e, body))
        })
    }
}

#[async_trait]
impl AgentBackend for OpenAiBackend {
    fn id(&self) -> &'static str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn send_message(
        &self,
        history: &[ChatMessage],
        message: &str,
        _thread_id: Option<&str>,
    ) -> Result<AgentReply, LlmError> {
        let request = CompletionRequest {
            model: self.model.clone(),
            messages: prompt::build_messages(history, message),
            max_tokens: MAX_RESPONSE_TOKENS,
            temperature: Some(TEMPERATURE),
        };

        tracing::debug!(
            "Sending chat completion: model={} messages={}",
            request.model,
            request.messages.len()
        );

        let parsed = self.execute(&request).await?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::parse_error("No choices in response".to_string()))?;

        let text = choice
            .message
            .content
            .ok_or_else(|| LlmError::parse_error("Empty assistant message".to_string()))?;

        Ok(AgentReply {
            text,
            thread_id: None,
        })
    }

    async fn probe(&self) -> Result<(), LlmError> {
        let request = CompletionRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage::new(Role::User, "Test connection")],
            max_tokens: PROBE_MAX_TOKENS,
            temperature: None,
        };

        self.execute(&request).await.map(|_| ())
    }
}

/// Chat completions request format.
#[derive(Debug, Serialize)]
struct CompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
}

/// Chat completions response format.
#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_without_null_temperature() {
        let request = CompletionRequest {
            model: "gpt-4o-mini".to_string(),
            messages: vec![ChatMessage::new(Role::User, "Test connection")],
            max_tokens: PROBE_MAX_TOKENS,
            temperature: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("temperature").is_none());
        assert_eq!(json["max_tokens"], 10);
        assert_eq!(json["messages"][0]["role"], "user");
    }

    #[test]
    fn response_parses_assistant_content() {
        let body = r#"{
            "choices": [
                {"message": {"role": "assistant", "content": "Check the battery terminals."}}
            ],
            "usage": {"prompt_tokens": 20, "completion_tokens": 8, "total_tokens": 28}
        }"#;
        let parsed: CompletionResponse = serde_json::from_str(body).unwrap();
        assert_eq!(
            parsed.choices[0].message.content.as_deref(),
            Some("Check the battery terminals.")
        );
    }
}
