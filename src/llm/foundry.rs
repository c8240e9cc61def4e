//! Azure AI Foundry agent/thread API client.
//!
//! Unlike chat completions, Foundry keeps conversation state server-side:
//! each browser session maps to one upstream thread. A turn appends the user
//! message to the thread, starts a run for the configured agent, polls the
//! run to completion, and reads back the newest assistant message.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::error::LlmError;
use super::{AgentBackend, AgentReply, ChatMessage};

const API_VERSION: &str = "v1";

/// Per-request deadline for upstream calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// How long a run may stay non-terminal before the turn is abandoned.
const RUN_DEADLINE: Duration = Duration::from_secs(60);

/// Delay between run status polls.
const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Client for the Azure AI Foundry agent service.
pub struct FoundryBackend {
    client: Client,
    endpoint: String,
    api_key: String,
    agent_id: String,
}

impl FoundryBackend {
    pub fn new(endpoint: String, api_key: String, agent_id: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_else(|_| Client::new()),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key,
            agent_id,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}?api-version={}", self.endpoint, path, API_VERSION)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, LlmError> {
        let response = self
            .client
            .get(self.url(path))
            .query(query)
            .header("api-key", &self.api_key)
            .send()
            .await
            .map_err(LlmError::from_reqwest)?;

        Self::decode(response).await
    }

    async fn post_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<T, LlmError> {
        let response = self
            .client
            .post(self.url(path))
            .header("api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(LlmError::from_reqwest)?;

        Self::decode(response).await
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, LlmError> {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            return Err(LlmError::from_status(status, &body));
        }

        serde_json::from_str(&body).map_err(|e| {
            LlmError::parse_error(format!("Failed to parse response: {}, body: {}", e, body))
        })
    }

    /// Reuse the session's thread, or create one on the first turn.
    async fn ensure_thread(&self, thread_id: Option<&str>) -> Result<String, LlmError> {
        if let Some(id) = thread_id {
            return Ok(id.to_string());
        }
        let thread: ThreadObject = self.post_json("threads", &serde_json::json!({})).await?;
        tracing::info!("Created Foundry thread {}", thread.id);
        Ok(thread.id)
    }

    /// Poll a run until it reaches a terminal status.
    async fn wait_for_run(&self, thread_id: &str, run_id: &str) -> Result<(), LlmError> {
        let start = Instant::now();

        loop {
            let run: RunObject = self
                .get_json(&format!("threads/{}/runs/{}", thread_id, run_id), &[])
                .await?;

            match run.status.as_str() {
                "completed" => return Ok(()),
                "failed" | "cancelled" | "expired" => {
                    let detail = run
                        .last_error
                        .map(|e| format!("{}: {}", e.code, e.message))
                        .unwrap_or_else(|| "no error detail".to_string());
                    return Err(LlmError::server_error(
                        502,
                        format!("Agent run {} {}: {}", run_id, run.status, detail),
                    ));
                }
                // Tool use is not configured for this agent; a run stuck on
                // requires_action can never progress.
                "requires_action" => {
                    return Err(LlmError::server_error(
                        502,
                        format!("Agent run {} requires tool action", run_id),
                    ));
                }
                _ => {}
            }

            if start.elapsed() > RUN_DEADLINE {
                return Err(LlmError::timeout(format!(
                    "Agent run {} still {} after {:?}",
                    run_id, run.status, RUN_DEADLINE
                )));
            }

            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    /// Read the newest assistant message from a thread.
    async fn latest_reply(&self, thread_id: &str) -> Result<String, LlmError> {
        let listing: MessageListing = self
            .get_json(
                &format!("threads/{}/messages", thread_id),
                &[("order", "desc"), ("limit", "10")],
            )
            .await?;

        let message = listing
            .data
            .into_iter()
            .find(|m| m.role == "assistant")
            .ok_or_else(|| LlmError::parse_error("Thread has no assistant reply".to_string()))?;

        let text: String = message
            .content
            .into_iter()
            .filter_map(|part| part.text.map(|t| t.value))
            .collect::<Vec<_>>()
            .join("\n");

        if text.is_empty() {
            return Err(LlmError::parse_error(
                "Assistant reply has no text content".to_string(),
            ));
        }
        Ok(text)
    }
}

#[async_trait]
impl AgentBackend for FoundryBackend {
    fn id(&self) -> &'static str {
        "foundry"
    }

    fn model(&self) -> &str {
        &self.agent_id
    }

    async fn send_message(
        &self,
        _history: &[ChatMessage],
        message: &str,
        thread_id: Option<&str>,
    ) -> Result<AgentReply, LlmError> {
        let thread_id = self.ensure_thread(thread_id).await?;

        let _: MessageObject = self
            .post_json(
                &format!("threads/{}/messages", thread_id),
                &serde_json::json!({ "role": "user", "content": message }),
            )
            .await?;

        let run: RunObject = self
            .post_json(
                &format!("threads/{}/runs", thread_id),
                &serde_json::json!({ "assistant_id": self.agent_id }),
            )
            .await?;

        tracing::debug!("Started run {} on thread {}", run.id, thread_id);
        self.wait_for_run(&thread_id, &run.id).await?;

        let text = self.latest_reply(&thread_id).await?;

        Ok(AgentReply {
            text,
            thread_id: Some(thread_id),
        })
    }

    async fn probe(&self) -> Result<(), LlmError> {
        let _: AgentObject = self
            .get_json(&format!("assistants/{}", self.agent_id), &[])
            .await?;
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Wire types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ThreadObject {
    id: String,
}

#[derive(Debug, Deserialize)]
struct AgentObject {
    #[allow(dead_code)]
    id: String,
}

#[derive(Debug, Deserialize)]
struct RunObject {
    id: String,
    status: String,
    #[serde(default)]
    last_error: Option<RunError>,
}

#[derive(Debug, Deserialize)]
struct RunError {
    code: String,
    message: String,
}

#[derive(Debug, Deserialize)]
struct MessageObject {
    #[allow(dead_code)]
    id: String,
}

#[derive(Debug, Deserialize)]
struct MessageListing {
    data: Vec<ThreadMessage>,
}

#[derive(Debug, Deserialize)]
struct ThreadMessage {
    role: String,
    #[serde(default)]
    content: Vec<ContentPart>,
}

#[derive(Debug, Deserialize)]
struct ContentPart {
    #[serde(default)]
    text: Option<TextValue>,
}

#[derive(Debug, Deserialize)]
struct TextValue {
    value: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_parses_terminal_failure() {
        let body = r#"{
            "id": "run_1",
            "status": "failed",
            "last_error": {"code": "server_error", "message": "boom"}
        }"#;
        let run: RunObject = serde_json::from_str(body).unwrap();
        assert_eq!(run.status, "failed");
        assert_eq!(run.last_error.unwrap().code, "server_error");
    }

    #[test]
    fn message_listing_extracts_text_parts() {
        let body = r#"{
            "data": [
                {
                    "role": "assistant",
                    "content": [
                        {"type": "text", "text": {"value": "Replace the alternator belt."}}
                    ]
                }
            ]
        }"#;
        let listing: MessageListing = serde_json::from_str(body).unwrap();
        let message = &listing.data[0];
        assert_eq!(message.role, "assistant");
        assert_eq!(
            message.content[0].text.as_ref().unwrap().value,
            "Replace the alternator belt."
        );
    }
}
