//! Clients for the hosted AI agent services.
//!
//! This module provides a trait-based abstraction over the two supported
//! upstreams: OpenAI chat completions and Azure AI Foundry agent threads.
//! Both relay a single conversation turn and surface failures as
//! classified [`LlmError`]s.

mod error;
mod foundry;
mod openai;

pub use error::{classify_http_status, LlmError, LlmErrorKind};
pub use foundry::FoundryBackend;
pub use openai::OpenAiBackend;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Role in a chat conversation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A message in a chat conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        ChatMessage {
            role,
            content: content.into(),
        }
    }
}

/// Result of relaying one conversation turn upstream.
#[derive(Debug, Clone)]
pub struct AgentReply {
    /// The agent's plain-text reply
    pub text: String,

    /// Upstream thread identifier, for backends that keep conversation
    /// state on their side (Azure AI Foundry). `None` for stateless
    /// backends.
    pub thread_id: Option<String>,
}

/// Trait for upstream agent services.
#[async_trait]
pub trait AgentBackend: Send + Sync {
    /// Stable identifier (`openai`, `foundry`).
    fn id(&self) -> &'static str;

    /// Model or agent identifier used for this backend.
    fn model(&self) -> &str;

    /// Relay one user message upstream and return the agent's reply.
    ///
    /// `history` is the session's prior messages, oldest first, already
    /// truncated to the context window the backend should see. Stateful
    /// backends receive the session's `thread_id` from the previous turn
    /// and return the thread to use for the next one.
    async fn send_message(
        &self,
        history: &[ChatMessage],
        message: &str,
        thread_id: Option<&str>,
    ) -> Result<AgentReply, LlmError>;

    /// Cheap connectivity check used by `/api/status`.
    async fn probe(&self) -> Result<(), LlmError>;
}
