//! API request and response types.

use serde::{Deserialize, Serialize};

/// Request to send a chat message.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    /// The user's message text
    #[serde(default)]
    pub message: String,
}

/// Successful chat turn.
#[derive(Debug, Clone, Serialize)]
pub struct ChatResponse {
    /// HTML-formatted reply for the chat UI
    pub response: String,

    /// The agent's reply as returned upstream
    pub raw_response: String,

    /// Conversation identifier (chat completions backend)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,

    /// Upstream thread identifier (Foundry backend)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,

    /// ISO-8601 timestamp of the reply
    pub timestamp: String,
}

/// Error payload for failed requests.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// User-facing error description
    pub error: String,
}

/// Response after resetting the conversation.
#[derive(Debug, Clone, Serialize)]
pub struct NewConversationResponse {
    pub message: String,
}

/// Overall service status.
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    /// `ok`, `warning`, or `error`
    pub status: String,

    /// Human-readable status detail
    pub message: String,

    /// Configured model or agent identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// The caller's current conversation identifier, or `none`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,

    /// Messages currently held for the caller's session
    #[serde(skip_serializing_if = "Option::is_none")]
    pub messages_count: Option<usize>,
}

/// Liveness probe response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Selected upstream backend (`openai` or `foundry`)
    pub backend: String,
}
