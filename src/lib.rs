//! # AgentRepair
//!
//! Self-hosted web chat assistant for car repair diagnostics and guidance,
//! backed by a hosted AI agent service.
//!
//! This library provides:
//! - An HTTP API and embedded browser chat UI
//! - Clients for OpenAI chat completions and Azure AI Foundry agent threads
//! - Per-browser conversation sessions with bounded history
//! - HTML formatting of agent replies for display in the chat UI
//!
//! ## Request Flow
//! 1. Browser posts a message to `/api/chat`
//! 2. The session store resolves (or creates) the caller's conversation
//! 3. The configured backend relays the message upstream and returns the reply
//! 4. The reply is formatted as HTML and returned as JSON
//!
//! ## Modules
//! - `api`: HTTP routes, handlers, and request/response types
//! - `llm`: Upstream agent clients behind the `AgentBackend` trait
//! - `session`: In-memory conversation session store
//! - `format`: Plain text to HTML conversion for chat replies
//! - `prompt`: Car-repair system prompt and message assembly

pub mod api;
pub mod config;
pub mod format;
pub mod llm;
pub mod prompt;
pub mod session;

pub use config::{BackendKind, Config};
pub use session::SessionStore;
