//! HTTP API for AgentRepair.
//!
//! ## Endpoints
//!
//! - `GET /` - Browser chat UI
//! - `POST /api/chat` - Relay a chat message to the agent service
//! - `POST /api/new-conversation` - Reset the caller's conversation
//! - `GET /api/status` - Configuration and upstream connectivity check
//! - `GET /api/health` - Liveness probe

mod routes;
pub mod types;

pub use routes::{build_backend, serve, AppState};
pub use types::*;
