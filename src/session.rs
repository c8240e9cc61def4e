//! In-memory conversation session store.
//!
//! Each browser gets an opaque `session_id` cookie; the matching entry here
//! holds the conversation identifier, the upstream thread (Foundry backend),
//! and a bounded message history (chat completions backend). Sessions are
//! swept after a period of inactivity. Nothing is persisted.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::llm::{AgentReply, ChatMessage, Role};

/// Maximum messages retained per session (10 exchanges).
pub const MAX_HISTORY: usize = 20;

/// How often the background sweep checks for idle sessions.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Conversation state for one browser session.
#[derive(Debug, Clone, Default)]
pub struct Session {
    /// Local conversation identifier, assigned on the first completed turn
    pub conversation_id: Option<String>,
    /// Upstream Foundry thread identifier
    pub thread_id: Option<String>,
    /// Prior messages, oldest first, capped at [`MAX_HISTORY`]
    pub history: Vec<ChatMessage>,
}

/// Identifier a completed turn reports back to the browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationRef {
    /// Session-local identifier (chat completions backend)
    Conversation(String),
    /// Upstream thread identifier (Foundry backend)
    Thread(String),
}

#[derive(Debug)]
struct SessionEntry {
    session: Session,
    last_seen: Instant,
}

/// Store of active conversation sessions.
#[derive(Debug)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, SessionEntry>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Mint a new opaque session identifier.
    pub fn create_id() -> String {
        Uuid::new_v4().to_string()
    }

    /// Current conversation state for a session, creating the entry if it
    /// does not exist yet. Refreshes the idle timer.
    pub async fn context(&self, session_id: &str) -> Session {
        let mut sessions = self.sessions.write().await;
        let entry = sessions
            .entry(session_id.to_string())
            .or_insert_with(|| SessionEntry {
                session: Session::default(),
                last_seen: Instant::now(),
            });
        entry.last_seen = Instant::now();
        entry.session.clone()
    }

    /// Record a completed turn: append the exchange to the history, cap it,
    /// and resolve the conversation identifier for the response.
    pub async fn complete_turn(
        &self,
        session_id: &str,
        user_message: &str,
        reply: &AgentReply,
    ) -> ConversationRef {
        let mut sessions = self.sessions.write().await;
        let entry = sessions
            .entry(session_id.to_string())
            .or_insert_with(|| SessionEntry {
                session: Session::default(),
                last_seen: Instant::now(),
            });
        entry.last_seen = Instant::now();

        let session = &mut entry.session;
        session
            .history
            .push(ChatMessage::new(Role::User, user_message));
        session
            .history
            .push(ChatMessage::new(Role::Assistant, reply.text.clone()));
        if session.history.len() > MAX_HISTORY {
            session
                .history
                .drain(..session.history.len() - MAX_HISTORY);
        }

        match &reply.thread_id {
            Some(thread_id) => {
                session.thread_id = Some(thread_id.clone());
                ConversationRef::Thread(thread_id.clone())
            }
            None => {
                let id = session.conversation_id.get_or_insert_with(new_conversation_id);
                ConversationRef::Conversation(id.clone())
            }
        }
    }

    /// Look up a session without creating it or refreshing its idle timer.
    pub async fn peek(&self, session_id: &str) -> Option<Session> {
        let sessions = self.sessions.read().await;
        sessions.get(session_id).map(|entry| entry.session.clone())
    }

    /// Drop a session's conversation state. The next message starts fresh.
    pub async fn reset(&self, session_id: &str) {
        let mut sessions = self.sessions.write().await;
        sessions.remove(session_id);
    }

    /// Number of active sessions (for logging and tests).
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Remove sessions idle longer than the configured TTL.
    pub async fn sweep_expired(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, entry| entry.last_seen.elapsed() <= self.ttl);
        before - sessions.len()
    }

    /// Spawn the background task that sweeps idle sessions.
    pub fn start_sweep_task(self: Arc<Self>) {
        let store = self;
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(SWEEP_INTERVAL).await;
                let removed = store.sweep_expired().await;
                if removed > 0 {
                    tracing::debug!("Swept {} idle chat sessions", removed);
                }
            }
        });
    }
}

/// Timestamp-derived conversation identifier, e.g. `conv_20250822_153045`.
fn new_conversation_id() -> String {
    format!("conv_{}", chrono::Local::now().format("%Y%m%d_%H%M%S"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_reply(text: &str) -> AgentReply {
        AgentReply {
            text: text.to_string(),
            thread_id: None,
        }
    }

    #[tokio::test]
    async fn context_creates_empty_session() {
        let store = SessionStore::new(Duration::from_secs(60));
        let session = store.context("s1").await;
        assert!(session.history.is_empty());
        assert!(session.conversation_id.is_none());
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn complete_turn_appends_exchange_and_assigns_conversation_id() {
        let store = SessionStore::new(Duration::from_secs(60));
        let reference = store
            .complete_turn("s1", "car won't start", &text_reply("Check the battery."))
            .await;

        let session = store.context("s1").await;
        assert_eq!(session.history.len(), 2);
        assert_eq!(session.history[0].role, Role::User);
        assert_eq!(session.history[1].content, "Check the battery.");

        match reference {
            ConversationRef::Conversation(id) => {
                assert!(id.starts_with("conv_"));
                assert_eq!(session.conversation_id.as_deref(), Some(id.as_str()));
            }
            ConversationRef::Thread(_) => panic!("stateless reply must not produce a thread"),
        }
    }

    #[tokio::test]
    async fn conversation_id_is_stable_across_turns() {
        let store = SessionStore::new(Duration::from_secs(60));
        let first = store.complete_turn("s1", "a", &text_reply("b")).await;
        let second = store.complete_turn("s1", "c", &text_reply("d")).await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn history_is_capped() {
        let store = SessionStore::new(Duration::from_secs(60));
        for i in 0..15 {
            store
                .complete_turn("s1", &format!("q{}", i), &text_reply("a"))
                .await;
        }
        let session = store.context("s1").await;
        assert_eq!(session.history.len(), MAX_HISTORY);
        // Oldest messages were dropped.
        assert_eq!(session.history[0].content, "q5");
    }

    #[tokio::test]
    async fn thread_reply_stores_thread_id() {
        let store = SessionStore::new(Duration::from_secs(60));
        let reply = AgentReply {
            text: "ok".to_string(),
            thread_id: Some("thread_abc".to_string()),
        };
        let reference = store.complete_turn("s1", "hello", &reply).await;
        assert_eq!(reference, ConversationRef::Thread("thread_abc".to_string()));

        let session = store.context("s1").await;
        assert_eq!(session.thread_id.as_deref(), Some("thread_abc"));
    }

    #[tokio::test]
    async fn reset_clears_conversation_state() {
        let store = SessionStore::new(Duration::from_secs(60));
        store.complete_turn("s1", "a", &text_reply("b")).await;
        store.reset("s1").await;

        let session = store.context("s1").await;
        assert!(session.history.is_empty());
        assert!(session.conversation_id.is_none());
    }

    #[tokio::test]
    async fn sweep_removes_idle_sessions() {
        let store = SessionStore::new(Duration::ZERO);
        store.context("s1").await;
        store.context("s2").await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        let removed = store.sweep_expired().await;
        assert_eq!(removed, 2);
        assert!(store.is_empty().await);
    }
}
