//! HTTP route handlers.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::{BackendKind, Config};
use crate::format::format_message_content;
use crate::llm::{AgentBackend, FoundryBackend, LlmErrorKind, OpenAiBackend};
use crate::session::{ConversationRef, SessionStore};

use super::types::*;

/// Cookie carrying the opaque session identifier.
const SESSION_COOKIE: &str = "agent_repair_session";

/// Shared application state.
pub struct AppState {
    pub config: Config,
    /// Conversation sessions keyed by cookie
    pub sessions: Arc<SessionStore>,
    /// The upstream agent service; `None` until credentials are configured
    pub backend: Option<Arc<dyn AgentBackend>>,
}

/// Construct the upstream client for the selected backend.
///
/// Returns `None` when required credentials are missing; the server still
/// runs so the UI and `/api/status` can report the problem.
pub fn build_backend(config: &Config) -> Option<Arc<dyn AgentBackend>> {
    if !config.missing_vars().is_empty() {
        return None;
    }

    match config.backend {
        BackendKind::OpenAi => Some(Arc::new(OpenAiBackend::new(
            config.openai.api_key.clone()?,
            config.openai.model.clone(),
        ))),
        BackendKind::Foundry => Some(Arc::new(FoundryBackend::new(
            config.foundry.endpoint.clone()?,
            config.foundry.api_key.clone()?,
            config.foundry.agent_id.clone()?,
        ))),
    }
}

/// Start the HTTP server.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let sessions = Arc::new(SessionStore::new(Duration::from_secs(
        config.session_ttl_minutes * 60,
    )));
    Arc::clone(&sessions).start_sweep_task();

    let backend = build_backend(&config);
    match &backend {
        Some(backend) => {
            tracing::info!("Upstream backend: {} ({})", backend.id(), backend.model())
        }
        None => tracing::warn!(
            "Backend {} not configured (missing: {}); chat is disabled until credentials are set",
            config.backend,
            config.missing_vars().join(", ")
        ),
    }

    let state = Arc::new(AppState {
        config: config.clone(),
        sessions,
        backend,
    });

    let app = Router::new()
        .route("/", get(index))
        .route("/api/chat", post(chat))
        .route("/api/new-conversation", post(new_conversation))
        .route("/api/status", get(status))
        .route("/api/health", get(health))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::clone(&state));

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Chat UI: http://{}/", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Wait for SIGTERM/SIGINT.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

// ─────────────────────────────────────────────────────────────────────────────
// Session cookie plumbing
// ─────────────────────────────────────────────────────────────────────────────

/// Extract the session id from the request's `Cookie` header.
fn session_from_headers(headers: &HeaderMap) -> Option<String> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE && !value.is_empty()).then(|| value.to_string())
    })
}

/// The caller's session id, minting a fresh one when no cookie is present.
/// The second element is `true` when the id is new and must be set on the
/// response.
fn resolve_session(headers: &HeaderMap) -> (String, bool) {
    match session_from_headers(headers) {
        Some(id) => (id, false),
        None => (SessionStore::create_id(), true),
    }
}

/// Attach the session cookie to a response for newly minted sessions.
fn with_session_cookie(mut response: Response, session_id: &str, is_new: bool) -> Response {
    if is_new {
        let cookie = format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax",
            SESSION_COOKIE, session_id
        );
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }
    response
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// Serve the chat UI.
async fn index() -> Html<&'static str> {
    Html(include_str!("../../web/chat.html"))
}

/// Relay a chat message to the configured agent service.
async fn chat(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<ChatRequest>,
) -> Response {
    let message = req.message.trim();
    if message.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Message cannot be empty");
    }

    let Some(backend) = state.backend.clone() else {
        return error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            &format!(
                "Missing environment variables: {}",
                state.config.missing_vars().join(", ")
            ),
        );
    };

    let (session_id, is_new) = resolve_session(&headers);
    let session = state.sessions.context(&session_id).await;

    let reply = match backend
        .send_message(&session.history, message, session.thread_id.as_deref())
        .await
    {
        Ok(reply) => reply,
        Err(e) => {
            tracing::error!("Chat turn failed ({}): {}", backend.id(), e);
            let response = match e.kind {
                LlmErrorKind::RateLimited => error_response(
                    StatusCode::TOO_MANY_REQUESTS,
                    "API rate limit exceeded. Please try again later.",
                ),
                _ => error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    &format!("Failed to get AI response: {}", e),
                ),
            };
            return with_session_cookie(response, &session_id, is_new);
        }
    };

    let reference = state
        .sessions
        .complete_turn(&session_id, message, &reply)
        .await;
    let (conversation_id, thread_id) = match reference {
        ConversationRef::Conversation(id) => (Some(id), None),
        ConversationRef::Thread(id) => (None, Some(id)),
    };

    let response = Json(ChatResponse {
        response: format_message_content(&reply.text),
        raw_response: reply.text,
        conversation_id,
        thread_id,
        timestamp: chrono::Local::now().to_rfc3339(),
    })
    .into_response();

    with_session_cookie(response, &session_id, is_new)
}

/// Forget the caller's conversation; the next message starts fresh.
async fn new_conversation(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    if let Some(session_id) = session_from_headers(&headers) {
        state.sessions.reset(&session_id).await;
    }
    Json(NewConversationResponse {
        message: "New conversation started".to_string(),
    })
    .into_response()
}

/// Check configuration and upstream connectivity.
async fn status(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let missing = state.config.missing_vars();
    if !missing.is_empty() {
        return status_response(
            StatusCode::BAD_REQUEST,
            "error",
            &format!("Missing environment variables: {}", missing.join(", ")),
        );
    }

    let Some(backend) = state.backend.clone() else {
        return status_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "error",
            "Agent backend is not initialised",
        );
    };

    match backend.probe().await {
        Ok(()) => {
            let session = match session_from_headers(&headers) {
                Some(session_id) => state.sessions.peek(&session_id).await,
                None => None,
            }
            .unwrap_or_default();

            let conversation_id = session
                .conversation_id
                .or(session.thread_id)
                .unwrap_or_else(|| "none".to_string());

            Json(StatusResponse {
                status: "ok".to_string(),
                message: "Connected successfully".to_string(),
                model: Some(state.config.model_label()),
                conversation_id: Some(conversation_id),
                messages_count: Some(session.history.len()),
            })
            .into_response()
        }
        Err(e) if e.kind == LlmErrorKind::AuthError => {
            tracing::warn!("Status probe rejected: {}", e);
            status_response(StatusCode::UNAUTHORIZED, "error", "Invalid API key")
        }
        Err(e) if e.kind == LlmErrorKind::RateLimited => status_response(
            StatusCode::OK,
            "warning",
            "API rate limit reached but connection is valid",
        ),
        Err(e) => {
            tracing::error!("Status probe failed: {}", e);
            status_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "error",
                &format!("Failed to connect to agent service: {}", e),
            )
        }
    }
}

/// Liveness probe.
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        backend: state.config.backend.id().to_string(),
    })
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
        .into_response()
}

fn status_response(status: StatusCode, state: &str, message: &str) -> Response {
    (
        status,
        Json(StatusResponse {
            status: state.to_string(),
            message: message.to_string(),
            model: None,
            conversation_id: None,
            messages_count: None,
        }),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_cookie_is_extracted_among_other_cookies() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; agent_repair_session=abc-123; lang=en"),
        );
        assert_eq!(session_from_headers(&headers), Some("abc-123".to_string()));
    }

    #[test]
    fn missing_cookie_header_yields_none() {
        let headers = HeaderMap::new();
        assert_eq!(session_from_headers(&headers), None);
    }

    #[test]
    fn empty_cookie_value_is_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("agent_repair_session="),
        );
        assert_eq!(session_from_headers(&headers), None);
    }

    #[test]
    fn resolve_session_mints_an_id_without_cookie() {
        let headers = HeaderMap::new();
        let (id, is_new) = resolve_session(&headers);
        assert!(is_new);
        assert!(!id.is_empty());
    }

    #[test]
    fn new_session_gets_a_set_cookie_header() {
        let response = Json(serde_json::json!({})).into_response();
        let response = with_session_cookie(response, "abc", true);
        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .unwrap();
        assert!(cookie.starts_with("agent_repair_session=abc"));
        assert!(cookie.contains("HttpOnly"));
    }

    #[test]
    fn existing_session_gets_no_set_cookie_header() {
        let response = Json(serde_json::json!({})).into_response();
        let response = with_session_cookie(response, "abc", false);
        assert!(response.headers().get(header::SET_COOKIE).is_none());
    }
}
