//! Upstream agent error types.
//!
//! Classifies failures from the hosted AI services into the categories the
//! API surfaces to users: authentication failures, rate limits, timeouts,
//! server errors, and malformed responses. Errors are reported, not retried.

/// Error from an upstream agent API call.
#[derive(Debug)]
pub struct LlmError {
    /// The kind of error
    pub kind: LlmErrorKind,
    /// HTTP status code, if applicable
    pub status_code: Option<u16>,
    /// Error message
    pub message: String,
}

impl LlmError {
    /// Create a rate limit error.
    pub fn rate_limited(message: String) -> Self {
        Self {
            kind: LlmErrorKind::RateLimited,
            status_code: Some(429),
            message,
        }
    }

    /// Create an authentication error.
    pub fn auth_error(status_code: u16, message: String) -> Self {
        Self {
            kind: LlmErrorKind::AuthError,
            status_code: Some(status_code),
            message,
        }
    }

    /// Create a server error.
    pub fn server_error(status_code: u16, message: String) -> Self {
        Self {
            kind: LlmErrorKind::ServerError,
            status_code: Some(status_code),
            message,
        }
    }

    /// Create a client error (bad request, not found, etc.).
    pub fn client_error(status_code: u16, message: String) -> Self {
        Self {
            kind: LlmErrorKind::ClientError,
            status_code: Some(status_code),
            message,
        }
    }

    /// Create a timeout error.
    pub fn timeout(message: String) -> Self {
        Self {
            kind: LlmErrorKind::Timeout,
            status_code: None,
            message,
        }
    }

    /// Create a network error.
    pub fn network_error(message: String) -> Self {
        Self {
            kind: LlmErrorKind::NetworkError,
            status_code: None,
            message,
        }
    }

    /// Create a parse error.
    pub fn parse_error(message: String) -> Self {
        Self {
            kind: LlmErrorKind::ParseError,
            status_code: None,
            message,
        }
    }

    /// Classify a failed HTTP response from an upstream service.
    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let code = status.as_u16();
        match classify_http_status(code) {
            LlmErrorKind::RateLimited => Self::rate_limited(body.to_string()),
            LlmErrorKind::AuthError => Self::auth_error(code, body.to_string()),
            LlmErrorKind::ClientError => Self::client_error(code, body.to_string()),
            _ => Self::server_error(code, body.to_string()),
        }
    }

    /// Classify a transport-level `reqwest` failure.
    pub fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::timeout(format!("Request timeout: {}", e))
        } else if e.is_connect() {
            Self::network_error(format!("Connection failed: {}", e))
        } else {
            Self::network_error(format!("Request failed: {}", e))
        }
    }
}

impl std::fmt::Display for LlmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status_code {
            Some(code) => write!(f, "{} (HTTP {}): {}", self.kind, code, self.message),
            None => write!(f, "{}: {}", self.kind, self.message),
        }
    }
}

impl std::error::Error for LlmError {}

/// Classification of upstream agent errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmErrorKind {
    /// Rate limited (429)
    RateLimited,
    /// Authentication/authorization rejected (401, 403)
    AuthError,
    /// Other client error (400, 404, ...)
    ClientError,
    /// Server error (5xx)
    ServerError,
    /// Request deadline exceeded
    Timeout,
    /// Connection-level failure
    NetworkError,
    /// Response did not match the expected shape
    ParseError,
}

impl std::fmt::Display for LlmErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LlmErrorKind::RateLimited => write!(f, "Rate limited"),
            LlmErrorKind::AuthError => write!(f, "Authentication failed"),
            LlmErrorKind::ClientError => write!(f, "Client error"),
            LlmErrorKind::ServerError => write!(f, "Server error"),
            LlmErrorKind::Timeout => write!(f, "Timeout"),
            LlmErrorKind::NetworkError => write!(f, "Network error"),
            LlmErrorKind::ParseError => write!(f, "Parse error"),
        }
    }
}

/// Map an HTTP status code to an error kind.
pub fn classify_http_status(status_code: u16) -> LlmErrorKind {
    match status_code {
        401 | 403 => LlmErrorKind::AuthError,
        429 => LlmErrorKind::RateLimited,
        400..=499 => LlmErrorKind::ClientError,
        _ => LlmErrorKind::ServerError,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_auth_statuses() {
        assert_eq!(classify_http_status(401), LlmErrorKind::AuthError);
        assert_eq!(classify_http_status(403), LlmErrorKind::AuthError);
    }

    #[test]
    fn classify_rate_limit() {
        assert_eq!(classify_http_status(429), LlmErrorKind::RateLimited);
    }

    #[test]
    fn classify_client_and_server_errors() {
        assert_eq!(classify_http_status(404), LlmErrorKind::ClientError);
        assert_eq!(classify_http_status(500), LlmErrorKind::ServerError);
        assert_eq!(classify_http_status(503), LlmErrorKind::ServerError);
    }

    #[test]
    fn from_status_carries_body_and_code() {
        let err = LlmError::from_status(reqwest::StatusCode::TOO_MANY_REQUESTS, "slow down");
        assert_eq!(err.kind, LlmErrorKind::RateLimited);
        assert_eq!(err.status_code, Some(429));
        assert_eq!(err.message, "slow down");
    }

    #[test]
    fn display_includes_status_code() {
        let err = LlmError::auth_error(401, "bad key".to_string());
        assert_eq!(format!("{}", err), "Authentication failed (HTTP 401): bad key");
    }
}
