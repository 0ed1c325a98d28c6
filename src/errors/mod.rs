//! Error handling module for the TeamTask client.
//!
//! Every failure the backend or the transport can produce is collapsed into a
//! small taxonomy so callers only ever deal with one error shape.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Error codes as constants to avoid stringly-typed errors.
pub mod codes {
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const UNAUTHORIZED: &str = "UNAUTHORIZED";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const CONFLICT: &str = "CONFLICT";
    pub const SERVER_ERROR: &str = "SERVER_ERROR";
    pub const NETWORK_ERROR: &str = "NETWORK_ERROR";
    pub const CANCELLED: &str = "CANCELLED";
}

/// Category of a failed call, as surfaced to callers of the action layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// 4xx with field errors.
    Validation,
    /// 401 / 403.
    Auth,
    /// 404.
    NotFound,
    /// 409.
    Conflict,
    /// 5xx or an unreadable response body.
    Server,
    /// No response at all (connection refused, timeout, DNS).
    Network,
    /// The owning view was torn down before the call finished.
    Cancelled,
}

impl ErrorKind {
    /// Map an HTTP status code onto the taxonomy.
    pub fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => ErrorKind::Auth,
            404 => ErrorKind::NotFound,
            409 => ErrorKind::Conflict,
            400..=499 => ErrorKind::Validation,
            _ => ErrorKind::Server,
        }
    }

    /// Get the error code for this kind.
    pub fn error_code(&self) -> &'static str {
        match self {
            ErrorKind::Validation => codes::VALIDATION_ERROR,
            ErrorKind::Auth => codes::UNAUTHORIZED,
            ErrorKind::NotFound => codes::NOT_FOUND,
            ErrorKind::Conflict => codes::CONFLICT,
            ErrorKind::Server => codes::SERVER_ERROR,
            ErrorKind::Network => codes::NETWORK_ERROR,
            ErrorKind::Cancelled => codes::CANCELLED,
        }
    }

    /// Human readable fallback used when the backend sends no message.
    pub fn default_message(&self, status: Option<u16>) -> &'static str {
        match (self, status) {
            (ErrorKind::Auth, Some(403)) => "You are not allowed to perform this action",
            (ErrorKind::Auth, _) => "Your session has expired, please sign in again",
            (ErrorKind::Validation, _) => "The request contains invalid data",
            (ErrorKind::NotFound, _) => "The requested resource was not found",
            (ErrorKind::Conflict, _) => "The resource already exists or was modified",
            (ErrorKind::Server, _) => "The server encountered an error, please try again later",
            (ErrorKind::Network, _) => "Unable to reach the server, check your connection",
            (ErrorKind::Cancelled, _) => "The operation was cancelled",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Auth => "auth",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Server => "server",
            ErrorKind::Network => "network",
            ErrorKind::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// Normalized error returned by the HTTP gateway.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayError {
    pub kind: ErrorKind,
    /// HTTP status when the server answered; `None` for network failures.
    pub status: Option<u16>,
    pub message: String,
    /// Set when a 401 survived the refresh-and-retry attempt.
    pub session_expired: bool,
}

impl GatewayError {
    /// Build an error from an HTTP error response and its (possibly empty) body.
    pub fn from_response(status: u16, body: &str) -> Self {
        let kind = ErrorKind::from_status(status);
        let message = extract_message(body)
            .unwrap_or_else(|| kind.default_message(Some(status)).to_string());

        Self {
            kind,
            status: Some(status),
            message,
            session_expired: false,
        }
    }

    /// No response was received.
    pub fn network(detail: impl fmt::Display) -> Self {
        tracing::warn!("Network failure: {}", detail);
        Self {
            kind: ErrorKind::Network,
            status: None,
            message: ErrorKind::Network.default_message(None).to_string(),
            session_expired: false,
        }
    }

    /// The server answered with a success status but an unreadable body.
    pub fn decode(detail: impl fmt::Display) -> Self {
        tracing::error!("Failed to decode response: {}", detail);
        Self {
            kind: ErrorKind::Server,
            status: None,
            message: "The server sent an unexpected response".to_string(),
            session_expired: false,
        }
    }

    /// Local persistence failed while preparing or finishing a call.
    pub fn storage(err: StorageError) -> Self {
        tracing::error!("Storage error: {}", err);
        Self {
            kind: ErrorKind::Server,
            status: None,
            message: err.to_string(),
            session_expired: false,
        }
    }

    pub fn cancelled() -> Self {
        Self {
            kind: ErrorKind::Cancelled,
            status: None,
            message: ErrorKind::Cancelled.default_message(None).to_string(),
            session_expired: false,
        }
    }

    /// The call needs a session and there is none.
    pub fn unauthenticated() -> Self {
        Self {
            kind: ErrorKind::Auth,
            status: None,
            message: "You need to sign in first".to_string(),
            session_expired: false,
        }
    }

    /// Rejected locally before any request was sent.
    pub fn rejected(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            status: None,
            message: message.into(),
            session_expired: false,
        }
    }

    /// True for a 401 that survived the refresh attempt.
    pub fn ends_session(&self) -> bool {
        self.session_expired
    }
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "{} ({}): {}", self.kind.error_code(), status, self.message),
            None => write!(f, "{}: {}", self.kind.error_code(), self.message),
        }
    }
}

impl std::error::Error for GatewayError {}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            GatewayError::decode(err)
        } else {
            GatewayError::network(err)
        }
    }
}

impl From<StorageError> for GatewayError {
    fn from(err: StorageError) -> Self {
        GatewayError::storage(err)
    }
}

/// Pull a human readable message out of a backend error body.
///
/// Prefers a `message` field (string or list of strings), then `error`.
pub fn extract_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;

    let from_field = |field: &serde_json::Value| -> Option<String> {
        match field {
            serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            serde_json::Value::Array(items) => {
                let parts: Vec<&str> = items.iter().filter_map(|i| i.as_str()).collect();
                if parts.is_empty() {
                    None
                } else {
                    Some(parts.join(", "))
                }
            }
            serde_json::Value::Object(obj) => obj
                .get("message")
                .and_then(|m| m.as_str())
                .map(str::to_string),
            _ => None,
        }
    };

    value
        .get("message")
        .and_then(from_field)
        .or_else(|| value.get("error").and_then(from_field))
}

/// Errors from the local session storage.
#[derive(Debug)]
pub enum StorageError {
    /// Database error
    Database(String),
    /// A stored value could not be (de)serialized
    Serialization(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::Database(msg) => write!(f, "storage database error: {}", msg),
            StorageError::Serialization(msg) => write!(f, "storage serialization error: {}", msg),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!("Database error: {:?}", err);
        StorageError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        tracing::error!("JSON error: {:?}", err);
        StorageError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ErrorKind::from_status(400), ErrorKind::Validation);
        assert_eq!(ErrorKind::from_status(422), ErrorKind::Validation);
        assert_eq!(ErrorKind::from_status(401), ErrorKind::Auth);
        assert_eq!(ErrorKind::from_status(403), ErrorKind::Auth);
        assert_eq!(ErrorKind::from_status(404), ErrorKind::NotFound);
        assert_eq!(ErrorKind::from_status(409), ErrorKind::Conflict);
        assert_eq!(ErrorKind::from_status(500), ErrorKind::Server);
        assert_eq!(ErrorKind::from_status(503), ErrorKind::Server);
    }

    #[test]
    fn test_message_prefers_message_field() {
        let body = r#"{"message":"Email already used","error":"Conflict"}"#;
        assert_eq!(extract_message(body).as_deref(), Some("Email already used"));
    }

    #[test]
    fn test_message_joins_field_errors() {
        let body = r#"{"message":["title should not be empty","dueDate must be a date"]}"#;
        assert_eq!(
            extract_message(body).as_deref(),
            Some("title should not be empty, dueDate must be a date")
        );
    }

    #[test]
    fn test_message_falls_back_to_default() {
        let err = GatewayError::from_response(500, "<html>oops</html>");
        assert_eq!(err.kind, ErrorKind::Server);
        assert_eq!(err.message, ErrorKind::Server.default_message(Some(500)));

        let err = GatewayError::from_response(404, "");
        assert_eq!(err.message, "The requested resource was not found");
    }

    #[test]
    fn test_network_error_has_no_status() {
        let err = GatewayError::network("connection refused");
        assert_eq!(err.kind, ErrorKind::Network);
        assert!(err.status.is_none());
        assert!(!err.ends_session());
    }

    #[test]
    fn test_plain_401_does_not_end_session() {
        // e.g. wrong password on /auth/login
        let err = GatewayError::from_response(401, r#"{"message":"Identifiants invalides"}"#);
        assert_eq!(err.kind, ErrorKind::Auth);
        assert!(!err.ends_session());
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::NotFound).unwrap();
        assert_eq!(json, "\"not_found\"");
    }
}
