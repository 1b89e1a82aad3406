use reqwest::StatusCode;
use thiserror::Error;

pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong, please try again";
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid credentials";

/// Every failure the client can surface to a caller.
///
/// Errors are reported once, at the call site that triggered them. Only
/// [`ApiError::Unauthorized`] and [`ApiError::Forbidden`] carry extra meaning
/// for the session: when they come back from the profile fetch the session
/// is dropped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// A client-side form constraint failed; the request was never sent.
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Bad Request: {0}")]
    BadRequest(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Forbidden")]
    Forbidden,
    #[error("Not Found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    /// Any other non-success status, passed through unchanged.
    #[error("Request failed with status {status}: {message}")]
    Status { status: u16, message: String },
    /// Network failure, timeout or 5xx.
    #[error("Transport Error: {0}")]
    Transport(String),
    #[error("Decode Error: {0}")]
    Decode(String),
    #[error("Internal Error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::Validation(msg.into())
    }

    /// Map a failed HTTP exchange to an error, keeping whatever text the
    /// server sent.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let fallback = status.canonical_reason().unwrap_or(GENERIC_ERROR_MESSAGE);
        Self::from_status_or(status, body, fallback)
    }

    /// Like [`ApiError::from_status`], using `fallback` when the server sent
    /// no text of its own.
    pub fn from_status_or(status: StatusCode, body: &str, fallback: &str) -> Self {
        let message = server_message(body).unwrap_or_else(|| fallback.to_string());

        match status.as_u16() {
            400 => ApiError::BadRequest(message),
            401 => ApiError::Unauthorized,
            403 => ApiError::Forbidden,
            404 => ApiError::NotFound(message),
            409 => ApiError::Conflict(message),
            500..=599 => ApiError::Transport(format!("server returned {}: {}", status.as_u16(), message)),
            code => ApiError::Status { status: code, message },
        }
    }

    /// True for 401 and 403.
    pub fn is_auth(&self) -> bool {
        matches!(self, ApiError::Unauthorized | ApiError::Forbidden)
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::BadRequest(_) => Some(400),
            ApiError::Unauthorized => Some(401),
            ApiError::Forbidden => Some(403),
            ApiError::NotFound(_) => Some(404),
            ApiError::Conflict(_) => Some(409),
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Text suitable for a transient notification.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Validation(msg)
            | ApiError::BadRequest(msg)
            | ApiError::Conflict(msg)
            | ApiError::NotFound(msg) => msg.clone(),
            ApiError::Status { message, .. } => message.clone(),
            ApiError::Unauthorized | ApiError::Forbidden => INVALID_CREDENTIALS_MESSAGE.to_string(),
            ApiError::Transport(_) | ApiError::Decode(_) | ApiError::Internal(_) => {
                GENERIC_ERROR_MESSAGE.to_string()
            }
        }
    }
}

/// Pull a readable message out of an error body. The API answers with plain
/// text on some routes and `{"error": ...}` / `{"message": ...}` on others.
fn server_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        if let Some(text) = value.as_str() {
            return Some(text.to_string());
        }
        for key in ["error", "message"] {
            if let Some(text) = value.get(key).and_then(|v| v.as_str()) {
                return Some(text.to_string());
            }
        }
    }

    Some(trimmed.to_string())
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode(err.to_string())
    }
}

// Store failures surface as internal errors
impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(err.to_string())
    }
}
