// Error taxonomy for calls against the journal backend.
use http::StatusCode;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// No bearer token is stored; the call was not attempted.
    NotLoggedIn,
    /// Rejected locally before any request was made.
    Invalid(String),
    /// 401/404 on an authenticated call: the token or its user is gone.
    Unauthorized(StatusCode),
    /// Any other non-2xx answer. `message` is the server's `error` field, if any.
    Status {
        status: StatusCode,
        message: Option<String>,
    },
    /// Connection, TLS or transport failure.
    Network(String),
    /// 2xx answer whose body could not be decoded.
    Malformed(String),
}

impl ApiError {
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, ApiError::Unauthorized(_) | ApiError::NotLoggedIn)
    }

    /// Network and malformed-payload errors both degrade to cached data.
    pub fn is_transient(&self) -> bool {
        matches!(self, ApiError::Network(_) | ApiError::Malformed(_))
    }

    /// Short text suitable for a notice body.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::NotLoggedIn => "You are not logged in.".to_string(),
            ApiError::Invalid(msg) => msg.clone(),
            ApiError::Unauthorized(_) => "Your session has expired. Please log in again.".to_string(),
            ApiError::Status {
                message: Some(msg), ..
            } => msg.clone(),
            ApiError::Status { status, .. } => format!("Server answered {}.", status),
            ApiError::Network(_) => "Please check your internet connection.".to_string(),
            ApiError::Malformed(_) => "The server sent an unexpected response.".to_string(),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::NotLoggedIn => write!(f, "not logged in"),
            ApiError::Invalid(msg) => write!(f, "invalid request: {}", msg),
            ApiError::Unauthorized(status) => write!(f, "unauthorized ({})", status),
            ApiError::Status {
                status,
                message: Some(msg),
            } => write!(f, "server error {}: {}", status, msg),
            ApiError::Status {
                status,
                message: None,
            } => write!(f, "server error {}", status),
            ApiError::Network(e) => write!(f, "network error: {}", e),
            ApiError::Malformed(e) => write!(f, "malformed response: {}", e),
        }
    }
}

impl std::error::Error for ApiError {}
