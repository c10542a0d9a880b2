use std::fmt;

use http::StatusCode;

#[derive(Debug, Clone)]
pub enum ApiError {
    /// No session in the store; the call was refused before any network I/O.
    NotAuthenticated,
    MissingBaseUrl,
    MissingAuthorization,
    UnsupportedMethod(String),
    InvalidBaseUrl(String),
    InvalidInput(String),
    /// The upstream never produced a response. Carries no status code,
    /// which is what distinguishes it from an HTTP-level failure.
    Unreachable(String),
    /// The upstream answered with a non-2xx status.
    Http {
        status: StatusCode,
        status_text: String,
        message: String,
    },
    Decode(String),
    Store(String),
}

impl ApiError {
    pub fn http(status: StatusCode, message: impl Into<String>) -> Self {
        ApiError::Http {
            status,
            status_text: status.canonical_reason().unwrap_or("").to_string(),
            message: message.into(),
        }
    }

    /// Status code of the upstream response, if one was received.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_auth_error(&self) -> bool {
        match self {
            ApiError::NotAuthenticated => true,
            ApiError::Http { status, .. } => {
                *status == StatusCode::UNAUTHORIZED || *status == StatusCode::FORBIDDEN
            }
            _ => false,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::NotAuthenticated => write!(f, "Not authenticated"),
            ApiError::MissingBaseUrl => write!(f, "Missing X-Orchestrator-Base-URL header"),
            ApiError::MissingAuthorization => write!(f, "Missing Authorization header"),
            ApiError::UnsupportedMethod(m) => write!(f, "Unsupported method: {}", m),
            ApiError::InvalidBaseUrl(msg) => write!(f, "Invalid base URL: {}", msg),
            ApiError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            ApiError::Unreachable(msg) => write!(f, "Upstream unreachable: {}", msg),
            ApiError::Http { status, message, .. } => {
                write!(f, "API Error: {} - {}", status.as_u16(), message)
            }
            ApiError::Decode(msg) => write!(f, "Malformed upstream payload: {}", msg),
            ApiError::Store(msg) => write!(f, "Session store failure: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

pub type Result<T> = std::result::Result<T, ApiError>;
