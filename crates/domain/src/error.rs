//! Shared error taxonomy (§7) used across all n8n-mcp-gateway crates.
//!
//! The variants mirror the stable "error kind" table from the spec rather
//! than any particular transport's status codes — `n8n-mcp-protocol` maps
//! these onto the tool-call envelope, and `n8n-mcp-restclient` maps host
//! HTTP responses onto them.

/// Machine-readable error code surfaced in tool-call envelopes and log
/// fields. Stable across releases — callers may match on this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InputInvalid,
    NotConfigured,
    ApiError,
    NotFound,
    AuthError,
    Transport,
    ValidationFailure,
    DiffFailure,
    Internal,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = serde_json::to_value(self)
            .ok()
            .and_then(|v| v.as_str().map(String::from))
            .unwrap_or_else(|| "INTERNAL".to_string());
        write!(f, "{s}")
    }
}

/// Shared error type used across all n8n-mcp-gateway crates.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid input: {0}")]
    InputInvalid(String),

    #[error("no client configured: {0}")]
    NotConfigured(String),

    #[error("host API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("validation failed: {0}")]
    ValidationFailure(String),

    #[error("diff operation {index} failed: {reason}")]
    DiffFailure { index: usize, reason: String },

    #[error("config: {0}")]
    Config(String),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// The stable machine-readable code for this error (§7).
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::InputInvalid(_) => ErrorCode::InputInvalid,
            Error::NotConfigured(_) => ErrorCode::NotConfigured,
            Error::Api { .. } => ErrorCode::ApiError,
            Error::NotFound(_) => ErrorCode::NotFound,
            Error::Auth(_) => ErrorCode::AuthError,
            Error::Transport(_) => ErrorCode::Transport,
            Error::ValidationFailure(_) => ErrorCode::ValidationFailure,
            Error::DiffFailure { .. } => ErrorCode::DiffFailure,
            Error::Config(_) | Error::Json(_) | Error::Io(_) | Error::Internal(_) => {
                ErrorCode::Internal
            }
        }
    }

    /// Whether this error kind may be retried by the REST client (§7):
    /// transport failures and 5xx host errors, never 4xx or auth failures.
    pub fn is_retriable(&self) -> bool {
        match self {
            Error::Transport(_) => true,
            Error::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
