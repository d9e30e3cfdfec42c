use thiserror::Error;

/// Application-level errors
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Analysis error: {0}")]
    Analysis(#[from] AnalysisError),

    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Persistent key-value store errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database connection failed: {message}")]
    Connection { message: String },

    #[error("Query failed: {message}")]
    Query { message: String },

    #[error("Migration failed: {message}")]
    Migration { message: String },

    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("SQLx error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

/// Gemini API transport errors
#[derive(Debug, Error)]
pub enum GeminiError {
    #[error("API error: {status} - {message}")]
    Api {
        status: u16,
        /// Google status string, e.g. `RESOURCE_EXHAUSTED`.
        code: Option<String>,
        /// `ErrorInfo.reason` from the error details, e.g. `API_KEY_INVALID`.
        reason: Option<String>,
        message: String,
    },

    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },

    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Failures of the content analysis pipeline.
///
/// Every kind is terminal for the current request. None of them touch the
/// history or credential state.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("No API key available: set a user key or configure GEMINI_API_KEY")]
    CredentialMissing,

    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("Transport error: {0}")]
    Transport(#[from] GeminiError),

    #[error("Model returned an empty response")]
    EmptyResponse,

    #[error("Malformed model response: {message}")]
    MalformedResponse { message: String },
}

/// Coarse classification of a transport failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportFailure {
    /// The service rejected the key.
    CredentialRejected,
    /// The key is valid but its quota is used up.
    QuotaExhausted,
    Timeout,
    Unavailable,
}

impl TransportFailure {
    /// True for the "invalid or exhausted key" sub-case.
    pub fn is_credential_related(self) -> bool {
        matches!(
            self,
            TransportFailure::CredentialRejected | TransportFailure::QuotaExhausted
        )
    }
}

/// Classify a transport error.
///
/// Structured fields (HTTP status, Google status, error reason) are checked
/// first. The message is only inspected when none of them identifies the
/// failure.
pub fn classify_transport(err: &GeminiError) -> TransportFailure {
    match err {
        GeminiError::Timeout { .. } => TransportFailure::Timeout,
        GeminiError::Api {
            status,
            code,
            reason,
            message,
        } => classify_structured(*status, code.as_deref(), reason.as_deref())
            .unwrap_or_else(|| classify_message(message)),
        GeminiError::Http(e) if e.is_timeout() => TransportFailure::Timeout,
        GeminiError::Http(e) => match e.status() {
            Some(status) => classify_structured(status.as_u16(), None, None)
                .unwrap_or_else(|| classify_message(&e.to_string())),
            None => classify_message(&e.to_string()),
        },
        GeminiError::InvalidResponse { .. } => TransportFailure::Unavailable,
    }
}

fn classify_structured(
    status: u16,
    code: Option<&str>,
    reason: Option<&str>,
) -> Option<TransportFailure> {
    match reason {
        Some("API_KEY_INVALID") | Some("API_KEY_EXPIRED") | Some("API_KEY_SERVICE_BLOCKED") => {
            return Some(TransportFailure::CredentialRejected)
        }
        Some("RATE_LIMIT_EXCEEDED") => return Some(TransportFailure::QuotaExhausted),
        _ => {}
    }

    match code {
        Some("UNAUTHENTICATED") | Some("PERMISSION_DENIED") => {
            return Some(TransportFailure::CredentialRejected)
        }
        Some("RESOURCE_EXHAUSTED") => return Some(TransportFailure::QuotaExhausted),
        Some("DEADLINE_EXCEEDED") => return Some(TransportFailure::Timeout),
        _ => {}
    }

    match status {
        401 | 403 => Some(TransportFailure::CredentialRejected),
        429 => Some(TransportFailure::QuotaExhausted),
        408 | 504 => Some(TransportFailure::Timeout),
        500..=599 => Some(TransportFailure::Unavailable),
        _ => None,
    }
}

/// Last-resort substring check for errors that carry no usable code.
fn classify_message(message: &str) -> TransportFailure {
    let lower = message.to_lowercase();
    if lower.contains("api key") || lower.contains("403") {
        TransportFailure::CredentialRejected
    } else if lower.contains("quota") {
        TransportFailure::QuotaExhausted
    } else {
        TransportFailure::Unavailable
    }
}

impl AnalysisError {
    /// Message suitable for showing to the user.
    ///
    /// Derived from the error kind only; raw service bodies and parser
    /// output stay in the logs.
    pub fn user_message(&self) -> &'static str {
        match self {
            AnalysisError::CredentialMissing => {
                "No API key configured. Run `deepread key set <KEY>` or set GEMINI_API_KEY."
            }
            AnalysisError::InvalidInput { .. } => "Please enter a link or some text to analyze.",
            AnalysisError::Transport(e) => match classify_transport(e) {
                TransportFailure::CredentialRejected | TransportFailure::QuotaExhausted => {
                    "The API key is invalid or its quota is exhausted. Please check your key settings."
                }
                TransportFailure::Timeout => {
                    "The model service did not respond in time. Please try again."
                }
                TransportFailure::Unavailable => {
                    "The model service request failed. Please try again later."
                }
            },
            AnalysisError::EmptyResponse => "The model returned no content. Please try again.",
            AnalysisError::MalformedResponse { .. } => {
                "The content was inaccessible or the analysis came back malformed. Try pasting the raw text instead."
            }
        }
    }
}

impl AppError {
    /// Message suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Analysis(e) => e.user_message().to_string(),
            AppError::Storage(_) => "Local storage could not be read or written.".to_string(),
            other => other.to_string(),
        }
    }
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

/// Result type alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Result type alias for Gemini operations
pub type GeminiResult<T> = Result<T, GeminiError>;
