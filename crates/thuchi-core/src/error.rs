//! Error types for thuchi-core
//!
//! Remote failures are collected into `CoreError` values carrying a
//! user-facing (Vietnamese) message. Nothing in the client panics or
//! propagates transport errors past its boundary.

use thiserror::Error;
use serde::{Deserialize, Serialize};
use std::io;

/// Generic message when the remote store rejects a call without saying why
pub const GENERIC_REMOTE_FAILURE: &str = "Thao tác không thành công";

/// Error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Fetching the table failed
    FetchFailed,
    /// Editing a row failed
    UpdateFailed,
    /// Deleting a row failed
    DeleteFailed,
    /// Transaction not found in the current collection
    TransactionNotFound,
    /// Wrong passcode
    InvalidPasscode,
    /// Operation needs a logged-in session
    NotLoggedIn,
    /// IO error
    IoError,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCode::FetchFailed => write!(f, "FETCH_FAILED"),
            ErrorCode::UpdateFailed => write!(f, "UPDATE_FAILED"),
            ErrorCode::DeleteFailed => write!(f, "DELETE_FAILED"),
            ErrorCode::TransactionNotFound => write!(f, "TRANSACTION_NOT_FOUND"),
            ErrorCode::InvalidPasscode => write!(f, "INVALID_PASSCODE"),
            ErrorCode::NotLoggedIn => write!(f, "NOT_LOGGED_IN"),
            ErrorCode::IoError => write!(f, "IO_ERROR"),
        }
    }
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetails {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    /// Suggestions for resolution
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

impl ErrorDetails {
    /// Create a new error detail
    pub fn new(code: ErrorCode, message: String) -> Self {
        Self {
            code,
            message,
            details: None,
            suggestions: vec![],
        }
    }

    /// Add detail information
    pub fn with_detail(mut self, detail: serde_json::Value) -> Self {
        self.details = Some(detail);
        self
    }

    /// Add a suggestion
    pub fn with_suggestion(mut self, suggestion: String) -> Self {
        self.suggestions.push(suggestion);
        self
    }
}

impl std::fmt::Display for ErrorDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(ref details) = self.details {
            write!(f, "\nDetails: {}", details)?;
        }
        if !self.suggestions.is_empty() {
            write!(f, "\nSuggestions:")?;
            for suggestion in &self.suggestions {
                write!(f, "\n  - {}", suggestion)?;
            }
        }
        Ok(())
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "info"),
            ErrorSeverity::Warning => write!(f, "warning"),
            ErrorSeverity::Error => write!(f, "error"),
        }
    }
}

/// What went wrong talking to the remote table
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RemoteError {
    /// Connection, TLS or request-building failure
    #[error("{message}")]
    Transport { message: String },

    /// Non-2xx response
    #[error("HTTP error! status: {status}")]
    Status { status: u16 },

    /// 2xx response whose body reports a failure
    #[error("{}", .message.as_deref().unwrap_or(GENERIC_REMOTE_FAILURE))]
    Rejected { message: Option<String> },

    /// Body could not be read as the expected JSON
    #[error("Invalid response: {message}")]
    Decode { message: String },
}

/// Main error type for thuchi-core
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Lỗi tải dữ liệu: {source}")]
    FetchFailed { source: RemoteError },

    #[error("Lỗi cập nhật: {source}")]
    UpdateFailed { source: RemoteError },

    #[error("Lỗi xóa: {source}")]
    DeleteFailed { source: RemoteError },

    #[error("Không tìm thấy giao dịch: {id}")]
    TransactionNotFound { id: String },

    #[error("Mật mã không đúng!")]
    InvalidPasscode,

    #[error("Chưa đăng nhập")]
    NotLoggedIn,

    #[error("IO error: {message}")]
    IoError { message: String },
}

impl CoreError {
    /// Get the error code
    pub fn code(&self) -> ErrorCode {
        match self {
            CoreError::FetchFailed { .. } => ErrorCode::FetchFailed,
            CoreError::UpdateFailed { .. } => ErrorCode::UpdateFailed,
            CoreError::DeleteFailed { .. } => ErrorCode::DeleteFailed,
            CoreError::TransactionNotFound { .. } => ErrorCode::TransactionNotFound,
            CoreError::InvalidPasscode => ErrorCode::InvalidPasscode,
            CoreError::NotLoggedIn => ErrorCode::NotLoggedIn,
            CoreError::IoError { .. } => ErrorCode::IoError,
        }
    }

    /// Get the severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            CoreError::FetchFailed { .. } => ErrorSeverity::Error,
            CoreError::UpdateFailed { .. } => ErrorSeverity::Error,
            CoreError::DeleteFailed { .. } => ErrorSeverity::Error,
            CoreError::TransactionNotFound { .. } => ErrorSeverity::Info,
            CoreError::InvalidPasscode => ErrorSeverity::Warning,
            CoreError::NotLoggedIn => ErrorSeverity::Info,
            CoreError::IoError { .. } => ErrorSeverity::Error,
        }
    }

    /// Underlying remote failure, if any
    pub fn remote(&self) -> Option<&RemoteError> {
        match self {
            CoreError::FetchFailed { source }
            | CoreError::UpdateFailed { source }
            | CoreError::DeleteFailed { source } => Some(source),
            _ => None,
        }
    }

    /// Convert to detailed error info
    pub fn to_details(&self) -> ErrorDetails {
        let mut details = ErrorDetails::new(self.code(), self.to_string());

        match self.remote() {
            Some(RemoteError::Status { status }) => {
                details = details.with_detail(serde_json::json!({ "status": status }));
                if *status == 401 || *status == 403 {
                    details = details.with_suggestion(
                        "Check remote.access_key and remote.app_id.".to_string()
                    );
                }
            }
            Some(RemoteError::Transport { .. }) => {
                details = details.with_suggestion(
                    "Check the network connection and try again.".to_string()
                );
            }
            Some(RemoteError::Decode { message }) => {
                details = details.with_detail(serde_json::json!({ "decode_message": message }));
            }
            _ => {}
        }

        details
    }
}

/// Result type with CoreError
pub type CoreResult<T> = Result<T, CoreError>;

impl From<io::Error> for CoreError {
    fn from(error: io::Error) -> Self {
        CoreError::IoError { message: error.to_string() }
    }
}

/// Error context for reporting
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// Operation being performed
    pub operation: String,
    /// Transaction involved, if any
    pub transaction_id: Option<String>,
}

impl ErrorContext {
    /// Create a new error context
    pub fn new(operation: &str) -> Self {
        Self {
            operation: operation.to_string(),
            transaction_id: None,
        }
    }

    /// Add the transaction id
    pub fn with_transaction(mut self, id: &str) -> Self {
        self.transaction_id = Some(id.to_string());
        self
    }
}

/// Error logger trait
pub trait ErrorLogger: Send + Sync {
    /// Log an error
    fn log_error(&self, error: &CoreError, context: &ErrorContext);
}

/// Default error logger using log crate
#[derive(Default)]
pub struct DefaultErrorLogger;

impl ErrorLogger for DefaultErrorLogger {
    fn log_error(&self, error: &CoreError, context: &ErrorContext) {
        match error.severity() {
            ErrorSeverity::Error => log::error!(
                target: "thuchi::error",
                "[{}] {} - Operation: {} - Transaction: {:?}",
                error.code(),
                error,
                context.operation,
                context.transaction_id
            ),
            ErrorSeverity::Warning => log::warn!(
                target: "thuchi::error",
                "[{}] {} - Operation: {}",
                error.code(),
                error,
                context.operation
            ),
            ErrorSeverity::Info => log::info!(
                target: "thuchi::error",
                "[{}] {} - Operation: {}",
                error.code(),
                error,
                context.operation
            ),
        }
    }
}

// ==================== Tests ====================
