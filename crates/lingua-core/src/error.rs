//! Error types module
//!
//! Every service operation fails with exactly one `AppError` variant. The variants map
//! onto a small taxonomy (`ErrorKind`) that adapters translate into protocol signals.
//!
//! The `StorageUnavailable` variant carries a `sqlx::Error` and `From<sqlx::Error>` is
//! gated behind the `sqlx` feature. Without it the variant holds a plain message.

#[cfg(feature = "sqlx")]
use sqlx::Error as SqlxError;

use crate::models::MessageStatus;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like permission denials
    Debug,
    /// Warning level - for rejected business operations and races
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Taxonomy kind of an error, independent of the message it carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Unauthorized,
    Conflict,
    InvalidStatusTransition,
    BusinessRuleViolation,
    StorageUnavailable,
    InvalidInput,
    Internal,
}

/// Metadata for error responses - defines how an error should be presented.
/// Adapters use this to translate errors into their protocol without matching variants.
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "NOT_FOUND")
    fn error_code(&self) -> &'static str;

    /// Whether this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the client
    fn suggested_action(&self) -> Option<&'static str>;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether details should be hidden in production
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid status transition: cannot move from {from} to {to}")]
    InvalidStatusTransition {
        from: MessageStatus,
        to: MessageStatus,
    },

    #[error("Business rule violation: {0}")]
    BusinessRuleViolation(String),

    #[cfg(feature = "sqlx")]
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(#[source] SqlxError),

    #[cfg(not(feature = "sqlx"))]
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl AppError {
    pub fn not_found(entity: &str, id: impl std::fmt::Display) -> Self {
        AppError::NotFound(format!("{} {} not found", entity, id))
    }

    /// Taxonomy kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::Unauthorized(_) => ErrorKind::Unauthorized,
            AppError::Conflict(_) => ErrorKind::Conflict,
            AppError::InvalidStatusTransition { .. } => ErrorKind::InvalidStatusTransition,
            AppError::BusinessRuleViolation(_) => ErrorKind::BusinessRuleViolation,
            AppError::StorageUnavailable(_) => ErrorKind::StorageUnavailable,
            AppError::InvalidInput(_) => ErrorKind::InvalidInput,
            AppError::InternalWithSource { .. } => ErrorKind::Internal,
        }
    }

    /// Get detailed error information including error chain
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

// SQLSTATE codes the store relies on
#[cfg(feature = "sqlx")]
const UNIQUE_VIOLATION: &str = "23505";
#[cfg(feature = "sqlx")]
const FOREIGN_KEY_VIOLATION: &str = "23503";
#[cfg(feature = "sqlx")]
const SERIALIZATION_FAILURE: &str = "40001";
#[cfg(feature = "sqlx")]
const DEADLOCK_DETECTED: &str = "40P01";

#[cfg(feature = "sqlx")]
impl From<SqlxError> for AppError {
    fn from(err: SqlxError) -> Self {
        if let SqlxError::Database(ref db_err) = err {
            match db_err.code().as_deref() {
                Some(UNIQUE_VIOLATION) => {
                    return AppError::Conflict(format!(
                        "unique constraint {} violated",
                        db_err.constraint().unwrap_or("unknown")
                    ));
                }
                Some(SERIALIZATION_FAILURE) | Some(DEADLOCK_DETECTED) => {
                    return AppError::Conflict(
                        "concurrent modification detected, retry the operation".to_string(),
                    );
                }
                Some(FOREIGN_KEY_VIOLATION) => {
                    return AppError::NotFound(format!(
                        "referenced row missing ({})",
                        db_err.constraint().unwrap_or("unknown")
                    ));
                }
                _ => {}
            }
        }
        AppError::StorageUnavailable(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::InvalidInput(format!("Validation error: {}", err))
    }
}

/// Static metadata for each kind: (http_status, error_code, recoverable, suggested_action, sensitive, log_level).
fn kind_static_metadata(
    kind: ErrorKind,
) -> (
    u16,
    &'static str,
    bool,
    Option<&'static str>,
    bool,
    LogLevel,
) {
    match kind {
        ErrorKind::NotFound => (
            404,
            "NOT_FOUND",
            false,
            Some("Verify the resource ID exists"),
            false,
            LogLevel::Debug,
        ),
        ErrorKind::Unauthorized => (
            403,
            "UNAUTHORIZED",
            false,
            Some("Ask a project administrator for a higher role"),
            false,
            LogLevel::Debug,
        ),
        ErrorKind::Conflict => (
            409,
            "CONFLICT",
            true,
            Some("Reload the resource and retry"),
            false,
            LogLevel::Warn,
        ),
        ErrorKind::InvalidStatusTransition => (
            422,
            "INVALID_STATUS_TRANSITION",
            false,
            Some("Only pending messages can be reviewed"),
            false,
            LogLevel::Debug,
        ),
        ErrorKind::BusinessRuleViolation => (
            422,
            "BUSINESS_RULE_VIOLATION",
            false,
            None,
            false,
            LogLevel::Warn,
        ),
        ErrorKind::StorageUnavailable => (
            503,
            "STORAGE_UNAVAILABLE",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        ErrorKind::InvalidInput => (
            400,
            "INVALID_INPUT",
            false,
            Some("Check request parameters and try again"),
            false,
            LogLevel::Debug,
        ),
        ErrorKind::Internal => (
            500,
            "INTERNAL_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        kind_static_metadata(self.kind()).0
    }

    fn error_code(&self) -> &'static str {
        kind_static_metadata(self.kind()).1
    }

    fn is_recoverable(&self) -> bool {
        kind_static_metadata(self.kind()).2
    }

    fn suggested_action(&self) -> Option<&'static str> {
        kind_static_metadata(self.kind()).3
    }

    fn is_sensitive(&self) -> bool {
        kind_static_metadata(self.kind()).4
    }

    fn log_level(&self) -> LogLevel {
        kind_static_metadata(self.kind()).5
    }

    fn client_message(&self) -> String {
        match self {
            AppError::NotFound(ref msg) => msg.clone(),
            AppError::Unauthorized(ref msg) => msg.clone(),
            AppError::Conflict(ref msg) => msg.clone(),
            AppError::InvalidStatusTransition { from, to } => {
                format!("Cannot transition message from {} to {}", from, to)
            }
            AppError::BusinessRuleViolation(ref msg) => msg.clone(),
            AppError::StorageUnavailable(_) => "Failed to access storage".to_string(),
            AppError::InvalidInput(ref msg) => msg.clone(),
            AppError::InternalWithSource { .. } => "Internal server error".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_metadata_storage_unavailable() {
        #[cfg(feature = "sqlx")]
        let err = AppError::from(sqlx::Error::PoolClosed);
        #[cfg(not(feature = "sqlx"))]
        let err = AppError::StorageUnavailable("pool closed".to_string());
        assert_eq!(err.kind(), ErrorKind::StorageUnavailable);
        assert_eq!(err.http_status_code(), 503);
        assert_eq!(err.error_code(), "STORAGE_UNAVAILABLE");
        assert!(err.is_recoverable());
        assert_eq!(err.client_message(), "Failed to access storage");
        assert!(err.is_sensitive());
        assert_eq!(err.log_level(), LogLevel::Error);
    }

    #[cfg(feature = "sqlx")]
    #[test]
    fn test_row_not_found_is_not_mistaken_for_not_found() {
        let err = AppError::from(sqlx::Error::RowNotFound);
        assert_eq!(err.kind(), ErrorKind::StorageUnavailable);
    }

    #[test]
    fn test_error_metadata_not_found() {
        let err = AppError::not_found("Message", "abc");
        assert_eq!(err.http_status_code(), 404);
        assert_eq!(err.error_code(), "NOT_FOUND");
        assert!(!err.is_recoverable());
        assert_eq!(err.client_message(), "Message abc not found");
        assert_eq!(err.log_level(), LogLevel::Debug);
    }

    #[test]
    fn test_error_metadata_invalid_status_transition() {
        let err = AppError::InvalidStatusTransition {
            from: MessageStatus::Approved,
            to: MessageStatus::Approved,
        };
        assert_eq!(err.kind(), ErrorKind::InvalidStatusTransition);
        assert_eq!(err.http_status_code(), 422);
        assert!(err.client_message().contains("APPROVED"));
    }

    #[test]
    fn test_error_metadata_status_codes_per_kind() {
        assert_eq!(
            AppError::Unauthorized("x".to_string()).http_status_code(),
            403
        );
        assert_eq!(AppError::Conflict("x".to_string()).http_status_code(), 409);
        assert_eq!(
            AppError::BusinessRuleViolation("x".to_string()).http_status_code(),
            422
        );
        assert_eq!(
            AppError::InvalidInput("x".to_string()).http_status_code(),
            400
        );
    }

    #[test]
    fn test_detailed_message_includes_source_chain() {
        let err = AppError::from(anyhow::anyhow!("snapshot encoding failed"));
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert!(err.detailed_message().contains("snapshot encoding failed"));
    }
}
