//! Error types module
//!
//! All errors are unified under the `AppError` enum, which covers database,
//! authorization, and extraction-pipeline failures. Each variant carries
//! enough metadata (via `ErrorMetadata`) for the HTTP layer to render a
//! consistent structured response without inspecting the variant itself.

use std::io;

use sqlx::Error as SqlxError;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented.
/// This trait allows errors to self-describe their HTTP response characteristics.
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "UNSUPPORTED_FORMAT")
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
    #[error("Database error: {0}")]
    Database(#[source] SqlxError),

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("Content extraction failed: {0}")]
    Extraction(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Extraction service error (status {status:?}): {body}")]
    ExternalService { status: Option<u16>, body: String },

    #[error("Failed to parse extraction response: {0}")]
    ResponseParse(String),

    #[error("Already processed: {0}")]
    AlreadyProcessed(String),

    #[error("Not yet processed: {0}")]
    NotYetProcessed(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("File too large: {0}")]
    PayloadTooLarge(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl From<SqlxError> for AppError {
    fn from(err: SqlxError) -> Self {
        AppError::Database(err)
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

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidInput(format!("JSON parsing error: {}", err))
    }
}

impl From<uuid::Error> for AppError {
    fn from(err: uuid::Error) -> Self {
        AppError::InvalidInput(format!("UUID parsing error: {}", err))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::InvalidInput(format!("Validation error: {}", err))
    }
}

/// Static metadata for each variant: (http_status, error_code, recoverable, suggested_action, sensitive, log_level).
/// client_message stays per-variant for dynamic content.
fn app_error_static_metadata(
    err: &AppError,
) -> (
    u16,
    &'static str,
    bool,
    Option<&'static str>,
    bool,
    LogLevel,
) {
    match err {
        AppError::Database(_) => (
            500,
            "DATABASE_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::UnsupportedFormat(_) => (
            400,
            "UNSUPPORTED_FORMAT",
            false,
            Some("Upload a JPEG, PNG, PDF, Excel, or CSV file"),
            false,
            LogLevel::Debug,
        ),
        AppError::Extraction(_) => (
            400,
            "EXTRACTION_FAILED",
            false,
            Some("Check that the file is not corrupted and try a different file"),
            false,
            LogLevel::Warn,
        ),
        AppError::Configuration(_) => (
            500,
            "CONFIGURATION_ERROR",
            false,
            Some("Contact the operator; the service is misconfigured"),
            true,
            LogLevel::Error,
        ),
        AppError::ExternalService { .. } => (
            502,
            "EXTERNAL_SERVICE_ERROR",
            true,
            Some("Retry the extraction after a short delay"),
            false,
            LogLevel::Warn,
        ),
        AppError::ResponseParse(_) => (
            502,
            "RESPONSE_PARSE_ERROR",
            true,
            Some("Retry the extraction; the raw reply was kept for inspection"),
            false,
            LogLevel::Warn,
        ),
        AppError::AlreadyProcessed(_) => (
            409,
            "ALREADY_PROCESSED",
            false,
            Some("Fetch the stored extraction result instead"),
            false,
            LogLevel::Debug,
        ),
        AppError::NotYetProcessed(_) => (
            409,
            "NOT_YET_PROCESSED",
            false,
            Some("Run extraction on the document first"),
            false,
            LogLevel::Debug,
        ),
        AppError::InvalidInput(_) => (
            400,
            "INVALID_INPUT",
            false,
            Some("Check request parameters and try again"),
            false,
            LogLevel::Debug,
        ),
        AppError::BadRequest(_) => (
            400,
            "BAD_REQUEST",
            false,
            Some("Check request format and parameters"),
            false,
            LogLevel::Debug,
        ),
        AppError::NotFound(_) => (
            404,
            "NOT_FOUND",
            false,
            Some("Verify the resource ID exists"),
            false,
            LogLevel::Debug,
        ),
        AppError::Unauthorized(_) => (
            401,
            "UNAUTHORIZED",
            false,
            Some("Check authentication token"),
            false,
            LogLevel::Debug,
        ),
        AppError::Forbidden(_) => (
            403,
            "FORBIDDEN",
            false,
            Some("This account's role does not permit the operation"),
            false,
            LogLevel::Debug,
        ),
        AppError::PayloadTooLarge(_) => (
            413,
            "PAYLOAD_TOO_LARGE",
            false,
            Some("Reduce file size"),
            false,
            LogLevel::Debug,
        ),
        AppError::Internal(_) => (
            500,
            "INTERNAL_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::InternalWithSource { .. } => (
            500,
            "INTERNAL_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
    }
}

impl AppError {
    /// Get the error type name for detailed error responses
    pub fn error_type(&self) -> &str {
        match self {
            AppError::Database(_) => "Database",
            AppError::UnsupportedFormat(_) => "UnsupportedFormat",
            AppError::Extraction(_) => "Extraction",
            AppError::Configuration(_) => "Configuration",
            AppError::ExternalService { .. } => "ExternalService",
            AppError::ResponseParse(_) => "ResponseParse",
            AppError::AlreadyProcessed(_) => "AlreadyProcessed",
            AppError::NotYetProcessed(_) => "NotYetProcessed",
            AppError::InvalidInput(_) => "InvalidInput",
            AppError::BadRequest(_) => "BadRequest",
            AppError::NotFound(_) => "NotFound",
            AppError::Unauthorized(_) => "Unauthorized",
            AppError::Forbidden(_) => "Forbidden",
            AppError::PayloadTooLarge(_) => "PayloadTooLarge",
            AppError::Internal(_) => "Internal",
            AppError::InternalWithSource { .. } => "Internal",
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

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).2
    }

    fn suggested_action(&self) -> Option<&'static str> {
        app_error_static_metadata(self).3
    }

    fn is_sensitive(&self) -> bool {
        app_error_static_metadata(self).4
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).5
    }

    fn client_message(&self) -> String {
        match self {
            AppError::Database(_) => "Failed to access database".to_string(),
            AppError::UnsupportedFormat(ref msg) => {
                format!("Unsupported file format: {}", msg)
            }
            AppError::Extraction(ref msg) => msg.clone(),
            AppError::Configuration(_) => {
                "Extraction service is not configured".to_string()
            }
            AppError::ExternalService { status, .. } => match status {
                Some(code) => format!("Extraction service call failed with status {}", code),
                None => "Extraction service is unreachable".to_string(),
            },
            AppError::ResponseParse(_) => {
                "Could not interpret the extraction service reply".to_string()
            }
            AppError::AlreadyProcessed(ref msg) => msg.clone(),
            AppError::NotYetProcessed(ref msg) => msg.clone(),
            AppError::InvalidInput(ref msg) => msg.clone(),
            AppError::BadRequest(ref msg) => msg.clone(),
            AppError::NotFound(ref msg) => msg.clone(),
            AppError::Unauthorized(ref msg) => msg.clone(),
            AppError::Forbidden(ref msg) => msg.clone(),
            AppError::PayloadTooLarge(ref msg) => msg.clone(),
            AppError::Internal(_) => "Internal server error".to_string(),
            AppError::InternalWithSource { .. } => "Internal server error".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_metadata_database() {
        let err = AppError::from(sqlx::Error::PoolClosed);
        assert_eq!(err.http_status_code(), 500);
        assert_eq!(err.error_code(), "DATABASE_ERROR");
        assert!(err.is_recoverable());
        assert_eq!(err.client_message(), "Failed to access database");
        assert!(err.is_sensitive());
        assert_eq!(err.log_level(), LogLevel::Error);
    }

    #[test]
    fn test_error_metadata_unsupported_format() {
        let err = AppError::UnsupportedFormat(".docx".to_string());
        assert_eq!(err.http_status_code(), 400);
        assert_eq!(err.error_code(), "UNSUPPORTED_FORMAT");
        assert!(!err.is_recoverable());
        assert!(err.client_message().contains(".docx"));
        assert_eq!(err.log_level(), LogLevel::Debug);
    }

    #[test]
    fn test_error_metadata_external_service() {
        let err = AppError::ExternalService {
            status: Some(400),
            body: "bad request".to_string(),
        };
        assert_eq!(err.http_status_code(), 502);
        assert_eq!(err.error_code(), "EXTERNAL_SERVICE_ERROR");
        assert!(err.is_recoverable());
        assert!(err.client_message().contains("400"));
        // upstream body must not leak into the client message
        assert!(!err.client_message().contains("bad request"));
    }

    #[test]
    fn test_error_metadata_state_conflicts() {
        let err = AppError::AlreadyProcessed("Document already processed".to_string());
        assert_eq!(err.http_status_code(), 409);
        assert!(!err.is_recoverable());

        let err = AppError::NotYetProcessed("Document has not been processed yet".to_string());
        assert_eq!(err.http_status_code(), 409);
        assert_eq!(err.error_code(), "NOT_YET_PROCESSED");
    }

    #[test]
    fn test_error_metadata_configuration_is_sensitive() {
        let err = AppError::Configuration("EXTRACTION_API_KEY is not set".to_string());
        assert_eq!(err.http_status_code(), 500);
        assert!(err.is_sensitive());
        // env var name must not reach the client
        assert!(!err.client_message().contains("EXTRACTION_API_KEY"));
    }
}
