//! Application error types

use thiserror::Error;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Quote provider error: {0}")]
    Quote(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Refresh task '{id}' failed: {message}")]
    Task { id: String, message: String },

    #[error("Invalid refresh interval: {0}s")]
    InvalidInterval(u64),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            AppError::InvalidInterval(7).to_string(),
            "Invalid refresh interval: 7s"
        );

        let err = AppError::Task {
            id: "holdings".to_string(),
            message: "timeout".to_string(),
        };
        assert_eq!(err.to_string(), "Refresh task 'holdings' failed: timeout");

        let err: AppError = serde_json::from_str::<u64>("nope").unwrap_err().into();
        assert!(matches!(err, AppError::Serialization(_)));
    }
}
