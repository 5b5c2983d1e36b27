// src/error.rs

//! Unified error handling for the hunter application.

use std::fmt;

use thiserror::Error;

/// Result type alias for hunter operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Source page answered with a non-200 status
    #[error("HTTP status {status} from {url}")]
    HttpStatus { url: String, status: u16 },

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// A monitoring cycle could not complete
    #[error("Cycle error: {0}")]
    Cycle(String),
}

impl AppError {
    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create an error for a non-200 page response.
    pub fn fetch_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Create a cycle-level error.
    pub fn cycle(message: impl fmt::Display) -> Self {
        Self::Cycle(message.to_string())
    }

    /// Whether the error comes from talking to the source site.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Http(_) | Self::HttpStatus { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_status_is_transient() {
        let err = AppError::fetch_status("https://example.test/", 503);
        assert!(err.is_transient());
        assert_eq!(err.to_string(), "HTTP status 503 from https://example.test/");
    }

    #[test]
    fn test_config_is_not_transient() {
        assert!(!AppError::config("missing token").is_transient());
    }
}
