// src/error.rs

//! Unified error handling for the results crawler.

use std::fmt;

use thiserror::Error;

/// Result type alias for crawler operations.
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

    /// A page or PDF could not be retrieved
    #[error("Fetch error for {source_id}: {message}")]
    SourceFetch { source_id: String, message: String },

    /// A page or chunk did not have the expected shape
    #[error("Parse error in {context}: {message}")]
    Parse { context: String, message: String },

    /// Destination already holds data and append was not requested
    #[error("Destination {0} already exists; use append to merge into it")]
    Conflict(String),

    /// Persisted input is not valid result data
    #[error("Malformed data in {origin}: {message}")]
    MalformedData { origin: String, message: String },

    /// Criteria key outside the recognized field list
    #[error("Unknown criterion '{0}'")]
    UnknownCriterion(String),
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

    /// Create a fetch error for a single source item.
    pub fn fetch(source_id: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::SourceFetch {
            source_id: source_id.into(),
            message: message.to_string(),
        }
    }

    /// Create a parse error with context.
    pub fn parse(context: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Parse {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Create a malformed data error.
    pub fn malformed(origin: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::MalformedData {
            origin: origin.into(),
            message: message.to_string(),
        }
    }

    /// Whether this error only affects the source item that raised it.
    ///
    /// Isolated errors are logged and the traversal moves on; everything
    /// else aborts the run.
    pub fn is_isolated(&self) -> bool {
        matches!(
            self,
            Self::Http(_)
                | Self::Url(_)
                | Self::Selector { .. }
                | Self::SourceFetch { .. }
                | Self::Parse { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_isolated_errors() {
        assert!(AppError::fetch("https://example.com", "timeout").is_isolated());
        assert!(AppError::parse("header", "missing").is_isolated());
        assert!(!AppError::Conflict("out.json".into()).is_isolated());
        assert!(!AppError::malformed("out.json", "not an array").is_isolated());
    }

    #[test]
    fn test_display_includes_context() {
        let err = AppError::parse("result page", "no header");
        assert_eq!(err.to_string(), "Parse error in result page: no header");
    }
}
