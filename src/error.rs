//! Error types for the quality checker.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our custom error.
pub type Result<T> = std::result::Result<T, CheckerError>;

/// One failed call against a single model identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelAttempt {
    pub model: String,
    pub error: String,
}

impl fmt::Display for ModelAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.model, self.error)
    }
}

fn join_attempts(attempts: &[ModelAttempt]) -> String {
    attempts
        .iter()
        .map(ModelAttempt::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors that can occur while checking a page.
#[derive(Error, Debug)]
pub enum CheckerError {
    /// Error reading or writing files.
    #[error("I/O error for path '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error during serialization/deserialization.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration file error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// HTTP request error.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// LLM API error for a single call.
    #[error("LLM API error: {0}")]
    LlmApi(String),

    /// Every extraction strategy came back empty.
    #[error("Could not extract article text from '{input}'")]
    ExtractionFailed { input: String },

    /// The primary model and every fallback model failed.
    #[error("All model calls failed: {}", join_attempts(.attempts))]
    ModelCall { attempts: Vec<ModelAttempt> },

    /// The model answered, but not with the required JSON object.
    #[error("Malformed evaluation result: {reason}")]
    MalformedResult { reason: String, raw: String },

    /// Result log error.
    #[error("Result log error: {0}")]
    Log(String),
}

impl CheckerError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn malformed(reason: impl Into<String>, raw: impl Into<String>) -> Self {
        Self::MalformedResult {
            reason: reason.into(),
            raw: raw.into(),
        }
    }

    /// Raw model output carried by a `MalformedResult`.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            Self::MalformedResult { raw, .. } => Some(raw),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for CheckerError {
    fn from(err: reqwest::Error) -> Self {
        CheckerError::Http(err.to_string())
    }
}

impl From<serde_json::Error> for CheckerError {
    fn from(err: serde_json::Error) -> Self {
        CheckerError::Serialization(err.to_string())
    }
}

impl From<csv::Error> for CheckerError {
    fn from(err: csv::Error) -> Self {
        CheckerError::Log(err.to_string())
    }
}
