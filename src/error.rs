//! Error types for the spectrum analyzer
//!
//! The analysis paths never surface these: a failed or not-ready query
//! degrades to a zero-filled result. Errors are reserved for configuration,
//! decoding, and the producer adapters.

use std::fmt;

/// Errors that can occur outside the analysis core
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// Invalid input parameters
    InvalidInput(String),

    /// Audio decoding error
    DecodingError(String),

    /// Processing error (I/O, malformed configuration, etc.)
    ProcessingError(String),

    /// Stream parameters the analyzer cannot handle (e.g. more than two channels)
    UnsupportedStream(String),
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            AnalysisError::DecodingError(msg) => write!(f, "Decoding error: {}", msg),
            AnalysisError::ProcessingError(msg) => write!(f, "Processing error: {}", msg),
            AnalysisError::UnsupportedStream(msg) => write!(f, "Unsupported stream: {}", msg),
        }
    }
}

impl std::error::Error for AnalysisError {}

impl From<std::io::Error> for AnalysisError {
    fn from(err: std::io::Error) -> Self {
        AnalysisError::ProcessingError(err.to_string())
    }
}

impl From<serde_json::Error> for AnalysisError {
    fn from(err: serde_json::Error) -> Self {
        AnalysisError::InvalidInput(format!("configuration: {}", err))
    }
}

impl From<symphonia::core::errors::Error> for AnalysisError {
    fn from(err: symphonia::core::errors::Error) -> Self {
        AnalysisError::DecodingError(err.to_string())
    }
}
