//! Error types for Trackwise
//!
//! Analyzers never fail. These errors only surface at the boundaries: parsing
//! input, mutating the metric registry, validating values and configuration.

use thiserror::Error;

/// Errors that can occur outside the pure analyzers
#[derive(Debug, Error)]
pub enum InsightError {
    #[error("Failed to parse input: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("A metric named '{0}' already exists")]
    DuplicateMetric(String),

    #[error("Unknown metric: {0}")]
    UnknownMetric(String),

    #[error("Invalid value for metric '{metric}': {reason}")]
    InvalidValue { metric: String, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
