//! Error types for the Fieldmap core library
//!
//! This module defines the error handling system for Fieldmap, using
//! thiserror for ergonomic error definitions and anyhow for flexible
//! error contexts at the adapter boundary.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::document::FieldType;
use crate::path::MalformedPathError;

/// Main error type for Fieldmap operations
#[derive(Error, Debug)]
pub enum Error {
    /// A field path string could not be parsed
    #[error("malformed field path: {source}")]
    MalformedPath {
        #[from]
        source: MalformedPathError,
    },

    /// A target collection level has no index source anywhere in the
    /// resolved source chain
    #[error("no source collection supplies indices for target path '{path}'")]
    UnresolvedCollectionDepth { path: String },

    /// No converter is registered for a type pair
    #[error("conversion from {from} to {to} is not registered")]
    NoConverterAvailable { from: FieldType, to: FieldType },

    /// Runtime value conversion failed
    #[error("conversion from {from} to {to} failed for value '{value}': {message}")]
    ConversionFailure {
        from: FieldType,
        to: FieldType,
        value: String,
        message: String,
    },

    /// A document adapter failed to resolve a value, class, or collection
    #[error("document adapter error: {message}")]
    Adapter {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// The session is missing a prerequisite and cannot run
    #[error("session is not configured: {message}")]
    SessionMisconfigured { message: String },
}

/// Convenience type alias for Results using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an adapter error without an underlying cause
    pub fn adapter(message: impl Into<String>) -> Self {
        Error::Adapter {
            message: message.into(),
            source: None,
        }
    }

    /// Create an adapter error wrapping an underlying cause
    pub fn adapter_with_source(message: impl Into<String>, source: anyhow::Error) -> Self {
        Error::Adapter {
            message: message.into(),
            source: Some(source),
        }
    }
}

/// Severity levels for validation and audit records
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// Informational, no action required
    Info,
    /// Warning, should be reviewed
    Warn,
    /// Error, the affected field or instance was skipped
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warn => write!(f, "warn"),
            Severity::Error => write!(f, "error"),
        }
    }
}
