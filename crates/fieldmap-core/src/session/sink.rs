//! Append-only validation and audit sinks
//!
//! Outcome records collect everything a session tolerated instead of
//! raising: skipped instances, risky conversions, per-field failures.
//! Sinks are owned by their session and consumed by the host after a run.
//!
//! Copyright (c) 2025 Fieldmap Team
//! Licensed under the Apache-2.0 license

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::document::FieldRef;
use crate::error::Severity;

/// One validation or audit outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeRecord {
    /// The field the outcome refers to, when one is identifiable
    pub field: Option<FieldRef>,
    pub message: String,
    pub severity: Severity,
    /// The offending or affected value, when one is available
    pub value: Option<Value>,
    pub timestamp: DateTime<Utc>,
}

impl OutcomeRecord {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            field: None,
            message: message.into(),
            severity,
            value: None,
            timestamp: Utc::now(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Severity::Info, message)
    }

    pub fn warn(message: impl Into<String>) -> Self {
        Self::new(Severity::Warn, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    pub fn with_field(mut self, field: FieldRef) -> Self {
        self.field = Some(field);
        self
    }

    pub fn with_value(mut self, value: Value) -> Self {
        self.value = Some(value);
        self
    }
}

/// Append-only store of outcome records
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordSink {
    records: Vec<OutcomeRecord>,
}

/// Sink for document/mapping validation outcomes
pub type ValidationSink = RecordSink;

/// Sink for runtime execution outcomes
pub type AuditSink = RecordSink;

impl RecordSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one record
    pub fn append(&mut self, record: OutcomeRecord) {
        self.records.push(record);
    }

    /// All records in append order
    pub fn records(&self) -> &[OutcomeRecord] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &OutcomeRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records at exactly the given severity
    pub fn at_severity(&self, severity: Severity) -> impl Iterator<Item = &OutcomeRecord> {
        self.records.iter().filter(move |r| r.severity == severity)
    }

    pub fn has_errors(&self) -> bool {
        self.records.iter().any(|r| r.severity == Severity::Error)
    }

    pub fn has_warns(&self) -> bool {
        self.records.iter().any(|r| r.severity == Severity::Warn)
    }

    pub fn has_infos(&self) -> bool {
        self.records.iter().any(|r| r.severity == Severity::Info)
    }
}
