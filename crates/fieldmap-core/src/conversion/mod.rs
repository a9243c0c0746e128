//! Type-conversion compatibility resolution and runtime value conversion
//!
//! Deciding whether a converter exists between two field types or classes,
//! classifying its risk into a validation severity, and performing the
//! actual value conversion at execution time.
//!
//! Copyright (c) 2025 Fieldmap Team
//! Licensed under the Apache-2.0 license

pub mod registry;

use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::document::{FieldRef, FieldType};
use crate::error::{Error, Result, Severity};

pub use registry::{ConversionConcern, Converter, ConverterRegistry};

/// Outcome of converter selection for a field pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConverterLookup<'a> {
    /// Equal non-complex types: the value copies through unchanged
    Passthrough,
    /// A registered converter applies
    Found(&'a Converter),
    /// No registration covers the pair; a runtime coercion may still succeed
    NotFound,
}

/// Converter selection and runtime conversion over a shared registry
#[derive(Debug, Clone, Copy)]
pub struct TypeConversionResolver<'a> {
    registry: &'a ConverterRegistry,
}

impl<'a> TypeConversionResolver<'a> {
    pub fn new(registry: &'a ConverterRegistry) -> Self {
        Self { registry }
    }

    /// Select a converter for a source/target field pair
    ///
    /// The class-name form is used whenever either side's declared type is
    /// Complex or absent; otherwise the type form applies, and only when
    /// the two types differ - equal types bypass conversion entirely and
    /// the value is copied through as an owned clone.
    pub fn resolve(&self, source: &FieldRef, target: &FieldRef) -> ConverterLookup<'a> {
        if source.field_type.requires_class_lookup() || target.field_type.requires_class_lookup() {
            return match (source.class_name.as_deref(), target.class_name.as_deref()) {
                (Some(source_class), Some(target_class)) => self
                    .registry
                    .find_by_class(source_class, target_class)
                    .map_or(ConverterLookup::NotFound, ConverterLookup::Found),
                _ => ConverterLookup::NotFound,
            };
        }
        if source.field_type == target.field_type {
            return ConverterLookup::Passthrough;
        }
        self.registry
            .find(source.field_type, target.field_type)
            .map_or(ConverterLookup::NotFound, ConverterLookup::Found)
    }

    /// Look up a converter by declared field types
    pub fn find_converter(&self, source: FieldType, target: FieldType) -> Option<&'a Converter> {
        self.registry.find(source, target)
    }

    /// Look up a converter by declared class names
    pub fn find_converter_by_class(&self, source: &str, target: &str) -> Option<&'a Converter> {
        self.registry.find_by_class(source, target)
    }

    /// Classify a converter's concerns into severities
    ///
    /// Each present concern is reported independently: a converter flagged
    /// both Range and Format yields two Warn records.
    pub fn classify_concerns(&self, converter: &Converter) -> Vec<(Severity, String)> {
        converter
            .concerns
            .iter()
            .map(|concern| classify_concern(*concern, converter.source_type, converter.target_type))
            .collect()
    }

    /// Convert a value between two declared field types
    ///
    /// Equal types copy through unchanged. Otherwise a best-effort
    /// coercion into the target type is attempted; on failure the caller
    /// appends one error audit and leaves the destination field unset.
    pub fn convert_value(&self, value: &Value, source: FieldType, target: FieldType) -> Result<Value> {
        if source == target || value.is_null() {
            return Ok(value.clone());
        }
        coerce(value, source, target)
    }
}

/// Severity and message for one concern flag
fn classify_concern(concern: ConversionConcern, source: FieldType, target: FieldType) -> (Severity, String) {
    match concern {
        ConversionConcern::None => (
            Severity::Info,
            format!("conversion from {} to {} is supported", source, target),
        ),
        ConversionConcern::Range => (
            Severity::Warn,
            format!(
                "conversion from {} to {} may lose values outside the target range",
                source, target
            ),
        ),
        ConversionConcern::Format => (
            Severity::Warn,
            format!(
                "conversion from {} to {} may require a format change",
                source, target
            ),
        ),
        ConversionConcern::Unsupported => (
            Severity::Error,
            format!("conversion from {} to {} is not supported", source, target),
        ),
    }
}

fn failure(value: &Value, source: FieldType, target: FieldType, message: impl Into<String>) -> Error {
    Error::ConversionFailure {
        from: source,
        to: target,
        value: render(value),
        message: message.into(),
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Best-effort coercion of `value` into `target`
fn coerce(value: &Value, source: FieldType, target: FieldType) -> Result<Value> {
    match target {
        FieldType::String => coerce_to_string(value, source),
        FieldType::Boolean => coerce_to_boolean(value, source),
        FieldType::Byte => coerce_to_integral(value, source, target, i8::MIN as i64, i8::MAX as i64),
        FieldType::Short => coerce_to_integral(value, source, target, i16::MIN as i64, i16::MAX as i64),
        FieldType::Integer => {
            coerce_to_integral(value, source, target, i32::MIN as i64, i32::MAX as i64)
        }
        FieldType::Long => coerce_to_integral(value, source, target, i64::MIN, i64::MAX),
        FieldType::Float => coerce_to_float(value, source, target, true),
        FieldType::Double => coerce_to_float(value, source, target, false),
        FieldType::Decimal => coerce_to_decimal(value, source),
        FieldType::Char => coerce_to_char(value, source),
        FieldType::DateTime => coerce_to_datetime(value, source),
        // Complex and untyped targets take the value structurally.
        FieldType::Complex | FieldType::None => Ok(value.clone()),
    }
}

fn coerce_to_string(value: &Value, source: FieldType) -> Result<Value> {
    match value {
        Value::String(s) => Ok(Value::String(s.clone())),
        Value::Number(n) => Ok(Value::String(n.to_string())),
        Value::Bool(b) => Ok(Value::String(b.to_string())),
        other => Err(failure(
            other,
            source,
            FieldType::String,
            "structured value cannot be rendered as a string",
        )),
    }
}

fn coerce_to_boolean(value: &Value, source: FieldType) -> Result<Value> {
    match value {
        Value::Bool(b) => Ok(Value::Bool(*b)),
        Value::String(s) => match s.to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(Value::Bool(true)),
            "false" | "0" => Ok(Value::Bool(false)),
            _ => Err(failure(value, source, FieldType::Boolean, "not a boolean literal")),
        },
        Value::Number(n) => match n.as_i64() {
            Some(0) => Ok(Value::Bool(false)),
            Some(1) => Ok(Value::Bool(true)),
            _ => Err(failure(value, source, FieldType::Boolean, "only 0 and 1 map to a boolean")),
        },
        other => Err(failure(other, source, FieldType::Boolean, "not a boolean value")),
    }
}

fn coerce_to_integral(
    value: &Value,
    source: FieldType,
    target: FieldType,
    min: i64,
    max: i64,
) -> Result<Value> {
    let raw = match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i
            } else if let Some(f) = n.as_f64() {
                // Fractional part is discarded, bounds still apply.
                let truncated = f.trunc();
                if truncated < min as f64 || truncated > max as f64 {
                    return Err(failure(value, source, target, "value out of range"));
                }
                truncated as i64
            } else {
                return Err(failure(value, source, target, "value out of range"));
            }
        }
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|e| failure(value, source, target, e.to_string()))?,
        Value::Bool(b) => i64::from(*b),
        other => return Err(failure(other, source, target, "not a numeric value")),
    };
    if raw < min || raw > max {
        return Err(failure(value, source, target, "value out of range"));
    }
    Ok(Value::Number(raw.into()))
}

fn coerce_to_float(value: &Value, source: FieldType, target: FieldType, narrow: bool) -> Result<Value> {
    let raw = match value {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| failure(value, source, target, "value out of range"))?,
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|e| failure(value, source, target, e.to_string()))?,
        Value::Bool(b) => f64::from(u8::from(*b)),
        other => return Err(failure(other, source, target, "not a numeric value")),
    };
    if narrow && raw.is_finite() && raw.abs() > f64::from(f32::MAX) {
        return Err(failure(value, source, target, "value out of range"));
    }
    serde_json::Number::from_f64(raw)
        .map(Value::Number)
        .ok_or_else(|| failure(value, source, target, "not a finite number"))
}

fn coerce_to_decimal(value: &Value, source: FieldType) -> Result<Value> {
    match value {
        Value::Number(_) => Ok(value.clone()),
        // Decimal strings keep their textual form to preserve precision.
        Value::String(s) if s.trim().parse::<f64>().is_ok() => Ok(value.clone()),
        other => Err(failure(other, source, FieldType::Decimal, "not a decimal value")),
    }
}

fn coerce_to_char(value: &Value, source: FieldType) -> Result<Value> {
    match value {
        Value::String(s) if s.chars().count() == 1 => Ok(value.clone()),
        Value::Number(n) => n
            .as_u64()
            .and_then(|code| u32::try_from(code).ok())
            .and_then(char::from_u32)
            .map(|c| Value::String(c.to_string()))
            .ok_or_else(|| failure(value, source, FieldType::Char, "not a valid code point")),
        other => Err(failure(other, source, FieldType::Char, "not a single character")),
    }
}

fn coerce_to_datetime(value: &Value, source: FieldType) -> Result<Value> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .map(|dt| Value::String(dt.with_timezone(&Utc).to_rfc3339()))
            .map_err(|e| failure(value, source, FieldType::DateTime, e.to_string())),
        Value::Number(n) => n
            .as_i64()
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single())
            .map(|dt| Value::String(dt.to_rfc3339()))
            .ok_or_else(|| failure(value, source, FieldType::DateTime, "not an epoch timestamp")),
        other => Err(failure(other, source, FieldType::DateTime, "not a date-time value")),
    }
}
