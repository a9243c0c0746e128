//! Converter registry
//!
//! Converter registrations are process-wide and read-only during
//! execution: the registry is built once at startup, before any session
//! begins, and passed to sessions by reference. It contains only plain
//! data, so concurrent sessions can share it without locking.
//!
//! Copyright (c) 2025 Fieldmap Team
//! Licensed under the Apache-2.0 license

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::document::FieldType;

/// Information-loss risk flagged on a converter registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConversionConcern {
    /// Conversion is loss-free
    None,
    /// Values outside the target range are lost or rejected
    Range,
    /// The value representation must be reinterpreted and may be rejected
    Format,
    /// The type pair is fundamentally incompatible
    Unsupported,
}

/// One converter registration between a type pair or a class-name pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Converter {
    pub source_type: FieldType,
    pub target_type: FieldType,
    pub source_class: Option<String>,
    pub target_class: Option<String>,
    /// Concerns in reporting order; each yields its own record
    pub concerns: Vec<ConversionConcern>,
}

impl Converter {
    /// A converter between two declared field types
    pub fn between(source_type: FieldType, target_type: FieldType) -> Self {
        Self {
            source_type,
            target_type,
            source_class: None,
            target_class: None,
            concerns: Vec::new(),
        }
    }

    /// A converter between two declared class names
    pub fn between_classes(source_class: impl Into<String>, target_class: impl Into<String>) -> Self {
        Self {
            source_type: FieldType::Complex,
            target_type: FieldType::Complex,
            source_class: Some(source_class.into()),
            target_class: Some(target_class.into()),
            concerns: Vec::new(),
        }
    }

    /// Add one concern flag
    pub fn with_concern(mut self, concern: ConversionConcern) -> Self {
        self.concerns.push(concern);
        self
    }

    /// Replace the concern flags
    pub fn with_concerns(mut self, concerns: Vec<ConversionConcern>) -> Self {
        self.concerns = concerns;
        self
    }
}

/// Process-wide converter lookup tables
///
/// Built once at startup and shared read-only across sessions.
#[derive(Debug, Clone, Default)]
pub struct ConverterRegistry {
    by_type: HashMap<(FieldType, FieldType), Converter>,
    by_class: HashMap<(String, String), Converter>,
}

impl ConverterRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry pre-populated with the primitive type cross-product
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        const PRIMITIVES: [FieldType; 11] = [
            FieldType::Boolean,
            FieldType::Byte,
            FieldType::Char,
            FieldType::Decimal,
            FieldType::Double,
            FieldType::Float,
            FieldType::Integer,
            FieldType::Long,
            FieldType::Short,
            FieldType::String,
            FieldType::DateTime,
        ];
        for source in PRIMITIVES {
            for target in PRIMITIVES {
                if source == target {
                    continue;
                }
                let concerns = default_concerns(source, target);
                registry.register(Converter::between(source, target).with_concerns(concerns));
            }
        }
        registry
    }

    /// Register a converter, routing by class names when present
    pub fn register(&mut self, converter: Converter) {
        match (&converter.source_class, &converter.target_class) {
            (Some(source), Some(target)) => {
                self.by_class
                    .insert((source.clone(), target.clone()), converter);
            }
            _ => {
                self.by_type.insert(
                    (converter.source_type, converter.target_type),
                    converter,
                );
            }
        }
    }

    /// Look up a converter by declared field types
    pub fn find(&self, source: FieldType, target: FieldType) -> Option<&Converter> {
        self.by_type.get(&(source, target))
    }

    /// Look up a converter by declared class names
    pub fn find_by_class(&self, source: &str, target: &str) -> Option<&Converter> {
        self.by_class
            .get(&(source.to_string(), target.to_string()))
    }

    /// Number of registrations
    pub fn len(&self) -> usize {
        self.by_type.len() + self.by_class.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_type.is_empty() && self.by_class.is_empty()
    }
}

/// Widening order of the integral types
fn integral_rank(ty: FieldType) -> Option<u8> {
    match ty {
        FieldType::Byte => Some(1),
        FieldType::Short => Some(2),
        FieldType::Integer => Some(3),
        FieldType::Long => Some(4),
        _ => None,
    }
}

/// Default concern flags for a primitive type pair
fn default_concerns(source: FieldType, target: FieldType) -> Vec<ConversionConcern> {
    use ConversionConcern::{Format, None as Lossless, Range, Unsupported};
    use FieldType::*;

    match (source, target) {
        // Date and time only interoperates with wide integrals and strings.
        (Boolean, DateTime) | (DateTime, Boolean) | (Char, DateTime) | (DateTime, Char) => {
            vec![Unsupported]
        }
        (DateTime, Long) | (Long, DateTime) => vec![Lossless],
        (DateTime, String) | (String, DateTime) => vec![Format],
        (DateTime, _) | (_, DateTime) => vec![Range],

        // String parses into everything else; rendering out is loss-free.
        (String, _) => vec![Format],
        (_, String) => vec![Lossless],

        // Boolean maps to 0/1; the reverse collapses the value space.
        (Boolean, _) => vec![Lossless],
        (_, Boolean) => vec![Range],

        // Char carries its code point.
        (Char, _) => vec![Lossless],
        (_, Char) => vec![Range],

        // Decimal accepts every numeric; leaving it can narrow.
        (_, Decimal) => vec![Lossless],
        (Decimal, _) => vec![Range],

        // Floating point.
        (Float, Double) => vec![Lossless],
        (Double, Float) => vec![Range],
        (Integer, Float) | (Long, Float) | (Long, Double) => vec![Range],
        (_, Float) | (_, Double) => vec![Lossless],
        (Float, _) | (Double, _) => vec![Range],

        // Integral widening/narrowing.
        (a, b) => match (integral_rank(a), integral_rank(b)) {
            (Some(from), Some(to)) if from <= to => vec![Lossless],
            (Some(_), Some(_)) => vec![Range],
            _ => vec![Format],
        },
    }
}
