//! Mapping document model
//!
//! The declarative mapping specification: a tree of [`MappingNode`]s whose
//! fields carry path patterns. The model is built once by an external
//! loader and is immutable afterwards; expansion never writes back into it.
//!
//! Copyright (c) 2025 Fieldmap Team
//! Licensed under the Apache-2.0 license

pub mod adapter;

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::path::PathExpression;

/// Declared type of a mapped field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    Boolean,
    Byte,
    Char,
    Decimal,
    Double,
    Float,
    Integer,
    Long,
    Short,
    String,
    DateTime,
    /// Nested structure handled through class-name converter lookup
    Complex,
    /// No declared type; treated like Complex for converter selection
    None,
}

impl FieldType {
    /// Whether this type participates in class-name converter lookup
    /// instead of type-pair lookup
    pub fn requires_class_lookup(&self) -> bool {
        matches!(self, FieldType::Complex | FieldType::None)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldType::Boolean => "Boolean",
            FieldType::Byte => "Byte",
            FieldType::Char => "Char",
            FieldType::Decimal => "Decimal",
            FieldType::Double => "Double",
            FieldType::Float => "Float",
            FieldType::Integer => "Integer",
            FieldType::Long => "Long",
            FieldType::Short => "Short",
            FieldType::String => "String",
            FieldType::DateTime => "DateTime",
            FieldType::Complex => "Complex",
            FieldType::None => "None",
        };
        write!(f, "{}", name)
    }
}

/// Reference to one field on one side of a mapping
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRef {
    /// Identifier of the document this field belongs to
    pub doc_id: String,
    /// Path pattern addressing the field
    pub path: PathExpression,
    /// Declared field type
    pub field_type: FieldType,
    /// Declared class name for complex fields
    pub class_name: Option<String>,
    /// Ordinal inside a Separate/Combine group
    pub index_in_parent: Option<usize>,
}

impl FieldRef {
    /// Create a field reference, parsing the path pattern
    ///
    /// A malformed path fails here, at the single-field granularity, so a
    /// loader can surface it as a document-validation error without losing
    /// the rest of the document.
    pub fn new(
        doc_id: impl Into<String>,
        path: &str,
        field_type: FieldType,
    ) -> Result<Self, crate::path::MalformedPathError> {
        Ok(Self {
            doc_id: doc_id.into(),
            path: PathExpression::parse(path)?,
            field_type,
            class_name: None,
            index_in_parent: None,
        })
    }

    /// Attach a declared class name
    pub fn with_class_name(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = Some(class_name.into());
        self
    }

    /// Attach an ordinal inside a Separate/Combine group
    pub fn with_index_in_parent(mut self, index: usize) -> Self {
        self.index_in_parent = Some(index);
        self
    }
}

/// Kind of a mapping node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MappingKind {
    /// One input field copied/converted to the output fields
    Map,
    /// One input split by a delimiter across the output fields
    Separate,
    /// Several input fields joined by a delimiter into one output
    Combine,
    /// Input value translated through a named lookup table
    Lookup,
    /// A group of child mappings expanded over collection indices
    Collection,
}

/// Stable identity of a mapping node, shared by its clones
///
/// The expansion cache is keyed by this identity, so resolved instances
/// produced from a node and the node itself stay associated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u64);

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

impl NodeId {
    fn next() -> Self {
        NodeId(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// One rule of the mapping document
///
/// Built once from the parsed document; immutable except for the
/// ephemeral expansion result held externally in the session cache.
#[derive(Debug, Clone, PartialEq)]
pub struct MappingNode {
    id: NodeId,
    /// What this rule does with its fields
    pub kind: MappingKind,
    /// Source-side fields
    pub input_fields: Vec<FieldRef>,
    /// Destination-side fields
    pub output_fields: Vec<FieldRef>,
    /// Nested rules; populated for Collection nodes only
    pub children: Vec<MappingNode>,
    /// Delimiter for Separate/Combine rules
    pub delimiter: Option<String>,
    /// Table name for Lookup rules
    pub lookup_table_name: Option<String>,
}

impl MappingNode {
    fn with_kind(kind: MappingKind) -> Self {
        Self {
            id: NodeId::next(),
            kind,
            input_fields: Vec::new(),
            output_fields: Vec::new(),
            children: Vec::new(),
            delimiter: None,
            lookup_table_name: None,
        }
    }

    /// A plain field-to-field mapping
    pub fn map(input: FieldRef, output: FieldRef) -> Self {
        let mut node = Self::with_kind(MappingKind::Map);
        node.input_fields.push(input);
        node.output_fields.push(output);
        node
    }

    /// Split one input across several outputs by a delimiter
    pub fn separate(input: FieldRef, outputs: Vec<FieldRef>, delimiter: impl Into<String>) -> Self {
        let mut node = Self::with_kind(MappingKind::Separate);
        node.input_fields.push(input);
        node.output_fields = outputs;
        node.delimiter = Some(delimiter.into());
        node
    }

    /// Join several inputs into one output by a delimiter
    pub fn combine(inputs: Vec<FieldRef>, output: FieldRef, delimiter: impl Into<String>) -> Self {
        let mut node = Self::with_kind(MappingKind::Combine);
        node.input_fields = inputs;
        node.output_fields.push(output);
        node.delimiter = Some(delimiter.into());
        node
    }

    /// Translate the input through a named lookup table
    pub fn lookup(input: FieldRef, output: FieldRef, table_name: impl Into<String>) -> Self {
        let mut node = Self::with_kind(MappingKind::Lookup);
        node.input_fields.push(input);
        node.output_fields.push(output);
        node.lookup_table_name = Some(table_name.into());
        node
    }

    /// A collection mapping grouping child rules for expansion
    pub fn collection(children: Vec<MappingNode>) -> Self {
        let mut node = Self::with_kind(MappingKind::Collection);
        node.children = children;
        node
    }

    /// Stable identity shared by this node and its clones
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The field whose path drives expansion grouping
    pub fn primary_input(&self) -> Option<&FieldRef> {
        self.input_fields.first()
    }
}

/// The whole mapping specification handed to a session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MappingDocument {
    /// Optional human-readable name
    pub name: Option<String>,
    /// Top-level mapping rules in document order
    pub mappings: Vec<MappingNode>,
}

impl MappingDocument {
    pub fn new(mappings: Vec<MappingNode>) -> Self {
        Self {
            name: None,
            mappings,
        }
    }

    pub fn named(name: impl Into<String>, mappings: Vec<MappingNode>) -> Self {
        Self {
            name: Some(name.into()),
            mappings,
        }
    }

    /// Whether the document contains no rules
    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

/// A named value-translation table used by Lookup rules
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LookupTable {
    pub name: String,
    entries: HashMap<String, String>,
}

impl LookupTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: HashMap::new(),
        }
    }

    /// Add one source-value to target-value entry
    pub fn with_entry(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.entries.insert(from.into(), to.into());
        self
    }

    /// Translate a source value, if present
    pub fn translate(&self, from: &str) -> Option<&str> {
        self.entries.get(from).map(String::as_str)
    }
}
