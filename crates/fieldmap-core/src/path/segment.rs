//! Path segment definitions
//!
//! A segment is one step of a field path. Collection segments carry a
//! marker style and, once resolved, a concrete element index.
//!
//! Copyright (c) 2025 Fieldmap Team
//! Licensed under the Apache-2.0 license

use std::fmt;

use serde::{Deserialize, Serialize};

/// Marker style of a collection segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CollectionStyle {
    /// `{n}` - positionally indexed structure (e.g. delimited-text columns)
    Indexed,
    /// `<n>` - generic list container
    GenericList,
    /// `[n]` - fixed array container
    Array,
}

impl CollectionStyle {
    /// Opening marker character for this style
    pub fn open(&self) -> char {
        match self {
            CollectionStyle::Indexed => '{',
            CollectionStyle::GenericList => '<',
            CollectionStyle::Array => '[',
        }
    }

    /// Closing marker character for this style
    pub fn close(&self) -> char {
        match self {
            CollectionStyle::Indexed => '}',
            CollectionStyle::GenericList => '>',
            CollectionStyle::Array => ']',
        }
    }
}

/// One step of a field path
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PathSegment {
    /// Segment name as written in the path string
    pub name: String,
    /// Marker style when this segment addresses a repeating structure
    pub collection_style: Option<CollectionStyle>,
    /// Concrete element index, present once the segment is resolved
    pub index: Option<usize>,
    /// Whether this segment addresses an attribute rather than an element
    pub is_attribute: bool,
}

impl PathSegment {
    /// Create a scalar (non-collection) segment
    pub fn scalar(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            collection_style: None,
            index: None,
            is_attribute: false,
        }
    }

    /// Create an unresolved collection segment with the given marker style
    pub fn collection(name: impl Into<String>, style: CollectionStyle) -> Self {
        Self {
            name: name.into(),
            collection_style: Some(style),
            index: None,
            is_attribute: false,
        }
    }

    /// Whether this segment addresses a repeating structure
    pub fn is_collection(&self) -> bool {
        self.collection_style.is_some()
    }

    /// Whether this segment still lacks a concrete element index
    pub fn is_unresolved(&self) -> bool {
        self.is_collection() && self.index.is_none()
    }

    /// A copy of this segment with its index assigned
    pub fn with_index(&self, index: usize) -> Self {
        Self {
            index: Some(index),
            ..self.clone()
        }
    }

    /// A copy of this segment with its index removed
    pub fn stripped_of_index(&self) -> Self {
        Self {
            index: None,
            ..self.clone()
        }
    }

    /// Structural equality ignoring the element index
    pub fn same_shape_as(&self, other: &PathSegment) -> bool {
        self.name == other.name
            && self.collection_style == other.collection_style
            && self.is_attribute == other.is_attribute
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_attribute {
            write!(f, "@")?;
        }
        write!(f, "{}", self.name)?;
        if let Some(style) = self.collection_style {
            write!(f, "{}", style.open())?;
            if let Some(index) = self.index {
                write!(f, "{}", index)?;
            }
            write!(f, "{}", style.close())?;
        }
        Ok(())
    }
}
