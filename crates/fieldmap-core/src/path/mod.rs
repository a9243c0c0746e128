//! Normalized, technology-agnostic field paths
//!
//! A [`PathExpression`] addresses one value inside an arbitrarily nested
//! scalar/complex/collection structure, independent of the document
//! technology behind it. Collection segments carry a marker style
//! (`[n]` array, `<n>` generic list, `{n}` indexed) and are *unresolved*
//! until an element index is assigned. Expressions are immutable values:
//! every index assignment produces a new expression.
//!
//! Copyright (c) 2025 Fieldmap Team
//! Licensed under the Apache-2.0 license

pub mod parser;
pub mod segment;


use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use parser::MalformedPathError;
pub use segment::{CollectionStyle, PathSegment};

use parser::Parser;

/// An ordered sequence of path segments addressing one field
///
/// Invariant: a parsed expression has at least one segment. A fully
/// resolved expression (every collection segment carries an index)
/// denotes exactly one location in a document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PathExpression {
    segments: Vec<PathSegment>,
}

impl PathExpression {
    /// Parse a path string into an expression
    ///
    /// Fails with [`MalformedPathError`] on unbalanced collection markers,
    /// empty segments, or invalid indices.
    pub fn parse(input: &str) -> Result<Self, MalformedPathError> {
        let segments = Parser::new(input)?.parse()?;
        Ok(Self { segments })
    }

    /// Build an expression from already-constructed segments
    pub fn from_segments(segments: Vec<PathSegment>) -> Self {
        Self { segments }
    }

    /// The ordered segments of this expression
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Number of segments
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Whether the expression has no segments
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// The final segment, if any
    pub fn last_segment(&self) -> Option<&PathSegment> {
        self.segments.last()
    }

    /// The expression with its final segment dropped, or `None` at length 1
    pub fn parent(&self) -> Option<PathExpression> {
        if self.segments.len() <= 1 {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// The first `len` segments as a new expression (clamped to the
    /// expression length)
    pub fn prefix(&self, len: usize) -> PathExpression {
        Self {
            segments: self.segments[..len.min(self.segments.len())].to_vec(),
        }
    }

    /// A new expression with the index at `pos` assigned
    ///
    /// Pure: the receiver is never mutated. An out-of-bounds position
    /// returns the expression unchanged.
    pub fn with_index_at(&self, pos: usize, index: usize) -> PathExpression {
        if pos >= self.segments.len() {
            log::debug!(
                "with_index_at position {} out of bounds for '{}'",
                pos,
                self
            );
            return self.clone();
        }
        let mut segments = self.segments.clone();
        segments[pos] = segments[pos].with_index(index);
        Self { segments }
    }

    /// Lazy sequence of collection-typed positions, outermost-to-innermost
    pub fn collection_segments(&self) -> impl Iterator<Item = (usize, &PathSegment)> + '_ {
        self.segments
            .iter()
            .enumerate()
            .filter(|(_, segment)| segment.is_collection())
    }

    /// Position of the outermost collection segment still lacking an index
    pub fn outermost_unresolved(&self) -> Option<usize> {
        self.segments.iter().position(PathSegment::is_unresolved)
    }

    /// Number of collection segments in this expression
    pub fn collection_depth(&self) -> usize {
        self.collection_segments().count()
    }

    /// Whether every collection segment carries an index
    pub fn is_fully_resolved(&self) -> bool {
        self.outermost_unresolved().is_none()
    }

    /// Structural equality ignoring indices
    ///
    /// The basis for distinguishing reused paths ("same Nth-level path")
    /// from renamed ones.
    pub fn same_shape_as(&self, other: &PathExpression) -> bool {
        self.segments.len() == other.segments.len()
            && self
                .segments
                .iter()
                .zip(other.segments.iter())
                .all(|(a, b)| a.same_shape_as(b))
    }

    /// The generic shape of this expression: all indices stripped
    pub fn stripped_of_indices(&self) -> PathExpression {
        Self {
            segments: self
                .segments
                .iter()
                .map(PathSegment::stripped_of_index)
                .collect(),
        }
    }

    /// Whether `prefix` matches the leading segments of this expression,
    /// ignoring indices on both sides
    pub fn shape_starts_with(&self, prefix: &PathExpression) -> bool {
        prefix.segments.len() <= self.segments.len()
            && prefix
                .segments
                .iter()
                .zip(self.segments.iter())
                .all(|(p, s)| p.same_shape_as(s))
    }
}

impl fmt::Display for PathExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            write!(f, "/{}", segment)?;
        }
        Ok(())
    }
}

impl FromStr for PathExpression {
    type Err = MalformedPathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        for input in [
            "/order/address/city",
            "/orders<>/lines[]/sku",
            "/orders<2>/lines[0]/sku",
            "/row{1}/field{0}",
            "/order/@id",
        ] {
            let parsed = PathExpression::parse(input).unwrap();
            assert_eq!(parsed.to_string(), input);
            let reparsed = PathExpression::parse(&parsed.to_string()).unwrap();
            assert_eq!(parsed, reparsed);
        }
    }

    #[test]
    fn test_leading_separator_is_canonical() {
        let parsed = PathExpression::parse("orders<>/sku").unwrap();
        assert_eq!(parsed.to_string(), "/orders<>/sku");
    }

    #[test]
    fn test_parent_and_last_segment() {
        let path = PathExpression::parse("/order/address/city").unwrap();
        assert_eq!(path.last_segment().unwrap().name, "city");

        let parent = path.parent().unwrap();
        assert_eq!(parent.to_string(), "/order/address");
        assert!(parent.parent().unwrap().parent().is_none());
    }

    #[test]
    fn test_with_index_at_is_pure() {
        let path = PathExpression::parse("/orders<>/sku").unwrap();
        let resolved = path.with_index_at(0, 4);
        assert_eq!(path.to_string(), "/orders<>/sku");
        assert_eq!(resolved.to_string(), "/orders<4>/sku");
    }

    #[test]
    fn test_with_index_at_out_of_bounds() {
        let path = PathExpression::parse("/orders<>/sku").unwrap();
        assert_eq!(path.with_index_at(9, 0), path);
    }

    #[test]
    fn test_collection_segments_order() {
        let path = PathExpression::parse("/a<>/b/c[]/d").unwrap();
        let positions: Vec<usize> = path.collection_segments().map(|(i, _)| i).collect();
        assert_eq!(positions, vec![0, 2]);
    }

    #[test]
    fn test_outermost_unresolved() {
        let path = PathExpression::parse("/a<1>/b<>/c<>").unwrap();
        assert_eq!(path.outermost_unresolved(), Some(1));
        assert!(!path.is_fully_resolved());

        let resolved = path.with_index_at(1, 0).with_index_at(2, 0);
        assert!(resolved.is_fully_resolved());
    }

    #[test]
    fn test_same_shape_as() {
        let generic = PathExpression::parse("/orders<>/lines<>/sku").unwrap();
        let resolved = PathExpression::parse("/orders<1>/lines<0>/sku").unwrap();
        let renamed = PathExpression::parse("/orders<>/items<>/sku").unwrap();
        assert!(generic.same_shape_as(&resolved));
        assert!(!generic.same_shape_as(&renamed));
    }

    #[test]
    fn test_shape_starts_with() {
        let path = PathExpression::parse("/orders<3>/lines<>/sku").unwrap();
        let prefix = PathExpression::parse("/orders<>").unwrap();
        let other = PathExpression::parse("/shipments<>").unwrap();
        assert!(path.shape_starts_with(&prefix));
        assert!(!path.shape_starts_with(&other));
    }

    #[test]
    fn test_stripped_of_indices() {
        let path = PathExpression::parse("/orders<1>/lines[2]/sku").unwrap();
        assert_eq!(path.stripped_of_indices().to_string(), "/orders<>/lines[]/sku");
    }
}
