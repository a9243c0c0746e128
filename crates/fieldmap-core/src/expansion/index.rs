//! Concrete index resolution for collection paths
//!
//! Given an observed collection size, enumerates the concrete indexed
//! paths of a pattern and stamps one element index onto every field of a
//! mapping instance that shares the expanded shape.
//!
//! Copyright (c) 2025 Fieldmap Team
//! Licensed under the Apache-2.0 license

use crate::document::{FieldRef, MappingNode};
use crate::path::PathExpression;

/// Resolves collection path patterns into concrete indexed paths
#[derive(Debug, Clone, Copy, Default)]
pub struct CollectionIndexResolver;

impl CollectionIndexResolver {
    /// One concrete path per index `0..count`, assigned at segment `pos`
    ///
    /// Pure: the input path is never mutated. An empty collection yields
    /// an empty sequence.
    pub fn resolve(path: &PathExpression, pos: usize, count: usize) -> Vec<PathExpression> {
        (0..count).map(|index| path.with_index_at(pos, index)).collect()
    }

    /// The concrete path for one index at the path's outermost unresolved
    /// collection segment, when one exists
    pub fn resolve_outermost(path: &PathExpression, index: usize) -> Option<PathExpression> {
        path.outermost_unresolved()
            .map(|pos| path.with_index_at(pos, index))
    }

    /// A copy of `node` with `index` stamped onto every input field that
    /// shares `shape` as its generic prefix, recursively through children
    ///
    /// Fields under the same shape at deeper nesting levels are stamped
    /// too, so one pass resolves the whole subtree for this level.
    pub fn apply_to_node(node: &MappingNode, shape: &PathExpression, index: usize) -> MappingNode {
        let mut resolved = node.clone();
        Self::apply_to_subtree(&mut resolved, shape, index);
        resolved
    }

    fn apply_to_subtree(node: &mut MappingNode, shape: &PathExpression, index: usize) {
        let pos = shape.len() - 1;
        for field in node.input_fields.iter_mut() {
            if Self::shares_shape(field, shape, pos) {
                field.path = field.path.with_index_at(pos, index);
            }
        }
        for child in node.children.iter_mut() {
            Self::apply_to_subtree(child, shape, index);
        }
    }

    /// Whether the field's path carries `shape` as an unresolved prefix
    fn shares_shape(field: &FieldRef, shape: &PathExpression, pos: usize) -> bool {
        field.path.len() > pos
            && field.path.segments()[pos].is_unresolved()
            && field.path.shape_starts_with(shape)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::FieldType;

    #[test]
    fn test_resolve_enumerates_indices() {
        let path = PathExpression::parse("/orders<>/sku").unwrap();
        let resolved = CollectionIndexResolver::resolve(&path, 0, 3);
        let rendered: Vec<String> = resolved.iter().map(|p| p.to_string()).collect();
        assert_eq!(
            rendered,
            vec!["/orders<0>/sku", "/orders<1>/sku", "/orders<2>/sku"]
        );
        // Input path stays generic.
        assert_eq!(path.to_string(), "/orders<>/sku");
    }

    #[test]
    fn test_resolve_empty_collection() {
        let path = PathExpression::parse("/orders<>/sku").unwrap();
        assert!(CollectionIndexResolver::resolve(&path, 0, 0).is_empty());
    }

    #[test]
    fn test_resolve_outermost() {
        let path = PathExpression::parse("/orders<1>/lines<>/sku").unwrap();
        let resolved = CollectionIndexResolver::resolve_outermost(&path, 2).unwrap();
        assert_eq!(resolved.to_string(), "/orders<1>/lines<2>/sku");

        let scalar = PathExpression::parse("/order/id").unwrap();
        assert!(CollectionIndexResolver::resolve_outermost(&scalar, 0).is_none());
    }

    #[test]
    fn test_apply_to_node_stamps_matching_fields() {
        let node = MappingNode::map(
            FieldRef::new("src", "/orders<>/lines<>/sku", FieldType::String).unwrap(),
            FieldRef::new("tgt", "/items<>/sku", FieldType::String).unwrap(),
        );
        let shape = PathExpression::parse("/orders<>").unwrap();

        let resolved = CollectionIndexResolver::apply_to_node(&node, &shape, 4);
        assert_eq!(
            resolved.input_fields[0].path.to_string(),
            "/orders<4>/lines<>/sku"
        );
        // Output fields are resolved later, against destination grouping.
        assert_eq!(resolved.output_fields[0].path.to_string(), "/items<>/sku");
        // The original is untouched.
        assert_eq!(node.input_fields[0].path.to_string(), "/orders<>/lines<>/sku");
    }

    #[test]
    fn test_apply_to_node_skips_renamed_shapes() {
        let node = MappingNode::map(
            FieldRef::new("src", "/shipments<>/sku", FieldType::String).unwrap(),
            FieldRef::new("tgt", "/items<>/sku", FieldType::String).unwrap(),
        );
        let shape = PathExpression::parse("/orders<>").unwrap();

        let resolved = CollectionIndexResolver::apply_to_node(&node, &shape, 1);
        assert_eq!(resolved.input_fields[0].path.to_string(), "/shipments<>/sku");
    }
}
