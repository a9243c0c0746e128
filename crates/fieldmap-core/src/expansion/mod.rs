//! Nested-collection mapping expansion
//!
//! Turns one Collection mapping node plus a concrete source document into
//! a flat ordered sequence of fully source-resolved mapping instances.
//! Children sharing a collection shape at a level expand together against
//! the same index range; differing shapes expand independently. The
//! produced order is outer-index-major, inner-index-minor, matching
//! source traversal order, and is externally observable.
//!
//! Expansion is a pure function of the node, the source, and the session
//! cache: the mapping document is never mutated, and repeated calls for
//! the same node return results of identical cardinality.
//!
//! Copyright (c) 2025 Fieldmap Team
//! Licensed under the Apache-2.0 license

pub mod cache;
pub mod index;

#[cfg(test)]
mod tests;

use std::collections::HashMap;

use crate::document::adapter::SourceDocument;
use crate::document::{MappingKind, MappingNode};
use crate::error::Error;
use crate::path::PathExpression;
use crate::session::sink::{OutcomeRecord, ValidationSink};

pub use cache::ExpansionCache;
pub use index::CollectionIndexResolver;

/// Multi-level expansion of collection mapping groups
#[derive(Debug, Clone, Copy, Default)]
pub struct CollectionExpansionEngine;

/// Destination-side index bookkeeping for one expansion run
#[derive(Debug, Default)]
struct DestinationState {
    /// Flattening ordinals per (generic destination path, outer indices)
    ordinals: HashMap<(PathExpression, Vec<usize>), usize>,
    /// Latest index assigned per destination container shape, reusable by
    /// sibling mappings whose own source chain is shallower
    supplied: HashMap<PathExpression, usize>,
}

impl CollectionExpansionEngine {
    pub fn new() -> Self {
        Self
    }

    /// Expand a Collection node into fully source-resolved instances
    ///
    /// Results are memoized in the session cache keyed by node identity;
    /// a second call for the same node returns the cached instances, so
    /// the result cardinality never grows across calls.
    pub fn expand(
        &self,
        node: &MappingNode,
        source: &dyn SourceDocument,
        cache: &mut ExpansionCache,
        sink: &mut ValidationSink,
    ) -> Vec<MappingNode> {
        if let Some(hit) = cache.get(node.id()) {
            return hit.to_vec();
        }

        let mut state = DestinationState::default();
        let mut resolved = Vec::new();
        self.expand_level(node.children.clone(), source, sink, &mut state, &mut resolved);
        cache.insert(node.id(), resolved.clone());
        resolved
    }

    /// Expand one level of siblings, depth-first
    fn expand_level(
        &self,
        nodes: Vec<MappingNode>,
        source: &dyn SourceDocument,
        sink: &mut ValidationSink,
        state: &mut DestinationState,
        out: &mut Vec<MappingNode>,
    ) {
        // Nested Collection groups contribute their children directly; the
        // multi-level structure lives in the field paths themselves.
        let nodes: Vec<MappingNode> = nodes
            .into_iter()
            .flat_map(|node| {
                if node.kind == MappingKind::Collection {
                    node.children
                } else {
                    vec![node]
                }
            })
            .collect();

        // Group siblings by the generic shape of the outermost unresolved
        // collection segment of their primary input path, preserving
        // first-appearance order. A shared shape means a shared index range.
        let mut groups: Vec<(Option<PathExpression>, Vec<MappingNode>)> = Vec::new();
        for node in nodes {
            let key = node.primary_input().and_then(|field| {
                field
                    .path
                    .outermost_unresolved()
                    .map(|pos| field.path.prefix(pos + 1).stripped_of_indices())
            });
            match groups.iter_mut().find(|(existing, _)| *existing == key) {
                Some((_, members)) => members.push(node),
                None => groups.push((key, vec![node])),
            }
        }

        for (key, members) in groups {
            let Some(shape) = key else {
                // Inputs fully resolved: assign destination indices and emit.
                for node in members {
                    self.finalize(node, sink, state, out);
                }
                continue;
            };

            let Some(primary) = members[0].primary_input() else {
                continue;
            };
            // The container path keeps the indices resolved so far; the
            // final segment is the collection being sized.
            let container = primary.path.prefix(shape.len());
            let count = match source.collection_size(&container) {
                Ok(Some(count)) => count,
                Ok(None) => {
                    // Phantom element: an absent or scalar ancestor still
                    // yields exactly one instance for its sibling fields.
                    log::debug!("no collection at '{}', using phantom element", container);
                    1
                }
                Err(err) => {
                    log::debug!("collection size unresolved at '{}': {}", container, err);
                    1
                }
            };

            for index in 0..count {
                let indexed: Vec<MappingNode> = members
                    .iter()
                    .map(|node| CollectionIndexResolver::apply_to_node(node, &shape, index))
                    .collect();
                self.expand_level(indexed, source, sink, state, out);
            }
        }
    }

    /// Resolve destination indices for one source-resolved instance
    ///
    /// An instance whose destination declares a collection level with no
    /// index source is reported and skipped; siblings continue.
    fn finalize(
        &self,
        node: MappingNode,
        sink: &mut ValidationSink,
        state: &mut DestinationState,
        out: &mut Vec<MappingNode>,
    ) {
        let source_indices: Vec<usize> = node
            .primary_input()
            .map(|field| {
                field
                    .path
                    .collection_segments()
                    .filter_map(|(_, segment)| segment.index)
                    .collect()
            })
            .unwrap_or_default();

        let mut resolved = node;
        for field in resolved.output_fields.iter_mut() {
            match assign_destination_indices(&field.path, &source_indices, state) {
                Ok(path) => field.path = path,
                Err(generic) => {
                    let err = Error::UnresolvedCollectionDepth {
                        path: generic.to_string(),
                    };
                    let mut cited = field.clone();
                    cited.path = generic;
                    sink.append(OutcomeRecord::error(err.to_string()).with_field(cited));
                    return;
                }
            }
        }
        out.push(resolved);
    }
}

/// Assign indices to every destination collection segment
///
/// The destination path's own collection-segment count is authoritative
/// for how source indices group into destination containers:
/// - equal depths pair positionally, outermost first;
/// - a shallower destination flattens the remaining source levels into
///   its final collection segment via a running ordinal, scoped to the
///   enclosing destination container;
/// - a deeper destination reuses indices supplied by sibling mappings,
///   or fails with the generic destination path when none exist.
fn assign_destination_indices(
    path: &PathExpression,
    source_indices: &[usize],
    state: &mut DestinationState,
) -> Result<PathExpression, PathExpression> {
    let positions: Vec<usize> = path.collection_segments().map(|(pos, _)| pos).collect();
    let depth = positions.len();
    if depth == 0 {
        return Ok(path.clone());
    }

    let source_depth = source_indices.len();
    let mut resolved = path.clone();
    let mut assigned: Vec<usize> = Vec::with_capacity(depth);

    for (level, pos) in positions.iter().copied().enumerate() {
        // An index written explicitly in the document is kept as-is.
        if let Some(existing) = path.segments()[pos].index {
            assigned.push(existing);
            continue;
        }

        let last = level == depth - 1;
        let index = if last && source_depth > depth {
            let key = (path.stripped_of_indices(), assigned.clone());
            let ordinal = state.ordinals.entry(key).or_insert(0);
            let index = *ordinal;
            *ordinal += 1;
            index
        } else if level < source_depth {
            source_indices[level]
        } else {
            let shape = resolved.prefix(pos + 1).stripped_of_indices();
            match state.supplied.get(&shape) {
                Some(&index) => index,
                None => return Err(path.stripped_of_indices()),
            }
        };

        resolved = resolved.with_index_at(pos, index);
        let shape = resolved.prefix(pos + 1).stripped_of_indices();
        state.supplied.insert(shape, index);
        assigned.push(index);
    }

    Ok(resolved)
}
