//! Per-session expansion memoization
//!
//! Expansion results are cached keyed by collection-node identity.
//! Repeated expansion calls for one key within a session must return a
//! result of identical cardinality to the first - an explicit invariant,
//! not merely an optimization: callers legitimately query expansion
//! multiple times, and results must never grow across calls.

use std::collections::HashMap;

use crate::document::{MappingNode, NodeId};

/// Cache of resolved mapping instances, exclusively owned by one session
#[derive(Debug, Clone, Default)]
pub struct ExpansionCache {
    entries: HashMap<NodeId, Vec<MappingNode>>,
}

impl ExpansionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached result for a collection node, if any
    pub fn get(&self, id: NodeId) -> Option<&[MappingNode]> {
        self.entries.get(&id).map(Vec::as_slice)
    }

    /// Store the result for a collection node
    pub fn insert(&mut self, id: NodeId, resolved: Vec<MappingNode>) {
        self.entries.insert(id, resolved);
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop all cached results, e.g. when the session source changes
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_get() {
        let node = MappingNode::collection(vec![]);
        let mut cache = ExpansionCache::new();
        assert!(cache.get(node.id()).is_none());

        cache.insert(node.id(), vec![]);
        assert!(cache.contains(node.id()));
        assert_eq!(cache.get(node.id()).unwrap().len(), 0);
    }

    #[test]
    fn test_clear() {
        let node = MappingNode::collection(vec![]);
        let mut cache = ExpansionCache::new();
        cache.insert(node.id(), vec![]);
        cache.clear();
        assert!(cache.is_empty());
    }
}
