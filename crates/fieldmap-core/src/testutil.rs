//! Shared test adapters over JSON trees
//!
//! The engine and session only ever see the adapter traits; these
//! implementations give tests a concrete document technology to drive
//! them with.

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::{json, Value};

use crate::document::adapter::{SourceDocument, TargetDocument};
use crate::document::FieldRef;
use crate::error::Result;
use crate::path::PathExpression;

/// JSON-tree source adapter
pub(crate) struct JsonSource {
    root: Value,
}

impl JsonSource {
    pub(crate) fn new(root: Value) -> Self {
        Self { root }
    }

    fn node_at(&self, path: &PathExpression) -> Option<&Value> {
        let mut current = &self.root;
        for segment in path.segments() {
            current = current.get(segment.name.as_str())?;
            if let Some(index) = segment.index {
                current = current.get(index)?;
            }
        }
        Some(current)
    }
}

impl SourceDocument for JsonSource {
    fn collection_size(&self, container: &PathExpression) -> Result<Option<usize>> {
        Ok(match self.node_at(container) {
            Some(Value::Array(items)) => Some(items.len()),
            _ => None,
        })
    }

    fn element_at(&self, container: &PathExpression, index: usize) -> Result<Option<Value>> {
        Ok(self
            .node_at(container)
            .and_then(|node| node.get(index))
            .cloned())
    }

    fn read(&self, field: &FieldRef) -> Result<Option<Value>> {
        Ok(self.node_at(&field.path).cloned())
    }
}

/// JSON-tree target adapter building containers on demand
///
/// The root is shared so a test can keep observing the document after
/// handing the adapter to a session.
pub(crate) struct JsonTarget {
    root: Rc<RefCell<Value>>,
}

impl JsonTarget {
    pub(crate) fn new() -> Self {
        Self {
            root: Rc::new(RefCell::new(json!({}))),
        }
    }

    /// Shared handle observing everything written into this target
    pub(crate) fn handle(&self) -> Rc<RefCell<Value>> {
        Rc::clone(&self.root)
    }
}

impl TargetDocument for JsonTarget {
    fn write(&mut self, field: &FieldRef, value: Value) -> Result<()> {
        let mut root = self.root.borrow_mut();
        let mut current: &mut Value = &mut root;
        for segment in field.path.segments() {
            if !current.is_object() {
                *current = json!({});
            }
            current = current
                .as_object_mut()
                .unwrap()
                .entry(segment.name.clone())
                .or_insert(Value::Null);
            if let Some(index) = segment.index {
                if !current.is_array() {
                    *current = json!([]);
                }
                let items = current.as_array_mut().unwrap();
                while items.len() <= index {
                    items.push(Value::Null);
                }
                current = &mut items[index];
            }
        }
        *current = value;
        Ok(())
    }
}
