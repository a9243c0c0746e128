//! Expansion engine scenario tests
//!
//! These tests drive the engine through a minimal JSON-tree source
//! adapter; the engine itself only ever sees the adapter traits.

use serde_json::json;

use crate::document::{FieldRef, FieldType, MappingNode};
use crate::expansion::{CollectionExpansionEngine, ExpansionCache};
use crate::session::sink::ValidationSink;
use crate::testutil::JsonSource;

fn map(source_path: &str, target_path: &str) -> MappingNode {
    MappingNode::map(
        FieldRef::new("src", source_path, FieldType::String).unwrap(),
        FieldRef::new("tgt", target_path, FieldType::String).unwrap(),
    )
}

fn input_paths(resolved: &[MappingNode]) -> Vec<String> {
    resolved
        .iter()
        .map(|node| node.input_fields[0].path.to_string())
        .collect()
}

fn output_paths(resolved: &[MappingNode]) -> Vec<String> {
    resolved
        .iter()
        .map(|node| node.output_fields[0].path.to_string())
        .collect()
}

#[test]
fn test_two_level_ordering_is_outer_major() {
    let source = JsonSource::new(json!({
        "orders": [
            {"lines": [{"sku": "a"}, {"sku": "b"}]},
            {"lines": [{"sku": "c"}]},
        ]
    }));
    let collection = MappingNode::collection(vec![map(
        "/orders<>/lines<>/sku",
        "/items<>/rows<>/sku",
    )]);

    let engine = CollectionExpansionEngine::new();
    let mut cache = ExpansionCache::new();
    let mut sink = ValidationSink::new();
    let resolved = engine.expand(&collection, &source, &mut cache, &mut sink);

    assert_eq!(
        input_paths(&resolved),
        vec![
            "/orders<0>/lines<0>/sku",
            "/orders<0>/lines<1>/sku",
            "/orders<1>/lines<0>/sku",
        ]
    );
    assert_eq!(
        output_paths(&resolved),
        vec![
            "/items<0>/rows<0>/sku",
            "/items<0>/rows<1>/sku",
            "/items<1>/rows<0>/sku",
        ]
    );
    assert!(sink.is_empty());
}

#[test]
fn test_repeated_expansion_is_idempotent() {
    let source = JsonSource::new(json!({
        "orders": [
            {"lines": [{"sku": "a"}, {"sku": "b"}]},
            {"lines": [{"sku": "c"}]},
        ]
    }));
    let collection = MappingNode::collection(vec![map(
        "/orders<>/lines<>/sku",
        "/items<>/rows<>/sku",
    )]);

    let engine = CollectionExpansionEngine::new();
    let mut cache = ExpansionCache::new();
    let mut sink = ValidationSink::new();

    let first = engine.expand(&collection, &source, &mut cache, &mut sink);
    let second = engine.expand(&collection, &source, &mut cache, &mut sink);

    assert_eq!(first.len(), second.len());
    assert_eq!(input_paths(&first), input_paths(&second));
    assert_eq!(output_paths(&first), output_paths(&second));
}

#[test]
fn test_expansion_does_not_mutate_the_document() {
    let source = JsonSource::new(json!({
        "orders": [{"lines": [{"sku": "a"}]}]
    }));
    let collection = MappingNode::collection(vec![map(
        "/orders<>/lines<>/sku",
        "/items<>/rows<>/sku",
    )]);
    let before = collection.clone();

    let engine = CollectionExpansionEngine::new();
    let mut cache = ExpansionCache::new();
    let mut sink = ValidationSink::new();
    engine.expand(&collection, &source, &mut cache, &mut sink);

    assert_eq!(collection, before);
}

#[test]
fn test_unmatched_destination_depth_reports_per_instance() {
    let source = JsonSource::new(json!({
        "firstArray": [
            {"secondArray": [{"value": "x"}]},
            {"secondArray": [{"value": "y"}]},
        ]
    }));
    // The destination declares a third collection level no source chain or
    // sibling supplies.
    let collection = MappingNode::collection(vec![map(
        "/firstArray<>/secondArray<>/value",
        "/dFirst<>/dSecond<>/dThird<>/value",
    )]);

    let engine = CollectionExpansionEngine::new();
    let mut cache = ExpansionCache::new();
    let mut sink = ValidationSink::new();
    let resolved = engine.expand(&collection, &source, &mut cache, &mut sink);

    assert!(resolved.is_empty());
    let errors: Vec<_> = sink.at_severity(crate::Severity::Error).collect();
    assert_eq!(errors.len(), 2);
    for record in errors {
        assert!(record.message.contains("/dFirst<>/dSecond<>/dThird<>/value"));
        let cited = record.field.as_ref().unwrap();
        assert_eq!(cited.path.to_string(), "/dFirst<>/dSecond<>/dThird<>/value");
    }
}

#[test]
fn test_asymmetric_collapse_flattens_leaf_combinations() {
    // 3-level source: 2 outer, mid-level sizes [2, 1], one leaf each.
    let source = JsonSource::new(json!({
        "a": [
            {"b": [
                {"c": [{"name": "n1", "value": "v1"}]},
                {"c": [{"name": "n2", "value": "v2"}]},
            ]},
            {"b": [
                {"c": [{"name": "n3", "value": "v3"}]},
            ]},
        ]
    }));
    let collection = MappingNode::collection(vec![
        map("/a<>/b<>/c<>/name", "/flat<>/name"),
        map("/a<>/b<>/c<>/value", "/flat<>/value"),
    ]);

    let engine = CollectionExpansionEngine::new();
    let mut cache = ExpansionCache::new();
    let mut sink = ValidationSink::new();
    let resolved = engine.expand(&collection, &source, &mut cache, &mut sink);

    assert!(sink.is_empty());
    // One destination element per leaf combination, both sibling mappings
    // aligned on the same flat ordinal, depth-first.
    assert_eq!(
        output_paths(&resolved),
        vec![
            "/flat<0>/name",
            "/flat<0>/value",
            "/flat<1>/name",
            "/flat<1>/value",
            "/flat<2>/name",
            "/flat<2>/value",
        ]
    );
    assert_eq!(
        input_paths(&resolved)[4],
        "/a<1>/b<0>/c<0>/name".to_string()
    );
}

#[test]
fn test_phantom_element_for_absent_collection_ancestor() {
    let source = JsonSource::new(json!({"order": {"id": "o-1"}}));
    let collection = MappingNode::collection(vec![map("/contacts<>/name", "/people<>/name")]);

    let engine = CollectionExpansionEngine::new();
    let mut cache = ExpansionCache::new();
    let mut sink = ValidationSink::new();
    let resolved = engine.expand(&collection, &source, &mut cache, &mut sink);

    assert!(sink.is_empty());
    assert_eq!(input_paths(&resolved), vec!["/contacts<0>/name"]);
    assert_eq!(output_paths(&resolved), vec!["/people<0>/name"]);
}

#[test]
fn test_sibling_supplied_indices_for_deeper_destination() {
    let source = JsonSource::new(json!({
        "groups": [
            {"name": "g1", "items": [{"id": "i1"}, {"id": "i2"}]},
        ]
    }));
    // The second mapping's destination is one level deeper than its own
    // source chain; the first mapping supplies the inner index.
    let collection = MappingNode::collection(vec![
        map("/groups<>/items<>/id", "/out<>/meta<>/id"),
        map("/groups<>/name", "/out<>/meta<>/tag"),
    ]);

    let engine = CollectionExpansionEngine::new();
    let mut cache = ExpansionCache::new();
    let mut sink = ValidationSink::new();
    let resolved = engine.expand(&collection, &source, &mut cache, &mut sink);

    assert!(sink.is_empty());
    assert_eq!(
        output_paths(&resolved),
        vec!["/out<0>/meta<0>/id", "/out<0>/meta<1>/id", "/out<0>/meta<1>/tag"]
    );
}

#[test]
fn test_renamed_shapes_expand_independently() {
    let source = JsonSource::new(json!({
        "orders": [{"sku": "a"}, {"sku": "b"}],
        "shipments": [{"ref": "s1"}],
    }));
    let collection = MappingNode::collection(vec![
        map("/orders<>/sku", "/items<>/sku"),
        map("/shipments<>/ref", "/deliveries<>/ref"),
    ]);

    let engine = CollectionExpansionEngine::new();
    let mut cache = ExpansionCache::new();
    let mut sink = ValidationSink::new();
    let resolved = engine.expand(&collection, &source, &mut cache, &mut sink);

    assert_eq!(
        input_paths(&resolved),
        vec!["/orders<0>/sku", "/orders<1>/sku", "/shipments<0>/ref"]
    );
    assert!(sink.is_empty());
}

#[test]
fn test_empty_collection_yields_no_instances() {
    let source = JsonSource::new(json!({"orders": []}));
    let collection = MappingNode::collection(vec![map("/orders<>/sku", "/items<>/sku")]);

    let engine = CollectionExpansionEngine::new();
    let mut cache = ExpansionCache::new();
    let mut sink = ValidationSink::new();
    let resolved = engine.expand(&collection, &source, &mut cache, &mut sink);

    assert!(resolved.is_empty());
    assert!(sink.is_empty());
}
