//! Mapping session
//!
//! A session owns one mapping document, the per-session expansion cache,
//! the source/target documents, and the validation/audit sinks. Sessions
//! are single-threaded and synchronous; many sessions may run concurrently
//! against one shared, read-only converter registry.
//!
//! Every tolerated failure - a risky conversion, a skipped instance, an
//! unreadable field - becomes a sink record at the smallest possible
//! granularity and never aborts sibling processing. Only session-level
//! misconfiguration (no mapping rules, no source document) is fatal.
//!
//! Copyright (c) 2025 Fieldmap Team
//! Licensed under the Apache-2.0 license

pub mod sink;

use std::collections::HashMap;

use serde_json::Value;

use crate::conversion::{ConverterLookup, ConverterRegistry, TypeConversionResolver};
use crate::document::adapter::{SourceDocument, TargetDocument};
use crate::document::{FieldRef, FieldType, LookupTable, MappingDocument, MappingKind, MappingNode};
use crate::error::{Error, Result};
use crate::expansion::{CollectionExpansionEngine, ExpansionCache};

pub use sink::{AuditSink, OutcomeRecord, RecordSink, ValidationSink};

/// One mapping run over a set of documents
pub struct MappingSession<'a> {
    document: MappingDocument,
    registry: &'a ConverterRegistry,
    engine: CollectionExpansionEngine,
    sources: HashMap<String, Box<dyn SourceDocument>>,
    targets: HashMap<String, Box<dyn TargetDocument>>,
    lookup_tables: HashMap<String, LookupTable>,
    expansion_cache: ExpansionCache,
    validations: ValidationSink,
    audits: AuditSink,
}

impl<'a> MappingSession<'a> {
    /// Create a session over a mapping document and a shared registry
    pub fn new(document: MappingDocument, registry: &'a ConverterRegistry) -> Self {
        Self {
            document,
            registry,
            engine: CollectionExpansionEngine::new(),
            sources: HashMap::new(),
            targets: HashMap::new(),
            lookup_tables: HashMap::new(),
            expansion_cache: ExpansionCache::new(),
            validations: ValidationSink::new(),
            audits: AuditSink::new(),
        }
    }

    /// Attach a source document under its identifier
    ///
    /// Changing a source invalidates any expansion results computed
    /// against the previous one.
    pub fn set_source(&mut self, doc_id: impl Into<String>, source: Box<dyn SourceDocument>) {
        self.sources.insert(doc_id.into(), source);
        self.expansion_cache.clear();
    }

    /// Attach a target document under its identifier
    pub fn set_target(&mut self, doc_id: impl Into<String>, target: Box<dyn TargetDocument>) {
        self.targets.insert(doc_id.into(), target);
    }

    /// Register a lookup table for Lookup mappings
    pub fn add_lookup_table(&mut self, table: LookupTable) {
        self.lookup_tables.insert(table.name.clone(), table);
    }

    /// Validation outcomes collected so far
    pub fn validations(&self) -> &ValidationSink {
        &self.validations
    }

    /// Audit outcomes collected so far
    pub fn audits(&self) -> &AuditSink {
        &self.audits
    }

    /// Whether any sink holds an error record
    pub fn has_errors(&self) -> bool {
        self.validations.has_errors() || self.audits.has_errors()
    }

    /// Whether any sink holds a warning record
    pub fn has_warns(&self) -> bool {
        self.validations.has_warns() || self.audits.has_warns()
    }

    /// Whether any sink holds an info record
    pub fn has_infos(&self) -> bool {
        self.validations.has_infos() || self.audits.has_infos()
    }

    /// Expand one Collection mapping against its source document
    ///
    /// Pure given the node, the attached source, and the session cache.
    pub fn expand_collection(&mut self, node: &MappingNode) -> Result<Vec<MappingNode>> {
        let Some(doc_id) = primary_doc_id(node) else {
            log::debug!("collection mapping has no input fields, nothing to expand");
            return Ok(Vec::new());
        };
        let doc_id = doc_id.to_string();
        let source = self
            .sources
            .get(&doc_id)
            .ok_or_else(|| Error::SessionMisconfigured {
                message: format!("no source document '{}' set", doc_id),
            })?;
        Ok(self.engine.expand(
            node,
            source.as_ref(),
            &mut self.expansion_cache,
            &mut self.validations,
        ))
    }

    /// Check the mapping document against the registry
    ///
    /// Appends one record per finding; never stops at the first field.
    pub fn validate(&mut self) -> Result<()> {
        let mappings = self.document.mappings.clone();
        for node in &mappings {
            self.validate_node(node);
        }
        Ok(())
    }

    fn validate_node(&mut self, node: &MappingNode) {
        match node.kind {
            MappingKind::Collection => {
                if node.children.is_empty() {
                    self.validations
                        .append(OutcomeRecord::warn("collection mapping has no child mappings"));
                }
                for child in &node.children {
                    self.validate_node(child);
                }
                return;
            }
            MappingKind::Lookup => {
                let known = node
                    .lookup_table_name
                    .as_ref()
                    .is_some_and(|name| self.lookup_tables.contains_key(name));
                if !known {
                    self.validations.append(OutcomeRecord::error(format!(
                        "lookup mapping references unknown table '{}'",
                        node.lookup_table_name.as_deref().unwrap_or("")
                    )));
                }
            }
            _ => {}
        }

        if node.input_fields.is_empty() || node.output_fields.is_empty() {
            self.validations
                .append(OutcomeRecord::warn("mapping has no input or output fields"));
            return;
        }

        let registry = self.registry;
        let resolver = TypeConversionResolver::new(registry);
        let Some(input) = node.primary_input() else {
            return;
        };
        for output in &node.output_fields {
            match resolver.resolve(input, output) {
                ConverterLookup::Passthrough => {}
                ConverterLookup::Found(converter) => {
                    for (severity, message) in resolver.classify_concerns(converter) {
                        self.validations
                            .append(OutcomeRecord::new(severity, message).with_field(output.clone()));
                    }
                }
                ConverterLookup::NotFound => {
                    let record = if input.field_type.requires_class_lookup()
                        || output.field_type.requires_class_lookup()
                    {
                        OutcomeRecord::error(format!(
                            "no converter for class '{}' to class '{}'",
                            input.class_name.as_deref().unwrap_or("?"),
                            output.class_name.as_deref().unwrap_or("?"),
                        ))
                    } else {
                        let warn = Error::NoConverterAvailable {
                            from: input.field_type,
                            to: output.field_type,
                        };
                        OutcomeRecord::warn(warn.to_string())
                    };
                    self.validations.append(record.with_field(output.clone()));
                }
            }
        }
    }

    /// Expand and execute every mapping in the document
    pub fn process(&mut self) -> Result<()> {
        if self.document.is_empty() {
            return Err(Error::SessionMisconfigured {
                message: "mapping document has no rules".to_string(),
            });
        }
        if self.sources.is_empty() {
            return Err(Error::SessionMisconfigured {
                message: "no source document set".to_string(),
            });
        }

        let mappings = self.document.mappings.clone();
        for node in mappings {
            if node.kind == MappingKind::Collection {
                let resolved = self.expand_collection(&node)?;
                for instance in resolved {
                    self.execute_node(&instance);
                }
            } else {
                self.execute_node(&node);
            }
        }
        Ok(())
    }

    /// Execute one concrete mapping; failures become audit records
    fn execute_node(&mut self, node: &MappingNode) {
        if node.kind == MappingKind::Collection {
            log::warn!("collection mapping reached execution without expansion");
            return;
        }

        let mut inputs: Vec<(FieldRef, Option<Value>)> = Vec::with_capacity(node.input_fields.len());
        for field in &node.input_fields {
            let Some(source) = self.sources.get(&field.doc_id) else {
                self.audits.append(
                    OutcomeRecord::error(format!(
                        "no source document '{}' for field '{}'",
                        field.doc_id, field.path
                    ))
                    .with_field(field.clone()),
                );
                return;
            };
            match source.read(field) {
                Ok(value) => inputs.push((field.clone(), value)),
                Err(err) => {
                    self.audits
                        .append(OutcomeRecord::error(err.to_string()).with_field(field.clone()));
                    return;
                }
            }
        }

        match node.kind {
            MappingKind::Map => self.execute_map(node, &inputs),
            MappingKind::Separate => self.execute_separate(node, &inputs),
            MappingKind::Combine => self.execute_combine(node, &inputs),
            MappingKind::Lookup => self.execute_lookup(node, &inputs),
            MappingKind::Collection => {}
        }
    }

    fn execute_map(&mut self, node: &MappingNode, inputs: &[(FieldRef, Option<Value>)]) {
        let Some((input, Some(value))) = inputs.first().map(|(f, v)| (f, v.as_ref())) else {
            // An absent source value leaves the destination untouched.
            return;
        };
        for output in &node.output_fields {
            self.convert_and_write(input, output, value);
        }
    }

    fn execute_separate(&mut self, node: &MappingNode, inputs: &[(FieldRef, Option<Value>)]) {
        let Some((input, Some(value))) = inputs.first().map(|(f, v)| (f, v.as_ref())) else {
            return;
        };
        let Some(text) = value_to_string(value) else {
            self.audits.append(
                OutcomeRecord::error("separate mapping input is not a textual value")
                    .with_field(input.clone())
                    .with_value(value.clone()),
            );
            return;
        };

        let delimiter = node.delimiter.as_deref().unwrap_or(" ");
        let parts: Vec<&str> = text.split(delimiter).collect();
        for (position, output) in node.output_fields.iter().enumerate() {
            let wanted = output.index_in_parent.unwrap_or(position);
            let Some(part) = parts.get(wanted) else {
                self.audits.append(
                    OutcomeRecord::warn(format!(
                        "separate produced {} parts, field wants part {}",
                        parts.len(),
                        wanted
                    ))
                    .with_field(output.clone()),
                );
                continue;
            };
            let part_field = FieldRef {
                field_type: FieldType::String,
                ..input.clone()
            };
            self.convert_and_write(&part_field, output, &Value::String(part.to_string()));
        }
    }

    fn execute_combine(&mut self, node: &MappingNode, inputs: &[(FieldRef, Option<Value>)]) {
        let Some(output) = node.output_fields.first() else {
            return;
        };

        let mut ordered: Vec<(usize, &FieldRef, &Option<Value>)> = inputs
            .iter()
            .enumerate()
            .map(|(position, (field, value))| {
                (field.index_in_parent.unwrap_or(position), field, value)
            })
            .collect();
        ordered.sort_by_key(|(ordinal, _, _)| *ordinal);

        let delimiter = node.delimiter.as_deref().unwrap_or(" ");
        let joined = ordered
            .iter()
            .map(|(_, _, value)| {
                value
                    .as_ref()
                    .and_then(value_to_string)
                    .unwrap_or_default()
            })
            .collect::<Vec<String>>()
            .join(delimiter);

        let Some((input, _)) = inputs.first() else {
            return;
        };
        let combined_field = FieldRef {
            field_type: FieldType::String,
            ..input.clone()
        };
        self.convert_and_write(&combined_field, output, &Value::String(joined));
    }

    fn execute_lookup(&mut self, node: &MappingNode, inputs: &[(FieldRef, Option<Value>)]) {
        let Some((input, Some(value))) = inputs.first().map(|(f, v)| (f, v.as_ref())) else {
            return;
        };
        let Some(table) = node
            .lookup_table_name
            .as_ref()
            .and_then(|name| self.lookup_tables.get(name))
        else {
            self.audits.append(
                OutcomeRecord::error(format!(
                    "lookup table '{}' is not registered",
                    node.lookup_table_name.as_deref().unwrap_or("")
                ))
                .with_field(input.clone()),
            );
            return;
        };

        let Some(key) = value_to_string(value) else {
            self.audits.append(
                OutcomeRecord::error("lookup mapping input is not a textual value")
                    .with_field(input.clone())
                    .with_value(value.clone()),
            );
            return;
        };
        let Some(mapped) = table.translate(&key).map(str::to_string) else {
            self.audits.append(
                OutcomeRecord::warn(format!("lookup table has no entry for '{}'", key))
                    .with_field(input.clone())
                    .with_value(value.clone()),
            );
            return;
        };

        let lookup_field = FieldRef {
            field_type: FieldType::String,
            ..input.clone()
        };
        for output in &node.output_fields {
            self.convert_and_write(&lookup_field, output, &Value::String(mapped.clone()));
        }
    }

    /// Convert one value for one destination field and write it
    ///
    /// A conversion failure leaves the destination unset and never aborts
    /// sibling fields in the same pass.
    fn convert_and_write(&mut self, input: &FieldRef, output: &FieldRef, value: &Value) {
        let registry = self.registry;
        let resolver = TypeConversionResolver::new(registry);

        let converted = match resolver.resolve(input, output) {
            ConverterLookup::Passthrough => Ok(value.clone()),
            ConverterLookup::Found(_) => {
                resolver.convert_value(value, input.field_type, output.field_type)
            }
            ConverterLookup::NotFound => {
                let warn = Error::NoConverterAvailable {
                    from: input.field_type,
                    to: output.field_type,
                };
                self.audits
                    .append(OutcomeRecord::warn(warn.to_string()).with_field(output.clone()));
                // A runtime coercion may still succeed.
                resolver.convert_value(value, input.field_type, output.field_type)
            }
        };

        let converted = match converted {
            Ok(converted) => converted,
            Err(err) => {
                self.audits.append(
                    OutcomeRecord::error(err.to_string())
                        .with_field(output.clone())
                        .with_value(value.clone()),
                );
                return;
            }
        };

        let Some(target) = self.targets.get_mut(&output.doc_id) else {
            self.audits.append(
                OutcomeRecord::error(format!(
                    "no target document '{}' for field '{}'",
                    output.doc_id, output.path
                ))
                .with_field(output.clone()),
            );
            return;
        };
        if let Err(err) = target.write(output, converted) {
            self.audits
                .append(OutcomeRecord::error(err.to_string()).with_field(output.clone()));
        }
    }
}

/// The document id driving a node's expansion, from its first input field
fn primary_doc_id(node: &MappingNode) -> Option<&str> {
    node.primary_input()
        .map(|field| field.doc_id.as_str())
        .or_else(|| node.children.iter().find_map(primary_doc_id))
}

fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
