//! Fieldmap Core - Declarative field mapping across document models
//!
//! This crate provides the core engine for transforming data between
//! heterogeneous document models (object graphs, JSON trees, XML trees,
//! delimited text) driven by a declarative mapping specification.
//!
//! # Main Components
//!
//! - **Field Paths**: A normalized, technology-agnostic addressing scheme
//!   for values inside nested scalar/complex/collection structures
//! - **Collection Expansion**: Turns mapping rules written against path
//!   patterns into concrete per-index mappings, handling independent
//!   collection depths and renamed/asymmetric structures
//! - **Type Conversion**: Converter registry lookup, concern-to-severity
//!   classification, and runtime value coercion
//! - **Sessions**: Per-run state with append-only validation/audit sinks
//!
//! Per-technology document adapters stay outside this crate and plug in
//! through the traits in [`document::adapter`].
//!
//! # Example
//!
//! ```no_run
//! use fieldmap_core::{
//!     ConverterRegistry, FieldRef, FieldType, MappingDocument, MappingNode,
//!     MappingSession,
//! };
//!
//! fn example() -> fieldmap_core::Result<()> {
//!     let registry = ConverterRegistry::with_defaults();
//!     let document = MappingDocument::new(vec![MappingNode::map(
//!         FieldRef::new("src", "/orders<>/sku", FieldType::String)?,
//!         FieldRef::new("tgt", "/items<>/sku", FieldType::String)?,
//!     )]);
//!
//!     let mut session = MappingSession::new(document, &registry);
//!     // session.set_source(...) / session.set_target(...) with adapters
//!     session.process()?;
//!     Ok(())
//! }
//! ```

pub mod conversion;
pub mod document;
pub mod error;
pub mod expansion;
pub mod path;
pub mod session;

#[cfg(test)]
pub(crate) mod testutil;

// Re-export main types for convenience
pub use conversion::{
    ConversionConcern, Converter, ConverterLookup, ConverterRegistry, TypeConversionResolver,
};
pub use document::adapter::{SourceDocument, TargetDocument};
pub use document::{
    FieldRef, FieldType, LookupTable, MappingDocument, MappingKind, MappingNode, NodeId,
};
pub use error::{Error, Result, Severity};
pub use expansion::{CollectionExpansionEngine, CollectionIndexResolver, ExpansionCache};
pub use path::{CollectionStyle, MalformedPathError, PathExpression, PathSegment};
pub use session::{AuditSink, MappingSession, OutcomeRecord, RecordSink, ValidationSink};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_path_parse_is_reexported() {
        let path = PathExpression::parse("/orders<>/sku").unwrap();
        assert_eq!(path.collection_depth(), 1);
    }

    #[test]
    fn test_severity_reexport_ordering() {
        assert!(Severity::Warn < Severity::Error);
    }
}
