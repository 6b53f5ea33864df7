//! Schema Docgen
//!
//! Reference resolution and inheritance flattening of JSON Schemas for
//! documentation generators.
//!
//! Schemas split across many files are loaded into a [`SchemaRepository`],
//! which addresses every schema and sub-schema by file name and JSON Pointer
//! fragment and gives each a stable type name. The [`SchemaResolver`] then
//! computes what a type looks like once its `$ref`/`allOf`/`extends` bases
//! are merged in, and [`obtain_type_descriptions_for_property`] turns a
//! property schema into display types.
//!
//! # Example
//!
//! ```
//! use schema_docgen::{obtain_type_descriptions_for_property, SchemaRepository, SchemaResolver};
//! use serde_json::json;
//!
//! let dir = tempfile::tempdir().unwrap();
//! std::fs::write(
//!     dir.path().join("base.schema.json"),
//!     r#"{ "required": ["id"], "properties": { "id": { "type": "string" } } }"#,
//! ).unwrap();
//! std::fs::write(
//!     dir.path().join("root.schema.json"),
//!     r#"{
//!         "allOf": [{ "$ref": "base.schema.json" }],
//!         "required": ["name"],
//!         "properties": { "name": { "type": "string" } }
//!     }"#,
//! ).unwrap();
//!
//! let mut repository = SchemaRepository::new([dir.path()]);
//! let root = repository.add_root_schema("root.schema.json").unwrap();
//!
//! let mut resolver = SchemaResolver::new(&mut repository);
//! let required = resolver.resolve_all_required(&root, root.schema()).unwrap();
//! assert_eq!(required, vec!["name", "id"]);
//!
//! let properties = resolver.resolve_all_properties(&root, root.schema()).unwrap();
//! assert!(properties.contains_key("id"));
//!
//! let types = obtain_type_descriptions_for_property(
//!     &mut repository,
//!     &root,
//!     &json!({ "type": "array", "items": { "$ref": "base.schema.json" }, "maxItems": 3 }),
//! ).unwrap();
//! assert_eq!(types[0].type_name, "base");
//! assert_eq!(types[0].array_size_info.as_deref(), Some("[*-3]"));
//! ```
//!
//! # Addressing
//!
//! | URL | Entry key | Type name |
//! |-----|-----------|-----------|
//! | `a.schema.json` | `a.schema.json` | `a` |
//! | `a.schema.json#/definitions/x` | `a.schema.json#/definitions/x` | `a-definitions-x` |
//! | `#/definitions/x` inside `a.schema.json` | `a.schema.json#/definitions/x` | `a-definitions-x` |
//! | `#` | whole file | `a` |
//!
//! # Precedence
//!
//! Properties of a base override same-named own properties in
//! [`SchemaResolver::resolve_all_properties`]; own attributes override
//! those of the bases in [`SchemaResolver::resolve_basic_properties`].

mod address;
mod catalog;
mod description;
mod error;
mod legacy;
mod loader;
mod naming;
mod references;
mod repository;
mod resolver;
mod types;

pub use address::{obtain_file_name, obtain_fragment, strip_fragment};
pub use catalog::{
    document_type, generate, Documentation, PropertyDocument, TypeCatalog, TypeDocument,
};
pub use description::{
    array_size_info, obtain_additional_properties, obtain_type_descriptions_for_property,
    AdditionalProperties,
};
pub use error::RepositoryError;
pub use legacy::{merge_properties, normalize_required};
pub use loader::{is_url, load_schema, load_schema_auto, load_schema_str, navigate_fragment};
pub use naming::{definition_type_name, generate_type_name, SCHEMA_FILE_SUFFIX};
pub use references::obtain_referenced_schema_entries;
pub use repository::SchemaRepository;
pub use resolver::{BaseType, SchemaResolver};
pub use types::{Dialect, Entry, GeneratorOptions, SchemaNode, TypeDescription};

#[cfg(feature = "remote")]
pub use loader::load_schema_url;
