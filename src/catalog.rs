//! The documentation view of a populated repository.
//!
//! [`TypeCatalog`] decides which types exist, which of them get their own
//! section, and which names a formatter may turn into links.
//! [`document_type`] produces the flattened view of one type that a
//! formatter renders, and [`generate`] runs both over a set of root schemas.

use std::rc::Rc;

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::description::{
    obtain_additional_properties, obtain_type_descriptions_for_property, AdditionalProperties,
};
use crate::error::RepositoryError;
use crate::naming::{definition_type_name, generate_type_name};
use crate::repository::SchemaRepository;
use crate::resolver::{BaseType, SchemaResolver};
use crate::types::{Dialect, Entry, GeneratorOptions, TypeDescription};

/// Keywords that are shown through other parts of a [`TypeDocument`] and
/// therefore dropped from its attributes.
const STRUCTURAL_KEYWORDS: [&str; 8] = [
    "properties",
    "additionalProperties",
    "required",
    "allOf",
    "$ref",
    "extends",
    "definitions",
    "$defs",
];

/// Type names known after all root schemas have been added.
#[derive(Debug, Clone, Default)]
pub struct TypeCatalog {
    top_level_types: IndexMap<String, Rc<Entry>>,
    known_type_names: Vec<String>,
    linked_type_names: Vec<String>,
    ignorable_type_names: Vec<String>,
}

impl TypeCatalog {
    /// Build the catalog from the current contents of `repository`.
    pub fn build(repository: &SchemaRepository, ignorable_type_names: &[String]) -> Self {
        let mut top_level_types: IndexMap<String, Rc<Entry>> = IndexMap::new();
        let mut known_type_names = Vec::new();

        for (_, entry) in repository.entries() {
            // Duplicates were reported when the repository registered them.
            let type_name = entry.type_name().to_string();
            top_level_types.insert(type_name.clone(), entry.clone());

            let schema = entry.schema();
            if let Some(definitions) = schema.get("definitions").and_then(Value::as_object) {
                known_type_names.extend(
                    definitions
                        .keys()
                        .map(|name| definition_type_name(&type_name, name)),
                );
            }
            if let Some(defs) = schema.get("$defs").and_then(Value::as_object) {
                known_type_names.extend(defs.keys().map(|name| {
                    let fragment = format!("{}/$defs/{}", entry.fragment(), name);
                    generate_type_name(entry.file_name(), Some(&fragment))
                }));
            }
            known_type_names.push(type_name);
        }
        known_type_names.sort();
        known_type_names.dedup();

        // Shortest first; equal lengths keep their sorted order.
        let mut linked_type_names: Vec<String> = known_type_names
            .iter()
            .filter(|name| !ignorable_type_names.contains(*name))
            .cloned()
            .collect();
        linked_type_names.sort_by_key(String::len);

        Self {
            top_level_types,
            known_type_names,
            linked_type_names,
            ignorable_type_names: ignorable_type_names.to_vec(),
        }
    }

    /// Every entry by type name; for duplicate names the later entry.
    pub fn top_level_types(&self) -> &IndexMap<String, Rc<Entry>> {
        &self.top_level_types
    }

    /// Names of all top-level types and their definitions, sorted.
    pub fn known_type_names(&self) -> &[String] {
        &self.known_type_names
    }

    /// Known type names without the ignorable ones, sorted by length.
    pub fn linked_type_names(&self) -> &[String] {
        &self.linked_type_names
    }

    pub fn is_ignorable(&self, type_name: &str) -> bool {
        self.ignorable_type_names.iter().any(|n| n == type_name)
    }

    /// Top-level types that get their own documentation section.
    pub fn documented_types(&self) -> impl Iterator<Item = &Rc<Entry>> + '_ {
        self.top_level_types
            .iter()
            .filter(move |(name, _)| !self.is_ignorable(name))
            .map(|(_, entry)| entry)
    }
}

/// One property of a documented type.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDocument {
    pub name: String,
    pub required: bool,
    pub types: Vec<TypeDescription>,
    /// Present when the property schema has `additionalProperties`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<AdditionalProperties>,
    pub schema: Value,
}

/// The flattened view of one type, ready for a formatter.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeDocument {
    pub type_name: String,
    pub file_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub fragment: String,
    pub dialect: Dialect,
    /// Inherited and own attributes such as `title` or `description`.
    pub attributes: Map<String, Value>,
    /// Type names of the direct bases named by reference.
    pub base_types: Vec<String>,
    pub properties: Vec<PropertyDocument>,
    /// Values of properties the type does not list.
    pub additional_properties: AdditionalProperties,
    pub required: Vec<String>,
}

/// Produce the [`TypeDocument`] of `entry`.
///
/// # Errors
///
/// Fails if a file referenced by the type or one of its bases cannot be
/// loaded.
pub fn document_type(
    repository: &mut SchemaRepository,
    entry: &Rc<Entry>,
) -> Result<TypeDocument, RepositoryError> {
    debug!("Documenting {}", entry);
    let schema = entry.schema();
    let mut resolver = SchemaResolver::new(repository);

    let mut attributes = resolver.resolve_basic_properties(entry, schema)?;
    let additional_properties = obtain_additional_properties(
        resolver.repository(),
        entry,
        attributes.get("additionalProperties"),
    )?;
    for keyword in STRUCTURAL_KEYWORDS {
        attributes.remove(keyword);
    }

    let base_types: Vec<String> = resolver
        .resolve_direct_base_type_entries(entry, schema)?
        .into_iter()
        .filter_map(|base| match base {
            BaseType::Entry(base) => Some(base.type_name().to_string()),
            BaseType::Inline(_) => None,
        })
        .collect();

    let required = resolver.resolve_all_required(entry, schema)?;
    let all_properties = resolver.resolve_all_properties(entry, schema)?;

    let mut properties = Vec::with_capacity(all_properties.len());
    for (name, property_schema) in all_properties {
        let types =
            obtain_type_descriptions_for_property(resolver.repository(), entry, &property_schema)?;
        let additional_properties = match property_schema.get("additionalProperties") {
            Some(value) => Some(obtain_additional_properties(
                resolver.repository(),
                entry,
                Some(value),
            )?),
            None => None,
        };
        properties.push(PropertyDocument {
            required: required.contains(&name),
            name,
            types,
            additional_properties,
            schema: property_schema,
        });
    }

    Ok(TypeDocument {
        type_name: entry.type_name().to_string(),
        file_name: entry.file_name().to_string(),
        fragment: entry.fragment().to_string(),
        dialect: entry.dialect(),
        attributes,
        base_types,
        properties,
        additional_properties,
        required,
    })
}

/// Everything a formatter needs for one documentation run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Documentation {
    pub types: Vec<TypeDocument>,
    pub known_type_names: Vec<String>,
    pub linked_type_names: Vec<String>,
}

/// Load the root schemas of `options` with everything they reference and
/// document every type that is not ignorable.
///
/// # Errors
///
/// Fails on the first root or referenced file that cannot be loaded.
pub fn generate(options: &GeneratorOptions) -> Result<Documentation, RepositoryError> {
    let mut repository = SchemaRepository::new(options.search_paths());
    for input in &options.input_paths {
        repository.add_root_schema(&input.to_string_lossy())?;
    }

    let catalog = TypeCatalog::build(&repository, &options.ignorable_type_names);
    info!(
        "{} entries, {} known type names",
        repository.len(),
        catalog.known_type_names().len()
    );

    let mut types = Vec::new();
    for entry in catalog.documented_types() {
        types.push(document_type(&mut repository, entry)?);
    }

    Ok(Documentation {
        types,
        known_type_names: catalog.known_type_names().to_vec(),
        linked_type_names: catalog.linked_type_names().to_vec(),
    })
}
