//! Display types of properties.
//!
//! A property schema is turned into one or more [`TypeDescription`]s: a
//! scalar JSON type, a link to a named type, an array of either with a size
//! annotation, or a union of several of these. [`AdditionalProperties`]
//! describes the values of dictionary-like objects the same way.

use std::rc::Rc;

use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::error::RepositoryError;
use crate::repository::SchemaRepository;
use crate::types::{json_type_name, Entry, SchemaNode, TypeDescription};

/// Describe the type of `property_schema`, a property found in the schema
/// of `entry`.
///
/// Only the first matching shape of [`SchemaNode::classify`] is used.
/// Ambiguities (several item types, several `allOf` members, no type at all)
/// are logged as warnings; the result is still a usable description.
///
/// # Errors
///
/// Fails if a referenced file cannot be loaded.
pub fn obtain_type_descriptions_for_property(
    repository: &mut SchemaRepository,
    entry: &Rc<Entry>,
    property_schema: &Value,
) -> Result<Vec<TypeDescription>, RepositoryError> {
    let descriptions = match SchemaNode::classify(property_schema) {
        SchemaNode::Array {
            items,
            min_items,
            max_items,
        } => {
            let item_descriptions = obtain_type_descriptions_for_property(repository, entry, items)?;
            if item_descriptions.len() > 1 {
                warn!(
                    "Array items in {} describe {} types, using the first",
                    entry,
                    item_descriptions.len()
                );
            }
            let mut description = item_descriptions
                .into_iter()
                .next()
                .unwrap_or_else(TypeDescription::object);
            description.array_size_info = Some(array_size_info(min_items, max_items));
            vec![description]
        }

        SchemaNode::AnyOf { member_type } => describe_type(entry, member_type),

        SchemaNode::AllOf(members) => {
            if members.len() > 1 {
                warn!(
                    "allOf with {} members in a property of {}, describing the first only",
                    members.len(),
                    entry
                );
            }
            obtain_type_descriptions_for_property(repository, entry, &members[0])?
        }

        SchemaNode::Ref(reference) => match repository.resolve_ref(entry, reference)? {
            Some(target) => vec![TypeDescription {
                r#type: target
                    .schema()
                    .get("type")
                    .and_then(Value::as_str)
                    .map(String::from),
                type_name: target.type_name().to_string(),
                array_size_info: None,
            }],
            None => {
                warn!("Unresolved reference {} in {}, describing as object", reference, entry);
                vec![TypeDescription::object()]
            }
        },

        SchemaNode::OneOf(members) => {
            let mut union = Vec::new();
            for member in members {
                union.extend(obtain_type_descriptions_for_property(repository, entry, member)?);
            }
            union
        }

        SchemaNode::Typed(ty) => describe_type(entry, ty),

        SchemaNode::Untyped => {
            warn!("Property in {} has no type, describing as object", entry);
            vec![TypeDescription::object()]
        }
    };
    Ok(descriptions)
}

/// What an object schema says about properties it does not list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AdditionalProperties {
    /// `additionalProperties: false`.
    NotAllowed,
    /// Any other value. The descriptions are empty unless the value is a
    /// schema object.
    Allowed(Vec<TypeDescription>),
}

/// Describe the `additionalProperties` value of a schema in `entry`.
///
/// # Errors
///
/// Fails if a file referenced by the value schema cannot be loaded.
pub fn obtain_additional_properties(
    repository: &mut SchemaRepository,
    entry: &Rc<Entry>,
    additional_properties: Option<&Value>,
) -> Result<AdditionalProperties, RepositoryError> {
    match additional_properties {
        Some(Value::Bool(false)) => Ok(AdditionalProperties::NotAllowed),
        Some(schema @ Value::Object(_)) => Ok(AdditionalProperties::Allowed(
            obtain_type_descriptions_for_property(repository, entry, schema)?,
        )),
        _ => Ok(AdditionalProperties::Allowed(Vec::new())),
    }
}

/// Descriptions for a `type` value: one per listed type.
fn describe_type(entry: &Entry, ty: &Value) -> Vec<TypeDescription> {
    match ty {
        Value::String(name) => vec![TypeDescription::scalar(name)],
        Value::Array(names) if names.iter().all(Value::is_string) => names
            .iter()
            .filter_map(Value::as_str)
            .map(TypeDescription::scalar)
            .collect(),
        other => {
            warn!(
                "Unsupported type {} ({}) in {}, describing as object",
                other,
                json_type_name(other),
                entry
            );
            vec![TypeDescription::object()]
        }
    }
}

/// Size annotation of an array from its `minItems`/`maxItems`.
///
/// `[n]` when both bounds are equal, `[min-max]` for a range, `*` for an
/// open end and `[]` when neither bound is given.
pub fn array_size_info(min_items: Option<&Value>, max_items: Option<&Value>) -> String {
    match (min_items.map(bound), max_items.map(bound)) {
        (Some(min), Some(max)) if min == max => format!("[{}]", min),
        (Some(min), Some(max)) => format!("[{}-{}]", min, max),
        (Some(min), None) => format!("[{}-*]", min),
        (None, Some(max)) => format!("[*-{}]", max),
        (None, None) => "[]".to_string(),
    }
}

fn bound(value: &Value) -> String {
    match value.as_str() {
        Some(s) => s.to_string(),
        None => value.to_string(),
    }
}
