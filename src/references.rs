//! Discovery of every entry that is reachable from a root entry.

use std::collections::HashSet;
use std::rc::Rc;

use serde_json::Value;

use crate::error::RepositoryError;
use crate::repository::SchemaRepository;
use crate::types::Entry;

/// Obtain all entries that are referenced from `entry`, directly or
/// transitively.
///
/// References are followed from `$ref`, `additionalProperties`,
/// `allOf`/`anyOf`/`oneOf`/`not`, legacy `extends`, and the `items` of array
/// schemas, both in the schema itself and in each member of its
/// `properties`, `definitions` and `$defs`. Each referenced entry is then
/// processed the same way.
///
/// Every entry is processed once, so cyclic reference graphs terminate.
/// The result is in depth-first discovery order without duplicates.
/// Unresolvable bare fragments are skipped (the repository logs them).
///
/// # Errors
///
/// Fails if a referenced file cannot be loaded.
pub fn obtain_referenced_schema_entries(
    repository: &mut SchemaRepository,
    entry: &Rc<Entry>,
) -> Result<Vec<Rc<Entry>>, RepositoryError> {
    let mut collector = Collector::default();
    collector.visit(repository, entry)?;
    Ok(collector.found)
}

#[derive(Default)]
struct Collector {
    processed: HashSet<String>,
    seen: HashSet<String>,
    found: Vec<Rc<Entry>>,
}

impl Collector {
    fn visit(
        &mut self,
        repository: &mut SchemaRepository,
        entry: &Rc<Entry>,
    ) -> Result<(), RepositoryError> {
        if !self.processed.insert(entry.key()) {
            return Ok(());
        }

        let referenced = single_schema_references(repository, entry, entry.schema())?;
        for next in referenced {
            if self.seen.insert(next.key()) {
                self.found.push(next.clone());
            }
            self.visit(repository, &next)?;
        }
        Ok(())
    }
}

/// References of `schema` and of each of its properties and definitions.
fn single_schema_references(
    repository: &mut SchemaRepository,
    entry: &Rc<Entry>,
    schema: &Value,
) -> Result<Vec<Rc<Entry>>, RepositoryError> {
    let mut result = Vec::new();
    direct_references(repository, entry, schema, &mut result)?;

    for keyword in ["properties", "definitions", "$defs"] {
        if let Some(members) = schema.get(keyword).and_then(Value::as_object) {
            for member in members.values() {
                direct_references(repository, entry, member, &mut result)?;
            }
        }
    }
    Ok(result)
}

/// References of `schema` itself, not descending into properties.
fn direct_references(
    repository: &mut SchemaRepository,
    entry: &Rc<Entry>,
    schema: &Value,
    result: &mut Vec<Rc<Entry>>,
) -> Result<(), RepositoryError> {
    if !schema.is_object() {
        return Ok(());
    }

    if let Some(reference) = schema.get("$ref").and_then(Value::as_str) {
        if let Some(found) = repository.resolve_ref(entry, reference)? {
            result.push(found);
        }
    }

    if schema.get("type").and_then(Value::as_str) == Some("array") {
        match schema.get("items") {
            Some(Value::Array(items)) => {
                for item in items {
                    direct_references(repository, entry, item, result)?;
                }
            }
            Some(items) => direct_references(repository, entry, items, result)?,
            None => {}
        }
    }

    for keyword in ["additionalProperties", "not", "extends"] {
        match schema.get(keyword) {
            Some(Value::Array(members)) => {
                for member in members {
                    direct_references(repository, entry, member, result)?;
                }
            }
            Some(member) => direct_references(repository, entry, member, result)?,
            None => {}
        }
    }

    for keyword in ["allOf", "anyOf", "oneOf"] {
        if let Some(members) = schema.get(keyword).and_then(Value::as_array) {
            for member in members {
                direct_references(repository, entry, member, result)?;
            }
        }
    }

    Ok(())
}
