//! Schema "inheritance" resolution.
//!
//! JSON Schema has no inheritance. For documentation purposes, a schema that
//! names other schemas via `$ref`, `allOf` or legacy `extends` is treated as
//! a type derived from them, and the resolver computes the flattened view of
//! such a type: its properties, required names, and attributes including
//! everything contributed by its bases.
//!
//! Results are fresh values; the cached documents are never modified.
//!
//! Every descent into a base entry is checked against the entries already on
//! the current path, so cyclic `$ref`/`allOf` chains stop with a warning
//! instead of recursing forever. Diamonds are not deduplicated: a common
//! ancestor reached on two paths is merged twice.

use std::rc::Rc;

use serde_json::{Map, Value};
use tracing::warn;

use crate::error::RepositoryError;
use crate::legacy::{merge_properties, normalize_required};
use crate::repository::SchemaRepository;
use crate::types::{Bases, Entry};

/// A direct base of a type.
#[derive(Debug, Clone)]
pub enum BaseType<'s> {
    /// A base named by `$ref` (or a `$ref` member of `allOf`/`extends`).
    Entry(Rc<Entry>),
    /// An inline `allOf`/`extends` member.
    Inline(&'s Value),
}

/// Outcome of following a `$ref` during a merge.
enum Descent {
    Enter(Rc<Entry>),
    Unresolved,
    Cycle,
}

/// Computes flattened views of schemas, looking up references in a
/// [`SchemaRepository`].
pub struct SchemaResolver<'r> {
    repository: &'r mut SchemaRepository,
}

impl<'r> SchemaResolver<'r> {
    pub fn new(repository: &'r mut SchemaRepository) -> Self {
        Self { repository }
    }

    pub fn repository(&mut self) -> &mut SchemaRepository {
        &mut *self.repository
    }

    /// The direct bases of `schema`: the entry its `$ref` names, followed by
    /// each `allOf` (then `extends`) member. Members carrying a `$ref` are
    /// resolved to entries; other members are returned inline. Unresolvable
    /// bare fragments are left out.
    ///
    /// # Errors
    ///
    /// Fails if a referenced file cannot be loaded.
    pub fn resolve_direct_base_type_entries<'s>(
        &mut self,
        entry: &Rc<Entry>,
        schema: &'s Value,
    ) -> Result<Vec<BaseType<'s>>, RepositoryError> {
        let bases = Bases::of(schema);
        let mut result = Vec::new();

        if let Some(reference) = bases.reference {
            if let Some(base) = self.repository.resolve_ref(entry, reference)? {
                result.push(BaseType::Entry(base));
            }
        }

        for member in bases.members {
            match member.get("$ref").and_then(Value::as_str) {
                Some(reference) => {
                    if let Some(base) = self.repository.resolve_ref(entry, reference)? {
                        result.push(BaseType::Entry(base));
                    }
                }
                None => result.push(BaseType::Inline(member)),
            }
        }
        Ok(result)
    }

    /// All `properties` of `schema`, including those of its bases.
    ///
    /// The own properties are inserted first and the properties of each
    /// base are assigned over them afterwards, so when a base defines a
    /// property of the same name, the base's definition is the one returned.
    /// The position of a key is that of its first insertion.
    ///
    /// # Errors
    ///
    /// Fails if a referenced file cannot be loaded.
    pub fn resolve_all_properties(
        &mut self,
        entry: &Rc<Entry>,
        schema: &Value,
    ) -> Result<Map<String, Value>, RepositoryError> {
        let mut trail = vec![entry.key()];
        self.all_properties(entry, schema, &mut trail)
    }

    fn all_properties(
        &mut self,
        entry: &Rc<Entry>,
        schema: &Value,
        trail: &mut Vec<String>,
    ) -> Result<Map<String, Value>, RepositoryError> {
        let mut all = schema
            .get("properties")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();

        let bases = Bases::of(schema);
        if let Some(reference) = bases.reference {
            if let Descent::Enter(base) = self.descend(entry, reference, trail)? {
                let inherited = self.all_properties(&base, base.schema(), trail);
                trail.pop();
                all.extend(inherited?);
            }
        }

        for member in bases.members {
            all.extend(self.all_properties(entry, member, trail)?);
        }
        Ok(all)
    }

    /// All `required` property names of `schema` followed by those of its
    /// bases, in base order. Names are concatenated, not deduplicated.
    ///
    /// For draft-03 documents (and documents without `$schema`), properties
    /// flagged `"required": true` count as required too.
    ///
    /// # Errors
    ///
    /// Fails if a referenced file cannot be loaded.
    pub fn resolve_all_required(
        &mut self,
        entry: &Rc<Entry>,
        schema: &Value,
    ) -> Result<Vec<String>, RepositoryError> {
        let mut trail = vec![entry.key()];
        self.all_required(entry, schema, &mut trail)
    }

    fn all_required(
        &mut self,
        entry: &Rc<Entry>,
        schema: &Value,
        trail: &mut Vec<String>,
    ) -> Result<Vec<String>, RepositoryError> {
        let mut all: Vec<String> = schema
            .get("required")
            .and_then(Value::as_array)
            .map(|arr| {
                arr.iter()
                    .filter_map(|v| v.as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default();

        if entry.dialect().allows_boolean_required() {
            if let Some(properties) = schema.get("properties").and_then(Value::as_object) {
                all.extend(
                    properties
                        .iter()
                        .filter(|(_, p)| p.get("required") == Some(&Value::Bool(true)))
                        .map(|(name, _)| name.clone()),
                );
            }
        }

        let bases = Bases::of(schema);
        if let Some(reference) = bases.reference {
            if let Descent::Enter(base) = self.descend(entry, reference, trail)? {
                let inherited = self.all_required(&base, base.schema(), trail);
                trail.pop();
                all.extend(inherited?);
            }
        }

        for member in bases.members {
            all.extend(self.all_required(entry, member, trail)?);
        }
        Ok(all)
    }

    /// The attributes (`description`, `type`, `minimum`, ...) of `schema`
    /// after inheritance: the attributes of each base are applied first, in
    /// base order, and the schema's own attributes last, so they win.
    ///
    /// # Errors
    ///
    /// Fails if a referenced file cannot be loaded.
    pub fn resolve_basic_properties(
        &mut self,
        entry: &Rc<Entry>,
        schema: &Value,
    ) -> Result<Map<String, Value>, RepositoryError> {
        let mut trail = vec![entry.key()];
        self.basic_properties(entry, schema, &mut trail)
    }

    fn basic_properties(
        &mut self,
        entry: &Rc<Entry>,
        schema: &Value,
        trail: &mut Vec<String>,
    ) -> Result<Map<String, Value>, RepositoryError> {
        let mut resolved = Map::new();

        let bases = Bases::of(schema);
        if let Some(reference) = bases.reference {
            if let Descent::Enter(base) = self.descend(entry, reference, trail)? {
                let inherited = self.basic_properties(&base, base.schema(), trail);
                trail.pop();
                resolved.extend(inherited?);
            }
        }

        for member in bases.members {
            resolved.extend(self.basic_properties(entry, member, trail)?);
        }

        if let Some(own) = schema.as_object() {
            resolved.extend(own.clone());
        }
        Ok(resolved)
    }

    /// A single schema for `entry` with its bases merged in by the legacy
    /// [`merge_properties`] rules, and `$ref`/`allOf`/`extends` removed.
    /// With `required_flags`, the result is passed through
    /// [`normalize_required`].
    ///
    /// # Errors
    ///
    /// Fails if a referenced file cannot be loaded.
    pub fn flatten(&mut self, entry: &Rc<Entry>, required_flags: bool) -> Result<Value, RepositoryError> {
        let mut trail = vec![entry.key()];
        let flattened = Value::Object(self.flattened(entry, entry.schema(), &mut trail)?);
        Ok(if required_flags {
            normalize_required(&flattened)
        } else {
            flattened
        })
    }

    fn flattened(
        &mut self,
        entry: &Rc<Entry>,
        schema: &Value,
        trail: &mut Vec<String>,
    ) -> Result<Map<String, Value>, RepositoryError> {
        let mut derived = schema.as_object().cloned().unwrap_or_default();
        for keyword in ["$ref", "allOf", "extends"] {
            derived.remove(keyword);
        }

        let bases = Bases::of(schema);
        if let Some(reference) = bases.reference {
            if let Descent::Enter(base) = self.descend(entry, reference, trail)? {
                let inherited = self.flattened(&base, base.schema(), trail);
                trail.pop();
                merge_properties(&mut derived, &inherited?);
            }
        }

        for member in bases.members {
            let inherited = self.flattened(entry, member, trail)?;
            merge_properties(&mut derived, &inherited);
        }
        Ok(derived)
    }

    /// Follow `reference` from `entry`. On `Enter`, the base's key has been
    /// pushed onto `trail` and the caller pops it after recursing.
    fn descend(
        &mut self,
        entry: &Rc<Entry>,
        reference: &str,
        trail: &mut Vec<String>,
    ) -> Result<Descent, RepositoryError> {
        let Some(base) = self.repository.resolve_ref(entry, reference)? else {
            return Ok(Descent::Unresolved);
        };
        let key = base.key();
        if trail.contains(&key) {
            warn!(
                "Cyclic reference {} in {} (path: {})",
                reference,
                entry,
                trail.join(" -> ")
            );
            return Ok(Descent::Cycle);
        }
        trail.push(key);
        Ok(Descent::Enter(base))
    }
}
