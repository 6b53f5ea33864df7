//! Core types shared by the repository, resolver and description modules.

use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use serde::Serialize;
use serde_json::Value;

use crate::address::entry_key;
use crate::loader::navigate_fragment;

static NULL: Value = Value::Null;

/// Returns the JSON type name for log messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// JSON Schema dialect of a document, detected from its `$schema`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Dialect {
    /// draft-03: boolean `required` on properties, `extends` for inheritance.
    Draft3,
    /// draft-04: `required` arrays, `allOf` for inheritance.
    Draft4,
    /// draft-06 and later, including 2019-09 and 2020-12.
    Modern,
    /// No (or an unknown) `$schema`.
    Unspecified,
}

impl Dialect {
    /// Detect the dialect of a whole document.
    pub fn detect(document: &Value) -> Self {
        let Some(uri) = document.get("$schema").and_then(Value::as_str) else {
            return Dialect::Unspecified;
        };
        if uri.contains("draft-03") {
            Dialect::Draft3
        } else if uri.contains("draft-04") {
            Dialect::Draft4
        } else if uri.contains("json-schema.org") {
            Dialect::Modern
        } else {
            Dialect::Unspecified
        }
    }

    /// Whether `"required": true` on a property marks it as required.
    pub fn allows_boolean_required(self) -> bool {
        matches!(self, Dialect::Draft3 | Dialect::Unspecified)
    }
}

/// An addressable view into a loaded schema document.
///
/// The file name and directory form the base URI of the schema; the
/// fragment is a JSON Pointer into the document (empty for the whole file).
/// Entries are created by the [`SchemaRepository`](crate::SchemaRepository)
/// and shared as `Rc<Entry>`; the same key always yields the same `Rc`.
#[derive(Debug)]
pub struct Entry {
    file_name: String,
    directory: PathBuf,
    fragment: String,
    document: Rc<Value>,
    type_name: String,
    dialect: Dialect,
}

impl Entry {
    /// Create an entry for `fragment` of `document`.
    ///
    /// Returns `None` if the fragment does not point into the document.
    pub(crate) fn new(
        file_name: &str,
        directory: &Path,
        fragment: &str,
        document: Rc<Value>,
        type_name: String,
    ) -> Option<Self> {
        navigate_fragment(&document, fragment)?;
        let dialect = Dialect::detect(&document);
        Some(Self {
            file_name: file_name.to_string(),
            directory: directory.to_path_buf(),
            fragment: fragment.to_string(),
            document,
            type_name,
            dialect,
        })
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Directory the file was loaded from.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn fragment(&self) -> &str {
        &self.fragment
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// The schema this entry points to (a subtree of the cached document).
    pub fn schema(&self) -> &Value {
        navigate_fragment(&self.document, &self.fragment).unwrap_or(&NULL)
    }

    /// The whole document this entry belongs to.
    pub fn document(&self) -> &Rc<Value> {
        &self.document
    }

    /// Repository cache key of this entry.
    pub fn key(&self) -> String {
        entry_key(&self.file_name, &self.fragment)
    }

    /// Whether this entry is the whole-file entry of its document.
    pub fn is_whole_file(&self) -> bool {
        self.fragment.is_empty()
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.directory.join(&self.file_name).display())?;
        if !self.fragment.is_empty() {
            write!(f, "#{}", self.fragment)?;
        }
        Ok(())
    }
}

/// Display-ready type of a property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeDescription {
    /// The JSON type (`None` when a referenced type declares none).
    pub r#type: Option<String>,
    /// The name to display and link; a type name or a JSON type.
    pub type_name: String,
    /// Array size annotation such as `[2]` or `[1-*]`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub array_size_info: Option<String>,
}

impl TypeDescription {
    /// A description whose type and type name are the same JSON type.
    pub fn scalar(json_type: &str) -> Self {
        Self {
            r#type: Some(json_type.to_string()),
            type_name: json_type.to_string(),
            array_size_info: None,
        }
    }

    /// The generic fallback description.
    pub fn object() -> Self {
        Self::scalar("object")
    }
}

/// The shape of a property schema, checked in priority order.
///
/// Only the first matching shape applies; a schema with both `$ref` and
/// `oneOf` is a `Ref`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SchemaNode<'a> {
    /// `"type": "array"` with an `items` schema.
    Array {
        items: &'a Value,
        min_items: Option<&'a Value>,
        max_items: Option<&'a Value>,
    },
    /// `anyOf` where some member declares a `type` (enum-as-anyOf); holds
    /// the first such type.
    AnyOf { member_type: &'a Value },
    /// Non-empty `allOf`.
    AllOf(&'a [Value]),
    /// `$ref` string.
    Ref(&'a str),
    /// `oneOf` list.
    OneOf(&'a [Value]),
    /// A `type` (string or list of strings).
    Typed(&'a Value),
    /// Nothing usable.
    Untyped,
}

impl<'a> SchemaNode<'a> {
    /// Classify a property schema.
    pub fn classify(schema: &'a Value) -> Self {
        let ty = schema.get("type");

        if ty.and_then(Value::as_str) == Some("array") {
            if let Some(items) = schema.get("items").filter(|i| i.is_object()) {
                return SchemaNode::Array {
                    items,
                    min_items: schema.get("minItems"),
                    max_items: schema.get("maxItems"),
                };
            }
        }

        if let Some(any_of) = schema.get("anyOf").and_then(Value::as_array) {
            if let Some(member_type) = any_of.iter().find_map(|m| m.get("type")) {
                return SchemaNode::AnyOf { member_type };
            }
        }

        if let Some(all_of) = schema.get("allOf").and_then(Value::as_array) {
            if !all_of.is_empty() {
                return SchemaNode::AllOf(all_of);
            }
        }

        if let Some(reference) = schema.get("$ref").and_then(Value::as_str) {
            return SchemaNode::Ref(reference);
        }

        if let Some(one_of) = schema.get("oneOf").and_then(Value::as_array) {
            return SchemaNode::OneOf(one_of);
        }

        match ty {
            Some(ty) if !ty.is_null() => SchemaNode::Typed(ty),
            _ => SchemaNode::Untyped,
        }
    }
}

/// The inheritance-relevant parts of a schema: its `$ref` and the members
/// of `allOf` followed by the members of legacy `extends`.
#[derive(Debug, Clone, Default)]
pub struct Bases<'a> {
    pub reference: Option<&'a str>,
    pub members: Vec<&'a Value>,
}

impl<'a> Bases<'a> {
    pub fn of(schema: &'a Value) -> Self {
        let reference = schema.get("$ref").and_then(Value::as_str);

        let mut members: Vec<&Value> = schema
            .get("allOf")
            .and_then(Value::as_array)
            .map(|arr| arr.iter().collect())
            .unwrap_or_default();

        match schema.get("extends") {
            Some(Value::Array(arr)) => members.extend(arr.iter()),
            Some(base @ Value::Object(_)) => members.push(base),
            _ => {}
        }

        Self { reference, members }
    }

    /// `$ref` strings of the members that carry one.
    pub fn member_refs(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.members
            .iter()
            .copied()
            .filter_map(|m| m.get("$ref").and_then(Value::as_str))
    }
}

/// Inputs of a documentation run.
#[derive(Debug, Clone, Default)]
pub struct GeneratorOptions {
    /// Root schema files.
    pub input_paths: Vec<PathBuf>,
    /// A single search path, probed right after the empty path.
    pub search_path: Option<PathBuf>,
    /// Further search paths, probed last.
    pub extra_search_paths: Vec<PathBuf>,
    /// Type names that get no top-level documentation entry.
    pub ignorable_type_names: Vec<String>,
}

impl GeneratorOptions {
    pub fn new(input_paths: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        Self {
            input_paths: input_paths.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn search_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.search_path = Some(path.into());
        self
    }

    pub fn extra_search_paths(mut self, paths: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        self.extra_search_paths = paths.into_iter().map(Into::into).collect();
        self
    }

    pub fn ignore(mut self, type_names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.ignorable_type_names = type_names.into_iter().map(Into::into).collect();
        self
    }

    /// Ordered search paths: the empty path, the single search path, the
    /// directory of each input file, then the extra search paths.
    /// Duplicates are dropped, keeping the first occurrence.
    pub fn search_paths(&self) -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::new()];
        paths.extend(self.search_path.iter().cloned());
        paths.extend(
            self.input_paths
                .iter()
                .map(|p| p.parent().map(Path::to_path_buf).unwrap_or_default()),
        );
        paths.extend(self.extra_search_paths.iter().cloned());

        let mut unique: Vec<PathBuf> = Vec::with_capacity(paths.len());
        for path in paths {
            if !unique.contains(&path) {
                unique.push(path);
            }
        }
        unique
    }
}
