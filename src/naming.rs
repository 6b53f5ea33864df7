//! Type names.
//!
//! A type name is both the label shown for a type in generated documentation
//! and the key that identifies the type everywhere else. It is derived from
//! the file that contains the schema and the fragment that points into it:
//!
//! | File | Fragment | Type name |
//! |------|----------|-----------|
//! | `glTFProperty.schema.json` | | `glTFProperty` |
//! | `accessor.sparse.schema.json` | | `accessor.sparse` |
//! | `example.schema.json` | `/definitions/exampleProperty` | `example-definitions-exampleProperty` |

/// Conventional suffix of schema files.
pub const SCHEMA_FILE_SUFFIX: &str = ".schema.json";

/// Generate the type name for the part of `file_name` that `fragment` points to.
///
/// The base name is the file name up to [`SCHEMA_FILE_SUFFIX`], or up to a
/// trailing `.json` for files that do not follow the convention. A non-empty
/// fragment is appended, then the first `#` is removed and spaces and slashes
/// become hyphens.
pub fn generate_type_name(file_name: &str, fragment: Option<&str>) -> String {
    let base = match file_name.find(SCHEMA_FILE_SUFFIX) {
        Some(idx) => &file_name[..idx],
        None => file_name.strip_suffix(".json").unwrap_or(file_name),
    };

    let mut type_name = base.to_string();
    if let Some(fragment) = fragment.filter(|f| !f.is_empty()) {
        type_name.push_str(fragment);
    }

    let type_name = type_name.replacen('#', "", 1);
    type_name.replace([' ', '/'], "-")
}

/// Type name of a member of `definitions` in a type named `type_name`.
///
/// Equal to what [`generate_type_name`] produces for the fragment
/// `/definitions/<definition_name>` of the same file.
pub fn definition_type_name(type_name: &str, definition_name: &str) -> String {
    format!("{}-definitions-{}", type_name, definition_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn strips_schema_suffix() {
        assert_eq!(generate_type_name("glTFProperty.schema.json", None), "glTFProperty");
        assert_eq!(
            generate_type_name("accessor.sparse.schema.json", Some("")),
            "accessor.sparse"
        );
    }

    #[test]
    fn appends_fragment_with_hyphens() {
        assert_eq!(
            generate_type_name("example.schema.json", Some("/definitions/exampleProperty")),
            "example-definitions-exampleProperty"
        );
        assert_eq!(
            generate_type_name("example.schema.json", Some("/definitions/two words")),
            "example-definitions-two-words"
        );
    }

    #[test]
    fn removes_first_hash_only() {
        assert_eq!(generate_type_name("a.schema.json", Some("#/x")), "a-x");
        assert_eq!(generate_type_name("a.schema.json", Some("#/x#y")), "a-x#y");
    }

    #[test]
    fn plain_json_files_keep_their_stem() {
        assert_eq!(generate_type_name("widget.json", None), "widget");
        assert_eq!(generate_type_name("widget", None), "widget");
    }

    #[test]
    fn definition_type_name_matches_generated_name() {
        let type_name = generate_type_name("example.schema.json", None);
        assert_eq!(
            definition_type_name(&type_name, "inner"),
            generate_type_name("example.schema.json", Some("/definitions/inner"))
        );
    }

    #[test]
    fn deterministic_and_distinct_over_corpus() {
        let corpus = [
            ("root.schema.json", ""),
            ("root.schema.json", "/definitions/a"),
            ("root.schema.json", "/definitions/b"),
            ("base.schema.json", ""),
            ("base.schema.json", "/properties/id"),
            ("accessor.sparse.schema.json", ""),
            ("accessor.sparse.indices.schema.json", ""),
        ];
        let first: Vec<String> = corpus
            .iter()
            .map(|(f, frag)| generate_type_name(f, Some(*frag)))
            .collect();
        let second: Vec<String> = corpus
            .iter()
            .map(|(f, frag)| generate_type_name(f, Some(*frag)))
            .collect();
        assert_eq!(first, second);

        let distinct: HashSet<&String> = first.iter().collect();
        assert_eq!(distinct.len(), corpus.len());
    }
}
