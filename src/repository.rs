//! The schema repository: loads schema files once and hands out entries.
//!
//! Two public entry points resolve schemas:
//!
//! - [`SchemaRepository::resolve`] takes a URL (file name, relative or
//!   absolute path, optionally with a fragment).
//! - [`SchemaRepository::resolve_ref`] takes the `$ref` string found inside
//!   the schema of an entry. The entry is the context the reference is
//!   resolved in: its directory for file references, and its enclosing
//!   scopes for bare fragments like `#/definitions/x`.
//!
//! Whole-file entries are cached under their file name, fragment entries
//! under `file#fragment`. Every key maps to exactly one `Rc<Entry>`.

use std::path::{Path, PathBuf};
use std::rc::Rc;

use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::address::{entry_key, obtain_file_name, obtain_fragment, strip_fragment};
use crate::error::RepositoryError;
use crate::loader::{is_absolute, load_schema_auto, navigate_fragment};
use crate::naming::generate_type_name;
use crate::references::obtain_referenced_schema_entries;
use crate::types::{Bases, Entry};

/// Cache of loaded schema documents and the entries pointing into them.
#[derive(Debug, Default)]
pub struct SchemaRepository {
    entries: IndexMap<String, Rc<Entry>>,
    type_names: IndexMap<String, Rc<Entry>>,
    search_paths: Vec<PathBuf>,
}

impl SchemaRepository {
    /// Create a repository that probes `search_paths` in order for relative
    /// URLs. An empty search path stands for the directory of the entry a
    /// reference appears in (or the working directory for root schemas).
    pub fn new(search_paths: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        Self {
            search_paths: search_paths.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// All cached entries in the order they were first resolved.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &Rc<Entry>)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Look up a cached entry by its key (`file` or `file#fragment`).
    pub fn entry(&self, key: &str) -> Option<&Rc<Entry>> {
        self.entries.get(key)
    }

    /// Look up the entry that was last registered under `type_name`.
    pub fn entry_by_type_name(&self, type_name: &str) -> Option<&Rc<Entry>> {
        self.type_names.get(type_name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Add a root schema and every entry it transitively references.
    ///
    /// # Errors
    ///
    /// Fails if the root or any referenced file cannot be loaded.
    pub fn add_root_schema(&mut self, url: &str) -> Result<Rc<Entry>, RepositoryError> {
        info!("Adding root schema {}", url);
        let root = self
            .resolve(url)?
            .ok_or_else(|| RepositoryError::Unresolved {
                url: url.to_string(),
                referrer: None,
                attempts: vec![format!("fragment {:?}", obtain_fragment(Some(url)).unwrap_or(""))],
            })?;
        let referenced = obtain_referenced_schema_entries(self, &root)?;
        debug!("{} references {} entries", root.type_name(), referenced.len());
        Ok(root)
    }

    /// Resolve a URL to an entry.
    ///
    /// Loads the file on first use. Returns `Ok(None)` if the file loads but
    /// the fragment does not point into it.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be found on any search path, cannot be read,
    /// or is not valid JSON.
    pub fn resolve(&mut self, url: &str) -> Result<Option<Rc<Entry>>, RepositoryError> {
        self.resolve_from(url, None)
    }

    fn resolve_from(
        &mut self,
        url: &str,
        context_dir: Option<&Path>,
    ) -> Result<Option<Rc<Entry>>, RepositoryError> {
        let file_name = obtain_file_name(Some(url)).unwrap_or_default();
        let fragment = obtain_fragment(Some(url)).unwrap_or_default();

        if let Some(cached) = self.entries.get(&entry_key(file_name, fragment)) {
            return Ok(Some(cached.clone()));
        }

        if file_name.is_empty() {
            return Err(RepositoryError::Unresolved {
                url: url.to_string(),
                referrer: None,
                attempts: vec![],
            });
        }

        let file_entry = match self.entries.get(file_name) {
            Some(entry) => entry.clone(),
            None => {
                let (directory, document) = self.load_file(url, context_dir)?;
                let type_name = generate_type_name(file_name, None);
                let entry = Entry::new(file_name, &directory, "", Rc::new(document), type_name)
                    .ok_or_else(|| RepositoryError::UnnamedType {
                        url: url.to_string(),
                    })?;
                self.insert(entry)?
            }
        };

        self.resolve_fragment(&file_entry, fragment)
    }

    /// Read and parse the file that `url` names.
    ///
    /// Absolute paths and HTTP URLs are read directly. Anything else is
    /// probed on the search paths; the first candidate that parses wins.
    fn load_file(
        &self,
        url: &str,
        context_dir: Option<&Path>,
    ) -> Result<(PathBuf, Value), RepositoryError> {
        let location = strip_fragment(Some(url)).unwrap_or(url);

        if is_absolute(location) {
            let document = load_schema_auto(location)?;
            let directory = Path::new(location)
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default();
            return Ok((directory, document));
        }

        let file_name = obtain_file_name(Some(url)).unwrap_or(location);
        let mut attempts = Vec::new();

        for search_path in &self.search_paths {
            let base = if search_path.as_os_str().is_empty() {
                context_dir.map(Path::to_path_buf).unwrap_or_default()
            } else {
                search_path.clone()
            };

            let mut candidates = vec![base.join(location)];
            if location != file_name {
                candidates.push(base.join(file_name));
            }

            for candidate in candidates {
                match load_schema_auto(&candidate.to_string_lossy()) {
                    Ok(document) => {
                        debug!("Loaded {} from {}", url, candidate.display());
                        let directory = candidate
                            .parent()
                            .map(Path::to_path_buf)
                            .unwrap_or_default();
                        return Ok((directory, document));
                    }
                    Err(e) => {
                        debug!("Skipping candidate {}: {}", candidate.display(), e);
                        attempts.push(candidate.display().to_string());
                    }
                }
            }
        }

        Err(RepositoryError::Unresolved {
            url: url.to_string(),
            referrer: None,
            attempts,
        })
    }

    /// Resolve `fragment` against the schema of `parent`.
    ///
    /// The empty fragment is the whole file. A fragment entry created here
    /// is addressed by the parent's fragment followed by `fragment`.
    fn resolve_fragment(
        &mut self,
        parent: &Rc<Entry>,
        fragment: &str,
    ) -> Result<Option<Rc<Entry>>, RepositoryError> {
        let fragment = fragment.strip_prefix('#').unwrap_or(fragment);
        if fragment.is_empty() {
            if parent.is_whole_file() {
                return Ok(Some(parent.clone()));
            }
            return Ok(self.entries.get(parent.file_name()).cloned());
        }

        if navigate_fragment(parent.schema(), fragment).is_none() {
            return Ok(None);
        }

        let full_fragment = format!("{}{}", parent.fragment(), fragment);
        let key = entry_key(parent.file_name(), &full_fragment);
        if let Some(cached) = self.entries.get(&key) {
            return Ok(Some(cached.clone()));
        }

        let type_name = generate_type_name(parent.file_name(), Some(&full_fragment));
        let entry = Entry::new(
            parent.file_name(),
            parent.directory(),
            &full_fragment,
            parent.document().clone(),
            type_name,
        )
        .ok_or_else(|| RepositoryError::UnnamedType { url: key.clone() })?;
        self.insert(entry).map(Some)
    }

    /// Cache a new entry and register its type name.
    fn insert(&mut self, entry: Entry) -> Result<Rc<Entry>, RepositoryError> {
        if entry.type_name().is_empty() {
            return Err(RepositoryError::UnnamedType {
                url: entry.to_string(),
            });
        }

        let key = entry.key();
        let entry = Rc::new(entry);
        if let Some(previous) = self.type_names.get(entry.type_name()) {
            warn!(
                "Duplicate type name {}: {} and {}",
                entry.type_name(),
                previous,
                entry
            );
        }
        self.type_names
            .insert(entry.type_name().to_string(), entry.clone());
        self.entries.insert(key, entry.clone());
        Ok(entry)
    }

    /// Resolve the `$ref` string `reference` found in the schema of `entry`.
    ///
    /// File references are resolved relative to the entry's directory (for
    /// the empty search path) and the search paths. Bare fragments are tried
    /// against the scopes from [`compute_parent_entries`](Self::compute_parent_entries).
    /// If the fragment is not found (in the named file or in any scope), a
    /// warning is logged and `Ok(None)` is returned.
    ///
    /// # Errors
    ///
    /// Fails if a referenced file cannot be loaded.
    pub fn resolve_ref(
        &mut self,
        entry: &Rc<Entry>,
        reference: &str,
    ) -> Result<Option<Rc<Entry>>, RepositoryError> {
        let file_name = obtain_file_name(Some(reference)).unwrap_or_default();
        if !file_name.is_empty() {
            let resolved = self
                .resolve_from(reference, Some(entry.directory()))
                .map_err(|e| e.referenced_from(&entry.to_string()))?;
            if resolved.is_none() {
                warn!("Could not resolve {} in {}", reference, entry);
            }
            return Ok(resolved);
        }

        let fragment = obtain_fragment(Some(reference)).unwrap_or_default();
        for parent in self.compute_parent_entries(entry)? {
            if let Some(found) = self.resolve_fragment(&parent, fragment)? {
                return Ok(Some(found));
            }
        }

        warn!("Could not resolve {} in {}", reference, entry);
        Ok(None)
    }

    /// The scopes a bare fragment inside `entry` is resolved against, in
    /// the order they are tried:
    ///
    /// 1. the entry itself,
    /// 2. its whole-file entry (for fragment entries),
    /// 3. the entries that its `$ref`, `allOf` and `extends` members name
    ///    in other files,
    /// 4. the same for its whole-file entry.
    ///
    /// # Errors
    ///
    /// Fails if one of the referenced files cannot be loaded.
    pub fn compute_parent_entries(
        &mut self,
        entry: &Rc<Entry>,
    ) -> Result<Vec<Rc<Entry>>, RepositoryError> {
        let mut parents = vec![entry.clone()];

        let whole_file = if entry.is_whole_file() {
            None
        } else {
            self.entries.get(entry.file_name()).cloned()
        };
        if let Some(whole_file) = &whole_file {
            parents.push(whole_file.clone());
        }

        let mut foreign = self.foreign_base_entries(entry)?;
        if let Some(whole_file) = &whole_file {
            foreign.extend(self.foreign_base_entries(whole_file)?);
        }
        for base in foreign {
            if !parents.iter().any(|p| Rc::ptr_eq(p, &base)) {
                parents.push(base);
            }
        }

        Ok(parents)
    }

    /// Entries named by the `$ref` and base members of `entry` that live in
    /// a different file.
    fn foreign_base_entries(&mut self, entry: &Rc<Entry>) -> Result<Vec<Rc<Entry>>, RepositoryError> {
        let schema = entry.schema();
        let bases = Bases::of(schema);
        let references: Vec<&str> = bases.reference.into_iter().chain(bases.member_refs()).collect();

        let mut result = Vec::new();
        for reference in references {
            let ref_file_name = obtain_file_name(Some(reference)).unwrap_or_default();
            if ref_file_name.is_empty() || ref_file_name == entry.file_name() {
                continue;
            }
            if let Some(base) = self.resolve_ref(entry, reference)? {
                result.push(base);
            }
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn resolve_is_identity_stable() {
        let dir = TempDir::new().unwrap();
        write(&dir, "a.schema.json", r#"{"definitions": {"x": {"type": "string"}}}"#);
        let mut repository = SchemaRepository::new([dir.path()]);

        let first = repository.resolve("a.schema.json").unwrap().unwrap();
        let second = repository.resolve("a.schema.json").unwrap().unwrap();
        assert!(Rc::ptr_eq(&first, &second));

        let x1 = repository.resolve("a.schema.json#/definitions/x").unwrap().unwrap();
        let x2 = repository.resolve("a.schema.json#/definitions/x").unwrap().unwrap();
        assert!(Rc::ptr_eq(&x1, &x2));
        assert_eq!(x1.type_name(), "a-definitions-x");
        assert_eq!(x1.schema()["type"], "string");
        assert_eq!(repository.len(), 2);
    }

    #[test]
    fn resolve_first_parsing_search_path_wins() {
        let dir = TempDir::new().unwrap();
        write(&dir, "broken/a.schema.json", "not json");
        write(&dir, "good/a.schema.json", r#"{"title": "good"}"#);
        write(&dir, "later/a.schema.json", r#"{"title": "later"}"#);
        let mut repository = SchemaRepository::new([
            dir.path().join("missing"),
            dir.path().join("broken"),
            dir.path().join("good"),
            dir.path().join("later"),
        ]);

        let entry = repository.resolve("a.schema.json").unwrap().unwrap();
        assert_eq!(entry.schema()["title"], "good");
        assert_eq!(entry.directory(), dir.path().join("good"));
    }

    #[test]
    fn resolve_exhausted_search_paths_fails() {
        let dir = TempDir::new().unwrap();
        let mut repository = SchemaRepository::new([dir.path()]);
        let result = repository.resolve("missing.schema.json");
        match result {
            Err(RepositoryError::Unresolved { url, attempts, .. }) => {
                assert_eq!(url, "missing.schema.json");
                assert_eq!(attempts.len(), 1);
            }
            other => panic!("expected Unresolved, got {:?}", other),
        }
    }

    #[test]
    fn resolve_absolute_path_bypasses_search_paths() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "abs.schema.json", r#"{"type": "object"}"#);
        let mut repository = SchemaRepository::new(Vec::<PathBuf>::new());

        let entry = repository.resolve(path.to_str().unwrap()).unwrap().unwrap();
        assert_eq!(entry.type_name(), "abs");
        assert_eq!(entry.directory(), dir.path());
    }

    #[test]
    fn resolve_absolute_invalid_json_is_fatal() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "bad.schema.json", "{");
        let mut repository = SchemaRepository::new(Vec::<PathBuf>::new());
        let result = repository.resolve(path.to_str().unwrap());
        assert!(matches!(result, Err(RepositoryError::InvalidJson { .. })));
    }

    #[test]
    fn resolve_missing_fragment_is_none() {
        let dir = TempDir::new().unwrap();
        write(&dir, "a.schema.json", r#"{"definitions": {}}"#);
        let mut repository = SchemaRepository::new([dir.path()]);
        assert!(repository
            .resolve("a.schema.json#/definitions/nope")
            .unwrap()
            .is_none());
        assert!(repository.resolve("a.schema.json#anchor").unwrap().is_none());
    }

    #[test]
    fn resolve_ref_relative_to_entry_directory() {
        let dir = TempDir::new().unwrap();
        write(&dir, "nested/root.schema.json", r#"{"$ref": "base.schema.json"}"#);
        write(&dir, "nested/base.schema.json", r#"{"title": "base"}"#);
        let root_path = dir.path().join("nested/root.schema.json");
        let mut repository = SchemaRepository::new([""]);

        let root = repository.resolve(root_path.to_str().unwrap()).unwrap().unwrap();
        let base = repository.resolve_ref(&root, "base.schema.json").unwrap().unwrap();
        assert_eq!(base.schema()["title"], "base");
    }

    #[test]
    fn resolve_ref_missing_file_names_referrer() {
        let dir = TempDir::new().unwrap();
        write(&dir, "root.schema.json", r#"{"$ref": "gone.schema.json"}"#);
        let mut repository = SchemaRepository::new([dir.path()]);
        let root = repository.resolve("root.schema.json").unwrap().unwrap();

        let err = repository.resolve_ref(&root, "gone.schema.json").unwrap_err();
        assert!(err.to_string().contains("root.schema.json"));
    }

    #[test]
    fn resolve_ref_unresolved_fragment_is_soft() {
        let dir = TempDir::new().unwrap();
        write(&dir, "root.schema.json", r#"{"definitions": {}}"#);
        let mut repository = SchemaRepository::new([dir.path()]);
        let root = repository.resolve("root.schema.json").unwrap().unwrap();
        assert!(repository
            .resolve_ref(&root, "#/definitions/missing")
            .unwrap()
            .is_none());
    }

    #[test]
    fn resolve_ref_missing_fragment_in_other_file_is_soft() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "root.schema.json",
            r#"{"allOf": [{"$ref": "base.schema.json#/definitions/typo"}]}"#,
        );
        write(&dir, "base.schema.json", r#"{"definitions": {"type": {}}}"#);
        let mut repository = SchemaRepository::new([dir.path()]);
        let root = repository.resolve("root.schema.json").unwrap().unwrap();

        assert!(repository
            .resolve_ref(&root, "base.schema.json#/definitions/typo")
            .unwrap()
            .is_none());
        // The file itself was loaded and cached.
        assert!(repository.entry("base.schema.json").is_some());
    }

    #[test]
    fn bare_hash_refers_to_whole_file() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "tree.schema.json",
            r##"{"definitions": {"node": {"properties": {"child": {"$ref": "#"}}}}}"##,
        );
        let mut repository = SchemaRepository::new([dir.path()]);
        let node = repository
            .resolve("tree.schema.json#/definitions/node")
            .unwrap()
            .unwrap();
        let target = repository.resolve_ref(&node, "#").unwrap().unwrap();
        assert!(target.is_whole_file());
        assert_eq!(target.type_name(), "tree");
    }

    #[test]
    fn parent_entries_own_scopes_before_foreign_bases() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "derived.schema.json",
            r#"{
                "$ref": "base.schema.json",
                "definitions": {
                    "x": { "allOf": [{ "$ref": "mixin.schema.json" }] }
                }
            }"#,
        );
        write(&dir, "base.schema.json", r#"{"definitions": {}}"#);
        write(&dir, "mixin.schema.json", r#"{"definitions": {}}"#);
        let mut repository = SchemaRepository::new([dir.path()]);
        let x = repository
            .resolve("derived.schema.json#/definitions/x")
            .unwrap()
            .unwrap();

        let parents = repository.compute_parent_entries(&x).unwrap();
        let names: Vec<&str> = parents.iter().map(|p| p.type_name()).collect();
        assert_eq!(names, vec!["derived-definitions-x", "derived", "mixin", "base"]);
    }

    #[test]
    fn duplicate_type_names_keep_both_entries() {
        let dir = TempDir::new().unwrap();
        write(&dir, "a.schema.json", r#"{"definitions": {"b": {}}}"#);
        write(&dir, "a-definitions-b.json", r#"{}"#);
        let mut repository = SchemaRepository::new([dir.path()]);

        let fragment = repository.resolve("a.schema.json#/definitions/b").unwrap().unwrap();
        let file = repository.resolve("a-definitions-b.json").unwrap().unwrap();
        assert_eq!(fragment.type_name(), file.type_name());
        assert_eq!(repository.len(), 3);
        assert!(Rc::ptr_eq(
            repository.entry_by_type_name("a-definitions-b").unwrap(),
            &file
        ));
    }

    #[test]
    fn unnamed_type_is_fatal() {
        let dir = TempDir::new().unwrap();
        write(&dir, ".schema.json", r#"{}"#);
        let mut repository = SchemaRepository::new([dir.path()]);
        let result = repository.resolve(".schema.json");
        assert!(matches!(result, Err(RepositoryError::UnnamedType { .. })));
    }
}
