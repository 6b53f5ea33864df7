//! Splitting reference strings into a file part and a fragment part.
//!
//! All functions accept `Option<&str>` and return `None` for `None`, so
//! callers can pass the (possibly absent) `$ref` of a schema directly.

/// Returns the part of `url` before the first `#`, or the whole string.
pub fn strip_fragment(url: Option<&str>) -> Option<&str> {
    let url = url?;
    Some(match url.find('#') {
        Some(idx) => &url[..idx],
        None => url,
    })
}

/// Returns the file name of `url`: the fragment is stripped, then
/// everything up to and including the last `/` is dropped.
pub fn obtain_file_name(url: Option<&str>) -> Option<&str> {
    let stripped = strip_fragment(url)?;
    Some(match stripped.rfind('/') {
        Some(idx) => &stripped[idx + 1..],
        None => stripped,
    })
}

/// Returns the part of `url` after the first `#`, or `""` if there is none.
pub fn obtain_fragment(url: Option<&str>) -> Option<&str> {
    let url = url?;
    Some(match url.find('#') {
        Some(idx) => &url[idx + 1..],
        None => "",
    })
}

/// Cache key for a (file, fragment) pair.
pub(crate) fn entry_key(file_name: &str, fragment: &str) -> String {
    if fragment.is_empty() {
        file_name.to_string()
    } else {
        format!("{}#{}", file_name, fragment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_fragment_variants() {
        assert_eq!(strip_fragment(Some("a.schema.json#/x")), Some("a.schema.json"));
        assert_eq!(strip_fragment(Some("a.schema.json")), Some("a.schema.json"));
        assert_eq!(strip_fragment(Some("#/definitions/x")), Some(""));
        assert_eq!(strip_fragment(None), None);
    }

    #[test]
    fn obtain_file_name_drops_directories() {
        assert_eq!(
            obtain_file_name(Some("schemas/sub/a.schema.json#/definitions/x")),
            Some("a.schema.json")
        );
        assert_eq!(obtain_file_name(Some("a.schema.json")), Some("a.schema.json"));
        assert_eq!(obtain_file_name(Some("#/definitions/x")), Some(""));
        assert_eq!(obtain_file_name(None), None);
    }

    #[test]
    fn obtain_fragment_after_first_hash() {
        assert_eq!(obtain_fragment(Some("a.json#/definitions/x")), Some("/definitions/x"));
        assert_eq!(obtain_fragment(Some("a.json#x#y")), Some("x#y"));
        assert_eq!(obtain_fragment(Some("a.json")), Some(""));
        assert_eq!(obtain_fragment(Some("#")), Some(""));
        assert_eq!(obtain_fragment(None), None);
    }

    #[test]
    fn entry_key_omits_empty_fragment() {
        assert_eq!(entry_key("a.schema.json", ""), "a.schema.json");
        assert_eq!(entry_key("a.schema.json", "/definitions/x"), "a.schema.json#/definitions/x");
    }
}
