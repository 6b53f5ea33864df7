//! Schema loading from files, strings, and HTTP URLs.
//!
//! These functions read and parse a single document. Caching and search
//! path probing live in the [`repository`](crate::repository).

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::RepositoryError;

#[cfg(feature = "remote")]
use std::time::Duration;

/// Default timeout for HTTP requests (10 seconds).
#[cfg(feature = "remote")]
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Load a schema from a file path.
///
/// # Errors
///
/// Returns `RepositoryError::FileNotFound` if the file doesn't exist,
/// or `RepositoryError::InvalidJson` if the file isn't valid JSON.
pub fn load_schema(path: &Path) -> Result<Value, RepositoryError> {
    if !path.is_file() {
        return Err(RepositoryError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|source| RepositoryError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&content).map_err(|source| RepositoryError::InvalidJson {
        path: path.to_path_buf(),
        source,
    })
}

/// Load a schema from a JSON string.
///
/// # Errors
///
/// Returns `RepositoryError::InvalidJson` if the string isn't valid JSON.
pub fn load_schema_str(content: &str) -> Result<Value, RepositoryError> {
    serde_json::from_str(content).map_err(|source| RepositoryError::InvalidJson {
        path: PathBuf::from("<string>"),
        source,
    })
}

/// Load a schema from an HTTP/HTTPS URL.
///
/// Requires the `remote` feature (enabled by default).
///
/// # Errors
///
/// Returns `RepositoryError::NetworkError` if the request fails or the
/// response isn't valid JSON.
#[cfg(feature = "remote")]
pub fn load_schema_url(url: &str) -> Result<Value, RepositoryError> {
    let network_error = |source| RepositoryError::NetworkError {
        url: url.to_string(),
        source,
    };

    let client = reqwest::blocking::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .map_err(network_error)?;

    client
        .get(url)
        .send()
        .and_then(|response| response.error_for_status())
        .and_then(|response| response.json())
        .map_err(network_error)
}

/// Check if a string looks like a URL (starts with http:// or https://).
pub fn is_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

/// Whether `url` is read directly instead of being probed on search paths.
pub fn is_absolute(url: &str) -> bool {
    is_url(url) || Path::new(url).is_absolute()
}

/// Load a schema from a file path or URL.
///
/// URL loading requires the `remote` feature.
pub fn load_schema_auto(source: &str) -> Result<Value, RepositoryError> {
    if is_url(source) {
        #[cfg(feature = "remote")]
        {
            load_schema_url(source)
        }
        #[cfg(not(feature = "remote"))]
        {
            Err(RepositoryError::FileNotFound {
                path: PathBuf::from(source),
            })
        }
    } else {
        load_schema(Path::new(source))
    }
}

/// Navigate a JSON Pointer fragment (e.g. "/definitions/foo" or "#/allOf/0").
///
/// A leading `#` is ignored; the empty fragment points to the schema itself.
/// Returns `None` when any step is missing or the fragment is not a pointer
/// (plain-name anchors are not supported).
pub fn navigate_fragment<'a>(schema: &'a Value, fragment: &str) -> Option<&'a Value> {
    let path = fragment.strip_prefix('#').unwrap_or(fragment);
    if path.is_empty() {
        return Some(schema);
    }
    let path = path.strip_prefix('/')?;

    let mut current = schema;
    for part in path.split('/') {
        // Unescape JSON Pointer encoding (~1 = /, ~0 = ~)
        let key = part.replace("~1", "/").replace("~0", "~");
        current = match current {
            Value::Object(map) => map.get(&key)?,
            Value::Array(arr) => arr.get(key.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}
