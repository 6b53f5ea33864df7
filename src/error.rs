//! Error types for schema loading and reference resolution.

use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors while loading schemas into a repository.
///
/// Unresolvable bare fragments are not errors: they are logged and
/// reported as `None` by the repository.
#[derive(Debug, Error)]
pub enum RepositoryError {
    // IO errors (exit code 3)
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[cfg(feature = "remote")]
    #[error("failed to fetch {url}: {source}")]
    NetworkError {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    // Parse errors (exit code 2)
    #[error("invalid JSON in {path}: {source}")]
    InvalidJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    // Resolution errors (exit code 2)
    #[error("unable to resolve {url}{}: tried {}", referrer_suffix(.referrer), attempts_summary(.attempts))]
    Unresolved {
        url: String,
        referrer: Option<String>,
        attempts: Vec<String>,
    },

    #[error("cannot derive a type name for {url}")]
    UnnamedType { url: String },
}

fn referrer_suffix(referrer: &Option<String>) -> String {
    match referrer {
        Some(r) => format!(" (referenced from {})", r),
        None => String::new(),
    }
}

fn attempts_summary(attempts: &[String]) -> String {
    if attempts.is_empty() {
        "no search paths".to_string()
    } else {
        attempts.join(", ")
    }
}

impl RepositoryError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            RepositoryError::FileNotFound { .. } | RepositoryError::ReadError { .. } => 3,
            #[cfg(feature = "remote")]
            RepositoryError::NetworkError { .. } => 3,
            _ => 2,
        }
    }

    /// Attach the referring entry to an `Unresolved` error.
    pub(crate) fn referenced_from(self, referrer: &str) -> Self {
        match self {
            RepositoryError::Unresolved {
                url,
                referrer: None,
                attempts,
            } => RepositoryError::Unresolved {
                url,
                referrer: Some(referrer.to_string()),
                attempts,
            },
            other => other,
        }
    }
}
