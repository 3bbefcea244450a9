use std::path::PathBuf;
use thiserror::Error;

/// Failures that abort a merge.
///
/// Unresolved imports, missing files and repeated visits are not errors: the
/// merger absorbs them and keeps going. Everything here ends the operation and
/// discards whatever was merged so far.
#[derive(Debug, Error)]
pub enum MergeError {
    #[error("Could not find tsconfig.json in any parent folder of {}", .start.display())]
    ConfigurationNotFound { start: PathBuf },

    #[error("Malformed {}: {source}", .path.display())]
    MalformedConfig {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Could not find config '{extends}' extended by {}", .path.display())]
    ExtendsNotFound { path: PathBuf, extends: String },

    #[error("Circular 'extends' chain at {}", .path.display())]
    ExtendsCycle { path: PathBuf },

    #[error("Failed to parse {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },
}
