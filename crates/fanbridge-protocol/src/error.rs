//! Error types for the signal catalog.

use thiserror::Error;

/// Errors that can occur when loading or querying the signal catalog.
///
/// All of these are startup failures: without a valid catalog no command
/// can ever be formed, so callers are expected to propagate them rather
/// than recover.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Failed to read the catalog file.
    #[error("failed to read signal catalog {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The catalog file is not valid JSON or has the wrong shape.
    #[error("failed to parse signal catalog {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// A signal definition failed validation.
    #[error("invalid signal '{name}': {reason}")]
    InvalidSignal { name: String, reason: String },

    /// A required signal name is not present in the catalog.
    #[error("signal '{name}' not found in catalog")]
    MissingSignal { name: String },
}

/// Result type alias for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;
