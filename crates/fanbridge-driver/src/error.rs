//! Error types for the fan driver.

use thiserror::Error;

use fanbridge_protocol::CatalogError;

/// Configuration validation failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Band thresholds must satisfy `0 < medium < high <= 100`.
    #[error("band thresholds must satisfy 0 < medium < high <= 100, got medium={medium} high={high}")]
    InvalidBands { medium: u8, high: u8 },

    /// At least one transmission attempt is required.
    #[error("send attempts must be at least 1")]
    NoAttempts,
}

/// State store failures.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Failed to read or write the state file.
    #[error("failed to access state file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The state record is malformed.
    #[error("malformed state record {path}: {source}")]
    Format {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors surfaced by the accessory boundary.
#[derive(Debug, Error)]
pub enum DriverError {
    /// The serial connection is down; the device is unreachable.
    ///
    /// This is the communication-failure condition the host boundary
    /// reports when a set/get arrives while disconnected.
    #[error("no open connection to the IR transmitter")]
    NotConnected,

    /// Catalog problem at construction time (fatal: without the
    /// configured signals no command can ever be formed).
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Invalid driver configuration at construction time.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result type alias for driver operations.
pub type DriverResult<T> = Result<T, DriverError>;
