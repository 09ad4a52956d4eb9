//! Error types for the serial link.

use thiserror::Error;

/// Errors that can occur on the serial connection.
///
/// None of these are fatal: open failures and I/O errors schedule a
/// reconnect internally, and callers treat them as "the command did not go
/// out", never as a reason to stop the process.
#[derive(Debug, Error)]
pub enum LinkError {
    /// The port is not open (never opened, lost, or explicitly closed).
    #[error("serial port is not open")]
    NotOpen,

    /// Constructing or opening the port handle failed.
    #[error("failed to open serial port {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: tokio_serial::Error,
    },

    /// A write or drain on the open handle failed.
    #[error("serial i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for link operations.
pub type LinkResult<T> = Result<T, LinkError>;
