//! Fanbridge Serial Link
//!
//! This crate owns the physical serial connection to the IR-blaster
//! microcontroller. The device is a hobby-grade USB serial adapter that
//! disappears and reappears in practice, so the connection is managed as a
//! lifecycle: open, detect failure, reconnect on a fixed period until the
//! port comes back.
//!
//! # Connection lifecycle
//!
//! ```text
//!            open() ok
//!   Closed ───────────► Open ◄────────────────┐
//!     │                  │                    │ periodic retry ok
//!     │ open() err       │ write/read error   │
//!     ▼                  ▼                    │
//!   Reconnecting ◄───────┘────────────────────┘
//! ```
//!
//! Exactly one physical handle exists at a time: reinitialization detaches
//! the previous reader task and shuts the previous handle down before a new
//! one is constructed, and at most one periodic retry task is ever active.
//!
//! The write path is exposed through the [`CommandLink`] trait so the
//! transmission layer above can be exercised against a test double.

mod error;
mod serial;

pub use error::*;
pub use serial::*;

use std::future::Future;

/// Write-side contract the transmission layer depends on.
///
/// [`SerialLink`] is the production implementation; tests substitute a
/// recording double.
pub trait CommandLink: Send + Sync + 'static {
    /// Whether the underlying connection is currently open.
    fn is_open(&self) -> bool;

    /// Write raw command bytes to the device.
    fn write(&self, data: &[u8]) -> impl Future<Output = LinkResult<()>> + Send;

    /// Wait until the OS-level send buffer has emptied.
    fn drain(&self) -> impl Future<Output = LinkResult<()>> + Send;
}
