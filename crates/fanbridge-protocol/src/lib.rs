//! Fanbridge IR Wire Protocol
//!
//! This crate provides the data model and wire encoding for talking to an
//! IR-blaster microcontroller over its serial CLI. The device accepts raw
//! IR transmissions as line-based text commands and prints free-form status
//! text back; it never acknowledges commands.
//!
//! # Protocol Overview
//!
//! - **Commands** (host → device): `ir tx RAW F:<freq> DC:<duty> <samples...>`
//!   terminated with `\r\n`. Samples are microsecond mark/space durations.
//! - **Chunking**: the device accepts at most [`CHUNK_SAMPLES`] samples per
//!   command, so longer waveforms are sent as several commands in order.
//! - **Responses**: the device emits diagnostic text lines which must be
//!   consumed (its output buffer stalls the CLI otherwise) but carry no
//!   protocol meaning. [`LineBuffer`] splits that stream into loggable lines.
//!
//! # Signal Catalog
//!
//! IR waveforms are loaded once at startup from a JSON catalog mapping
//! signal name → definition, validated eagerly so a malformed or missing
//! signal fails the process at startup instead of at transmit time.
//!
//! # Example
//!
//! ```rust,ignore
//! use fanbridge_protocol::{SignalCatalog, encode_chunks};
//!
//! let catalog = SignalCatalog::load("signals.json")?;
//! let signal = catalog.require("power_off")?;
//! for command in encode_chunks(signal) {
//!     // write each command to the serial port
//! }
//! ```

mod catalog;
mod codec;
mod commands;
mod error;
mod signal;

pub use catalog::*;
pub use codec::*;
pub use commands::*;
pub use error::*;
pub use signal::*;
