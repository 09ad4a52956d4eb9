//! Fanbridge Fan Driver
//!
//! This crate turns host-framework property writes into IR transmissions
//! over the serial link. The interesting part is not the fan abstraction
//! but the reliability layer underneath it:
//!
//! - **Debounce + diff** ([`Reconciler`]): bursts of property writes
//!   coalesce into one coherent transition; the settled state is diffed
//!   against the last settled state so only effective changes transmit.
//! - **Serialized, retried transmission** ([`Transmitter`]): one signal on
//!   the wire at a time, sent as ordered 64-sample chunks with pacing, and
//!   re-sent wholesale a bounded number of times because the device drops
//!   commands silently.
//! - **Boundary preconditions** ([`FanAccessory`]): set/get while
//!   disconnected fails with a communication-failure condition instead of
//!   mutating anything.
//!
//! Data flow:
//!
//! ```text
//! set(property) ─► Reconciler::apply ─► debounce ─► diff ─► Transmitter::send
//!                                                              │ chunk+retry
//!                                                              ▼
//!                                                        CommandLink::write
//! ```

mod accessory;
mod config;
mod error;
mod reconcile;
mod store;
mod transmit;

pub use accessory::*;
pub use config::*;
pub use error::*;
pub use reconcile::*;
pub use store::*;
pub use transmit::*;
