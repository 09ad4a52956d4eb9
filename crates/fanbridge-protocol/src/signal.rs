//! IR signal definitions.
//!
//! A signal is a named IR waveform: a carrier frequency, a duty cycle, and
//! an ordered sequence of mark/space durations in microseconds. Signals are
//! immutable once loaded and are identified by their catalog name.

use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, CatalogResult};

/// Raw signal definition as it appears in the catalog file.
///
/// This is the serde-facing shape; it becomes an [`IrSignal`] only after
/// validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalDef {
    /// Carrier frequency in Hz (e.g. 38000).
    pub frequency_hz: u32,
    /// Carrier duty cycle as a percentage in [0, 100].
    pub duty_cycle: f32,
    /// Mark/space durations in microseconds, alternating, mark first.
    pub samples: Vec<u32>,
}

/// A validated, named IR waveform.
#[derive(Debug, Clone, PartialEq)]
pub struct IrSignal {
    name: String,
    frequency_hz: u32,
    duty_cycle: f32,
    samples: Vec<u32>,
}

impl IrSignal {
    /// Create a validated signal.
    ///
    /// Rejects a zero carrier frequency, a duty cycle outside [0, 100],
    /// and an empty sample sequence.
    pub fn new(
        name: impl Into<String>,
        frequency_hz: u32,
        duty_cycle: f32,
        samples: Vec<u32>,
    ) -> CatalogResult<Self> {
        let name = name.into();
        if frequency_hz == 0 {
            return Err(CatalogError::InvalidSignal {
                name,
                reason: "carrier frequency must be positive".to_string(),
            });
        }
        if !(0.0..=100.0).contains(&duty_cycle) {
            return Err(CatalogError::InvalidSignal {
                name,
                reason: format!("duty cycle {} outside 0-100", duty_cycle),
            });
        }
        if samples.is_empty() {
            return Err(CatalogError::InvalidSignal {
                name,
                reason: "sample sequence is empty".to_string(),
            });
        }
        Ok(IrSignal {
            name,
            frequency_hz,
            duty_cycle,
            samples,
        })
    }

    /// Build a signal from a catalog entry.
    pub fn from_def(name: impl Into<String>, def: SignalDef) -> CatalogResult<Self> {
        IrSignal::new(name, def.frequency_hz, def.duty_cycle, def.samples)
    }

    /// The catalog name of this signal.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Carrier frequency in Hz.
    pub fn frequency_hz(&self) -> u32 {
        self.frequency_hz
    }

    /// Carrier duty cycle percentage.
    pub fn duty_cycle(&self) -> f32 {
        self.duty_cycle
    }

    /// Mark/space durations in microseconds.
    pub fn samples(&self) -> &[u32] {
        &self.samples
    }
}
