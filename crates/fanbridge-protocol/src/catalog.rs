//! Signal catalog loading and lookup.
//!
//! The catalog is a JSON file mapping signal name → definition:
//!
//! ```json
//! {
//!   "power_off": { "frequency_hz": 38000, "duty_cycle": 33, "samples": [1280, 400] },
//!   "low":       { "frequency_hz": 38000, "duty_cycle": 33, "samples": [1280, 400] }
//! }
//! ```
//!
//! Every entry is validated at load time; a malformed entry fails the whole
//! load. The catalog is read-only for the process lifetime.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use crate::error::{CatalogError, CatalogResult};
use crate::signal::{IrSignal, SignalDef};

/// An immutable mapping from signal name to validated [`IrSignal`].
#[derive(Debug, Clone, Default)]
pub struct SignalCatalog {
    signals: HashMap<String, IrSignal>,
}

impl SignalCatalog {
    /// Load and validate a catalog from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> CatalogResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let defs: BTreeMap<String, SignalDef> =
            serde_json::from_str(&text).map_err(|source| CatalogError::Parse {
                path: path.display().to_string(),
                source,
            })?;
        Self::from_defs(defs)
    }

    /// Build a catalog from raw definitions, validating each entry.
    pub fn from_defs(defs: impl IntoIterator<Item = (String, SignalDef)>) -> CatalogResult<Self> {
        let mut signals = HashMap::new();
        for (name, def) in defs {
            let signal = IrSignal::from_def(name.clone(), def)?;
            signals.insert(name, signal);
        }
        Ok(SignalCatalog { signals })
    }

    /// Build a catalog from already-validated signals.
    pub fn from_signals(signals: impl IntoIterator<Item = IrSignal>) -> Self {
        SignalCatalog {
            signals: signals
                .into_iter()
                .map(|s| (s.name().to_string(), s))
                .collect(),
        }
    }

    /// Look up a signal by name.
    pub fn get(&self, name: &str) -> Option<&IrSignal> {
        self.signals.get(name)
    }

    /// Look up a signal by name, failing with [`CatalogError::MissingSignal`].
    pub fn require(&self, name: &str) -> CatalogResult<&IrSignal> {
        self.signals.get(name).ok_or_else(|| CatalogError::MissingSignal {
            name: name.to_string(),
        })
    }

    /// Verify that every listed name is present.
    ///
    /// Used at startup so a misconfigured signal name fails the process
    /// before any command is ever formed.
    pub fn validate_names<'a>(
        &self,
        names: impl IntoIterator<Item = &'a str>,
    ) -> CatalogResult<()> {
        for name in names {
            self.require(name)?;
        }
        Ok(())
    }

    /// Number of signals in the catalog.
    pub fn len(&self) -> usize {
        self.signals.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }
}
