//! Persisted accessory state.
//!
//! The last settled fan state survives restarts so the driver resumes with
//! what the user last asked for instead of a zeroed fan. The record format
//! and location are this module's concern only; the reconciler just calls
//! `load` once at construction and `store` after every settle.

use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::reconcile::FanState;

/// Load/store contract for the persisted state record.
pub trait StateStore: Send + Sync {
    /// Read the last persisted state, `None` when nothing was stored yet.
    fn load(&self) -> Result<Option<FanState>, StoreError>;

    /// Persist the given state.
    fn store(&self, state: &FanState) -> Result<(), StoreError>;
}

/// On-disk record wrapping the state with a write timestamp.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedState {
    #[serde(flatten)]
    state: FanState,
    updated_at: DateTime<Utc>,
}

/// JSON file implementation of [`StateStore`].
#[derive(Debug)]
pub struct JsonStateStore {
    path: PathBuf,
}

impl JsonStateStore {
    /// Create a store backed by the given file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonStateStore { path: path.into() }
    }

    fn path_string(&self) -> String {
        self.path.display().to_string()
    }
}

impl StateStore for JsonStateStore {
    fn load(&self) -> Result<Option<FanState>, StoreError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path_string(),
                    source,
                })
            }
        };
        let record: PersistedState =
            serde_json::from_str(&text).map_err(|source| StoreError::Format {
                path: self.path_string(),
                source,
            })?;
        Ok(Some(record.state))
    }

    fn store(&self, state: &FanState) -> Result<(), StoreError> {
        let record = PersistedState {
            state: *state,
            updated_at: Utc::now(),
        };
        let text = serde_json::to_string_pretty(&record).map_err(|source| StoreError::Format {
            path: self.path_string(),
            source,
        })?;
        fs::write(&self.path, text).map_err(|source| StoreError::Io {
            path: self.path_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store(tag: &str) -> JsonStateStore {
        let path = std::env::temp_dir().join(format!("fb-state-{}-{}.json", tag, std::process::id()));
        let _ = fs::remove_file(&path);
        JsonStateStore::new(path)
    }

    #[test]
    fn test_load_missing_file_is_none() {
        let store = temp_store("missing");
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_store_then_load() {
        let store = temp_store("roundtrip");
        let state = FanState { on: true, speed: 62 };
        store.store(&state).unwrap();
        assert_eq!(store.load().unwrap(), Some(state));
        let _ = fs::remove_file(&store.path);
    }

    #[test]
    fn test_malformed_record_is_an_error() {
        let store = temp_store("malformed");
        fs::write(&store.path, "not json").unwrap();
        assert!(matches!(store.load(), Err(StoreError::Format { .. })));
        let _ = fs::remove_file(&store.path);
    }
}
