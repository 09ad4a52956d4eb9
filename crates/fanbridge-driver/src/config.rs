//! Driver configuration.
//!
//! All timing and naming policy lives here: the debounce window, the
//! inter-chunk pacing delay, the retry count, the speed-band thresholds,
//! and the catalog names of the four signals the driver sends. Everything
//! has a sensible default so a config file only needs to override what
//! differs.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::ConfigError;
use crate::reconcile::SignalRole;

/// Speed-band thresholds.
///
/// A speed below `medium` selects the low band, below `high` the medium
/// band, anything else the high band. Invariant: `0 < medium < high <= 100`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BandThresholds {
    /// Lower bound (inclusive) of the medium band.
    pub medium: u8,
    /// Lower bound (inclusive) of the high band.
    pub high: u8,
}

impl Default for BandThresholds {
    fn default() -> Self {
        BandThresholds {
            medium: 33,
            high: 66,
        }
    }
}

/// Catalog names of the signals the driver transmits.
///
/// These are configuration, not protocol: the catalog may call its entries
/// anything, as long as all four names resolve at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalNames {
    /// Sent whenever the fan turns off, regardless of speed.
    pub power_off: String,
    /// Low speed band.
    pub low: String,
    /// Medium speed band.
    pub medium: String,
    /// High speed band.
    pub high: String,
}

impl Default for SignalNames {
    fn default() -> Self {
        SignalNames {
            power_off: "power_off".to_string(),
            low: "low".to_string(),
            medium: "medium".to_string(),
            high: "high".to_string(),
        }
    }
}

impl SignalNames {
    /// Resolve the catalog name for a transition decision.
    pub fn name_for(&self, role: SignalRole) -> &str {
        match role {
            SignalRole::PowerOff => &self.power_off,
            SignalRole::Low => &self.low,
            SignalRole::Medium => &self.medium,
            SignalRole::High => &self.high,
        }
    }
}

/// Complete driver configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DriveConfig {
    /// Debounce window after the last write to a property before its
    /// effect is committed and transmitted (milliseconds).
    pub debounce_ms: u64,
    /// Pause after each chunk write to respect the device ingestion rate
    /// (milliseconds).
    pub chunk_delay_ms: u64,
    /// Number of full transmission passes before giving up.
    pub send_attempts: u32,
    /// Speed-band thresholds.
    pub bands: BandThresholds,
    /// Catalog names of the transmitted signals.
    pub signals: SignalNames,
}

impl Default for DriveConfig {
    fn default() -> Self {
        DriveConfig {
            debounce_ms: 300,
            chunk_delay_ms: 100,
            send_attempts: 3,
            bands: BandThresholds::default(),
            signals: SignalNames::default(),
        }
    }
}

impl DriveConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bands.medium == 0 || self.bands.medium >= self.bands.high || self.bands.high > 100
        {
            return Err(ConfigError::InvalidBands {
                medium: self.bands.medium,
                high: self.bands.high,
            });
        }
        if self.send_attempts == 0 {
            return Err(ConfigError::NoAttempts);
        }
        Ok(())
    }

    /// All catalog names the driver needs to resolve at startup.
    pub fn required_signals(&self) -> [&str; 4] {
        [
            &self.signals.power_off,
            &self.signals.low,
            &self.signals.medium,
            &self.signals.high,
        ]
    }

    /// Debounce window as a [`Duration`].
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Inter-chunk delay as a [`Duration`].
    pub fn chunk_delay(&self) -> Duration {
        Duration::from_millis(self.chunk_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = DriveConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.debounce_ms, 300);
        assert_eq!(config.chunk_delay_ms, 100);
        assert_eq!(config.send_attempts, 3);
        assert_eq!(config.bands.medium, 33);
        assert_eq!(config.bands.high, 66);
    }

    #[test]
    fn test_band_invariant_enforced() {
        let mut config = DriveConfig::default();
        config.bands = BandThresholds { medium: 0, high: 66 };
        assert!(config.validate().is_err());

        config.bands = BandThresholds { medium: 66, high: 66 };
        assert!(config.validate().is_err());

        config.bands = BandThresholds { medium: 33, high: 101 };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let mut config = DriveConfig::default();
        config.send_attempts = 0;
        assert!(matches!(config.validate(), Err(ConfigError::NoAttempts)));
    }

    #[test]
    fn test_required_signals_follow_names() {
        let mut config = DriveConfig::default();
        config.signals.power_off = "fan_off".to_string();
        assert!(config.required_signals().contains(&"fan_off"));
    }
}
