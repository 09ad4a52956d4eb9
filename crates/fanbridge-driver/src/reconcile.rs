//! State reconciliation: debounce, diff, transmit.
//!
//! Host frameworks deliver property writes in bursts: turning a fan on
//! from a UI slider produces an `on` write and several `speed` writes
//! within tens of milliseconds. Each write lands in `current` immediately
//! (so reads always see the latest intended value) and re-arms that
//! property's debounce timer. Only when a timer survives its window does
//! the state settle: it is persisted, diffed against the last settled
//! state, and at most one signal goes out for the whole burst.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use fanbridge_link::CommandLink;
use fanbridge_protocol::SignalCatalog;

use crate::config::{BandThresholds, DriveConfig};
use crate::store::StateStore;
use crate::transmit::Transmitter;

/// The fan state as the host intends it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FanState {
    /// Whether the fan is (intended to be) running.
    pub on: bool,
    /// Rotation speed percentage in [0, 100].
    pub speed: u8,
}

/// A batch of property writes from the host boundary.
#[derive(Debug, Clone, Copy, Default)]
pub struct StateUpdate {
    /// New power state, if written.
    pub on: Option<bool>,
    /// New speed, if written.
    pub speed: Option<u8>,
}

impl StateUpdate {
    /// An update writing only the power property.
    pub fn power(on: bool) -> Self {
        StateUpdate {
            on: Some(on),
            speed: None,
        }
    }

    /// An update writing only the speed property.
    pub fn speed(speed: u8) -> Self {
        StateUpdate {
            on: None,
            speed: Some(speed),
        }
    }
}

/// Which catalog signal a settled transition calls for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalRole {
    /// The fixed power-off signal.
    PowerOff,
    /// Low speed band.
    Low,
    /// Medium speed band.
    Medium,
    /// High speed band.
    High,
}

/// Decide which signal (if any) a settled transition requires.
///
/// Turning off wins over any speed change; a speed change only matters
/// while the fan is on; a state that settled back to its previous
/// effective value sends nothing.
pub(crate) fn plan_transition(
    previous: &FanState,
    current: &FanState,
    bands: &BandThresholds,
) -> Option<SignalRole> {
    if current.on != previous.on {
        if current.on {
            Some(band_for(current.speed, bands))
        } else {
            Some(SignalRole::PowerOff)
        }
    } else if current.on && current.speed != previous.speed {
        Some(band_for(current.speed, bands))
    } else {
        None
    }
}

/// Map a speed percentage onto its band.
fn band_for(speed: u8, bands: &BandThresholds) -> SignalRole {
    if speed < bands.medium {
        SignalRole::Low
    } else if speed < bands.high {
        SignalRole::Medium
    } else {
        SignalRole::High
    }
}

/// The two live state instances.
struct StatePair {
    /// Latest intended state; mutated on every accepted write.
    current: FanState,
    /// Last state for which a transmission decision was issued.
    previous: FanState,
}

/// One debounce timer slot per known property.
#[derive(Default)]
struct TimerSlots {
    on: Option<JoinHandle<()>>,
    speed: Option<JoinHandle<()>>,
}

#[derive(Clone, Copy)]
enum Property {
    On,
    Speed,
}

/// Debounces property writes and reconciles settled state transitions
/// into transmissions.
///
/// Cheap to clone; all clones share the same state and timers.
pub struct Reconciler<L> {
    shared: Arc<ReconcilerShared<L>>,
}

impl<L> Clone for Reconciler<L> {
    fn clone(&self) -> Self {
        Reconciler {
            shared: Arc::clone(&self.shared),
        }
    }
}

struct ReconcilerShared<L> {
    transmitter: Transmitter<L>,
    catalog: SignalCatalog,
    store: Arc<dyn StateStore>,
    config: DriveConfig,
    states: Mutex<StatePair>,
    timers: Mutex<TimerSlots>,
    /// Serializes settles so back-to-back timer firings each see a stable
    /// snapshot and the second one observes the first's advance.
    settle_lock: tokio::sync::Mutex<()>,
}

impl<L: CommandLink> Reconciler<L> {
    /// Create a reconciler starting from the given settled state.
    pub fn new(
        transmitter: Transmitter<L>,
        catalog: SignalCatalog,
        store: Arc<dyn StateStore>,
        config: DriveConfig,
        initial: FanState,
    ) -> Self {
        Reconciler {
            shared: Arc::new(ReconcilerShared {
                transmitter,
                catalog,
                store,
                config,
                states: Mutex::new(StatePair {
                    current: initial,
                    previous: initial,
                }),
                timers: Mutex::new(TimerSlots::default()),
                settle_lock: tokio::sync::Mutex::new(()),
            }),
        }
    }

    /// Latest intended state. Reads mid-debounce see the newest write.
    pub fn current(&self) -> FanState {
        self.shared.states.lock().current
    }

    /// Apply property writes and (re)arm their debounce timers.
    ///
    /// Must be called from within a tokio runtime.
    pub fn apply(&self, update: StateUpdate) {
        {
            let mut states = self.shared.states.lock();
            if let Some(on) = update.on {
                states.current.on = on;
            }
            if let Some(speed) = update.speed {
                states.current.speed = speed.min(100);
            }
        }
        if update.on.is_some() {
            self.arm(Property::On);
        }
        if update.speed.is_some() {
            self.arm(Property::Speed);
        }
    }

    /// Abort-and-replace the debounce timer for one property, so the
    /// window is measured from the last write and the last value wins.
    fn arm(&self, property: Property) {
        let mut timers = self.shared.timers.lock();
        let slot = match property {
            Property::On => &mut timers.on,
            Property::Speed => &mut timers.speed,
        };
        if let Some(superseded) = slot.take() {
            superseded.abort();
        }

        let shared = Arc::clone(&self.shared);
        let window = self.shared.config.debounce();
        *slot = Some(tokio::spawn(async move {
            tokio::time::sleep(window).await;
            shared.settle().await;
        }));
    }
}

impl<L: CommandLink> ReconcilerShared<L> {
    /// Commit a settled state: persist, diff, transmit, snapshot.
    async fn settle(&self) {
        let _guard = self.settle_lock.lock().await;

        let (current, previous) = {
            let states = self.states.lock();
            (states.current, states.previous)
        };

        if let Err(e) = self.store.store(&current) {
            warn!("failed to persist fan state: {}", e);
        }

        match plan_transition(&previous, &current, &self.config.bands) {
            Some(role) => {
                let name = self.config.signals.name_for(role);
                match self.catalog.get(name) {
                    Some(signal) => {
                        debug!(
                            "settled {:?} -> {:?}, sending '{}'",
                            previous, current, name
                        );
                        self.transmitter.send(signal).await;
                    }
                    // names are validated at construction
                    None => warn!("signal '{}' missing from catalog", name),
                }
            }
            None => trace!("state settled with no effective change"),
        }

        // Advance even when the transmission failed: the wire gives no
        // acknowledgment, so `previous` tracks last intended state.
        self.states.lock().previous = current;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bands() -> BandThresholds {
        BandThresholds {
            medium: 33,
            high: 66,
        }
    }

    fn state(on: bool, speed: u8) -> FanState {
        FanState { on, speed }
    }

    #[test]
    fn test_band_selection() {
        assert_eq!(band_for(10, &bands()), SignalRole::Low);
        assert_eq!(band_for(50, &bands()), SignalRole::Medium);
        assert_eq!(band_for(90, &bands()), SignalRole::High);
    }

    #[test]
    fn test_band_boundaries_are_inclusive_above() {
        assert_eq!(band_for(32, &bands()), SignalRole::Low);
        assert_eq!(band_for(33, &bands()), SignalRole::Medium);
        assert_eq!(band_for(65, &bands()), SignalRole::Medium);
        assert_eq!(band_for(66, &bands()), SignalRole::High);
    }

    #[test]
    fn test_turning_on_sends_band_for_current_speed() {
        let plan = plan_transition(&state(false, 0), &state(true, 50), &bands());
        assert_eq!(plan, Some(SignalRole::Medium));
    }

    #[test]
    fn test_turning_off_overrides_speed() {
        let plan = plan_transition(&state(true, 50), &state(false, 80), &bands());
        assert_eq!(plan, Some(SignalRole::PowerOff));
    }

    #[test]
    fn test_speed_change_while_on() {
        let plan = plan_transition(&state(true, 10), &state(true, 90), &bands());
        assert_eq!(plan, Some(SignalRole::High));
    }

    #[test]
    fn test_speed_change_while_off_is_ignored() {
        let plan = plan_transition(&state(false, 10), &state(false, 90), &bands());
        assert_eq!(plan, None);
    }

    #[test]
    fn test_unchanged_state_is_a_no_op() {
        let plan = plan_transition(&state(true, 40), &state(true, 40), &bands());
        assert_eq!(plan, None);
    }
}
