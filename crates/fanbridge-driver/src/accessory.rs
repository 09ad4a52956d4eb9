//! Host-facing accessory boundary.
//!
//! The host framework calls set/get here; everything else is delegation.
//! The one rule this layer owns: when the serial connection is down, every
//! call fails with the communication-failure condition *before* touching
//! state, so the host can represent the device as unreachable.

use std::sync::Arc;

use tracing::{info, warn};

use fanbridge_link::CommandLink;
use fanbridge_protocol::SignalCatalog;

use crate::config::DriveConfig;
use crate::error::{DriverError, DriverResult};
use crate::reconcile::{FanState, Reconciler, StateUpdate};
use crate::store::StateStore;
use crate::transmit::Transmitter;

/// A fan controlled through IR commands.
pub struct FanAccessory<L> {
    link: Arc<L>,
    reconciler: Reconciler<L>,
}

impl<L: CommandLink> FanAccessory<L> {
    /// Build the accessory.
    ///
    /// Fails fast on an invalid configuration or a catalog missing any of
    /// the configured signal names; without those signals no command can
    /// ever be formed, so this is the place to find out. State is seeded
    /// from the store; an unreadable store degrades to a zeroed fan.
    pub fn new(
        link: Arc<L>,
        catalog: SignalCatalog,
        store: Arc<dyn StateStore>,
        config: DriveConfig,
    ) -> DriverResult<Self> {
        config.validate()?;
        catalog.validate_names(config.required_signals())?;

        let initial = match store.load() {
            Ok(Some(state)) => {
                info!("resuming from persisted state {:?}", state);
                state
            }
            Ok(None) => FanState::default(),
            Err(e) => {
                warn!("ignoring unreadable state store: {}", e);
                FanState::default()
            }
        };

        let transmitter = Transmitter::new(
            Arc::clone(&link),
            config.chunk_delay(),
            config.send_attempts,
        );
        let reconciler = Reconciler::new(transmitter, catalog, store, config, initial);

        Ok(FanAccessory { link, reconciler })
    }

    /// Turn the fan on or off.
    pub fn set_on(&self, on: bool) -> DriverResult<()> {
        self.ensure_connected()?;
        self.reconciler.apply(StateUpdate::power(on));
        Ok(())
    }

    /// Whether the fan is (intended to be) running.
    pub fn get_on(&self) -> DriverResult<bool> {
        self.ensure_connected()?;
        Ok(self.reconciler.current().on)
    }

    /// Set the rotation speed percentage.
    pub fn set_speed(&self, speed: u8) -> DriverResult<()> {
        self.ensure_connected()?;
        self.reconciler.apply(StateUpdate::speed(speed));
        Ok(())
    }

    /// Current rotation speed percentage.
    pub fn get_speed(&self) -> DriverResult<u8> {
        self.ensure_connected()?;
        Ok(self.reconciler.current().speed)
    }

    /// Current intended state, regardless of connection (diagnostics).
    pub fn state(&self) -> FanState {
        self.reconciler.current()
    }

    fn ensure_connected(&self) -> DriverResult<()> {
        if self.link.is_open() {
            Ok(())
        } else {
            Err(DriverError::NotConnected)
        }
    }
}
