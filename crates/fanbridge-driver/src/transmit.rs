//! Chunked, retried IR transmission.
//!
//! One transmitter exists per accessory and owns the single transmission
//! lock: no two signals ever interleave their chunk commands on the wire.
//! The device gives no acknowledgment and drops commands in practice, so
//! each signal is sent as a bounded number of full passes: a failed chunk
//! abandons the rest of its pass and the next pass restarts from chunk 1,
//! because partial state on the device after a failed pass cannot be
//! trusted.
//!
//! Transmission failure is terminal-but-silent at this layer: callers get
//! no error, only the logs do.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, warn};

use fanbridge_link::{CommandLink, LinkError};
use fanbridge_protocol::{encode_chunks, IrSignal};

/// Sends signals over the link, serialized and retried.
pub struct Transmitter<L> {
    link: Arc<L>,
    lock: Mutex<()>,
    chunk_delay: Duration,
    attempts: u32,
}

impl<L: CommandLink> Transmitter<L> {
    /// Create a transmitter writing through the given link.
    pub fn new(link: Arc<L>, chunk_delay: Duration, attempts: u32) -> Self {
        Transmitter {
            link,
            lock: Mutex::new(()),
            chunk_delay,
            attempts,
        }
    }

    /// Transmit a signal.
    ///
    /// If the link is not open this logs and returns immediately, with no
    /// queueing. Otherwise the call holds the transmission lock until all
    /// retry passes complete; a concurrent `send` waits its turn rather
    /// than interleaving.
    pub async fn send(&self, signal: &IrSignal) {
        if !self.link.is_open() {
            warn!(
                "link down, dropping transmission of '{}'",
                signal.name()
            );
            return;
        }

        let _guard = self.lock.lock().await;

        let commands = encode_chunks(signal);
        let total = commands.len();

        for attempt in 1..=self.attempts {
            match self.send_pass(&commands).await {
                Ok(()) => {
                    debug!(
                        "sent '{}' in {} chunk(s) on attempt {}",
                        signal.name(),
                        total,
                        attempt
                    );
                    return;
                }
                Err((chunk, e)) => {
                    warn!(
                        "chunk {}/{} of '{}' failed on attempt {}: {}",
                        chunk,
                        total,
                        signal.name(),
                        attempt,
                        e
                    );
                }
            }
        }

        warn!(
            "transmission of '{}' failed after {} attempts",
            signal.name(),
            self.attempts
        );
    }

    /// Send every chunk once, in order, pacing the device between chunks.
    ///
    /// On failure reports the 1-indexed chunk that did not go out.
    async fn send_pass(&self, commands: &[Vec<u8>]) -> Result<(), (usize, LinkError)> {
        for (index, command) in commands.iter().enumerate() {
            if let Err(e) = self.link.write(command).await {
                return Err((index + 1, e));
            }
            if let Err(e) = self.link.drain().await {
                return Err((index + 1, e));
            }
            tokio::time::sleep(self.chunk_delay).await;
        }
        Ok(())
    }
}
