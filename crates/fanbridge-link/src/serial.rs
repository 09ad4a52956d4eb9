//! Serial port lifecycle management.
//!
//! [`SerialLink`] wraps a `tokio-serial` stream and keeps it alive across
//! device flakiness. A background read task drains everything the device
//! prints (the CLI stalls after 10-15 commands if its output is not
//! consumed) and logs it line by line without interpreting it. Any error
//! (open failure, write failure, read-side EOF) marks the link
//! `Reconnecting` and starts a single fixed-period retry task that keeps
//! reopening the port until it succeeds or the link is closed.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt, ReadHalf, WriteHalf};
use tokio::task::JoinHandle;
use tokio_serial::{SerialPortBuilderExt, SerialStream};
use tracing::{debug, info, warn};

use fanbridge_protocol::LineBuffer;

use crate::error::{LinkError, LinkResult};
use crate::CommandLink;

/// Default baud rate of the IR blaster's USB CDC port.
pub const DEFAULT_BAUD: u32 = 230_400;

/// Connection lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Never opened, or explicitly closed.
    Closed,
    /// An open attempt is in progress.
    Opening,
    /// The handle is live and writable.
    Open,
    /// The connection was lost; the periodic retry task is driving reopens.
    Reconnecting,
}

/// Tunables for the connection lifecycle.
#[derive(Debug, Clone)]
pub struct LinkConfig {
    /// Period of the reconnect retry task.
    pub retry_period: Duration,
}

impl Default for LinkConfig {
    fn default() -> Self {
        LinkConfig {
            retry_period: Duration::from_secs(5),
        }
    }
}

/// Owns the serial connection to the IR blaster.
///
/// Cheap to clone; all clones share one connection. Only this type
/// constructs or destroys the port handle; everything above it goes
/// through [`CommandLink`].
#[derive(Clone)]
pub struct SerialLink {
    shared: Arc<LinkShared>,
}

struct LinkShared {
    path: String,
    baud: u32,
    retry_period: Duration,
    state: Mutex<ConnectionState>,
    writer: tokio::sync::Mutex<Option<WriteHalf<SerialStream>>>,
    reader_task: Mutex<Option<JoinHandle<()>>>,
    retry_task: Mutex<Option<JoinHandle<()>>>,
}

impl SerialLink {
    /// Create a link for the given port path. Does not open it.
    pub fn new(path: impl Into<String>, baud: u32, config: LinkConfig) -> Self {
        SerialLink {
            shared: Arc::new(LinkShared {
                path: path.into(),
                baud,
                retry_period: config.retry_period,
                state: Mutex::new(ConnectionState::Closed),
                writer: tokio::sync::Mutex::new(None),
                reader_task: Mutex::new(None),
                retry_task: Mutex::new(None),
            }),
        }
    }

    /// The configured port path.
    pub fn path(&self) -> &str {
        &self.shared.path
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        *self.shared.state.lock().unwrap()
    }

    /// Whether the handle is live and writable.
    pub fn is_open(&self) -> bool {
        self.state() == ConnectionState::Open
    }

    /// Open the port, running the full reinitialize routine.
    ///
    /// On failure the error is returned *and* the periodic retry task is
    /// started, so a caller may ignore the result and let the link recover
    /// on its own.
    pub async fn open(&self) -> LinkResult<()> {
        self.reinitialize(false).await
    }

    /// Tear down any previous handle and open a fresh one.
    async fn reinitialize(&self, from_retry: bool) -> LinkResult<()> {
        // Detach the old reader first so a dying stream cannot schedule a
        // second reconnect while we are already reopening.
        self.detach_reader();
        self.set_state(ConnectionState::Opening);

        {
            let mut writer = self.shared.writer.lock().await;
            if let Some(mut old) = writer.take() {
                let _ = old.shutdown().await;
            }
        }

        match tokio_serial::new(&self.shared.path, self.shared.baud).open_native_async() {
            Ok(stream) => {
                let (rx, tx) = tokio::io::split(stream);
                *self.shared.writer.lock().await = Some(tx);
                self.spawn_reader(rx);
                self.set_state(ConnectionState::Open);
                if !from_retry {
                    self.cancel_retry();
                }
                info!(
                    "serial link open on {} at {} baud",
                    self.shared.path, self.shared.baud
                );
                Ok(())
            }
            Err(source) => {
                self.set_state(ConnectionState::Reconnecting);
                self.schedule_reconnect();
                Err(LinkError::Open {
                    path: self.shared.path.clone(),
                    source,
                })
            }
        }
    }

    /// Write raw bytes to the device.
    ///
    /// A failed write drops the dead handle immediately so later writes
    /// fail fast with [`LinkError::NotOpen`] instead of touching it again.
    pub async fn write(&self, data: &[u8]) -> LinkResult<()> {
        let mut writer = self.shared.writer.lock().await;
        let handle = writer.as_mut().ok_or(LinkError::NotOpen)?;
        if let Err(e) = handle.write_all(data).await {
            writer.take();
            drop(writer);
            self.connection_lost("write failed");
            return Err(LinkError::Io(e));
        }
        Ok(())
    }

    /// Wait until the OS-level send buffer has emptied.
    pub async fn drain(&self) -> LinkResult<()> {
        let mut writer = self.shared.writer.lock().await;
        let handle = writer.as_mut().ok_or(LinkError::NotOpen)?;
        if let Err(e) = handle.flush().await {
            writer.take();
            drop(writer);
            self.connection_lost("drain failed");
            return Err(LinkError::Io(e));
        }
        Ok(())
    }

    /// Close the port and stop all background tasks. No reconnect follows.
    pub async fn close(&self) {
        self.set_state(ConnectionState::Closed);
        self.cancel_retry();
        self.detach_reader();
        let mut writer = self.shared.writer.lock().await;
        if let Some(mut handle) = writer.take() {
            let _ = handle.shutdown().await;
        }
        debug!("serial link on {} closed", self.shared.path);
    }

    fn set_state(&self, state: ConnectionState) {
        *self.shared.state.lock().unwrap() = state;
    }

    /// Mark the connection lost and start the retry task.
    fn connection_lost(&self, why: &str) {
        if self.state() == ConnectionState::Closed {
            return;
        }
        warn!(
            "serial link on {} lost ({}), reconnecting every {:?}",
            self.shared.path, why, self.shared.retry_period
        );
        self.set_state(ConnectionState::Reconnecting);
        self.schedule_reconnect();
    }

    /// Start the periodic retry task unless one is already active.
    ///
    /// Returns whether a new task was started.
    fn schedule_reconnect(&self) -> bool {
        let mut slot = self.shared.retry_task.lock().unwrap();
        if let Some(handle) = slot.as_ref() {
            if !handle.is_finished() {
                return false;
            }
        }
        let link = self.clone();
        let period = self.shared.retry_period;
        *slot = Some(tokio::spawn(async move {
            loop {
                tokio::time::sleep(period).await;
                // Someone else opened or closed the link in the meantime.
                if link.state() != ConnectionState::Reconnecting {
                    break;
                }
                if link.reinitialize(true).await.is_ok() {
                    break;
                }
                debug!("reconnect attempt on {} failed", link.shared.path);
            }
        }));
        true
    }

    fn cancel_retry(&self) {
        if let Some(handle) = self.shared.retry_task.lock().unwrap().take() {
            handle.abort();
        }
    }

    fn detach_reader(&self) {
        if let Some(handle) = self.shared.reader_task.lock().unwrap().take() {
            handle.abort();
        }
    }

    /// Spawn the background read task.
    ///
    /// The device requires its output to be consumed; content is split into
    /// lines and logged, never interpreted. The task ending for any reason
    /// other than an explicit detach means the connection died.
    fn spawn_reader(&self, mut rx: ReadHalf<SerialStream>) {
        let link = self.clone();
        let handle = tokio::spawn(async move {
            let mut lines = LineBuffer::new();
            let mut buf = [0u8; 256];
            loop {
                match rx.read(&mut buf).await {
                    Ok(0) => {
                        debug!("serial stream on {} reached EOF", link.shared.path);
                        break;
                    }
                    Ok(n) => {
                        lines.push(&buf[..n]);
                        while let Some(line) = lines.next_line() {
                            debug!("device: {}", line);
                        }
                    }
                    Err(e) => {
                        debug!("serial read error on {}: {}", link.shared.path, e);
                        break;
                    }
                }
            }
            link.connection_lost("read side closed");
        });
        let mut slot = self.shared.reader_task.lock().unwrap();
        if let Some(old) = slot.replace(handle) {
            old.abort();
        }
    }
}

impl CommandLink for SerialLink {
    fn is_open(&self) -> bool {
        SerialLink::is_open(self)
    }

    fn write(&self, data: &[u8]) -> impl std::future::Future<Output = LinkResult<()>> + Send {
        SerialLink::write(self, data)
    }

    fn drain(&self) -> impl std::future::Future<Output = LinkResult<()>> + Send {
        SerialLink::drain(self)
    }
}

impl std::fmt::Debug for SerialLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialLink")
            .field("path", &self.shared.path)
            .field("baud", &self.shared.baud)
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MISSING_PORT: &str = "/dev/fanbridge-test-missing";

    fn test_link() -> SerialLink {
        SerialLink::new(MISSING_PORT, DEFAULT_BAUD, LinkConfig::default())
    }

    #[test]
    fn test_new_link_is_closed() {
        let link = test_link();
        assert_eq!(link.state(), ConnectionState::Closed);
        assert!(!link.is_open());
    }

    #[tokio::test]
    async fn test_open_missing_port_schedules_reconnect() {
        let link = test_link();
        let err = link.open().await.unwrap_err();
        assert!(matches!(err, LinkError::Open { .. }));
        assert_eq!(link.state(), ConnectionState::Reconnecting);
        link.close().await;
    }

    #[tokio::test]
    async fn test_reconnect_task_is_singular() {
        let link = test_link();
        let _ = link.open().await;

        // The failed open already started the retry task; further failure
        // notifications must not stack a second one.
        assert!(!link.schedule_reconnect());
        assert!(!link.schedule_reconnect());

        link.close().await;
        assert_eq!(link.state(), ConnectionState::Closed);

        // After an explicit close the slot is free again.
        assert!(link.schedule_reconnect());
        link.close().await;
    }

    #[tokio::test]
    async fn test_write_without_open_fails_fast() {
        let link = test_link();
        assert!(matches!(link.write(b"ir tx\r\n").await, Err(LinkError::NotOpen)));
        assert!(matches!(link.drain().await, Err(LinkError::NotOpen)));
    }

    #[tokio::test]
    async fn test_close_parks_state() {
        let link = test_link();
        let _ = link.open().await;
        link.close().await;
        assert_eq!(link.state(), ConnectionState::Closed);
        assert!(!link.is_open());
    }
}
