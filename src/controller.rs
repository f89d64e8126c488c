use futures::stream::{BoxStream, StreamExt};
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use crate::config::ScanCriteria;
use crate::events::ConnectionHandlers;
use crate::family::DeviceFamily;
use crate::negotiator::ProtocolNegotiator;
use crate::packet::{self, Command};
use crate::state::{DeviceSession, DeviceState};
use crate::transport::{PeripheralId, Transport};
use crate::Result;

type SharedSession<H> = Arc<Mutex<Option<DeviceSession<H>>>>;

/// Limits a percentage to 0-100, warning when it had to
fn limit_percent(name: &str, value: u8) -> u8 {
    if value > 100 {
        warn!(
            "{} value {} out of range (0-100), limiting to 100",
            name, value
        );
        100
    } else {
        value
    }
}

/// Main struct for controlling an LED strip through a [`Transport`]
///
/// Commands issued while no device is connected are ignored. Commands on a
/// connected device are serialized: the session lock is held from encoding
/// until the transport finished the write.
pub struct LedController<T: Transport> {
    transport: Arc<T>,
    session: SharedSession<T::WriteHandle>,
    handlers: RwLock<Arc<ConnectionHandlers>>,
    watcher: parking_lot::Mutex<Option<JoinHandle<()>>>,
}

impl<T: Transport> LedController<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport: Arc::new(transport),
            session: Arc::new(Mutex::new(None)),
            handlers: RwLock::new(Arc::new(ConnectionHandlers::default())),
            watcher: parking_lot::Mutex::new(None),
        }
    }

    /// Scans for a device, connects and negotiates its protocol family
    ///
    /// Any previous session is discarded first. Failures are reported to the
    /// error handler and returned.
    #[instrument(skip(self, handlers))]
    pub async fn connect(
        &self,
        criteria: &ScanCriteria,
        handlers: ConnectionHandlers,
    ) -> Result<DeviceFamily> {
        let handlers = Arc::new(handlers);
        *self.handlers.write() = Arc::clone(&handlers);

        self.close().await;

        match self.establish(criteria, &handlers).await {
            Ok(family) => {
                info!("Successfully connected to {} device", family);
                handlers.connected(family);
                Ok(family)
            }
            Err(e) => {
                error!("Failed to connect: {}", e);
                handlers.error(&e);
                Err(e)
            }
        }
    }

    async fn establish(
        &self,
        criteria: &ScanCriteria,
        handlers: &Arc<ConnectionHandlers>,
    ) -> Result<DeviceFamily> {
        let peripheral = self.transport.scan_and_select(criteria).await?;
        let peripheral_id = self.transport.peripheral_id(&peripheral);
        let server = self.transport.connect_gatt(&peripheral).await?;

        let mut session = DeviceSession::new(peripheral_id.clone());
        let family = ProtocolNegotiator::new(self.transport.as_ref())
            .negotiate(&server, &mut session)
            .await?;

        // Subscribe before the session is visible so no drop goes unnoticed
        let events = self.transport.disconnect_events().await?;
        *self.session.lock().await = Some(session);
        self.spawn_watcher(peripheral_id, events, Arc::clone(handlers));

        Ok(family)
    }

    /// Discards the session when the bound peripheral disconnects
    fn spawn_watcher(
        &self,
        peripheral: PeripheralId,
        mut events: BoxStream<'static, PeripheralId>,
        handlers: Arc<ConnectionHandlers>,
    ) {
        let session = Arc::clone(&self.session);
        let watcher = tokio::spawn(async move {
            while let Some(dropped) = events.next().await {
                if dropped != peripheral {
                    continue;
                }

                {
                    let mut guard = session.lock().await;
                    if guard
                        .as_ref()
                        .is_some_and(|current| current.peripheral() == &peripheral)
                    {
                        guard.take();
                    }
                }

                warn!("Device {} disconnected", peripheral);
                handlers.disconnected(&peripheral);
                break;
            }
        });

        if let Some(previous) = self.watcher.lock().replace(watcher) {
            previous.abort();
        }
    }

    /// Discards the current session, if any
    pub async fn close(&self) {
        if let Some(watcher) = self.watcher.lock().take() {
            watcher.abort();
        }
        if let Some(session) = self.session.lock().await.take() {
            info!("Closed session with {}", session.peripheral());
        }
    }

    /// Negotiated family, [`DeviceFamily::Unknown`] when not connected
    pub async fn family(&self) -> DeviceFamily {
        self.session
            .lock()
            .await
            .as_ref()
            .map_or(DeviceFamily::Unknown, |session| session.family())
    }

    pub async fn is_connected(&self) -> bool {
        self.session
            .lock()
            .await
            .as_ref()
            .is_some_and(|session| session.is_bound())
    }

    /// Snapshot of the cached values, `None` when not connected
    pub async fn state(&self) -> Option<DeviceState> {
        self.session
            .lock()
            .await
            .as_ref()
            .map(|session| *session.state())
    }

    /// Sets the RGB color of the LED strip
    ///
    /// # Arguments
    ///
    /// * `red` - Red component (0-255)
    /// * `green` - Green component (0-255)
    /// * `blue` - Blue component (0-255)
    pub async fn set_rgb(&self, red: u8, green: u8, blue: u8) -> Result<()> {
        self.dispatch(Command::Rgb { red, green, blue }).await
    }

    /// Turns the LED strip on or off
    pub async fn set_switch(&self, on: bool) -> Result<()> {
        self.dispatch(Command::Switch(on)).await
    }

    /// Sets the effect mode
    ///
    /// Mode codes are device specific and sent as given.
    pub async fn set_mode(&self, mode: u8) -> Result<()> {
        self.dispatch(Command::Mode(mode)).await
    }

    /// Sets the brightness level
    ///
    /// # Arguments
    ///
    /// * `level` - Brightness level (0-100, larger values are limited to 100)
    pub async fn set_brightness(&self, level: u8) -> Result<()> {
        let level = limit_percent("Brightness", level);
        self.dispatch(Command::Brightness(level)).await
    }

    /// Sets the effect speed
    ///
    /// # Arguments
    ///
    /// * `speed` - Effect speed (0-100, larger values are limited to 100)
    pub async fn set_speed(&self, speed: u8) -> Result<()> {
        let speed = limit_percent("Speed", speed);
        self.dispatch(Command::Speed(speed)).await
    }

    /// Encodes a command for the bound family and writes it
    #[instrument(skip(self))]
    async fn dispatch(&self, command: Command) -> Result<()> {
        let mut guard = self.session.lock().await;
        let Some(session) = guard.as_mut().filter(|session| session.is_bound()) else {
            debug!("No device connected, ignoring command");
            return Ok(());
        };

        let family = session.family();
        let packet = packet::encode(family, &command, session.state_mut())?;
        let Some(handle) = session.write_handle() else {
            return Ok(());
        };

        debug!("Sending {} packet: {}", family, packet);
        match self.transport.write(handle, packet.as_bytes()).await {
            Ok(()) => {
                info!("Applied {:?}", command);
                Ok(())
            }
            Err(e) => {
                error!("Command failed: {}", e);
                let handlers = Arc::clone(&self.handlers.read());
                handlers.error(&e);
                Err(e)
            }
        }
    }
}

impl<T: Transport> Drop for LedController<T> {
    fn drop(&mut self) {
        if let Some(watcher) = self.watcher.get_mut().take() {
            watcher.abort();
        }
    }
}
