use async_trait::async_trait;
use btleplug::api::{
    Central, CentralEvent, CharPropFlags, Characteristic, Manager as _, Peripheral as _,
    ScanFilter, Service, WriteType,
};
use btleplug::platform::{Adapter, Manager, Peripheral};
use futures::stream::{BoxStream, StreamExt};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time;
use tracing::{debug, error, info, instrument, trace, warn};
use uuid::Uuid;

use crate::config::{ControllerConfig, ScanCriteria};
use crate::family::DeviceFamily;
use crate::transport::{PeripheralId, Transport};
use crate::{Error, Result};

/// Gets the default Bluetooth adapter
#[instrument(skip(manager))]
async fn get_central(manager: &Manager) -> Result<Adapter> {
    debug!("Getting default Bluetooth adapter");
    let adapters = manager.adapters().await?;
    match adapters.into_iter().next() {
        Some(adapter) => {
            debug!("Using Bluetooth adapter");
            Ok(adapter)
        }
        None => {
            error!("No Bluetooth adapters found");
            Err(Error::NoBluetoothAdapters)
        }
    }
}

/// Serializes writes and enforces a minimum delay between them
struct CommandQueue {
    /// Minimum delay between commands
    min_delay: Duration,
    /// Last command timestamp, locked for the whole write
    last_command: Mutex<Instant>,
}

impl CommandQueue {
    fn new(min_delay_ms: u64) -> Self {
        let min_delay = Duration::from_millis(min_delay_ms);
        Self {
            min_delay,
            last_command: Mutex::new(
                Instant::now()
                    .checked_sub(min_delay)
                    .unwrap_or_else(Instant::now),
            ),
        }
    }

    async fn execute<T, F>(&self, future: F) -> T
    where
        F: std::future::Future<Output = T> + Send,
        T: Send,
    {
        // Holding the lock keeps one write in flight at a time
        let mut last_cmd = self.last_command.lock().await;
        let elapsed = last_cmd.elapsed();
        if elapsed < self.min_delay {
            let wait_time = self.min_delay - elapsed;
            trace!("Rate limiting: waiting {:?} before next command", wait_time);
            time::sleep(wait_time).await;
        }

        let result = future.await;
        *last_cmd = Instant::now();

        result
    }
}

/// A primary service resolved on a connected peripheral
#[derive(Debug, Clone)]
pub struct GattService {
    peripheral: Peripheral,
    service: Service,
}

/// The characteristic packets are written to
#[derive(Debug, Clone)]
pub struct BtleWriteHandle {
    peripheral: Peripheral,
    characteristic: Characteristic,
}

/// [`Transport`] backed by the system Bluetooth stack through btleplug
pub struct BtleTransport {
    central: Adapter,
    command_queue: Arc<CommandQueue>,
}

impl BtleTransport {
    /// Opens the default Bluetooth adapter
    #[instrument]
    pub async fn new(config: ControllerConfig) -> Result<Self> {
        info!("Initializing BLE transport");
        let manager = Manager::new().await?;
        let central = get_central(&manager).await?;

        Ok(Self {
            central,
            command_queue: Arc::new(CommandQueue::new(config.command_delay_ms)),
        })
    }

    /// Returns the first known peripheral matching `criteria`, if any
    async fn find_match(&self, criteria: &ScanCriteria) -> Result<Option<Peripheral>> {
        let peripherals = self.central.peripherals().await?;
        debug!("Found {} BLE peripherals so far", peripherals.len());

        let family_services = DeviceFamily::service_uuids();
        for p in peripherals {
            let Ok(Some(props)) = p.properties().await else {
                continue;
            };

            let advertises_family = props
                .services
                .iter()
                .any(|uuid| family_services.contains(uuid));
            let address = p.address().to_string();
            let id = p.id().to_string();
            trace!(
                "Checking device {} ({:?}), family service advertised: {}",
                id,
                props.local_name,
                advertises_family
            );

            if criteria.matches(&address, &id, props.local_name.as_deref(), advertises_family) {
                info!(
                    "Found matching device: {} {}",
                    address,
                    props.local_name.as_deref().unwrap_or("<unnamed>")
                );
                return Ok(Some(p));
            }
        }

        Ok(None)
    }
}

#[async_trait]
impl Transport for BtleTransport {
    type Peripheral = Peripheral;
    type Server = Peripheral;
    type Service = GattService;
    type WriteHandle = BtleWriteHandle;

    #[instrument(skip(self))]
    async fn scan_and_select(&self, criteria: &ScanCriteria) -> Result<Peripheral> {
        info!("Scanning for compatible BLE devices...");
        self.central.start_scan(ScanFilter::default()).await?;

        let start_time = Instant::now();
        while start_time.elapsed() < criteria.timeout {
            if let Some(peripheral) = self.find_match(criteria).await? {
                self.central.stop_scan().await?;
                return Ok(peripheral);
            }

            let remaining = criteria.timeout.saturating_sub(start_time.elapsed());
            info!(
                "Still scanning for compatible devices... ({} seconds remaining)",
                remaining.as_secs()
            );
            time::sleep(criteria.poll_interval).await;
        }

        self.central.stop_scan().await?;
        error!(
            "No matching LED device found within {} seconds",
            criteria.timeout.as_secs()
        );
        Err(Error::DeviceNotFound)
    }

    #[instrument(skip_all)]
    async fn connect_gatt(&self, peripheral: &Peripheral) -> Result<Peripheral> {
        info!("Connecting to device...");
        if !peripheral.is_connected().await? {
            peripheral.connect().await?;
        }

        debug!("Discovering services...");
        peripheral.discover_services().await?;
        Ok(peripheral.clone())
    }

    #[instrument(skip(self, server))]
    async fn get_primary_service(
        &self,
        server: &Peripheral,
        service: Uuid,
    ) -> Result<GattService> {
        server
            .services()
            .into_iter()
            .find(|s| s.primary && s.uuid == service)
            .map(|found| GattService {
                peripheral: server.clone(),
                service: found,
            })
            .ok_or(Error::ServiceNotFound(service))
    }

    #[instrument(skip(self, service))]
    async fn get_characteristic(
        &self,
        service: &GattService,
        characteristic: Uuid,
    ) -> Result<BtleWriteHandle> {
        service
            .service
            .characteristics
            .iter()
            .find(|c| c.uuid == characteristic)
            .map(|found| BtleWriteHandle {
                peripheral: service.peripheral.clone(),
                characteristic: found.clone(),
            })
            .ok_or_else(|| Error::CharacteristicNotFound(characteristic.to_string()))
    }

    #[instrument(skip(self, handle, bytes), fields(cmd_length = bytes.len()))]
    async fn write(&self, handle: &BtleWriteHandle, bytes: &[u8]) -> Result<()> {
        let peripheral = &handle.peripheral;
        let characteristic = &handle.characteristic;

        // Prefer WriteWithResponse when supported
        let write_type = if characteristic.properties.contains(CharPropFlags::WRITE) {
            WriteType::WithResponse
        } else {
            WriteType::WithoutResponse
        };

        self.command_queue
            .execute(async move {
                trace!("Sending BLE command");
                match peripheral.write(characteristic, bytes, write_type).await {
                    Ok(()) => {
                        trace!("Command sent successfully");
                        Ok(())
                    }
                    Err(e) => {
                        if peripheral.is_connected().await.unwrap_or(false) {
                            warn!("Command failed: {}", e);
                            Err(Error::TransportWriteFailed(e.to_string()))
                        } else {
                            warn!("Command failed, device is disconnected: {}", e);
                            Err(Error::Disconnected)
                        }
                    }
                }
            })
            .await
    }

    async fn disconnect_events(&self) -> Result<BoxStream<'static, PeripheralId>> {
        let events = self.central.events().await?;
        Ok(events
            .filter_map(|event| async move {
                match event {
                    CentralEvent::DeviceDisconnected(id) => Some(PeripheralId::new(id.to_string())),
                    _ => None,
                }
            })
            .boxed())
    }

    fn peripheral_id(&self, peripheral: &Peripheral) -> PeripheralId {
        PeripheralId::new(peripheral.id().to_string())
    }
}
