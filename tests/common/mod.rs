//! In-memory transport shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ble_led_controller::{
    ConnectionHandlers, DeviceFamily, Error, LedController, PeripheralId, Result, ScanCriteria,
    Transport,
};
use futures::channel::mpsc::{unbounded, UnboundedSender};
use futures::stream::{BoxStream, StreamExt};
use parking_lot::Mutex;
use uuid::Uuid;

/// How the fake answers writes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteBehaviour {
    Accept,
    Reject,
    Disconnected,
}

struct Inner {
    peripheral: PeripheralId,
    discoverable: Mutex<bool>,
    services: Mutex<HashSet<Uuid>>,
    characteristics: Mutex<HashSet<Uuid>>,
    probes: Mutex<Vec<Uuid>>,
    writes: Mutex<Vec<Vec<u8>>>,
    write_behaviour: Mutex<WriteBehaviour>,
    subscribers: Mutex<Vec<UnboundedSender<PeripheralId>>>,
}

/// Fake Bluetooth stack; clones share the same state
#[derive(Clone)]
pub struct FakeTransport {
    inner: Arc<Inner>,
}

impl FakeTransport {
    pub fn new(peripheral: &str) -> Self {
        Self {
            inner: Arc::new(Inner {
                peripheral: PeripheralId::from(peripheral),
                discoverable: Mutex::new(true),
                services: Mutex::new(HashSet::new()),
                characteristics: Mutex::new(HashSet::new()),
                probes: Mutex::new(Vec::new()),
                writes: Mutex::new(Vec::new()),
                write_behaviour: Mutex::new(WriteBehaviour::Accept),
                subscribers: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Fake exposing the service and characteristic of each given family
    pub fn with_families(peripheral: &str, families: &[DeviceFamily]) -> Self {
        let transport = Self::new(peripheral);
        for family in families {
            transport.expose(*family);
        }
        transport
    }

    pub fn expose(&self, family: DeviceFamily) {
        if let Some(profile) = family.profile() {
            self.inner.services.lock().insert(profile.service_uuid);
            self.inner
                .characteristics
                .lock()
                .insert(profile.characteristic_uuid);
        }
    }

    /// Keeps the family service but hides its write characteristic
    pub fn hide_characteristic(&self, family: DeviceFamily) {
        if let Some(profile) = family.profile() {
            self.inner
                .characteristics
                .lock()
                .remove(&profile.characteristic_uuid);
        }
    }

    pub fn set_discoverable(&self, discoverable: bool) {
        *self.inner.discoverable.lock() = discoverable;
    }

    pub fn set_write_behaviour(&self, behaviour: WriteBehaviour) {
        *self.inner.write_behaviour.lock() = behaviour;
    }

    /// Service UUIDs looked up so far, in order
    pub fn probes(&self) -> Vec<Uuid> {
        self.inner.probes.lock().clone()
    }

    /// Every write attempt so far, in order
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.inner.writes.lock().clone()
    }

    pub fn last_write(&self) -> Option<Vec<u8>> {
        self.inner.writes.lock().last().cloned()
    }

    /// Emits a disconnect event for `peripheral`
    pub fn disconnect(&self, peripheral: &str) {
        let id = PeripheralId::from(peripheral);
        self.inner
            .subscribers
            .lock()
            .retain(|subscriber| subscriber.unbounded_send(id.clone()).is_ok());
    }
}

#[async_trait]
impl Transport for FakeTransport {
    type Peripheral = PeripheralId;
    type Server = PeripheralId;
    type Service = Uuid;
    type WriteHandle = Uuid;

    async fn scan_and_select(&self, _criteria: &ScanCriteria) -> Result<PeripheralId> {
        if *self.inner.discoverable.lock() {
            Ok(self.inner.peripheral.clone())
        } else {
            Err(Error::DeviceNotFound)
        }
    }

    async fn connect_gatt(&self, peripheral: &PeripheralId) -> Result<PeripheralId> {
        Ok(peripheral.clone())
    }

    async fn get_primary_service(&self, _server: &PeripheralId, service: Uuid) -> Result<Uuid> {
        self.inner.probes.lock().push(service);
        if self.inner.services.lock().contains(&service) {
            Ok(service)
        } else {
            Err(Error::ServiceNotFound(service))
        }
    }

    async fn get_characteristic(&self, _service: &Uuid, characteristic: Uuid) -> Result<Uuid> {
        if self.inner.characteristics.lock().contains(&characteristic) {
            Ok(characteristic)
        } else {
            Err(Error::CharacteristicNotFound(characteristic.to_string()))
        }
    }

    async fn write(&self, _handle: &Uuid, bytes: &[u8]) -> Result<()> {
        self.inner.writes.lock().push(bytes.to_vec());
        let behaviour = *self.inner.write_behaviour.lock();
        match behaviour {
            WriteBehaviour::Accept => Ok(()),
            WriteBehaviour::Reject => Err(Error::TransportWriteFailed("rejected".to_string())),
            WriteBehaviour::Disconnected => Err(Error::Disconnected),
        }
    }

    async fn disconnect_events(&self) -> Result<BoxStream<'static, PeripheralId>> {
        let (tx, rx) = unbounded();
        self.inner.subscribers.lock().push(tx);
        Ok(rx.boxed())
    }

    fn peripheral_id(&self, peripheral: &PeripheralId) -> PeripheralId {
        peripheral.clone()
    }
}

/// Waits for the disconnect watcher to discard the session
pub async fn wait_until_disconnected(controller: &LedController<FakeTransport>) {
    tokio::time::timeout(Duration::from_secs(1), async {
        while controller.is_connected().await {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("session was not discarded after disconnect");
}

/// Shared log of handler invocations
#[derive(Clone, Default)]
pub struct EventLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl EventLog {
    pub fn push(&self, entry: impl Into<String>) {
        self.entries.lock().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().clone()
    }
}

/// Handlers that record every outcome into `log`
pub fn recording_handlers(log: &EventLog) -> ConnectionHandlers {
    let connected = log.clone();
    let disconnected = log.clone();
    let failed = log.clone();
    ConnectionHandlers::new()
        .on_connected(move |family| connected.push(format!("connected {family}")))
        .on_disconnected(move |peripheral| disconnected.push(format!("disconnected {peripheral}")))
        .on_error(move |e| failed.push(format!("error {e}")))
}

/// Controller connected to a fake exposing `families`
pub async fn connected_controller(
    families: &[DeviceFamily],
) -> (LedController<FakeTransport>, FakeTransport, EventLog) {
    let transport = FakeTransport::with_families("fake-strip", families);
    let controller = LedController::new(transport.clone());
    let log = EventLog::default();
    controller
        .connect(&ScanCriteria::default(), recording_handlers(&log))
        .await
        .expect("fake device should connect");
    (controller, transport, log)
}
