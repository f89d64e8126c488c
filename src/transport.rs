/*!
 # Transport abstraction

 The controller never talks to a Bluetooth stack directly. Everything it
 needs from the platform (scanning, GATT lookups, writes and link-loss
 notifications) goes through [`Transport`], which [`crate::BtleTransport`]
 implements on top of btleplug.
*/

use std::fmt;

use async_trait::async_trait;
use futures::stream::BoxStream;
use uuid::Uuid;

use crate::config::ScanCriteria;
use crate::Result;

/// Platform identity of a peripheral, used to match disconnect events
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PeripheralId(String);

impl PeripheralId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PeripheralId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for PeripheralId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for PeripheralId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Operations the controller needs from a Bluetooth stack
///
/// Handles are opaque to the controller; each implementation picks its own.
/// Implementations own link reliability and timeouts: the controller never
/// retries a failed call.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// A discovered peripheral
    type Peripheral: Send + Sync;
    /// A connected GATT server
    type Server: Send + Sync;
    /// A resolved primary service
    type Service: Send + Sync;
    /// A characteristic that packets are written to
    type WriteHandle: Send + Sync + 'static;

    /// Scans until a peripheral matching `criteria` shows up
    async fn scan_and_select(&self, criteria: &ScanCriteria) -> Result<Self::Peripheral>;

    /// Connects to the peripheral's GATT server
    async fn connect_gatt(&self, peripheral: &Self::Peripheral) -> Result<Self::Server>;

    /// Looks up a primary service by UUID
    async fn get_primary_service(
        &self,
        server: &Self::Server,
        service: Uuid,
    ) -> Result<Self::Service>;

    /// Looks up a characteristic of a service by UUID
    async fn get_characteristic(
        &self,
        service: &Self::Service,
        characteristic: Uuid,
    ) -> Result<Self::WriteHandle>;

    /// Writes one packet
    ///
    /// Should fail with [`crate::Error::Disconnected`] when the link is gone and
    /// [`crate::Error::TransportWriteFailed`] for any other rejection.
    async fn write(&self, handle: &Self::WriteHandle, bytes: &[u8]) -> Result<()>;

    /// Stream of peripherals whose link dropped
    async fn disconnect_events(&self) -> Result<BoxStream<'static, PeripheralId>>;

    /// Identity of a discovered peripheral
    fn peripheral_id(&self, peripheral: &Self::Peripheral) -> PeripheralId;
}
