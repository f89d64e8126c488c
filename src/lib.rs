/*!
 # Bluetooth LED Strip Controller Library

 A Rust library for controlling RGB LED strips over Bluetooth LE.
 Three incompatible protocol families are supported and detected automatically
 while connecting: generic `FFF0` controllers, LEDnetWF controllers and
 Keepsmile controllers.

 ## Features

 * Protocol family negotiation in a fixed priority order
 * Power on/off control
 * RGB color control
 * Brightness, mode and speed control (combined packets where the device requires them)
 * Disconnect notification

 ## Example

 ```no_run
 use ble_led_controller::*;

 #[tokio::main]
 async fn main() -> Result<()> {
     // Initialize tracing for logs
     tracing_subscriber::fmt::init();

     let transport = BtleTransport::new(ControllerConfig::default()).await?;
     let controller = LedController::new(transport);

     let handlers = ConnectionHandlers::new()
         .on_connected(|family| println!("connected to a {family} device"))
         .on_error(|e| eprintln!("LED error: {e}"));
     controller.connect(&ScanCriteria::default(), handlers).await?;

     controller.set_switch(true).await?;
     controller.set_rgb(255, 0, 0).await?; // Set to red
     controller.set_brightness(80).await?; // 80% brightness

     Ok(())
 }
 ```
*/

use thiserror::Error;
use uuid::Uuid;

/// Custom error types for the LED controller library
#[derive(Error, Debug)]
pub enum Error {
    /// No Bluetooth adapters found
    #[error("No Bluetooth adapters found")]
    NoBluetoothAdapters,

    /// Scanning finished without a matching peripheral
    #[error("No matching LED device found while scanning")]
    DeviceNotFound,

    /// None of the known protocol families could be negotiated
    #[error("No compatible LED device found")]
    NoCompatibleDevice,

    /// The peripheral does not expose the requested primary service
    #[error("Could not find primary service: {0}")]
    ServiceNotFound(Uuid),

    /// Failed to find required BLE characteristic
    #[error("Could not find required BLE characteristic: {0}")]
    CharacteristicNotFound(String),

    /// A command needs an established session
    #[error("No LED device connected")]
    NotConnected,

    /// A session can only be bound to a family once
    #[error("Session is already bound to a device family")]
    SessionAlreadyBound,

    /// The platform rejected a write or the peripheral was unreachable
    #[error("Write to LED device failed: {0}")]
    TransportWriteFailed(String),

    /// The link to the peripheral dropped
    #[error("LED device disconnected")]
    Disconnected,

    /// BLE communication error
    #[error("BLE communication error: {0}")]
    BleError(String),

    /// Error from btleplug
    #[error(transparent)]
    BtlePlugError(#[from] btleplug::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

pub mod btle;
pub mod checksum;
pub mod color;
pub mod config;
pub mod controller;
pub mod events;
pub mod family;
pub mod negotiator;
pub mod packet;
pub mod state;
pub mod transport;

// Re-export key types
pub use btle::BtleTransport;
pub use color::{hsv_to_rgb, rgb_to_hsv, Hsv};
pub use config::{ControllerConfig, ScanCriteria};
pub use controller::LedController;
pub use events::ConnectionHandlers;
pub use family::{DeviceFamily, FamilyProfile};
pub use negotiator::ProtocolNegotiator;
pub use packet::{Command, Packet};
pub use state::{DeviceSession, DeviceState};
pub use transport::{PeripheralId, Transport};
