/*!
 # Per-device session state

 A [`DeviceSession`] is created empty when a connection starts, bound to a
 protocol family exactly once by the negotiator, and dropped on disconnect.
 Its [`DeviceState`] caches the last mode, brightness and speed sent, because
 LEDnetWF and Keepsmile controllers only accept those three values together.
*/

use crate::family::DeviceFamily;
use crate::packet::Command;
use crate::transport::PeripheralId;
use crate::{Error, Result};

/// Last-applied values and the LEDnetWF send counter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceState {
    /// Last effect mode sent
    pub mode: u8,
    /// Last brightness sent
    pub brightness: u8,
    /// Last effect speed sent
    pub speed: u8,
    /// LEDnetWF sequence counter, wraps at 65536
    pub counter: u16,
}

impl Default for DeviceState {
    fn default() -> Self {
        Self {
            mode: 1,
            brightness: 100,
            speed: 100,
            counter: 0,
        }
    }
}

impl DeviceState {
    /// Stores the value carried by a mode, brightness or speed command.
    ///
    /// Color and switch commands leave the cache untouched.
    pub fn apply(&mut self, command: &Command) {
        match *command {
            Command::Mode(mode) => self.mode = mode,
            Command::Brightness(brightness) => self.brightness = brightness,
            Command::Speed(speed) => self.speed = speed,
            Command::Rgb { .. } | Command::Switch(_) => {}
        }
    }

    /// Increments the sequence counter and returns the new value
    pub fn next_counter(&mut self) -> u16 {
        self.counter = self.counter.wrapping_add(1);
        self.counter
    }
}

/// One connected peripheral
#[derive(Debug)]
pub struct DeviceSession<H> {
    peripheral: PeripheralId,
    family: DeviceFamily,
    write_handle: Option<H>,
    state: DeviceState,
}

impl<H> DeviceSession<H> {
    /// Creates an unbound session for a peripheral
    pub fn new(peripheral: PeripheralId) -> Self {
        Self {
            peripheral,
            family: DeviceFamily::Unknown,
            write_handle: None,
            state: DeviceState::default(),
        }
    }

    /// Binds the negotiated family and its write handle
    ///
    /// Fails with [`Error::SessionAlreadyBound`] if the session already has a
    /// family, and with [`Error::NoCompatibleDevice`] for [`DeviceFamily::Unknown`].
    pub fn bind(&mut self, family: DeviceFamily, write_handle: H) -> Result<()> {
        if self.family != DeviceFamily::Unknown {
            return Err(Error::SessionAlreadyBound);
        }
        if family == DeviceFamily::Unknown {
            return Err(Error::NoCompatibleDevice);
        }

        self.family = family;
        self.write_handle = Some(write_handle);
        Ok(())
    }

    pub fn peripheral(&self) -> &PeripheralId {
        &self.peripheral
    }

    pub fn family(&self) -> DeviceFamily {
        self.family
    }

    pub fn is_bound(&self) -> bool {
        self.family != DeviceFamily::Unknown && self.write_handle.is_some()
    }

    pub fn write_handle(&self) -> Option<&H> {
        self.write_handle.as_ref()
    }

    pub fn state(&self) -> &DeviceState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut DeviceState {
        &mut self.state
    }
}
