//! Handlers for connection outcomes.

use std::fmt;

use crate::family::DeviceFamily;
use crate::transport::PeripheralId;
use crate::Error;

type ConnectedHandler = Box<dyn Fn(DeviceFamily) + Send + Sync>;
type DisconnectedHandler = Box<dyn Fn(&PeripheralId) + Send + Sync>;
type ErrorHandler = Box<dyn Fn(&Error) + Send + Sync>;

/// Handlers registered when connecting
///
/// Every handler is optional. They are called from the task that observed the
/// outcome, so they should return quickly.
#[derive(Default)]
pub struct ConnectionHandlers {
    connected: Option<ConnectedHandler>,
    disconnected: Option<DisconnectedHandler>,
    error: Option<ErrorHandler>,
}

impl ConnectionHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called once negotiation succeeded, with the negotiated family
    pub fn on_connected(mut self, handler: impl Fn(DeviceFamily) + Send + Sync + 'static) -> Self {
        self.connected = Some(Box::new(handler));
        self
    }

    /// Called when the link to the connected peripheral drops
    pub fn on_disconnected(
        mut self,
        handler: impl Fn(&PeripheralId) + Send + Sync + 'static,
    ) -> Self {
        self.disconnected = Some(Box::new(handler));
        self
    }

    /// Called for failed connects and failed writes
    pub fn on_error(mut self, handler: impl Fn(&Error) + Send + Sync + 'static) -> Self {
        self.error = Some(Box::new(handler));
        self
    }

    pub(crate) fn connected(&self, family: DeviceFamily) {
        if let Some(handler) = &self.connected {
            handler(family);
        }
    }

    pub(crate) fn disconnected(&self, peripheral: &PeripheralId) {
        if let Some(handler) = &self.disconnected {
            handler(peripheral);
        }
    }

    pub(crate) fn error(&self, error: &Error) {
        if let Some(handler) = &self.error {
            handler(error);
        }
    }
}

impl fmt::Debug for ConnectionHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionHandlers")
            .field("on_connected", &self.connected.is_some())
            .field("on_disconnected", &self.disconnected.is_some())
            .field("on_error", &self.error.is_some())
            .finish()
    }
}
