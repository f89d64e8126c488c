/*!
 # Protocol negotiation

 Decides which protocol family a connected peripheral speaks by probing the
 family services in [`DeviceFamily::PRIORITY`] order. The first family whose
 service and write characteristic both resolve wins; later families are not
 probed. Peripherals that expose several of the services are therefore always
 driven with the highest-priority dialect.

 Nothing is read back from the device: a bound session starts with the
 default cached values.
*/

use tracing::{debug, error, info, instrument};

use crate::family::DeviceFamily;
use crate::state::DeviceSession;
use crate::transport::Transport;
use crate::{Error, Result};

/// Drives the family handshake against a transport
pub struct ProtocolNegotiator<'a, T: Transport> {
    transport: &'a T,
}

impl<'a, T: Transport> ProtocolNegotiator<'a, T> {
    pub fn new(transport: &'a T) -> Self {
        Self { transport }
    }

    /// Probes every family in priority order and binds the first match.
    ///
    /// On failure the session is left untouched and
    /// [`Error::NoCompatibleDevice`] is returned.
    #[instrument(skip_all, fields(peripheral = %session.peripheral()))]
    pub async fn negotiate(
        &self,
        server: &T::Server,
        session: &mut DeviceSession<T::WriteHandle>,
    ) -> Result<DeviceFamily> {
        if session.is_bound() {
            return Err(Error::SessionAlreadyBound);
        }

        for family in DeviceFamily::PRIORITY {
            match self.probe(server, family).await {
                Ok(Some(handle)) => {
                    session.bind(family, handle)?;
                    info!("Negotiated {} protocol", family);
                    return Ok(family);
                }
                Ok(None) => {}
                Err(e) => debug!("{} protocol not available: {}", family, e),
            }
        }

        error!("Device exposes none of the known LED services");
        Err(Error::NoCompatibleDevice)
    }

    /// Resolves the service and write characteristic of one family
    async fn probe(
        &self,
        server: &T::Server,
        family: DeviceFamily,
    ) -> Result<Option<T::WriteHandle>> {
        let Some(profile) = family.profile() else {
            return Ok(None);
        };

        debug!("Probing {} service {}", family, profile.service_uuid);
        let service = self
            .transport
            .get_primary_service(server, profile.service_uuid)
            .await?;
        let handle = self
            .transport
            .get_characteristic(&service, profile.characteristic_uuid)
            .await?;

        debug!("Found write characteristic {}", profile.characteristic_uuid);
        Ok(Some(handle))
    }
}
