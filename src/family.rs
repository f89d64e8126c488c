/*!
 # Protocol families

 Every supported LED controller speaks exactly one of three wire dialects.
 The dialect is identified by the GATT service a peripheral exposes; some
 peripherals expose more than one of the services, so negotiation always
 walks [`DeviceFamily::PRIORITY`] in order.
*/

use std::fmt;
use uuid::Uuid;

/// Supported protocol families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DeviceFamily {
    /// Not negotiated yet
    #[default]
    Unknown,
    /// Single method byte followed by the raw payload (service `FFF0`)
    Generic,
    /// Sequence counter, length bytes and trailing checksum (service `FFFF`)
    LedNetWf,
    /// Fixed header and trailer per command (service `AFD0`)
    Keepsmile,
}

/// GATT identifiers for one protocol family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FamilyProfile {
    /// Family this profile belongs to
    pub family: DeviceFamily,
    /// Primary service UUID
    pub service_uuid: Uuid,
    /// Write characteristic UUID
    pub characteristic_uuid: Uuid,
}

pub const GENERIC_SERVICE_UUID: Uuid = Uuid::from_u128(0x0000fff0_0000_1000_8000_00805f9b34fb);
pub const GENERIC_CHARACTERISTIC_UUID: Uuid =
    Uuid::from_u128(0x0000fff1_0000_1000_8000_00805f9b34fb);

pub const LEDNETWF_SERVICE_UUID: Uuid = Uuid::from_u128(0x0000ffff_0000_1000_8000_00805f9b34fb);
pub const LEDNETWF_CHARACTERISTIC_UUID: Uuid =
    Uuid::from_u128(0x0000ff01_0000_1000_8000_00805f9b34fb);

pub const KEEPSMILE_SERVICE_UUID: Uuid = Uuid::from_u128(0x0000afd0_0000_1000_8000_00805f9b34fb);
pub const KEEPSMILE_CHARACTERISTIC_UUID: Uuid =
    Uuid::from_u128(0x0000afd1_0000_1000_8000_00805f9b34fb);

impl DeviceFamily {
    /// Order in which families are probed during negotiation
    pub const PRIORITY: [DeviceFamily; 3] = [
        DeviceFamily::Generic,
        DeviceFamily::LedNetWf,
        DeviceFamily::Keepsmile,
    ];

    /// Get the GATT profile for this family, `None` for [`DeviceFamily::Unknown`]
    pub fn profile(self) -> Option<FamilyProfile> {
        let (service_uuid, characteristic_uuid) = match self {
            DeviceFamily::Generic => (GENERIC_SERVICE_UUID, GENERIC_CHARACTERISTIC_UUID),
            DeviceFamily::LedNetWf => (LEDNETWF_SERVICE_UUID, LEDNETWF_CHARACTERISTIC_UUID),
            DeviceFamily::Keepsmile => (KEEPSMILE_SERVICE_UUID, KEEPSMILE_CHARACTERISTIC_UUID),
            DeviceFamily::Unknown => return None,
        };

        Some(FamilyProfile {
            family: self,
            service_uuid,
            characteristic_uuid,
        })
    }

    /// Get the family name as string
    pub fn name(self) -> &'static str {
        match self {
            DeviceFamily::Generic => "Generic",
            DeviceFamily::LedNetWf => "LEDnetWF",
            DeviceFamily::Keepsmile => "Keepsmile",
            DeviceFamily::Unknown => "Unknown",
        }
    }

    /// Service UUIDs of every known family, in priority order
    pub fn service_uuids() -> Vec<Uuid> {
        Self::PRIORITY
            .iter()
            .filter_map(|family| family.profile())
            .map(|profile| profile.service_uuid)
            .collect()
    }
}

impl fmt::Display for DeviceFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
