//! Configuration for scanning and the Bluetooth transport.

use std::time::Duration;

/// Criteria used to pick a peripheral while scanning
#[derive(Debug, Clone)]
pub struct ScanCriteria {
    /// MAC address or platform id of a specific peripheral
    ///
    /// When set, only this peripheral is accepted and the service/name
    /// checks below are skipped.
    pub address: Option<String>,
    /// Local name prefixes accepted in addition to advertised family services
    pub name_prefixes: Vec<String>,
    /// Maximum time to wait for a matching peripheral
    pub timeout: Duration,
    /// Delay between two polls of the discovered peripherals
    pub poll_interval: Duration,
}

impl ScanCriteria {
    /// Criteria matching one peripheral by address or id
    pub fn with_address(address: impl Into<String>) -> Self {
        Self {
            address: Some(address.into()),
            ..Self::default()
        }
    }

    /// Returns true when a peripheral with the given identity is acceptable
    ///
    /// `advertises_family` tells whether the peripheral advertised one of the
    /// known family services.
    pub fn matches(
        &self,
        address: &str,
        id: &str,
        local_name: Option<&str>,
        advertises_family: bool,
    ) -> bool {
        if let Some(wanted) = &self.address {
            let wanted = wanted.to_lowercase();
            return address.to_lowercase() == wanted || id.to_lowercase() == wanted;
        }

        if advertises_family {
            return true;
        }

        local_name.is_some_and(|name| {
            self.name_prefixes
                .iter()
                .any(|prefix| name.starts_with(prefix.as_str()))
        })
    }
}

impl Default for ScanCriteria {
    fn default() -> Self {
        Self {
            address: None,
            name_prefixes: vec!["LEDnetWF".to_string(), "KS".to_string()],
            timeout: Duration::from_secs(10),
            poll_interval: Duration::from_millis(500),
        }
    }
}

/// Transport-level configuration
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Minimum time between two writes, in milliseconds
    pub command_delay_ms: u64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            command_delay_ms: 15, // 15 seems to be the lowest value supported
        }
    }
}
