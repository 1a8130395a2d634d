//! MAVLink link configuration
//!
//! The system id is not part of it: every send operation takes it from the
//! caller.

use super::frame::ProtocolVersion;

/// MAVLink link configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MavlinkConfig {
    /// Component ID stamped on every outgoing frame (parameter values excepted)
    pub component_id: u8,
    /// Serial baud rate used by `init` (default: 921600)
    pub baud_rate: u32,
    /// Board serial device index
    pub device: u32,
    /// Protocol version of outgoing frames
    pub protocol: ProtocolVersion,
}

impl Default for MavlinkConfig {
    fn default() -> Self {
        Self {
            component_id: 250,
            baud_rate: 921_600,
            device: 0,
            protocol: ProtocolVersion::V1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MavlinkConfig::default();
        assert_eq!(config.component_id, 250);
        assert_eq!(config.baud_rate, 921_600);
        assert_eq!(config.device, 0);
        assert_eq!(config.protocol, ProtocolVersion::V1);
    }
}
