//! Configuration type definitions

use ferrule_hal::clock::FixedClocks;
use ferrule_hal::spi::SpiConfig;
use ferrule_hal::uart::UartConfig;
use ferrule_hal::PeripheralId;
use heapless::{String, Vec};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Maximum port name length
pub const MAX_NAME_LEN: usize = 16;

/// Maximum ports per board
pub const MAX_PORTS: usize = 8;

/// Current binary configuration version
pub const CONFIG_VERSION: u8 = 1;

/// Role a port is opened in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PortMode {
    Uart(UartConfig),
    Spi(SpiConfig),
}

/// One configured serial port
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PortConfig {
    /// Name the application looks the port up by
    pub name: String<MAX_NAME_LEN>,
    /// Peripheral carrying the port
    pub peripheral: PeripheralId,
    /// Role and framing
    pub mode: PortMode,
    /// Buffer received bytes in a channel
    pub rx_buffer: bool,
    /// Buffer outgoing bytes in a channel
    pub tx_buffer: bool,
}

/// Serial configuration of a board
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BoardConfig {
    /// Config version for compatibility checks
    pub version: u8,
    /// Fixed clock frequencies
    pub clocks: FixedClocks,
    /// Configured ports
    pub ports: Vec<PortConfig, MAX_PORTS>,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl BoardConfig {
    /// Empty configuration with default clocks
    pub fn new() -> Self {
        Self {
            version: CONFIG_VERSION,
            clocks: FixedClocks::default(),
            ports: Vec::new(),
        }
    }

    /// Port with the given name
    pub fn port(&self, name: &str) -> Option<&PortConfig> {
        self.ports.iter().find(|p| p.name.as_str() == name)
    }

    /// Port carried by the given peripheral
    pub fn port_for(&self, peripheral: PeripheralId) -> Option<&PortConfig> {
        self.ports.iter().find(|p| p.peripheral == peripheral)
    }

    /// Add a port, rejecting duplicates
    pub fn add_port(&mut self, port: PortConfig) -> Result<(), ConfigError> {
        if self.port(&port.name).is_some() || self.port_for(port.peripheral).is_some() {
            return Err(ConfigError::Duplicate);
        }
        self.ports
            .push(port)
            .map_err(|_| ConfigError::TooManyItems)
    }

    /// Decode the postcard binary form
    #[cfg(feature = "serde")]
    pub fn from_postcard(bytes: &[u8]) -> Result<Self, ConfigError> {
        let config: BoardConfig =
            postcard::from_bytes(bytes).map_err(|_| ConfigError::Encoding)?;
        if config.version != CONFIG_VERSION {
            warn!(
                "config version mismatch: found {}, expected {}",
                config.version,
                CONFIG_VERSION
            );
            return Err(ConfigError::VersionMismatch);
        }
        Ok(config)
    }

    /// Encode into `buf`, returning the encoded length
    #[cfg(feature = "serde")]
    pub fn to_postcard(&self, buf: &mut [u8]) -> Result<usize, ConfigError> {
        postcard::to_slice(self, buf)
            .map(|used| used.len())
            .map_err(|_| ConfigError::Encoding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn port(name: &str, peripheral: PeripheralId) -> PortConfig {
        PortConfig {
            name: String::try_from(name).unwrap(),
            peripheral,
            mode: PortMode::Uart(UartConfig::default()),
            rx_buffer: true,
            tx_buffer: true,
        }
    }

    #[test]
    fn test_lookup() {
        let mut config = BoardConfig::new();
        config.add_port(port("console", PeripheralId::UsciA1)).unwrap();
        config.add_port(port("gps", PeripheralId::UsciA2)).unwrap();

        assert_eq!(config.port("gps").map(|p| p.peripheral), Some(PeripheralId::UsciA2));
        assert_eq!(
            config.port_for(PeripheralId::UsciA1).map(|p| p.name.as_str()),
            Some("console")
        );
        assert!(config.port("radio").is_none());
    }

    #[test]
    fn test_duplicates_rejected() {
        let mut config = BoardConfig::new();
        config.add_port(port("console", PeripheralId::UsciA1)).unwrap();
        assert_eq!(
            config.add_port(port("console", PeripheralId::UsciA2)),
            Err(ConfigError::Duplicate)
        );
        assert_eq!(
            config.add_port(port("debug", PeripheralId::UsciA1)),
            Err(ConfigError::Duplicate)
        );
    }

    #[test]
    fn test_capacity() {
        let mut config = BoardConfig::new();
        for id in PeripheralId::ALL {
            config.add_port(port(id.name(), id)).unwrap();
        }
        assert_eq!(config.ports.len(), MAX_PORTS);
        let extra = PortConfig {
            name: String::try_from("extra").unwrap(),
            ..port("x", PeripheralId::UsciA0)
        };
        // Peripheral already used, so the duplicate check fires first
        assert_eq!(config.add_port(extra), Err(ConfigError::Duplicate));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_postcard_round_trip() {
        let mut config = BoardConfig::new();
        config.add_port(port("console", PeripheralId::UsciA1)).unwrap();

        let mut buf = [0u8; 128];
        let len = config.to_postcard(&mut buf).unwrap();
        assert_eq!(BoardConfig::from_postcard(&buf[..len]), Ok(config));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_postcard_version_mismatch() {
        let config = BoardConfig {
            version: CONFIG_VERSION + 1,
            ..BoardConfig::new()
        };
        let mut buf = [0u8; 64];
        let len = config.to_postcard(&mut buf).unwrap();
        assert_eq!(
            BoardConfig::from_postcard(&buf[..len]),
            Err(ConfigError::VersionMismatch)
        );
    }
}
