//! Serial peripheral identities
//!
//! Every serial-capable unit on the chip is named by a closed enum so
//! lookups are a table index rather than a chain of address compares.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Serial peripheral instance identifier
///
/// `A` instances are UART/SPI capable, `B` instances are SPI/I2C capable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PeripheralId {
    UsciA0,
    UsciA1,
    UsciA2,
    UsciA3,
    UsciB0,
    UsciB1,
    UsciB2,
    UsciB3,
}

impl PeripheralId {
    /// Number of peripheral identities
    pub const COUNT: usize = 8;

    /// All identities in table order
    pub const ALL: [PeripheralId; Self::COUNT] = [
        PeripheralId::UsciA0,
        PeripheralId::UsciA1,
        PeripheralId::UsciA2,
        PeripheralId::UsciA3,
        PeripheralId::UsciB0,
        PeripheralId::UsciB1,
        PeripheralId::UsciB2,
        PeripheralId::UsciB3,
    ];

    /// Table index of this identity
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Whether this instance can act as a UART
    pub const fn supports_uart(self) -> bool {
        matches!(
            self,
            PeripheralId::UsciA0 | PeripheralId::UsciA1 | PeripheralId::UsciA2 | PeripheralId::UsciA3
        )
    }

    /// Lower-case name used in configuration files ("usci_a0", ...)
    pub const fn name(self) -> &'static str {
        match self {
            PeripheralId::UsciA0 => "usci_a0",
            PeripheralId::UsciA1 => "usci_a1",
            PeripheralId::UsciA2 => "usci_a2",
            PeripheralId::UsciA3 => "usci_a3",
            PeripheralId::UsciB0 => "usci_b0",
            PeripheralId::UsciB1 => "usci_b1",
            PeripheralId::UsciB2 => "usci_b2",
            PeripheralId::UsciB3 => "usci_b3",
        }
    }

    /// Look up an identity by its configuration name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|id| id.name() == name)
    }
}
