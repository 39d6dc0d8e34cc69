//! Peripheral pin routing
//!
//! Attaching a serial peripheral means switching the pins that carry its
//! signals from GPIO to the peripheral function. The transport treats this
//! as an opaque operation behind [`PinBinder`].

use crate::peripheral::PeripheralId;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Which pin set of a peripheral to route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PinMode {
    /// TXD and RXD
    Uart,
    /// SIMO, SOMI and CLK
    Spi,
}

/// Error from pin routing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinError {
    /// The board has no pins routed to this peripheral in this mode
    NotRouted,
    /// A required pin is already claimed by another peripheral
    Conflict,
}

impl core::fmt::Display for PinError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            PinError::NotRouted => f.write_str("peripheral has no pin route"),
            PinError::Conflict => f.write_str("pin already claimed"),
        }
    }
}

/// Attaches or detaches the pins of a peripheral
pub trait PinBinder {
    /// Route (`enable = true`) or release (`enable = false`) the pins that
    /// carry `peripheral`'s signals in the given mode.
    ///
    /// Releasing pins that are not attached must succeed.
    fn configure(
        &mut self,
        peripheral: PeripheralId,
        mode: PinMode,
        enable: bool,
    ) -> Result<(), PinError>;
}

impl<B: PinBinder + ?Sized> PinBinder for &mut B {
    fn configure(
        &mut self,
        peripheral: PeripheralId,
        mode: PinMode,
        enable: bool,
    ) -> Result<(), PinError> {
        (**self).configure(peripheral, mode, enable)
    }
}
