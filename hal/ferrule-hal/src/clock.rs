//! Bit-clock sources
//!
//! The serial transport never derives clock frequencies itself. It asks a
//! [`ClockSource`] for the current frequency of one of the clocks that can
//! drive a baud-rate generator and does integer arithmetic on the answer.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Clocks that can drive a serial peripheral's bit clock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ClockSelect {
    /// Low-power, low-frequency auxiliary clock (typically a 32 kHz crystal)
    LowPower,
    /// Faster sub-system master clock
    System,
}

/// Supplies clock frequencies in Hz
pub trait ClockSource {
    /// Current frequency of the selected clock
    fn frequency_hz(&self, clock: ClockSelect) -> u32;
}

impl<C: ClockSource + ?Sized> ClockSource for &C {
    fn frequency_hz(&self, clock: ClockSelect) -> u32 {
        (**self).frequency_hz(clock)
    }
}

/// Clock tree with fixed, known frequencies
///
/// Useful for boards whose clock configuration is settled at startup and
/// never changes afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FixedClocks {
    /// Low-power clock frequency in Hz
    pub low_power_hz: u32,
    /// System clock frequency in Hz
    pub system_hz: u32,
}

impl FixedClocks {
    /// Create a fixed clock tree
    pub const fn new(low_power_hz: u32, system_hz: u32) -> Self {
        Self {
            low_power_hz,
            system_hz,
        }
    }
}

impl Default for FixedClocks {
    fn default() -> Self {
        // 32 KiHz crystal and the ~1 MHz power-up DCO setting
        Self::new(32_768, 1_048_576)
    }
}

impl ClockSource for FixedClocks {
    fn frequency_hz(&self, clock: ClockSelect) -> u32 {
        match clock {
            ClockSelect::LowPower => self.low_power_hz,
            ClockSelect::System => self.system_hz,
        }
    }
}
