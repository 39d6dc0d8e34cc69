//! SPI role configuration
//!
//! A serial peripheral opened in its SPI-like role shares the buffered
//! transport with the UART role; only the clocking and the control bits
//! differ. Chip-select sequencing is left to the application.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

// Control register (high byte of CTLW0) synchronous-mode bits
const CTL0_CKPH: u8 = 0x80;
const CTL0_CKPL: u8 = 0x40;
const CTL0_MSB: u8 = 0x20;
const CTL0_MST: u8 = 0x08;
const CTL0_SYNC: u8 = 0x01;

/// SPI configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SpiConfig {
    /// System clock divider for the bit clock (must be non-zero)
    pub prescaler: u16,
    /// Clock polarity
    pub polarity: Polarity,
    /// Clock phase
    pub phase: Phase,
    /// Shift the most significant bit first
    pub msb_first: bool,
}

impl Default for SpiConfig {
    fn default() -> Self {
        Self {
            prescaler: 2,
            polarity: Polarity::IdleLow,
            phase: Phase::CaptureOnFirstTransition,
            msb_first: true,
        }
    }
}

impl SpiConfig {
    /// Encode the configuration as control-register bits for a 3-wire master
    pub const fn control_bits(&self) -> u8 {
        let mut bits = CTL0_MST | CTL0_SYNC;
        // The hardware phase bit means "capture on the first edge"
        if matches!(self.phase, Phase::CaptureOnFirstTransition) {
            bits |= CTL0_CKPH;
        }
        if matches!(self.polarity, Polarity::IdleHigh) {
            bits |= CTL0_CKPL;
        }
        if self.msb_first {
            bits |= CTL0_MSB;
        }
        bits
    }
}

/// SPI clock polarity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Polarity {
    /// Clock idles low (CPOL=0)
    IdleLow,
    /// Clock idles high (CPOL=1)
    IdleHigh,
}

/// SPI clock phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Phase {
    /// Data captured on first clock transition (CPHA=0)
    CaptureOnFirstTransition,
    /// Data captured on second clock transition (CPHA=1)
    CaptureOnSecondTransition,
}

/// SPI mode (combined polarity and phase)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    /// Mode 0: CPOL=0, CPHA=0
    Mode0,
    /// Mode 1: CPOL=0, CPHA=1
    Mode1,
    /// Mode 2: CPOL=1, CPHA=0
    Mode2,
    /// Mode 3: CPOL=1, CPHA=1
    Mode3,
}

impl From<Mode> for (Polarity, Phase) {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Mode0 => (Polarity::IdleLow, Phase::CaptureOnFirstTransition),
            Mode::Mode1 => (Polarity::IdleLow, Phase::CaptureOnSecondTransition),
            Mode::Mode2 => (Polarity::IdleHigh, Phase::CaptureOnFirstTransition),
            Mode::Mode3 => (Polarity::IdleHigh, Phase::CaptureOnSecondTransition),
        }
    }
}

impl SpiConfig {
    /// Configuration for a standard SPI mode
    pub fn from_mode(mode: Mode, prescaler: u16) -> Self {
        let (polarity, phase) = mode.into();
        Self {
            prescaler,
            polarity,
            phase,
            msb_first: true,
        }
    }
}
