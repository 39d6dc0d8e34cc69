//! Serial register capability set
//!
//! Each generation of serial peripheral lays out its registers a little
//! differently, but the buffered transport only ever needs the handful of
//! operations in [`SerialRegisters`]. A chip HAL implements the trait once
//! per register layout and the transport stays generic over it.
//!
//! All methods take `&self`: register blocks are memory-mapped and shared
//! between task context and the interrupt handler. Callers are responsible
//! for serialising read-modify-write sequences on the interrupt-enable
//! register (the task side holds interrupts disabled, the handler cannot
//! preempt itself).

use crate::clock::ClockSelect;

/// Decoded contents of the interrupt-vector register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InterruptCause {
    /// No pending interrupt (or a vector value the transport does not handle)
    None,
    /// A received byte is waiting in the receive-data register
    ReceiveReady,
    /// The transmit-data register can accept another byte
    TransmitReady,
}

/// How a layout fine-tunes its bit timing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Modulation {
    /// Integer divisor plus a second-stage fractional modulation pattern
    LowFrequency,
    /// 16x oversampling when the divisor allows it, with first- and
    /// second-stage modulation
    Oversampled,
}

/// Values for the baud-rate divisor and modulation registers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BaudDivisor {
    /// Integer clock prescaler
    pub br: u16,
    /// First-stage modulation (oversampling mode only)
    pub brf: u8,
    /// Second-stage modulation pattern
    pub brs: u8,
    /// 16x oversampling enabled
    pub oversampling: bool,
}

impl BaudDivisor {
    /// Plain prescaler with no modulation (SPI bit clocks)
    pub const fn prescaler(br: u16) -> Self {
        Self {
            br,
            brf: 0,
            brs: 0,
            oversampling: false,
        }
    }
}

/// Register-level operations of one serial peripheral layout
pub trait SerialRegisters {
    /// Modulation scheme this layout's baud generator implements
    const MODULATION: Modulation;

    /// Largest value the second-stage modulation field holds
    const BRS_MAX: u8;

    /// Put the peripheral in its held/reset state, selecting the bit clock
    /// and writing the caller's control bits.
    ///
    /// While held in reset the interrupt-enable and interrupt-flag bits read
    /// as cleared.
    fn hold_reset(&self, clock: ClockSelect, control: u8);

    /// Force the peripheral into reset with every other control bit cleared
    fn force_reset(&self);

    /// Release the peripheral from reset
    fn release_reset(&self);

    /// Program the baud-rate divisor and modulation registers
    fn write_divisor(&self, divisor: BaudDivisor);

    /// Read the interrupt vector, acknowledging the highest-priority flag
    fn interrupt_cause(&self) -> InterruptCause;

    /// Write the transmit-data register, starting a transmission
    fn write_tx(&self, byte: u8);

    /// Read the receive-data register, clearing the receive flag
    fn read_rx(&self) -> u8;

    /// Whether the transmit-ready flag is set
    fn tx_ready(&self) -> bool;

    /// Whether a transmission or reception is in progress
    fn is_busy(&self) -> bool;

    /// Whether the transmit interrupt is enabled
    fn tx_interrupt_enabled(&self) -> bool;

    /// Set or clear the transmit interrupt enable bit
    fn set_tx_interrupt(&self, enabled: bool);

    /// Set or clear the receive interrupt enable bit
    fn set_rx_interrupt(&self, enabled: bool);
}
