//! UART serial communication abstractions
//!
//! Blocking transmit/receive traits plus the character-format settings
//! that live in a serial peripheral's control register.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// UART transmitter
///
/// Blocking trait for sending data over a UART interface.
pub trait UartTx {
    /// Error type for transmit operations
    type Error;

    /// Write data to the UART
    ///
    /// Blocks until all data has been handed to the hardware or an error
    /// occurs.
    fn write_blocking(&mut self, data: &[u8]) -> Result<(), Self::Error>;

    /// Wait until the hardware has finished shifting out all data
    fn flush(&mut self) -> Result<(), Self::Error>;
}

/// UART receiver
///
/// Blocking trait for receiving data from a UART interface.
pub trait UartRx {
    /// Error type for receive operations
    type Error;

    /// Read data from the UART
    ///
    /// Blocks until at least one byte is available, returning how many
    /// bytes were stored in `buf`.
    fn read_blocking(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;

    /// Read a single byte from the UART
    fn read_byte(&mut self) -> Result<u8, Self::Error> {
        let mut buf = [0u8; 1];
        self.read_blocking(&mut buf)?;
        Ok(buf[0])
    }
}

/// Combined UART interface
///
/// For UARTs that provide both TX and RX on a single peripheral.
pub trait Uart: UartTx + UartRx {}

// Blanket implementation
impl<T: UartTx + UartRx> Uart for T {}

// Control register (high byte of CTLW0) character-format bits
const CTL0_PEN: u8 = 0x80;
const CTL0_PAR: u8 = 0x40;
const CTL0_MSB: u8 = 0x20;
const CTL0_7BIT: u8 = 0x10;
const CTL0_SPB: u8 = 0x08;

/// UART configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UartConfig {
    /// Baud rate in bits per second
    pub baudrate: u32,
    /// Number of data bits
    pub data_bits: DataBits,
    /// Parity mode
    pub parity: Parity,
    /// Number of stop bits
    pub stop_bits: StopBits,
    /// Shift the most significant bit first
    pub msb_first: bool,
}

impl Default for UartConfig {
    fn default() -> Self {
        Self {
            baudrate: 115200,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
            msb_first: false,
        }
    }
}

impl UartConfig {
    /// Default 8N1 framing at the given baud rate
    pub fn with_baudrate(baudrate: u32) -> Self {
        Self {
            baudrate,
            ..Self::default()
        }
    }

    /// Encode the character format as control-register bits
    pub const fn control_bits(&self) -> u8 {
        let mut bits = 0;
        match self.parity {
            Parity::None => {}
            Parity::Odd => bits |= CTL0_PEN,
            Parity::Even => bits |= CTL0_PEN | CTL0_PAR,
        }
        if self.msb_first {
            bits |= CTL0_MSB;
        }
        if matches!(self.data_bits, DataBits::Seven) {
            bits |= CTL0_7BIT;
        }
        if matches!(self.stop_bits, StopBits::Two) {
            bits |= CTL0_SPB;
        }
        bits
    }
}

/// Number of data bits per frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DataBits {
    Seven,
    Eight,
}

/// Parity mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Parity {
    None,
    Even,
    Odd,
}

/// Number of stop bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum StopBits {
    One,
    Two,
}
