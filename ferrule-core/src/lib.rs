//! Board-agnostic serial transport for the Ferrule board support
//!
//! This crate turns a serial register block into a buffered byte stream
//! without depending on any particular chip:
//!
//! - Bounded byte channels shared between tasks and interrupt handlers
//! - Device lifecycle (open/close) and baud-rate divisor selection
//! - Transmit-interrupt gating and the interrupt service routine
//! - `embedded-io` adapters for buffered devices
//! - Board configuration (serial ports and clock tree)
//!
//! Register access goes through [`ferrule_hal::SerialRegisters`]; pin
//! routing and clock lookup go through [`ferrule_hal::PinBinder`] and
//! [`ferrule_hal::ClockSource`].

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
extern crate std;

#[macro_use]
mod fmt;

pub mod channel;
pub mod config;
pub mod registry;
pub mod serial;
mod sync;

#[cfg(test)]
mod testing;

pub use channel::{ByteChannel, ByteQueue, Closed, TryPopError, TryPushError};
pub use registry::DeviceRegistry;
pub use serial::{
    Channels, InterruptOutcome, SerialDevice, SerialError, SerialPort, SerialStats, Transport,
};
