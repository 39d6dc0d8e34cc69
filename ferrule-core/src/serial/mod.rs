//! Interrupt-driven buffered serial transport
//!
//! # Data flow
//!
//! ```text
//!  task ──put_byte──▶ output ByteChannel ──ISR (tx ready)──▶ TXBUF ──▶ wire
//!  task ◀─get_byte─── input ByteChannel ◀──ISR (rx ready)─── RXBUF ◀── wire
//! ```
//!
//! The [`Transport`] opens and closes devices; everything after open goes
//! through the shared [`SerialDevice`], whose interrupt handler is driven by
//! [`crate::DeviceRegistry::on_interrupt`].

pub mod baud;
mod device;
mod error;
mod io;
mod transport;

pub use device::{Channels, InterruptOutcome, SerialDevice, SerialStats};
pub use error::SerialError;
pub use io::SerialPort;
pub use transport::Transport;
