//! Ferrule Hardware Abstraction Layer
//!
//! This crate defines the traits and shared types that sit between the
//! board-agnostic serial transport in `ferrule-core` and the
//! register-level implementations in chip-specific HALs.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Application (tasks, vector handlers)   │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  ferrule-core (transport, channels)     │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  ferrule-hal (this crate - traits)      │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │  USCI layout  │       │ eUSCI layout  │
//! │ (hal-msp430)  │       │ (hal-msp430)  │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`registers::SerialRegisters`] - Capability set of one serial register layout
//! - [`clock::ClockSource`] - Bit-clock frequency lookup
//! - [`pins::PinBinder`] - Attach/detach the pins routed to a peripheral
//! - [`uart::UartTx`], [`uart::UartRx`] - Blocking serial communication

#![no_std]
#![deny(unsafe_code)]

pub mod clock;
pub mod peripheral;
pub mod pins;
pub mod registers;
pub mod spi;
pub mod uart;

// Re-export key traits at crate root for convenience
pub use clock::{ClockSelect, ClockSource};
pub use peripheral::PeripheralId;
pub use pins::{PinBinder, PinError, PinMode};
pub use registers::{BaudDivisor, InterruptCause, Modulation, SerialRegisters};
pub use uart::{UartRx, UartTx};
