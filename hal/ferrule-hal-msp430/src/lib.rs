//! MSP430-specific HAL for Ferrule
//!
//! This crate provides the register-level half of the serial transport for
//! MSP430 parts:
//!
//! - [`usci::Usci`] - 5xx/6xx USCI_Ax/USCI_Bx register layout
//! - [`eusci::Eusci`] - FR5xx/FR6xx eUSCI_Ax/eUSCI_Bx register layout
//! - [`pins::RoutedPinBinder`] - Port function-select routing for serial pins
//!
//! Both layouts implement [`ferrule_hal::SerialRegisters`], so the buffered
//! transport in `ferrule-core` drives either generation unchanged.

#![no_std]

mod mmio;
pub mod eusci;
pub mod pins;
pub mod usci;

// Re-export shared types from ferrule-hal
pub use ferrule_hal::{PeripheralId, SerialRegisters};
