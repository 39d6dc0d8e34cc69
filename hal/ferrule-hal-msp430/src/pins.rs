//! Serial pin routing through port function-select registers
//!
//! Each serial instance has fixed pins on a given part. Attaching a
//! peripheral sets the corresponding `PxSEL` bits so the pins carry the
//! peripheral signals instead of GPIO; detaching clears them again.

use heapless::Vec;

use ferrule_hal::{PeripheralId, PinBinder, PinError, PinMode};

/// A set of pins on one port
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PortPins {
    /// Port number (1-based, as in the datasheet)
    pub port: u8,
    /// Bit mask of pins on the port
    pub mask: u8,
}

/// Pins carrying one peripheral's signals in one mode
pub type PinRoute = &'static [PortPins];

/// Board/part-specific pin route lookup
pub type RouteTable = fn(PeripheralId, PinMode) -> Option<PinRoute>;

/// Pin routes of the MSP430F5438A
pub fn f5438a_routes(peripheral: PeripheralId, mode: PinMode) -> Option<PinRoute> {
    use PeripheralId::*;
    use PinMode::*;

    match (peripheral, mode) {
        // TXD/RXD
        (UsciA0, Uart) => Some(&[PortPins { port: 3, mask: 0x30 }]),
        (UsciA1, Uart) => Some(&[PortPins { port: 5, mask: 0xC0 }]),
        (UsciA2, Uart) => Some(&[PortPins { port: 9, mask: 0x30 }]),
        (UsciA3, Uart) => Some(&[PortPins { port: 10, mask: 0x30 }]),
        // SIMO/SOMI plus CLK
        (UsciA0, Spi) => Some(&[PortPins { port: 3, mask: 0x31 }]),
        (UsciA1, Spi) => Some(&[
            PortPins { port: 5, mask: 0xC0 },
            PortPins { port: 3, mask: 0x40 },
        ]),
        (UsciA2, Spi) => Some(&[PortPins { port: 9, mask: 0x31 }]),
        (UsciA3, Spi) => Some(&[PortPins { port: 10, mask: 0x31 }]),
        (UsciB0, Spi) => Some(&[PortPins { port: 3, mask: 0x0E }]),
        (UsciB1, Spi) => Some(&[
            PortPins { port: 3, mask: 0x80 },
            PortPins { port: 5, mask: 0x30 },
        ]),
        (UsciB2, Spi) => Some(&[PortPins { port: 9, mask: 0x0E }]),
        (UsciB3, Spi) => Some(&[PortPins { port: 10, mask: 0x0E }]),
        (UsciB0 | UsciB1 | UsciB2 | UsciB3, Uart) => None,
    }
}

/// Writes port function-select bits
pub trait PortFunction {
    /// Set (`peripheral = true`) or clear the function-select bits in `mask`
    fn select(&mut self, port: u8, mask: u8, peripheral: bool);
}

/// Function-select registers of the 5xx digital I/O block
///
/// Ports are paired: odd ports use the low byte and even ports the high
/// byte of each 0x20-byte pair block starting at 0x0200.
#[derive(Debug)]
pub struct PortSelectRegisters {
    _private: (),
}

impl PortSelectRegisters {
    const PORT_BASE: usize = 0x0200;
    const SEL_OFFSET: usize = 0x0A;

    /// Take the port function-select registers
    ///
    /// # Safety
    ///
    /// Must only be used on a part with the 5xx port layout, and no other
    /// code may modify `PxSEL` concurrently.
    pub const unsafe fn new() -> Self {
        Self { _private: () }
    }

    fn sel_address(port: u8) -> usize {
        let pair = usize::from(port.saturating_sub(1) / 2);
        let high = usize::from(port.saturating_sub(1) % 2);
        Self::PORT_BASE + pair * 0x20 + Self::SEL_OFFSET + high
    }
}

impl PortFunction for PortSelectRegisters {
    fn select(&mut self, port: u8, mask: u8, peripheral: bool) {
        // SAFETY: `new` requires the 5xx port layout, so the address is a
        // mapped PxSEL register.
        let block = unsafe { crate::mmio::RegisterBlock::new(Self::sel_address(port)) };
        block.modify8(0, |v| if peripheral { v | mask } else { v & !mask });
    }
}

/// Attachment currently holding pins
#[derive(Debug, Clone, Copy)]
struct Attachment {
    peripheral: PeripheralId,
    route: PinRoute,
}

/// [`PinBinder`] backed by a static route table
///
/// Tracks which peripheral owns which pins, so two peripherals whose routes
/// share a pin can never be attached at the same time.
pub struct RoutedPinBinder<P> {
    ports: P,
    routes: RouteTable,
    attached: Vec<Attachment, { PeripheralId::COUNT }>,
}

impl<P: PortFunction> RoutedPinBinder<P> {
    /// Create a binder over the given port registers and route table
    pub fn new(ports: P, routes: RouteTable) -> Self {
        Self {
            ports,
            routes,
            attached: Vec::new(),
        }
    }

    /// Check if a peripheral currently has its pins attached
    pub fn is_attached(&self, peripheral: PeripheralId) -> bool {
        self.attached.iter().any(|a| a.peripheral == peripheral)
    }

    fn overlaps(a: PinRoute, b: PinRoute) -> bool {
        a.iter()
            .any(|x| b.iter().any(|y| x.port == y.port && x.mask & y.mask != 0))
    }

    fn attach(&mut self, peripheral: PeripheralId, route: PinRoute) -> Result<(), PinError> {
        let conflict = self
            .attached
            .iter()
            .any(|a| a.peripheral != peripheral && Self::overlaps(a.route, route));
        if conflict {
            return Err(PinError::Conflict);
        }

        // Re-attaching replaces the previous route of the same peripheral
        self.detach(peripheral);
        for p in route {
            self.ports.select(p.port, p.mask, true);
        }
        self.attached
            .push(Attachment { peripheral, route })
            .map_err(|_| PinError::Conflict)
    }

    fn detach(&mut self, peripheral: PeripheralId) {
        if let Some(pos) = self
            .attached
            .iter()
            .position(|a| a.peripheral == peripheral)
        {
            let attachment = self.attached.swap_remove(pos);
            for p in attachment.route {
                self.ports.select(p.port, p.mask, false);
            }
        }
    }
}

impl<P: PortFunction> PinBinder for RoutedPinBinder<P> {
    fn configure(
        &mut self,
        peripheral: PeripheralId,
        mode: PinMode,
        enable: bool,
    ) -> Result<(), PinError> {
        if !enable {
            self.detach(peripheral);
            return Ok(());
        }
        let route = (self.routes)(peripheral, mode).ok_or(PinError::NotRouted)?;
        self.attach(peripheral, route)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Port function registers held in plain memory
    #[derive(Default)]
    struct FakePorts {
        sel: [u8; 12],
    }

    impl PortFunction for FakePorts {
        fn select(&mut self, port: u8, mask: u8, peripheral: bool) {
            let sel = &mut self.sel[usize::from(port)];
            if peripheral {
                *sel |= mask;
            } else {
                *sel &= !mask;
            }
        }
    }

    #[test]
    fn test_attach_and_detach_uart() {
        let mut binder = RoutedPinBinder::new(FakePorts::default(), f5438a_routes);
        binder
            .configure(PeripheralId::UsciA1, PinMode::Uart, true)
            .unwrap();
        assert!(binder.is_attached(PeripheralId::UsciA1));
        assert_eq!(binder.ports.sel[5], 0xC0);

        binder
            .configure(PeripheralId::UsciA1, PinMode::Uart, false)
            .unwrap();
        assert!(!binder.is_attached(PeripheralId::UsciA1));
        assert_eq!(binder.ports.sel[5], 0);
    }

    #[test]
    fn test_detach_unattached_is_ok() {
        let mut binder = RoutedPinBinder::new(FakePorts::default(), f5438a_routes);
        assert!(binder
            .configure(PeripheralId::UsciA2, PinMode::Uart, false)
            .is_ok());
    }

    #[test]
    fn test_b_instances_have_no_uart_route() {
        let mut binder = RoutedPinBinder::new(FakePorts::default(), f5438a_routes);
        assert_eq!(
            binder.configure(PeripheralId::UsciB0, PinMode::Uart, true),
            Err(PinError::NotRouted)
        );
    }

    /// Board where A0's UART pins double as B0's SPI data pins
    fn shared_routes(peripheral: PeripheralId, mode: PinMode) -> Option<PinRoute> {
        match (peripheral, mode) {
            (PeripheralId::UsciA0, PinMode::Uart) => Some(&[PortPins { port: 3, mask: 0x30 }]),
            (PeripheralId::UsciB0, PinMode::Spi) => Some(&[PortPins { port: 3, mask: 0x38 }]),
            _ => None,
        }
    }

    #[test]
    fn test_shared_pins_conflict() {
        let mut binder = RoutedPinBinder::new(FakePorts::default(), shared_routes);
        binder
            .configure(PeripheralId::UsciA0, PinMode::Uart, true)
            .unwrap();
        assert_eq!(
            binder.configure(PeripheralId::UsciB0, PinMode::Spi, true),
            Err(PinError::Conflict)
        );
        assert_eq!(binder.ports.sel[3], 0x30);

        // Once A0 lets go, B0 can have the pins
        binder
            .configure(PeripheralId::UsciA0, PinMode::Uart, false)
            .unwrap();
        binder
            .configure(PeripheralId::UsciB0, PinMode::Spi, true)
            .unwrap();
        assert_eq!(binder.ports.sel[3], 0x38);
    }

    #[test]
    fn test_f5438a_spi_routes_do_not_overlap() {
        let mut binder = RoutedPinBinder::new(FakePorts::default(), f5438a_routes);
        binder
            .configure(PeripheralId::UsciA1, PinMode::Spi, true)
            .unwrap();
        binder
            .configure(PeripheralId::UsciB1, PinMode::Spi, true)
            .unwrap();
        assert_eq!(binder.ports.sel[5], 0xF0);
        assert_eq!(binder.ports.sel[3], 0xC0);
    }

    #[test]
    fn test_reattach_switches_mode() {
        let mut binder = RoutedPinBinder::new(FakePorts::default(), f5438a_routes);
        binder
            .configure(PeripheralId::UsciA0, PinMode::Spi, true)
            .unwrap();
        assert_eq!(binder.ports.sel[3], 0x31);
        binder
            .configure(PeripheralId::UsciA0, PinMode::Uart, true)
            .unwrap();
        assert_eq!(binder.ports.sel[3], 0x30);
    }

    #[test]
    fn test_sel_register_addresses() {
        assert_eq!(PortSelectRegisters::sel_address(1), 0x020A);
        assert_eq!(PortSelectRegisters::sel_address(2), 0x020B);
        assert_eq!(PortSelectRegisters::sel_address(3), 0x022A);
        assert_eq!(PortSelectRegisters::sel_address(10), 0x028B);
    }
}
