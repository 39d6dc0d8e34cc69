//! eUSCI register layout (FR5xx/FR6xx families)
//!
//! Same control word as USCI, but the modulation register is a full word
//! carrying oversampling, first-stage and second-stage fields, and the
//! interrupt registers move down to make room for extra vectors.
//!
//! | offset | register |
//! |--------|----------|
//! | 0x00   | CTLW0    |
//! | 0x06   | BRW      |
//! | 0x08   | MCTLW    |
//! | 0x0A   | STATW    |
//! | 0x0C   | RXBUF    |
//! | 0x0E   | TXBUF    |
//! | 0x1A   | IE       |
//! | 0x1C   | IFG      |
//! | 0x1E   | IV       |

use ferrule_hal::{
    BaudDivisor, ClockSelect, InterruptCause, Modulation, PeripheralId, SerialRegisters,
};

use crate::mmio::RegisterBlock;

const CTLW0: usize = 0x00;
const BRW: usize = 0x06;
const MCTLW: usize = 0x08;
const STATW: usize = 0x0A;
const RXBUF: usize = 0x0C;
const TXBUF: usize = 0x0E;
const IE: usize = 0x1A;
const IFG: usize = 0x1C;
const IV: usize = 0x1E;

pub const UCSWRST: u16 = 0x0001;
pub const UCSSEL_ACLK: u16 = 0x0040;
pub const UCSSEL_SMCLK: u16 = 0x0080;

pub const UCOS16: u16 = 0x0001;
const UCBRF_SHIFT: u16 = 4;
const UCBRS_SHIFT: u16 = 8;

pub const UCRXIE: u16 = 0x0001;
pub const UCTXIE: u16 = 0x0002;
pub const UCRXIFG: u16 = 0x0001;
pub const UCTXIFG: u16 = 0x0002;

pub const UCBUSY: u16 = 0x0001;

pub const USCI_NONE: u16 = 0x00;
pub const USCI_UART_UCRXIFG: u16 = 0x02;
pub const USCI_UART_UCTXIFG: u16 = 0x04;
pub const USCI_UART_UCSTTIFG: u16 = 0x06;
pub const USCI_UART_UCTXCPTIFG: u16 = 0x08;

/// Register block base address on an MSP430FR5969-class part
///
/// Returns `None` for instances the part does not have.
pub const fn base_address(id: PeripheralId) -> Option<usize> {
    match id {
        PeripheralId::UsciA0 => Some(0x05C0),
        PeripheralId::UsciA1 => Some(0x05E0),
        PeripheralId::UsciB0 => Some(0x0640),
        _ => None,
    }
}

/// One eUSCI register block
#[derive(Debug)]
pub struct Eusci {
    regs: RegisterBlock,
}

impl Eusci {
    /// Wrap the register block at `base`
    ///
    /// # Safety
    ///
    /// `base` must be the address of an eUSCI register block, and no other
    /// handle to the same block may be created while this one exists.
    pub const unsafe fn new(base: usize) -> Self {
        Self {
            regs: RegisterBlock::new(base),
        }
    }

    /// Wrap the register block of a peripheral on an FR5969-class part
    ///
    /// # Safety
    ///
    /// Same contract as [`Eusci::new`].
    pub const unsafe fn for_peripheral(id: PeripheralId) -> Option<Self> {
        match base_address(id) {
            Some(base) => Some(Self::new(base)),
            None => None,
        }
    }
}

impl SerialRegisters for Eusci {
    const MODULATION: Modulation = Modulation::Oversampled;
    const BRS_MAX: u8 = 0xFF;

    fn hold_reset(&self, clock: ClockSelect, control: u8) {
        let ssel = match clock {
            ClockSelect::LowPower => UCSSEL_ACLK,
            ClockSelect::System => UCSSEL_SMCLK,
        };
        self.regs
            .write16(CTLW0, (u16::from(control) << 8) | ssel | UCSWRST);
    }

    fn force_reset(&self) {
        self.regs.write16(CTLW0, UCSWRST);
    }

    fn release_reset(&self) {
        self.regs.modify16(CTLW0, |v| v & !UCSWRST);
    }

    fn write_divisor(&self, divisor: BaudDivisor) {
        self.regs.write16(BRW, divisor.br);
        let mut mctlw = (u16::from(divisor.brs) << UCBRS_SHIFT)
            | (u16::from(divisor.brf & 0x0F) << UCBRF_SHIFT);
        if divisor.oversampling {
            mctlw |= UCOS16;
        }
        self.regs.write16(MCTLW, mctlw);
    }

    fn interrupt_cause(&self) -> InterruptCause {
        match self.regs.read16(IV) {
            USCI_UART_UCRXIFG => InterruptCause::ReceiveReady,
            USCI_UART_UCTXIFG => InterruptCause::TransmitReady,
            // Start-bit and transmit-complete vectors are never enabled
            _ => InterruptCause::None,
        }
    }

    fn write_tx(&self, byte: u8) {
        self.regs.write16(TXBUF, u16::from(byte));
    }

    fn read_rx(&self) -> u8 {
        (self.regs.read16(RXBUF) & 0x00FF) as u8
    }

    fn tx_ready(&self) -> bool {
        self.regs.read16(IFG) & UCTXIFG != 0
    }

    fn is_busy(&self) -> bool {
        self.regs.read16(STATW) & UCBUSY != 0
    }

    fn tx_interrupt_enabled(&self) -> bool {
        self.regs.read16(IE) & UCTXIE != 0
    }

    fn set_tx_interrupt(&self, enabled: bool) {
        self.regs
            .modify16(IE, |v| if enabled { v | UCTXIE } else { v & !UCTXIE });
    }

    fn set_rx_interrupt(&self, enabled: bool) {
        self.regs
            .modify16(IE, |v| if enabled { v | UCRXIE } else { v & !UCRXIE });
    }
}
