//! USCI register layout (5xx/6xx families)
//!
//! Register offsets from the block base:
//!
//! | offset | register          |
//! |--------|-------------------|
//! | 0x00   | CTLW0 (CTL1/CTL0) |
//! | 0x06   | BRW               |
//! | 0x08   | MCTL              |
//! | 0x0A   | STAT              |
//! | 0x0C   | RXBUF             |
//! | 0x0E   | TXBUF             |
//! | 0x1C   | IE                |
//! | 0x1D   | IFG               |
//! | 0x1E   | IV                |

use ferrule_hal::{
    BaudDivisor, ClockSelect, InterruptCause, Modulation, PeripheralId, SerialRegisters,
};

use crate::mmio::RegisterBlock;

const CTLW0: usize = 0x00;
const BRW: usize = 0x06;
const MCTL: usize = 0x08;
const STAT: usize = 0x0A;
const RXBUF: usize = 0x0C;
const TXBUF: usize = 0x0E;
const IE: usize = 0x1C;
const IFG: usize = 0x1D;
const IV: usize = 0x1E;

/// CTL1 bits (low byte of CTLW0)
pub const UCSWRST: u16 = 0x0001;
pub const UCSSEL_ACLK: u16 = 0x0040;
pub const UCSSEL_SMCLK: u16 = 0x0080;

/// MCTL fields
pub const UCOS16: u8 = 0x01;
const UCBRS_SHIFT: u8 = 1;
const UCBRF_SHIFT: u8 = 4;

/// IE/IFG bits
pub const UCRXIE: u8 = 0x01;
pub const UCTXIE: u8 = 0x02;
pub const UCRXIFG: u8 = 0x01;
pub const UCTXIFG: u8 = 0x02;

/// STAT bits
pub const UCBUSY: u8 = 0x01;

/// IV values
pub const USCI_NONE: u16 = 0x00;
pub const USCI_UCRXIFG: u16 = 0x02;
pub const USCI_UCTXIFG: u16 = 0x04;

/// Register block base address for an MSP430F5438A-class part
pub const fn base_address(id: PeripheralId) -> usize {
    match id {
        PeripheralId::UsciA0 => 0x05C0,
        PeripheralId::UsciB0 => 0x05E0,
        PeripheralId::UsciA1 => 0x0600,
        PeripheralId::UsciB1 => 0x0620,
        PeripheralId::UsciA2 => 0x0640,
        PeripheralId::UsciB2 => 0x0660,
        PeripheralId::UsciA3 => 0x0680,
        PeripheralId::UsciB3 => 0x06A0,
    }
}

/// One USCI register block
#[derive(Debug)]
pub struct Usci {
    regs: RegisterBlock,
}

impl Usci {
    /// Wrap the register block at `base`
    ///
    /// # Safety
    ///
    /// `base` must be the address of a USCI register block, and no other
    /// handle to the same block may be created while this one exists.
    pub const unsafe fn new(base: usize) -> Self {
        Self {
            regs: RegisterBlock::new(base),
        }
    }

    /// Wrap the register block of a peripheral on an F5438A-class part
    ///
    /// # Safety
    ///
    /// Same contract as [`Usci::new`]: at most one handle per peripheral.
    pub const unsafe fn for_peripheral(id: PeripheralId) -> Self {
        Self::new(base_address(id))
    }

    /// Address of the register block
    pub fn base(&self) -> usize {
        self.regs.base()
    }
}

fn clock_bits(clock: ClockSelect) -> u16 {
    match clock {
        ClockSelect::LowPower => UCSSEL_ACLK,
        ClockSelect::System => UCSSEL_SMCLK,
    }
}

impl SerialRegisters for Usci {
    const MODULATION: Modulation = Modulation::LowFrequency;
    const BRS_MAX: u8 = 0x07;

    fn hold_reset(&self, clock: ClockSelect, control: u8) {
        self.regs
            .write16(CTLW0, (u16::from(control) << 8) | clock_bits(clock) | UCSWRST);
    }

    fn force_reset(&self) {
        self.regs.write16(CTLW0, UCSWRST);
    }

    fn release_reset(&self) {
        self.regs.modify16(CTLW0, |v| v & !UCSWRST);
    }

    fn write_divisor(&self, divisor: BaudDivisor) {
        self.regs.write16(BRW, divisor.br);
        let mut mctl = ((divisor.brs & Self::BRS_MAX) << UCBRS_SHIFT)
            | ((divisor.brf & 0x0F) << UCBRF_SHIFT);
        if divisor.oversampling {
            mctl |= UCOS16;
        }
        self.regs.write8(MCTL, mctl);
    }

    fn interrupt_cause(&self) -> InterruptCause {
        match self.regs.read16(IV) {
            USCI_UCRXIFG => InterruptCause::ReceiveReady,
            USCI_UCTXIFG => InterruptCause::TransmitReady,
            _ => InterruptCause::None,
        }
    }

    fn write_tx(&self, byte: u8) {
        self.regs.write8(TXBUF, byte);
    }

    fn read_rx(&self) -> u8 {
        self.regs.read8(RXBUF)
    }

    fn tx_ready(&self) -> bool {
        self.regs.read8(IFG) & UCTXIFG != 0
    }

    fn is_busy(&self) -> bool {
        self.regs.read8(STAT) & UCBUSY != 0
    }

    fn tx_interrupt_enabled(&self) -> bool {
        self.regs.read8(IE) & UCTXIE != 0
    }

    fn set_tx_interrupt(&self, enabled: bool) {
        self.regs
            .modify8(IE, |v| if enabled { v | UCTXIE } else { v & !UCTXIE });
    }

    fn set_rx_interrupt(&self, enabled: bool) {
        self.regs
            .modify8(IE, |v| if enabled { v | UCRXIE } else { v & !UCRXIE });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Plain memory standing in for a register block
    struct FakeBlock {
        words: [u16; 16],
    }

    impl FakeBlock {
        fn new() -> Self {
            Self { words: [0; 16] }
        }

        fn usci(&mut self) -> Usci {
            unsafe { Usci::new(self.words.as_mut_ptr() as usize) }
        }

        fn byte(&self, offset: usize) -> u8 {
            let word = self.words[offset / 2];
            if offset % 2 == 0 {
                word.to_le_bytes()[0]
            } else {
                word.to_le_bytes()[1]
            }
        }
    }

    #[test]
    fn test_hold_reset_encodes_clock_and_control() {
        let mut block = FakeBlock::new();
        let usci = block.usci();
        usci.hold_reset(ClockSelect::LowPower, 0x80);
        assert_eq!(block.words[0], 0x8000 | UCSSEL_ACLK | UCSWRST);

        let usci = block.usci();
        usci.release_reset();
        assert_eq!(block.words[0], 0x8000 | UCSSEL_ACLK);

        let usci = block.usci();
        usci.force_reset();
        assert_eq!(block.words[0], UCSWRST);
    }

    #[test]
    fn test_divisor_packs_modulation() {
        let mut block = FakeBlock::new();
        let usci = block.usci();
        usci.write_divisor(BaudDivisor {
            br: 104,
            brf: 0,
            brs: 3,
            oversampling: false,
        });
        assert_eq!(block.words[BRW / 2], 104);
        assert_eq!(block.byte(MCTL), 3 << UCBRS_SHIFT);
    }

    #[test]
    fn test_brs_is_clamped_to_field() {
        let mut block = FakeBlock::new();
        let usci = block.usci();
        usci.write_divisor(BaudDivisor {
            br: 3,
            brf: 0,
            brs: 0xFF,
            oversampling: false,
        });
        assert_eq!(block.byte(MCTL), 0x07 << UCBRS_SHIFT);
    }

    #[test]
    fn test_interrupt_enable_bits() {
        let mut block = FakeBlock::new();
        let usci = block.usci();
        usci.set_rx_interrupt(true);
        usci.set_tx_interrupt(true);
        assert!(usci.tx_interrupt_enabled());
        assert_eq!(block.byte(IE), UCRXIE | UCTXIE);

        let usci = block.usci();
        usci.set_tx_interrupt(false);
        assert!(!usci.tx_interrupt_enabled());
        assert_eq!(block.byte(IE), UCRXIE);
    }

    #[test]
    fn test_vector_decoding() {
        let mut block = FakeBlock::new();
        block.words[IV / 2] = USCI_UCTXIFG;
        assert_eq!(block.usci().interrupt_cause(), InterruptCause::TransmitReady);
        block.words[IV / 2] = USCI_UCRXIFG;
        assert_eq!(block.usci().interrupt_cause(), InterruptCause::ReceiveReady);
        block.words[IV / 2] = USCI_NONE;
        assert_eq!(block.usci().interrupt_cause(), InterruptCause::None);
    }

    #[test]
    fn test_base_addresses_are_distinct() {
        for a in PeripheralId::ALL {
            for b in PeripheralId::ALL {
                if a != b {
                    assert_ne!(base_address(a), base_address(b));
                }
            }
        }
    }
}
