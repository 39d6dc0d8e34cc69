//! Volatile access to a memory-mapped register block

use core::ptr::{read_volatile, write_volatile};

/// Base address of a peripheral register block
#[derive(Debug)]
pub(crate) struct RegisterBlock {
    base: usize,
}

impl RegisterBlock {
    /// # Safety
    ///
    /// `base` must be the address of a live register block that stays mapped
    /// for the lifetime of the returned value.
    pub(crate) const unsafe fn new(base: usize) -> Self {
        Self { base }
    }

    pub(crate) fn base(&self) -> usize {
        self.base
    }

    pub(crate) fn read8(&self, offset: usize) -> u8 {
        // SAFETY: `new` requires `base` to address a mapped register block
        // and every caller passes an offset inside that block.
        unsafe { read_volatile((self.base + offset) as *const u8) }
    }

    pub(crate) fn write8(&self, offset: usize, value: u8) {
        // SAFETY: see `read8`.
        unsafe { write_volatile((self.base + offset) as *mut u8, value) }
    }

    pub(crate) fn read16(&self, offset: usize) -> u16 {
        // SAFETY: see `read8`; word registers sit at even offsets.
        unsafe { read_volatile((self.base + offset) as *const u16) }
    }

    pub(crate) fn write16(&self, offset: usize, value: u16) {
        // SAFETY: see `read16`.
        unsafe { write_volatile((self.base + offset) as *mut u16, value) }
    }

    pub(crate) fn modify8(&self, offset: usize, f: impl FnOnce(u8) -> u8) {
        let value = self.read8(offset);
        self.write8(offset, f(value));
    }

    pub(crate) fn modify16(&self, offset: usize, f: impl FnOnce(u16) -> u16) {
        let value = self.read16(offset);
        self.write16(offset, f(value));
    }
}
