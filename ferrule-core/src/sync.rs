//! Scoped interrupt masking
//!
//! The transport needs a few multi-step register sequences to run without
//! the serial interrupt handler observing them half-done. [`InterruptGuard`]
//! masks interrupts for as long as it lives and restores the previous
//! state on drop, including on early return.

#![allow(unsafe_code)]

use core::marker::PhantomData;

use critical_section::RestoreState;

/// Interrupts stay masked until this guard is dropped
///
/// Guards are crate-private and only ever bound to a local at the top of a
/// scope, so they are always released in the reverse order of acquisition.
pub(crate) struct InterruptGuard {
    restore: RestoreState,
    // Must be released on the context that acquired it
    _not_send: PhantomData<*mut ()>,
}

impl InterruptGuard {
    pub(crate) fn new() -> Self {
        // SAFETY: paired with exactly one `release` in `Drop`, and guards
        // are scoped locals that cannot outlive a nested guard.
        let restore = unsafe { critical_section::acquire() };
        Self {
            restore,
            _not_send: PhantomData,
        }
    }
}

impl Drop for InterruptGuard {
    fn drop(&mut self) {
        // SAFETY: `restore` came from the matching `acquire` in `new`.
        unsafe { critical_section::release(self.restore) }
    }
}
