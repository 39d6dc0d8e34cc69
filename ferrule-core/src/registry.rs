//! Peripheral-to-device lookup
//!
//! The board registers one [`SerialDevice`] per serial peripheral it wires
//! up. Lookups are an array index on [`PeripheralId`], so the vector
//! handler can dispatch without searching.
//!
//! Vector handlers need the registry as a `'static` shared reference.
//! Boards build it once at startup with [`DeviceRegistry::with_device`]
//! and move it into a `static_cell::StaticCell`, keeping the returned
//! `&'static` for both the [`Transport`](crate::Transport) and the
//! handlers.

use ferrule_hal::{InterruptCause, PeripheralId, SerialRegisters};

use crate::serial::{InterruptOutcome, SerialDevice, SerialError};

/// Fixed table of the board's serial devices
pub struct DeviceRegistry<'a, R> {
    devices: [Option<SerialDevice<'a, R>>; PeripheralId::COUNT],
}

impl<'a, R: SerialRegisters> DeviceRegistry<'a, R> {
    const VACANT: Option<SerialDevice<'a, R>> = None;

    /// Create an empty registry
    pub const fn new() -> Self {
        Self {
            devices: [Self::VACANT; PeripheralId::COUNT],
        }
    }

    /// Register a device, returning the registry
    pub fn with_device(mut self, id: PeripheralId, registers: R) -> Self {
        self.insert(id, registers);
        self
    }

    /// Register a device, returning any device it replaces
    pub fn insert(&mut self, id: PeripheralId, registers: R) -> Option<SerialDevice<'a, R>> {
        self.devices[id.index()].replace(SerialDevice::new(id, registers))
    }

    /// Look up the device for a peripheral
    pub fn get(&self, id: PeripheralId) -> Result<&SerialDevice<'a, R>, SerialError> {
        self.devices[id.index()]
            .as_ref()
            .ok_or(SerialError::UnknownPeripheral)
    }

    /// Whether a device is registered for a peripheral
    pub fn contains(&self, id: PeripheralId) -> bool {
        self.devices[id.index()].is_some()
    }

    /// Registered devices in peripheral order
    pub fn iter(&self) -> impl Iterator<Item = &SerialDevice<'a, R>> {
        self.devices.iter().flatten()
    }

    /// Service one interrupt of `id`
    ///
    /// Interrupts of unregistered peripherals are ignored.
    pub fn on_interrupt(&self, id: PeripheralId) -> InterruptOutcome {
        match self.get(id) {
            Ok(device) => device.on_interrupt(),
            Err(_) => InterruptOutcome {
                cause: InterruptCause::None,
                wake: false,
            },
        }
    }
}

impl<R: SerialRegisters> Default for DeviceRegistry<'_, R> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::SimulatedRegisters;

    #[test]
    fn test_lookup() {
        let registry = DeviceRegistry::new()
            .with_device(PeripheralId::UsciA0, SimulatedRegisters::new())
            .with_device(PeripheralId::UsciB1, SimulatedRegisters::new());

        assert_eq!(registry.get(PeripheralId::UsciA0).map(|d| d.id()), Ok(PeripheralId::UsciA0));
        assert_eq!(registry.get(PeripheralId::UsciB1).map(|d| d.id()), Ok(PeripheralId::UsciB1));
        assert!(matches!(
            registry.get(PeripheralId::UsciA1),
            Err(SerialError::UnknownPeripheral)
        ));
        assert!(!registry.contains(PeripheralId::UsciA3));

        let ids: std::vec::Vec<_> = registry.iter().map(|d| d.id()).collect();
        assert_eq!(ids, [PeripheralId::UsciA0, PeripheralId::UsciB1]);
    }

    #[test]
    fn test_const_construction() {
        const EMPTY: DeviceRegistry<'static, SimulatedRegisters> = DeviceRegistry::new();
        let registry = EMPTY;
        assert_eq!(registry.iter().count(), 0);
        assert!(!registry.contains(PeripheralId::UsciA0));
    }

    #[test]
    fn test_insert_replaces() {
        let mut registry: DeviceRegistry<'_, SimulatedRegisters> = DeviceRegistry::new();
        assert!(registry.insert(PeripheralId::UsciA2, SimulatedRegisters::new()).is_none());
        assert!(registry.insert(PeripheralId::UsciA2, SimulatedRegisters::new()).is_some());
    }

    #[test]
    fn test_unregistered_interrupt_ignored() {
        let registry: DeviceRegistry<'_, SimulatedRegisters> = DeviceRegistry::new();
        let outcome = registry.on_interrupt(PeripheralId::UsciA0);
        assert_eq!(outcome.cause, InterruptCause::None);
        assert!(!outcome.wake);
    }
}
