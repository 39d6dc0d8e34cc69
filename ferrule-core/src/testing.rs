//! Host-side stand-ins for hardware collaborators

use core::cell::{Ref, RefCell};
use std::vec::Vec;

use ferrule_hal::{
    BaudDivisor, ClockSelect, InterruptCause, Modulation, PeripheralId, PinBinder, PinError,
    PinMode, SerialRegisters,
};

/// Register-visible state of [`SimulatedRegisters`]
#[derive(Debug)]
pub(crate) struct SimState {
    pub reset: bool,
    pub clock: Option<ClockSelect>,
    pub control: u8,
    pub divisor: Option<BaudDivisor>,
    pub tx_ie: bool,
    pub rx_ie: bool,
    pub tx_ifg: bool,
    pub rx_ifg: bool,
    pub rx_buf: u8,
    /// Byte written to the transmit register and not yet shifted out
    pub in_flight: Option<u8>,
    /// Every byte written to the transmit register
    pub tx_writes: Vec<u8>,
    /// Bytes that made it onto the line
    pub wire: Vec<u8>,
    /// Transmit-register writes that clobbered a byte still in flight
    pub overruns: usize,
    /// Register writes of any kind
    pub writes: usize,
    polls: u32,
}

/// Serial register block simulated in memory
///
/// Models the parts of the peripheral the transport relies on: the reset
/// bit clears the interrupt enables and flags, reading the vector
/// acknowledges the highest-priority pending flag (receive first), and a
/// written byte takes a few status polls to shift out.
pub(crate) struct SimulatedRegisters {
    state: RefCell<SimState>,
}

/// Status polls before a byte in flight finishes shifting
const SHIFT_POLLS: u32 = 3;

impl SimulatedRegisters {
    pub fn new() -> Self {
        Self {
            state: RefCell::new(SimState {
                reset: true,
                clock: None,
                control: 0,
                divisor: None,
                tx_ie: false,
                rx_ie: false,
                tx_ifg: false,
                rx_ifg: false,
                rx_buf: 0,
                in_flight: None,
                tx_writes: Vec::new(),
                wire: Vec::new(),
                overruns: 0,
                writes: 0,
                polls: 0,
            }),
        }
    }

    pub fn state(&self) -> Ref<'_, SimState> {
        self.state.borrow()
    }

    /// Finish shifting the byte in flight; false when the line was idle
    pub fn complete_shift(&self) -> bool {
        let mut s = self.state.borrow_mut();
        Self::shift(&mut s)
    }

    /// A byte arrives on the line
    pub fn receive(&self, byte: u8) {
        let mut s = self.state.borrow_mut();
        if !s.reset {
            s.rx_buf = byte;
            s.rx_ifg = true;
        }
    }

    /// Whether the vector would report an enabled, pending flag
    pub fn interrupt_pending(&self) -> bool {
        let s = self.state.borrow();
        !s.reset && ((s.rx_ie && s.rx_ifg) || (s.tx_ie && s.tx_ifg))
    }

    fn shift(s: &mut SimState) -> bool {
        match s.in_flight.take() {
            Some(byte) => {
                s.wire.push(byte);
                s.tx_ifg = true;
                s.polls = 0;
                true
            }
            None => false,
        }
    }

    fn poll(s: &mut SimState) {
        if s.in_flight.is_some() {
            s.polls += 1;
            if s.polls >= SHIFT_POLLS {
                Self::shift(s);
            }
        }
    }

    fn enter_reset(s: &mut SimState) {
        s.reset = true;
        s.tx_ie = false;
        s.rx_ie = false;
        s.tx_ifg = false;
        s.rx_ifg = false;
        s.in_flight = None;
        s.polls = 0;
        s.writes += 1;
    }
}

impl SerialRegisters for SimulatedRegisters {
    const MODULATION: Modulation = Modulation::LowFrequency;
    const BRS_MAX: u8 = 7;

    fn hold_reset(&self, clock: ClockSelect, control: u8) {
        let mut s = self.state.borrow_mut();
        Self::enter_reset(&mut s);
        s.clock = Some(clock);
        s.control = control;
    }

    fn force_reset(&self) {
        let mut s = self.state.borrow_mut();
        Self::enter_reset(&mut s);
        s.clock = None;
        s.control = 0;
    }

    fn release_reset(&self) {
        let mut s = self.state.borrow_mut();
        s.reset = false;
        // Transmit buffer is empty coming out of reset
        s.tx_ifg = true;
        s.writes += 1;
    }

    fn write_divisor(&self, divisor: BaudDivisor) {
        let mut s = self.state.borrow_mut();
        s.divisor = Some(divisor);
        s.writes += 1;
    }

    fn interrupt_cause(&self) -> InterruptCause {
        let mut s = self.state.borrow_mut();
        if s.reset {
            InterruptCause::None
        } else if s.rx_ie && s.rx_ifg {
            s.rx_ifg = false;
            InterruptCause::ReceiveReady
        } else if s.tx_ie && s.tx_ifg {
            s.tx_ifg = false;
            InterruptCause::TransmitReady
        } else {
            InterruptCause::None
        }
    }

    fn write_tx(&self, byte: u8) {
        let mut s = self.state.borrow_mut();
        if s.reset {
            return;
        }
        if s.in_flight.is_some() {
            s.overruns += 1;
        }
        s.in_flight = Some(byte);
        s.tx_ifg = false;
        s.polls = 0;
        s.tx_writes.push(byte);
        s.writes += 1;
    }

    fn read_rx(&self) -> u8 {
        let mut s = self.state.borrow_mut();
        s.rx_ifg = false;
        s.rx_buf
    }

    fn tx_ready(&self) -> bool {
        let mut s = self.state.borrow_mut();
        Self::poll(&mut s);
        s.tx_ifg
    }

    fn is_busy(&self) -> bool {
        let mut s = self.state.borrow_mut();
        Self::poll(&mut s);
        s.in_flight.is_some()
    }

    fn tx_interrupt_enabled(&self) -> bool {
        self.state.borrow().tx_ie
    }

    fn set_tx_interrupt(&self, enabled: bool) {
        let mut s = self.state.borrow_mut();
        if !s.reset {
            s.tx_ie = enabled;
        }
        s.writes += 1;
    }

    fn set_rx_interrupt(&self, enabled: bool) {
        let mut s = self.state.borrow_mut();
        if !s.reset {
            s.rx_ie = enabled;
        }
        s.writes += 1;
    }
}

/// Pin binder that records every request and can be told to fail
#[derive(Default)]
pub(crate) struct RecordingPins {
    pub calls: Vec<(PeripheralId, PinMode, bool)>,
    pub fail_with: Option<PinError>,
}

impl PinBinder for RecordingPins {
    fn configure(
        &mut self,
        peripheral: PeripheralId,
        mode: PinMode,
        enable: bool,
    ) -> Result<(), PinError> {
        self.calls.push((peripheral, mode, enable));
        match self.fail_with {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
