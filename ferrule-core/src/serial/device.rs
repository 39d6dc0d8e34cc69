//! Per-peripheral serial device
//!
//! A [`SerialDevice`] owns one register block and the session state of the
//! port built on it: whether it is open, and which channels carry its
//! received and outgoing bytes. The transmit path keeps one invariant
//! between operations:
//!
//! > the transmit interrupt is enabled exactly when the output channel
//! > holds bytes.
//!
//! Task-side writers push into the output channel and then call
//! [`SerialDevice::wakeup_transmit`]; the interrupt handler pops one byte
//! per transmit-ready interrupt and disables the transmit interrupt as soon
//! as the channel runs dry. Neither side ever writes the transmit-data
//! register while a byte is still waiting to move into the shift register,
//! so the transmit-ready flag is never touched by software.

use core::cell::Cell;
use core::future::poll_fn;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use ferrule_hal::{BaudDivisor, ClockSelect, InterruptCause, PeripheralId, PinMode, SerialRegisters};
use portable_atomic::{AtomicU32, Ordering};

use super::SerialError;
use crate::channel::{ByteQueue, TryPopError, TryPushError};
use crate::sync::InterruptGuard;

/// Channels attached to a device when it is opened
///
/// Either direction may be left unbuffered. Without an output channel every
/// transmitted byte busy-waits on the hardware; without an input channel
/// the receive interrupt stays disabled.
#[derive(Clone, Copy, Default)]
pub struct Channels<'a> {
    pub(crate) input: Option<&'a dyn ByteQueue>,
    pub(crate) output: Option<&'a dyn ByteQueue>,
}

impl<'a> Channels<'a> {
    /// No buffering in either direction
    pub const fn unbuffered() -> Self {
        Self {
            input: None,
            output: None,
        }
    }

    /// Buffer both directions
    pub fn buffered(input: &'a dyn ByteQueue, output: &'a dyn ByteQueue) -> Self {
        Self {
            input: Some(input),
            output: Some(output),
        }
    }

    /// Buffer received bytes in `input`
    pub fn with_input(mut self, input: &'a dyn ByteQueue) -> Self {
        self.input = Some(input);
        self
    }

    /// Buffer outgoing bytes in `output`
    pub fn with_output(mut self, output: &'a dyn ByteQueue) -> Self {
        self.output = Some(output);
        self
    }

    /// Keep only the directions the port is configured to buffer
    pub(crate) fn restrict(self, rx_buffer: bool, tx_buffer: bool) -> Self {
        Self {
            input: self.input.filter(|_| rx_buffer),
            output: self.output.filter(|_| tx_buffer),
        }
    }

    fn queues(&self) -> impl Iterator<Item = &'a dyn ByteQueue> {
        self.input.into_iter().chain(self.output)
    }

    fn reopen(&self) {
        for queue in self.queues() {
            queue.clear();
            queue.reopen();
        }
    }

    fn close(&self) {
        for queue in self.queues() {
            queue.close();
            queue.clear();
        }
    }
}

#[derive(Clone, Copy)]
struct Session<'a> {
    mode: Option<PinMode>,
    channels: Channels<'a>,
}

impl Session<'_> {
    const CLOSED: Self = Self {
        mode: None,
        channels: Channels::unbuffered(),
    };
}

/// Result of servicing one interrupt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InterruptOutcome {
    /// Which flag was acknowledged
    pub cause: InterruptCause,
    /// A byte moved, so a task may have become runnable. Vector handlers
    /// that sleep between interrupts should leave low-power mode.
    pub wake: bool,
}

/// Traffic counters of an open device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SerialStats {
    /// Bytes read from the receive-data register since open
    pub bytes_received: u32,
    /// Bytes written to the transmit-data register by the interrupt handler
    pub bytes_transmitted: u32,
    /// Whether the device is open
    pub active: bool,
}

/// One serial peripheral and the state of the port opened on it
pub struct SerialDevice<'a, R> {
    id: PeripheralId,
    registers: R,
    session: Mutex<CriticalSectionRawMutex, Cell<Session<'a>>>,
    bytes_received: AtomicU32,
    bytes_transmitted: AtomicU32,
}

impl<'a, R: SerialRegisters> SerialDevice<'a, R> {
    /// Wrap a register block; the device starts closed
    pub const fn new(id: PeripheralId, registers: R) -> Self {
        Self {
            id,
            registers,
            session: Mutex::new(Cell::new(Session::CLOSED)),
            bytes_received: AtomicU32::new(0),
            bytes_transmitted: AtomicU32::new(0),
        }
    }

    /// Peripheral this device drives
    pub fn id(&self) -> PeripheralId {
        self.id
    }

    /// Underlying register block
    ///
    /// Unbuffered receivers poll the hardware directly through this.
    pub fn registers(&self) -> &R {
        &self.registers
    }

    fn session(&self) -> Session<'a> {
        self.session.lock(|s| s.get())
    }

    fn open_session(&self) -> Result<Session<'a>, SerialError> {
        let session = self.session();
        match session.mode {
            Some(_) => Ok(session),
            None => Err(SerialError::DeviceClosed),
        }
    }

    /// Whether the device is open
    pub fn is_active(&self) -> bool {
        self.session().mode.is_some()
    }

    /// Pin set the device was opened with
    pub fn mode(&self) -> Option<PinMode> {
        self.session().mode
    }

    /// Whether outgoing bytes go through an output channel
    pub fn is_tx_buffered(&self) -> bool {
        self.session().channels.output.is_some()
    }

    /// Whether received bytes go into an input channel
    pub fn is_rx_buffered(&self) -> bool {
        self.session().channels.input.is_some()
    }

    /// Bytes queued in the output channel and not yet handed to the hardware
    pub fn pending_output(&self) -> Result<usize, SerialError> {
        let session = self.open_session()?;
        Ok(session.channels.output.map_or(0, |output| output.len()))
    }

    /// Bytes received since the device was last opened
    pub fn bytes_received(&self) -> u32 {
        self.bytes_received.load(Ordering::Relaxed)
    }

    /// Bytes transmitted by the interrupt handler since the device was
    /// last opened
    pub fn bytes_transmitted(&self) -> u32 {
        self.bytes_transmitted.load(Ordering::Relaxed)
    }

    /// Snapshot of the traffic counters
    pub fn stats(&self) -> SerialStats {
        SerialStats {
            bytes_received: self.bytes_received(),
            bytes_transmitted: self.bytes_transmitted(),
            active: self.is_active(),
        }
    }

    /// Bring the peripheral up with interrupts masked
    ///
    /// The handler never sees the device between reset and the enabled
    /// receive interrupt.
    pub(crate) fn activate(
        &self,
        mode: PinMode,
        clock: ClockSelect,
        control: u8,
        divisor: BaudDivisor,
        channels: Channels<'a>,
    ) {
        let _guard = InterruptGuard::new();

        self.registers.hold_reset(clock, control);
        channels.reopen();
        self.registers.write_divisor(divisor);
        self.bytes_received.store(0, Ordering::Relaxed);
        self.bytes_transmitted.store(0, Ordering::Relaxed);
        self.session.lock(|s| {
            s.set(Session {
                mode: Some(mode),
                channels,
            })
        });
        self.registers.release_reset();
        if channels.input.is_some() {
            self.registers.set_rx_interrupt(true);
        }
    }

    /// Force the peripheral into reset and drop the session
    ///
    /// Any byte mid-transmission is abandoned, and so is anything still
    /// queued. The session's channels are closed so that tasks waiting on
    /// them resume with [`SerialError::DeviceClosed`]. Returns the pin set
    /// that was in use.
    pub(crate) fn deactivate(&self) -> Option<PinMode> {
        let _guard = InterruptGuard::new();

        self.registers.force_reset();
        let session = self.session.lock(|s| s.replace(Session::CLOSED));
        session.channels.close();
        session.mode
    }

    /// Enable the transmit interrupt if bytes are waiting and it is off
    ///
    /// Only the enable bit is touched. The transmit-ready flag is left to
    /// the hardware: it is still set if the transmit buffer is empty, so
    /// the interrupt fires at once; otherwise it fires when the byte in
    /// flight moves to the shift register.
    pub fn wakeup_transmit(&self) {
        let _guard = InterruptGuard::new();

        if let Some(output) = self.session().channels.output {
            if !output.is_empty() && !self.registers.tx_interrupt_enabled() {
                self.registers.set_tx_interrupt(true);
            }
        }
    }

    /// Service one interrupt of this peripheral
    ///
    /// Call from the vector handler. Reads the interrupt vector once and
    /// handles the flag it reports.
    pub fn on_interrupt(&self) -> InterruptOutcome {
        let cause = self.registers.interrupt_cause();
        match cause {
            InterruptCause::TransmitReady => self.on_transmit_ready(),
            InterruptCause::ReceiveReady => self.on_receive_ready(),
            InterruptCause::None => {}
        }
        InterruptOutcome {
            cause,
            wake: cause != InterruptCause::None,
        }
    }

    fn on_transmit_ready(&self) {
        let Some(output) = self.session().channels.output else {
            self.registers.set_tx_interrupt(false);
            return;
        };

        let next = output.try_pop();
        if output.is_empty() {
            self.registers.set_tx_interrupt(false);
        }
        if let Ok(byte) = next {
            self.registers.write_tx(byte);
            self.bytes_transmitted.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn on_receive_ready(&self) {
        let byte = self.registers.read_rx();
        if let Some(input) = self.session().channels.input {
            // Dropped when the input channel is full
            let _ = input.try_push(byte);
        }
        self.bytes_received.fetch_add(1, Ordering::Relaxed);
    }

    async fn enqueue(&self, output: &dyn ByteQueue, byte: u8) -> Result<(), SerialError> {
        let first = output.try_push(byte);
        self.wakeup_transmit();
        match first {
            Ok(()) => Ok(()),
            Err(TryPushError::Closed) => Err(SerialError::DeviceClosed),
            Err(TryPushError::Full) => {
                poll_fn(|cx| output.poll_push(byte, cx))
                    .await
                    .map_err(|_| SerialError::DeviceClosed)?;
                self.wakeup_transmit();
                Ok(())
            }
        }
    }

    /// Queue one byte for transmission
    ///
    /// Waits while the output channel is full. Without an output channel
    /// the byte is written straight to the hardware.
    pub async fn put_byte(&self, byte: u8) -> Result<(), SerialError> {
        let session = self.open_session()?;
        match session.channels.output {
            Some(output) => self.enqueue(output, byte).await,
            None => {
                self.write_raw(byte);
                Ok(())
            }
        }
    }

    /// Queue every byte of `data` in order, returning the count
    pub async fn put_string(&self, data: &[u8]) -> Result<usize, SerialError> {
        let session = self.open_session()?;
        let Some(output) = session.channels.output else {
            for &byte in data {
                self.write_raw(byte);
            }
            return Ok(data.len());
        };

        for &byte in data {
            self.enqueue(output, byte).await?;
        }
        self.wakeup_transmit();
        Ok(data.len())
    }

    /// Wait for the next received byte
    pub async fn get_byte(&self) -> Result<u8, SerialError> {
        let input = self
            .open_session()?
            .channels
            .input
            .ok_or(SerialError::NoReceiveChannel)?;
        poll_fn(|cx| input.poll_pop(cx))
            .await
            .map_err(|_| SerialError::DeviceClosed)
    }

    /// Take a received byte if one is buffered
    pub fn try_get_byte(&self) -> Result<Option<u8>, SerialError> {
        let input = self
            .open_session()?
            .channels
            .input
            .ok_or(SerialError::NoReceiveChannel)?;
        match input.try_pop() {
            Ok(byte) => Ok(Some(byte)),
            Err(TryPopError::Empty) => Ok(None),
            Err(TryPopError::Closed) => Err(SerialError::DeviceClosed),
        }
    }

    /// Wait until the interrupt handler has taken every queued byte
    ///
    /// Returns at once without an output channel. The last byte may still
    /// be shifting out; follow with [`SerialDevice::flush`] to wait for it.
    pub async fn wait_output_drained(&self) -> Result<(), SerialError> {
        let Some(output) = self.open_session()?.channels.output else {
            return Ok(());
        };
        poll_fn(|cx| output.poll_drained(cx))
            .await
            .map_err(|_| SerialError::DeviceClosed)
    }

    /// Wait until the peripheral has finished shifting
    pub fn flush(&self) {
        while self.registers.is_busy() {
            core::hint::spin_loop();
        }
    }

    fn write_raw(&self, byte: u8) {
        while !self.registers.tx_ready() {
            core::hint::spin_loop();
        }
        self.registers.write_tx(byte);
    }

    fn raw_allowed(&self) -> bool {
        let session = self.session();
        session.mode.is_some() && session.channels.output.is_none()
    }

    /// Busy-wait transmit of one byte, bypassing the channels
    ///
    /// Refused (`None`) while the device is closed or its output is
    /// buffered, because writing the transmit register behind the interrupt
    /// handler's back would corrupt the stream.
    pub fn transmit_byte_raw(&self, byte: u8) -> Option<u8> {
        if !self.raw_allowed() {
            return None;
        }
        self.write_raw(byte);
        Some(byte)
    }

    /// Busy-wait transmit of a byte slice, returning the count
    pub fn transmit_data_raw(&self, data: &[u8]) -> Option<usize> {
        if !self.raw_allowed() {
            return None;
        }
        for &byte in data {
            self.write_raw(byte);
        }
        Some(data.len())
    }

    /// Busy-wait transmit of a string, returning the byte count
    pub fn transmit_str_raw(&self, s: &str) -> Option<usize> {
        self.transmit_data_raw(s.as_bytes())
    }
}
