//! Device lifecycle
//!
//! [`Transport`] owns the board collaborators a device needs while it is
//! being opened or closed: the clock tree for divisor selection and the pin
//! binder for routing. Once open, the data path runs on the
//! [`SerialDevice`] alone, so tasks and vector handlers only need a shared
//! reference to the registry.

use ferrule_hal::uart::UartConfig;
use ferrule_hal::{BaudDivisor, ClockSelect, ClockSource, PeripheralId, PinBinder, PinMode, SerialRegisters};

use super::baud::{divisor_for, select_clock, validate_baud};
use super::{Channels, SerialDevice, SerialError};
use crate::config::{PortConfig, PortMode};
use crate::registry::DeviceRegistry;

/// Opens and closes the devices of a registry
pub struct Transport<'r, 'a, R, C, P> {
    registry: &'r DeviceRegistry<'a, R>,
    clocks: C,
    pins: P,
}

impl<'r, 'a, R, C, P> Transport<'r, 'a, R, C, P>
where
    R: SerialRegisters,
    C: ClockSource,
    P: PinBinder,
{
    /// Create a transport over a registry
    pub fn new(registry: &'r DeviceRegistry<'a, R>, clocks: C, pins: P) -> Self {
        Self {
            registry,
            clocks,
            pins,
        }
    }

    /// Registry the transport manages
    pub fn registry(&self) -> &'r DeviceRegistry<'a, R> {
        self.registry
    }

    /// Look up a registered device
    pub fn device(&self, id: PeripheralId) -> Result<&'r SerialDevice<'a, R>, SerialError> {
        self.registry.get(id)
    }

    /// Pin binder, for inspection
    pub fn pins(&self) -> &P {
        &self.pins
    }

    /// Open a peripheral as a UART
    ///
    /// `control` is written to the control register as-is. Without an
    /// input channel received bytes stay in the hardware; without an output
    /// channel writes busy-wait. Opening an open device closes it first.
    pub fn open(
        &mut self,
        id: PeripheralId,
        control: u8,
        baud: u32,
        channels: Channels<'a>,
    ) -> Result<&'r SerialDevice<'a, R>, SerialError> {
        if let Err(e) = validate_baud(baud) {
            warn!("serial {}: rejected baud {}", id.name(), baud);
            return Err(e);
        }

        let (clock, clock_hz) = select_clock(&self.clocks, baud);
        let divisor = divisor_for(R::MODULATION, clock_hz, baud, R::BRS_MAX);
        let device = self.bring_up(id, PinMode::Uart, clock, control, divisor, channels)?;

        info!(
            "serial {}: open at {} baud from {} Hz (br={} brs={} brf={})",
            id.name(),
            baud,
            clock_hz,
            divisor.br,
            divisor.brs,
            divisor.brf
        );
        Ok(device)
    }

    /// Open a peripheral as a UART with the given framing
    pub fn open_uart(
        &mut self,
        id: PeripheralId,
        config: &UartConfig,
        channels: Channels<'a>,
    ) -> Result<&'r SerialDevice<'a, R>, SerialError> {
        self.open(id, config.control_bits(), config.baudrate, channels)
    }

    /// Open a peripheral as an SPI master
    ///
    /// The bit clock is the system clock divided by `prescaler`.
    pub fn open_spi(
        &mut self,
        id: PeripheralId,
        control: u8,
        prescaler: u16,
        channels: Channels<'a>,
    ) -> Result<&'r SerialDevice<'a, R>, SerialError> {
        if prescaler == 0 {
            warn!("serial {}: rejected zero prescaler", id.name());
            return Err(SerialError::InvalidPrescaler);
        }

        let divisor = BaudDivisor::prescaler(prescaler);
        let device = self.bring_up(id, PinMode::Spi, ClockSelect::System, control, divisor, channels)?;

        info!("serial {}: open as spi, prescaler {}", id.name(), prescaler);
        Ok(device)
    }

    /// Open a port described by the board configuration
    ///
    /// A direction the port is not configured to buffer runs unbuffered
    /// even if `channels` supplies a channel for it.
    pub fn open_port(
        &mut self,
        port: &PortConfig,
        channels: Channels<'a>,
    ) -> Result<&'r SerialDevice<'a, R>, SerialError> {
        let channels = channels.restrict(port.rx_buffer, port.tx_buffer);
        match &port.mode {
            PortMode::Uart(uart) => self.open_uart(port.peripheral, uart, channels),
            PortMode::Spi(spi) => {
                self.open_spi(port.peripheral, spi.control_bits(), spi.prescaler, channels)
            }
        }
    }

    fn bring_up(
        &mut self,
        id: PeripheralId,
        mode: PinMode,
        clock: ClockSelect,
        control: u8,
        divisor: BaudDivisor,
        channels: Channels<'a>,
    ) -> Result<&'r SerialDevice<'a, R>, SerialError> {
        let device = self.registry.get(id)?;

        if device.is_active() {
            debug!("serial {}: re-open, closing first", id.name());
            self.close(id)?;
        }

        if let Err(e) = self.pins.configure(id, mode, true) {
            warn!("serial {}: pin configuration failed: {}", id.name(), e);
            return Err(SerialError::PinConfigurationFailed(e));
        }

        device.activate(mode, clock, control, divisor, channels);
        Ok(device)
    }

    /// Close a peripheral
    ///
    /// The peripheral is forced into reset, abandoning any byte in flight
    /// and anything still queued. Tasks waiting on the device's channels
    /// resume with [`SerialError::DeviceClosed`]. Closing a device that is
    /// not open does nothing.
    pub fn close(&mut self, id: PeripheralId) -> Result<(), SerialError> {
        let device = self.registry.get(id)?;
        if !device.is_active() {
            return Ok(());
        }

        let stats = device.stats();
        let Some(mode) = device.deactivate() else {
            return Ok(());
        };
        self.pins.configure(id, mode, false)?;

        debug!(
            "serial {}: closed (rx {} tx {})",
            id.name(),
            stats.bytes_received,
            stats.bytes_transmitted
        );
        Ok(())
    }
}
