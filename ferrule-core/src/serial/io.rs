//! `embedded-io` and blocking UART adapters
//!
//! [`SerialPort`] is a cheap handle on an open device that lets generic
//! drivers and formatters write to it.

use embassy_futures::block_on;
use ferrule_hal::{SerialRegisters, UartRx, UartTx};

use super::{SerialDevice, SerialError};

/// `embedded-io` handle on a serial device
pub struct SerialPort<'d, 'a, R> {
    device: &'d SerialDevice<'a, R>,
}

impl<'a, R: SerialRegisters> SerialDevice<'a, R> {
    /// Handle implementing the `embedded-io` and UART traits
    pub fn port(&self) -> SerialPort<'_, 'a, R> {
        SerialPort { device: self }
    }
}

impl<'d, 'a, R: SerialRegisters> SerialPort<'d, 'a, R> {
    /// Device behind the handle
    pub fn device(&self) -> &'d SerialDevice<'a, R> {
        self.device
    }

    async fn read_available(&self, buf: &mut [u8]) -> Result<usize, SerialError> {
        let Some((first, rest)) = buf.split_first_mut() else {
            return Ok(0);
        };
        *first = self.device.get_byte().await?;

        let mut count = 1;
        for slot in rest {
            match self.device.try_get_byte()? {
                Some(byte) => {
                    *slot = byte;
                    count += 1;
                }
                None => break,
            }
        }
        Ok(count)
    }

    async fn drain(&self) -> Result<(), SerialError> {
        self.device.wait_output_drained().await?;
        self.device.flush();
        Ok(())
    }
}

impl<R: SerialRegisters> embedded_io::ErrorType for SerialPort<'_, '_, R> {
    type Error = SerialError;
}

impl<R: SerialRegisters> embedded_io_async::Write for SerialPort<'_, '_, R> {
    async fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.device.put_string(buf).await
    }

    async fn flush(&mut self) -> Result<(), Self::Error> {
        self.drain().await
    }
}

impl<R: SerialRegisters> embedded_io_async::Read for SerialPort<'_, '_, R> {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        self.read_available(buf).await
    }
}

impl<R: SerialRegisters> UartTx for SerialPort<'_, '_, R> {
    type Error = SerialError;

    fn write_blocking(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        block_on(self.device.put_string(data)).map(|_| ())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        block_on(self.drain())
    }
}

impl<R: SerialRegisters> UartRx for SerialPort<'_, '_, R> {
    type Error = SerialError;

    fn read_blocking(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        block_on(self.read_available(buf))
    }
}
