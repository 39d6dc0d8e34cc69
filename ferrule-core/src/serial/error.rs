//! Serial transport errors

use ferrule_hal::PinError;

/// Error from a serial transport operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SerialError {
    /// Baud rate is zero or above the supported maximum
    InvalidBaud,
    /// No device is registered for the peripheral
    UnknownPeripheral,
    /// The pin binder refused to route the peripheral's pins
    PinConfigurationFailed(PinError),
    /// The device is not open, or was closed while the operation waited
    DeviceClosed,
    /// The device was opened without a receive channel
    NoReceiveChannel,
    /// SPI clock prescaler is zero
    InvalidPrescaler,
}

impl core::fmt::Display for SerialError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            SerialError::InvalidBaud => f.write_str("invalid baud rate"),
            SerialError::UnknownPeripheral => f.write_str("unknown serial peripheral"),
            SerialError::PinConfigurationFailed(e) => write!(f, "pin configuration failed: {}", e),
            SerialError::DeviceClosed => f.write_str("device closed"),
            SerialError::NoReceiveChannel => f.write_str("no receive channel"),
            SerialError::InvalidPrescaler => f.write_str("invalid prescaler"),
        }
    }
}

impl From<PinError> for SerialError {
    fn from(e: PinError) -> Self {
        SerialError::PinConfigurationFailed(e)
    }
}

impl embedded_io::Error for SerialError {
    fn kind(&self) -> embedded_io::ErrorKind {
        use embedded_io::ErrorKind;
        match self {
            SerialError::InvalidBaud | SerialError::InvalidPrescaler => ErrorKind::InvalidInput,
            SerialError::UnknownPeripheral => ErrorKind::NotFound,
            SerialError::PinConfigurationFailed(PinError::Conflict) => ErrorKind::AddrInUse,
            SerialError::PinConfigurationFailed(PinError::NotRouted) => ErrorKind::AddrNotAvailable,
            SerialError::DeviceClosed => ErrorKind::NotConnected,
            SerialError::NoReceiveChannel => ErrorKind::Unsupported,
        }
    }
}
