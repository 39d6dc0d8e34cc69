//! Minimal TOML parser for board serial configuration
//!
//! Handles only the subset the board files use. It does NOT support the
//! full TOML spec.
//!
//! Supported:
//! - `key = value` pairs (string, integer, boolean)
//! - `[clocks]` and `[serial.<name>]` section headers
//! - Comments (`# ...`), including trailing comments
//!
//! ```toml
//! [clocks]
//! aclk_hz = 32768
//! smclk_hz = 8000000
//!
//! [serial.console]
//! peripheral = "usci_a1"
//! mode = "uart"
//! baud = 115200
//! parity = "even"
//!
//! [serial.flash]
//! peripheral = "usci_b0"
//! mode = "spi"
//! prescaler = 4
//! spi_mode = 3
//! rx_buffer = false
//! ```

use ferrule_hal::spi::{Mode, SpiConfig};
use ferrule_hal::uart::{DataBits, Parity, StopBits, UartConfig};
use ferrule_hal::PeripheralId;
use heapless::String;

use super::types::{BoardConfig, PortConfig, PortMode, MAX_NAME_LEN};
use super::ConfigError;
use crate::serial::baud::validate_baud;

/// Current parsing context
#[derive(Debug, Clone)]
enum Section {
    Root,
    Clocks,
    Serial(String<MAX_NAME_LEN>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Uart,
    Spi,
}

/// A `[serial.<name>]` section being built
#[derive(Debug)]
struct PortDraft {
    name: String<MAX_NAME_LEN>,
    peripheral: Option<PeripheralId>,
    role: Role,
    baud: Option<u32>,
    data_bits: Option<DataBits>,
    parity: Option<Parity>,
    stop_bits: Option<StopBits>,
    prescaler: Option<u16>,
    spi_mode: Option<Mode>,
    msb_first: Option<bool>,
    rx_buffer: bool,
    tx_buffer: bool,
}

impl PortDraft {
    fn new(name: String<MAX_NAME_LEN>) -> Self {
        Self {
            name,
            peripheral: None,
            role: Role::Uart,
            baud: None,
            data_bits: None,
            parity: None,
            stop_bits: None,
            prescaler: None,
            spi_mode: None,
            msb_first: None,
            rx_buffer: true,
            tx_buffer: true,
        }
    }

    fn apply(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        match key {
            "peripheral" => {
                let name = parse_string(value)?;
                self.peripheral =
                    Some(PeripheralId::from_name(name).ok_or(ConfigError::InvalidValue)?);
            }
            "mode" => {
                self.role = match parse_string(value)? {
                    "uart" => Role::Uart,
                    "spi" => Role::Spi,
                    _ => return Err(ConfigError::InvalidValue),
                };
            }
            "baud" => self.baud = Some(parse_int(value)?),
            "data_bits" => {
                self.data_bits = Some(match parse_int::<u8>(value)? {
                    7 => DataBits::Seven,
                    8 => DataBits::Eight,
                    _ => return Err(ConfigError::InvalidValue),
                });
            }
            "parity" => {
                self.parity = Some(match parse_string(value)? {
                    "none" => Parity::None,
                    "even" => Parity::Even,
                    "odd" => Parity::Odd,
                    _ => return Err(ConfigError::InvalidValue),
                });
            }
            "stop_bits" => {
                self.stop_bits = Some(match parse_int::<u8>(value)? {
                    1 => StopBits::One,
                    2 => StopBits::Two,
                    _ => return Err(ConfigError::InvalidValue),
                });
            }
            "prescaler" => self.prescaler = Some(parse_int(value)?),
            "spi_mode" => {
                self.spi_mode = Some(match parse_int::<u8>(value)? {
                    0 => Mode::Mode0,
                    1 => Mode::Mode1,
                    2 => Mode::Mode2,
                    3 => Mode::Mode3,
                    _ => return Err(ConfigError::InvalidValue),
                });
            }
            "msb_first" => self.msb_first = Some(parse_bool(value)?),
            "rx_buffer" => self.rx_buffer = parse_bool(value)?,
            "tx_buffer" => self.tx_buffer = parse_bool(value)?,
            _ => return Err(ConfigError::UnknownKey),
        }
        Ok(())
    }

    fn finish(self) -> Result<PortConfig, ConfigError> {
        let peripheral = self.peripheral.ok_or(ConfigError::MissingField)?;

        let mode = match self.role {
            Role::Uart => {
                if self.prescaler.is_some() || self.spi_mode.is_some() {
                    return Err(ConfigError::InvalidValue);
                }
                if !peripheral.supports_uart() {
                    return Err(ConfigError::InvalidValue);
                }
                let defaults = UartConfig::default();
                let baudrate = self.baud.unwrap_or(defaults.baudrate);
                validate_baud(baudrate).map_err(|_| ConfigError::InvalidValue)?;
                PortMode::Uart(UartConfig {
                    baudrate,
                    data_bits: self.data_bits.unwrap_or(defaults.data_bits),
                    parity: self.parity.unwrap_or(defaults.parity),
                    stop_bits: self.stop_bits.unwrap_or(defaults.stop_bits),
                    msb_first: self.msb_first.unwrap_or(defaults.msb_first),
                })
            }
            Role::Spi => {
                if self.baud.is_some()
                    || self.data_bits.is_some()
                    || self.parity.is_some()
                    || self.stop_bits.is_some()
                {
                    return Err(ConfigError::InvalidValue);
                }
                let defaults = SpiConfig::default();
                let prescaler = self.prescaler.unwrap_or(defaults.prescaler);
                if prescaler == 0 {
                    return Err(ConfigError::InvalidValue);
                }
                let mut spi = match self.spi_mode {
                    Some(mode) => SpiConfig::from_mode(mode, prescaler),
                    None => SpiConfig {
                        prescaler,
                        ..defaults
                    },
                };
                if let Some(msb_first) = self.msb_first {
                    spi.msb_first = msb_first;
                }
                PortMode::Spi(spi)
            }
        };

        Ok(PortConfig {
            name: self.name,
            peripheral,
            mode,
            rx_buffer: self.rx_buffer,
            tx_buffer: self.tx_buffer,
        })
    }
}

/// Parse a board configuration
pub fn parse_config(input: &str) -> Result<BoardConfig, ConfigError> {
    let mut config = BoardConfig::new();
    let mut section = Section::Root;
    let mut current_port: Option<PortDraft> = None;

    for (index, line) in input.lines().enumerate() {
        parse_line(line, &mut section, &mut config, &mut current_port).map_err(|e| {
            warn!("config line {}: {}", index + 1, e);
            e
        })?;
    }

    // Save final section
    save_port(&mut config, &mut current_port)?;

    debug!("config: {} serial ports", config.ports.len());
    Ok(config)
}

fn parse_line(
    line: &str,
    section: &mut Section,
    config: &mut BoardConfig,
    current_port: &mut Option<PortDraft>,
) -> Result<(), ConfigError> {
    let line = line.trim();

    // Skip empty lines and comments
    if line.is_empty() || line.starts_with('#') {
        return Ok(());
    }

    if line.starts_with('[') {
        let header = line
            .strip_prefix('[')
            .and_then(|h| h.split('#').next())
            .map(str::trim)
            .and_then(|h| h.strip_suffix(']'))
            .ok_or(ConfigError::InvalidSection)?;

        save_port(config, current_port)?;
        *section = parse_section_header(header)?;
        if let Section::Serial(name) = section {
            *current_port = Some(PortDraft::new(name.clone()));
        }
        return Ok(());
    }

    let (key, value) = parse_key_value(line).ok_or(ConfigError::InvalidValue)?;
    match section {
        Section::Root => Err(ConfigError::UnknownKey),
        Section::Clocks => match key {
            "aclk_hz" => {
                config.clocks.low_power_hz = parse_int(value)?;
                Ok(())
            }
            "smclk_hz" => {
                config.clocks.system_hz = parse_int(value)?;
                Ok(())
            }
            _ => Err(ConfigError::UnknownKey),
        },
        Section::Serial(_) => match current_port {
            Some(port) => port.apply(key, value),
            None => Err(ConfigError::InvalidSection),
        },
    }
}

fn save_port(
    config: &mut BoardConfig,
    current_port: &mut Option<PortDraft>,
) -> Result<(), ConfigError> {
    match current_port.take() {
        Some(draft) => config.add_port(draft.finish()?),
        None => Ok(()),
    }
}

/// Parse section header like "clocks" or "serial.console"
fn parse_section_header(header: &str) -> Result<Section, ConfigError> {
    let header = header.trim();

    if header == "clocks" {
        return Ok(Section::Clocks);
    }

    if let Some(name) = header.strip_prefix("serial.") {
        let name = name.trim();
        if name.is_empty() || name.contains('.') {
            return Err(ConfigError::InvalidSection);
        }
        let name = String::try_from(name).map_err(|_| ConfigError::InvalidValue)?;
        return Ok(Section::Serial(name));
    }

    Err(ConfigError::InvalidSection)
}

/// Parse a key = value line
fn parse_key_value(line: &str) -> Option<(&str, &str)> {
    let eq_pos = line.find('=')?;
    let key = line[..eq_pos].trim();
    let value = line[eq_pos + 1..].trim();

    // Remove inline comments
    let value = if let Some(hash_pos) = value.find('#') {
        // Make sure # is not inside a string
        let quote_count = value[..hash_pos].matches('"').count();
        if quote_count % 2 == 0 {
            value[..hash_pos].trim()
        } else {
            value
        }
    } else {
        value
    };

    if key.is_empty() || value.is_empty() {
        return None;
    }

    Some((key, value))
}

/// Parse a string value (removes quotes)
fn parse_string(value: &str) -> Result<&str, ConfigError> {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        Ok(&value[1..value.len() - 1])
    } else {
        // Allow unquoted strings for simple values
        Ok(value)
    }
}

/// Parse an integer value, allowing `_` separators
fn parse_int<T: core::str::FromStr>(value: &str) -> Result<T, ConfigError> {
    let mut digits: String<24> = String::new();
    for c in value.chars().filter(|&c| c != '_') {
        digits.push(c).map_err(|_| ConfigError::InvalidValue)?;
    }
    digits.parse().map_err(|_| ConfigError::InvalidValue)
}

/// Parse a boolean value
fn parse_bool(value: &str) -> Result<bool, ConfigError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ConfigError::InvalidValue),
    }
}
