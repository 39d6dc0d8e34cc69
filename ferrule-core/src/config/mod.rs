//! Board serial configuration
//!
//! Which peripherals a board uses as serial ports, how each is framed, and
//! the fixed frequencies of its clock tree. Boards describe this in a small
//! TOML subset (see [`parse_config`]); the `serde` feature adds a postcard
//! binary form for storing a parsed configuration in flash.

mod parser;
mod types;

pub use parser::parse_config;
pub use types::*;

/// Configuration error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Unrecognised or malformed section header
    InvalidSection,
    /// Value of the wrong type or out of range
    InvalidValue,
    /// Key not valid in its section
    UnknownKey,
    /// More ports than the configuration can hold
    TooManyItems,
    /// A required key is missing
    MissingField,
    /// Two ports share a name or a peripheral
    Duplicate,
    /// Binary form could not be encoded or decoded
    Encoding,
    /// Binary form was written by an incompatible version
    VersionMismatch,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let msg = match self {
            ConfigError::InvalidSection => "invalid section",
            ConfigError::InvalidValue => "invalid value",
            ConfigError::UnknownKey => "unknown key",
            ConfigError::TooManyItems => "too many items",
            ConfigError::MissingField => "missing field",
            ConfigError::Duplicate => "duplicate port",
            ConfigError::Encoding => "encoding failed",
            ConfigError::VersionMismatch => "version mismatch",
        };
        f.write_str(msg)
    }
}
