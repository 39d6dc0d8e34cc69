//! Bit-clock selection and baud-rate divisor math
//!
//! The low-power clock is preferred whenever it runs at least three times
//! the requested rate, because it keeps running in the deeper sleep modes.
//! Otherwise the system clock is used.
//!
//! Layouts with [`Modulation::LowFrequency`] take an integer divisor and a
//! second-stage modulation count in sixteenths of a bit. Layouts with
//! [`Modulation::Oversampled`] switch to 16x oversampling once the divisor
//! is large enough and carry the remaining fraction in the first- and
//! second-stage modulation fields.

use ferrule_hal::{BaudDivisor, ClockSelect, ClockSource, Modulation};

use super::SerialError;

/// Highest baud rate a device can be opened at
pub const MAX_BAUD: u32 = 1_000_000;

/// The low-power clock must run at least this many times the baud rate
pub const LOW_POWER_RATIO: u32 = 3;

/// Reject baud rates outside `1..=MAX_BAUD`
pub fn validate_baud(baud: u32) -> Result<(), SerialError> {
    if baud == 0 || baud > MAX_BAUD {
        return Err(SerialError::InvalidBaud);
    }
    Ok(())
}

/// Pick the bit clock for a baud rate, returning it with its frequency
pub fn select_clock<C: ClockSource>(clocks: &C, baud: u32) -> (ClockSelect, u32) {
    let low_power_hz = clocks.frequency_hz(ClockSelect::LowPower);
    if u64::from(low_power_hz) >= u64::from(LOW_POWER_RATIO) * u64::from(baud) {
        (ClockSelect::LowPower, low_power_hz)
    } else {
        (ClockSelect::System, clocks.frequency_hz(ClockSelect::System))
    }
}

/// Integer divisor plus rounded second-stage modulation
///
/// `brs = round(16 * (clock - baud * br) / baud)`, clamped to `brs_max`.
pub fn low_frequency_divisor(clock_hz: u32, baud: u32, brs_max: u8) -> BaudDivisor {
    let clock = u64::from(clock_hz);
    let baud = u64::from(baud.max(1));

    let br = clock / baud;
    let remainder = clock - baud * br;
    let brs = (16 * remainder + baud / 2) / baud;

    BaudDivisor {
        br: saturate_u16(br),
        brf: 0,
        brs: brs.min(u64::from(brs_max)) as u8,
        oversampling: false,
    }
}

/// Oversampled divisor with first- and second-stage modulation
///
/// The divisor is computed in 1/64 steps. The fractional part scaled to
/// the second-stage field becomes `brs`; when the integer part is at least
/// 16 the peripheral oversamples and `brf` carries the sixteenths.
pub fn oversampled_divisor(clock_hz: u32, baud: u32, brs_max: u8) -> BaudDivisor {
    let n = (u64::from(clock_hz) << 6) / u64::from(baud.max(1));
    let brs = ((n & 0x3F) << 2).min(u64::from(brs_max)) as u8;
    let n = n >> 6;

    if n >= 16 {
        let br = n / 16;
        BaudDivisor {
            br: saturate_u16(br),
            brf: (n - 16 * br) as u8,
            brs,
            oversampling: true,
        }
    } else {
        BaudDivisor {
            br: saturate_u16(n),
            brf: 0,
            brs,
            oversampling: false,
        }
    }
}

/// Divisor for a layout's modulation scheme
pub fn divisor_for(modulation: Modulation, clock_hz: u32, baud: u32, brs_max: u8) -> BaudDivisor {
    match modulation {
        Modulation::LowFrequency => low_frequency_divisor(clock_hz, baud, brs_max),
        Modulation::Oversampled => oversampled_divisor(clock_hz, baud, brs_max),
    }
}

fn saturate_u16(value: u64) -> u16 {
    u16::try_from(value).unwrap_or(u16::MAX)
}
