//! Plain-data carriers for the temporal, decimal, and special-number atoms.
//!
//! These are transport records: the codec moves their fields across the wire
//! verbatim and leaves calendar or numeric validation to the host.

use crate::error::Error;
use crate::tag::{SPECIAL_INFINITY, SPECIAL_NAN};

/// Calendar date: 2-byte year, 1-byte month, 1-byte day on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Date {
    pub year: u16,
    pub month: u8,
    pub day: u8,
}

/// Time of day. The microsecond field occupies three wire bytes, so only
/// the low 24 bits travel; in-range values (below one million) always fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Time {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub microsecond: u32,
}

/// Combined calendar date and time of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateTime {
    pub date: Date,
    pub time: Time,
}

/// A signed duration in days/seconds/microseconds, each a 4-byte field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeDelta {
    pub days: i32,
    pub seconds: i32,
    pub microseconds: i32,
}

/// An arbitrary-precision decimal in sign/exponent/digits form.
///
/// `digits` holds one value in `0..=9` per element, most significant first.
/// The codec only transports the triple; how sign, exponent, and digits
/// combine into a number is the host's convention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decimal {
    pub negative: bool,
    pub exponent: i16,
    pub digits: Vec<u8>,
}

/// The non-finite numbers sharing the SPECIALNUM tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Special {
    Infinity { negative: bool },
    Nan { signaling: bool },
}

impl Special {
    pub(crate) fn flags(self) -> u8 {
        match self {
            Special::Infinity { negative } => SPECIAL_INFINITY | negative as u8,
            Special::Nan { signaling } => SPECIAL_NAN | signaling as u8,
        }
    }

    pub(crate) fn from_flags(flags: u8) -> Result<Self, Error> {
        match flags & 0xF0 {
            SPECIAL_INFINITY => Ok(Special::Infinity {
                negative: flags & 0x01 != 0,
            }),
            // A sign bit on NaN is not part of the format; only the
            // signaling bit is honored.
            SPECIAL_NAN => Ok(Special::Nan {
                signaling: flags & 0x01 != 0,
            }),
            _ => Err(Error::InvalidSpecial(flags)),
        }
    }
}
