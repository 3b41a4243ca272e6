//! Typed atom readers over a borrowed payload.
//!
//! Readers come in two flavors. The pointing flavor (`point_to_*`) returns
//! a slice borrowed from the source and is the default choice; the copying
//! flavor (`read_*`) fills a caller-owned destination for values that must
//! outlive the source. Both consume the value's bytes on success.
//!
//! No reader advances the cursor until every bounds check has passed: after
//! an `Err`, the decoder sits exactly where it was, so a caller can grow its
//! destination (or its input) and retry.

use crate::error::Error;
use crate::tag::Tag;
use crate::types::{Date, DateTime, Decimal, Special, Time, TimeDelta};

/// A cursor over an encoded payload.
///
/// Wraps a borrowed slice and never copies or reallocates it. Run
/// [`crate::decompress`] first if the payload may carry the compression bit.
#[derive(Debug, Clone, Copy)]
pub struct Decoder<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Decoder<'a> {
    /// Wraps `data` with the cursor at the start.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Bytes consumed so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Reads the next value's tag without advancing. The compression bit is
    /// masked off before lookup.
    pub fn peek_tag(&self) -> Result<Tag, Error> {
        let byte = *self.data.get(self.pos).ok_or(Error::EndOfBuffer)?;
        Tag::try_from(byte & 0x7F)
    }

    /// Consumes a NULL atom.
    pub fn read_null(&mut self) -> Result<(), Error> {
        self.expect(Tag::Null)?;
        self.pos += 1;
        Ok(())
    }

    /// Consumes a BOOL atom.
    pub fn read_bool(&mut self) -> Result<bool, Error> {
        self.expect(Tag::Bool)?;
        self.need(2)?;
        let value = self.data[self.pos + 1] != 0;
        self.pos += 2;
        Ok(value)
    }

    /// Consumes any of CHAR, SHORT, INT, or LONG, widened to `i64`.
    pub fn read_int(&mut self) -> Result<i64, Error> {
        let body = &self.data[self.pos..];
        match self.peek_tag()? {
            Tag::Char => {
                self.need(2)?;
                self.pos += 2;
                Ok(body[1] as i8 as i64)
            }
            Tag::Short => {
                self.need(3)?;
                self.pos += 3;
                Ok(i16::from_be_bytes([body[1], body[2]]) as i64)
            }
            Tag::Int => {
                self.need(5)?;
                self.pos += 5;
                Ok(i32::from_be_bytes([body[1], body[2], body[3], body[4]]) as i64)
            }
            Tag::Long => {
                self.need(9)?;
                self.pos += 9;
                Ok(i64::from_be_bytes([
                    body[1], body[2], body[3], body[4], body[5], body[6], body[7], body[8],
                ]))
            }
            other => Err(Error::UnexpectedTag(other as u8)),
        }
    }

    /// Consumes a FLOAT atom.
    pub fn read_float(&mut self) -> Result<f64, Error> {
        self.expect(Tag::Float)?;
        self.need(9)?;
        let body = &self.data[self.pos + 1..];
        let value = f64::from_be_bytes([
            body[0], body[1], body[2], body[3], body[4], body[5], body[6], body[7],
        ]);
        self.pos += 9;
        Ok(value)
    }

    /// Consumes a HUGE atom, borrowing its big-endian two's-complement
    /// bytes from the source.
    pub fn point_to_huge(&mut self) -> Result<&'a [u8], Error> {
        self.expect(Tag::Huge)?;
        self.need(5)?;
        let body = &self.data[self.pos + 1..];
        let len = u32::from_be_bytes([body[0], body[1], body[2], body[3]]) as usize;
        if self.remaining() - 5 < len {
            return Err(Error::EndOfBuffer);
        }
        let start = self.pos + 5;
        self.pos = start + len;
        Ok(&self.data[start..self.pos])
    }

    /// Copying flavor of [`Self::point_to_huge`]. Returns the value's
    /// length; `Truncated` reports it without consuming anything.
    pub fn read_huge(&mut self, dst: &mut [u8]) -> Result<usize, Error> {
        let mut probe = *self;
        let src = probe.point_to_huge()?;
        self.copy_out(probe, src, dst)
    }

    /// Consumes a byte-string atom of any size class, borrowing the bytes.
    pub fn point_to_string(&mut self) -> Result<&'a [u8], Error> {
        self.point_to_sized(Tag::ShortStr, Tag::MedStr, Tag::LongStr)
    }

    /// Copying flavor of [`Self::point_to_string`].
    pub fn read_string(&mut self, dst: &mut [u8]) -> Result<usize, Error> {
        let mut probe = *self;
        let src = probe.point_to_string()?;
        self.copy_out(probe, src, dst)
    }

    /// Consumes a text atom of any size class, borrowing the bytes. The
    /// payload is UTF-8 by contract; it is not re-validated here.
    pub fn point_to_utf8(&mut self) -> Result<&'a [u8], Error> {
        self.point_to_sized(Tag::ShortUtf8, Tag::MedUtf8, Tag::LongUtf8)
    }

    /// Copying flavor of [`Self::point_to_utf8`].
    pub fn read_utf8(&mut self, dst: &mut [u8]) -> Result<usize, Error> {
        let mut probe = *self;
        let src = probe.point_to_utf8()?;
        self.copy_out(probe, src, dst)
    }

    /// Consumes a DECIMAL atom, unpacking the nibbles into one digit per
    /// byte.
    pub fn read_decimal(&mut self) -> Result<Decimal, Error> {
        self.expect(Tag::Decimal)?;
        self.need(6)?;
        let body = &self.data[self.pos + 1..];
        let negative = body[0] != 0;
        let exponent = i16::from_be_bytes([body[1], body[2]]);
        let count = u16::from_be_bytes([body[3], body[4]]) as usize;
        let packed = count.div_ceil(2);
        if self.remaining() - 6 < packed {
            return Err(Error::EndOfBuffer);
        }
        let bytes = &self.data[self.pos + 6..self.pos + 6 + packed];
        let mut digits = Vec::with_capacity(count);
        for i in 0..count {
            let byte = bytes[i / 2];
            // Even index sits in the low nibble, odd in the high.
            digits.push(if i % 2 == 0 { byte & 0x0F } else { byte >> 4 });
        }
        self.pos += 6 + packed;
        Ok(Decimal {
            negative,
            exponent,
            digits,
        })
    }

    /// Consumes a SPECIALNUM atom.
    pub fn read_specialnum(&mut self) -> Result<Special, Error> {
        self.expect(Tag::SpecialNum)?;
        self.need(2)?;
        let special = Special::from_flags(self.data[self.pos + 1])?;
        self.pos += 2;
        Ok(special)
    }

    /// Consumes a DATE atom.
    pub fn read_date(&mut self) -> Result<Date, Error> {
        self.expect(Tag::Date)?;
        self.need(5)?;
        let body = &self.data[self.pos + 1..];
        let date = Date {
            year: u16::from_be_bytes([body[0], body[1]]),
            month: body[2],
            day: body[3],
        };
        self.pos += 5;
        Ok(date)
    }

    /// Consumes a TIME atom. The microsecond field is exactly three wire
    /// bytes; the byte after them belongs to the next value.
    pub fn read_time(&mut self) -> Result<Time, Error> {
        self.expect(Tag::Time)?;
        self.need(7)?;
        let body = &self.data[self.pos + 1..];
        let time = Time {
            hour: body[0],
            minute: body[1],
            second: body[2],
            microsecond: be_u24(&body[3..]),
        };
        self.pos += 7;
        Ok(time)
    }

    /// Consumes a DATETIME atom.
    pub fn read_datetime(&mut self) -> Result<DateTime, Error> {
        self.expect(Tag::DateTime)?;
        self.need(11)?;
        let body = &self.data[self.pos + 1..];
        let datetime = DateTime {
            date: Date {
                year: u16::from_be_bytes([body[0], body[1]]),
                month: body[2],
                day: body[3],
            },
            time: Time {
                hour: body[4],
                minute: body[5],
                second: body[6],
                microsecond: be_u24(&body[7..]),
            },
        };
        self.pos += 11;
        Ok(datetime)
    }

    /// Consumes a TIMEDELTA atom.
    pub fn read_timedelta(&mut self) -> Result<TimeDelta, Error> {
        self.expect(Tag::TimeDelta)?;
        self.need(13)?;
        let body = &self.data[self.pos + 1..];
        let delta = TimeDelta {
            days: i32::from_be_bytes([body[0], body[1], body[2], body[3]]),
            seconds: i32::from_be_bytes([body[4], body[5], body[6], body[7]]),
            microseconds: i32::from_be_bytes([body[8], body[9], body[10], body[11]]),
        };
        self.pos += 13;
        Ok(delta)
    }

    /// Consumes any container tag and its count prefix, returning the
    /// element count. The next `count` values (or `2 * count` for a hash)
    /// are the container's children; the wire carries no terminator.
    pub fn container_size(&mut self) -> Result<usize, Error> {
        let tag = self.peek_tag()?;
        let width = tag
            .count_width()
            .ok_or(Error::UnexpectedTag(tag as u8))?;
        self.need(1 + width)?;
        let body = &self.data[self.pos + 1..];
        let count = match width {
            1 => body[0] as usize,
            2 => u16::from_be_bytes([body[0], body[1]]) as usize,
            _ => u32::from_be_bytes([body[0], body[1], body[2], body[3]]) as usize,
        };
        self.pos += 1 + width;
        Ok(count)
    }

    /// Errors unless at least `len` bytes remain.
    fn need(&self, len: usize) -> Result<(), Error> {
        if self.remaining() < len {
            return Err(Error::EndOfBuffer);
        }
        Ok(())
    }

    /// Errors unless the next tag is `tag`.
    fn expect(&self, tag: Tag) -> Result<(), Error> {
        let seen = self.peek_tag()?;
        if seen != tag {
            return Err(Error::UnexpectedTag(seen as u8));
        }
        Ok(())
    }

    /// Shared body of the string and text readers: the three size classes
    /// differ only in tag and count width.
    fn point_to_sized(&mut self, short: Tag, med: Tag, long: Tag) -> Result<&'a [u8], Error> {
        let tag = self.peek_tag()?;
        let head = if tag == short {
            2
        } else if tag == med {
            3
        } else if tag == long {
            5
        } else {
            return Err(Error::UnexpectedTag(tag as u8));
        };
        self.need(head)?;
        let body = &self.data[self.pos + 1..];
        let len = match head {
            2 => body[0] as usize,
            3 => u16::from_be_bytes([body[0], body[1]]) as usize,
            _ => u32::from_be_bytes([body[0], body[1], body[2], body[3]]) as usize,
        };
        if self.remaining() - head < len {
            return Err(Error::EndOfBuffer);
        }
        let start = self.pos + head;
        self.pos = start + len;
        Ok(&self.data[start..self.pos])
    }

    /// Commits a probed pointing read as a copy into `dst`, or reports the
    /// true length without consuming anything.
    fn copy_out(
        &mut self,
        probe: Decoder<'a>,
        src: &'a [u8],
        dst: &mut [u8],
    ) -> Result<usize, Error> {
        if src.len() > dst.len() {
            return Err(Error::Truncated(src.len()));
        }
        dst[..src.len()].copy_from_slice(src);
        *self = probe;
        Ok(src.len())
    }
}

/// Three big-endian bytes widened to a `u32`.
fn be_u24(bytes: &[u8]) -> u32 {
    (bytes[0] as u32) << 16 | (bytes[1] as u32) << 8 | bytes[2] as u32
}
