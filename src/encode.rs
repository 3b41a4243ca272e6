//! Typed atom writers and container openers.
//!
//! An [`Encoder`] appends self-describing values to a growable buffer: a tag
//! byte, a size-classed length prefix where the type has one, then the
//! payload. Multi-byte fields are big-endian. Integers and length-carrying
//! types pick the narrowest class that fits, so small values stay small.

use bytes::{BufMut, Bytes, BytesMut};

use crate::envelope;
use crate::error::Error;
use crate::tag::{Tag, SPECIAL_INFINITY, SPECIAL_NAN};
use crate::types::{Date, DateTime, Time, TimeDelta};

/// Appends typed values to a growable byte buffer.
///
/// Each writer reserves the exact number of bytes it will append before
/// touching the buffer and validates its arguments before writing, so
/// whether a call succeeds or fails, `as_bytes()` stays a prefix-valid
/// payload.
///
/// Container openers write only the tag and element count. The caller must
/// follow with exactly that many child values (key/value pairs for a hash);
/// the wire carries no terminator to catch a shortfall.
#[derive(Debug, Default)]
pub struct Encoder {
    buf: BytesMut,
}

impl Encoder {
    /// Creates an empty encoder.
    pub fn new() -> Self {
        Self {
            buf: BytesMut::new(),
        }
    }

    /// Creates an encoder with room for `capacity` bytes before the first
    /// reallocation.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
        }
    }

    /// Bytes written so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether nothing has been written yet.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// The payload encoded so far.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the encoder and returns the finished payload.
    pub fn into_bytes(self) -> Bytes {
        self.buf.freeze()
    }

    /// Writes a NULL atom.
    pub fn feed_null(&mut self) {
        self.buf.reserve(1);
        self.buf.put_u8(Tag::Null as u8);
    }

    /// Writes a BOOL atom.
    pub fn feed_bool(&mut self, value: bool) {
        self.buf.reserve(2);
        self.buf.put_u8(Tag::Bool as u8);
        self.buf.put_u8(value as u8);
    }

    /// Writes `value` in the narrowest signed class that holds it:
    /// CHAR, SHORT, INT, or LONG.
    pub fn feed_int(&mut self, value: i64) {
        if let Ok(v) = i8::try_from(value) {
            self.buf.reserve(2);
            self.buf.put_u8(Tag::Char as u8);
            self.buf.put_i8(v);
        } else if let Ok(v) = i16::try_from(value) {
            self.buf.reserve(3);
            self.buf.put_u8(Tag::Short as u8);
            self.buf.put_i16(v);
        } else if let Ok(v) = i32::try_from(value) {
            self.buf.reserve(5);
            self.buf.put_u8(Tag::Int as u8);
            self.buf.put_i32(v);
        } else {
            self.buf.reserve(9);
            self.buf.put_u8(Tag::Long as u8);
            self.buf.put_i64(value);
        }
    }

    /// Writes a HUGE atom: an arbitrary-precision signed integer given as
    /// big-endian two's-complement bytes, copied verbatim.
    pub fn feed_huge(&mut self, bytes: &[u8]) -> Result<(), Error> {
        let len =
            u32::try_from(bytes.len()).map_err(|_| Error::InvalidLength(bytes.len()))?;
        self.buf.reserve(5 + bytes.len());
        self.buf.put_u8(Tag::Huge as u8);
        self.buf.put_u32(len);
        self.buf.put_slice(bytes);
        Ok(())
    }

    /// Writes a FLOAT atom (IEEE-754 double, big-endian).
    pub fn feed_float(&mut self, value: f64) {
        self.buf.reserve(9);
        self.buf.put_u8(Tag::Float as u8);
        self.buf.put_f64(value);
    }

    /// Writes a byte-string atom. Bytes are opaque; no encoding is implied.
    pub fn feed_string(&mut self, bytes: &[u8]) -> Result<(), Error> {
        self.put_sized(Tag::ShortStr, Tag::MedStr, Tag::LongStr, bytes.len(), bytes.len())?;
        self.buf.put_slice(bytes);
        Ok(())
    }

    /// Writes a text atom. Validity is carried by the `&str` type; the bytes
    /// go to the wire unchanged.
    pub fn feed_utf8(&mut self, text: &str) -> Result<(), Error> {
        let bytes = text.as_bytes();
        self.put_sized(Tag::ShortUtf8, Tag::MedUtf8, Tag::LongUtf8, bytes.len(), bytes.len())?;
        self.buf.put_slice(bytes);
        Ok(())
    }

    /// Writes a DECIMAL atom: sign byte, signed exponent, digit count, then
    /// the digits packed two per byte (even index in the low nibble).
    ///
    /// Digits are validated before anything is written, so a rejected digit
    /// leaves the buffer untouched.
    pub fn feed_decimal(
        &mut self,
        negative: bool,
        exponent: i16,
        digits: &[u8],
    ) -> Result<(), Error> {
        let count =
            u16::try_from(digits.len()).map_err(|_| Error::InvalidLength(digits.len()))?;
        if let Some(&bad) = digits.iter().find(|&&d| d > 9) {
            return Err(Error::InvalidDigit(bad));
        }
        self.buf.reserve(6 + digits.len().div_ceil(2));
        self.buf.put_u8(Tag::Decimal as u8);
        self.buf.put_u8(negative as u8);
        self.buf.put_i16(exponent);
        self.buf.put_u16(count);
        for pair in digits.chunks(2) {
            let mut byte = pair[0];
            if let Some(&odd) = pair.get(1) {
                byte |= odd << 4;
            }
            self.buf.put_u8(byte);
        }
        Ok(())
    }

    /// Writes ±Infinity under the SPECIALNUM tag.
    pub fn feed_infinity(&mut self, negative: bool) {
        self.put_special(SPECIAL_INFINITY | negative as u8);
    }

    /// Writes NaN under the SPECIALNUM tag. The flag selects a signaling
    /// NaN; there is no signed NaN in the format.
    pub fn feed_nan(&mut self, signaling: bool) {
        self.put_special(SPECIAL_NAN | signaling as u8);
    }

    /// Writes a DATE atom.
    pub fn feed_date(&mut self, date: Date) {
        self.buf.reserve(5);
        self.buf.put_u8(Tag::Date as u8);
        self.buf.put_u16(date.year);
        self.buf.put_u8(date.month);
        self.buf.put_u8(date.day);
    }

    /// Writes a TIME atom. Microseconds travel as three big-endian bytes.
    pub fn feed_time(&mut self, time: Time) {
        self.buf.reserve(7);
        self.buf.put_u8(Tag::Time as u8);
        self.put_clock(time);
    }

    /// Writes a DATETIME atom.
    pub fn feed_datetime(&mut self, datetime: DateTime) {
        self.buf.reserve(11);
        self.buf.put_u8(Tag::DateTime as u8);
        self.buf.put_u16(datetime.date.year);
        self.buf.put_u8(datetime.date.month);
        self.buf.put_u8(datetime.date.day);
        self.put_clock(datetime.time);
    }

    /// Writes a TIMEDELTA atom: signed days, seconds, and microseconds.
    pub fn feed_timedelta(&mut self, delta: TimeDelta) {
        self.buf.reserve(13);
        self.buf.put_u8(Tag::TimeDelta as u8);
        self.buf.put_i32(delta.days);
        self.buf.put_i32(delta.seconds);
        self.buf.put_i32(delta.microseconds);
    }

    /// Opens a list of `count` elements.
    pub fn open_list(&mut self, count: usize) -> Result<(), Error> {
        self.put_sized(Tag::ShortList, Tag::MedList, Tag::LongList, count, 0)
    }

    /// Opens a tuple of `count` elements.
    pub fn open_tuple(&mut self, count: usize) -> Result<(), Error> {
        self.put_sized(Tag::ShortTuple, Tag::MedTuple, Tag::LongTuple, count, 0)
    }

    /// Opens a set of `count` elements.
    pub fn open_set(&mut self, count: usize) -> Result<(), Error> {
        self.put_sized(Tag::ShortSet, Tag::MedSet, Tag::LongSet, count, 0)
    }

    /// Opens a hash of `count` entries; the caller feeds `2 * count` values
    /// in key, value, key, value order.
    pub fn open_hash(&mut self, count: usize) -> Result<(), Error> {
        self.put_sized(Tag::ShortHash, Tag::MedHash, Tag::LongHash, count, 0)
    }

    /// Compresses the finished payload in place. See [`crate::decompress`]
    /// for the inverse.
    ///
    /// A no-op when the payload is already compressed, too small to pay for
    /// the 5-byte envelope, or when LZF cannot shrink it enough.
    pub fn compress(&mut self) {
        envelope::compress_in_place(&mut self.buf);
    }

    /// Writes the tag for `len`'s size class followed by the length itself,
    /// reserving room for `payload` additional bytes.
    fn put_sized(
        &mut self,
        short: Tag,
        med: Tag,
        long: Tag,
        len: usize,
        payload: usize,
    ) -> Result<(), Error> {
        if len < 256 {
            self.buf.reserve(2 + payload);
            self.buf.put_u8(short as u8);
            self.buf.put_u8(len as u8);
        } else if len < 65536 {
            self.buf.reserve(3 + payload);
            self.buf.put_u8(med as u8);
            self.buf.put_u16(len as u16);
        } else {
            let len32 = u32::try_from(len).map_err(|_| Error::InvalidLength(len))?;
            self.buf.reserve(5 + payload);
            self.buf.put_u8(long as u8);
            self.buf.put_u32(len32);
        }
        Ok(())
    }

    fn put_special(&mut self, flags: u8) {
        self.buf.reserve(2);
        self.buf.put_u8(Tag::SpecialNum as u8);
        self.buf.put_u8(flags);
    }

    /// Hour, minute, second, then the 3-byte microsecond field shared by
    /// TIME and DATETIME.
    fn put_clock(&mut self, time: Time) {
        self.buf.put_u8(time.hour);
        self.buf.put_u8(time.minute);
        self.buf.put_u8(time.second);
        self.buf.put_uint(time.microsecond as u64, 3);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conformity_atoms() {
        let mut enc = Encoder::new();
        enc.feed_null();
        assert_eq!(enc.as_bytes(), &[0x00]);

        let mut enc = Encoder::new();
        enc.feed_bool(true);
        enc.feed_bool(false);
        assert_eq!(enc.as_bytes(), &[0x01, 0x01, 0x01, 0x00]);

        let mut enc = Encoder::new();
        enc.feed_int(42);
        assert_eq!(enc.as_bytes(), &[0x02, 0x2A]);

        let mut enc = Encoder::new();
        enc.feed_float(1.0);
        assert_eq!(
            enc.as_bytes(),
            &[0x07, 0x3F, 0xF0, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]
        );

        let mut enc = Encoder::new();
        enc.feed_string(b"abc").unwrap();
        assert_eq!(enc.as_bytes(), &[0x08, 0x03, 0x61, 0x62, 0x63]);

        let mut enc = Encoder::new();
        enc.feed_utf8("abc").unwrap();
        assert_eq!(enc.as_bytes(), &[0x0A, 0x03, 0x61, 0x62, 0x63]);

        let mut enc = Encoder::new();
        enc.feed_huge(&[0x10, 0xDE, 0xB2]).unwrap();
        assert_eq!(
            enc.as_bytes(),
            &[0x06, 0x00, 0x00, 0x00, 0x03, 0x10, 0xDE, 0xB2]
        );
    }

    #[test]
    fn test_int_size_classes() {
        // Each boundary pair must land in adjacent classes.
        let cases: &[(i64, u8, usize)] = &[
            (0, 0x02, 2),
            (127, 0x02, 2),
            (128, 0x03, 3),
            (-128, 0x02, 2),
            (-129, 0x03, 3),
            (32767, 0x03, 3),
            (32768, 0x04, 5),
            (-32768, 0x03, 3),
            (-32769, 0x04, 5),
            (2147483647, 0x04, 5),
            (2147483648, 0x05, 9),
            (-2147483648, 0x04, 5),
            (-2147483649, 0x05, 9),
            (i64::MAX, 0x05, 9),
            (i64::MIN, 0x05, 9),
        ];
        for &(value, tag, len) in cases {
            let mut enc = Encoder::new();
            enc.feed_int(value);
            assert_eq!(enc.as_bytes()[0], tag, "tag for {value}");
            assert_eq!(enc.len(), len, "length for {value}");
        }
    }

    #[test]
    fn test_negative_short_boundary() {
        let mut enc = Encoder::new();
        enc.feed_int(-129);
        assert_eq!(enc.as_bytes(), &[0x03, 0xFF, 0x7F]);

        let mut enc = Encoder::new();
        enc.feed_int(-128);
        assert_eq!(enc.as_bytes(), &[0x02, 0x80]);
    }

    #[test]
    fn test_string_size_classes() {
        let mut enc = Encoder::new();
        enc.feed_string(&[0x41; 255]).unwrap();
        assert_eq!(enc.as_bytes()[0], 0x08);
        assert_eq!(enc.len(), 2 + 255);

        let mut enc = Encoder::new();
        enc.feed_string(&[0x41; 256]).unwrap();
        assert_eq!(&enc.as_bytes()[..3], &[0x18, 0x01, 0x00]);
        assert_eq!(enc.len(), 3 + 256);

        let mut enc = Encoder::new();
        enc.feed_string(&[0x41; 65536]).unwrap();
        assert_eq!(&enc.as_bytes()[..5], &[0x09, 0x00, 0x01, 0x00, 0x00]);
        assert_eq!(enc.len(), 5 + 65536);
    }

    #[test]
    fn test_medium_string() {
        let mut enc = Encoder::new();
        enc.feed_string(&[0x41; 300]).unwrap();
        assert_eq!(&enc.as_bytes()[..3], &[0x18, 0x01, 0x2C]);
        assert!(enc.as_bytes()[3..].iter().all(|&b| b == 0x41));
    }

    #[test]
    fn test_container_openers() {
        let mut enc = Encoder::new();
        enc.open_list(3).unwrap();
        assert_eq!(enc.as_bytes(), &[0x10, 0x03]);

        let mut enc = Encoder::new();
        enc.open_tuple(300).unwrap();
        assert_eq!(enc.as_bytes(), &[0x15, 0x01, 0x2C]);

        let mut enc = Encoder::new();
        enc.open_set(70000).unwrap();
        assert_eq!(enc.as_bytes(), &[0x0E, 0x00, 0x01, 0x11, 0x70]);

        let mut enc = Encoder::new();
        enc.open_hash(2).unwrap();
        assert_eq!(enc.as_bytes(), &[0x13, 0x02]);
    }

    #[test]
    fn test_decimal_packing() {
        let mut enc = Encoder::new();
        enc.feed_decimal(true, -2, &[1, 2, 3, 4]).unwrap();
        assert_eq!(
            enc.as_bytes(),
            &[0x1E, 0x01, 0xFF, 0xFE, 0x00, 0x04, 0x21, 0x43]
        );

        // Odd digit count leaves the final high nibble zero.
        let mut enc = Encoder::new();
        enc.feed_decimal(false, 0, &[9, 8, 7]).unwrap();
        assert_eq!(
            enc.as_bytes(),
            &[0x1E, 0x00, 0x00, 0x00, 0x00, 0x03, 0x89, 0x07]
        );
    }

    #[test]
    fn test_decimal_rejects_bad_digit() {
        let mut enc = Encoder::new();
        enc.feed_int(7);
        let before = enc.len();
        assert!(matches!(
            enc.feed_decimal(false, 1, &[3, 10, 4]),
            Err(Error::InvalidDigit(10))
        ));
        // Nothing of the rejected atom may remain.
        assert_eq!(enc.len(), before);
    }

    #[test]
    fn test_specialnum_flags() {
        let mut enc = Encoder::new();
        enc.feed_infinity(false);
        enc.feed_infinity(true);
        enc.feed_nan(false);
        enc.feed_nan(true);
        assert_eq!(
            enc.as_bytes(),
            &[0x1F, 0x10, 0x1F, 0x11, 0x1F, 0x20, 0x1F, 0x21]
        );
    }

    #[test]
    fn test_date_conformity() {
        let mut enc = Encoder::new();
        enc.feed_date(Date {
            year: 2024,
            month: 3,
            day: 15,
        });
        assert_eq!(enc.as_bytes(), &[0x1A, 0x07, 0xE8, 0x03, 0x0F]);
    }

    #[test]
    fn test_time_microseconds_three_bytes() {
        let mut enc = Encoder::new();
        enc.feed_time(Time {
            hour: 23,
            minute: 59,
            second: 58,
            microsecond: 999_999,
        });
        // 999999 = 0x0F423F, big-endian across exactly three bytes.
        assert_eq!(enc.as_bytes(), &[0x1B, 0x17, 0x3B, 0x3A, 0x0F, 0x42, 0x3F]);
    }

    #[test]
    fn test_datetime_layout() {
        let mut enc = Encoder::new();
        enc.feed_datetime(DateTime {
            date: Date {
                year: 2024,
                month: 3,
                day: 15,
            },
            time: Time {
                hour: 1,
                minute: 2,
                second: 3,
                microsecond: 256,
            },
        });
        assert_eq!(
            enc.as_bytes(),
            &[0x1C, 0x07, 0xE8, 0x03, 0x0F, 0x01, 0x02, 0x03, 0x00, 0x01, 0x00]
        );
    }

    #[test]
    fn test_timedelta_layout() {
        let mut enc = Encoder::new();
        enc.feed_timedelta(TimeDelta {
            days: 3,
            seconds: 11,
            microseconds: 12345,
        });
        assert_eq!(
            enc.as_bytes(),
            &[
                0x1D, 0x00, 0x00, 0x00, 0x03, 0x00, 0x00, 0x00, 0x0B, 0x00, 0x00, 0x30,
                0x39
            ]
        );

        let mut enc = Encoder::new();
        enc.feed_timedelta(TimeDelta {
            days: -1,
            seconds: 0,
            microseconds: 0,
        });
        assert_eq!(
            enc.as_bytes(),
            &[
                0x1D, 0xFF, 0xFF, 0xFF, 0xFF, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
                0x00
            ]
        );
    }
}
