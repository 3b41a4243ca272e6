//! A materialized value tree over the full type alphabet.
//!
//! The typed readers and writers never build a tree; this layer does, for
//! callers that want whole payloads in and out rather than driving the
//! cursor themselves. Byte and text payloads borrow from the source on
//! decode, so a tree is cheap to build and lives as long as the payload.

use std::borrow::Cow;
use std::str::from_utf8;

use crate::decode::Decoder;
use crate::encode::Encoder;
use crate::error::Error;
use crate::tag::Tag;
use crate::types::{Date, DateTime, Decimal, Special, Time, TimeDelta};

/// Deepest container nesting the tree decoder will follow. Beyond this a
/// payload is assumed hostile; the typed readers have no such limit because
/// they never recurse.
const MAX_DEPTH: usize = 128;

/// One value of any encodable type.
///
/// Sets and hashes keep wire order in a `Vec`: several member types
/// (floats among them) fit no standard ordering or hashing, and the codec
/// has no opinion on the host's collection semantics.
#[derive(Debug, Clone, PartialEq)]
pub enum Value<'a> {
    Null,
    Bool(bool),
    Int(i64),
    /// Arbitrary-precision integer as big-endian two's-complement bytes.
    Huge(Cow<'a, [u8]>),
    Float(f64),
    Bytes(Cow<'a, [u8]>),
    Text(Cow<'a, str>),
    Decimal(Decimal),
    Special(Special),
    Date(Date),
    Time(Time),
    DateTime(DateTime),
    TimeDelta(TimeDelta),
    List(Vec<Value<'a>>),
    Tuple(Vec<Value<'a>>),
    Set(Vec<Value<'a>>),
    Hash(Vec<(Value<'a>, Value<'a>)>),
}

impl<'a> Value<'a> {
    /// Appends this value (and all its children, in order) to `enc`.
    pub fn encode(&self, enc: &mut Encoder) -> Result<(), Error> {
        match self {
            Value::Null => enc.feed_null(),
            Value::Bool(v) => enc.feed_bool(*v),
            Value::Int(v) => enc.feed_int(*v),
            Value::Huge(v) => enc.feed_huge(v)?,
            Value::Float(v) => enc.feed_float(*v),
            Value::Bytes(v) => enc.feed_string(v)?,
            Value::Text(v) => enc.feed_utf8(v)?,
            Value::Decimal(d) => enc.feed_decimal(d.negative, d.exponent, &d.digits)?,
            Value::Special(Special::Infinity { negative }) => enc.feed_infinity(*negative),
            Value::Special(Special::Nan { signaling }) => enc.feed_nan(*signaling),
            Value::Date(d) => enc.feed_date(*d),
            Value::Time(t) => enc.feed_time(*t),
            Value::DateTime(dt) => enc.feed_datetime(*dt),
            Value::TimeDelta(td) => enc.feed_timedelta(*td),
            Value::List(items) => {
                enc.open_list(items.len())?;
                for item in items {
                    item.encode(enc)?;
                }
            }
            Value::Tuple(items) => {
                enc.open_tuple(items.len())?;
                for item in items {
                    item.encode(enc)?;
                }
            }
            Value::Set(items) => {
                enc.open_set(items.len())?;
                for item in items {
                    item.encode(enc)?;
                }
            }
            Value::Hash(entries) => {
                enc.open_hash(entries.len())?;
                for (key, value) in entries {
                    key.encode(enc)?;
                    value.encode(enc)?;
                }
            }
        }
        Ok(())
    }

    /// Encodes this value into a fresh payload.
    pub fn to_payload(&self) -> Result<bytes::Bytes, Error> {
        let mut enc = Encoder::new();
        self.encode(&mut enc)?;
        Ok(enc.into_bytes())
    }

    /// Decodes the next value, containers and all, from `dec`.
    pub fn decode(dec: &mut Decoder<'a>) -> Result<Self, Error> {
        Self::decode_at(dec, 0)
    }

    fn decode_at(dec: &mut Decoder<'a>, depth: usize) -> Result<Self, Error> {
        let tag = dec.peek_tag()?;
        match tag {
            Tag::Null => {
                dec.read_null()?;
                Ok(Value::Null)
            }
            Tag::Bool => Ok(Value::Bool(dec.read_bool()?)),
            Tag::Char | Tag::Short | Tag::Int | Tag::Long => Ok(Value::Int(dec.read_int()?)),
            Tag::Huge => Ok(Value::Huge(Cow::Borrowed(dec.point_to_huge()?))),
            Tag::Float => Ok(Value::Float(dec.read_float()?)),
            Tag::ShortStr | Tag::MedStr | Tag::LongStr => {
                Ok(Value::Bytes(Cow::Borrowed(dec.point_to_string()?)))
            }
            Tag::ShortUtf8 | Tag::MedUtf8 | Tag::LongUtf8 => {
                // Validate before committing the cursor so a bad payload
                // leaves the decoder where it was.
                let mut probe = *dec;
                let text = from_utf8(probe.point_to_utf8()?)?;
                *dec = probe;
                Ok(Value::Text(Cow::Borrowed(text)))
            }
            Tag::Decimal => Ok(Value::Decimal(dec.read_decimal()?)),
            Tag::SpecialNum => Ok(Value::Special(dec.read_specialnum()?)),
            Tag::Date => Ok(Value::Date(dec.read_date()?)),
            Tag::Time => Ok(Value::Time(dec.read_time()?)),
            Tag::DateTime => Ok(Value::DateTime(dec.read_datetime()?)),
            Tag::TimeDelta => Ok(Value::TimeDelta(dec.read_timedelta()?)),
            _ => Self::decode_container(dec, tag, depth),
        }
    }

    fn decode_container(dec: &mut Decoder<'a>, tag: Tag, depth: usize) -> Result<Self, Error> {
        if depth >= MAX_DEPTH {
            return Err(Error::DepthLimit);
        }
        let count = dec.container_size()?;

        // Every child costs at least one byte, so a count the remaining
        // bytes cannot cover is rejected before any allocation.
        let floor = if tag.is_hash() {
            count.checked_mul(2).ok_or(Error::EndOfBuffer)?
        } else {
            count
        };
        if floor > dec.remaining() {
            return Err(Error::EndOfBuffer);
        }

        if tag.is_hash() {
            let mut entries = Vec::with_capacity(count);
            for _ in 0..count {
                let key = Self::decode_at(dec, depth + 1)?;
                let value = Self::decode_at(dec, depth + 1)?;
                entries.push((key, value));
            }
            return Ok(Value::Hash(entries));
        }

        let mut items = Vec::with_capacity(count);
        for _ in 0..count {
            items.push(Self::decode_at(dec, depth + 1)?);
        }
        Ok(match tag {
            Tag::ShortList | Tag::MedList | Tag::LongList => Value::List(items),
            Tag::ShortTuple | Tag::MedTuple | Tag::LongTuple => Value::Tuple(items),
            _ => Value::Set(items),
        })
    }
}
