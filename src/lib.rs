//! Compact, self-describing binary serialization with an optional LZF
//! compression pass.
//!
//! # Overview
//!
//! Every value travels as a single tag byte followed by a payload. Tags are
//! size-adaptive: integers take the narrowest of four signed widths, and
//! strings and containers pick a 1-, 2-, or 4-byte length prefix by
//! magnitude, so small values stay small. All multi-byte fields are
//! big-endian. A finished payload can optionally be wrapped whole in an LZF
//! envelope, signaled by the high bit of its first byte.
//!
//! The [`Encoder`] appends typed atoms and container headers to a growable
//! buffer; the [`Decoder`] walks a borrowed payload, with zero-copy
//! `point_to_*` readers alongside copying `read_*` ones. [`Value`] sits on
//! top for callers that want whole trees in and out.
//!
//! Decoding is safe against truncated or malformed input: every reader
//! bounds-checks before it advances and fails without moving the cursor.
//!
//! # Example
//!
//! ```
//! use mummy::{decompress, Decoder, Encoder};
//!
//! // [1, "a", null], then an optional compression pass.
//! let mut enc = Encoder::new();
//! enc.open_list(3).unwrap();
//! enc.feed_int(1);
//! enc.feed_utf8("a").unwrap();
//! enc.feed_null();
//! enc.compress();
//! let payload = enc.into_bytes();
//!
//! // Decode transparently, whether or not the pass kicked in.
//! let expanded = decompress(&payload).unwrap();
//! let mut dec = Decoder::new(&expanded);
//! assert_eq!(dec.container_size().unwrap(), 3);
//! assert_eq!(dec.read_int().unwrap(), 1);
//! assert_eq!(dec.point_to_utf8().unwrap(), b"a");
//! dec.read_null().unwrap();
//! assert_eq!(dec.remaining(), 0);
//! ```

pub mod decode;
pub mod encode;
pub mod envelope;
pub mod error;
pub mod tag;
pub mod types;
pub mod value;

pub use decode::Decoder;
pub use encode::Encoder;
pub use envelope::{decompress, is_compressed};
pub use error::Error;
pub use tag::Tag;
pub use types::{Date, DateTime, Decimal, Special, Time, TimeDelta};
pub use value::Value;
