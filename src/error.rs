//! Error type shared by the encoder, decoder, and compression envelope.

use thiserror::Error;

/// Failures surfaced by encode, decode, and envelope operations.
///
/// Decode errors never move the cursor: after an `Err`, the decoder is
/// positioned exactly where it was before the call. Encode errors never
/// leave a partial atom in the buffer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The buffer ended before the current value's bytes did.
    #[error("end of buffer")]
    EndOfBuffer,

    /// The tag byte is not valid for the requested operation.
    #[error("unexpected tag {0:#04x}")]
    UnexpectedTag(u8),

    /// The caller's destination is smaller than the value. Carries the true
    /// payload length so the caller can retry with a larger destination.
    #[error("destination too small for {0}-byte value")]
    Truncated(usize),

    /// A decimal digit outside `0..=9`.
    #[error("invalid decimal digit {0}")]
    InvalidDigit(u8),

    /// A length or element count too large for its wire field.
    #[error("length {0} does not fit the wire format")]
    InvalidLength(usize),

    /// A SPECIALNUM flags byte with an unknown class nibble.
    #[error("invalid special-number flags {0:#04x}")]
    InvalidSpecial(u8),

    /// The compressed stream would expand past its declared size.
    #[error("compressed payload larger than declared")]
    CompressionOverflow,

    /// The compressed stream is unreadable or produced the wrong size.
    #[error("corrupt compressed payload")]
    CompressionCorrupt,

    /// Could not allocate room for a decompressed payload.
    #[error("allocation failed")]
    OutOfMemory,

    /// A text payload failed UTF-8 validation.
    #[error("invalid utf-8 in text payload")]
    InvalidUtf8(#[from] core::str::Utf8Error),

    /// Container nesting deeper than the tree decoder allows.
    #[error("container nesting too deep")]
    DepthLimit,
}

impl From<std::collections::TryReserveError> for Error {
    fn from(_: std::collections::TryReserveError) -> Self {
        Error::OutOfMemory
    }
}
