//! The LZF compression envelope.
//!
//! A finished payload may be wrapped as a whole: the first byte keeps its
//! tag with the high bit set, a 4-byte big-endian field records the
//! uncompressed length of everything after the tag, and the LZF stream of
//! those bytes follows. Containers are never compressed individually.
//!
//! The pass is strictly opt-in on encode and transparent on decode:
//! [`decompress`] probes the high bit and passes uncompressed payloads
//! through untouched.

use std::borrow::Cow;

use bytes::{BufMut, BytesMut};

use crate::error::Error;
use crate::tag::COMPRESSED;

/// Envelope overhead: the surviving tag byte plus the length field.
const HEADER: usize = 5;

/// Payloads at or under this size can never repay the envelope overhead.
const MIN_PAYLOAD: usize = 6;

/// Compresses `buf` in place, replacing it with the envelope form when LZF
/// saves at least [`HEADER`] bytes on the post-tag region. Otherwise leaves
/// the payload untouched.
pub(crate) fn compress_in_place(buf: &mut BytesMut) {
    if buf.len() <= MIN_PAYLOAD {
        return;
    }
    if buf[0] & COMPRESSED != 0 {
        return;
    }
    if buf.len() - 1 > u32::MAX as usize {
        return;
    }
    let body = match lzf::compress(&buf[1..]) {
        Ok(body) => body,
        // Incompressible input is not an error; the payload simply stays raw.
        Err(_) => return,
    };
    if body.len() > buf.len() - MIN_PAYLOAD {
        return;
    }
    let mut out = BytesMut::with_capacity(HEADER + body.len());
    out.put_u8(buf[0] | COMPRESSED);
    out.put_u32((buf.len() - 1) as u32);
    out.put_slice(&body);
    *buf = out;
}

/// Whether the payload's first byte carries the compression bit.
pub fn is_compressed(payload: &[u8]) -> bool {
    payload.first().is_some_and(|byte| byte & COMPRESSED != 0)
}

/// Undoes [`crate::Encoder::compress`].
///
/// Payloads without the compression bit pass through as `Cow::Borrowed`;
/// compressed payloads expand into a fresh `Cow::Owned` allocation whose
/// first byte is the original tag with the bit cleared. The variant is the
/// signal for whether decompression actually ran.
///
/// A stream that would outgrow its declared size fails with
/// `CompressionOverflow`; unreadable input or a size mismatch fails with
/// `CompressionCorrupt`.
pub fn decompress(payload: &[u8]) -> Result<Cow<'_, [u8]>, Error> {
    if payload.is_empty() {
        return Err(Error::EndOfBuffer);
    }
    if payload[0] & COMPRESSED == 0 {
        return Ok(Cow::Borrowed(payload));
    }
    if payload.len() < HEADER {
        return Err(Error::EndOfBuffer);
    }
    let declared =
        u32::from_be_bytes([payload[1], payload[2], payload[3], payload[4]]) as usize;
    let body = lzf::decompress(&payload[HEADER..], declared).map_err(|e| match e {
        lzf::LzfError::BufferTooSmall => Error::CompressionOverflow,
        _ => Error::CompressionCorrupt,
    })?;
    if body.len() != declared {
        return Err(Error::CompressionCorrupt);
    }
    let mut out = Vec::new();
    out.try_reserve_exact(declared + 1)?;
    out.push(payload[0] & !COMPRESSED);
    out.extend_from_slice(&body);
    Ok(Cow::Owned(out))
}
