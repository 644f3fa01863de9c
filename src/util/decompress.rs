//! Transparent gzip decompression.
//!
//! Most SVF resources arrive gzip-compressed; some (notably inner pack
//! buffers that were already inflated by the transport) do not. Decoders
//! call [`decompress_if_gzip`] before any structural parse and never care
//! which case they got.

use std::borrow::Cow;
use std::io::Read;

use flate2::read::GzDecoder;

use super::Result;

/// Two-byte gzip member magic.
pub const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Check whether a buffer starts with the gzip magic.
#[inline]
pub fn is_gzip(buffer: &[u8]) -> bool {
    buffer.len() >= 2 && buffer[0] == GZIP_MAGIC[0] && buffer[1] == GZIP_MAGIC[1]
}

/// Decompress `buffer` if it is gzip-framed, otherwise return it as-is.
pub fn decompress_if_gzip(buffer: &[u8]) -> Result<Cow<'_, [u8]>> {
    if !is_gzip(buffer) {
        return Ok(Cow::Borrowed(buffer));
    }
    let mut decoder = GzDecoder::new(buffer);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out)?;
    Ok(Cow::Owned(out))
}
