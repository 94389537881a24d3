//! Upper bounds on encoder output size.

use super::lzw::MAX_SUB_BLOCK;
use crate::error::{Error, Result};
use crate::schema::{CHANNELS, Document, MAX_PALETTE_SIZE, MAX_SIDE, table_bits};

/// Signature + logical screen descriptor.
const HEADER_BYTES: usize = 6 + 7;
/// NETSCAPE2.0 application extension.
const LOOP_EXTENSION_BYTES: usize = 19;
const TRAILER_BYTES: usize = 1;
/// Graphic control extension + image descriptor.
const FRAME_BLOCK_BYTES: usize = 8 + 10;

/// Fewest data codes between two dictionary resets (largest clear code is 256).
const CODES_PER_RESET: usize = 4096 - 258;

/// Upper bound on the encoded size of `frame_count` frames of `side x side`
/// pixels with palettes of at most `palette_size` colors.
///
/// Assumes a full local color table on every frame and one 12-bit code per
/// pixel, plus clear and end codes and sub-block framing.
pub fn estimate_output_size(frame_count: usize, side: u32, palette_size: usize) -> Result<usize> {
    if frame_count == 0 {
        return Err(Error::invalid("Frame count must be non-zero"));
    }
    if side == 0 || side > MAX_SIDE {
        return Err(Error::invalid(format!(
            "Side length must be in 1..={}, got {}",
            MAX_SIDE, side
        )));
    }
    if palette_size == 0 || palette_size > MAX_PALETTE_SIZE {
        return Err(Error::invalid(format!(
            "Palette size must be in 1..={}, got {}",
            MAX_PALETTE_SIZE, palette_size
        )));
    }

    let table = 3 * (1usize << table_bits(palette_size));
    let pixels = side as usize * side as usize;

    let overflow = || Error::invalid("Estimated output size overflows");
    let per_frame = FRAME_BLOCK_BYTES + table + lzw_bound(pixels).ok_or_else(overflow)?;
    per_frame
        .checked_mul(frame_count)
        .and_then(|n| n.checked_add(HEADER_BYTES + table + LOOP_EXTENSION_BYTES + TRAILER_BYTES))
        .ok_or_else(overflow)
}

/// Bound for a concrete document.
pub fn estimate_document_size(doc: &Document) -> Result<usize> {
    estimate_output_size(doc.frame_count(), doc.side(), doc.max_palette_len())
}

/// Worst-case image data size for `pixels` indices: code size byte,
/// packed codes, sub-block length bytes and the terminator.
fn lzw_bound(pixels: usize) -> Option<usize> {
    // One code per pixel, a clear code per reset, the opening clear and the end code.
    let codes = pixels.checked_add(pixels.div_ceil(CODES_PER_RESET))?.checked_add(3)?;
    let data = codes.checked_mul(12)?.div_ceil(8);
    data.checked_add(data.div_ceil(MAX_SUB_BLOCK))?.checked_add(2)
}

/// Check that a caller buffer can hold `capacity` bytes.
#[inline]
pub fn validate_buffer(buffer: &[u8], capacity: usize) -> bool {
    buffer.len() >= capacity
}

/// Size of a contiguous raw RGBA buffer holding `frame_count` frames.
pub fn raw_buffer_size(width: u32, height: u32, frame_count: usize) -> Result<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(CHANNELS as usize))
        .and_then(|n| n.checked_mul(frame_count))
        .ok_or_else(|| Error::invalid("Raw buffer size overflows"))
}
