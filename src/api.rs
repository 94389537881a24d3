//! Flat, buffer-oriented entry points.
//!
//! These mirror a C-style calling convention: frames and palettes travel as
//! contiguous slices, palettes as packed `0x00RRGGBB` integers, and results
//! can be reduced to a signed status code with [`status`].

use crate::compute::FrameQuantizer;
use crate::encode::encode_into;
use crate::error::{Error, Result, try_zeroed};
use crate::schema::{
    Document, Frame, FrameBatch, MAX_PALETTE_SIZE, Palette, QuantizeConfig, QuantizedFrame,
};

pub use crate::encode::{estimate_output_size, validate_buffer};

/// Status code of a successful call.
pub const STATUS_OK: i32 = 0;

/// Reduce a result to `0` or the error's negative status code.
pub fn status<T>(result: &Result<T>) -> i32 {
    match result {
        Ok(_) => STATUS_OK,
        Err(e) => e.status_code(),
    }
}

/// Quantized frames in flat layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuantizedBatch {
    /// `frame_count * side * side` indices, frame-major.
    pub indices: Vec<u8>,
    /// `frame_count * palette_size` packed colors; unused slots are zero.
    pub palettes: Vec<u32>,
    pub side: u32,
    pub palette_size: usize,
}

impl QuantizedBatch {
    pub fn frame_count(&self) -> usize {
        self.palettes.len() / self.palette_size
    }
}

fn quantizer_for(target_side: u32, palette_size: usize) -> Result<FrameQuantizer> {
    let size = u16::try_from(palette_size)
        .map_err(|_| Error::invalid(format!("Palette size {} out of range", palette_size)))?;
    FrameQuantizer::new(QuantizeConfig::new(target_side, size))
}

fn batch_from_slices(frames: &[&[u8]], width: u32, height: u32) -> Result<FrameBatch> {
    let frames = frames
        .iter()
        .map(|pixels| Frame::from_slice(width, height, pixels))
        .collect::<Result<Vec<_>>>()?;
    FrameBatch::new(frames)
}

/// Quantize `frames` (each `width * height * 4` RGBA bytes) to
/// `target_side^2` indices and a palette of at most `palette_size` colors.
pub fn quantize_batch(
    frames: &[&[u8]],
    width: u32,
    height: u32,
    target_side: u32,
    palette_size: usize,
) -> Result<QuantizedBatch> {
    let quantizer = quantizer_for(target_side, palette_size)?;
    let batch = batch_from_slices(frames, width, height)?;
    let quantized = quantizer.quantize_batch(&batch)?;

    let pixels = target_side as usize * target_side as usize;
    let mut indices = try_zeroed::<u8>(quantized.len() * pixels)?;
    let mut palettes = try_zeroed::<u32>(quantized.len() * palette_size)?;
    flatten(&quantized, pixels, palette_size, &mut indices, &mut palettes);

    Ok(QuantizedBatch {
        indices,
        palettes,
        side: target_side,
        palette_size,
    })
}

/// Like [`quantize_batch`], writing into caller-provided buffers.
///
/// `out_indices` must hold `frames.len() * target_side^2` bytes and
/// `out_palettes` exactly `frames.len() * palette_size` entries. Nothing is
/// written on failure.
pub fn quantize_batch_into(
    frames: &[&[u8]],
    width: u32,
    height: u32,
    target_side: u32,
    palette_size: usize,
    out_indices: &mut [u8],
    out_palettes: &mut [u32],
) -> Result<()> {
    let quantizer = quantizer_for(target_side, palette_size)?;
    let pixels = target_side as usize * target_side as usize;
    if out_indices.len() != frames.len() * pixels {
        return Err(Error::invalid(format!(
            "Index buffer holds {} bytes, need {}",
            out_indices.len(),
            frames.len() * pixels
        )));
    }
    if out_palettes.len() != frames.len() * palette_size {
        return Err(Error::invalid(format!(
            "Palette buffer holds {} entries, need {}",
            out_palettes.len(),
            frames.len() * palette_size
        )));
    }

    let batch = batch_from_slices(frames, width, height)?;
    let quantized = quantizer.quantize_batch(&batch)?;
    out_palettes.fill(0);
    flatten(&quantized, pixels, palette_size, out_indices, out_palettes);
    Ok(())
}

fn flatten(
    quantized: &[QuantizedFrame],
    pixels: usize,
    palette_size: usize,
    indices: &mut [u8],
    palettes: &mut [u32],
) {
    for ((frame, idx), pal) in quantized
        .iter()
        .zip(indices.chunks_exact_mut(pixels))
        .zip(palettes.chunks_exact_mut(palette_size))
    {
        idx.copy_from_slice(&frame.indices);
        for (slot, packed) in pal.iter_mut().zip(frame.palette.to_packed()) {
            *slot = packed;
        }
    }
}

/// Encode flat quantized frames as an animated GIF into `out`.
///
/// `indices` holds `frame_count * side^2` bytes; `palettes` holds
/// `frame_count` equally sized packed palettes. Returns bytes written.
pub fn encode_document(
    indices: &[u8],
    palettes: &[u32],
    frame_count: usize,
    side: u32,
    delay_cs: u16,
    out: &mut [u8],
) -> Result<usize> {
    let doc = document_from_flat(indices, palettes, frame_count, side, delay_cs)?;
    encode_into(&doc, out)
}

/// Build a document from the flat layout produced by [`quantize_batch`].
pub fn document_from_flat(
    indices: &[u8],
    palettes: &[u32],
    frame_count: usize,
    side: u32,
    delay_cs: u16,
) -> Result<Document> {
    if frame_count == 0 {
        return Err(Error::invalid("Frame count must be non-zero"));
    }
    if side == 0 {
        return Err(Error::invalid("Side length must be non-zero"));
    }
    let pixels = side as usize * side as usize;
    if indices.len() != frame_count * pixels {
        return Err(Error::invalid(format!(
            "Index buffer holds {} bytes, expected {} for {} frames of {}x{}",
            indices.len(),
            frame_count * pixels,
            frame_count,
            side,
            side
        )));
    }
    if palettes.len() % frame_count != 0 {
        return Err(Error::invalid(format!(
            "Palette buffer of {} entries does not split into {} palettes",
            palettes.len(),
            frame_count
        )));
    }
    let palette_size = palettes.len() / frame_count;
    if palette_size == 0 || palette_size > MAX_PALETTE_SIZE {
        return Err(Error::invalid(format!(
            "Palette size must be in 1..={}, got {}",
            MAX_PALETTE_SIZE, palette_size
        )));
    }

    let frames = indices
        .chunks_exact(pixels)
        .zip(palettes.chunks_exact(palette_size))
        .map(|(idx, pal)| {
            Ok(QuantizedFrame {
                indices: idx.to_vec(),
                palette: Palette::from_packed(pal)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Document::new(side, frames, delay_cs)
}
