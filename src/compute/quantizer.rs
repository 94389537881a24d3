//! Frame quantizer - resample, build a palette, map pixels to indices.

use std::collections::HashMap;

use rayon::prelude::*;
use rgb::RGB8;

use super::{Histogram, median_cut, resample};
use crate::error::{Result, try_zeroed};
use crate::schema::{Frame, FrameBatch, Palette, PaletteMode, QuantizeConfig, QuantizedFrame};

/// Reduces raw RGBA frames to square, palette-indexed frames.
#[derive(Debug, Clone)]
pub struct FrameQuantizer {
    config: QuantizeConfig,
}

impl FrameQuantizer {
    /// Create a quantizer, validating the configuration.
    pub fn new(config: QuantizeConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &QuantizeConfig {
        &self.config
    }

    #[inline]
    pub fn target_side(&self) -> u32 {
        self.config.target_side
    }

    /// Quantize one frame with its own palette.
    pub fn quantize_frame(&self, frame: &Frame) -> Result<QuantizedFrame> {
        let pixels = resample(frame, self.config.target_side, self.config.filter)?;
        let palette = self.build_palette(&Histogram::from_pixels(&pixels))?;
        map_indices(&pixels, palette)
    }

    /// Quantize every frame of a batch.
    ///
    /// Frames are processed on the rayon pool. The first failure aborts the
    /// whole batch and no frames are returned.
    pub fn quantize_batch(&self, batch: &FrameBatch) -> Result<Vec<QuantizedFrame>> {
        log::debug!(
            "Quantizing {} frames {}x{} -> {}^2, {} colors ({:?})",
            batch.len(),
            batch.width(),
            batch.height(),
            self.config.target_side,
            self.config.palette_size,
            self.config.palette_mode
        );

        match self.config.palette_mode {
            PaletteMode::PerFrame => batch
                .frames()
                .par_iter()
                .map(|frame| self.quantize_frame(frame))
                .collect(),
            PaletteMode::Global => {
                let resampled = batch
                    .frames()
                    .par_iter()
                    .map(|frame| resample(frame, self.config.target_side, self.config.filter))
                    .collect::<Result<Vec<_>>>()?;

                let hist = resampled
                    .par_iter()
                    .map(|pixels| Histogram::from_pixels(pixels))
                    .reduce(Histogram::new, |mut a, b| {
                        a.merge(&b);
                        a
                    });
                let palette = self.build_palette(&hist)?;

                resampled
                    .par_iter()
                    .map(|pixels| map_indices(pixels, palette.clone()))
                    .collect()
            }
        }
    }

    fn build_palette(&self, hist: &Histogram) -> Result<Palette> {
        Palette::new(median_cut(hist, self.config.palette_size as usize))
    }
}

/// Map resampled pixels to their nearest palette entries.
fn map_indices(pixels: &[RGB8], palette: Palette) -> Result<QuantizedFrame> {
    let mut indices = try_zeroed::<u8>(pixels.len())?;
    let mut cache: HashMap<RGB8, u8> = HashMap::with_capacity(palette.len() * 4);
    for (slot, &p) in indices.iter_mut().zip(pixels) {
        *slot = *cache.entry(p).or_insert_with(|| palette.nearest(p));
    }
    QuantizedFrame::new(indices, palette)
}
