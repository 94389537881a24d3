//! Square resampling of RGBA frames.
//!
//! Output pixel `(ox, oy)` covers the source span
//! `[ox * w / side, (ox + 1) * w / side)` horizontally (same vertically),
//! widened to at least one pixel. With `Area` every covered pixel is averaged
//! (rounded); with `Nearest` the first covered pixel is taken. When upsampling
//! both filters replicate the nearest source pixel. Alpha is discarded.

use rgb::RGB8;

use crate::error::{Result, try_zeroed};
use crate::schema::{CHANNELS, Frame, ResampleFilter};

/// Source span `[start, end)` covered by output coordinate `o`.
#[inline]
fn span(o: usize, src: usize, side: usize) -> (usize, usize) {
    let start = o * src / side;
    let end = ((o + 1) * src / side).max(start + 1).min(src);
    (start, end)
}

/// Resample a frame to `side x side` RGB pixels.
pub fn resample(frame: &Frame, side: u32, filter: ResampleFilter) -> Result<Vec<RGB8>> {
    let side = side as usize;
    let mut out = try_zeroed::<RGB8>(side * side)?;
    resample_into(frame, side, filter, &mut out);
    Ok(out)
}

/// Resample into a pre-allocated `side * side` buffer.
pub fn resample_into(frame: &Frame, side: usize, filter: ResampleFilter, out: &mut [RGB8]) {
    let width = frame.width() as usize;
    let height = frame.height() as usize;
    let pixels = frame.pixels();
    let stride = width * CHANNELS as usize;

    let x_spans: Vec<(usize, usize)> = (0..side).map(|o| span(o, width, side)).collect();

    for (oy, row) in out.chunks_exact_mut(side).enumerate() {
        let (y0, y1) = span(oy, height, side);
        for (cell, &(x0, x1)) in row.iter_mut().zip(x_spans.iter()) {
            *cell = match filter {
                ResampleFilter::Nearest => {
                    let i = y0 * stride + x0 * CHANNELS as usize;
                    RGB8::new(pixels[i], pixels[i + 1], pixels[i + 2])
                }
                ResampleFilter::Area => {
                    let (mut r, mut g, mut b) = (0u64, 0u64, 0u64);
                    for y in y0..y1 {
                        let line = &pixels[y * stride + x0 * 4..y * stride + x1 * 4];
                        for px in line.chunks_exact(4) {
                            r += px[0] as u64;
                            g += px[1] as u64;
                            b += px[2] as u64;
                        }
                    }
                    let n = ((y1 - y0) * (x1 - x0)) as u64;
                    RGB8::new(
                        ((r + n / 2) / n) as u8,
                        ((g + n / 2) / n) as u8,
                        ((b + n / 2) / n) as u8,
                    )
                }
            };
        }
    }
}
