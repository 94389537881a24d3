//! Frame sources for pipeline runs: synthetic patterns or stored batches.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::{ConfigError, Frame, FrameBatch, frame_len};
use crate::error::Result;

/// Where a pipeline run reads its raw frames from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FrameSource {
    /// Diagonal color gradient that shifts with each frame.
    Gradient {
        frames: usize,
        width: u32,
        height: u32,
    },
    /// Deterministic per-pixel noise.
    Noise {
        frames: usize,
        width: u32,
        height: u32,
        /// Random seed.
        seed: u64,
    },
    /// Every pixel of every frame set to one color.
    Solid {
        frames: usize,
        width: u32,
        height: u32,
        color: [u8; 3],
    },
    /// Replay a batch previously written by the frame store.
    Batch { path: PathBuf },
}

impl Default for FrameSource {
    fn default() -> Self {
        FrameSource::Gradient {
            frames: 16,
            width: 256,
            height: 256,
        }
    }
}

impl FrameSource {
    /// Check dimensions of synthetic sources.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        let (frames, width, height) = match self {
            FrameSource::Gradient {
                frames,
                width,
                height,
            }
            | FrameSource::Noise {
                frames,
                width,
                height,
                ..
            }
            | FrameSource::Solid {
                frames,
                width,
                height,
                ..
            } => (*frames, *width, *height),
            FrameSource::Batch { .. } => return Ok(()),
        };
        if frames == 0 {
            return Err(ConfigError::InvalidFrameCount);
        }
        if width == 0 || height == 0 {
            return Err(ConfigError::InvalidDimensions);
        }
        Ok(())
    }

    /// Produce the frames described by this source.
    pub fn generate(&self) -> Result<FrameBatch> {
        self.validate()?;
        match self {
            FrameSource::Gradient {
                frames,
                width,
                height,
            } => collect(*frames, |i| gradient_frame(*width, *height, i)),
            FrameSource::Noise {
                frames,
                width,
                height,
                seed,
            } => {
                let mut state = *seed;
                collect(*frames, |_| noise_frame(*width, *height, &mut state))
            }
            FrameSource::Solid {
                frames,
                width,
                height,
                color,
            } => collect(*frames, |_| solid_frame(*width, *height, *color)),
            FrameSource::Batch { path } => {
                let mut reader = crate::storage::open_reader(path)?;
                let batch = reader.read_batch()?;
                reader.close_reader()?;
                Ok(batch)
            }
        }
    }
}

fn collect<F>(count: usize, mut make: F) -> Result<FrameBatch>
where
    F: FnMut(usize) -> Result<Frame>,
{
    let frames = (0..count).map(&mut make).collect::<Result<Vec<_>>>()?;
    FrameBatch::new(frames)
}

/// Gradient frame: red follows x, green follows y, blue tracks the frame number.
pub fn gradient_frame(width: u32, height: u32, frame_index: usize) -> Result<Frame> {
    let mut pixels = Vec::with_capacity(frame_len(width, height)?);
    let span_x = (width - 1).max(1) as usize;
    let span_y = (height - 1).max(1) as usize;
    let shift = frame_index * 37;
    for y in 0..height as usize {
        for x in 0..width as usize {
            pixels.push((x * 255 / span_x + shift) as u8);
            pixels.push((y * 255 / span_y + shift / 2) as u8);
            pixels.push((frame_index * 61 + (x + y) / 4) as u8);
            pixels.push(255);
        }
    }
    Frame::new(width, height, pixels)
}

fn noise_frame(width: u32, height: u32, state: &mut u64) -> Result<Frame> {
    // Simple LCG PRNG for deterministic noise
    let mut next = || {
        *state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
        (*state >> 33) as u8
    };
    let len = frame_len(width, height)?;
    let mut pixels = Vec::with_capacity(len);
    for _ in 0..len / 4 {
        pixels.extend_from_slice(&[next(), next(), next(), 255]);
    }
    Frame::new(width, height, pixels)
}

fn solid_frame(width: u32, height: u32, color: [u8; 3]) -> Result<Frame> {
    let len = frame_len(width, height)?;
    let pixels = [color[0], color[1], color[2], 255]
        .iter()
        .copied()
        .cycle()
        .take(len)
        .collect();
    Frame::new(width, height, pixels)
}
