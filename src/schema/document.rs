//! An animated document ready for encoding.

use serde::{Deserialize, Serialize};

use super::QuantizedFrame;
use crate::error::{Error, Result};

/// Largest side length representable in a GIF logical screen.
pub const MAX_SIDE: u32 = u16::MAX as u32;

/// Loop directive written to the NETSCAPE2.0 extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Repeat {
    /// Loop forever.
    #[default]
    Infinite,
    /// Loop the given number of extra times.
    Finite(u16),
}

impl Repeat {
    /// Value stored in the loop extension (0 = infinite).
    pub fn loop_count(self) -> u16 {
        match self {
            Repeat::Infinite => 0,
            Repeat::Finite(n) => n,
        }
    }
}

/// Ordered quantized frames sharing one square side length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    side: u32,
    frames: Vec<QuantizedFrame>,
    delays: Vec<u16>,
    /// Loop directive.
    pub repeat: Repeat,
    /// Palette index rendered transparent; `None` disables transparency.
    pub transparent: Option<u8>,
}

impl Document {
    /// Create a document where every frame is shown for `delay_cs` centiseconds.
    pub fn new(side: u32, frames: Vec<QuantizedFrame>, delay_cs: u16) -> Result<Self> {
        if side == 0 || side > MAX_SIDE {
            return Err(Error::invalid(format!(
                "Side length must be in 1..={}, got {}",
                MAX_SIDE, side
            )));
        }
        if frames.is_empty() {
            return Err(Error::invalid("Document must contain at least one frame"));
        }
        let pixels = side as usize * side as usize;
        for (i, frame) in frames.iter().enumerate() {
            if frame.indices.len() != pixels {
                return Err(Error::invalid(format!(
                    "Frame {} has {} indices, expected {} for side {}",
                    i,
                    frame.indices.len(),
                    pixels,
                    side
                )));
            }
        }
        let delays = vec![delay_cs; frames.len()];
        Ok(Self {
            side,
            frames,
            delays,
            repeat: Repeat::Infinite,
            transparent: None,
        })
    }

    #[inline]
    pub fn side(&self) -> u32 {
        self.side
    }

    pub fn frames(&self) -> &[QuantizedFrame] {
        &self.frames
    }

    #[inline]
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Display delay of frame `index` in centiseconds.
    pub fn delay(&self, index: usize) -> Option<u16> {
        self.delays.get(index).copied()
    }

    /// Per-frame delays in frame order.
    pub fn delays(&self) -> &[u16] {
        &self.delays
    }

    /// Override the display delay of one frame.
    pub fn set_delay(&mut self, index: usize, delay_cs: u16) -> Result<()> {
        let slot = self.delays.get_mut(index).ok_or_else(|| {
            Error::invalid(format!("Frame index {} out of range", index))
        })?;
        *slot = delay_cs;
        Ok(())
    }

    /// Largest palette used by any frame.
    pub fn max_palette_len(&self) -> usize {
        self.frames
            .iter()
            .map(|f| f.palette.len())
            .max()
            .unwrap_or(0)
    }
}
