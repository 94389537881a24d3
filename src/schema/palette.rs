//! Palettes and palette-indexed frames.

use rgb::RGB8;

use crate::error::{Error, Result};

/// Maximum number of colors in a palette.
pub const MAX_PALETTE_SIZE: usize = 256;

/// Pack a color as `0x00RRGGBB`.
#[inline]
pub fn pack_rgb(color: RGB8) -> u32 {
    (color.r as u32) << 16 | (color.g as u32) << 8 | color.b as u32
}

/// Unpack a `0x00RRGGBB` value; the top byte is ignored.
#[inline]
pub fn unpack_rgb(packed: u32) -> RGB8 {
    RGB8::new((packed >> 16) as u8, (packed >> 8) as u8, packed as u8)
}

/// Ordered color table; position is the index used by pixel data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colors: Vec<RGB8>,
}

impl Palette {
    /// Create a palette of 1..=256 colors.
    pub fn new(colors: Vec<RGB8>) -> Result<Self> {
        if colors.is_empty() || colors.len() > MAX_PALETTE_SIZE {
            return Err(Error::invalid(format!(
                "Palette must hold 1..={} colors, got {}",
                MAX_PALETTE_SIZE,
                colors.len()
            )));
        }
        Ok(Self { colors })
    }

    /// Build a palette from packed `0x00RRGGBB` values.
    pub fn from_packed(packed: &[u32]) -> Result<Self> {
        Self::new(packed.iter().map(|&p| unpack_rgb(p)).collect())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Always false: palettes hold at least one color.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<RGB8> {
        self.colors.get(index).copied()
    }

    pub fn colors(&self) -> &[RGB8] {
        &self.colors
    }

    /// Packed `0x00RRGGBB` values in index order.
    pub fn to_packed(&self) -> Vec<u32> {
        self.colors.iter().map(|&c| pack_rgb(c)).collect()
    }

    /// Index of the nearest color by Euclidean RGB distance (lowest index wins ties).
    pub fn nearest(&self, color: RGB8) -> u8 {
        let mut best = 0usize;
        let mut best_dist = u32::MAX;
        for (i, &p) in self.colors.iter().enumerate() {
            let d = distance_sq(color, p);
            if d < best_dist {
                best = i;
                best_dist = d;
                if d == 0 {
                    break;
                }
            }
        }
        best as u8
    }

    /// Bits needed for a GIF color table holding this palette (1..=8).
    pub fn table_bits(&self) -> u8 {
        table_bits(self.colors.len())
    }
}

/// Bits of a GIF color table able to hold `len` entries; tables have at least 2 entries.
pub fn table_bits(len: usize) -> u8 {
    let mut bits = 1u8;
    while (1usize << bits) < len {
        bits += 1;
    }
    bits
}

/// Squared Euclidean distance between two colors.
#[inline]
pub fn distance_sq(a: RGB8, b: RGB8) -> u32 {
    let dr = a.r as i32 - b.r as i32;
    let dg = a.g as i32 - b.g as i32;
    let db = a.b as i32 - b.b as i32;
    (dr * dr + dg * dg + db * db) as u32
}

/// A frame reduced to palette indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuantizedFrame {
    /// `side * side` palette indices, row-major.
    pub indices: Vec<u8>,
    /// Palette referenced by `indices`.
    pub palette: Palette,
}

impl QuantizedFrame {
    /// Pair indices with a palette, checking every index is in range.
    pub fn new(indices: Vec<u8>, palette: Palette) -> Result<Self> {
        let frame = Self { indices, palette };
        frame.check_indices()?;
        Ok(frame)
    }

    /// Verify every index addresses an entry of the palette.
    pub fn check_indices(&self) -> Result<()> {
        let len = self.palette.len();
        if let Some(pos) = self.indices.iter().position(|&i| i as usize >= len) {
            return Err(Error::Encode(format!(
                "Pixel {} has index {} but palette holds {} colors",
                pos, self.indices[pos], len
            )));
        }
        Ok(())
    }
}
