//! Variable-width LZW compression in GIF flavor.
//!
//! Codes are packed LSB-first and split into length-prefixed sub-blocks of at
//! most 255 bytes, terminated by an empty block. Code width starts at
//! `min_code_size + 1` and grows up to 12 bits; once all 4096 codes are taken
//! a clear code resets the dictionary.

use std::collections::HashMap;

use super::sink::SliceWriter;
use crate::error::{Error, Result};

/// Number of codes a GIF LZW dictionary can hold.
const DICT_CAPACITY: u16 = 4096;

/// Widest code in bits.
const MAX_CODE_WIDTH: u8 = 12;

/// Largest payload of a data sub-block.
pub const MAX_SUB_BLOCK: usize = 255;

/// Minimum code size for a color table of `2^table_bits` entries.
#[inline]
pub fn min_code_size(table_bits: u8) -> u8 {
    table_bits.max(2)
}

/// Packs codes into sub-blocks.
struct BlockPacker<'w, 'a> {
    out: &'w mut SliceWriter<'a>,
    acc: u32,
    nbits: u8,
    block: [u8; MAX_SUB_BLOCK],
    len: usize,
}

impl<'w, 'a> BlockPacker<'w, 'a> {
    fn new(out: &'w mut SliceWriter<'a>) -> Self {
        Self {
            out,
            acc: 0,
            nbits: 0,
            block: [0; MAX_SUB_BLOCK],
            len: 0,
        }
    }

    fn push_code(&mut self, code: u16, width: u8) -> Result<()> {
        self.acc |= (code as u32) << self.nbits;
        self.nbits += width;
        while self.nbits >= 8 {
            self.push_byte(self.acc as u8)?;
            self.acc >>= 8;
            self.nbits -= 8;
        }
        Ok(())
    }

    fn push_byte(&mut self, byte: u8) -> Result<()> {
        self.block[self.len] = byte;
        self.len += 1;
        if self.len == MAX_SUB_BLOCK {
            self.flush_block()?;
        }
        Ok(())
    }

    fn flush_block(&mut self) -> Result<()> {
        if self.len > 0 {
            self.out.put_u8(self.len as u8)?;
            self.out.put(&self.block[..self.len])?;
            self.len = 0;
        }
        Ok(())
    }

    fn finish(mut self) -> Result<()> {
        if self.nbits > 0 {
            self.push_byte(self.acc as u8)?;
            self.acc = 0;
            self.nbits = 0;
        }
        self.flush_block()?;
        self.out.put_u8(0)
    }
}

/// Write the table-based image data of one frame: the minimum code size byte
/// followed by the compressed sub-blocks.
///
/// Every index must be below `2^min_code_size`.
pub(crate) fn write_image_data(
    indices: &[u8],
    min_code_size: u8,
    out: &mut SliceWriter<'_>,
) -> Result<()> {
    if !(2..=8).contains(&min_code_size) {
        return Err(Error::Encode(format!(
            "LZW minimum code size must be in 2..=8, got {}",
            min_code_size
        )));
    }
    out.put_u8(min_code_size)?;

    let clear = 1u16 << min_code_size;
    let eoi = clear + 1;
    let reset_width = min_code_size + 1;

    let mut packer = BlockPacker::new(out);
    let mut dict: HashMap<u32, u16> = HashMap::with_capacity(DICT_CAPACITY as usize);
    let mut next = clear + 2;
    let mut width = reset_width;

    packer.push_code(clear, width)?;

    let Some((&first, rest)) = indices.split_first() else {
        packer.push_code(eoi, width)?;
        return packer.finish();
    };
    check_symbol(first, clear)?;
    let mut prefix = first as u16;

    for &symbol in rest {
        check_symbol(symbol, clear)?;
        let key = (prefix as u32) << 8 | symbol as u32;
        if let Some(&code) = dict.get(&key) {
            prefix = code;
            continue;
        }

        packer.push_code(prefix, width)?;
        if next < DICT_CAPACITY {
            dict.insert(key, next);
            next += 1;
            if next > (1 << width) && width < MAX_CODE_WIDTH {
                width += 1;
            }
        } else {
            packer.push_code(clear, width)?;
            dict.clear();
            next = clear + 2;
            width = reset_width;
        }
        prefix = symbol as u16;
    }

    packer.push_code(prefix, width)?;
    // The decoder adds an entry on reading the last code, so the width may step once more.
    if next < DICT_CAPACITY && next + 1 > (1 << width) && width < MAX_CODE_WIDTH {
        width += 1;
    }
    packer.push_code(eoi, width)?;
    packer.finish()
}

#[inline]
fn check_symbol(symbol: u8, clear: u16) -> Result<()> {
    if symbol as u16 >= clear {
        return Err(Error::Encode(format!(
            "Index {} does not fit a {}-entry code table",
            symbol, clear
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Reassemble the sub-blocks and decode them with a straightforward LZW decoder.
    fn decode(data: &[u8]) -> (Vec<u8>, usize) {
        let min = data[0];
        let mut bytes = Vec::new();
        let mut blocks = 0;
        let mut i = 1;
        loop {
            let n = data[i] as usize;
            i += 1;
            if n == 0 {
                break;
            }
            assert!(n <= MAX_SUB_BLOCK);
            bytes.extend_from_slice(&data[i..i + n]);
            i += n;
            blocks += 1;
        }
        assert_eq!(i, data.len(), "trailing bytes after terminator");

        let clear = 1usize << min;
        let eoi = clear + 1;
        let reset = || -> Vec<Vec<u8>> {
            let mut table: Vec<Vec<u8>> = (0..clear).map(|c| vec![c as u8]).collect();
            table.push(Vec::new());
            table.push(Vec::new());
            table
        };

        let mut table = reset();
        let mut width = min + 1;
        let mut prev: Option<usize> = None;
        let mut bit = 0usize;
        let mut out = Vec::new();
        loop {
            let mut code = 0usize;
            for k in 0..width as usize {
                let b = (bytes[(bit + k) / 8] >> ((bit + k) % 8)) & 1;
                code |= (b as usize) << k;
            }
            bit += width as usize;

            if code == clear {
                table = reset();
                width = min + 1;
                prev = None;
                continue;
            }
            if code == eoi {
                break;
            }
            let entry = if code < table.len() {
                table[code].clone()
            } else {
                let p = &table[prev.unwrap()];
                let mut e = p.clone();
                e.push(p[0]);
                e
            };
            out.extend_from_slice(&entry);
            if let Some(p) = prev {
                if table.len() < DICT_CAPACITY as usize {
                    let mut e = table[p].clone();
                    e.push(entry[0]);
                    table.push(e);
                }
            }
            if table.len() == 1 << width && width < MAX_CODE_WIDTH {
                width += 1;
            }
            prev = Some(code);
        }
        assert!(bit.div_ceil(8) == bytes.len(), "padding beyond final byte");
        (out, blocks)
    }

    fn compress(indices: &[u8], min: u8) -> Vec<u8> {
        let mut buf = vec![0u8; indices.len() * 2 + 64];
        let mut w = SliceWriter::new(&mut buf);
        write_image_data(indices, min, &mut w).unwrap();
        let n = w.position();
        buf.truncate(n);
        buf
    }

    fn noise(len: usize, modulo: u8, mut state: u64) -> Vec<u8> {
        (0..len)
            .map(|_| {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
                ((state >> 33) % modulo as u64) as u8
            })
            .collect()
    }

    #[test]
    fn test_single_pixel() {
        let data = compress(&[3], 2);
        assert_eq!(decode(&data).0, vec![3]);
    }

    #[test]
    fn test_uniform_frame_compresses() {
        let indices = vec![0u8; 256 * 256];
        let data = compress(&indices, 8);
        assert!(data.len() < indices.len() / 10);
        assert_eq!(decode(&data).0, indices);
    }

    #[test]
    fn test_dictionary_reset_round_trip() {
        // Enough incompressible input to fill the 4096-entry table several times.
        let indices = noise(60_000, 4, 7);
        let data = compress(&indices, 2);
        let (decoded, blocks) = decode(&data);
        assert_eq!(decoded, indices);
        assert!(blocks > 1);
    }

    #[test]
    fn test_full_byte_range() {
        let indices = noise(20_000, 255, 99);
        let data = compress(&indices, 8);
        assert_eq!(decode(&data).0, indices);
    }

    #[test]
    fn test_width_boundaries() {
        // Lengths around the points where the code width grows.
        for len in [1usize, 2, 3, 4, 5, 6, 7, 12, 13, 29, 61, 250, 509, 1021, 2045, 4093] {
            let indices = noise(len, 4, len as u64);
            assert_eq!(decode(&compress(&indices, 2)).0, indices, "len {}", len);
        }
    }

    #[test]
    fn test_symbol_out_of_table_rejected() {
        let mut buf = vec![0u8; 64];
        let mut w = SliceWriter::new(&mut buf);
        let err = write_image_data(&[0, 4], 2, &mut w).unwrap_err();
        assert!(matches!(err, Error::Encode(_)));
    }

    #[test]
    fn test_min_code_size() {
        assert_eq!(min_code_size(1), 2);
        assert_eq!(min_code_size(2), 2);
        assert_eq!(min_code_size(8), 8);
    }
}
