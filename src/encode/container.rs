//! GIF89a container writer.

use super::lzw::{min_code_size, write_image_data};
use super::sink::SliceWriter;
use super::estimate_document_size;
use crate::error::{Error, Result};
use crate::schema::{Document, Palette};

/// Signature and version.
pub const GIF_MAGIC: &[u8; 6] = b"GIF89a";

const EXTENSION_INTRODUCER: u8 = 0x21;
const GRAPHIC_CONTROL_LABEL: u8 = 0xF9;
const APPLICATION_LABEL: u8 = 0xFF;
const IMAGE_SEPARATOR: u8 = 0x2C;
const TRAILER: u8 = 0x3B;

/// Frame disposal method: restore the frame area to the background.
const DISPOSE_BACKGROUND: u8 = 2;

/// Encode a document into `out`, returning the number of bytes written.
///
/// Nothing is written if the document is structurally invalid. If `out` runs
/// out of room the partial output is zeroed and `BufferTooSmall` is returned.
pub fn encode_into(doc: &Document, out: &mut [u8]) -> Result<usize> {
    check_document(doc)?;

    let mut w = SliceWriter::new(out);
    match write_document(doc, &mut w) {
        Ok(()) => {
            let written = w.position();
            log::debug!(
                "Encoded {} frames at {}x{} into {} bytes",
                doc.frame_count(),
                doc.side(),
                doc.side(),
                written
            );
            Ok(written)
        }
        Err(err) => {
            w.discard();
            Err(err)
        }
    }
}

/// Encode a document into a freshly allocated buffer sized by the estimator.
pub fn encode_to_vec(doc: &Document) -> Result<Vec<u8>> {
    let capacity = estimate_document_size(doc)?;
    let mut buf = crate::error::try_zeroed::<u8>(capacity)?;
    let written = encode_into(doc, &mut buf)?;
    buf.truncate(written);
    Ok(buf)
}

/// Structural checks performed before any byte is written.
fn check_document(doc: &Document) -> Result<()> {
    for (i, frame) in doc.frames().iter().enumerate() {
        frame
            .check_indices()
            .map_err(|e| Error::Encode(format!("Frame {}: {}", i, e)))?;
        if let Some(t) = doc.transparent {
            let table_len = 1usize << frame.palette.table_bits();
            if t as usize >= table_len {
                return Err(Error::invalid(format!(
                    "Transparent index {} outside the {}-entry color table of frame {}",
                    t, table_len, i
                )));
            }
        }
    }
    Ok(())
}

fn write_document(doc: &Document, w: &mut SliceWriter<'_>) -> Result<()> {
    let frames = doc.frames();
    let global = &frames[0].palette;
    let side = doc.side() as u16;

    // Header and logical screen descriptor
    w.put(GIF_MAGIC)?;
    w.put_u16_le(side)?;
    w.put_u16_le(side)?;
    w.put_u8(0x80 | (7 << 4) | (global.table_bits() - 1))?;
    w.put_u8(0)?; // background index
    w.put_u8(0)?; // pixel aspect ratio
    write_color_table(global, w)?;

    write_loop_extension(doc.repeat.loop_count(), w)?;

    for (frame, &delay_cs) in frames.iter().zip(doc.delays()) {
        write_graphic_control(delay_cs, doc.transparent, w)?;

        let local = &frame.palette != global;
        let bits = frame.palette.table_bits();
        w.put_u8(IMAGE_SEPARATOR)?;
        w.put_u16_le(0)?;
        w.put_u16_le(0)?;
        w.put_u16_le(side)?;
        w.put_u16_le(side)?;
        if local {
            w.put_u8(0x80 | (bits - 1))?;
            write_color_table(&frame.palette, w)?;
        } else {
            w.put_u8(0)?;
        }

        write_image_data(&frame.indices, min_code_size(bits), w)?;
    }

    w.put_u8(TRAILER)
}

/// Color table padded with black to `2^table_bits` entries.
fn write_color_table(palette: &Palette, w: &mut SliceWriter<'_>) -> Result<()> {
    for c in palette.colors() {
        w.put(&[c.r, c.g, c.b])?;
    }
    let padded = 1usize << palette.table_bits();
    for _ in palette.len()..padded {
        w.put(&[0, 0, 0])?;
    }
    Ok(())
}

fn write_loop_extension(loop_count: u16, w: &mut SliceWriter<'_>) -> Result<()> {
    w.put(&[EXTENSION_INTRODUCER, APPLICATION_LABEL, 11])?;
    w.put(b"NETSCAPE2.0")?;
    w.put(&[3, 1])?;
    w.put_u16_le(loop_count)?;
    w.put_u8(0)
}

fn write_graphic_control(
    delay_cs: u16,
    transparent: Option<u8>,
    w: &mut SliceWriter<'_>,
) -> Result<()> {
    let mut packed = DISPOSE_BACKGROUND << 2;
    if transparent.is_some() {
        packed |= 1;
    }
    w.put(&[EXTENSION_INTRODUCER, GRAPHIC_CONTROL_LABEL, 4, packed])?;
    w.put_u16_le(delay_cs)?;
    w.put_u8(transparent.unwrap_or(0))?;
    w.put_u8(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{QuantizedFrame, Repeat};
    use rgb::RGB8;

    fn two_color_doc() -> Document {
        let palette = Palette::new(vec![RGB8::new(255, 0, 0), RGB8::new(0, 0, 255)]).unwrap();
        let frame = QuantizedFrame::new(vec![0, 1, 1, 0], palette).unwrap();
        Document::new(2, vec![frame.clone(), frame], 10).unwrap()
    }

    #[test]
    fn test_header_layout() {
        let bytes = encode_to_vec(&two_color_doc()).unwrap();
        assert_eq!(&bytes[..6], b"GIF89a");
        assert_eq!(&bytes[6..10], &[2, 0, 2, 0]);
        // Global table present, 8-bit resolution, 2 entries.
        assert_eq!(bytes[10], 0xF0);
        assert_eq!(&bytes[13..19], &[255, 0, 0, 0, 0, 255]);
        assert_eq!(&bytes[19..22], &[0x21, 0xFF, 11]);
        assert_eq!(&bytes[22..33], b"NETSCAPE2.0");
        assert_eq!(&bytes[33..38], &[3, 1, 0, 0, 0]);
        // First graphic control extension: disposal 2, no transparency, delay 10.
        assert_eq!(&bytes[38..46], &[0x21, 0xF9, 4, 0x08, 10, 0, 0, 0]);
        assert_eq!(*bytes.last().unwrap(), 0x3B);
    }

    #[test]
    fn test_transparency_and_finite_loop() {
        let mut doc = two_color_doc();
        doc.transparent = Some(1);
        doc.repeat = Repeat::Finite(3);
        let bytes = encode_to_vec(&doc).unwrap();
        assert_eq!(&bytes[33..38], &[3, 1, 3, 0, 0]);
        assert_eq!(&bytes[38..46], &[0x21, 0xF9, 4, 0x09, 10, 0, 1, 0]);
    }

    #[test]
    fn test_local_table_only_when_palette_differs() {
        let a = Palette::new(vec![RGB8::new(0, 0, 0), RGB8::new(255, 255, 255)]).unwrap();
        let b = Palette::new(vec![RGB8::new(9, 9, 9), RGB8::new(1, 2, 3), RGB8::new(4, 5, 6)])
            .unwrap();
        let doc = Document::new(
            1,
            vec![
                QuantizedFrame::new(vec![1], a.clone()).unwrap(),
                QuantizedFrame::new(vec![2], b).unwrap(),
                QuantizedFrame::new(vec![0], a).unwrap(),
            ],
            5,
        )
        .unwrap();
        let bytes = encode_to_vec(&doc).unwrap();
        let descriptors: Vec<u8> = bytes
            .windows(10)
            .enumerate()
            .filter(|&(i, w)| {
                i >= 8 && w[0] == IMAGE_SEPARATOR && bytes[i - 8] == 0x21 && bytes[i - 7] == 0xF9
            })
            .map(|(_, w)| w[9])
            .collect();
        assert_eq!(descriptors, vec![0x00, 0x81, 0x00]);
    }

    #[test]
    fn test_buffer_too_small_zeroes_prefix() {
        let doc = two_color_doc();
        let mut buf = vec![0xAAu8; 40];
        let err = encode_into(&doc, &mut buf).unwrap_err();
        assert!(matches!(
            err,
            Error::BufferTooSmall {
                required: 42,
                capacity: 40
            }
        ));
        // Header, tables and loop extension were written before the overflow.
        assert!(buf[..38].iter().all(|&b| b == 0));
        assert_eq!(&buf[38..], &[0xAA, 0xAA]);
    }

    #[test]
    fn test_invalid_index_writes_nothing() {
        let palette = Palette::new(vec![RGB8::new(0, 0, 0)]).unwrap();
        let mut frame = QuantizedFrame::new(vec![0], palette).unwrap();
        frame.indices[0] = 5;
        let doc = Document::new(1, vec![frame], 1).unwrap();
        let mut buf = vec![0xAAu8; 256];
        assert!(matches!(encode_into(&doc, &mut buf), Err(Error::Encode(_))));
        assert!(buf.iter().all(|&b| b == 0xAA));
    }

    #[test]
    fn test_transparent_index_outside_table() {
        let mut doc = two_color_doc();
        doc.transparent = Some(2);
        assert!(matches!(
            encode_to_vec(&doc),
            Err(Error::InvalidArgument(_))
        ));
    }
}
