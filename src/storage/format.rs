//! Binary layouts of stored frames and frame batches.

use std::io::{self, Read, Write};

use crate::schema::{CHANNELS, FrameManifest};

/// Magic bytes identifying a single stored frame.
pub const FRAME_MAGIC: &[u8; 4] = b"YXFR";

/// Magic bytes identifying a frame batch.
pub const BATCH_MAGIC: &[u8; 4] = b"YXFB";

/// Current version of both layouts.
pub const FORMAT_VERSION: u16 = 1;

/// Compression applied to batch frame records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum CompressionType {
    /// Raw RGBA bytes.
    #[default]
    None = 0,
    /// LZ4 block compression with prepended size.
    Lz4 = 1,
}

impl CompressionType {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(CompressionType::None),
            1 => Some(CompressionType::Lz4),
            _ => None,
        }
    }
}

fn invalid_data(msg: impl Into<String>) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg.into())
}

fn read_u16<R: Read>(r: &mut R) -> io::Result<u16> {
    let mut buf = [0u8; 2];
    r.read_exact(&mut buf)?;
    Ok(u16::from_le_bytes(buf))
}

fn read_u32<R: Read>(r: &mut R) -> io::Result<u32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

fn read_u64<R: Read>(r: &mut R) -> io::Result<u64> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

fn check_magic<R: Read>(r: &mut R, expected: &[u8; 4]) -> io::Result<()> {
    let mut magic = [0u8; 4];
    r.read_exact(&mut magic)?;
    if &magic != expected {
        return Err(invalid_data(format!(
            "Invalid magic bytes, expected {}",
            String::from_utf8_lossy(expected)
        )));
    }
    let version = read_u16(r)?;
    if version != FORMAT_VERSION {
        return Err(invalid_data(format!("Unsupported format version: {}", version)));
    }
    Ok(())
}

/// Header of a single stored frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub width: u32,
    pub height: u32,
    /// Position of the frame in its sequence.
    pub index: u32,
    pub channels: u32,
}

impl FrameHeader {
    /// Magic(4) + Version(2) + Reserved(2) + Width(4) + Height(4) + Index(4) + Channels(4) = 24
    pub const SIZE: usize = 24;

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(FRAME_MAGIC)?;
        w.write_all(&FORMAT_VERSION.to_le_bytes())?;
        w.write_all(&[0u8; 2])?;
        w.write_all(&self.width.to_le_bytes())?;
        w.write_all(&self.height.to_le_bytes())?;
        w.write_all(&self.index.to_le_bytes())?;
        w.write_all(&self.channels.to_le_bytes())?;
        Ok(())
    }

    pub fn read_from<R: Read>(r: &mut R) -> io::Result<Self> {
        check_magic(r, FRAME_MAGIC)?;
        let _reserved = read_u16(r)?;
        let width = read_u32(r)?;
        let height = read_u32(r)?;
        let index = read_u32(r)?;
        let channels = read_u32(r)?;
        if channels != CHANNELS {
            return Err(invalid_data(format!(
                "Stored frame has {} channels, expected {}",
                channels, CHANNELS
            )));
        }
        Ok(Self {
            width,
            height,
            index,
            channels,
        })
    }
}

/// Header of a frame batch file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchHeader {
    pub width: u32,
    pub height: u32,
    pub channels: u32,
    /// Number of frame records in the file.
    pub frame_count: u64,
    pub compression: CompressionType,
}

impl BatchHeader {
    /// Magic(4) + Version(2) + Flags(2) + Width(4) + Height(4) + Channels(4) +
    /// FrameCount(8) + Reserved(20) = 48
    pub const SIZE: usize = 48;

    pub fn from_manifest(manifest: &FrameManifest, compression: CompressionType) -> Self {
        Self {
            width: manifest.width,
            height: manifest.height,
            channels: manifest.channels,
            frame_count: manifest.frame_count,
            compression,
        }
    }

    pub fn manifest(&self) -> FrameManifest {
        FrameManifest {
            frame_count: self.frame_count,
            width: self.width,
            height: self.height,
            channels: self.channels,
        }
    }

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(BATCH_MAGIC)?;
        w.write_all(&FORMAT_VERSION.to_le_bytes())?;
        w.write_all(&(self.compression as u16).to_le_bytes())?;
        w.write_all(&self.width.to_le_bytes())?;
        w.write_all(&self.height.to_le_bytes())?;
        w.write_all(&self.channels.to_le_bytes())?;
        w.write_all(&self.frame_count.to_le_bytes())?;
        w.write_all(&[0u8; 20])?;
        Ok(())
    }

    pub fn read_from<R: Read>(r: &mut R) -> io::Result<Self> {
        check_magic(r, BATCH_MAGIC)?;
        let flags = read_u16(r)?;
        let compression = CompressionType::from_u8((flags & 0x0F) as u8)
            .ok_or_else(|| invalid_data(format!("Unknown compression flags: {:#06x}", flags)))?;
        let width = read_u32(r)?;
        let height = read_u32(r)?;
        let channels = read_u32(r)?;
        let frame_count = read_u64(r)?;
        let mut reserved = [0u8; 20];
        r.read_exact(&mut reserved)?;
        Ok(Self {
            width,
            height,
            channels,
            frame_count,
            compression,
        })
    }
}

/// Location of one frame record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameIndex {
    /// Byte offset of the record from the start of the file.
    pub offset: u64,
    /// Payload size in bytes, excluding the record's index prefix.
    pub size: u64,
}

impl FrameIndex {
    /// Size of one index entry in bytes.
    pub const SIZE: usize = 16;

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&self.offset.to_le_bytes())?;
        w.write_all(&self.size.to_le_bytes())?;
        Ok(())
    }

    pub fn read_from<R: Read>(r: &mut R) -> io::Result<Self> {
        let offset = read_u64(r)?;
        let size = read_u64(r)?;
        Ok(Self { offset, size })
    }
}

/// Frame record prefix: the frame's index.
pub const RECORD_PREFIX_SIZE: u64 = 4;

pub(crate) fn read_record_index<R: Read>(r: &mut R) -> io::Result<u32> {
    read_u32(r)
}

/// Compress data using LZ4.
#[cfg(feature = "lz4")]
pub fn compress_lz4(data: &[u8]) -> io::Result<Vec<u8>> {
    Ok(lz4_flex::compress_prepend_size(data))
}

/// Decompress LZ4 data.
#[cfg(feature = "lz4")]
pub fn decompress_lz4(data: &[u8]) -> io::Result<Vec<u8>> {
    lz4_flex::decompress_size_prepended(data).map_err(|e| invalid_data(e.to_string()))
}

#[cfg(not(feature = "lz4"))]
pub fn compress_lz4(_data: &[u8]) -> io::Result<Vec<u8>> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "LZ4 compression requires the `lz4` feature",
    ))
}

#[cfg(not(feature = "lz4"))]
pub fn decompress_lz4(_data: &[u8]) -> io::Result<Vec<u8>> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "LZ4 decompression requires the `lz4` feature",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_frame_header_roundtrip() {
        let header = FrameHeader {
            width: 640,
            height: 480,
            index: 42,
            channels: CHANNELS,
        };
        let mut buf = Vec::new();
        header.write_to(&mut buf).unwrap();
        assert_eq!(buf.len(), FrameHeader::SIZE);
        assert_eq!(&buf[..4], b"YXFR");

        let decoded = FrameHeader::read_from(&mut Cursor::new(&buf)).unwrap();
        assert_eq!(decoded, header);
    }

    #[test]
    fn test_batch_header_roundtrip() {
        let header = BatchHeader {
            width: 256,
            height: 128,
            channels: CHANNELS,
            frame_count: 1000,
            compression: CompressionType::Lz4,
        };
        let mut buf = Vec::new();
        header.write_to(&mut buf).unwrap();
        assert_eq!(buf.len(), BatchHeader::SIZE);

        let decoded = BatchHeader::read_from(&mut Cursor::new(&buf)).unwrap();
        assert_eq!(decoded, header);
        assert_eq!(decoded.manifest().frame_count, 1000);
    }

    #[test]
    fn test_bad_magic_rejected() {
        let mut buf = Vec::new();
        FrameHeader {
            width: 1,
            height: 1,
            index: 0,
            channels: CHANNELS,
        }
        .write_to(&mut buf)
        .unwrap();
        let err = BatchHeader::read_from(&mut Cursor::new(&buf)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_frame_index_roundtrip() {
        let index = FrameIndex {
            offset: 12345678,
            size: 8192,
        };
        let mut buf = Vec::new();
        index.write_to(&mut buf).unwrap();
        assert_eq!(buf.len(), FrameIndex::SIZE);
        assert_eq!(FrameIndex::read_from(&mut Cursor::new(&buf)).unwrap(), index);
    }

    #[cfg(feature = "lz4")]
    #[test]
    fn test_lz4_roundtrip() {
        let data: Vec<u8> = (0..4096u32).map(|i| (i / 16) as u8).collect();
        let packed = compress_lz4(&data).unwrap();
        assert!(packed.len() < data.len());
        assert_eq!(decompress_lz4(&packed).unwrap(), data);
    }
}
