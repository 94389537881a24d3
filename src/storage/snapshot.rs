//! Single-frame files.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use super::format::FrameHeader;
use crate::error::{Error, Result, try_zeroed};
use crate::schema::{CHANNELS, Frame, FrameBatch, frame_len};

/// File extension of stored frames.
pub const FRAME_EXTENSION: &str = "yxf";

/// A frame loaded back from disk with its sequence position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFrame {
    pub frame: Frame,
    pub index: u32,
}

/// Write one RGBA frame to `path`.
pub fn save_frame<P: AsRef<Path>>(
    path: P,
    pixels: &[u8],
    width: u32,
    height: u32,
    index: u32,
) -> Result<()> {
    let expected = frame_len(width, height)?;
    if pixels.len() != expected {
        return Err(Error::invalid(format!(
            "Frame buffer is {} bytes, expected {} for {}x{} RGBA",
            pixels.len(),
            expected,
            width,
            height
        )));
    }

    let mut writer = BufWriter::new(File::create(path.as_ref())?);
    FrameHeader {
        width,
        height,
        index,
        channels: CHANNELS,
    }
    .write_to(&mut writer)?;
    writer.write_all(pixels)?;
    writer.flush()?;
    Ok(())
}

/// Read a frame written by [`save_frame`].
pub fn load_frame<P: AsRef<Path>>(path: P) -> Result<StoredFrame> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let file_len = file.metadata()?.len();
    let mut reader = BufReader::new(file);

    let header = FrameHeader::read_from(&mut reader)?;
    let len = frame_len(header.width, header.height).map_err(|e| Error::corrupt(e.to_string()))?;
    if file_len != (FrameHeader::SIZE + len) as u64 {
        return Err(Error::corrupt(format!(
            "{}: expected {} bytes of pixel data for {}x{}, file holds {}",
            path.display(),
            len,
            header.width,
            header.height,
            file_len.saturating_sub(FrameHeader::SIZE as u64)
        )));
    }

    let mut pixels = try_zeroed::<u8>(len)?;
    reader.read_exact(&mut pixels)?;
    Ok(StoredFrame {
        frame: Frame::new(header.width, header.height, pixels)?,
        index: header.index,
    })
}

/// Conventional file name of frame `index` inside `dir`.
pub fn frame_path<P: AsRef<Path>>(dir: P, index: u32) -> PathBuf {
    dir.as_ref()
        .join(format!("frame_{:05}.{}", index, FRAME_EXTENSION))
}

/// Write every frame of a batch into `dir` as individual frame files.
pub fn save_frame_sequence<P: AsRef<Path>>(dir: P, batch: &FrameBatch) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;

    let mut paths = Vec::with_capacity(batch.len());
    for (i, frame) in batch.iter().enumerate() {
        let index = u32::try_from(i).map_err(|_| Error::invalid("Too many frames in sequence"))?;
        let path = frame_path(dir, index);
        save_frame(&path, frame.pixels(), frame.width(), frame.height(), index)?;
        paths.push(path);
    }
    log::debug!("Saved {} frames to {}", paths.len(), dir.display());
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FrameSource;
    use tempfile::tempdir;

    #[test]
    fn test_save_load_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("one.yxf");
        let pixels: Vec<u8> = (0..3 * 2 * 4).map(|i| i as u8).collect();

        save_frame(&path, &pixels, 3, 2, 7).unwrap();
        let stored = load_frame(&path).unwrap();

        assert_eq!(stored.index, 7);
        assert_eq!(stored.frame.width(), 3);
        assert_eq!(stored.frame.height(), 2);
        assert_eq!(stored.frame.pixels(), &pixels[..]);
        assert_eq!(
            fs::metadata(&path).unwrap().len(),
            (FrameHeader::SIZE + pixels.len()) as u64
        );
    }

    #[test]
    fn test_save_rejects_bad_length() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.yxf");
        let err = save_frame(&path, &[0; 5], 2, 2, 0).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert!(!path.exists());
    }

    #[test]
    fn test_truncated_file_is_io_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cut.yxf");
        save_frame(&path, &[1; 16], 2, 2, 0).unwrap();
        let bytes = fs::read(&path).unwrap();
        fs::write(&path, &bytes[..bytes.len() - 3]).unwrap();
        assert!(matches!(load_frame(&path), Err(Error::Io(_))));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            load_frame(dir.path().join("absent.yxf")),
            Err(Error::Io(_))
        ));
    }

    #[test]
    fn test_frame_path_naming() {
        assert_eq!(
            frame_path("/tmp/frames", 42),
            PathBuf::from("/tmp/frames/frame_00042.yxf")
        );
    }

    #[test]
    fn test_save_sequence() {
        let dir = tempdir().unwrap();
        let batch = FrameSource::Gradient {
            frames: 3,
            width: 4,
            height: 4,
        }
        .generate()
        .unwrap();

        let paths = save_frame_sequence(dir.path().join("seq"), &batch).unwrap();
        assert_eq!(paths.len(), 3);
        for (i, path) in paths.iter().enumerate() {
            let stored = load_frame(path).unwrap();
            assert_eq!(stored.index, i as u32);
            assert_eq!(&stored.frame, &batch.frames()[i]);
        }
    }
}
