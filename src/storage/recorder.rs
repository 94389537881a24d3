//! Streaming batch writer.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use super::format::{BatchHeader, CompressionType, FrameIndex, compress_lz4};
use crate::error::{Error, Result};
use crate::schema::FrameManifest;

/// Options for batch writers.
#[derive(Debug, Clone, Copy, Default)]
pub struct WriterConfig {
    /// Compression applied to each frame record.
    pub compression: CompressionType,
}

/// Open a batch writer for `destination` with default options.
pub fn open_writer<P: AsRef<Path>>(destination: P, manifest: &FrameManifest) -> Result<BatchWriter> {
    BatchWriter::create(destination, manifest, WriterConfig::default())
}

/// Path of the in-progress file for `destination`.
pub fn partial_path(destination: &Path) -> PathBuf {
    let mut name = OsString::from(destination.as_os_str());
    name.push(".partial");
    PathBuf::from(name)
}

/// Writes frames one at a time into a batch file.
///
/// Frames go to `<destination>.partial`, created exclusively so only one
/// writer per destination can exist. [`BatchWriter::close_writer`] appends the
/// index table, fixes up the header and renames the file into place. Dropping
/// an unclosed writer deletes the partial file.
///
/// ```ignore
/// let mut writer = open_writer("frames.yxb", &batch.manifest())?;
/// for frame in &batch {
///     writer.write_frame(frame.pixels())?;
/// }
/// writer.close_writer()?;
/// ```
#[derive(Debug)]
pub struct BatchWriter {
    writer: Option<BufWriter<File>>,
    destination: PathBuf,
    partial: PathBuf,
    header: BatchHeader,
    frame_size: usize,
    frame_indices: Vec<FrameIndex>,
}

impl BatchWriter {
    /// Create a writer; the manifest's frame count is the capacity of the batch.
    pub fn create<P: AsRef<Path>>(
        destination: P,
        manifest: &FrameManifest,
        config: WriterConfig,
    ) -> Result<Self> {
        manifest.validate()?;
        if config.compression == CompressionType::Lz4 && !cfg!(feature = "lz4") {
            return Err(Error::invalid("LZ4 compression requires the `lz4` feature"));
        }
        let frame_size = manifest.frame_size()?;
        let capacity = usize::try_from(manifest.frame_count)
            .map_err(|_| Error::invalid("Manifest frame count is too large"))?;

        let destination = destination.as_ref().to_path_buf();
        let partial = partial_path(&destination);
        let file = match OpenOptions::new().write(true).create_new(true).open(&partial) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Err(Error::state(format!(
                    "A writer is already open for {}",
                    destination.display()
                )));
            }
            Err(e) => return Err(e.into()),
        };

        let mut writer = BufWriter::new(file);
        let header = BatchHeader::from_manifest(manifest, config.compression);
        // Placeholder until the actual count is known
        let placeholder = BatchHeader {
            frame_count: 0,
            ..header
        };
        if let Err(e) = placeholder.write_to(&mut writer) {
            drop(writer);
            let _ = fs::remove_file(&partial);
            return Err(e.into());
        }

        log::debug!(
            "Opened batch writer for {} ({} frames of {}x{}, {:?})",
            destination.display(),
            manifest.frame_count,
            manifest.width,
            manifest.height,
            config.compression
        );

        Ok(Self {
            writer: Some(writer),
            destination,
            partial,
            header,
            frame_size,
            frame_indices: Vec::with_capacity(capacity.min(1 << 16)),
        })
    }

    /// Manifest declared at open.
    pub fn manifest(&self) -> FrameManifest {
        self.header.manifest()
    }

    /// Number of frames written so far.
    pub fn frames_written(&self) -> u64 {
        self.frame_indices.len() as u64
    }

    /// Index the next frame will receive.
    pub fn next_index(&self) -> u64 {
        self.frames_written()
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Append the next frame.
    pub fn write_frame(&mut self, pixels: &[u8]) -> Result<()> {
        let index = self.next_index();
        self.write_frame_at(index, pixels)
    }

    /// Append a frame, requiring `index` to be the next one in sequence.
    pub fn write_frame_at(&mut self, index: u64, pixels: &[u8]) -> Result<()> {
        let expected = self.next_index();
        let frame_size = self.frame_size;
        let compression = self.header.compression;
        let capacity = self.header.frame_count;

        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| Error::state("Batch writer is already closed"))?;
        if index != expected {
            return Err(Error::invalid(format!(
                "Frame index {} out of order, expected {}",
                index, expected
            )));
        }
        if index >= capacity {
            return Err(Error::invalid(format!(
                "Batch already holds its declared {} frames",
                capacity
            )));
        }
        if pixels.len() != frame_size {
            return Err(Error::invalid(format!(
                "Frame buffer is {} bytes, expected {}",
                pixels.len(),
                frame_size
            )));
        }

        let record_index = u32::try_from(index)
            .map_err(|_| Error::invalid("Frame index does not fit a record"))?;
        let offset = writer.stream_position()?;
        writer.write_all(&record_index.to_le_bytes())?;
        let size = match compression {
            CompressionType::None => {
                writer.write_all(pixels)?;
                pixels.len()
            }
            CompressionType::Lz4 => {
                let compressed = compress_lz4(pixels)?;
                writer.write_all(&compressed)?;
                compressed.len()
            }
        };

        self.frame_indices.push(FrameIndex {
            offset,
            size: size as u64,
        });
        Ok(())
    }

    /// Finish the batch and move it to its destination.
    pub fn close_writer(&mut self) -> Result<BatchStats> {
        let mut writer = self
            .writer
            .take()
            .ok_or_else(|| Error::state("Batch writer is already closed"))?;

        let written = self.frame_indices.len() as u64;
        if written == 0 {
            drop(writer);
            let _ = fs::remove_file(&self.partial);
            return Err(Error::state(format!(
                "No frames were written to {}",
                self.destination.display()
            )));
        }
        if written < self.header.frame_count {
            log::warn!(
                "Closing {} with {} of {} declared frames",
                self.destination.display(),
                written,
                self.header.frame_count
            );
        }

        match self.finish(&mut writer, written) {
            Ok(stats) => {
                drop(writer);
                log::info!("Wrote batch {}: {}", self.destination.display(), stats);
                Ok(stats)
            }
            Err(e) => {
                drop(writer);
                let _ = fs::remove_file(&self.partial);
                Err(e)
            }
        }
    }

    fn finish(&mut self, writer: &mut BufWriter<File>, written: u64) -> Result<BatchStats> {
        let index_offset = writer.stream_position()?;
        for entry in &self.frame_indices {
            entry.write_to(writer)?;
        }
        let total_bytes = writer.stream_position()?;

        self.header.frame_count = written;
        writer.seek(SeekFrom::Start(0))?;
        self.header.write_to(writer)?;
        writer.flush()?;
        writer.get_ref().sync_all()?;

        fs::rename(&self.partial, &self.destination)?;

        Ok(BatchStats {
            frame_count: written,
            total_bytes,
            average_frame_size: (index_offset - BatchHeader::SIZE as u64) / written,
            compression: self.header.compression,
        })
    }
}

impl Drop for BatchWriter {
    fn drop(&mut self) {
        if let Some(writer) = self.writer.take() {
            drop(writer);
            if let Err(e) = fs::remove_file(&self.partial) {
                log::debug!("Could not remove {}: {}", self.partial.display(), e);
            }
        }
    }
}

/// Summary of a finished batch.
#[derive(Debug, Clone, Copy)]
pub struct BatchStats {
    /// Frames stored.
    pub frame_count: u64,
    /// Total file size in bytes.
    pub total_bytes: u64,
    /// Average stored record size, including the index prefix.
    pub average_frame_size: u64,
    /// Compression used.
    pub compression: CompressionType,
}

impl std::fmt::Display for BatchStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} frames, {} bytes total, {} bytes/frame avg ({:?} compression)",
            self.frame_count, self.total_bytes, self.average_frame_size, self.compression
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::open_reader;
    use tempfile::tempdir;

    fn manifest(count: u64) -> FrameManifest {
        FrameManifest::rgba(count, 4, 4)
    }

    #[test]
    fn test_writer_basic() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("basic.yxb");

        let mut writer = open_writer(&path, &manifest(3)).unwrap();
        for i in 0..3u8 {
            writer.write_frame(&[i; 64]).unwrap();
        }
        assert!(partial_path(&path).exists());
        assert!(!path.exists());

        let stats = writer.close_writer().unwrap();
        assert_eq!(stats.frame_count, 3);
        assert!(path.exists());
        assert!(!partial_path(&path).exists());
        assert_eq!(
            fs::metadata(&path).unwrap().len(),
            (BatchHeader::SIZE + 3 * (4 + 64) + 3 * FrameIndex::SIZE) as u64
        );
    }

    #[test]
    fn test_out_of_order_index() {
        let dir = tempdir().unwrap();
        let mut writer = open_writer(dir.path().join("order.yxb"), &manifest(3)).unwrap();
        writer.write_frame_at(0, &[0; 64]).unwrap();
        assert!(matches!(
            writer.write_frame_at(2, &[0; 64]),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            writer.write_frame_at(0, &[0; 64]),
            Err(Error::InvalidArgument(_))
        ));
        writer.write_frame_at(1, &[0; 64]).unwrap();
        assert_eq!(writer.frames_written(), 2);
    }

    #[test]
    fn test_wrong_length_and_capacity() {
        let dir = tempdir().unwrap();
        let mut writer = open_writer(dir.path().join("cap.yxb"), &manifest(1)).unwrap();
        assert!(matches!(
            writer.write_frame(&[0; 63]),
            Err(Error::InvalidArgument(_))
        ));
        writer.write_frame(&[0; 64]).unwrap();
        assert!(matches!(
            writer.write_frame(&[0; 64]),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_state_errors_after_close() {
        let dir = tempdir().unwrap();
        let mut writer = open_writer(dir.path().join("closed.yxb"), &manifest(2)).unwrap();
        writer.write_frame(&[1; 64]).unwrap();
        writer.close_writer().unwrap();
        assert!(matches!(writer.close_writer(), Err(Error::State(_))));
        assert!(matches!(writer.write_frame(&[1; 64]), Err(Error::State(_))));
    }

    #[test]
    fn test_second_writer_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("busy.yxb");
        let first = open_writer(&path, &manifest(1)).unwrap();
        assert!(matches!(
            open_writer(&path, &manifest(1)),
            Err(Error::State(_))
        ));
        drop(first);
        // Dropping discards the partial file and frees the destination.
        assert!(!partial_path(&path).exists());
        assert!(open_writer(&path, &manifest(1)).is_ok());
    }

    #[test]
    fn test_invalid_manifest() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.yxb");
        assert!(matches!(
            open_writer(&path, &manifest(0)),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            open_writer(&path, &FrameManifest::rgba(1, 0, 4)),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_close_without_frames() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.yxb");
        let mut writer = open_writer(&path, &manifest(2)).unwrap();
        assert!(matches!(writer.close_writer(), Err(Error::State(_))));
        assert!(!path.exists());
        assert!(!partial_path(&path).exists());
    }

    #[test]
    fn test_rejected_write_keeps_earlier_frames() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("kept.yxb");
        let first: Vec<u8> = (0..64).collect();

        let mut writer = open_writer(&path, &manifest(3)).unwrap();
        writer.write_frame(&first).unwrap();
        assert!(matches!(
            writer.write_frame(&[9; 10]),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            writer.write_frame_at(2, &[9; 64]),
            Err(Error::InvalidArgument(_))
        ));
        let stats = writer.close_writer().unwrap();
        assert_eq!(stats.frame_count, 1);

        let mut reader = open_reader(&path).unwrap();
        assert_eq!(reader.frame_count(), 1);
        assert_eq!(reader.read_frame(0).unwrap().pixels(), &first[..]);
    }
}
