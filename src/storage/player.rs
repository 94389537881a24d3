//! Random-access batch reader.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use super::format::{
    BatchHeader, CompressionType, FrameIndex, RECORD_PREFIX_SIZE, decompress_lz4,
    read_record_index,
};
use crate::error::{Error, Result, try_zeroed};
use crate::schema::{Frame, FrameBatch, FrameManifest};

/// Little-endian uncompressed length that leads every LZ4 record.
const LZ4_SIZE_PREFIX: usize = 4;

/// Open a finished batch for reading.
pub fn open_reader<P: AsRef<Path>>(path: P) -> Result<BatchReader> {
    BatchReader::open(path)
}

/// Reads frames back from a batch file.
///
/// ```ignore
/// let mut reader = open_reader("frames.yxb")?;
/// let last = reader.read_frame(reader.manifest().frame_count - 1)?;
/// for frame in reader.frames() {
///     let frame = frame?;
/// }
/// reader.close_reader()?;
/// ```
#[derive(Debug)]
pub struct BatchReader {
    reader: Option<BufReader<File>>,
    path: PathBuf,
    header: BatchHeader,
    frame_size: usize,
    frame_indices: Vec<FrameIndex>,
    /// Scratch space for compressed records.
    record_buffer: Vec<u8>,
}

impl BatchReader {
    /// Open a batch file and load its index table.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut reader = BufReader::new(File::open(&path)?);

        let header = BatchHeader::read_from(&mut reader)?;
        header
            .manifest()
            .validate()
            .map_err(|e| Error::corrupt(format!("{}: {}", path.display(), e)))?;
        let frame_size = header
            .manifest()
            .frame_size()
            .map_err(|e| Error::corrupt(e.to_string()))?;

        // Index table sits at the end of the file
        let file_len = reader.seek(SeekFrom::End(0))?;
        let table_len = header
            .frame_count
            .checked_mul(FrameIndex::SIZE as u64)
            .ok_or_else(|| Error::corrupt("Frame count overflows index table"))?;
        let index_start = file_len
            .checked_sub(table_len)
            .filter(|&start| start >= BatchHeader::SIZE as u64)
            .ok_or_else(|| {
                Error::corrupt(format!(
                    "{}: file too short for {} frames",
                    path.display(),
                    header.frame_count
                ))
            })?;

        reader.seek(SeekFrom::Start(index_start))?;
        let count = usize::try_from(header.frame_count)
            .map_err(|_| Error::corrupt("Frame count does not fit in memory"))?;
        let mut frame_indices = Vec::new();
        frame_indices.try_reserve_exact(count)?;
        for i in 0..count {
            let entry = FrameIndex::read_from(&mut reader)?;
            let end = entry
                .offset
                .checked_add(RECORD_PREFIX_SIZE)
                .and_then(|n| n.checked_add(entry.size));
            if entry.offset < BatchHeader::SIZE as u64 || end.is_none_or(|end| end > index_start) {
                return Err(Error::corrupt(format!(
                    "{}: frame {} record lies outside the data section",
                    path.display(),
                    i
                )));
            }
            frame_indices.push(entry);
        }

        log::debug!(
            "Opened batch {} ({} frames of {}x{}, {:?})",
            path.display(),
            header.frame_count,
            header.width,
            header.height,
            header.compression
        );

        Ok(Self {
            reader: Some(reader),
            path,
            header,
            frame_size,
            frame_indices,
            record_buffer: Vec::new(),
        })
    }

    /// Manifest of the stored batch.
    pub fn manifest(&self) -> FrameManifest {
        self.header.manifest()
    }

    pub fn frame_count(&self) -> u64 {
        self.header.frame_count
    }

    pub fn compression(&self) -> CompressionType {
        self.header.compression
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read frame `index`.
    pub fn read_frame(&mut self, index: u64) -> Result<Frame> {
        let mut pixels = try_zeroed::<u8>(self.frame_size)?;
        self.read_frame_into(index, &mut pixels)?;
        Frame::new(self.header.width, self.header.height, pixels)
    }

    /// Read frame `index` into a caller buffer of exactly one frame.
    pub fn read_frame_into(&mut self, index: u64, out: &mut [u8]) -> Result<()> {
        let reader = self
            .reader
            .as_mut()
            .ok_or_else(|| Error::state("Batch reader is already closed"))?;
        if index >= self.header.frame_count {
            return Err(Error::invalid(format!(
                "Frame index {} out of range ({} frames)",
                index, self.header.frame_count
            )));
        }
        if out.len() != self.frame_size {
            return Err(Error::invalid(format!(
                "Output buffer is {} bytes, frame is {}",
                out.len(),
                self.frame_size
            )));
        }

        let entry = self.frame_indices[index as usize];
        reader.seek(SeekFrom::Start(entry.offset))?;
        let stored = read_record_index(reader)?;
        if stored as u64 != index {
            return Err(Error::corrupt(format!(
                "{}: record at offset {} holds frame {}, expected {}",
                self.path.display(),
                entry.offset,
                stored,
                index
            )));
        }

        match self.header.compression {
            CompressionType::None => {
                if entry.size != self.frame_size as u64 {
                    return Err(Error::corrupt(format!(
                        "Frame {} record is {} bytes, expected {}",
                        index, entry.size, self.frame_size
                    )));
                }
                reader.read_exact(out)?;
            }
            CompressionType::Lz4 => {
                let size = entry.size as usize;
                if size < LZ4_SIZE_PREFIX {
                    return Err(Error::corrupt(format!(
                        "Frame {} record is {} bytes, too short for LZ4 data",
                        index, size
                    )));
                }
                self.record_buffer.resize(size, 0);
                reader.read_exact(&mut self.record_buffer)?;

                // The size prefix drives the decompressor's allocation
                let mut prefix = [0u8; LZ4_SIZE_PREFIX];
                prefix.copy_from_slice(&self.record_buffer[..LZ4_SIZE_PREFIX]);
                let declared = u32::from_le_bytes(prefix) as u64;
                if declared != self.frame_size as u64 {
                    return Err(Error::corrupt(format!(
                        "Frame {} declares {} uncompressed bytes, expected {}",
                        index, declared, self.frame_size
                    )));
                }
                let raw = decompress_lz4(&self.record_buffer)?;
                if raw.len() != self.frame_size {
                    return Err(Error::corrupt(format!(
                        "Frame {} decompressed to {} bytes, expected {}",
                        index,
                        raw.len(),
                        self.frame_size
                    )));
                }
                out.copy_from_slice(&raw);
            }
        }
        Ok(())
    }

    /// Iterate over all frames in order.
    pub fn frames(&mut self) -> BatchFrames<'_> {
        BatchFrames {
            reader: self,
            current: 0,
        }
    }

    /// Read every frame into a batch.
    pub fn read_batch(&mut self) -> Result<FrameBatch> {
        let frames = self.frames().collect::<Result<Vec<_>>>()?;
        FrameBatch::new(frames)
    }

    /// Release the file. Further reads fail.
    pub fn close_reader(&mut self) -> Result<()> {
        self.reader
            .take()
            .map(drop)
            .ok_or_else(|| Error::state("Batch reader is already closed"))
    }
}

/// Iterator over the frames of a batch.
pub struct BatchFrames<'a> {
    reader: &'a mut BatchReader,
    current: u64,
}

impl<'a> Iterator for BatchFrames<'a> {
    type Item = Result<Frame>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current >= self.reader.frame_count() {
            return None;
        }
        let result = self.reader.read_frame(self.current);
        self.current += 1;
        Some(result)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.reader.frame_count() - self.current) as usize;
        (remaining, Some(remaining))
    }
}

impl<'a> ExactSizeIterator for BatchFrames<'a> {}
