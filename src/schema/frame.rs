//! Raw RGBA frames, batches and the manifest that describes them.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Bytes per pixel of every raw frame (R, G, B, A).
pub const CHANNELS: u32 = 4;

/// A single raw RGBA frame.
///
/// Pixels are stored row-major: `[y * width + x] * 4 + channel`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Frame {
    /// Create a frame, validating dimensions against the buffer length.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
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
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Copy a frame out of a borrowed pixel slice.
    pub fn from_slice(width: u32, height: u32, pixels: &[u8]) -> Result<Self> {
        Self::new(width, height, pixels.to_vec())
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn channels(&self) -> u32 {
        CHANNELS
    }

    /// Raw RGBA bytes.
    #[inline]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Consume the frame, returning its pixel buffer.
    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }

    /// RGBA value at (x, y), or `None` outside the frame.
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * CHANNELS as usize;
        let px = &self.pixels[i..i + CHANNELS as usize];
        Some([px[0], px[1], px[2], px[3]])
    }
}

/// Byte length of a `width x height` RGBA frame.
pub fn frame_len(width: u32, height: u32) -> Result<usize> {
    if width == 0 || height == 0 {
        return Err(Error::invalid(format!(
            "Frame dimensions must be non-zero, got {}x{}",
            width, height
        )));
    }
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(CHANNELS as usize))
        .ok_or_else(|| Error::invalid(format!("Frame {}x{} is too large", width, height)))
}

/// A non-empty, homogeneous sequence of frames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBatch {
    frames: Vec<Frame>,
}

impl FrameBatch {
    /// Build a batch, rejecting empty input and mixed dimensions.
    pub fn new(frames: Vec<Frame>) -> Result<Self> {
        let first = frames
            .first()
            .ok_or_else(|| Error::invalid("Frame batch must contain at least one frame"))?;
        let (width, height) = (first.width, first.height);
        for (i, frame) in frames.iter().enumerate() {
            if frame.width != width || frame.height != height {
                return Err(Error::invalid(format!(
                    "Frame {} is {}x{}, batch is {}x{}",
                    i, frame.width, frame.height, width, height
                )));
            }
        }
        Ok(Self { frames })
    }

    /// Split a contiguous `count * width * height * 4` buffer into frames.
    pub fn from_contiguous(data: &[u8], width: u32, height: u32, count: usize) -> Result<Self> {
        let frame_size = frame_len(width, height)?;
        let expected = frame_size
            .checked_mul(count)
            .ok_or_else(|| Error::invalid("Frame batch is too large"))?;
        if data.len() != expected {
            return Err(Error::invalid(format!(
                "Batch buffer is {} bytes, expected {} for {} frames",
                data.len(),
                expected,
                count
            )));
        }
        let frames = data
            .chunks_exact(frame_size)
            .map(|chunk| Frame::from_slice(width, height, chunk))
            .collect::<Result<Vec<_>>>()?;
        Self::new(frames)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Always false; kept for API symmetry with slices.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.frames[0].width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.frames[0].height
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn get(&self, index: usize) -> Option<&Frame> {
        self.frames.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Frame> {
        self.frames.iter()
    }

    pub fn into_frames(self) -> Vec<Frame> {
        self.frames
    }

    /// Manifest describing this batch.
    pub fn manifest(&self) -> FrameManifest {
        FrameManifest {
            frame_count: self.frames.len() as u64,
            width: self.width(),
            height: self.height(),
            channels: CHANNELS,
        }
    }
}

impl<'a> IntoIterator for &'a FrameBatch {
    type Item = &'a Frame;
    type IntoIter = std::slice::Iter<'a, Frame>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.iter()
    }
}

/// Metadata describing a homogeneous batch of stored frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameManifest {
    /// Number of frames in the batch.
    pub frame_count: u64,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Bytes per pixel; only 4 (RGBA) is supported.
    pub channels: u32,
}

impl FrameManifest {
    /// Manifest for `frame_count` RGBA frames of `width x height`.
    pub fn rgba(frame_count: u64, width: u32, height: u32) -> Self {
        Self {
            frame_count,
            width,
            height,
            channels: CHANNELS,
        }
    }

    /// Byte size of one raw frame.
    pub fn frame_size(&self) -> Result<usize> {
        frame_len(self.width, self.height)
    }

    /// Validate manifest parameters.
    pub fn validate(&self) -> Result<()> {
        if self.frame_count == 0 {
            return Err(Error::invalid("Manifest frame count must be non-zero"));
        }
        if self.channels != CHANNELS {
            return Err(Error::invalid(format!(
                "Manifest declares {} channels, only {} (RGBA) is supported",
                self.channels, CHANNELS
            )));
        }
        self.frame_size().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_rejects_wrong_length() {
        assert!(Frame::new(2, 2, vec![0; 15]).is_err());
        assert!(Frame::new(2, 2, vec![0; 16]).is_ok());
    }

    #[test]
    fn test_frame_rejects_zero_dimensions() {
        assert!(matches!(
            Frame::new(0, 4, Vec::new()),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_batch_rejects_mixed_dimensions() {
        let a = Frame::new(2, 2, vec![0; 16]).unwrap();
        let b = Frame::new(4, 1, vec![0; 16]).unwrap();
        assert!(FrameBatch::new(vec![a.clone(), b]).is_err());
        assert!(FrameBatch::new(vec![]).is_err());
        assert_eq!(FrameBatch::new(vec![a.clone(), a]).unwrap().len(), 2);
    }

    #[test]
    fn test_batch_from_contiguous() {
        let data: Vec<u8> = (0..48).collect();
        let batch = FrameBatch::from_contiguous(&data, 2, 2, 3).unwrap();
        assert_eq!(batch.len(), 3);
        assert_eq!(batch.frames()[2].pixel(0, 0), Some([32, 33, 34, 35]));
        assert_eq!(batch.frames()[2].pixel(1, 1), Some([44, 45, 46, 47]));
        assert_eq!(batch.frames()[2].pixel(2, 0), None);
        assert_eq!(batch.frames()[2].pixel(0, 2), None);
        assert!(FrameBatch::from_contiguous(&data, 2, 2, 2).is_err());
    }

    #[test]
    fn test_manifest_validation() {
        assert!(FrameManifest::rgba(3, 8, 8).validate().is_ok());
        assert!(FrameManifest::rgba(0, 8, 8).validate().is_err());
        let mut manifest = FrameManifest::rgba(3, 8, 8);
        manifest.channels = 3;
        assert!(manifest.validate().is_err());
    }
}
