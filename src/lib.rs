//! rgb2gif - Quantize RGBA frame sequences into animated GIFs.
//!
//! Raw frames are downsampled to a square side, reduced to a bounded palette
//! with median cut and serialized as a GIF89a stream. Frames can also be kept
//! on disk as individual files or as a streamed, randomly readable batch.
//!
//! # Architecture
//!
//! - `schema`: Frames, palettes, documents, configuration and frame sources
//! - `compute`: Resampling, palette construction and the frame quantizer
//! - `encode`: GIF89a/LZW writer and output size estimation
//! - `storage`: Single-frame files and batch writer/reader sessions
//! - `api`: Flat slice-based entry points with status codes
//!
//! # Example
//!
//! ```rust,no_run
//! use rgb2gif::{
//!     compute::FrameQuantizer,
//!     encode::encode_to_vec,
//!     schema::{Document, FrameSource, QuantizeConfig},
//! };
//!
//! let batch = FrameSource::default().generate()?;
//! let quantizer = FrameQuantizer::new(QuantizeConfig::new(128, 64))?;
//! let frames = quantizer.quantize_batch(&batch)?;
//!
//! let doc = Document::new(quantizer.target_side(), frames, 4)?;
//! let gif = encode_to_vec(&doc)?;
//! std::fs::write("out.gif", gif)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod api;
pub mod compute;
pub mod encode;
pub mod error;
pub mod schema;
pub mod storage;

// Re-export commonly used types
pub use compute::FrameQuantizer;
pub use encode::{encode_into, encode_to_vec, estimate_output_size};
pub use error::{Error, Result};
pub use schema::{Document, Frame, FrameBatch, FrameManifest, Palette, QuantizedFrame};
