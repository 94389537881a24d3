//! Encode module - GIF89a serialization of quantized documents.
//!
//! Output goes to caller-supplied buffers; use [`estimate_output_size`] to
//! size them.

mod container;
mod estimate;
mod lzw;
mod sink;

pub use container::*;
pub use estimate::*;
pub use lzw::min_code_size;
