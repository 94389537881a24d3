//! Compute module - Resampling, palette construction and frame quantization.

mod median_cut;
mod quantizer;
mod resample;

pub use median_cut::*;
pub use quantizer::*;
pub use resample::*;
