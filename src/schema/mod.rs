//! Schema module - Frame, palette and document types plus run configuration.

mod config;
mod document;
mod frame;
mod palette;
mod source;

pub use config::*;
pub use document::*;
pub use frame::*;
pub use palette::*;
pub use source::*;
