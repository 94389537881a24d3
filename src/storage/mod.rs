//! Frame store: raw RGBA frames on disk.
//!
//! Two layouts, both little endian:
//!
//! ```text
//! Single frame (.yxf):
//!   Magic: "YXFR" (4 bytes)
//!   Version: u16
//!   Reserved: u16
//!   Width: u32
//!   Height: u32
//!   Index: u32
//!   Channels: u32 (always 4)
//!   Pixels: width * height * 4 bytes
//!
//! Batch (.yxb):
//!   Header (48 bytes):
//!     Magic: "YXFB" (4 bytes)
//!     Version: u16
//!     Flags: u16 (compression)
//!     Width: u32
//!     Height: u32
//!     Channels: u32
//!     Frame count: u64
//!     Reserved: 20 bytes
//!
//!   Frame records (variable):
//!     Index: u32
//!     Payload: raw pixels, optionally LZ4 compressed
//!
//!   Frame index table (frame_count * 16 bytes, end of file):
//!     Offset: u64
//!     Payload size: u64
//! ```

mod format;
mod player;
mod recorder;
mod snapshot;

pub use format::{
    BATCH_MAGIC, BatchHeader, CompressionType, FORMAT_VERSION, FRAME_MAGIC, FrameHeader,
    FrameIndex,
};
pub use player::{BatchFrames, BatchReader, open_reader};
pub use recorder::{BatchStats, BatchWriter, WriterConfig, open_writer, partial_path};
pub use snapshot::{
    FRAME_EXTENSION, StoredFrame, frame_path, load_frame, save_frame, save_frame_sequence,
};
