//! Error taxonomy shared by the quantizer, encoder and frame store.

use std::collections::TryReserveError;
use std::io;

use crate::schema::ConfigError;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors reported by every boundary operation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed dimensions, out-of-range palette size, non-monotonic frame indices.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    /// Caller-supplied output buffer cannot hold the encoded stream.
    #[error("Buffer too small: need at least {required} bytes, have {capacity}")]
    BufferTooSmall { required: usize, capacity: usize },
    /// Storage read/write/open/close failure.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// Internal structural invariant violated during encoding.
    #[error("Encode error: {0}")]
    Encode(String),
    /// Allocation failure.
    #[error("Out of memory: {0}")]
    OutOfMemory(String),
    /// Operation called in the wrong session state.
    #[error("Invalid session state: {0}")]
    State(String),
}

impl Error {
    /// Signed status code for flat callers (0 is reserved for success).
    pub fn status_code(&self) -> i32 {
        match self {
            Error::InvalidArgument(_) => -2,
            Error::Encode(_) => -3,
            Error::BufferTooSmall { .. } => -4,
            Error::Io(_) => -5,
            Error::OutOfMemory(_) => -6,
            Error::State(_) => -7,
        }
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }

    pub(crate) fn state(msg: impl Into<String>) -> Self {
        Error::State(msg.into())
    }

    pub(crate) fn corrupt(msg: impl Into<String>) -> Self {
        Error::Io(io::Error::new(io::ErrorKind::InvalidData, msg.into()))
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Error::InvalidArgument(err.to_string())
    }
}

impl From<TryReserveError> for Error {
    fn from(err: TryReserveError) -> Self {
        Error::OutOfMemory(err.to_string())
    }
}

/// Allocate a zero-filled buffer, reporting allocation failure instead of aborting.
pub(crate) fn try_zeroed<T: Clone + Default>(len: usize) -> Result<Vec<T>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)?;
    buf.resize(len, T::default());
    Ok(buf)
}
