//! Error types for the tile source.

use crate::PixelRect;
use rpf_codec::CodecError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when opening a catalog or reading tiles.
#[derive(Debug, Error)]
pub enum TileError {
    /// The catalog or configuration cannot be rendered (e.g. unknown product type).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The tile source has not been opened.
    #[error("tile source is not open")]
    NotOpen,

    /// No overview provides the requested reduced resolution level.
    #[error("invalid resolution level {0}")]
    InvalidResolutionLevel(u32),

    /// A requested rectangle is too large to hold as one tile.
    #[error("rectangle {0} is too large for a tile")]
    RectTooLarge(PixelRect),

    /// No frame is stored at a frame-grid cell.
    #[error("no frame at disk row {row}, column {col}")]
    FrameUnavailable {
        /// On-disk frame row.
        row: u32,
        /// Frame column.
        col: u32,
    },

    /// A frame could not be read or decoded.
    #[error("corrupt frame {}: {reason}", path.display())]
    CorruptFrame {
        /// Frame file path.
        path: PathBuf,
        /// What was wrong with it.
        reason: String,
    },

    /// Sub-frame coordinates outside the 6 x 6 sub-frame grid.
    #[error("sub-frame ({row}, {col}) is outside the frame")]
    SubframeOutOfRange {
        /// Sub-frame row.
        row: u32,
        /// Sub-frame column.
        col: u32,
    },

    /// Catalog entry index does not exist.
    #[error("catalog has no entry {0}")]
    NoEntry(usize),

    /// Codec error while building tables or decoding.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// I/O error reading a frame or configuration file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be parsed.
    #[error("config parse error: {0}")]
    ConfigParse(#[from] serde_yaml::Error),

    /// Frame cache lock was poisoned (a thread panicked while holding the lock).
    #[error("frame cache lock was poisoned")]
    CacheLockPoisoned,
}
