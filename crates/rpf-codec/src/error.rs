//! Error types for the codec crate.

use thiserror::Error;

/// Errors that can occur when building codec tables or decoding sub-frames.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Decoding was requested for a product whose band layout is unknown.
    #[error("cannot decode a sub-frame of unknown product type")]
    UnknownProduct,

    /// A codebook entry referenced a palette slot the frame never defined.
    #[error("palette index {index} out of range (palette has {len} entries)")]
    PaletteIndexOutOfRange {
        /// Referenced palette index.
        index: u8,
        /// Number of entries the palette declares.
        len: usize,
    },

    /// Compressed buffer does not have the fixed sub-frame size.
    #[error("compressed sub-frame must be {expected} bytes, got {actual}")]
    CompressedLength {
        /// Required length.
        expected: usize,
        /// Supplied length.
        actual: usize,
    },

    /// A codebook table is larger than the 12-bit code space.
    #[error("codebook table {table} has {actual} bytes, at most {max} allowed")]
    CodebookLength {
        /// Table index (block row).
        table: usize,
        /// Maximum table size.
        max: usize,
        /// Supplied size.
        actual: usize,
    },

    /// A color table has more entries than a one-byte index can address.
    #[error("color table has {actual} entries, at most {max} allowed")]
    PaletteLength {
        /// Maximum number of entries.
        max: usize,
        /// Supplied number of entries.
        actual: usize,
    },
}
