//! Fixed geometry of CIB/CADRG frames.
//!
//! None of these are tunable: they are defined by the on-disk raster product
//! format and every frame in a catalog shares them.

/// Width and height of a frame in pixels.
pub const FRAME_DIM: u32 = 1536;

/// Width and height of a sub-frame (the unit of decompression) in pixels.
pub const SUBFRAME_DIM: u32 = 256;

/// Number of sub-frames along each axis of a frame.
pub const SUBFRAMES_PER_FRAME: u32 = FRAME_DIM / SUBFRAME_DIM;

/// Width and height of the pixel group addressed by a single VQ code.
pub const CODE_BLOCK_DIM: u32 = 4;

/// Bits per VQ code.
pub const CODE_BITS: u32 = 12;

/// Number of VQ codes along each axis of a sub-frame.
pub const CODES_PER_SUBFRAME_ROW: u32 = SUBFRAME_DIM / CODE_BLOCK_DIM;

/// Size of one compressed sub-frame: 64 x 64 codes of 12 bits.
pub const COMPRESSED_BYTES: usize =
    (CODES_PER_SUBFRAME_ROW * CODES_PER_SUBFRAME_ROW * CODE_BITS / 8) as usize;

/// Number of parallel codebook tables, one per row of a code block.
pub const CODEBOOK_TABLES: usize = CODE_BLOCK_DIM as usize;

/// Number of distinct codes a 12-bit value can address.
pub const CODEBOOK_CODES: usize = 1 << CODE_BITS;

/// Palette indices stored per code in each table, one per block column.
pub const CODEBOOK_ENTRY_WIDTH: usize = CODE_BLOCK_DIM as usize;

/// Bytes in one fully allocated codebook table.
pub const CODEBOOK_TABLE_BYTES: usize = CODEBOOK_CODES * CODEBOOK_ENTRY_WIDTH;

/// Number of palette slots addressable by a one-byte codebook entry.
pub const PALETTE_ENTRIES: usize = 256;

/// Pixels in one decoded sub-frame band.
pub const SUBFRAME_PIXELS: usize = (SUBFRAME_DIM * SUBFRAME_DIM) as usize;
