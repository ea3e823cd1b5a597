//! # rpf-tiles
//!
//! Tile source for CIB and CADRG raster products: given a catalog entry
//! describing a grid of 1536 x 1536 frames, assemble any pixel rectangle of
//! the mosaic by decoding only the frames and sub-frames it touches.
//!
//! - [`TileSource`] is the entry point: open a [`Catalog`], request tiles.
//! - [`TileCompositor`] does the per-request work for one entry.
//! - [`FrameLocator`], [`FrameReader`] and [`FrameData`] are the seams to
//!   wherever frames are stored; [`FrameGrid`], [`MemoryFrameReader`] and
//!   [`FileFrameReader`] are ready-made implementations.
//! - [`FrameStore`] keeps recently opened frames so neighbouring tiles do
//!   not re-open them.
//!
//! Logging goes through `tracing` and counters through `metrics`; neither
//! installs a subscriber or recorder. See [`telemetry`] for metric names.
//!
//! ## Example
//!
//! ```
//! use rpf_codec::{Codebook, Palette, COMPRESSED_BYTES};
//! use rpf_tiles::{
//!     CatalogEntry, FrameGrid, MemoryCatalog, MemoryFrame, MemoryFrameReader, PixelRect,
//!     TileSource, TileSourceConfig,
//! };
//!
//! let frame = MemoryFrame::new(Codebook::zeroed(), Palette::grayscale(&[200])?)
//!     .fill_subframes(&[0; COMPRESSED_BYTES]);
//! let reader = MemoryFrameReader::new().with_frame("frame.i42", frame);
//! let grid = FrameGrid::new().with_frame(0, 0, "frame.i42");
//! let catalog = MemoryCatalog::new(vec![CatalogEntry::new("CIB", "5M", 1, 1, grid)]);
//!
//! let mut source = TileSource::new(reader, TileSourceConfig::default())?;
//! source.open(catalog)?;
//! let tile = source.get_tile(PixelRect::new(0, 0, 64, 64), 0)?;
//! assert_eq!(tile.pixel(10, 10, 0), Some(200));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod cache;
pub mod catalog;
pub mod compositor;
pub mod config;
mod error;
pub mod frame;
mod rect;
pub mod source;
pub mod telemetry;
mod tile;

pub use cache::FrameStore;
pub use catalog::{
    entries_for_scale, entry_list, product_scales, Catalog, CatalogEntry, MemoryCatalog,
};
pub use compositor::{disk_row, FrameCell, TileCompositor};
pub use config::TileSourceConfig;
pub use error::TileError;
pub use frame::{
    FileFrame, FileFrameReader, FrameData, FrameGrid, FrameLocator, FrameReader, FrameSections,
    MemoryFrame, MemoryFrameReader, SubframeRead, NULL_SUBFRAME_OFFSET,
};
pub use rect::PixelRect;
pub use source::{OverviewProvider, SourceState, TileSource};
pub use tile::{Tile, TileStatus};

/// Result type for tile source operations.
pub type Result<T> = std::result::Result<T, TileError>;
