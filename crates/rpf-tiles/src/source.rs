//! The tile source facade: open a catalog, pick an entry, serve tiles.

use crate::cache::FrameStore;
use crate::catalog::{entry_list, Catalog, CatalogEntry};
use crate::compositor::TileCompositor;
use crate::config::TileSourceConfig;
use crate::frame::{FrameData, FrameLocator, FrameReader};
use crate::telemetry::TILES_SERVED;
use crate::tile::Tile;
use crate::{PixelRect, Result, TileError};
use rpf_codec::{ColorLut, ProductType};
use tracing::{debug, warn};

/// Lifecycle state of a [`TileSource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceState {
    /// No catalog is open.
    #[default]
    Closed,
    /// A catalog is being opened.
    Opening,
    /// Tiles can be requested.
    Open,
}

/// Serves tiles at reduced resolution levels.
///
/// Level 0 is always full resolution and handled by the tile source itself.
pub trait OverviewProvider {
    /// Whether `level` can be served.
    fn is_valid_level(&self, level: u32) -> bool;

    /// Pixels of `rect` at `level`, in that level's pixel space.
    fn get_tile(&self, rect: PixelRect, level: u32) -> Result<Tile>;
}

/// The entry tiles are currently served from.
#[derive(Debug, Clone, Copy)]
struct CurrentEntry {
    index: usize,
    product: ProductType,
    image_rect: PixelRect,
}

/// Reads tiles from one entry of a raster product catalog.
pub struct TileSource<C: Catalog, R: FrameReader> {
    config: TileSourceConfig,
    store: FrameStore<R>,
    overview: Option<Box<dyn OverviewProvider + Send + Sync>>,
    state: SourceState,
    catalog: Option<C>,
    current: Option<CurrentEntry>,
}

impl<C: Catalog, R: FrameReader> std::fmt::Debug for TileSource<C, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TileSource")
            .field("config", &self.config)
            .field("state", &self.state)
            .field("current", &self.current)
            .field("store", &self.store)
            .field("has_overview", &self.overview.is_some())
            .finish()
    }
}

impl<C: Catalog, R: FrameReader> TileSource<C, R> {
    /// Create a closed tile source reading frames through `reader`.
    pub fn new(reader: R, config: TileSourceConfig) -> Result<Self> {
        config.validate()?;
        let store = FrameStore::new(reader, config.cache_capacity);
        Ok(TileSource {
            config,
            store,
            overview: None,
            state: SourceState::Closed,
            catalog: None,
            current: None,
        })
    }

    /// Serve resolution levels above 0 from `provider`.
    pub fn with_overview<P>(mut self, provider: P) -> Self
    where
        P: OverviewProvider + Send + Sync + 'static,
    {
        self.overview = Some(Box::new(provider));
        self
    }

    /// Open `catalog` on the first entry of its first product scale.
    ///
    /// Any previously open catalog is closed first. On failure the source
    /// is left closed.
    pub fn open(&mut self, catalog: C) -> Result<()> {
        self.close();
        self.state = SourceState::Opening;

        let Some(&index) = entry_list(&catalog, self.config.skip_empty_check).first() else {
            self.close();
            return Err(TileError::Configuration(
                "catalog has no renderable entries".to_string(),
            ));
        };
        let current = match resolve_entry(&catalog, index) {
            Ok(current) => current,
            Err(err) => {
                self.close();
                return Err(err);
            }
        };

        self.catalog = Some(catalog);
        self.current = Some(current);
        self.state = SourceState::Open;
        self.log_entry("opened catalog");
        Ok(())
    }

    /// Switch to catalog entry `index`.
    ///
    /// On failure the previous entry stays current.
    pub fn set_current_entry(&mut self, index: usize) -> Result<()> {
        let catalog = self.catalog.as_ref().ok_or(TileError::NotOpen)?;
        if self.state != SourceState::Open {
            return Err(TileError::NotOpen);
        }
        let current = resolve_entry(catalog, index)?;
        self.current = Some(current);
        self.log_entry("switched entry");
        Ok(())
    }

    /// Pixels of `rect` at resolution `level`.
    ///
    /// Level 0 is assembled from frames; other levels require an overview
    /// provider that accepts them.
    pub fn get_tile(&self, rect: PixelRect, level: u32) -> Result<Tile> {
        let (entry, current) = self.open_entry()?;

        let tile = if level == 0 {
            TileCompositor::new(
                entry.frames_vertical,
                entry.frames_horizontal,
                &entry.locator,
                &self.store,
                current.product,
            )
            .strict(self.config.strict)
            .get_tile(rect)?
        } else {
            match &self.overview {
                Some(overview) if overview.is_valid_level(level) => {
                    overview.get_tile(rect, level)?
                }
                _ => return Err(TileError::InvalidResolutionLevel(level)),
            }
        };

        metrics::counter!(TILES_SERVED).increment(1);
        Ok(tile)
    }

    /// Full pixel extent of the current entry.
    pub fn get_image_rect(&self) -> Result<PixelRect> {
        self.open_entry().map(|(_, current)| current.image_rect)
    }

    /// Rectangle of tile `(tile_row, tile_col)` in the default tile grid,
    /// clipped to the image. `None` if the tile lies outside the image.
    pub fn tile_rect(&self, tile_row: u32, tile_col: u32) -> Result<Option<PixelRect>> {
        let image = self.get_image_rect()?;
        let rect = PixelRect::from_origin(
            tile_col as i64 * self.config.tile_width as i64,
            tile_row as i64 * self.config.tile_height as i64,
            self.config.tile_width,
            self.config.tile_height,
        );
        Ok(rect.intersection(&image))
    }

    /// Number of `(rows, columns)` in the default tile grid.
    pub fn tile_grid_size(&self) -> Result<(u64, u64)> {
        let image = self.get_image_rect()?;
        Ok((
            image.height().div_ceil(self.config.tile_height as u64),
            image.width().div_ceil(self.config.tile_width as u64),
        ))
    }

    /// Color table of the current entry, taken from the first frame that
    /// exists and opens. Grayscale palettes are replicated into all three
    /// channels.
    ///
    /// Frames are scanned column by column, each column from disk row 0
    /// (the bottom of the image) upwards.
    pub fn color_lut(&self) -> Result<Option<ColorLut>> {
        let (entry, current) = self.open_entry()?;
        for col in 0..entry.frames_horizontal {
            for on_disk in 0..entry.frames_vertical {
                if !entry.locator.exists(on_disk, col) {
                    continue;
                }
                let Some(path) = entry.locator.path(on_disk, col) else {
                    continue;
                };
                match self.store.open(&path) {
                    Ok(frame) => return Ok(frame.palette().to_lut(current.product)),
                    Err(TileError::CacheLockPoisoned) => return Err(TileError::CacheLockPoisoned),
                    Err(err) => {
                        warn!(path = %path.display(), error = %err, "cannot read frame palette");
                    }
                }
            }
        }
        Ok(None)
    }

    /// Product of the current entry, `Unknown` when closed.
    pub fn product_type(&self) -> ProductType {
        self.current
            .map(|current| current.product)
            .unwrap_or_default()
    }

    /// Bands per pixel of the current entry, 0 when closed.
    pub fn bands(&self) -> usize {
        self.product_type().bands()
    }

    /// Scale string of the current entry.
    pub fn product_scale(&self) -> Option<String> {
        self.open_entry()
            .ok()
            .map(|(entry, _)| entry.normalized_scale())
    }

    /// Index of the current catalog entry.
    pub fn current_entry(&self) -> Option<usize> {
        self.current.map(|current| current.index)
    }

    /// Lifecycle state.
    pub fn state(&self) -> SourceState {
        self.state
    }

    /// Whether tiles can be requested.
    pub fn is_open(&self) -> bool {
        self.state == SourceState::Open
    }

    /// Close the catalog and drop cached frames.
    pub fn close(&mut self) {
        if self.catalog.is_some() {
            debug!("closing tile source");
        }
        self.catalog = None;
        self.current = None;
        self.store.clear();
        self.state = SourceState::Closed;
    }

    /// Configuration in use.
    pub fn config(&self) -> &TileSourceConfig {
        &self.config
    }

    /// The open catalog.
    pub fn catalog(&self) -> Option<&C> {
        self.catalog.as_ref()
    }

    /// The frame store, for cache inspection.
    pub fn frame_store(&self) -> &FrameStore<R> {
        &self.store
    }

    fn open_entry(&self) -> Result<(&CatalogEntry<C::Locator>, CurrentEntry)> {
        if self.state != SourceState::Open {
            return Err(TileError::NotOpen);
        }
        let (Some(catalog), Some(current)) = (&self.catalog, self.current) else {
            return Err(TileError::NotOpen);
        };
        let entry = catalog
            .entry(current.index)
            .ok_or(TileError::NoEntry(current.index))?;
        Ok((entry, current))
    }

    fn log_entry(&self, message: &str) {
        if let Ok((entry, current)) = self.open_entry() {
            debug!(
                entry = current.index,
                product = %current.product,
                scale = %entry.normalized_scale(),
                frames_vertical = entry.frames_vertical,
                frames_horizontal = entry.frames_horizontal,
                "{message}"
            );
        }
    }
}

/// Check that entry `index` can be rendered and compute its extent.
fn resolve_entry<C: Catalog + ?Sized>(catalog: &C, index: usize) -> Result<CurrentEntry> {
    let entry = catalog.entry(index).ok_or(TileError::NoEntry(index))?;
    if !entry.has_coverage {
        return Err(TileError::Configuration(format!(
            "entry {index} has no geographic coverage"
        )));
    }
    let product = entry.product_type();
    if !product.is_known() {
        return Err(TileError::Configuration(format!(
            "entry {index} has unknown product type {:?}",
            entry.product_tag
        )));
    }
    Ok(CurrentEntry {
        index,
        product,
        image_rect: PixelRect::new(0, 0, entry.samples() as i64, entry.lines() as i64),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MemoryCatalog;
    use crate::frame::{FrameGrid, MemoryFrame, MemoryFrameReader};
    use rpf_codec::{Codebook, Palette, COMPRESSED_BYTES};

    type Source = TileSource<MemoryCatalog<FrameGrid>, MemoryFrameReader>;

    fn gray_frame(values: &[u8]) -> MemoryFrame {
        MemoryFrame::new(Codebook::zeroed(), Palette::grayscale(values).unwrap())
            .fill_subframes(&[0; COMPRESSED_BYTES])
    }

    fn source() -> Source {
        let reader = MemoryFrameReader::new().with_frame("a", gray_frame(&[40, 80]));
        TileSource::new(reader, TileSourceConfig::default()).unwrap()
    }

    fn catalog(tag: &str) -> MemoryCatalog<FrameGrid> {
        MemoryCatalog::new(vec![CatalogEntry::new(
            tag,
            "10M",
            1,
            2,
            FrameGrid::new().with_frame(0, 1, "a"),
        )])
    }

    #[test]
    fn test_lifecycle() {
        let mut source = source();
        assert_eq!(source.state(), SourceState::Closed);
        assert!(matches!(source.get_image_rect(), Err(TileError::NotOpen)));

        source.open(catalog("cib")).unwrap();
        assert!(source.is_open());
        assert_eq!(source.product_type(), ProductType::Grayscale);
        assert_eq!(source.bands(), 1);
        assert_eq!(source.product_scale().as_deref(), Some("10M"));
        assert_eq!(source.current_entry(), Some(0));
        assert_eq!(source.get_image_rect().unwrap(), PixelRect::new(0, 0, 3072, 1536));

        source.close();
        assert_eq!(source.state(), SourceState::Closed);
        assert_eq!(source.product_type(), ProductType::Unknown);
        assert!(matches!(
            source.get_tile(PixelRect::new(0, 0, 1, 1), 0),
            Err(TileError::NotOpen)
        ));
    }

    #[test]
    fn test_unknown_product_fails_open() {
        let mut source = source();
        let err = source.open(catalog("ECRG")).unwrap_err();
        assert!(matches!(err, TileError::Configuration(_)));
        assert_eq!(source.state(), SourceState::Closed);
        assert!(source.catalog().is_none());
    }

    #[test]
    fn test_empty_catalog_fails_open() {
        let mut source = source();
        let empty = MemoryCatalog::new(vec![CatalogEntry::new("CIB", "10M", 1, 1, FrameGrid::new())]);
        assert!(matches!(source.open(empty), Err(TileError::Configuration(_))));

        let mut lenient: Source = TileSource::new(
            MemoryFrameReader::new(),
            TileSourceConfig::default().with_skip_empty_check(true),
        )
        .unwrap();
        let empty = MemoryCatalog::new(vec![CatalogEntry::new("CIB", "10M", 1, 1, FrameGrid::new())]);
        lenient.open(empty).unwrap();
        assert!(lenient.get_tile(PixelRect::new(0, 0, 4, 4), 0).unwrap().is_blank());
    }

    #[test]
    fn test_set_current_entry() {
        let mut catalog = catalog("CIB");
        let mut uncovered = CatalogEntry::new("CIB", "10M", 1, 1, FrameGrid::new());
        uncovered.has_coverage = false;
        catalog.push(uncovered);
        catalog.push(CatalogEntry::new("CADRG", "1:50K", 3, 1, FrameGrid::new()));

        let mut source = source();
        assert!(matches!(source.set_current_entry(0), Err(TileError::NotOpen)));
        source.open(catalog).unwrap();

        assert!(matches!(source.set_current_entry(1), Err(TileError::Configuration(_))));
        assert!(matches!(source.set_current_entry(9), Err(TileError::NoEntry(9))));
        assert_eq!(source.current_entry(), Some(0));

        source.set_current_entry(2).unwrap();
        assert_eq!(source.product_type(), ProductType::Rgb);
        assert_eq!(source.product_scale().as_deref(), Some("1:50K"));
        assert_eq!(source.get_image_rect().unwrap(), PixelRect::new(0, 0, 1536, 4608));
    }

    #[test]
    fn test_tile_grid() {
        let mut source = source();
        source.open(catalog("CIB")).unwrap();
        assert_eq!(source.tile_grid_size().unwrap(), (12, 24));
        assert_eq!(
            source.tile_rect(1, 2).unwrap(),
            Some(PixelRect::new(256, 128, 384, 256))
        );
        assert_eq!(source.tile_rect(12, 0).unwrap(), None);
    }

    #[test]
    fn test_color_lut_from_first_frame() {
        let mut source = source();
        source.open(catalog("CIB")).unwrap();
        let lut = source.color_lut().unwrap().unwrap();
        assert_eq!(lut.entries(), &[[40, 40, 40], [80, 80, 80]]);
    }

    #[test]
    fn test_color_lut_scans_from_bottom_disk_row() {
        let reader = MemoryFrameReader::new()
            .with_frame("bottom", gray_frame(&[10]))
            .with_frame("top", gray_frame(&[20]));
        let grid = FrameGrid::new()
            .with_frame(0, 0, "bottom")
            .with_frame(1, 0, "top");
        let mut source: Source = TileSource::new(reader, TileSourceConfig::default()).unwrap();
        source
            .open(MemoryCatalog::new(vec![CatalogEntry::new("CIB", "5M", 2, 1, grid)]))
            .unwrap();

        let lut = source.color_lut().unwrap().unwrap();
        assert_eq!(lut.get(0), Some([10, 10, 10]));
        assert_eq!(source.frame_store().reader().open_count(), 1);
    }

    #[test]
    fn test_color_lut_skips_unopenable_frames() {
        let reader = MemoryFrameReader::new().with_frame("later", gray_frame(&[30]));
        let grid = FrameGrid::new()
            .with_frame(0, 0, "gone")
            .with_frame(1, 0, "later");
        let mut source: Source = TileSource::new(reader, TileSourceConfig::default()).unwrap();
        source
            .open(MemoryCatalog::new(vec![CatalogEntry::new("CIB", "5M", 2, 1, grid)]))
            .unwrap();

        assert_eq!(source.color_lut().unwrap().unwrap().get(0), Some([30, 30, 30]));
    }

    #[test]
    fn test_resolution_levels() {
        struct Half;
        impl OverviewProvider for Half {
            fn is_valid_level(&self, level: u32) -> bool {
                level == 1
            }
            fn get_tile(&self, rect: PixelRect, _level: u32) -> Result<Tile> {
                Tile::blank(rect, 1)
            }
        }

        let mut plain = source();
        plain.open(catalog("CIB")).unwrap();
        let rect = PixelRect::new(0, 0, 8, 8);
        assert!(matches!(
            plain.get_tile(rect, 1),
            Err(TileError::InvalidResolutionLevel(1))
        ));

        let mut with_overview = source().with_overview(Half);
        with_overview.open(catalog("CIB")).unwrap();
        assert_eq!(with_overview.get_tile(rect, 1).unwrap().width(), 8);
        assert!(matches!(
            with_overview.get_tile(rect, 2),
            Err(TileError::InvalidResolutionLevel(2))
        ));
    }
}
