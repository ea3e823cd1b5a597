//! Catalog entries: the frame grids a tile source can render.
//!
//! A raster product catalog (the RPF table of contents) lists one entry per
//! scale and coverage area. Parsing it is left to the caller; this module
//! only models the parts the tile source needs and the entry selection rules.

use crate::frame::FrameLocator;
use rpf_codec::{ProductType, FRAME_DIM};

/// One renderable frame grid.
#[derive(Debug, Clone)]
pub struct CatalogEntry<L> {
    /// Product type tag, e.g. `"CADRG"` or `"CIB"`.
    pub product_tag: String,
    /// Scale or resolution, e.g. `"1:250K"` or `"10M"`.
    pub scale: String,
    /// Frames along the vertical axis.
    pub frames_vertical: u32,
    /// Frames along the horizontal axis.
    pub frames_horizontal: u32,
    /// Whether the entry carries a non-null geographic coverage rectangle.
    pub has_coverage: bool,
    /// Where the entry's frames are stored.
    pub locator: L,
}

impl<L> CatalogEntry<L> {
    /// Create an entry with geographic coverage.
    pub fn new(
        product_tag: impl Into<String>,
        scale: impl Into<String>,
        frames_vertical: u32,
        frames_horizontal: u32,
        locator: L,
    ) -> Self {
        CatalogEntry {
            product_tag: product_tag.into(),
            scale: scale.into(),
            frames_vertical,
            frames_horizontal,
            has_coverage: true,
            locator,
        }
    }

    /// Product this entry decodes to.
    pub fn product_type(&self) -> ProductType {
        ProductType::from_tag(&self.product_tag)
    }

    /// Scale trimmed and upper-cased.
    pub fn normalized_scale(&self) -> String {
        self.scale.trim().to_ascii_uppercase()
    }

    /// Image height in pixels.
    pub fn lines(&self) -> u64 {
        self.frames_vertical as u64 * FRAME_DIM as u64
    }

    /// Image width in pixels.
    pub fn samples(&self) -> u64 {
        self.frames_horizontal as u64 * FRAME_DIM as u64
    }
}

impl<L: FrameLocator> CatalogEntry<L> {
    /// Whether none of the entry's frames exist.
    pub fn is_empty(&self) -> bool {
        !(0..self.frames_vertical)
            .any(|row| (0..self.frames_horizontal).any(|col| self.locator.exists(row, col)))
    }
}

/// A source of catalog entries.
pub trait Catalog {
    /// Locator type of the entries.
    type Locator: FrameLocator;

    /// All entries, in catalog order.
    fn entries(&self) -> &[CatalogEntry<Self::Locator>];

    /// Entry `index`, if present.
    fn entry(&self, index: usize) -> Option<&CatalogEntry<Self::Locator>> {
        self.entries().get(index)
    }
}

/// A catalog held in memory.
#[derive(Debug, Clone)]
pub struct MemoryCatalog<L> {
    entries: Vec<CatalogEntry<L>>,
}

impl<L> Default for MemoryCatalog<L> {
    fn default() -> Self {
        MemoryCatalog {
            entries: Vec::new(),
        }
    }
}

impl<L: FrameLocator> MemoryCatalog<L> {
    /// Create a catalog from entries.
    pub fn new(entries: Vec<CatalogEntry<L>>) -> Self {
        MemoryCatalog { entries }
    }

    /// Append an entry.
    pub fn push(&mut self, entry: CatalogEntry<L>) {
        self.entries.push(entry);
    }
}

impl<L: FrameLocator> Catalog for MemoryCatalog<L> {
    type Locator = L;

    fn entries(&self) -> &[CatalogEntry<L>] {
        &self.entries
    }
}

/// Distinct product scales, in catalog order.
///
/// Only chart scales (`"1:250K"`, containing a colon) and imagery
/// resolutions (`"10M"`, ending in `M`) count; other scale strings are
/// ignored.
pub fn product_scales<C: Catalog + ?Sized>(catalog: &C) -> Vec<String> {
    let mut scales: Vec<String> = Vec::new();
    for entry in catalog.entries() {
        let scale = entry.normalized_scale();
        if scale.is_empty() {
            continue;
        }
        let is_product_scale = scale.contains(':') || scale.ends_with('M');
        if is_product_scale && !scales.contains(&scale) {
            scales.push(scale);
        }
    }
    scales
}

/// Indices of entries at `scale`, skipping entries with no frames unless
/// `skip_empty_check` is set.
pub fn entries_for_scale<C: Catalog + ?Sized>(
    catalog: &C,
    scale: &str,
    skip_empty_check: bool,
) -> Vec<usize> {
    let scale = scale.trim().to_ascii_uppercase();
    catalog
        .entries()
        .iter()
        .enumerate()
        .filter(|(_, entry)| skip_empty_check || !entry.is_empty())
        .filter(|(_, entry)| entry.normalized_scale() == scale)
        .map(|(index, _)| index)
        .collect()
}

/// Renderable entry indices grouped by product scale, in scale order.
pub fn entry_list<C: Catalog + ?Sized>(catalog: &C, skip_empty_check: bool) -> Vec<usize> {
    product_scales(catalog)
        .iter()
        .flat_map(|scale| entries_for_scale(catalog, scale, skip_empty_check))
        .collect()
}
