//! Band-sequential pixel addressing.
//!
//! Every 8-bit buffer in the workspace (decoded sub-frames and output tiles)
//! is laid out band-sequentially, and every pixel access goes through
//! [`BsqLayout::offset`]:
//!
//! ```text
//! offset(row, col, band) = band * width * height + row * width + col
//! ```

use crate::constants::SUBFRAME_DIM;
use crate::ProductType;

/// Shape of a band-sequential buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BsqLayout {
    /// Columns per row.
    pub width: usize,
    /// Rows per band.
    pub height: usize,
    /// Number of bands.
    pub bands: usize,
}

impl BsqLayout {
    /// Create a layout.
    pub const fn new(width: usize, height: usize, bands: usize) -> Self {
        BsqLayout {
            width,
            height,
            bands,
        }
    }

    /// Samples in one band.
    pub const fn band_len(&self) -> usize {
        self.width * self.height
    }

    /// Total buffer length in bytes.
    pub const fn len(&self) -> usize {
        self.band_len() * self.bands
    }

    /// Whether the buffer holds no samples.
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `(row, col, band)` lies inside the buffer.
    pub const fn contains(&self, row: usize, col: usize, band: usize) -> bool {
        row < self.height && col < self.width && band < self.bands
    }

    /// Offset of `(row, col, band)`, or `None` if outside the buffer.
    #[inline]
    pub fn offset(&self, row: usize, col: usize, band: usize) -> Option<usize> {
        self.contains(row, col, band)
            .then(|| band * self.band_len() + row * self.width + col)
    }

    /// Range of the first `count` samples of `row` in `band`, starting at `col`.
    ///
    /// Returns `None` unless the whole span is inside the row.
    pub fn row_span(
        &self,
        row: usize,
        col: usize,
        count: usize,
        band: usize,
    ) -> Option<std::ops::Range<usize>> {
        if count == 0 || col + count > self.width {
            return None;
        }
        let start = self.offset(row, col, band)?;
        Some(start..start + count)
    }
}

/// One decoded sub-frame: `SUBFRAME_DIM` x `SUBFRAME_DIM` pixels per band.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBlock {
    product: ProductType,
    layout: BsqLayout,
    data: Vec<u8>,
}

impl PixelBlock {
    /// Allocate a blank (all zero) block for `product`.
    pub fn new(product: ProductType) -> Self {
        let dim = SUBFRAME_DIM as usize;
        let layout = BsqLayout::new(dim, dim, product.bands());
        PixelBlock {
            product,
            layout,
            data: vec![0; layout.len()],
        }
    }

    /// Product whose band layout this block holds.
    pub fn product(&self) -> ProductType {
        self.product
    }

    /// Layout of the block.
    pub fn layout(&self) -> BsqLayout {
        self.layout
    }

    /// Number of bands.
    pub fn bands(&self) -> usize {
        self.layout.bands
    }

    /// Sample at `(row, col, band)`, or `None` if outside the block.
    pub fn get(&self, row: usize, col: usize, band: usize) -> Option<u8> {
        self.layout.offset(row, col, band).map(|i| self.data[i])
    }

    /// Write a sample; writes outside the block are ignored and return false.
    #[inline]
    pub fn set(&mut self, row: usize, col: usize, band: usize, value: u8) -> bool {
        match self.layout.offset(row, col, band) {
            Some(i) => {
                self.data[i] = value;
                true
            }
            None => false,
        }
    }

    /// Reset every sample to zero.
    pub fn clear(&mut self) {
        self.data.fill(0);
    }

    /// Raw band-sequential bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Samples of `row` in `band` between columns `col` and `col + count`.
    pub fn row(&self, row: usize, col: usize, count: usize, band: usize) -> Option<&[u8]> {
        self.layout
            .row_span(row, col, count, band)
            .map(|span| &self.data[span])
    }
}
