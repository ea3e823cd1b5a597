//! Color/grayscale tables mapping palette indices to pixel values.

use crate::constants::PALETTE_ENTRIES;
use crate::{CodecError, ProductType, Result};

/// The color table of one frame.
///
/// Always holds 256 slots so any one-byte index is addressable; `len`
/// records how many slots the frame actually defined. Grayscale tables keep
/// their value in the first channel of each slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    entries: [[u8; 3]; PALETTE_ENTRIES],
    len: usize,
}

impl Default for Palette {
    fn default() -> Self {
        Palette {
            entries: [[0; 3]; PALETTE_ENTRIES],
            len: 0,
        }
    }
}

impl Palette {
    /// Build a single-channel palette.
    pub fn grayscale(values: &[u8]) -> Result<Self> {
        Self::check_len(values.len())?;
        let mut palette = Self::default();
        for (slot, &value) in palette.entries.iter_mut().zip(values) {
            *slot = [value, 0, 0];
        }
        palette.len = values.len();
        Ok(palette)
    }

    /// Build a three-channel palette.
    pub fn rgb(colors: &[[u8; 3]]) -> Result<Self> {
        Self::check_len(colors.len())?;
        let mut palette = Self::default();
        palette.entries[..colors.len()].copy_from_slice(colors);
        palette.len = colors.len();
        Ok(palette)
    }

    /// Build a palette from a packed color table whose records are `stride`
    /// bytes long (e.g. 4 for RGBM CADRG tables, 1 for CIB grayscale).
    ///
    /// At most the first three bytes of each record are kept. A trailing
    /// partial record is ignored.
    pub fn from_packed(data: &[u8], stride: usize) -> Result<Self> {
        if stride == 0 {
            return Ok(Self::default());
        }
        let count = data.len() / stride;
        Self::check_len(count)?;
        let mut palette = Self::default();
        for (slot, record) in palette.entries.iter_mut().zip(data.chunks_exact(stride)) {
            let keep = record.len().min(3);
            slot[..keep].copy_from_slice(&record[..keep]);
        }
        palette.len = count;
        Ok(palette)
    }

    fn check_len(len: usize) -> Result<()> {
        if len > PALETTE_ENTRIES {
            return Err(CodecError::PaletteLength {
                max: PALETTE_ENTRIES,
                actual: len,
            });
        }
        Ok(())
    }

    /// Number of entries the frame defined.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the frame defined no entries at all.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The stored channels of slot `index`.
    #[inline]
    pub fn color(&self, index: u8) -> [u8; 3] {
        self.entries[index as usize]
    }

    /// Channel `band` of slot `index`.
    ///
    /// # Panics
    /// Panics if `band >= 3`.
    #[inline]
    pub fn sample(&self, index: u8, band: usize) -> u8 {
        self.entries[index as usize][band]
    }

    /// Expand this palette into a three-channel lookup table for `product`.
    ///
    /// Returns `None` for an unknown product or an empty palette.
    pub fn to_lut(&self, product: ProductType) -> Option<ColorLut> {
        if self.is_empty() {
            return None;
        }
        let defined = &self.entries[..self.len];
        let entries = match product {
            ProductType::Unknown => return None,
            ProductType::Grayscale => defined.iter().map(|c| [c[0], c[0], c[0]]).collect(),
            ProductType::Rgb => defined.to_vec(),
        };
        Some(ColorLut { entries })
    }
}

/// Three-channel lookup table describing how palette indices render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorLut {
    entries: Vec<[u8; 3]>,
}

impl ColorLut {
    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// RGB triple for `index`, if defined.
    pub fn get(&self, index: usize) -> Option<[u8; 3]> {
        self.entries.get(index).copied()
    }

    /// All entries in index order.
    pub fn entries(&self) -> &[[u8; 3]] {
        &self.entries
    }
}
