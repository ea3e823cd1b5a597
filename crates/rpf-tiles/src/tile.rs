//! Output tiles.

use crate::{PixelRect, Result, TileError};
use rpf_codec::{BsqLayout, PixelBlock};

/// Buffer layout for `rect`, `None` if it cannot be allocated as one tile.
fn tile_layout(rect: &PixelRect, bands: usize) -> Option<BsqLayout> {
    let width = usize::try_from(u32::try_from(rect.width()).ok()?).ok()?;
    let height = usize::try_from(u32::try_from(rect.height()).ok()?).ok()?;
    width.checked_mul(height)?.checked_mul(bands)?;
    Some(BsqLayout::new(width, height, bands))
}

/// How much of a tile holds image data.
///
/// A pixel is blank when every band is zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileStatus {
    /// Every pixel is blank.
    Empty,
    /// Some pixels are blank.
    Partial,
    /// No pixel is blank.
    Full,
}

/// A requested rectangle of 8-bit band-sequential pixels.
///
/// Each `get_tile` call returns a new, caller-owned tile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    rect: PixelRect,
    layout: BsqLayout,
    data: Vec<u8>,
    status: TileStatus,
}

impl Tile {
    /// Create an all-blank tile covering `rect`.
    ///
    /// Fails with [`TileError::RectTooLarge`] if either side exceeds
    /// `u32::MAX` pixels or the buffer size overflows `usize`.
    pub fn blank(rect: PixelRect, bands: usize) -> Result<Self> {
        let layout = tile_layout(&rect, bands).ok_or(TileError::RectTooLarge(rect))?;
        Ok(Tile {
            rect,
            layout,
            data: vec![0; layout.len()],
            status: TileStatus::Empty,
        })
    }

    /// Create a tile from existing band-sequential bytes.
    ///
    /// Returns `None` if `data` does not match the rectangle and band count.
    pub fn from_bytes(rect: PixelRect, bands: usize, data: Vec<u8>) -> Option<Self> {
        let layout = tile_layout(&rect, bands)?;
        if data.len() != layout.len() {
            return None;
        }
        let mut tile = Tile {
            rect,
            layout,
            data,
            status: TileStatus::Empty,
        };
        tile.validate();
        Some(tile)
    }

    /// Pixel rectangle covered by the tile.
    pub fn rect(&self) -> PixelRect {
        self.rect
    }

    /// Number of bands.
    pub fn bands(&self) -> usize {
        self.layout.bands
    }

    /// Width in pixels.
    pub fn width(&self) -> usize {
        self.layout.width
    }

    /// Height in pixels.
    pub fn height(&self) -> usize {
        self.layout.height
    }

    /// Buffer layout.
    pub fn layout(&self) -> BsqLayout {
        self.layout
    }

    /// Data status as of the last [`Tile::validate`].
    pub fn status(&self) -> TileStatus {
        self.status
    }

    /// Sample at tile-local `(row, col)`.
    pub fn get(&self, row: usize, col: usize, band: usize) -> Option<u8> {
        self.layout.offset(row, col, band).map(|i| self.data[i])
    }

    /// Sample at absolute image pixel `(x, y)`.
    pub fn pixel(&self, x: i64, y: i64, band: usize) -> Option<u8> {
        if !self.rect.contains(x, y) {
            return None;
        }
        self.get((y - self.rect.y0) as usize, (x - self.rect.x0) as usize, band)
    }

    /// All samples of one band.
    pub fn band(&self, band: usize) -> Option<&[u8]> {
        if band >= self.layout.bands {
            return None;
        }
        let len = self.layout.band_len();
        Some(&self.data[band * len..(band + 1) * len])
    }

    /// Raw band-sequential bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Consume the tile, returning its bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Whether every pixel is blank.
    pub fn is_blank(&self) -> bool {
        self.data.iter().all(|&b| b == 0)
    }

    /// Reset every sample to blank.
    pub fn make_blank(&mut self) {
        self.data.fill(0);
        self.status = TileStatus::Empty;
    }

    /// Recompute [`Tile::status`] from the pixel data.
    pub fn validate(&mut self) -> TileStatus {
        let band_len = self.layout.band_len();
        let mut blank = 0usize;
        for i in 0..band_len {
            let is_blank = (0..self.layout.bands).all(|b| self.data[b * band_len + i] == 0);
            if is_blank {
                blank += 1;
            }
        }
        self.status = if band_len == 0 || blank == band_len {
            TileStatus::Empty
        } else if blank == 0 {
            TileStatus::Full
        } else {
            TileStatus::Partial
        };
        self.status
    }

    /// Copy the part of `block` that overlaps this tile. `block_rect` is the
    /// absolute pixel rectangle the block covers.
    ///
    /// Returns the number of pixels copied.
    pub(crate) fn copy_block(&mut self, block: &PixelBlock, block_rect: PixelRect) -> usize {
        let Some(clip) = block_rect.intersection(&self.rect) else {
            return 0;
        };
        let count = clip.width() as usize;
        let src_col = (clip.x0 - block_rect.x0) as usize;
        let dst_col = (clip.x0 - self.rect.x0) as usize;
        let bands = self.layout.bands.min(block.bands());
        for y in clip.y0..clip.y1 {
            let src_row = (y - block_rect.y0) as usize;
            let dst_row = (y - self.rect.y0) as usize;
            for band in 0..bands {
                let (Some(src), Some(dst)) = (
                    block.row(src_row, src_col, count, band),
                    self.layout.row_span(dst_row, dst_col, count, band),
                ) else {
                    continue;
                };
                self.data[dst].copy_from_slice(src);
            }
        }
        count * clip.height() as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rpf_codec::ProductType;

    #[test]
    fn test_blank_tile() {
        let tile = Tile::blank(PixelRect::new(10, 20, 14, 23), 3).unwrap();
        assert_eq!(tile.width(), 4);
        assert_eq!(tile.height(), 3);
        assert_eq!(tile.as_bytes().len(), 36);
        assert!(tile.is_blank());
        assert_eq!(tile.status(), TileStatus::Empty);
        assert_eq!(tile.pixel(13, 22, 2), Some(0));
        assert_eq!(tile.pixel(14, 22, 0), None);
    }

    #[test]
    fn test_oversized_rect_rejected() {
        let rect = PixelRect::new(0, 0, (1 << 32) + 4, 2);
        assert!(matches!(Tile::blank(rect, 1), Err(TileError::RectTooLarge(r)) if r == rect));
        let rect = PixelRect::new(i64::MIN, 0, i64::MAX, 1);
        assert!(matches!(Tile::blank(rect, 3), Err(TileError::RectTooLarge(_))));
        assert!(Tile::from_bytes(rect, 1, Vec::new()).is_none());
    }

    #[test]
    fn test_validate_status() {
        let rect = PixelRect::new(0, 0, 2, 1);
        // Pixel 0 has data in band 1 only, pixel 1 is blank.
        let mut tile = Tile::from_bytes(rect, 2, vec![0, 0, 5, 0]).unwrap();
        assert_eq!(tile.status(), TileStatus::Partial);
        tile.data[1] = 1;
        assert_eq!(tile.validate(), TileStatus::Full);
        tile.make_blank();
        assert_eq!(tile.validate(), TileStatus::Empty);
        assert!(Tile::from_bytes(rect, 2, vec![0; 3]).is_none());
    }

    #[test]
    fn test_copy_block_clips() {
        let mut block = PixelBlock::new(ProductType::Grayscale);
        for row in 0..256 {
            for col in 0..256 {
                block.set(row, col, 0, (row + col) as u8);
            }
        }
        // Block covers x:[256,512) y:[0,256); tile straddles its left edge.
        let mut tile = Tile::blank(PixelRect::new(250, 10, 260, 12), 1).unwrap();
        let copied = tile.copy_block(&block, PixelRect::from_origin(256, 0, 256, 256));
        assert_eq!(copied, 4 * 2);
        assert_eq!(tile.pixel(255, 10, 0), Some(0));
        assert_eq!(tile.pixel(256, 10, 0), Some(10));
        assert_eq!(tile.pixel(259, 11, 0), Some(14));
        assert_eq!(tile.band(0).unwrap().len(), 20);
    }
}
