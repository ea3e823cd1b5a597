//! Tile assembly from the frames and sub-frames a rectangle covers.
//!
//! Output rows count down from the top of the image while the on-disk frame
//! grid has its origin at the bottom. Every frame lookup goes through
//! [`disk_row`] so the inversion lives in one place.

use crate::cache::FrameStore;
use crate::frame::{FrameData, FrameLocator, FrameReader, SubframeRead};
use crate::telemetry::{DEGRADED_CELLS, SUBFRAMES_DECODED};
use crate::tile::Tile;
use crate::{PixelRect, Result, TileError};
use rpf_codec::{
    decode_subframe_checked, decode_subframe_into, PixelBlock, ProductType, COMPRESSED_BYTES,
    FRAME_DIM, SUBFRAME_DIM,
};
use std::path::Path;
use tracing::{trace, warn};

/// On-disk row of output frame row `frame_row` in a grid `frames_vertical`
/// frames tall.
///
/// `None` when `frame_row` is not inside the grid.
pub fn disk_row(frames_vertical: u32, frame_row: u32) -> Option<u32> {
    frames_vertical.checked_sub(1)?.checked_sub(frame_row)
}

/// A frame-grid cell touched by a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameCell {
    /// Frame row counted from the top of the image.
    pub row: u32,
    /// Frame column.
    pub col: u32,
    /// Frame row in the on-disk grid.
    pub disk_row: u32,
    /// Absolute pixel bounds of the frame.
    pub pixel_rect: PixelRect,
}

/// Builds tiles for one catalog entry.
///
/// Holds only borrowed, immutable state; all scratch buffers are allocated
/// per [`TileCompositor::get_tile`] call.
pub struct TileCompositor<'a, L, R: FrameReader> {
    frames_vertical: u32,
    frames_horizontal: u32,
    locator: &'a L,
    store: &'a FrameStore<R>,
    product: ProductType,
    strict: bool,
}

impl<'a, L: FrameLocator, R: FrameReader> TileCompositor<'a, L, R> {
    /// Create a compositor over a `frames_vertical` x `frames_horizontal` grid.
    pub fn new(
        frames_vertical: u32,
        frames_horizontal: u32,
        locator: &'a L,
        store: &'a FrameStore<R>,
        product: ProductType,
    ) -> Self {
        TileCompositor {
            frames_vertical,
            frames_horizontal,
            locator,
            store,
            product,
            strict: false,
        }
    }

    /// Fail with [`TileError::CorruptFrame`] instead of blanking frames
    /// that cannot be read or decoded.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Full pixel extent of the grid.
    pub fn image_rect(&self) -> PixelRect {
        PixelRect::new(
            0,
            0,
            self.frames_horizontal as i64 * FRAME_DIM as i64,
            self.frames_vertical as i64 * FRAME_DIM as i64,
        )
    }

    /// Frames overlapping `rect`, row-major from the top-left.
    pub fn covered_frames(&self, rect: &PixelRect) -> Vec<FrameCell> {
        let Some(clip) = rect.intersection(&self.image_rect()) else {
            return Vec::new();
        };
        let frame = FRAME_DIM as i64;
        let rows = (clip.y0 / frame) as u32..=((clip.y1 - 1) / frame) as u32;
        let cols = (clip.x0 / frame) as u32..=((clip.x1 - 1) / frame) as u32;

        let mut cells = Vec::new();
        for row in rows {
            let Some(on_disk) = disk_row(self.frames_vertical, row) else {
                continue;
            };
            for col in cols.clone() {
                cells.push(FrameCell {
                    row,
                    col,
                    disk_row: on_disk,
                    pixel_rect: PixelRect::from_origin(
                        col as i64 * frame,
                        row as i64 * frame,
                        FRAME_DIM,
                        FRAME_DIM,
                    ),
                });
            }
        }
        cells
    }

    /// Sub-frames `(row, col)` of the frame at `frame_rect` overlapping `rect`.
    pub fn covered_subframes(frame_rect: &PixelRect, rect: &PixelRect) -> Vec<(u32, u32)> {
        let Some(clip) = rect.intersection(frame_rect) else {
            return Vec::new();
        };
        let local = clip.translate(-frame_rect.x0, -frame_rect.y0);
        let sub = SUBFRAME_DIM as i64;
        let cols = (local.x0 / sub) as u32..=((local.x1 - 1) / sub) as u32;
        let rows = (local.y0 / sub) as u32..=((local.y1 - 1) / sub) as u32;
        rows.flat_map(|row| cols.clone().map(move |col| (row, col)))
            .collect()
    }

    /// Assemble the pixels of `rect`.
    ///
    /// Areas outside the image, without a stored frame, or masked in their
    /// frame are blank. Unreadable frames and sub-frames are blank too
    /// unless the compositor is strict. A rectangle too large for one tile
    /// fails with [`TileError::RectTooLarge`].
    pub fn get_tile(&self, rect: PixelRect) -> Result<Tile> {
        let mut tile = Tile::blank(rect, self.product.bands())?;
        let mut compressed = [0u8; COMPRESSED_BYTES];
        let mut block = PixelBlock::new(self.product);

        for cell in self.covered_frames(&rect) {
            self.composite_frame(&cell, &mut tile, &mut compressed, &mut block)?;
        }

        tile.validate();
        Ok(tile)
    }

    fn composite_frame(
        &self,
        cell: &FrameCell,
        tile: &mut Tile,
        compressed: &mut [u8; COMPRESSED_BYTES],
        block: &mut PixelBlock,
    ) -> Result<()> {
        if !self.locator.exists(cell.disk_row, cell.col) {
            trace!(row = cell.row, col = cell.col, "no frame stored");
            return Ok(());
        }
        let Some(path) = self.locator.path(cell.disk_row, cell.col) else {
            trace!(row = cell.row, col = cell.col, "frame has no path");
            return Ok(());
        };

        let frame = match self.store.open(&path) {
            Ok(frame) => frame,
            Err(err) => return self.degrade(&path, None, err),
        };
        if frame.palette().is_empty() {
            return self.degrade(
                &path,
                None,
                TileError::Configuration("frame defines no palette entries".to_string()),
            );
        }

        for (sub_row, sub_col) in Self::covered_subframes(&cell.pixel_rect, &tile.rect()) {
            match frame.read_subframe(sub_row, sub_col, compressed) {
                Ok(SubframeRead::Present) => {}
                Ok(SubframeRead::Masked) => {
                    trace!(sub_row, sub_col, path = %path.display(), "sub-frame masked");
                    continue;
                }
                Err(err) => {
                    self.degrade(&path, Some((sub_row, sub_col)), err)?;
                    continue;
                }
            }

            if self.strict {
                match decode_subframe_checked(
                    compressed,
                    frame.codebook(),
                    frame.palette(),
                    self.product,
                ) {
                    Ok(decoded) => *block = decoded,
                    Err(err) => return self.degrade(&path, Some((sub_row, sub_col)), err.into()),
                }
            } else {
                decode_subframe_into(compressed, frame.codebook(), frame.palette(), block);
            }
            metrics::counter!(SUBFRAMES_DECODED).increment(1);
            trace!(sub_row, sub_col, path = %path.display(), "decoded sub-frame");

            let block_rect = PixelRect::from_origin(
                cell.pixel_rect.x0 + (sub_col * SUBFRAME_DIM) as i64,
                cell.pixel_rect.y0 + (sub_row * SUBFRAME_DIM) as i64,
                SUBFRAME_DIM,
                SUBFRAME_DIM,
            );
            tile.copy_block(block, block_rect);
        }
        Ok(())
    }

    /// Blank a failed frame or sub-frame, or fail when strict.
    fn degrade(&self, path: &Path, subframe: Option<(u32, u32)>, err: TileError) -> Result<()> {
        if matches!(err, TileError::CacheLockPoisoned) {
            return Err(err);
        }
        if self.strict {
            let reason = match subframe {
                Some((row, col)) => format!("sub-frame ({row}, {col}): {err}"),
                None => err.to_string(),
            };
            return Err(TileError::CorruptFrame {
                path: path.to_path_buf(),
                reason,
            });
        }
        warn!(path = %path.display(), ?subframe, error = %err, "rendering blank");
        metrics::counter!(DEGRADED_CELLS).increment(1);
        Ok(())
    }
}
