//! Frame collaborators: where frames live and how their sections are read.
//!
//! Parsing RPF frame headers is not done here. A [`FrameReader`] hands the
//! compositor an opened frame exposing its codebook, palette and compressed
//! sub-frames; [`FileFrame`] covers the common case where the headers have
//! been parsed elsewhere and only the spatial data must be read from disk.

use crate::{Result, TileError};
use rpf_codec::{Codebook, Palette, COMPRESSED_BYTES, SUBFRAMES_PER_FRAME};
use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Sub-frame offset meaning "no data stored" in an RPF mask table.
pub const NULL_SUBFRAME_OFFSET: u32 = 0xFFFF_FFFF;

/// Number of sub-frames in a frame.
const SUBFRAME_COUNT: usize = (SUBFRAMES_PER_FRAME * SUBFRAMES_PER_FRAME) as usize;

/// Looks up frame files by their position in the on-disk frame grid.
///
/// Rows are disk rows: row 0 is the bottom row of the grid.
pub trait FrameLocator {
    /// Whether a frame is stored at `(row, col)`.
    fn exists(&self, row: u32, col: u32) -> bool;

    /// Path of the frame at `(row, col)`, if the grid has an entry there.
    fn path(&self, row: u32, col: u32) -> Option<PathBuf>;
}

/// Whether a sub-frame read produced data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubframeRead {
    /// The buffer now holds the compressed sub-frame.
    Present,
    /// The frame stores no data for this sub-frame; it renders blank.
    Masked,
}

/// An opened frame.
pub trait FrameData {
    /// The frame's compression lookup tables.
    fn codebook(&self) -> &Codebook;

    /// The frame's color or grayscale table.
    fn palette(&self) -> &Palette;

    /// Read the compressed bytes of sub-frame `(row, col)` into `buf`.
    fn read_subframe(
        &self,
        row: u32,
        col: u32,
        buf: &mut [u8; COMPRESSED_BYTES],
    ) -> Result<SubframeRead>;
}

impl<F: FrameData + ?Sized> FrameData for Arc<F> {
    fn codebook(&self) -> &Codebook {
        (**self).codebook()
    }

    fn palette(&self) -> &Palette {
        (**self).palette()
    }

    fn read_subframe(
        &self,
        row: u32,
        col: u32,
        buf: &mut [u8; COMPRESSED_BYTES],
    ) -> Result<SubframeRead> {
        (**self).read_subframe(row, col, buf)
    }
}

/// Opens frame files.
pub trait FrameReader {
    /// The opened frame type.
    type Frame: FrameData;

    /// Open the frame stored at `path`.
    fn open_frame(&self, path: &Path) -> Result<Self::Frame>;
}

fn check_subframe(row: u32, col: u32) -> Result<usize> {
    if row >= SUBFRAMES_PER_FRAME || col >= SUBFRAMES_PER_FRAME {
        return Err(TileError::SubframeOutOfRange { row, col });
    }
    Ok((row * SUBFRAMES_PER_FRAME + col) as usize)
}

// ============================================================================
// Frame grid
// ============================================================================

/// A [`FrameLocator`] over an explicit `(disk row, column) -> path` map.
#[derive(Debug, Clone, Default)]
pub struct FrameGrid {
    paths: HashMap<(u32, u32), PathBuf>,
    verify_files: bool,
}

impl FrameGrid {
    /// Create an empty grid. Listed frames are trusted to exist.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty grid that also checks the file system before
    /// reporting a frame as present.
    pub fn verifying_files() -> Self {
        FrameGrid {
            paths: HashMap::new(),
            verify_files: true,
        }
    }

    /// Record the frame stored at disk row `row`, column `col`.
    pub fn insert<P: Into<PathBuf>>(&mut self, row: u32, col: u32, path: P) {
        self.paths.insert((row, col), path.into());
    }

    /// Builder form of [`FrameGrid::insert`].
    pub fn with_frame<P: Into<PathBuf>>(mut self, row: u32, col: u32, path: P) -> Self {
        self.insert(row, col, path);
        self
    }

    /// Forget the frame at `(row, col)`.
    pub fn remove(&mut self, row: u32, col: u32) -> Option<PathBuf> {
        self.paths.remove(&(row, col))
    }

    /// Number of listed frames.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Whether no frames are listed.
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl FrameLocator for FrameGrid {
    fn exists(&self, row: u32, col: u32) -> bool {
        match self.paths.get(&(row, col)) {
            Some(path) => !self.verify_files || path.is_file(),
            None => false,
        }
    }

    fn path(&self, row: u32, col: u32) -> Option<PathBuf> {
        self.paths.get(&(row, col)).cloned()
    }
}

// ============================================================================
// In-memory frames
// ============================================================================

/// A frame held entirely in memory.
#[derive(Debug, Clone)]
pub struct MemoryFrame {
    codebook: Codebook,
    palette: Palette,
    subframes: Vec<Option<Vec<u8>>>,
}

impl MemoryFrame {
    /// Create a frame with no sub-frame data (every sub-frame masked).
    pub fn new(codebook: Codebook, palette: Palette) -> Self {
        MemoryFrame {
            codebook,
            palette,
            subframes: vec![None; SUBFRAME_COUNT],
        }
    }

    /// Store the compressed bytes of sub-frame `(row, col)`.
    ///
    /// The length is checked when the sub-frame is read, so malformed
    /// frames can be modelled.
    pub fn set_subframe(&mut self, row: u32, col: u32, bytes: Vec<u8>) -> Result<()> {
        let index = check_subframe(row, col)?;
        self.subframes[index] = Some(bytes);
        Ok(())
    }

    /// Store the same compressed bytes in every sub-frame.
    pub fn fill_subframes(mut self, bytes: &[u8]) -> Self {
        for slot in &mut self.subframes {
            *slot = Some(bytes.to_vec());
        }
        self
    }

    /// Mark sub-frame `(row, col)` as having no data.
    pub fn mask_subframe(&mut self, row: u32, col: u32) -> Result<()> {
        let index = check_subframe(row, col)?;
        self.subframes[index] = None;
        Ok(())
    }
}

impl FrameData for MemoryFrame {
    fn codebook(&self) -> &Codebook {
        &self.codebook
    }

    fn palette(&self) -> &Palette {
        &self.palette
    }

    fn read_subframe(
        &self,
        row: u32,
        col: u32,
        buf: &mut [u8; COMPRESSED_BYTES],
    ) -> Result<SubframeRead> {
        let index = check_subframe(row, col)?;
        match &self.subframes[index] {
            Some(bytes) => {
                buf.copy_from_slice(rpf_codec::as_compressed(bytes)?);
                Ok(SubframeRead::Present)
            }
            None => Ok(SubframeRead::Masked),
        }
    }
}

/// A [`FrameReader`] serving [`MemoryFrame`]s keyed by path.
///
/// Counts how many times frames were opened, which makes cache and
/// coverage behavior observable.
#[derive(Debug, Default)]
pub struct MemoryFrameReader {
    frames: HashMap<PathBuf, Arc<MemoryFrame>>,
    opens: AtomicUsize,
}

impl MemoryFrameReader {
    /// Create an empty reader.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `frame` under `path`.
    pub fn insert<P: Into<PathBuf>>(&mut self, path: P, frame: MemoryFrame) {
        self.frames.insert(path.into(), Arc::new(frame));
    }

    /// Builder form of [`MemoryFrameReader::insert`].
    pub fn with_frame<P: Into<PathBuf>>(mut self, path: P, frame: MemoryFrame) -> Self {
        self.insert(path, frame);
        self
    }

    /// Number of successful and failed `open_frame` calls so far.
    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::Relaxed)
    }
}

impl FrameReader for MemoryFrameReader {
    type Frame = Arc<MemoryFrame>;

    fn open_frame(&self, path: &Path) -> Result<Self::Frame> {
        self.opens.fetch_add(1, Ordering::Relaxed);
        self.frames.get(path).cloned().ok_or_else(|| {
            TileError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no frame registered at {}", path.display()),
            ))
        })
    }
}

// ============================================================================
// File-backed frames
// ============================================================================

/// The parsed sections of a frame file needed to decode it.
#[derive(Debug, Clone)]
pub struct FrameSections {
    /// Compression lookup tables.
    pub codebook: Codebook,
    /// Color or grayscale table.
    pub palette: Palette,
    /// Byte offset of the spatial data subsection within the file.
    pub spatial_data_offset: u64,
    /// Per-sub-frame offsets relative to the spatial data, row-major over
    /// the 6 x 6 grid. `None` entries have no data. Without a mask table
    /// sub-frames are stored contiguously.
    pub subframe_offsets: Option<Vec<Option<u32>>>,
}

impl FrameSections {
    /// Sections of a frame whose sub-frames are stored contiguously.
    pub fn new(codebook: Codebook, palette: Palette, spatial_data_offset: u64) -> Self {
        FrameSections {
            codebook,
            palette,
            spatial_data_offset,
            subframe_offsets: None,
        }
    }

    /// Attach a raw sub-frame mask table, row-major over the sub-frame grid.
    ///
    /// [`NULL_SUBFRAME_OFFSET`] marks a sub-frame without data.
    pub fn with_mask_table(mut self, raw: &[u32]) -> Self {
        let mut offsets = vec![None; SUBFRAME_COUNT];
        for (slot, &value) in offsets.iter_mut().zip(raw) {
            *slot = (value != NULL_SUBFRAME_OFFSET).then_some(value);
        }
        self.subframe_offsets = Some(offsets);
        self
    }

    /// Absolute file offset of sub-frame `(row, col)`, `None` if masked.
    pub fn subframe_offset(&self, row: u32, col: u32) -> Result<Option<u64>> {
        let index = check_subframe(row, col)?;
        let relative = match &self.subframe_offsets {
            Some(offsets) => match offsets.get(index).copied().flatten() {
                Some(offset) => offset as u64,
                None => return Ok(None),
            },
            None => (COMPRESSED_BYTES * index) as u64,
        };
        Ok(Some(self.spatial_data_offset + relative))
    }
}

/// A frame whose compressed sub-frames are read from disk on demand.
#[derive(Debug, Clone)]
pub struct FileFrame {
    path: PathBuf,
    sections: FrameSections,
}

impl FileFrame {
    /// Create a frame reading spatial data from `path`.
    pub fn new<P: Into<PathBuf>>(path: P, sections: FrameSections) -> Self {
        FileFrame {
            path: path.into(),
            sections,
        }
    }

    /// Path of the frame file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The parsed sections.
    pub fn sections(&self) -> &FrameSections {
        &self.sections
    }
}

impl FrameData for FileFrame {
    fn codebook(&self) -> &Codebook {
        &self.sections.codebook
    }

    fn palette(&self) -> &Palette {
        &self.sections.palette
    }

    fn read_subframe(
        &self,
        row: u32,
        col: u32,
        buf: &mut [u8; COMPRESSED_BYTES],
    ) -> Result<SubframeRead> {
        let Some(offset) = self.sections.subframe_offset(row, col)? else {
            return Ok(SubframeRead::Masked);
        };
        let mut file = File::open(&self.path)?;
        file.seek(SeekFrom::Start(offset))?;
        file.read_exact(buf)?;
        Ok(SubframeRead::Present)
    }
}

/// A [`FrameReader`] producing [`FileFrame`]s from a section parser.
pub struct FileFrameReader<P> {
    parse: P,
}

impl<P> FileFrameReader<P>
where
    P: Fn(&Path) -> Result<FrameSections>,
{
    /// Create a reader that parses frame headers with `parse`.
    pub fn new(parse: P) -> Self {
        FileFrameReader { parse }
    }
}

impl<P> std::fmt::Debug for FileFrameReader<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileFrameReader").finish_non_exhaustive()
    }
}

impl<P> FrameReader for FileFrameReader<P>
where
    P: Fn(&Path) -> Result<FrameSections>,
{
    type Frame = FileFrame;

    fn open_frame(&self, path: &Path) -> Result<Self::Frame> {
        let sections = (self.parse)(path)?;
        Ok(FileFrame::new(path, sections))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sections() -> FrameSections {
        FrameSections::new(Codebook::zeroed(), Palette::grayscale(&[0, 255]).unwrap(), 100)
    }

    #[test]
    fn test_frame_grid_lookup() {
        let grid = FrameGrid::new().with_frame(1, 0, "a.i42");
        assert!(grid.exists(1, 0));
        assert!(!grid.exists(0, 0));
        assert_eq!(grid.path(1, 0), Some(PathBuf::from("a.i42")));
        assert_eq!(grid.path(0, 1), None);
    }

    #[test]
    fn test_verifying_grid_checks_disk() {
        let dir = tempfile::tempdir().unwrap();
        let present = dir.path().join("present.i42");
        std::fs::write(&present, b"x").unwrap();
        let grid = FrameGrid::verifying_files()
            .with_frame(0, 0, &present)
            .with_frame(0, 1, dir.path().join("missing.i42"));
        assert!(grid.exists(0, 0));
        assert!(!grid.exists(0, 1));
    }

    #[test]
    fn test_contiguous_offsets() {
        let sections = sections();
        assert_eq!(sections.subframe_offset(0, 0).unwrap(), Some(100));
        assert_eq!(sections.subframe_offset(0, 1).unwrap(), Some(100 + 6144));
        assert_eq!(sections.subframe_offset(1, 0).unwrap(), Some(100 + 6 * 6144));
        assert!(matches!(
            sections.subframe_offset(6, 0),
            Err(TileError::SubframeOutOfRange { row: 6, col: 0 })
        ));
    }

    #[test]
    fn test_mask_table_offsets() {
        let mut raw = vec![NULL_SUBFRAME_OFFSET; 36];
        raw[7] = 0;
        let sections = sections().with_mask_table(&raw);
        assert_eq!(sections.subframe_offset(1, 1).unwrap(), Some(100));
        assert_eq!(sections.subframe_offset(0, 0).unwrap(), None);
    }

    #[test]
    fn test_file_frame_reads_subframe() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let mut contents = vec![0xEEu8; 100];
        contents.extend(std::iter::repeat(1u8).take(COMPRESSED_BYTES));
        contents.extend(std::iter::repeat(2u8).take(COMPRESSED_BYTES));
        file.write_all(&contents).unwrap();

        let frame = FileFrame::new(file.path(), sections());
        let mut buf = [0u8; COMPRESSED_BYTES];
        assert_eq!(frame.read_subframe(0, 1, &mut buf).unwrap(), SubframeRead::Present);
        assert!(buf.iter().all(|&b| b == 2));

        // Sub-frame (0, 2) lies past the end of the file.
        assert!(matches!(frame.read_subframe(0, 2, &mut buf), Err(TileError::Io(_))));
    }

    #[test]
    fn test_memory_frame_subframes() {
        let mut frame = MemoryFrame::new(Codebook::zeroed(), Palette::default());
        let mut buf = [0u8; COMPRESSED_BYTES];
        assert_eq!(frame.read_subframe(2, 3, &mut buf).unwrap(), SubframeRead::Masked);

        frame.set_subframe(2, 3, vec![9; COMPRESSED_BYTES]).unwrap();
        assert_eq!(frame.read_subframe(2, 3, &mut buf).unwrap(), SubframeRead::Present);
        assert_eq!(buf[0], 9);

        frame.set_subframe(2, 3, vec![9; 12]).unwrap();
        assert!(matches!(frame.read_subframe(2, 3, &mut buf), Err(TileError::Codec(_))));
        assert!(frame.set_subframe(0, 6, Vec::new()).is_err());
    }

    #[test]
    fn test_memory_reader_counts_opens() {
        let reader = MemoryFrameReader::new()
            .with_frame("f.i42", MemoryFrame::new(Codebook::zeroed(), Palette::default()));
        assert!(reader.open_frame(Path::new("f.i42")).is_ok());
        assert!(matches!(reader.open_frame(Path::new("g.i42")), Err(TileError::Io(_))));
        assert_eq!(reader.open_count(), 2);
    }
}
