//! Pixel-space rectangles.

/// A half-open pixel rectangle `[x0, x1) x [y0, y1)`.
///
/// `x` runs along columns (samples), `y` along rows (lines). Coordinates may
/// be negative so requests partly or wholly outside an image can be
/// expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PixelRect {
    /// First column.
    pub x0: i64,
    /// First row.
    pub y0: i64,
    /// One past the last column.
    pub x1: i64,
    /// One past the last row.
    pub y1: i64,
}

impl PixelRect {
    /// Create a rectangle from its corners. Inverted corners give an empty rectangle.
    pub fn new(x0: i64, y0: i64, x1: i64, y1: i64) -> Self {
        PixelRect {
            x0,
            y0,
            x1: x1.max(x0),
            y1: y1.max(y0),
        }
    }

    /// Create a rectangle from its upper-left corner and size, saturating at
    /// the edge of the `i64` range.
    pub fn from_origin(x: i64, y: i64, width: u32, height: u32) -> Self {
        PixelRect::new(
            x,
            y,
            x.saturating_add(width as i64),
            y.saturating_add(height as i64),
        )
    }

    /// Number of columns. Exact for any pair of `i64` edges.
    pub fn width(&self) -> u64 {
        span(self.x0, self.x1)
    }

    /// Number of rows. Exact for any pair of `i64` edges.
    pub fn height(&self) -> u64 {
        span(self.y0, self.y1)
    }

    /// Whether the rectangle covers no pixels.
    pub fn is_empty(&self) -> bool {
        self.x1 <= self.x0 || self.y1 <= self.y0
    }

    /// Whether pixel `(x, y)` is inside.
    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= self.x0 && x < self.x1 && y >= self.y0 && y < self.y1
    }

    /// The overlap of two rectangles, `None` if they share no pixel.
    pub fn intersection(&self, other: &PixelRect) -> Option<PixelRect> {
        let rect = PixelRect::new(
            self.x0.max(other.x0),
            self.y0.max(other.y0),
            self.x1.min(other.x1),
            self.y1.min(other.y1),
        );
        (!rect.is_empty()).then_some(rect)
    }

    /// Whether two rectangles share at least one pixel.
    pub fn intersects(&self, other: &PixelRect) -> bool {
        self.intersection(other).is_some()
    }

    /// Shift by `(dx, dy)`, saturating at the edge of the `i64` range.
    pub fn translate(&self, dx: i64, dy: i64) -> PixelRect {
        PixelRect {
            x0: self.x0.saturating_add(dx),
            y0: self.y0.saturating_add(dy),
            x1: self.x1.saturating_add(dx),
            y1: self.y1.saturating_add(dy),
        }
    }
}

/// `hi - lo` for `lo <= hi`, widened so the full `i64` range fits.
fn span(lo: i64, hi: i64) -> u64 {
    (hi as i128 - lo as i128).max(0) as u64
}

impl std::fmt::Display for PixelRect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "x:[{}, {}) y:[{}, {})", self.x0, self.x1, self.y0, self.y1)
    }
}
