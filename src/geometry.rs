//! Grid geometry: cell rectangles for a grid shape, canvas size and gap.
//!
//! Pure integer math, no allocations, `no_std` compatible.
//!
//! # Example
//!
//! ```
//! use zengrid::{CellRect, GridSpec};
//!
//! let spec = GridSpec::new(2, 2).gap(8).canvas(800, 600);
//!
//! // (800 - 8) / 2 = 396, (600 - 8) / 2 = 296
//! assert_eq!(spec.cell_rect(0, 1).unwrap(), CellRect::new(404, 0, 396, 296));
//! ```

use crate::error::{Axis, GridError};
use crate::fit::FitPolicy;

/// Canvas background color.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CanvasColor {
    /// Transparent black `[0, 0, 0, 0]`.
    #[default]
    Transparent,
    /// sRGB color with alpha (8-bit per channel).
    Srgb { r: u8, g: u8, b: u8, a: u8 },
}

impl CanvasColor {
    /// White, fully opaque.
    pub const fn white() -> Self {
        Self::rgb(255, 255, 255)
    }

    /// Black, fully opaque.
    pub const fn black() -> Self {
        Self::rgb(0, 0, 0)
    }

    /// Opaque sRGB color.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::Srgb { r, g, b, a: 255 }
    }

    /// Channels as `[r, g, b, a]`.
    pub const fn to_rgba(self) -> [u8; 4] {
        match self {
            Self::Transparent => [0, 0, 0, 0],
            Self::Srgb { r, g, b, a } => [r, g, b, a],
        }
    }
}

/// Width × height dimensions in pixels.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Size {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Size {
    /// Create a new size.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// One grid cell in canvas pixel coordinates.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct CellRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CellRect {
    /// Create a new cell rect.
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Exclusive right edge.
    pub const fn right(&self) -> u32 {
        self.x + self.width
    }

    /// Exclusive bottom edge.
    pub const fn bottom(&self) -> u32 {
        self.y + self.height
    }

    pub const fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Whether the two rects share at least one pixel.
    pub fn overlaps(&self, other: &CellRect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// Whether `(x, y)` lies inside this rect.
    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }
}

/// Grid shape, spacing and output canvas.
///
/// Always fully defined; build it with [`GridSpec::new`] and the chained
/// setters, or parse one from a query string with the `options` feature.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GridSpec {
    pub rows: u32,
    pub cols: u32,
    /// Spacing between neighbouring cells, in pixels. No outer margin.
    pub gap: u32,
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub background: CanvasColor,
    #[cfg_attr(feature = "serde", serde(default))]
    pub fit: FitPolicy,
}

impl Default for GridSpec {
    fn default() -> Self {
        Self {
            rows: 2,
            cols: 2,
            gap: 8,
            canvas_width: 800,
            canvas_height: 800,
            background: CanvasColor::white(),
            fit: FitPolicy::Cover,
        }
    }
}

impl GridSpec {
    /// Largest accepted canvas side, in pixels. A canvas at the cap is a
    /// 1 GiB RGBA buffer.
    pub const MAX_CANVAS_SIDE: u32 = 16_384;

    /// A `rows × cols` grid with the default gap, canvas and background.
    pub fn new(rows: u32, cols: u32) -> Self {
        Self {
            rows,
            cols,
            ..Self::default()
        }
    }

    /// Set the gap between cells.
    pub fn gap(mut self, gap: u32) -> Self {
        self.gap = gap;
        self
    }

    /// Set the output canvas size.
    pub fn canvas(mut self, width: u32, height: u32) -> Self {
        self.canvas_width = width;
        self.canvas_height = height;
        self
    }

    /// Set the background fill.
    pub fn background(mut self, color: CanvasColor) -> Self {
        self.background = color;
        self
    }

    /// Set how images are fitted into their cells.
    pub fn fit(mut self, fit: FitPolicy) -> Self {
        self.fit = fit;
        self
    }

    pub fn canvas_size(&self) -> Size {
        Size::new(self.canvas_width, self.canvas_height)
    }

    /// Number of rendered cells (`rows × cols`).
    pub fn cell_count(&self) -> usize {
        self.rows as usize * self.cols as usize
    }

    /// Size shared by every cell.
    ///
    /// Fails with [`GridError::CanvasTooLarge`] when either canvas side
    /// exceeds [`MAX_CANVAS_SIDE`](Self::MAX_CANVAS_SIDE), and with
    /// [`GridError::InvalidGridConfiguration`] when the gaps leave no room
    /// for at least one pixel per cell on either axis.
    pub fn cell_size(&self) -> Result<Size, GridError> {
        let max = Self::MAX_CANVAS_SIDE;
        if self.canvas_width > max || self.canvas_height > max {
            return Err(GridError::CanvasTooLarge {
                width: self.canvas_width,
                height: self.canvas_height,
                max,
            });
        }
        let width = axis_extent(self.canvas_width, self.gap, self.cols, Axis::Horizontal)?;
        let height = axis_extent(self.canvas_height, self.gap, self.rows, Axis::Vertical)?;
        Ok(Size::new(width, height))
    }

    /// Rectangle of the cell at `(row, col)`.
    pub fn cell_rect(&self, row: u32, col: u32) -> Result<CellRect, GridError> {
        if row >= self.rows || col >= self.cols {
            return Err(GridError::CellOutOfRange {
                row,
                col,
                rows: self.rows,
                cols: self.cols,
            });
        }
        let size = self.cell_size()?;
        Ok(place(size, self.gap, row, col))
    }

    /// Rectangle of the cell at row-major `index` (`row * cols + col`).
    pub fn cell_rect_at(&self, index: usize) -> Result<CellRect, GridError> {
        let cols = self.cols.max(1) as usize;
        let row = u32::try_from(index / cols).unwrap_or(u32::MAX);
        let col = (index % cols) as u32;
        self.cell_rect(row, col)
    }

    /// All cells in row-major order, as `(index, rect)` pairs.
    ///
    /// Validates the configuration once up front.
    pub fn cells(&self) -> Result<Cells, GridError> {
        let size = self.cell_size()?;
        Ok(Cells {
            size,
            gap: self.gap,
            cols: self.cols,
            count: self.cell_count(),
            next: 0,
        })
    }
}

/// Iterator over the cells of a [`GridSpec`], row-major.
#[derive(Clone, Debug)]
pub struct Cells {
    size: Size,
    gap: u32,
    cols: u32,
    count: usize,
    next: usize,
}

impl Iterator for Cells {
    type Item = (usize, CellRect);

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.count {
            return None;
        }
        let index = self.next;
        self.next += 1;
        let cols = self.cols as usize;
        let rect = place(self.size, self.gap, (index / cols) as u32, (index % cols) as u32);
        Some((index, rect))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.count - self.next;
        (left, Some(left))
    }
}

impl ExactSizeIterator for Cells {}

/// Cell origin from the shared cell size. Stays within the canvas because
/// `col * (w + gap) + w <= cols * w + (cols - 1) * gap <= canvas`; a lone
/// cell sits at 0 whatever the gap.
fn place(size: Size, gap: u32, row: u32, col: u32) -> CellRect {
    CellRect {
        x: origin(col, size.width, gap),
        y: origin(row, size.height, gap),
        width: size.width,
        height: size.height,
    }
}

fn origin(index: u32, extent: u32, gap: u32) -> u32 {
    let offset = u64::from(index) * (u64::from(extent) + u64::from(gap));
    u32::try_from(offset).unwrap_or(u32::MAX)
}

/// `floor((canvas - gap * (cells - 1)) / cells)`, refusing non-positive results.
fn axis_extent(canvas: u32, gap: u32, cells: u32, axis: Axis) -> Result<u32, GridError> {
    let invalid = || GridError::InvalidGridConfiguration {
        axis,
        canvas,
        gap,
        cells,
    };
    if cells == 0 {
        return Err(invalid());
    }
    let gaps = u64::from(gap) * u64::from(cells - 1);
    let available = u64::from(canvas).checked_sub(gaps).ok_or_else(invalid)?;
    let extent = available / u64::from(cells);
    if extent == 0 {
        return Err(invalid());
    }
    // extent <= canvas
    Ok(extent as u32)
}
