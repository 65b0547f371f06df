//! Aspect-preserving placement of an image inside a cell.
//!
//! [`resolve_cover`] fills the whole cell and lets the overflow hang past
//! the cell edges, centered. The consumer clips to the cell when drawing.
//! [`resolve_contain`] keeps the whole image visible and letterboxes.
//!
//! Aspect comparisons use cross-multiplication and sizes use integer
//! ceiling division, so results are exact for every input.
//!
//! # Example
//!
//! ```
//! use zengrid::{CellRect, resolve_cover};
//!
//! // 2:1 image in a 4:3 cell: height is tight, width overflows.
//! let p = resolve_cover(&CellRect::new(400, 0, 400, 300), 800, 400).unwrap();
//! assert_eq!((p.width, p.height), (600, 300));
//! assert_eq!(p.x, 300.0);
//! ```

use crate::error::GridError;
use crate::geometry::CellRect;

/// How an image is fitted into its cell.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum FitPolicy {
    /// Fill the cell, crop overflow. Preserves aspect ratio.
    #[default]
    Cover,
    /// Show the whole image, pad the remainder with the background.
    /// Preserves aspect ratio.
    Contain,
}

impl FitPolicy {
    /// Resolve the placement of a `natural_w × natural_h` image in `cell`.
    pub fn resolve(
        self,
        cell: &CellRect,
        natural_w: u32,
        natural_h: u32,
    ) -> Result<Placement, GridError> {
        match self {
            Self::Cover => resolve_cover(cell, natural_w, natural_h),
            Self::Contain => resolve_contain(cell, natural_w, natural_h),
        }
    }
}

/// Where an image's pixels land, in canvas coordinates.
///
/// `x`/`y` sit on half-pixel boundaries when the overflow is odd.
/// The rectangle may extend past its cell.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Placement {
    pub x: f64,
    pub y: f64,
    pub width: u32,
    pub height: u32,
}

impl Placement {
    /// Offset of the placement origin relative to the cell origin.
    /// Negative for cover placements that overflow.
    pub fn offset_in(&self, cell: &CellRect) -> (f64, f64) {
        (self.x - cell.x as f64, self.y - cell.y as f64)
    }

    /// Top-left pixel of the placement, rounding half offsets down.
    pub fn pixel_origin(&self) -> (i64, i64) {
        (floor_i64(self.x), floor_i64(self.y))
    }

    /// Pixel-aligned part of the placement that lies inside `cell`.
    ///
    /// For cover placements this is the whole cell. `None` when nothing
    /// of the image would be visible.
    pub fn visible_in(&self, cell: &CellRect) -> Option<CellRect> {
        let (px, py) = self.pixel_origin();
        let left = px.max(i64::from(cell.x));
        let top = py.max(i64::from(cell.y));
        let right = (px + i64::from(self.width)).min(i64::from(cell.right()));
        let bottom = (py + i64::from(self.height)).min(i64::from(cell.bottom()));
        if right <= left || bottom <= top {
            return None;
        }
        // Bounded by the cell, so every value fits in u32.
        Some(CellRect::new(
            left as u32,
            top as u32,
            (right - left) as u32,
            (bottom - top) as u32,
        ))
    }
}

/// Cover fit: fill `cell` completely, preserving aspect ratio, centered.
///
/// The image is relatively wider than the cell when
/// `natural_w / natural_h > cell.width / cell.height`; then the height is
/// tight and the width is `ceil(cell.height * aspect)`. Otherwise the width
/// is tight and the height is `ceil(cell.width / aspect)`.
pub fn resolve_cover(
    cell: &CellRect,
    natural_w: u32,
    natural_h: u32,
) -> Result<Placement, GridError> {
    check_dimensions(natural_w, natural_h)?;
    let (width, height) = if wider_than_cell(cell, natural_w, natural_h) {
        (
            scale_ceil(cell.height, natural_w, natural_h),
            cell.height,
        )
    } else {
        (
            cell.width,
            scale_ceil(cell.width, natural_h, natural_w),
        )
    };
    Ok(centered(cell, width, height))
}

/// Contain fit: the largest aspect-preserving size inside `cell`, centered.
///
/// The free axis rounds down so it never exceeds the cell, with a 1px floor.
pub fn resolve_contain(
    cell: &CellRect,
    natural_w: u32,
    natural_h: u32,
) -> Result<Placement, GridError> {
    check_dimensions(natural_w, natural_h)?;
    let (width, height) = if wider_than_cell(cell, natural_w, natural_h) {
        (
            cell.width,
            scale_floor(cell.width, natural_h, natural_w).max(1),
        )
    } else {
        (
            scale_floor(cell.height, natural_w, natural_h).max(1),
            cell.height,
        )
    };
    Ok(centered(cell, width, height))
}

fn check_dimensions(natural_w: u32, natural_h: u32) -> Result<(), GridError> {
    if natural_w == 0 || natural_h == 0 {
        return Err(GridError::InvalidImageDimensions {
            width: natural_w,
            height: natural_h,
        });
    }
    Ok(())
}

/// `natural_w / natural_h > cell.width / cell.height`, without floats.
fn wider_than_cell(cell: &CellRect, natural_w: u32, natural_h: u32) -> bool {
    u64::from(natural_w) * u64::from(cell.height) > u64::from(cell.width) * u64::from(natural_h)
}

/// `ceil(basis * num / den)`, saturating at `u32::MAX`.
fn scale_ceil(basis: u32, num: u32, den: u32) -> u32 {
    let den = u64::from(den);
    let v = (u64::from(basis) * u64::from(num)).div_ceil(den);
    u32::try_from(v).unwrap_or(u32::MAX)
}

/// `floor(basis * num / den)`, saturating at `u32::MAX`.
fn scale_floor(basis: u32, num: u32, den: u32) -> u32 {
    let v = u64::from(basis) * u64::from(num) / u64::from(den);
    u32::try_from(v).unwrap_or(u32::MAX)
}

fn centered(cell: &CellRect, width: u32, height: u32) -> Placement {
    Placement {
        x: cell.x as f64 + (cell.width as f64 - width as f64) / 2.0,
        y: cell.y as f64 + (cell.height as f64 - height as f64) / 2.0,
        width,
        height,
    }
}

/// `floor` for finite values without `std`.
fn floor_i64(v: f64) -> i64 {
    let t = v as i64;
    if (t as f64) > v { t - 1 } else { t }
}
