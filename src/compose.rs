//! Rasterize a sequence into a grid on an RGBA canvas.
//!
//! Cells are composed in row-major order. A cell whose image is still
//! decoding is left as background and recorded as pending; it is never
//! partially drawn. [`Compositor::settle`] draws pending cells once their
//! decodes resolve, without touching the rest of the surface.
//!
//! Composition borrows the spec, sequence and image source immutably, so it
//! always reads one consistent snapshot.
//!
//! # Example
//!
//! ```
//! use image::{Rgba, RgbaImage};
//! use zengrid::{AssetId, Compositor, GridSpec, ImageAsset, ImageSource, Sequence};
//!
//! let spec = GridSpec::new(1, 2).gap(0).canvas(200, 100);
//! let mut source = ImageSource::new();
//! source
//!     .register(ImageAsset::from_rgba("red", RgbaImage::from_pixel(4, 4, Rgba([255, 0, 0, 255]))).unwrap())
//!     .unwrap();
//! let seq = Sequence::new().append([AssetId::from("red")]).unwrap();
//!
//! let surface = Compositor::new().compose(&spec, &seq, &source).unwrap();
//! assert_eq!(surface.image().get_pixel(50, 50), &Rgba([255, 0, 0, 255]));
//! assert_eq!(surface.image().get_pixel(150, 50), &Rgba([255, 255, 255, 255]));
//! ```

use image::imageops::{self, FilterType};
use image::{Pixel, Rgba, RgbaImage};

use crate::error::GridError;
use crate::fit::Placement;
use crate::geometry::{CellRect, GridSpec};
use crate::sequence::{AssetId, Sequence};
use crate::source::{DecodeState, ImageAsset, ImageSource};

/// Output of a composition pass.
#[derive(Clone, Debug)]
pub struct RasterSurface {
    image: RgbaImage,
    spec: GridSpec,
    /// Id occupying each cell, row-major. `None` for empty cells.
    cells: Vec<Option<AssetId>>,
    /// Cell indices waiting for decode, ascending.
    pending: Vec<usize>,
    overflow: usize,
}

impl RasterSurface {
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Spec this surface was composed with.
    pub fn spec(&self) -> &GridSpec {
        &self.spec
    }

    /// Id drawn (or to be drawn) in the cell at `index`.
    pub fn cell_asset(&self, index: usize) -> Option<&AssetId> {
        self.cells.get(index).and_then(Option::as_ref)
    }

    /// Cells still waiting for decode.
    pub fn pending_cells(&self) -> &[usize] {
        &self.pending
    }

    /// True when every occupied cell has been drawn.
    pub fn is_settled(&self) -> bool {
        self.pending.is_empty()
    }

    /// Number of sequence items that did not get a cell.
    pub fn overflow(&self) -> usize {
        self.overflow
    }
}

/// Draws grid compositions.
#[derive(Copy, Clone, Debug)]
pub struct Compositor {
    filter: FilterType,
}

impl Default for Compositor {
    fn default() -> Self {
        Self {
            filter: FilterType::Triangle,
        }
    }
}

impl Compositor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resampling filter used when scaling images into cells.
    pub fn filter(mut self, filter: FilterType) -> Self {
        self.filter = filter;
        self
    }

    /// Compose `sequence` into a fresh surface.
    ///
    /// Refuses before allocating with [`GridError::CanvasTooLarge`] or
    /// [`GridError::InvalidGridConfiguration`] when the spec has no valid
    /// cell geometry. An id in a cell that the
    /// source has never seen fails with [`GridError::UnknownAsset`].
    pub fn compose<P>(
        &self,
        spec: &GridSpec,
        sequence: &Sequence,
        source: &ImageSource<P>,
    ) -> Result<RasterSurface, GridError>
    where
        P: AsRgba,
    {
        let cells = spec.cells()?;
        let mut image = RgbaImage::from_pixel(
            spec.canvas_width,
            spec.canvas_height,
            Rgba(spec.background.to_rgba()),
        );
        let mut occupants = Vec::with_capacity(cells.len());
        let mut pending = Vec::new();

        for (index, rect) in cells {
            let Some(id) = sequence.get(index) else {
                occupants.push(None);
                continue;
            };
            match source.state(id.as_str()) {
                Some(DecodeState::Ready(asset)) => {
                    self.draw_cell(&mut image, spec, &rect, asset)?;
                }
                Some(DecodeState::Pending) => pending.push(index),
                None => return Err(GridError::UnknownAsset { id: id.clone() }),
            }
            occupants.push(Some(id.clone()));
        }

        let overflow = sequence.overflow(spec.cell_count()).len();
        tracing::debug!(
            width = spec.canvas_width,
            height = spec.canvas_height,
            cells = spec.cell_count(),
            pending = pending.len(),
            overflow,
            "composed grid"
        );
        Ok(RasterSurface {
            image,
            spec: *spec,
            cells: occupants,
            pending,
            overflow,
        })
    }

    /// Draw pending cells whose decodes have since resolved.
    ///
    /// Returns how many cells were drawn. Only those cells' pixels change.
    /// A pending id that was released from `source` fails with
    /// [`GridError::UnknownAsset`]; the surface is stale and should be
    /// recomposed.
    pub fn settle<P>(
        &self,
        surface: &mut RasterSurface,
        source: &ImageSource<P>,
    ) -> Result<usize, GridError>
    where
        P: AsRgba,
    {
        let mut drawn = 0;
        let mut still_pending = Vec::new();
        for &index in &surface.pending {
            let Some(id) = surface.cells.get(index).and_then(Option::as_ref) else {
                continue;
            };
            match source.state(id.as_str()) {
                Some(DecodeState::Ready(asset)) => {
                    let rect = surface.spec.cell_rect_at(index)?;
                    fill(&mut surface.image, &rect, Rgba(surface.spec.background.to_rgba()));
                    self.draw_cell(&mut surface.image, &surface.spec, &rect, asset)?;
                    drawn += 1;
                }
                Some(DecodeState::Pending) => still_pending.push(index),
                None => return Err(GridError::UnknownAsset { id: id.clone() }),
            }
        }
        surface.pending = still_pending;
        tracing::debug!(drawn, pending = surface.pending.len(), "settled cells");
        Ok(drawn)
    }

    /// Blit one asset into `cell`, clipped to the cell.
    fn draw_cell<P: AsRgba>(
        &self,
        canvas: &mut RgbaImage,
        spec: &GridSpec,
        cell: &CellRect,
        asset: &ImageAsset<P>,
    ) -> Result<(), GridError> {
        let placement = spec.fit.resolve(cell, asset.width(), asset.height())?;
        let Some(visible) = placement.visible_in(cell) else {
            return Ok(());
        };
        tracing::trace!(
            id = %asset.id(),
            x = visible.x,
            y = visible.y,
            width = visible.width,
            height = visible.height,
            "draw cell"
        );

        let pixels = asset.pixels().as_rgba();
        let region = source_region(&placement, &visible, asset.width(), asset.height());
        let cropped =
            imageops::crop_imm(pixels, region.x, region.y, region.width, region.height).to_image();
        let scaled = if region.width == visible.width && region.height == visible.height {
            cropped
        } else {
            imageops::resize(&cropped, visible.width, visible.height, self.filter)
        };

        for (dx, dy, px) in scaled.enumerate_pixels() {
            canvas
                .get_pixel_mut(visible.x + dx, visible.y + dy)
                .blend(px);
        }
        Ok(())
    }
}

/// Access to RGBA pixels for an image source's pixel handle.
pub trait AsRgba {
    fn as_rgba(&self) -> &RgbaImage;
}

impl AsRgba for RgbaImage {
    fn as_rgba(&self) -> &RgbaImage {
        self
    }
}

/// Part of the natural image that lands in `visible`.
///
/// Maps the visible canvas rectangle back through the placement scale,
/// widening to whole source pixels and keeping at least one pixel per axis.
fn source_region(
    placement: &Placement,
    visible: &CellRect,
    natural_w: u32,
    natural_h: u32,
) -> CellRect {
    let (px, py) = placement.pixel_origin();
    let (x0, x1) = map_span(
        i64::from(visible.x) - px,
        i64::from(visible.right()) - px,
        placement.width,
        natural_w,
    );
    let (y0, y1) = map_span(
        i64::from(visible.y) - py,
        i64::from(visible.bottom()) - py,
        placement.height,
        natural_h,
    );
    CellRect::new(x0, y0, x1 - x0, y1 - y0)
}

/// Map `[start, end)` in a `drawn`-pixel span to a `natural`-pixel span.
fn map_span(start: i64, end: i64, drawn: u32, natural: u32) -> (u32, u32) {
    let drawn = u64::from(drawn.max(1));
    let natural_u = u64::from(natural);
    let start = start.max(0) as u64;
    let end = end.max(0) as u64;
    let lo = (start * natural_u / drawn).min(natural_u.saturating_sub(1));
    let hi = (end * natural_u).div_ceil(drawn).clamp(lo + 1, natural_u);
    (lo as u32, hi as u32)
}

fn fill(canvas: &mut RgbaImage, rect: &CellRect, color: Rgba<u8>) {
    for y in rect.y..rect.bottom() {
        for x in rect.x..rect.right() {
            canvas.put_pixel(x, y, color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fit::resolve_cover;

    #[test]
    fn region_for_centered_crop() {
        // 900x300 into 300x300: middle third of the source.
        let cell = CellRect::new(0, 0, 300, 300);
        let p = resolve_cover(&cell, 900, 300).unwrap();
        let visible = p.visible_in(&cell).unwrap();
        assert_eq!(source_region(&p, &visible, 900, 300), CellRect::new(300, 0, 300, 300));
    }

    #[test]
    fn region_scales_down() {
        // 800x400 into 400x300 at x=400: drawn 600x300 from x=300,
        // visible columns 100..500 of the drawn image -> 133..667 of source.
        let cell = CellRect::new(400, 0, 400, 300);
        let p = resolve_cover(&cell, 800, 400).unwrap();
        let visible = p.visible_in(&cell).unwrap();
        let r = source_region(&p, &visible, 800, 400);
        assert_eq!((r.x, r.y, r.height), (133, 0, 400));
        assert_eq!(r.x + r.width, 667);
    }

    #[test]
    fn span_keeps_one_pixel() {
        assert_eq!(map_span(0, 1, 1000, 1), (0, 1));
        assert_eq!(map_span(999, 1000, 1000, 10), (9, 10));
    }
}
