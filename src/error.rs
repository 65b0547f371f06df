//! Error taxonomy.
//!
//! Every error here is local and recoverable. Operations that fail leave
//! the sequence, selection and grid spec exactly as they were.

use crate::sequence::AssetId;

/// Grid axis, used to say which dimension of a [`GridSpec`](crate::GridSpec)
/// leaves no room for cells.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Columns share the canvas width.
    Horizontal,
    /// Rows share the canvas height.
    Vertical,
}

impl core::fmt::Display for Axis {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Horizontal => f.write_str("horizontal"),
            Self::Vertical => f.write_str("vertical"),
        }
    }
}

/// Layout, sequence and registry errors.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    /// Image has zero width or height.
    #[error("image dimensions {width}x{height} are invalid")]
    InvalidImageDimensions { width: u32, height: u32 },

    /// Sequence position outside `0..len`.
    #[error("index {index} is out of range for a sequence of {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// Grid position outside `rows × cols`.
    #[error("cell ({row}, {col}) is outside a {rows}x{cols} grid")]
    CellOutOfRange {
        row: u32,
        col: u32,
        rows: u32,
        cols: u32,
    },

    /// Gaps (or a zero cell count) consume the whole canvas along `axis`.
    #[error("{axis} axis: {cells} cell(s) with {gap}px gaps do not fit in {canvas}px")]
    InvalidGridConfiguration {
        axis: Axis,
        canvas: u32,
        gap: u32,
        cells: u32,
    },

    /// A canvas side is larger than [`GridSpec::MAX_CANVAS_SIDE`](crate::GridSpec::MAX_CANVAS_SIDE).
    #[error("canvas {width}x{height} exceeds the {max}px limit per side")]
    CanvasTooLarge { width: u32, height: u32, max: u32 },

    /// The id is already present in the sequence or the image source.
    #[error("asset `{id}` is already present")]
    DuplicateAsset { id: AssetId },

    /// The image source has no entry for the id.
    #[error("asset `{id}` is not registered")]
    UnknownAsset { id: AssetId },
}

/// Errors from rasterizing and encoding a composition.
#[cfg(feature = "raster")]
#[derive(Debug, thiserror::Error)]
pub enum RasterError {
    #[error(transparent)]
    Grid(#[from] GridError),

    /// Requested export format is not PNG or JPEG.
    #[error("unsupported export format `{0}`")]
    EncodeUnsupportedFormat(alloc::string::String),

    /// Some cells are still waiting for their image to decode.
    #[error("{pending} cell(s) are still waiting for decode")]
    Unsettled { pending: usize },

    #[error(transparent)]
    Image(#[from] image::ImageError),
}
