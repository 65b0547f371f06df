//! Photo grid collages: cell geometry, cover/contain placement, an ordered
//! image sequence, and rasterization to PNG or JPEG.
//!
//! The geometry and sequence layers are pure values with no pixel work and
//! are `no_std` compatible (with `alloc`). Raster composition and export
//! live behind the `raster` feature.
//!
//! # Modules
//!
//! - [`geometry`]: grid spec, cell rectangles, canvas color
//! - [`fit`]: cover and contain placement of an image in a cell
//! - [`sequence`]: ordered, duplicate-free image ids with selection
//! - [`source`]: decoded image store with decode tracking
//! - [`session`]: spec + sequence state driven by commands
//! - [`options`]: query-string configuration with clamping
//! - [`compose`], [`export`], [`workspace`]: pixels (feature `raster`)
//! - [`svg`]: preview of an arrangement (feature `svg`)
//!
//! # Example
//!
//! ```
//! use zengrid::{GridSpec, resolve_cover};
//!
//! let spec = GridSpec::new(2, 2).gap(8).canvas(800, 600);
//! let cell = spec.cell_rect(0, 1).unwrap();
//! assert_eq!((cell.x, cell.width, cell.height), (404, 396, 296));
//!
//! let placement = resolve_cover(&cell, 600, 300).unwrap();
//! assert_eq!((placement.width, placement.height), (592, 296));
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

pub mod error;
pub mod fit;
pub mod geometry;
pub mod sequence;
pub mod session;
pub mod source;

#[cfg(feature = "options")]
pub mod options;

#[cfg(feature = "raster")]
pub mod compose;
#[cfg(feature = "raster")]
pub mod export;
#[cfg(feature = "raster")]
pub mod workspace;

#[cfg(feature = "svg")]
pub mod svg;

pub use error::{Axis, GridError};
pub use fit::{FitPolicy, Placement, resolve_contain, resolve_cover};
pub use geometry::{CanvasColor, CellRect, Cells, GridSpec, Size};
pub use sequence::{AssetId, Sequence};
pub use session::{Command, Session, Transition};
pub use source::{DecodeState, ImageAsset, ImageSource};

#[cfg(feature = "raster")]
pub use compose::{AsRgba, Compositor, RasterSurface};
#[cfg(feature = "raster")]
pub use error::RasterError;
#[cfg(feature = "raster")]
pub use export::{ExportFormat, encode};
#[cfg(feature = "raster")]
pub use workspace::{UploadReport, Workspace};
