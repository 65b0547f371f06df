//! Parsed grid options and their application onto a [`GridSpec`].

use alloc::string::String;
use alloc::vec::Vec;
use core::ops::RangeInclusive;

use super::ParseWarning;
use crate::fit::FitPolicy;
use crate::geometry::{CanvasColor, GridSpec};

/// Parsed configuration. `None` fields keep the base spec's value.
///
/// Integer fields hold the requested value as written; range checks happen
/// in [`apply`](Self::apply).
#[derive(Debug, Clone, Default, PartialEq)]
#[non_exhaustive]
pub struct GridOptions {
    /// `rows`
    pub rows: Option<i64>,
    /// `cols`, `columns`
    pub cols: Option<i64>,
    /// `gap`, `spacing`
    pub gap: Option<i64>,
    /// `w`, `width`
    pub width: Option<i64>,
    /// `h`, `height`
    pub height: Option<i64>,
    /// `bg`, `bgcolor`, `background`
    pub background: Option<CanvasColor>,
    /// `fit`, `mode`
    pub fit: Option<FitPolicy>,
    /// `format`, normalized to `png` or `jpg`.
    pub format: Option<String>,
    /// `quality`, JPEG only.
    pub quality: Option<i64>,
}

/// Allowed ranges for clamped options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Limits {
    pub rows: RangeInclusive<u32>,
    pub cols: RangeInclusive<u32>,
    pub gap: RangeInclusive<u32>,
    pub canvas_width: RangeInclusive<u32>,
    pub canvas_height: RangeInclusive<u32>,
    pub quality: RangeInclusive<u32>,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            rows: 1..=10,
            cols: 1..=10,
            gap: 0..=80,
            canvas_width: 200..=1920,
            canvas_height: 200..=1920,
            quality: 1..=100,
        }
    }
}

impl GridOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no option was set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply onto `base` with the default [`Limits`].
    pub fn apply(&self, base: &GridSpec) -> (GridSpec, Vec<ParseWarning>) {
        self.apply_with(base, &Limits::default())
    }

    /// Apply onto `base`, clamping each integer into `limits`.
    ///
    /// Every clamp produces a [`ParseWarning::ValueClamped`]. The result can
    /// still be an invalid grid (e.g. a gap that leaves no room for ten
    /// columns); [`GridSpec::cell_size`] reports that.
    pub fn apply_with(&self, base: &GridSpec, limits: &Limits) -> (GridSpec, Vec<ParseWarning>) {
        let mut spec = *base;
        let mut warnings = Vec::new();
        let mut clamp = |key, value: Option<i64>, range: &RangeInclusive<u32>, field: &mut u32| {
            if let Some(v) = value {
                *field = clamp_into(key, v, range, &mut warnings);
            }
        };

        clamp("rows", self.rows, &limits.rows, &mut spec.rows);
        clamp("cols", self.cols, &limits.cols, &mut spec.cols);
        clamp("gap", self.gap, &limits.gap, &mut spec.gap);
        clamp("width", self.width, &limits.canvas_width, &mut spec.canvas_width);
        clamp("height", self.height, &limits.canvas_height, &mut spec.canvas_height);

        if let Some(bg) = self.background {
            spec.background = bg;
        }
        if let Some(fit) = self.fit {
            spec.fit = fit;
        }
        (spec, warnings)
    }

    /// Requested export format, if any, with quality clamped to `1..=100`.
    #[cfg(feature = "raster")]
    pub fn export_format(&self) -> (Option<crate::export::ExportFormat>, Vec<ParseWarning>) {
        use crate::export::ExportFormat;

        let mut warnings = Vec::new();
        let format = self
            .format
            .as_deref()
            .and_then(|ext| ExportFormat::from_extension(ext).ok());
        let format = match (format, self.quality) {
            (Some(f @ ExportFormat::Jpeg { .. }), Some(q)) => {
                let q = clamp_into("quality", q, &Limits::default().quality, &mut warnings);
                Some(f.with_quality(q as u8))
            }
            (f, _) => f,
        };
        (format, warnings)
    }
}

fn clamp_into(
    key: &'static str,
    requested: i64,
    range: &RangeInclusive<u32>,
    warnings: &mut Vec<ParseWarning>,
) -> u32 {
    let lo = i64::from(*range.start());
    let hi = i64::from(*range.end());
    let applied = requested.clamp(lo, hi);
    if applied != requested {
        tracing::debug!(key, requested, applied, "option clamped");
        warnings.push(ParseWarning::ValueClamped {
            key,
            requested,
            applied,
        });
    }
    // In range of a u32 range.
    applied as u32
}
