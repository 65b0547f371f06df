//! Encode a settled [`RasterSurface`] to PNG or JPEG bytes.

use core::str::FromStr;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, Rgb, RgbImage};

use crate::compose::RasterSurface;
use crate::error::RasterError;

/// Output encoding.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    /// Lossless, keeps alpha. `image/png`.
    #[default]
    Png,
    /// Lossy, alpha dropped. `image/jpeg`. Quality 1–100.
    Jpeg { quality: u8 },
}

impl ExportFormat {
    pub const DEFAULT_JPEG_QUALITY: u8 = 90;

    /// JPEG at the default quality.
    pub const fn jpeg() -> Self {
        Self::Jpeg {
            quality: Self::DEFAULT_JPEG_QUALITY,
        }
    }

    /// Parse a MIME type such as `image/png`.
    pub fn from_mime(mime: &str) -> Result<Self, RasterError> {
        match mime.trim().to_ascii_lowercase().as_str() {
            "image/png" => Ok(Self::Png),
            "image/jpeg" | "image/jpg" => Ok(Self::jpeg()),
            _ => Err(RasterError::EncodeUnsupportedFormat(mime.into())),
        }
    }

    /// Parse a file extension, with or without the leading dot.
    pub fn from_extension(ext: &str) -> Result<Self, RasterError> {
        let trimmed = ext.trim();
        match trimmed.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" | "jpe" => Ok(Self::jpeg()),
            _ => Err(RasterError::EncodeUnsupportedFormat(ext.into())),
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg { .. } => "image/jpeg",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg { .. } => "jpg",
        }
    }

    /// Same format with a JPEG quality override. No effect on PNG.
    pub fn with_quality(self, quality: u8) -> Self {
        match self {
            Self::Png => Self::Png,
            Self::Jpeg { .. } => Self::Jpeg {
                quality: quality.clamp(1, 100),
            },
        }
    }
}

impl FromStr for ExportFormat {
    type Err = RasterError;

    /// Accepts a MIME type or an extension.
    fn from_str(s: &str) -> Result<Self, RasterError> {
        if s.contains('/') {
            Self::from_mime(s)
        } else {
            Self::from_extension(s)
        }
    }
}

/// Encode `surface` as `format`.
///
/// Refuses with [`RasterError::Unsettled`] while any cell is still waiting
/// for its decode, so an export never shows a half-composed grid.
pub fn encode(surface: &RasterSurface, format: ExportFormat) -> Result<Vec<u8>, RasterError> {
    if !surface.is_settled() {
        return Err(RasterError::Unsettled {
            pending: surface.pending_cells().len(),
        });
    }

    let image = surface.image();
    let (width, height) = image.dimensions();
    let mut out = Vec::new();
    match format {
        ExportFormat::Png => {
            PngEncoder::new(&mut out).write_image(
                image.as_raw(),
                width,
                height,
                ExtendedColorType::Rgba8,
            )?;
        }
        ExportFormat::Jpeg { quality } => {
            let rgb = RgbImage::from_fn(width, height, |x, y| {
                let [r, g, b, _] = image.get_pixel(x, y).0;
                Rgb([r, g, b])
            });
            JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100)).write_image(
                rgb.as_raw(),
                width,
                height,
                ExtendedColorType::Rgb8,
            )?;
        }
    }
    tracing::debug!(
        format = format.mime_type(),
        width,
        height,
        bytes = out.len(),
        "encoded export"
    );
    Ok(out)
}
