//! Decoded-image registry with explicit decode tracking.
//!
//! Decodes finish asynchronously and in any order. Each id moves through
//! `begin_decode` → [`DecodeState::Pending`] → `complete_decode` →
//! [`DecodeState::Ready`]. A result arriving after the id was released is
//! dropped.
//!
//! The registry is generic over the pixel handle `P`, so layout code and
//! tests can run without any pixel data (`P = ()`).

use alloc::collections::BTreeMap;
use alloc::sync::Arc;
use core::fmt;

use crate::error::GridError;
use crate::geometry::Size;
use crate::sequence::AssetId;

/// A decoded image: id, natural size, and shared pixels. Immutable.
pub struct ImageAsset<P> {
    id: AssetId,
    width: u32,
    height: u32,
    pixels: Arc<P>,
}

impl<P> ImageAsset<P> {
    /// Fails with [`GridError::InvalidImageDimensions`] on a zero dimension.
    pub fn new(
        id: impl Into<AssetId>,
        width: u32,
        height: u32,
        pixels: P,
    ) -> Result<Self, GridError> {
        if width == 0 || height == 0 {
            return Err(GridError::InvalidImageDimensions { width, height });
        }
        Ok(Self {
            id: id.into(),
            width,
            height,
            pixels: Arc::new(pixels),
        })
    }

    pub fn id(&self) -> &AssetId {
        &self.id
    }

    /// Natural width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Natural height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn pixels(&self) -> &P {
        &self.pixels
    }
}

impl<P> Clone for ImageAsset<P> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            width: self.width,
            height: self.height,
            pixels: Arc::clone(&self.pixels),
        }
    }
}

impl<P> fmt::Debug for ImageAsset<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageAsset")
            .field("id", &self.id)
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

#[cfg(feature = "raster")]
impl ImageAsset<image::RgbaImage> {
    /// Wrap an RGBA buffer, taking the natural size from the buffer.
    pub fn from_rgba(id: impl Into<AssetId>, pixels: image::RgbaImage) -> Result<Self, GridError> {
        let (width, height) = pixels.dimensions();
        Self::new(id, width, height, pixels)
    }

    /// Decode an encoded image (any format enabled in `image`) to RGBA.
    pub fn decode(
        id: impl Into<AssetId>,
        bytes: &[u8],
    ) -> Result<Self, crate::error::RasterError> {
        let decoded = image::load_from_memory(bytes)?;
        Ok(Self::from_rgba(id, decoded.into_rgba8())?)
    }
}

/// Where an asset is in its decode.
pub enum DecodeState<P> {
    /// Decode started, pixels not yet available.
    Pending,
    Ready(ImageAsset<P>),
}

impl<P> DecodeState<P> {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }
}

impl<P> fmt::Debug for DecodeState<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => f.write_str("Pending"),
            Self::Ready(asset) => f.debug_tuple("Ready").field(asset).finish(),
        }
    }
}

/// Registry of images by id.
pub struct ImageSource<P> {
    entries: BTreeMap<AssetId, DecodeState<P>>,
}

impl<P> Default for ImageSource<P> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<P> fmt::Debug for ImageSource<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.entries.iter()).finish()
    }
}

impl<P> ImageSource<P> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Track a decode that has started but not finished.
    pub fn begin_decode(&mut self, id: AssetId) -> Result<(), GridError> {
        if self.entries.contains_key(&id) {
            return Err(GridError::DuplicateAsset { id });
        }
        self.entries.insert(id, DecodeState::Pending);
        Ok(())
    }

    /// Store a finished decode.
    ///
    /// Returns `false` and drops the asset when its id is no longer tracked
    /// (released before the decode resolved) or is already ready.
    pub fn complete_decode(&mut self, asset: ImageAsset<P>) -> bool {
        match self.entries.get_mut(asset.id()) {
            Some(state) if state.is_ready() => {
                tracing::warn!(id = %asset.id(), "duplicate decode result dropped");
                false
            }
            Some(state) => {
                tracing::trace!(id = %asset.id(), "decode complete");
                *state = DecodeState::Ready(asset);
                true
            }
            None => {
                tracing::warn!(id = %asset.id(), "decode resolved after release, dropped");
                false
            }
        }
    }

    /// Forget a pending decode that failed. Returns whether it was pending.
    pub fn fail_decode(&mut self, id: &str) -> bool {
        if matches!(self.entries.get(id), Some(DecodeState::Pending)) {
            self.entries.remove(id);
            true
        } else {
            false
        }
    }

    /// Register an already-decoded asset.
    pub fn register(&mut self, asset: ImageAsset<P>) -> Result<(), GridError> {
        if self.entries.contains_key(asset.id()) {
            return Err(GridError::DuplicateAsset {
                id: asset.id().clone(),
            });
        }
        self.entries
            .insert(asset.id().clone(), DecodeState::Ready(asset));
        Ok(())
    }

    /// Drop an entry, pending or ready. Returns whether it existed.
    pub fn release(&mut self, id: &str) -> bool {
        self.entries.remove(id).is_some()
    }

    pub fn state(&self, id: &str) -> Option<&DecodeState<P>> {
        self.entries.get(id)
    }

    /// The asset, once its decode is ready.
    pub fn asset(&self, id: &str) -> Option<&ImageAsset<P>> {
        match self.entries.get(id) {
            Some(DecodeState::Ready(asset)) => Some(asset),
            _ => None,
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn is_ready(&self, id: &str) -> bool {
        self.asset(id).is_some()
    }

    /// Whether every id is registered and ready.
    pub fn is_settled<'a, I>(&self, ids: I) -> bool
    where
        I: IntoIterator<Item = &'a AssetId>,
    {
        ids.into_iter().all(|id| self.is_ready(id.as_str()))
    }

    /// Ids still waiting for decode.
    pub fn pending(&self) -> impl Iterator<Item = &AssetId> {
        self.entries
            .iter()
            .filter(|(_, state)| !state.is_ready())
            .map(|(id, _)| id)
    }
}
