//! A collage being edited: session state, decoded images, and output.
//!
//! Ties the pure [`Session`] reducer to an [`ImageSource`] so that removed
//! images are released and late decode results are dropped, and drives
//! the [`Compositor`] and [`encode`].

use image::RgbaImage;

use crate::compose::{Compositor, RasterSurface};
use crate::error::{GridError, RasterError};
use crate::export::{ExportFormat, encode};
use crate::geometry::GridSpec;
use crate::sequence::{AssetId, Sequence};
use crate::session::{Command, Session};
use crate::source::{ImageAsset, ImageSource};

/// Outcome of an upload batch.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UploadReport {
    /// Appended to the sequence, in input order.
    pub accepted: Vec<AssetId>,
    /// Not registered, with the reason.
    pub rejected: Vec<(AssetId, GridError)>,
}

#[derive(Debug, Default)]
pub struct Workspace {
    session: Session,
    source: ImageSource<RgbaImage>,
    compositor: Compositor,
}

impl Workspace {
    pub fn new(spec: GridSpec) -> Self {
        Self {
            session: Session::new(spec),
            source: ImageSource::new(),
            compositor: Compositor::new(),
        }
    }

    /// Use a custom compositor (e.g. a different resampling filter).
    pub fn with_compositor(mut self, compositor: Compositor) -> Self {
        self.compositor = compositor;
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn spec(&self) -> &GridSpec {
        self.session.spec()
    }

    pub fn sequence(&self) -> &Sequence {
        self.session.sequence()
    }

    pub fn source(&self) -> &ImageSource<RgbaImage> {
        &self.source
    }

    /// Ingest decoded images.
    ///
    /// Each image is checked on its own: zero-sized images and ids already
    /// in use are rejected and not registered; the rest are registered and
    /// appended in input order.
    pub fn upload<I, S>(&mut self, images: I) -> UploadReport
    where
        I: IntoIterator<Item = (S, RgbaImage)>,
        S: Into<AssetId>,
    {
        let mut report = UploadReport::default();
        for (id, pixels) in images {
            let id = id.into();
            if self.sequence().contains(id.as_str()) || self.source.contains(id.as_str()) {
                tracing::warn!(%id, "upload rejected: duplicate id");
                report.rejected.push((id.clone(), GridError::DuplicateAsset { id }));
                continue;
            }
            let asset = match ImageAsset::from_rgba(id.clone(), pixels) {
                Ok(asset) => asset,
                Err(e) => {
                    tracing::warn!(%id, error = %e, "upload rejected");
                    report.rejected.push((id, e));
                    continue;
                }
            };
            // Checked above; registration cannot collide.
            if let Err(e) = self.source.register(asset) {
                report.rejected.push((id, e));
                continue;
            }
            report.accepted.push(id);
        }
        if !report.accepted.is_empty() {
            self.commit_append(report.accepted.clone());
        }
        report
    }

    /// Start uploads whose decodes will finish later, in any order.
    ///
    /// The ids are appended right away and their cells stay background
    /// until [`decoded`](Self::decoded) is called for them.
    pub fn begin_upload<I>(&mut self, ids: I) -> Result<(), GridError>
    where
        I: IntoIterator<Item = AssetId>,
    {
        let ids: Vec<AssetId> = ids.into_iter().collect();
        if let Some(id) = ids.iter().find(|id| self.source.contains(id.as_str())) {
            return Err(GridError::DuplicateAsset { id: id.clone() });
        }
        let next = self.session.apply(Command::Append(ids.clone()))?;
        for id in ids {
            self.source.begin_decode(id)?;
        }
        self.session = next.session;
        Ok(())
    }

    /// A decode finished. Returns `false` when the result was dropped
    /// because the image was removed in the meantime.
    pub fn decoded(&mut self, asset: ImageAsset<RgbaImage>) -> bool {
        self.source.complete_decode(asset)
    }

    /// A decode failed; drop the image from the sequence.
    pub fn decode_failed(&mut self, id: &str) -> Result<(), GridError> {
        if !self.source.fail_decode(id) {
            return Err(GridError::UnknownAsset { id: id.into() });
        }
        if let Some(index) = self.sequence().position(id) {
            self.session = self.session.apply(Command::RemoveAt(index))?.session;
        }
        Ok(())
    }

    /// Apply a command, releasing the pixels of a removed image.
    ///
    /// [`Command::Append`] only takes ids the image source already knows;
    /// new images come in through [`upload`](Self::upload) or
    /// [`begin_upload`](Self::begin_upload). Anything else fails with
    /// [`GridError::UnknownAsset`].
    pub fn apply(&mut self, command: Command) -> Result<(), GridError> {
        if let Command::Append(ids) = &command {
            if let Some(id) = ids.iter().find(|id| !self.source.contains(id.as_str())) {
                return Err(GridError::UnknownAsset { id: id.clone() });
            }
        }
        let transition = self.session.apply(command)?;
        if let Some(id) = &transition.removed {
            self.source.release(id.as_str());
        }
        self.session = transition.session;
        Ok(())
    }

    pub fn remove_at(&mut self, index: usize) -> Result<(), GridError> {
        self.apply(Command::RemoveAt(index))
    }

    pub fn move_to(&mut self, from: usize, to: usize) -> Result<(), GridError> {
        self.apply(Command::MoveTo { from, to })
    }

    pub fn set_spec(&mut self, spec: GridSpec) -> Result<(), GridError> {
        self.apply(Command::SetSpec(spec))
    }

    /// Compose the current state. Cells still decoding stay background.
    pub fn compose(&self) -> Result<RasterSurface, GridError> {
        self.compositor
            .compose(self.spec(), self.sequence(), &self.source)
    }

    /// Draw cells of `surface` whose decodes have resolved since it was composed.
    pub fn settle(&self, surface: &mut RasterSurface) -> Result<usize, GridError> {
        self.compositor.settle(surface, &self.source)
    }

    /// Compose and encode. Fails with [`RasterError::Unsettled`] while any
    /// visible image is still decoding.
    pub fn export(&self, format: ExportFormat) -> Result<Vec<u8>, RasterError> {
        let surface = self.compose()?;
        encode(&surface, format)
    }

    fn commit_append(&mut self, ids: Vec<AssetId>) {
        match self.session.apply(Command::Append(ids)) {
            Ok(transition) => self.session = transition.session,
            Err(e) => tracing::warn!(error = %e, "append after registration failed"),
        }
    }
}
