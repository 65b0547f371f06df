//! Session state and the pure reducer that advances it.
//!
//! The state ([`GridSpec`] + [`Sequence`] with its selection) is a value.
//! [`Session::apply`] takes a [`Command`] and returns the next value, or an
//! error with the current value unchanged. Pointer and keyboard handling
//! live outside; they only ever produce commands.

use alloc::vec::Vec;

use crate::error::GridError;
use crate::geometry::GridSpec;
use crate::sequence::{AssetId, Sequence};

/// A single state change.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Append ids in order (upload).
    Append(Vec<AssetId>),
    /// Remove the item at a position.
    RemoveAt(usize),
    /// Reorder: move the item at `from` to `to`.
    MoveTo {
        /// Current position.
        from: usize,
        /// Position after the move.
        to: usize,
    },
    /// Focus a position, or clear the focus.
    Select(Option<usize>),
    /// Move the focused item by a signed offset.
    MoveSelected(isize),
    /// Replace the grid configuration.
    SetSpec(GridSpec),
}

/// Result of applying one [`Command`].
#[derive(Clone, Debug, PartialEq)]
pub struct Transition {
    /// The next session value.
    pub session: Session,
    /// Id dropped from the sequence, for releasing its pixels.
    pub removed: Option<AssetId>,
}

/// Grid configuration and image order at one point in time.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Session {
    spec: GridSpec,
    sequence: Sequence,
    /// Bumped on every change; identical revisions mean identical state.
    revision: u64,
}

impl Session {
    pub fn new(spec: GridSpec) -> Self {
        Self {
            spec,
            sequence: Sequence::new(),
            revision: 0,
        }
    }

    pub fn spec(&self) -> &GridSpec {
        &self.spec
    }

    pub fn sequence(&self) -> &Sequence {
        &self.sequence
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Apply `command`, producing the next session.
    ///
    /// [`Command::SetSpec`] is refused with
    /// [`GridError::InvalidGridConfiguration`] when the new spec leaves no
    /// room for cells. A move onto the same position returns an identical
    /// session (same revision).
    pub fn apply(&self, command: Command) -> Result<Transition, GridError> {
        let mut removed = None;
        let (spec, sequence) = match command {
            Command::Append(ids) => (self.spec, self.sequence.append(ids)?),
            Command::RemoveAt(index) => {
                let next = self.sequence.remove_at(index)?;
                removed = self.sequence.get(index).cloned();
                (self.spec, next)
            }
            Command::MoveTo { from, to } => (self.spec, self.sequence.move_to(from, to)?),
            Command::Select(index) => (self.spec, self.sequence.select(index)?),
            Command::MoveSelected(delta) => (self.spec, self.sequence.move_selected(delta)?),
            Command::SetSpec(spec) => {
                spec.cell_size()?;
                (spec, self.sequence.clone())
            }
        };

        if spec == self.spec && sequence == self.sequence {
            return Ok(Transition {
                session: self.clone(),
                removed,
            });
        }

        let session = Self {
            spec,
            sequence,
            revision: self.revision + 1,
        };
        tracing::debug!(
            revision = session.revision,
            items = session.sequence.len(),
            selection = ?session.sequence.selection(),
            "session updated"
        );
        Ok(Transition { session, removed })
    }

    /// Apply commands in order, stopping at the first failure.
    pub fn apply_all<I>(&self, commands: I) -> Result<Session, GridError>
    where
        I: IntoIterator<Item = Command>,
    {
        let mut session = self.clone();
        for command in commands {
            session = session.apply(command)?.session;
        }
        Ok(session)
    }

    /// Ids that get a cell under the current spec.
    pub fn visible(&self) -> &[AssetId] {
        self.sequence.visible(self.spec.cell_count())
    }

    /// Ids past the last cell.
    pub fn overflow(&self) -> &[AssetId] {
        self.sequence.overflow(self.spec.cell_count())
    }
}
