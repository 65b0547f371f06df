//! Ordered image sequence with a tracked selection.
//!
//! A [`Sequence`] is a value: every operation borrows the current one and
//! returns the next, or an error with the current one untouched.
//!
//! # Example
//!
//! ```
//! use zengrid::{AssetId, Sequence};
//!
//! let seq = Sequence::new().append(["a", "b", "c", "d"].map(AssetId::from)).unwrap();
//! let moved = seq.move_to(0, 2).unwrap();
//! let ids: Vec<&str> = moved.iter().map(AssetId::as_str).collect();
//! assert_eq!(ids, ["b", "c", "a", "d"]);
//! ```

use alloc::string::String;
use alloc::vec::Vec;
use core::borrow::Borrow;
use core::fmt;

use crate::error::GridError;

/// Stable, opaque image identifier.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct AssetId(String);

impl AssetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AssetId {
    fn from(id: &str) -> Self {
        Self(String::from(id))
    }
}

impl From<String> for AssetId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Borrow<str> for AssetId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Display order of the images, plus the focused position.
///
/// Invariants: no id appears twice, and the selection (when set) is a
/// valid position.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "SequenceRecord"))]
pub struct Sequence {
    items: Vec<AssetId>,
    selection: Option<usize>,
}

impl Sequence {
    /// Empty sequence, nothing selected.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&AssetId> {
        self.items.get(index)
    }

    pub fn ids(&self) -> &[AssetId] {
        &self.items
    }

    pub fn iter(&self) -> core::slice::Iter<'_, AssetId> {
        self.items.iter()
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.items.iter().position(|item| item.as_str() == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    /// Currently focused position, if any.
    pub fn selection(&self) -> Option<usize> {
        self.selection
    }

    /// Id at the focused position.
    pub fn selected(&self) -> Option<&AssetId> {
        self.selection.and_then(|i| self.items.get(i))
    }

    /// Items that get a grid cell when the grid has `cells` cells.
    pub fn visible(&self, cells: usize) -> &[AssetId] {
        &self.items[..cells.min(self.items.len())]
    }

    /// Items past the last cell. They stay in the sequence and reappear
    /// when the grid grows or earlier items are removed.
    pub fn overflow(&self, cells: usize) -> &[AssetId] {
        &self.items[cells.min(self.items.len())..]
    }

    /// Append ids in input order.
    ///
    /// If nothing was selected and at least one id is appended, the first
    /// new item becomes selected; an existing selection is kept. Any id that
    /// is already present (or repeated in `ids`) rejects the whole batch.
    pub fn append<I>(&self, ids: I) -> Result<Self, GridError>
    where
        I: IntoIterator<Item = AssetId>,
    {
        let mut items = self.items.clone();
        let first_new = items.len();
        for id in ids {
            if items.contains(&id) {
                return Err(GridError::DuplicateAsset { id });
            }
            items.push(id);
        }
        let selection = match self.selection {
            None if items.len() > first_new => Some(first_new),
            kept => kept,
        };
        Ok(Self { items, selection })
    }

    /// Remove the item at `index`.
    ///
    /// A selection on the removed item is cleared; a selection after it
    /// shifts down so it keeps pointing at the same item.
    pub fn remove_at(&self, index: usize) -> Result<Self, GridError> {
        self.check_index(index)?;
        let mut items = self.items.clone();
        items.remove(index);
        let selection = match self.selection {
            Some(s) if s == index => None,
            Some(s) if s > index => Some(s - 1),
            kept => kept,
        };
        Ok(Self { items, selection })
    }

    /// Move the item at `from` so that it ends up at `to`.
    ///
    /// Remove-then-insert semantics (not a swap): the item is taken out and
    /// reinserted at `to` in the shortened sequence. Items strictly between
    /// the two positions shift one place against the move. The selection
    /// follows the item it pointed at. `from == to` returns an identical value.
    pub fn move_to(&self, from: usize, to: usize) -> Result<Self, GridError> {
        self.check_index(from)?;
        self.check_index(to)?;
        if from == to {
            return Ok(self.clone());
        }
        let mut items = self.items.clone();
        let item = items.remove(from);
        items.insert(to, item);
        let selection = self.selection.map(|s| shifted(s, from, to));
        Ok(Self { items, selection })
    }

    /// Focus `index`, or clear the focus with `None`.
    pub fn select(&self, index: Option<usize>) -> Result<Self, GridError> {
        if let Some(i) = index {
            self.check_index(i)?;
        }
        Ok(Self {
            items: self.items.clone(),
            selection: index,
        })
    }

    /// Move the selected item by `delta` positions (keyboard reordering).
    ///
    /// Fails with [`GridError::IndexOutOfRange`] when nothing is selected or
    /// the target falls outside the sequence. A target before the start is
    /// reported as index `usize::MAX`.
    pub fn move_selected(&self, delta: isize) -> Result<Self, GridError> {
        let len = self.items.len();
        let Some(from) = self.selection else {
            return Err(GridError::IndexOutOfRange { index: len, len });
        };
        let to = from.checked_add_signed(delta).ok_or(GridError::IndexOutOfRange {
            index: usize::MAX,
            len,
        })?;
        self.move_to(from, to)
    }

    fn check_index(&self, index: usize) -> Result<(), GridError> {
        if index >= self.items.len() {
            return Err(GridError::IndexOutOfRange {
                index,
                len: self.items.len(),
            });
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a Sequence {
    type Item = &'a AssetId;
    type IntoIter = core::slice::Iter<'a, AssetId>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl TryFrom<Vec<AssetId>> for Sequence {
    type Error = GridError;

    /// Build a sequence with nothing selected.
    fn try_from(ids: Vec<AssetId>) -> Result<Self, GridError> {
        Sequence::new()
            .append(ids)
            .map(|seq| Self {
                items: seq.items,
                selection: None,
            })
    }
}

/// New position of the item at `pos` after moving `from` to `to`.
fn shifted(pos: usize, from: usize, to: usize) -> usize {
    if pos == from {
        to
    } else if from < to && pos > from && pos <= to {
        pos - 1
    } else if to < from && pos >= to && pos < from {
        pos + 1
    } else {
        pos
    }
}

/// Unchecked wire form; validated on the way in.
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct SequenceRecord {
    items: Vec<AssetId>,
    selection: Option<usize>,
}

#[cfg(feature = "serde")]
impl TryFrom<SequenceRecord> for Sequence {
    type Error = GridError;

    fn try_from(record: SequenceRecord) -> Result<Self, GridError> {
        Sequence::try_from(record.items)?.select(record.selection)
    }
}
