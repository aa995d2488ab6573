//! Grid controller over the emoji mix store.
//!
//! # Responsibility
//! - Originate new-record and remove-record requests.
//! - Refresh the cached visible list after every commit and derive the
//!   batch of view operations a grid widget should animate.
//!
//! # Invariants
//! - Cached state always comes from a full re-read of the store; the
//!   change-set only drives the operation batch, never the cache.
//! - Batch operation order is inserts, removals, updates, moves, and
//!   removal operations remove.

use crate::factory::EmojiMixFactory;
use crate::model::mix::MixRecord;
use crate::store::changes::ChangeSet;
use crate::store::mix_store::{EmojiMixStore, StoreError};
use log::warn;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// One view operation for the rendering layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridOp {
    Insert { index: usize },
    Remove { index: usize },
    Update { index: usize },
    Move { from: usize, to: usize },
}

/// Ordered batch of view operations derived from one change-set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridBatch {
    pub ops: Vec<GridOp>,
}

impl GridBatch {
    /// Flattens a change-set into the pinned operation order:
    /// inserts, removals, updates, moves.
    pub fn from_change_set(change: &ChangeSet) -> Self {
        let mut ops = Vec::new();
        ops.extend(change.inserted().iter().map(|&index| GridOp::Insert { index }));
        ops.extend(change.deleted().iter().map(|&index| GridOp::Remove { index }));
        ops.extend(change.updated().iter().map(|&index| GridOp::Update { index }));
        ops.extend(
            change
                .moved()
                .iter()
                .map(|m| GridOp::Move { from: m.from, to: m.to }),
        );
        Self { ops }
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// Controller error for grid-originated requests.
#[derive(Debug)]
pub enum GridError {
    IndexOutOfBounds { index: usize, len: usize },
    Store(StoreError),
}

impl Display for GridError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IndexOutOfBounds { index, len } => {
                write!(f, "grid index {index} out of bounds for {len} visible cells")
            }
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for GridError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::IndexOutOfBounds { .. } => None,
            Self::Store(err) => Some(err),
        }
    }
}

impl From<StoreError> for GridError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Presentation controller for the emoji mix grid.
pub struct GridController {
    store: EmojiMixStore,
    factory: EmojiMixFactory,
    visible: Vec<MixRecord>,
    invalid_rows: usize,
}

impl GridController {
    pub fn new(store: EmojiMixStore, factory: EmojiMixFactory) -> Self {
        Self {
            store,
            factory,
            visible: Vec::new(),
            invalid_rows: 0,
        }
    }

    /// Pulls the full list from the store into the cache.
    pub fn load(&mut self) -> Result<(), GridError> {
        let snapshot = self.store.list()?;
        self.note_invalid_rows(snapshot.invalid.len());
        self.visible = snapshot.records;
        Ok(())
    }

    /// Currently visible records, in grid order.
    pub fn visible(&self) -> &[MixRecord] {
        &self.visible
    }

    /// Number of persisted rows skipped on the last read because they failed
    /// to decode.
    pub fn invalid_row_count(&self) -> usize {
        self.invalid_rows
    }

    /// Synthesizes a random mix and appends it.
    pub fn add_random(&mut self) -> Result<GridBatch, GridError> {
        let mix = self.factory.make_mix();
        let change = self.store.append(&mix)?;
        self.refresh(&change)
    }

    /// Removes the record behind one visible cell.
    pub fn remove_at(&mut self, index: usize) -> Result<GridBatch, GridError> {
        let Some(record) = self.visible.get(index) else {
            return Err(GridError::IndexOutOfBounds {
                index,
                len: self.visible.len(),
            });
        };
        let change = self.store.delete(record.id)?;
        self.refresh(&change)
    }

    fn refresh(&mut self, change: &ChangeSet) -> Result<GridBatch, GridError> {
        let snapshot = self.store.list()?;
        self.note_invalid_rows(snapshot.invalid.len());
        self.visible = snapshot.records;
        Ok(GridBatch::from_change_set(change))
    }

    fn note_invalid_rows(&mut self, count: usize) {
        if count > 0 {
            warn!("event=grid_refresh module=view status=skipped_rows count={count}");
        }
        self.invalid_rows = count;
    }
}
