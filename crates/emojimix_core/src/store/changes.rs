//! Change-set accumulation for one write transaction.
//!
//! # Responsibility
//! - Buffer raw per-row change events between `begin` and `finish`.
//! - Aggregate them into one `ChangeSet` snapshot per transaction.
//!
//! # Invariants
//! - Within one change-set, each original index appears in at most one of
//!   {deleted, updated, moved-source}, and each resulting index appears in
//!   at most one of {inserted, moved-destination}.
//! - A malformed event stream is a protocol violation, not a soft error;
//!   it aborts the current transaction's change tracking.
//!
//! # See also
//! - docs/architecture/change-tracking.md

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Kind of a raw per-row change event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Inserted,
    Deleted,
    Updated,
    Moved,
}

/// Raw per-row change event for one transaction.
///
/// Old indices are expressed in pre-transaction list coordinates, new
/// indices in post-transaction coordinates; updates are keyed by the
/// record's pre-transaction index, mirrored into `new_index` because the
/// event shape requires one. Index presence is kind-dependent:
/// `Inserted`/`Updated` carry the new index, `Deleted` the old index,
/// `Moved` both. The constructors below are the only supported way to
/// build well-formed events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowChange {
    pub kind: ChangeKind,
    pub old_index: Option<usize>,
    pub new_index: Option<usize>,
}

impl RowChange {
    pub fn inserted(at: usize) -> Self {
        Self {
            kind: ChangeKind::Inserted,
            old_index: None,
            new_index: Some(at),
        }
    }

    pub fn deleted(at: usize) -> Self {
        Self {
            kind: ChangeKind::Deleted,
            old_index: Some(at),
            new_index: None,
        }
    }

    pub fn updated(at: usize) -> Self {
        Self {
            kind: ChangeKind::Updated,
            old_index: Some(at),
            new_index: Some(at),
        }
    }

    pub fn moved(from: usize, to: usize) -> Self {
        Self {
            kind: ChangeKind::Moved,
            old_index: Some(from),
            new_index: Some(to),
        }
    }
}

/// One moved row, as an (old index, new index) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexMove {
    pub from: usize,
    pub to: usize,
}

/// Snapshot of one transaction's effect on the ordered record list.
///
/// Handed to consumers by value at transaction end and not retained by the
/// store afterward.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSet {
    inserted: BTreeSet<usize>,
    deleted: BTreeSet<usize>,
    updated: BTreeSet<usize>,
    moved: Vec<IndexMove>,
}

impl ChangeSet {
    pub fn inserted(&self) -> &BTreeSet<usize> {
        &self.inserted
    }

    pub fn deleted(&self) -> &BTreeSet<usize> {
        &self.deleted
    }

    pub fn updated(&self) -> &BTreeSet<usize> {
        &self.updated
    }

    pub fn moved(&self) -> &[IndexMove] {
        &self.moved
    }

    pub fn is_empty(&self) -> bool {
        self.inserted.is_empty()
            && self.deleted.is_empty()
            && self.updated.is_empty()
            && self.moved.is_empty()
    }

    fn claims_source(&self, index: usize) -> bool {
        self.deleted.contains(&index)
            || self.updated.contains(&index)
            || self.moved.iter().any(|m| m.from == index)
    }

    fn claims_destination(&self, index: usize) -> bool {
        self.inserted.contains(&index) || self.moved.iter().any(|m| m.to == index)
    }
}

/// Malformed change-event stream.
///
/// These are contract breaches between the store and the tracker, not
/// recoverable data conditions; the store aborts (rolls back) the
/// transaction that produced one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolViolation {
    MissingNewIndex(ChangeKind),
    MissingOldIndex(ChangeKind),
    SourceIndexClaimedTwice(usize),
    DestinationIndexClaimedTwice(usize),
    OutsideTransaction,
}

impl Display for ProtocolViolation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingNewIndex(kind) => {
                write!(f, "{kind:?} change event arrived without a new index")
            }
            Self::MissingOldIndex(kind) => {
                write!(f, "{kind:?} change event arrived without an old index")
            }
            Self::SourceIndexClaimedTwice(index) => {
                write!(f, "original index {index} claimed by more than one change")
            }
            Self::DestinationIndexClaimedTwice(index) => {
                write!(f, "resulting index {index} claimed by more than one change")
            }
            Self::OutsideTransaction => {
                write!(f, "change event outside a begin/finish span")
            }
        }
    }
}

impl Error for ProtocolViolation {}

/// Accumulates raw change events into one `ChangeSet` per transaction.
#[derive(Debug, Default)]
pub struct ChangeTracker {
    active: Option<ChangeSet>,
}

impl ChangeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a transaction span, resetting all accumulation state.
    pub fn begin(&mut self) {
        self.active = Some(ChangeSet::default());
    }

    /// Classifies one raw event into the active change-set.
    ///
    /// Fails fast on events outside a span, on kind/index mismatches and on
    /// index overlaps that would break the change-set invariant.
    pub fn record(&mut self, change: RowChange) -> Result<(), ProtocolViolation> {
        let Some(building) = self.active.as_mut() else {
            return Err(ProtocolViolation::OutsideTransaction);
        };

        match change.kind {
            ChangeKind::Inserted => {
                let at = change
                    .new_index
                    .ok_or(ProtocolViolation::MissingNewIndex(change.kind))?;
                if building.claims_destination(at) {
                    return Err(ProtocolViolation::DestinationIndexClaimedTwice(at));
                }
                building.inserted.insert(at);
            }
            ChangeKind::Deleted => {
                let at = change
                    .old_index
                    .ok_or(ProtocolViolation::MissingOldIndex(change.kind))?;
                if building.claims_source(at) {
                    return Err(ProtocolViolation::SourceIndexClaimedTwice(at));
                }
                building.deleted.insert(at);
            }
            ChangeKind::Updated => {
                let at = change
                    .new_index
                    .ok_or(ProtocolViolation::MissingNewIndex(change.kind))?;
                if building.claims_source(at) {
                    return Err(ProtocolViolation::SourceIndexClaimedTwice(at));
                }
                building.updated.insert(at);
            }
            ChangeKind::Moved => {
                let from = change
                    .old_index
                    .ok_or(ProtocolViolation::MissingOldIndex(change.kind))?;
                let to = change
                    .new_index
                    .ok_or(ProtocolViolation::MissingNewIndex(change.kind))?;
                if building.claims_source(from) {
                    return Err(ProtocolViolation::SourceIndexClaimedTwice(from));
                }
                if building.claims_destination(to) {
                    return Err(ProtocolViolation::DestinationIndexClaimedTwice(to));
                }
                building.moved.push(IndexMove { from, to });
            }
        }

        Ok(())
    }

    /// Closes the span and yields the aggregated change-set.
    pub fn finish(&mut self) -> Result<ChangeSet, ProtocolViolation> {
        self.active.take().ok_or(ProtocolViolation::OutsideTransaction)
    }
}

#[cfg(test)]
mod tests {
    use super::{ChangeKind, ChangeTracker, ProtocolViolation, RowChange};

    #[test]
    fn aggregates_one_changeset_per_span() {
        let mut tracker = ChangeTracker::new();
        tracker.begin();
        tracker.record(RowChange::inserted(0)).unwrap();
        tracker.record(RowChange::deleted(2)).unwrap();
        tracker.record(RowChange::updated(3)).unwrap();
        tracker.record(RowChange::moved(4, 1)).unwrap();

        let change = tracker.finish().unwrap();
        assert!(change.inserted().contains(&0));
        assert!(change.deleted().contains(&2));
        assert!(change.updated().contains(&3));
        assert_eq!(change.moved()[0].from, 4);
        assert_eq!(change.moved()[0].to, 1);
    }

    #[test]
    fn begin_resets_previous_accumulation() {
        let mut tracker = ChangeTracker::new();
        tracker.begin();
        tracker.record(RowChange::inserted(0)).unwrap();
        tracker.begin();

        let change = tracker.finish().unwrap();
        assert!(change.is_empty());
    }

    #[test]
    fn event_outside_span_is_a_violation() {
        let mut tracker = ChangeTracker::new();
        assert_eq!(
            tracker.record(RowChange::inserted(0)),
            Err(ProtocolViolation::OutsideTransaction)
        );
        assert_eq!(
            tracker.finish().unwrap_err(),
            ProtocolViolation::OutsideTransaction
        );
    }

    #[test]
    fn missing_indices_fail_fast() {
        let mut tracker = ChangeTracker::new();
        tracker.begin();

        let malformed_insert = RowChange {
            kind: ChangeKind::Inserted,
            old_index: Some(1),
            new_index: None,
        };
        assert_eq!(
            tracker.record(malformed_insert),
            Err(ProtocolViolation::MissingNewIndex(ChangeKind::Inserted))
        );

        let malformed_delete = RowChange {
            kind: ChangeKind::Deleted,
            old_index: None,
            new_index: Some(1),
        };
        assert_eq!(
            tracker.record(malformed_delete),
            Err(ProtocolViolation::MissingOldIndex(ChangeKind::Deleted))
        );

        let malformed_move = RowChange {
            kind: ChangeKind::Moved,
            old_index: Some(1),
            new_index: None,
        };
        assert_eq!(
            tracker.record(malformed_move),
            Err(ProtocolViolation::MissingNewIndex(ChangeKind::Moved))
        );
    }

    #[test]
    fn overlapping_index_claims_are_violations() {
        let mut tracker = ChangeTracker::new();
        tracker.begin();
        tracker.record(RowChange::deleted(1)).unwrap();
        assert_eq!(
            tracker.record(RowChange::updated(1)),
            Err(ProtocolViolation::SourceIndexClaimedTwice(1))
        );
        assert_eq!(
            tracker.record(RowChange::moved(1, 5)),
            Err(ProtocolViolation::SourceIndexClaimedTwice(1))
        );

        tracker.record(RowChange::inserted(0)).unwrap();
        assert_eq!(
            tracker.record(RowChange::moved(3, 0)),
            Err(ProtocolViolation::DestinationIndexClaimedTwice(0))
        );
    }
}
