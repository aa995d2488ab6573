//! Emoji mix store: transactional writes with change-set reporting.
//!
//! # Responsibility
//! - Own the SQLite connection and the persisted mix collection.
//! - Classify each mutation against the ordered record list and hand one
//!   aggregated `ChangeSet` per commit to callers and subscribers.
//!
//! # Invariants
//! - All mutations go through a transaction; a failed transaction delivers
//!   no change-set and leaves the database untouched.
//! - Change-set indices refer to the decodable record list in its pinned
//!   order (`emojis ASC, id ASC`); undecodable rows occupy no position.
//!
//! # See also
//! - docs/architecture/change-tracking.md

use crate::model::mix::{EmojiMix, InvalidRecord, MixId, MixRecord, MixRow};
use crate::repo::mix_repo::{MixRepository, RepoError, SqliteMixRepository};
use crate::store::changes::{ChangeSet, ChangeTracker, ProtocolViolation, RowChange};
use log::{info, warn};
use rusqlite::{Connection, Transaction};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};

pub type StoreResult<T> = Result<T, StoreError>;

/// Store-level error for mix reads, writes and change tracking.
#[derive(Debug)]
pub enum StoreError {
    Repo(RepoError),
    Protocol(ProtocolViolation),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::Protocol(err) => write!(f, "change tracking aborted: {err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Protocol(err) => Some(err),
        }
    }
}

impl From<RepoError> for StoreError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<ProtocolViolation> for StoreError {
    fn from(value: ProtocolViolation) -> Self {
        Self::Protocol(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Repo(RepoError::from(value))
    }
}

/// Result of one full list read.
///
/// Decode failures never collapse the list: surviving records are returned
/// together with the per-row errors for rows that were skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MixSnapshot {
    pub records: Vec<MixRecord>,
    pub invalid: Vec<InvalidRecord>,
}

/// Subscription handle for committed change-sets.
///
/// Dropping the feed unregisters it; the store never keeps a consumer
/// alive.
pub struct ChangeFeed {
    rx: Receiver<ChangeSet>,
}

impl ChangeFeed {
    /// Returns the next committed change-set without blocking.
    pub fn try_next(&self) -> Option<ChangeSet> {
        match self.rx.try_recv() {
            Ok(change) => Some(change),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }
}

/// Sort key of one decodable row inside the ordered record list.
#[derive(Debug, Clone)]
struct OrderKey {
    id: MixId,
    emojis: String,
}

/// Store over the persisted emoji mix collection.
///
/// Constructed from an explicit connection (dependency injection); the
/// store is the only writer of `emoji_mixes` and of the transient change
/// accumulation state, and all mutating APIs take `&mut self`.
pub struct EmojiMixStore {
    conn: Connection,
    feeds: Vec<Sender<ChangeSet>>,
}

impl EmojiMixStore {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn,
            feeds: Vec::new(),
        }
    }

    /// Registers a change-set feed.
    ///
    /// Every committed transaction sends one `ChangeSet` clone to each live
    /// feed. Disconnected feeds are pruned at the next delivery; with no
    /// feed registered the change-set is still returned to the caller and
    /// otherwise discarded.
    pub fn subscribe(&mut self) -> ChangeFeed {
        let (tx, rx) = channel();
        self.feeds.push(tx);
        ChangeFeed { rx }
    }

    /// Reads the full materialized list, sorted by `emojis ASC, id ASC`.
    ///
    /// Rows that fail to decode are skipped and reported in the snapshot.
    pub fn list(&self) -> StoreResult<MixSnapshot> {
        let repo = SqliteMixRepository::new(&self.conn);
        let rows = repo.list_rows()?;

        let mut records = Vec::with_capacity(rows.len());
        let mut invalid = Vec::new();
        for row in rows {
            match row.decode() {
                Ok(record) => records.push(record),
                Err(err) => {
                    warn!("event=store_list module=store status=skipped_row error={err}");
                    invalid.push(err);
                }
            }
        }

        Ok(MixSnapshot { records, invalid })
    }

    /// Appends one mix in its own transaction.
    pub fn append(&mut self, mix: &EmojiMix) -> StoreResult<ChangeSet> {
        self.transaction(|tx| tx.append(mix).map(|_| ()))
    }

    /// Updates one record's fields in place, in its own transaction.
    pub fn update(&mut self, id: MixId, mix: &EmojiMix) -> StoreResult<ChangeSet> {
        self.transaction(|tx| tx.update(id, mix))
    }

    /// Deletes one record, in its own transaction.
    pub fn delete(&mut self, id: MixId) -> StoreResult<ChangeSet> {
        self.transaction(|tx| tx.delete(id))
    }

    /// Runs several mutations as one commit producing one change-set.
    ///
    /// The pre- and post-transaction record orders are diffed into a raw
    /// event stream and pushed through the change tracker before the commit
    /// is made durable. On any error the transaction rolls back, no
    /// change-set is built and nothing is delivered to subscribers.
    pub fn transaction<F>(&mut self, f: F) -> StoreResult<ChangeSet>
    where
        F: FnOnce(&mut StoreTx<'_>) -> StoreResult<()>,
    {
        let change = {
            let original = load_order(&self.conn)?;
            let tx = self.conn.transaction()?;

            let mut scope = StoreTx {
                tx,
                current: original.clone(),
                updated_ids: BTreeSet::new(),
            };
            f(&mut scope)?;

            let StoreTx {
                tx,
                current,
                updated_ids,
            } = scope;

            let mut tracker = ChangeTracker::new();
            tracker.begin();
            for event in diff_orders(&original, &current, &updated_ids) {
                tracker.record(event)?;
            }
            let change = tracker.finish()?;
            tx.commit()?;

            info!(
                "event=store_commit module=store status=ok inserted={} deleted={} updated={} moved={}",
                change.inserted().len(),
                change.deleted().len(),
                change.updated().len(),
                change.moved().len()
            );
            change
        };
        self.deliver(&change);
        Ok(change)
    }

    fn deliver(&mut self, change: &ChangeSet) {
        self.feeds.retain(|feed| feed.send(change.clone()).is_ok());
    }
}

/// One open write transaction over the store.
///
/// Maintains the ordered key list of decodable records as mutations
/// execute; the pre/post lists are diffed into change events at commit.
pub struct StoreTx<'conn> {
    tx: Transaction<'conn>,
    current: Vec<OrderKey>,
    updated_ids: BTreeSet<MixId>,
}

impl StoreTx<'_> {
    /// Creates a persisted record from the value object.
    pub fn append(&mut self, mix: &EmojiMix) -> StoreResult<MixId> {
        let row = MixRow::from_mix(mix);
        SqliteMixRepository::new(&self.tx).insert_row(&row)?;

        let key = OrderKey {
            id: row.id,
            emojis: mix.emojis.clone(),
        };
        let at = insertion_point(&self.current, &key);
        self.current.insert(at, key);

        Ok(row.id)
    }

    /// Mutates the targeted record's fields in place.
    pub fn update(&mut self, id: MixId, mix: &EmojiMix) -> StoreResult<()> {
        let row = MixRow::with_id(id, mix);
        SqliteMixRepository::new(&self.tx).update_row(&row)?;

        // A row that existed but was undecodable occupies no position yet;
        // after this write it does, so it re-enters the ordered list.
        if let Some(at) = self.current.iter().position(|k| k.id == id) {
            self.current.remove(at);
        }
        let key = OrderKey {
            id,
            emojis: mix.emojis.clone(),
        };
        let at = insertion_point(&self.current, &key);
        self.current.insert(at, key);
        self.updated_ids.insert(id);

        Ok(())
    }

    /// Removes the targeted record.
    pub fn delete(&mut self, id: MixId) -> StoreResult<()> {
        SqliteMixRepository::new(&self.tx).delete_row(id)?;

        if let Some(at) = self.current.iter().position(|k| k.id == id) {
            self.current.remove(at);
        }

        Ok(())
    }
}

fn load_order(conn: &Connection) -> StoreResult<Vec<OrderKey>> {
    let repo = SqliteMixRepository::new(conn);
    let rows = repo.list_rows()?;

    Ok(rows
        .into_iter()
        .filter_map(|row| {
            let id = row.id;
            row.decode().ok().map(|record| OrderKey {
                id,
                emojis: record.mix.emojis,
            })
        })
        .collect())
}

fn insertion_point(order: &[OrderKey], key: &OrderKey) -> usize {
    order.partition_point(|existing| {
        (existing.emojis.as_str(), existing.id) < (key.emojis.as_str(), key.id)
    })
}

/// Diffs the pre- and post-transaction orders into raw change events.
///
/// Rows only in the old order are deletions (old coordinates), rows only in
/// the new order are insertions (new coordinates). A surviving row whose
/// sort key changed and whose rank among survivors changed is a move; a
/// surviving row that was written without reordering is an update, keyed by
/// its pre-transaction index. Survivors that merely shifted because of
/// other rows' changes produce no event.
fn diff_orders(
    original: &[OrderKey],
    current: &[OrderKey],
    updated_ids: &BTreeSet<MixId>,
) -> Vec<RowChange> {
    let original_ids: BTreeSet<MixId> = original.iter().map(|k| k.id).collect();
    let current_ids: BTreeSet<MixId> = current.iter().map(|k| k.id).collect();

    let mut events = Vec::new();
    for (index, key) in original.iter().enumerate() {
        if !current_ids.contains(&key.id) {
            events.push(RowChange::deleted(index));
        }
    }
    for (index, key) in current.iter().enumerate() {
        if !original_ids.contains(&key.id) {
            events.push(RowChange::inserted(index));
        }
    }

    let survivor_rank = |order: &[OrderKey], id: MixId| {
        order
            .iter()
            .filter(|k| original_ids.contains(&k.id) && current_ids.contains(&k.id))
            .position(|k| k.id == id)
    };
    for (old_index, key) in original.iter().enumerate() {
        if !current_ids.contains(&key.id) {
            continue;
        }
        let Some(new_index) = current.iter().position(|k| k.id == key.id) else {
            continue;
        };
        let key_changed = current[new_index].emojis != key.emojis;
        let reordered = survivor_rank(original, key.id) != survivor_rank(current, key.id);
        if key_changed && reordered {
            events.push(RowChange::moved(old_index, new_index));
        } else if updated_ids.contains(&key.id) {
            events.push(RowChange::updated(old_index));
        }
    }

    events
}
