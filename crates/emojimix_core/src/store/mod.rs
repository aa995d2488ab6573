//! Emoji mix store and per-transaction change tracking.
//!
//! # Responsibility
//! - Own the persisted mix collection and its transaction boundaries.
//! - Translate per-row mutation effects into one `ChangeSet` per commit.
//!
//! # Invariants
//! - Exactly one `ChangeSet` is produced per committed transaction.
//! - Accumulation state never leaks across transactions.
//!
//! # See also
//! - docs/architecture/change-tracking.md

pub mod changes;
pub mod mix_store;
