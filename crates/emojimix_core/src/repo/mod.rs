//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts for emoji mix rows.
//! - Isolate SQLite query details from store orchestration.
//!
//! # Invariants
//! - Repository APIs return semantic errors (`NotFound`) in addition to DB
//!   transport errors.
//! - Read paths reject structurally broken rows (unparseable ids) instead of
//!   masking them.

pub mod mix_repo;
