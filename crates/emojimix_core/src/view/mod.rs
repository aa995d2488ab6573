//! Grid-facing view layer.
//!
//! # Responsibility
//! - Keep a cached copy of the visible record list in sync with the store.
//! - Shape committed change-sets into ordered view operations for a
//!   rendering layer.

pub mod grid;
