//! Core domain logic for EmojiMix.
//! This crate is the single source of truth for business invariants.

pub mod db;
pub mod factory;
pub mod logging;
pub mod model;
pub mod repo;
pub mod store;
pub mod view;

pub use factory::EmojiMixFactory;
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::color::{ColorHexError, Rgba};
pub use model::mix::{EmojiMix, InvalidRecord, InvalidRecordReason, MixId, MixRecord, MixRow};
pub use repo::mix_repo::{MixRepository, RepoError, RepoResult, SqliteMixRepository};
pub use store::changes::{
    ChangeKind, ChangeSet, ChangeTracker, IndexMove, ProtocolViolation, RowChange,
};
pub use store::mix_store::{
    ChangeFeed, EmojiMixStore, MixSnapshot, StoreError, StoreResult, StoreTx,
};
pub use view::grid::{GridBatch, GridController, GridError, GridOp};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
