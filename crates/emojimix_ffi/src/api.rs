//! FFI use-case API for UI-facing calls.
//!
//! # Responsibility
//! - Expose stable, use-case-level functions to the UI shell via FRB.
//! - Keep error semantics simple for early-stage UI integration.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - Return values are UTF-8 strings and envelopes with stable meaning.

use emojimix_core::db::open_db;
use emojimix_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    EmojiMixFactory, EmojiMixStore, StoreError,
};
use log::info;
use std::path::PathBuf;
use std::sync::OnceLock;
use uuid::Uuid;

const ENTRY_DB_FILE_NAME: &str = "emojimix_entry.sqlite3";
static ENTRY_DB_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - UI-thread safe for current implementation.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - UI-thread safe for current implementation.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Sync call; may perform small file-system setup work.
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Reconfiguration attempts with different level or directory return error.
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// One grid cell returned by the list API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryMixItem {
    /// Stable mix ID in string form.
    pub mix_id: String,
    /// Emoji string shown in the cell.
    pub emojis: String,
    /// Cell background color as `#RRGGBB`/`#RRGGBBAA`.
    pub color_hex: String,
}

/// List response envelope for the grid flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryListResponse {
    /// Decoded mixes in grid order (empty when none or on failure).
    pub items: Vec<EntryMixItem>,
    /// Number of persisted rows skipped because they failed to decode.
    pub invalid_rows: u32,
    /// Human-readable response message for diagnostics.
    pub message: String,
}

/// Generic action response envelope for grid commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryActionResponse {
    /// Whether operation succeeded.
    pub ok: bool,
    /// Optional affected mix ID.
    pub mix_id: Option<String>,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

impl EntryActionResponse {
    fn success(message: impl Into<String>, mix_id: String) -> Self {
        Self {
            ok: true,
            mix_id: Some(mix_id),
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            mix_id: None,
            message: message.into(),
        }
    }
}

/// Appends one randomly generated mix to the persisted grid.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Never panics.
/// - Returns operation result and created mix ID on success.
#[flutter_rust_bridge::frb(sync)]
pub fn entry_add_random_mix() -> EntryActionResponse {
    let result = with_store(|store| {
        let mix = EmojiMixFactory::new().make_mix();
        let mut created = None;
        store.transaction(|tx| {
            created = Some(tx.append(&mix)?);
            Ok(())
        })?;
        Ok(created)
    });

    match result {
        Ok(Some(mix_id)) => {
            info!("event=entry_add module=ffi status=ok mix_id={mix_id}");
            EntryActionResponse::success("Mix added.", mix_id.to_string())
        }
        Ok(None) => EntryActionResponse::failure("entry_add_random_mix failed: no id returned"),
        Err(err) => EntryActionResponse::failure(format!("entry_add_random_mix failed: {err}")),
    }
}

/// Lists the persisted grid in display order.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Never panics.
/// - Rows that fail to decode are skipped and counted, never dropped
///   silently.
#[flutter_rust_bridge::frb(sync)]
pub fn entry_list_mixes() -> EntryListResponse {
    match with_store(|store| store.list()) {
        Ok(snapshot) => {
            let items = snapshot
                .records
                .iter()
                .map(|record| EntryMixItem {
                    mix_id: record.id.to_string(),
                    emojis: record.mix.emojis.clone(),
                    color_hex: record.mix.background_color.hex_string(),
                })
                .collect::<Vec<_>>();
            let invalid_rows = u32::try_from(snapshot.invalid.len()).unwrap_or(u32::MAX);
            let message = if invalid_rows > 0 {
                format!(
                    "Showing {} mix(es); skipped {invalid_rows} unreadable row(s).",
                    items.len()
                )
            } else {
                format!("Showing {} mix(es).", items.len())
            };
            EntryListResponse {
                items,
                invalid_rows,
                message,
            }
        }
        Err(err) => EntryListResponse {
            items: Vec::new(),
            invalid_rows: 0,
            message: format!("entry_list_mixes failed: {err}"),
        },
    }
}

/// Removes one mix from the persisted grid.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Never panics.
/// - Unknown or malformed ids return a failure envelope.
#[flutter_rust_bridge::frb(sync)]
pub fn entry_remove_mix(mix_id: String) -> EntryActionResponse {
    let Ok(id) = Uuid::parse_str(mix_id.trim()) else {
        return EntryActionResponse::failure(format!("invalid mix id `{mix_id}`"));
    };

    match with_store(|store| store.delete(id)) {
        Ok(_) => EntryActionResponse::success("Mix removed.", id.to_string()),
        Err(err) => EntryActionResponse::failure(format!("entry_remove_mix failed: {err}")),
    }
}

fn resolve_entry_db_path() -> PathBuf {
    ENTRY_DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var("EMOJIMIX_DB_PATH") {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(ENTRY_DB_FILE_NAME)
        })
        .clone()
}

fn with_store<T>(f: impl FnOnce(&mut EmojiMixStore) -> Result<T, StoreError>) -> Result<T, String> {
    let db_path = resolve_entry_db_path();
    let conn = open_db(&db_path).map_err(|err| format!("entry DB open failed: {err}"))?;
    let mut store = EmojiMixStore::new(conn);
    f(&mut store).map_err(|err| err.to_string())
}

#[cfg(test)]
mod tests {
    use super::{
        core_version, entry_add_random_mix, entry_list_mixes, entry_remove_mix, init_logging, ping,
    };
    use emojimix_core::db::open_db;
    use std::sync::Mutex;

    // The entry DB file is shared process-wide; serialize the tests that
    // touch it so first-time migrations cannot race.
    static DB_TEST_LOCK: Mutex<()> = Mutex::new(());

    fn db_guard() -> std::sync::MutexGuard<'static, ()> {
        DB_TEST_LOCK.lock().unwrap_or_else(|err| err.into_inner())
    }

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        let error = init_logging("info".to_string(), String::new());
        assert!(!error.is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let error = init_logging("verbose".to_string(), "tmp/logs".to_string());
        assert!(!error.is_empty());
    }

    #[test]
    fn added_mix_appears_in_list() {
        let _guard = db_guard();
        let created = entry_add_random_mix();
        assert!(created.ok, "{}", created.message);
        let created_id = created.mix_id.expect("created mix should return mix_id");

        let response = entry_list_mixes();
        assert!(
            response.items.iter().any(|item| item.mix_id == created_id),
            "{}",
            response.message
        );
    }

    #[test]
    fn removed_mix_disappears_from_storage() {
        let _guard = db_guard();
        let created = entry_add_random_mix();
        assert!(created.ok, "{}", created.message);
        let created_id = created.mix_id.expect("created mix should return mix_id");

        let removed = entry_remove_mix(created_id.clone());
        assert!(removed.ok, "{}", removed.message);

        let response = entry_list_mixes();
        assert!(response.items.iter().all(|item| item.mix_id != created_id));

        let conn = open_db(super::resolve_entry_db_path()).expect("open db");
        let remaining: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM emoji_mixes WHERE id = ?1;",
                [created_id.as_str()],
                |row| row.get(0),
            )
            .expect("query removed row");
        assert_eq!(remaining, 0);
    }

    #[test]
    fn remove_rejects_malformed_id() {
        let response = entry_remove_mix("not-a-uuid".to_string());
        assert!(!response.ok);
        assert!(response.message.contains("invalid mix id"));
    }

    #[test]
    fn remove_unknown_id_reports_failure() {
        let _guard = db_guard();
        let response = entry_remove_mix("00000000-0000-4000-8000-00000000dead".to_string());
        assert!(!response.ok);
    }
}
