//! Emoji mix repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide stable CRUD APIs over canonical `emoji_mixes` storage.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - `list_rows` ordering is `emojis ASC, id ASC` (BINARY collation), the
//!   single ordering rule shared with the store's in-memory key list.
//! - Row content stays optional here; completeness is a decode concern.
//!
//! # See also
//! - docs/architecture/data-model.md

use crate::db::DbError;
use crate::model::mix::{MixId, MixRow};
use rusqlite::{params, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const MIX_SELECT_SQL: &str = "SELECT
    id,
    emojis,
    color_hex
FROM emoji_mixes";

pub type RepoResult<T> = Result<T, RepoError>;

/// Generic repository error for mix persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    NotFound(MixId),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "emoji mix not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted mix data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::NotFound(_) => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for emoji mix row operations.
pub trait MixRepository {
    fn insert_row(&self, row: &MixRow) -> RepoResult<MixId>;
    fn update_row(&self, row: &MixRow) -> RepoResult<()>;
    fn delete_row(&self, id: MixId) -> RepoResult<()>;
    fn get_row(&self, id: MixId) -> RepoResult<Option<MixRow>>;
    fn list_rows(&self) -> RepoResult<Vec<MixRow>>;
}

/// SQLite-backed mix repository.
pub struct SqliteMixRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteMixRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl MixRepository for SqliteMixRepository<'_> {
    fn insert_row(&self, row: &MixRow) -> RepoResult<MixId> {
        self.conn.execute(
            "INSERT INTO emoji_mixes (id, emojis, color_hex) VALUES (?1, ?2, ?3);",
            params![
                row.id.to_string(),
                row.emojis.as_deref(),
                row.color_hex.as_deref(),
            ],
        )?;

        Ok(row.id)
    }

    fn update_row(&self, row: &MixRow) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE emoji_mixes
             SET
                emojis = ?1,
                color_hex = ?2,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?3;",
            params![
                row.emojis.as_deref(),
                row.color_hex.as_deref(),
                row.id.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(row.id));
        }

        Ok(())
    }

    fn delete_row(&self, id: MixId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM emoji_mixes WHERE id = ?1;", [id.to_string()])?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }

    fn get_row(&self, id: MixId) -> RepoResult<Option<MixRow>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{MIX_SELECT_SQL} WHERE id = ?1;"))?;

        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_mix_row(row)?));
        }

        Ok(None)
    }

    fn list_rows(&self) -> RepoResult<Vec<MixRow>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{MIX_SELECT_SQL} ORDER BY emojis ASC, id ASC;"))?;

        let mut rows = stmt.query([])?;
        let mut result = Vec::new();
        while let Some(row) = rows.next()? {
            result.push(parse_mix_row(row)?);
        }

        Ok(result)
    }
}

fn parse_mix_row(row: &Row<'_>) -> RepoResult<MixRow> {
    let id_text: String = row.get("id")?;
    let id = Uuid::parse_str(&id_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid id value `{id_text}` in emoji_mixes.id"))
    })?;

    Ok(MixRow {
        id,
        emojis: row.get("emojis")?,
        color_hex: row.get("color_hex")?,
    })
}
