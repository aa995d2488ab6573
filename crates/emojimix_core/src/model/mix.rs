//! Emoji mix value object and persisted row shapes.
//!
//! # Responsibility
//! - Define the user-visible `EmojiMix` value and its stored representation.
//! - Classify rows that cannot be decoded into a complete mix.
//!
//! # Invariants
//! - `EmojiMix` carries no identity; equality is content equality.
//! - `MixRow` is the only shape allowed to have absent fields.
//!
//! # See also
//! - docs/architecture/data-model.md

use crate::model::color::{ColorHexError, Rgba};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for a persisted emoji mix row.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type MixId = Uuid;

/// User-visible unit of data: an emoji string plus a background color.
///
/// Immutable once constructed; the store orders mixes by `emojis` ascending
/// (byte-wise, which equals code-point order for UTF-8 strings).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmojiMix {
    /// Sequence of emoji characters shown in one grid cell.
    pub emojis: String,
    /// Cell background color.
    pub background_color: Rgba,
}

impl EmojiMix {
    /// Creates a mix from its two content fields.
    pub fn new(emojis: impl Into<String>, background_color: Rgba) -> Self {
        Self {
            emojis: emojis.into(),
            background_color,
        }
    }
}

/// Decoded persisted row: stable identity plus a complete mix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MixRecord {
    pub id: MixId,
    pub mix: EmojiMix,
}

/// Raw persisted row as stored in `emoji_mixes`.
///
/// Both content fields are optional at the storage layer; decoding is where
/// completeness is enforced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MixRow {
    pub id: MixId,
    pub emojis: Option<String>,
    pub color_hex: Option<String>,
}

impl MixRow {
    /// Builds the stored shape of a mix under a fresh identity.
    pub fn from_mix(mix: &EmojiMix) -> Self {
        Self::with_id(Uuid::new_v4(), mix)
    }

    /// Builds the stored shape of a mix under an existing identity.
    pub fn with_id(id: MixId, mix: &EmojiMix) -> Self {
        Self {
            id,
            emojis: Some(mix.emojis.clone()),
            color_hex: Some(mix.background_color.hex_string()),
        }
    }

    /// Decodes the row into a complete record.
    ///
    /// A row missing either field, or carrying a malformed color, yields
    /// `InvalidRecord` for that row — never a partially populated mix.
    pub fn decode(self) -> Result<MixRecord, InvalidRecord> {
        let Some(emojis) = self.emojis else {
            return Err(InvalidRecord {
                id: self.id,
                reason: InvalidRecordReason::MissingEmojis,
            });
        };
        let Some(color_hex) = self.color_hex else {
            return Err(InvalidRecord {
                id: self.id,
                reason: InvalidRecordReason::MissingColorHex,
            });
        };
        let background_color = Rgba::parse_hex(&color_hex).map_err(|err| InvalidRecord {
            id: self.id,
            reason: InvalidRecordReason::MalformedColorHex(err),
        })?;

        Ok(MixRecord {
            id: self.id,
            mix: EmojiMix {
                emojis,
                background_color,
            },
        })
    }
}

/// Per-row decode failure, reported alongside the surviving rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidRecord {
    pub id: MixId,
    pub reason: InvalidRecordReason,
}

/// Why a persisted row failed to decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidRecordReason {
    MissingEmojis,
    MissingColorHex,
    MalformedColorHex(ColorHexError),
}

impl Display for InvalidRecord {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.reason {
            InvalidRecordReason::MissingEmojis => {
                write!(f, "row {} has no emojis value", self.id)
            }
            InvalidRecordReason::MissingColorHex => {
                write!(f, "row {} has no color_hex value", self.id)
            }
            InvalidRecordReason::MalformedColorHex(err) => {
                write!(f, "row {} has a malformed color_hex: {err}", self.id)
            }
        }
    }
}

impl Error for InvalidRecord {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.reason {
            InvalidRecordReason::MalformedColorHex(err) => Some(err),
            _ => None,
        }
    }
}
