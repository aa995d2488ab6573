//! RGBA color value and hex marshalling.
//!
//! # Responsibility
//! - Represent the background color of an emoji mix with 8-bit channels.
//! - Convert between color values and the persisted `#RRGGBB`/`#RRGGBBAA`
//!   hex form.
//!
//! # Invariants
//! - `hex_string` output always re-parses to an equal color.
//! - Parsing never produces a partially initialized color.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// 8-bit RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgba {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub alpha: u8,
}

/// Hex unmarshalling error for persisted color strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColorHexError {
    MissingHashPrefix(String),
    UnsupportedLength(usize),
    InvalidHexDigit(String),
}

impl Display for ColorHexError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingHashPrefix(value) => {
                write!(f, "color hex `{value}` does not start with `#`")
            }
            Self::UnsupportedLength(len) => write!(
                f,
                "color hex has {len} digits; expected 6 (RRGGBB) or 8 (RRGGBBAA)"
            ),
            Self::InvalidHexDigit(pair) => write!(f, "color hex contains non-hex pair `{pair}`"),
        }
    }
}

impl Error for ColorHexError {}

impl Rgba {
    /// Creates a color from explicit channel values.
    pub const fn new(red: u8, green: u8, blue: u8, alpha: u8) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates a fully opaque color.
    pub const fn opaque(red: u8, green: u8, blue: u8) -> Self {
        Self::new(red, green, blue, u8::MAX)
    }

    /// Renders the persisted hex form.
    ///
    /// Opaque colors use the short `#RRGGBB` shape; any other alpha is kept
    /// explicit as `#RRGGBBAA`.
    pub fn hex_string(&self) -> String {
        if self.alpha == u8::MAX {
            format!("#{:02X}{:02X}{:02X}", self.red, self.green, self.blue)
        } else {
            format!(
                "#{:02X}{:02X}{:02X}{:02X}",
                self.red, self.green, self.blue, self.alpha
            )
        }
    }

    /// Parses a `#RRGGBB` or `#RRGGBBAA` hex string.
    pub fn parse_hex(value: &str) -> Result<Self, ColorHexError> {
        let digits = value
            .strip_prefix('#')
            .ok_or_else(|| ColorHexError::MissingHashPrefix(value.to_string()))?;

        if digits.chars().count() != 6 && digits.chars().count() != 8 {
            return Err(ColorHexError::UnsupportedLength(digits.chars().count()));
        }
        // Byte-range slicing below is only safe on ASCII input.
        if !digits.is_ascii() {
            return Err(ColorHexError::InvalidHexDigit(digits.to_string()));
        }

        let channel = |range: std::ops::Range<usize>| -> Result<u8, ColorHexError> {
            let pair = &digits[range];
            u8::from_str_radix(pair, 16)
                .map_err(|_| ColorHexError::InvalidHexDigit(pair.to_string()))
        };

        Ok(Self {
            red: channel(0..2)?,
            green: channel(2..4)?,
            blue: channel(4..6)?,
            alpha: if digits.len() == 8 {
                channel(6..8)?
            } else {
                u8::MAX
            },
        })
    }
}
