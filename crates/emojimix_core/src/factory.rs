//! Random emoji mix factory.
//!
//! # Responsibility
//! - Synthesize new mixes for user-initiated "add" actions.
//!
//! No determinism is promised to callers; seeded construction exists so
//! tests can pin outputs.

use crate::model::color::Rgba;
use crate::model::mix::EmojiMix;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Fixed palette new mixes draw from.
const EMOJI_PALETTE: &[&str] = &[
    "🍇", "🍈", "🍉", "🍊", "🍋", "🍌", "🍍", "🥭", "🍎", "🍏", "🍐", "🍒", "🍓", "🫐", "🥝",
    "😀", "😁", "😂", "🤣", "🙂", "😇", "🥰", "😍", "🤩", "🥳", "🤪", "😎", "🤖", "👻", "🐣",
];

const MIN_EMOJIS_PER_MIX: usize = 1;
const MAX_EMOJIS_PER_MIX: usize = 3;

/// Produces new emoji mixes from a private RNG.
pub struct EmojiMixFactory {
    rng: StdRng,
}

impl EmojiMixFactory {
    /// Creates a factory seeded from OS entropy.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Creates a factory with a fixed seed, for deterministic tests.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Synthesizes one new mix: 1..=3 palette emoji plus a random opaque
    /// background color.
    pub fn make_mix(&mut self) -> EmojiMix {
        let count = self
            .rng
            .gen_range(MIN_EMOJIS_PER_MIX..=MAX_EMOJIS_PER_MIX);
        let emojis = (0..count)
            .map(|_| EMOJI_PALETTE[self.rng.gen_range(0..EMOJI_PALETTE.len())])
            .collect::<String>();
        let background_color = Rgba::opaque(self.rng.gen(), self.rng.gen(), self.rng.gen());

        EmojiMix::new(emojis, background_color)
    }
}

impl Default for EmojiMixFactory {
    fn default() -> Self {
        Self::new()
    }
}
