//! Identifier generation for coordinator-issued entities.

use parity_types::{MatchId, PlayerId, RefereeId};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Generates `prefix_xxxxxxxx` identifiers (8 random hex chars).
///
/// Seedable so tests get reproducible ids. Bearer tokens are NOT produced
/// here; they always come from OS entropy via
/// [`parity_types::AuthToken::random`].
#[derive(Debug)]
pub struct IdGenerator {
    rng: ChaCha8Rng,
}

impl IdGenerator {
    pub fn from_entropy() -> Self {
        Self {
            rng: ChaCha8Rng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    fn suffix(&mut self) -> String {
        let raw: u32 = self.rng.gen();
        format!("{raw:08x}")
    }

    pub fn player_id(&mut self) -> PlayerId {
        PlayerId::new(format!("player_{}", self.suffix()))
    }

    pub fn referee_id(&mut self) -> RefereeId {
        RefereeId::new(format!("ref_{}", self.suffix()))
    }

    pub fn match_id(&mut self) -> MatchId {
        MatchId::new(format!("match_{}", self.suffix()))
    }
}
