//! Decision strategies.
//!
//! The strategy is a pluggable policy, not orchestration logic: the agent
//! calls [`Strategy::choose`] once per decision request and sends whatever
//! comes back.

use crate::agent::{GameOutcome, GameRecord};
use parity_types::Parity;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Picks a parity given the agent's game history and previous choice.
pub trait Strategy: Send {
    fn choose(&mut self, history: &[GameRecord], last_choice: Option<Parity>) -> Parity;

    /// Label reported in registration metadata.
    fn name(&self) -> &'static str;
}

/// Uniformly random choice.
pub struct Random {
    rng: ChaCha8Rng,
}

impl Random {
    pub fn new() -> Self {
        Self {
            rng: ChaCha8Rng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl Default for Random {
    fn default() -> Self {
        Self::new()
    }
}

impl Strategy for Random {
    fn choose(&mut self, _history: &[GameRecord], _last_choice: Option<Parity>) -> Parity {
        if self.rng.gen::<bool>() {
            Parity::Even
        } else {
            Parity::Odd
        }
    }

    fn name(&self) -> &'static str {
        "random"
    }
}

/// Alternates between the two parities; the first choice is random.
pub struct Alternating {
    rng: ChaCha8Rng,
}

impl Alternating {
    pub fn new() -> Self {
        Self {
            rng: ChaCha8Rng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl Default for Alternating {
    fn default() -> Self {
        Self::new()
    }
}

impl Strategy for Alternating {
    fn choose(&mut self, _history: &[GameRecord], last_choice: Option<Parity>) -> Parity {
        match last_choice {
            Some(last) => last.opposite(),
            None => {
                if self.rng.gen::<bool>() {
                    Parity::Even
                } else {
                    Parity::Odd
                }
            }
        }
    }

    fn name(&self) -> &'static str {
        "alternating"
    }
}

/// Follows whichever parity won more of the last ten games; falls back to
/// alternating when the recent record is balanced.
pub struct HistoryBased {
    fallback: Alternating,
}

impl HistoryBased {
    pub fn new() -> Self {
        Self {
            fallback: Alternating::new(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            fallback: Alternating::seeded(seed),
        }
    }
}

impl Default for HistoryBased {
    fn default() -> Self {
        Self::new()
    }
}

impl Strategy for HistoryBased {
    fn choose(&mut self, history: &[GameRecord], last_choice: Option<Parity>) -> Parity {
        let recent = &history[history.len().saturating_sub(10)..];
        let wins_with = |parity: Parity| {
            recent
                .iter()
                .filter(|record| {
                    record.outcome == GameOutcome::Win && record.my_choice == Some(parity)
                })
                .count()
        };

        let even_wins = wins_with(Parity::Even);
        let odd_wins = wins_with(Parity::Odd);
        if even_wins == odd_wins {
            self.fallback.choose(history, last_choice)
        } else if even_wins > odd_wins {
            Parity::Even
        } else {
            Parity::Odd
        }
    }

    fn name(&self) -> &'static str {
        "history"
    }
}
