//! Outcome resolution: a pure function of the drawn value and the two
//! declarations.

use parity_types::Parity;
use rand::Rng;

/// Points awarded for a decisive win.
pub const WIN_POINTS: u32 = 3;

/// Points awarded to each participant on a draw.
pub const DRAW_POINTS: u32 = 1;

/// A participant's seat in the match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    A,
    B,
}

impl Side {
    pub fn other(self) -> Self {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }
}

/// Draw the random value in [1, 100] the outcome is resolved against.
///
/// The only stochastic element of the whole match.
pub fn draw_value(rng: &mut impl Rng) -> u64 {
    rng.gen_range(1..=100)
}

/// Decide the winner given the drawn value and both declarations.
///
/// The win goes to the side whose declared parity matches the drawn parity
/// iff the other side's does not. Two equal declarations are a draw no
/// matter what was drawn.
pub fn winning_side(drawn_value: u64, choice_a: Parity, choice_b: Parity) -> Option<Side> {
    let drawn = Parity::of(drawn_value);
    match (choice_a == drawn, choice_b == drawn) {
        (true, false) => Some(Side::A),
        (false, true) => Some(Side::B),
        // Both matched or neither matched: the declarations were equal.
        _ => None,
    }
}

/// Per-side points for a resolved outcome: 3/0 decisive, 1/1 draw.
pub fn score_for(winner: Option<Side>) -> (u32, u32) {
    match winner {
        Some(Side::A) => (WIN_POINTS, 0),
        Some(Side::B) => (0, WIN_POINTS),
        None => (DRAW_POINTS, DRAW_POINTS),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_even_beats_odd_on_even_draw() {
        assert_eq!(
            winning_side(42, Parity::Even, Parity::Odd),
            Some(Side::A)
        );
        assert_eq!(winning_side(42, Parity::Odd, Parity::Even), Some(Side::B));
    }

    #[test]
    fn test_same_declarations_draw_even_when_both_wrong() {
        // Drawn 7 is odd; both declared even: neither matches, draw.
        assert_eq!(winning_side(7, Parity::Even, Parity::Even), None);
    }

    #[test]
    fn test_same_declarations_draw_even_when_both_right() {
        // Drawn 3 is odd; both declared odd: both match, still a draw.
        assert_eq!(winning_side(3, Parity::Odd, Parity::Odd), None);
    }

    #[test]
    fn test_resolution_is_deterministic() {
        for drawn in 1..=100 {
            let first = winning_side(drawn, Parity::Even, Parity::Odd);
            let second = winning_side(drawn, Parity::Even, Parity::Odd);
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_score_mapping() {
        assert_eq!(score_for(Some(Side::A)), (3, 0));
        assert_eq!(score_for(Some(Side::B)), (0, 3));
        assert_eq!(score_for(None), (1, 1));
    }

    #[test]
    fn test_draw_value_range() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..1000 {
            let value = draw_value(&mut rng);
            assert!((1..=100).contains(&value));
        }
    }
}
