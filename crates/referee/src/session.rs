//! Referee-local execution state for one match.

use parity_messages::MatchAssignment;
use parity_types::{ConversationId, Endpoint, MatchId, Parity, PlayerId, RoundId};
use std::collections::{BTreeMap, HashMap};

/// Match state machine states. No back-transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameState {
    AwaitingParticipants,
    CollectingDecisions,
    ResolvingOutcome,
    Completed,
}

/// One participant's seat during execution.
#[derive(Debug, Clone)]
pub struct Seat {
    pub id: PlayerId,
    pub endpoint: Endpoint,
    pub joined: bool,
    pub choice: Option<Parity>,
}

impl Seat {
    fn new(id: PlayerId, endpoint: Endpoint) -> Self {
        Self {
            id,
            endpoint,
            joined: false,
            choice: None,
        }
    }
}

/// Ephemeral working copy of a match, alive only while the referee runs it
/// and discarded once the outcome is reported.
#[derive(Debug)]
pub struct GameSession {
    pub match_id: MatchId,
    pub league_id: String,
    pub round_id: RoundId,
    pub conversation_id: ConversationId,
    pub state: GameState,
    pub seat_a: Seat,
    pub seat_b: Seat,
    pub drawn_value: Option<u64>,
    pub winner: Option<PlayerId>,
    /// Decision attempts consumed per participant. Never reset mid-match:
    /// a later collector invocation for the same participant continues
    /// from the count left by the earlier one.
    retry_counts: HashMap<PlayerId, u32>,
}

impl GameSession {
    /// Open a session for an assigned match.
    pub fn from_assignment(assignment: &MatchAssignment) -> Self {
        Self {
            match_id: assignment.match_id.clone(),
            league_id: assignment.league_id.clone(),
            round_id: assignment.round_id,
            conversation_id: ConversationId::random(),
            state: GameState::AwaitingParticipants,
            seat_a: Seat::new(
                assignment.player_a_id.clone(),
                assignment.player_a_endpoint.clone(),
            ),
            seat_b: Seat::new(
                assignment.player_b_id.clone(),
                assignment.player_b_endpoint.clone(),
            ),
            drawn_value: None,
            winner: None,
            retry_counts: HashMap::new(),
        }
    }

    /// Decision attempts consumed so far by a participant.
    pub fn retries_used(&self, player: &PlayerId) -> u32 {
        self.retry_counts.get(player).copied().unwrap_or(0)
    }

    /// Record a participant's cumulative attempt count.
    pub fn set_retries_used(&mut self, player: &PlayerId, used: u32) {
        self.retry_counts.insert(player.clone(), used);
    }

    /// Both declarations keyed by player id (`None` = no decision).
    pub fn choices(&self) -> BTreeMap<PlayerId, Option<Parity>> {
        BTreeMap::from([
            (self.seat_a.id.clone(), self.seat_a.choice),
            (self.seat_b.id.clone(), self.seat_b.choice),
        ])
    }
}
