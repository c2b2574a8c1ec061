//! Score, round counter and the end-of-match policy.

use crate::state::roles::Seat;

/// Regulation length used when nothing else is configured.
pub const DEFAULT_REGULATION_ROUNDS: u32 = 10;

/// What happens after a resolved round has been counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundProgress {
    Continue,
    MatchOver,
}

/// Per-seat scoreline plus the 1-based round counter.
///
/// Goals are credited to whichever seat held the shooter role when the round
/// was resolved, so each seat accumulates only the goals it scored itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundTracker {
    scores: [u32; 2],
    current_round: u32,
    regulation_rounds: u32,
}

impl RoundTracker {
    pub fn new(regulation_rounds: u32) -> Self {
        Self {
            scores: [0, 0],
            current_round: 1,
            regulation_rounds,
        }
    }

    pub fn current_round(&self) -> u32 {
        self.current_round
    }

    pub fn score(&self, seat: Seat) -> u32 {
        self.scores[seat.index()]
    }

    /// Credit the shooter of the round being resolved.
    pub fn apply_result(&mut self, shooter: Seat, goal: bool) {
        if goal {
            self.scores[shooter.index()] += 1;
        }
    }

    /// Count the resolved round and evaluate the end-of-match policy.
    pub fn advance_round(&mut self) -> RoundProgress {
        self.current_round += 1;
        if is_match_over(
            self.current_round,
            self.scores[0],
            self.scores[1],
            self.regulation_rounds,
        ) {
            RoundProgress::MatchOver
        } else {
            RoundProgress::Continue
        }
    }

    /// Seat with the higher score, if any.
    pub fn leader(&self) -> Option<Seat> {
        match self.scores[0].cmp(&self.scores[1]) {
            std::cmp::Ordering::Greater => Some(Seat::A),
            std::cmp::Ordering::Less => Some(Seat::B),
            std::cmp::Ordering::Equal => None,
        }
    }

    /// Back to 0-0 in round 1 for a fresh match.
    pub fn reset(&mut self) {
        self.scores = [0, 0];
        self.current_round = 1;
    }
}

/// End-of-match policy evaluated with the round counter already incremented.
///
/// `current_round == regulation + 1` means regulation just finished. Past that,
/// sudden-death shots are only checked once both seats have shot in the cycle,
/// i.e. after an even number of sudden-death rounds.
pub fn is_match_over(current_round: u32, score_a: u32, score_b: u32, regulation_rounds: u32) -> bool {
    if current_round <= regulation_rounds {
        return false;
    }
    let sudden_death_rounds = current_round - (regulation_rounds + 1);
    sudden_death_rounds % 2 == 0 && score_a != score_b
}
