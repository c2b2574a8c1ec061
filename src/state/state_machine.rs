use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

/// Phases a single match moves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MatchPhase {
    /// Roles are assigned but the first turn has not been requested yet.
    Pending,
    /// Waiting for the current shooter to pick a target.
    AwaitingShot,
    /// Shot recorded; waiting for the goalkeeper to pick a dive.
    AwaitingSave,
    /// Both choices are in and the round is being applied.
    Resolving,
    /// The end-of-match policy fired; the rematch prompt is pending.
    MatchOver,
    /// Both participants have been asked whether they want a rematch.
    AwaitingRematchVotes,
    /// The session is finished and the match has been released.
    Terminated,
}

impl MatchPhase {
    /// True once the scoreline is final (normal end, before any rematch starts).
    pub fn is_concluded(self) -> bool {
        matches!(
            self,
            MatchPhase::MatchOver | MatchPhase::AwaitingRematchVotes | MatchPhase::Terminated
        )
    }
}

/// Events that can be applied to the match state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchEvent {
    /// Roles announced, first shot requested.
    StartMatch,
    /// The shooter's choice has been recorded (manually or by timeout).
    ShotRecorded,
    /// The goalkeeper's choice has been recorded (manually or by timeout).
    SaveRecorded,
    /// Round applied and the match continues.
    NextTurn,
    /// Round applied and the end-of-match policy fired.
    MatchDecided,
    /// The delayed rematch prompt has been sent.
    RematchPrompted,
    /// Both participants voted for a rematch.
    Rematch,
    /// Session ends: rematch declined, quit or disconnect.
    Terminate,
}

/// Error returned when attempting to apply an invalid transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// The phase the state machine was in when the invalid event was received.
    pub from: MatchPhase,
    /// The event that cannot be applied from this phase.
    pub event: MatchEvent,
}

/// State machine implementing the turn flow of a single match.
#[derive(Debug, Clone)]
pub struct MatchStateMachine {
    phase: MatchPhase,
}

impl Default for MatchStateMachine {
    fn default() -> Self {
        Self {
            phase: MatchPhase::Pending,
        }
    }
}

impl MatchStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> MatchPhase {
        self.phase
    }

    /// Apply an event, returning the new phase.
    pub fn apply(&mut self, event: MatchEvent) -> Result<MatchPhase, InvalidTransition> {
        let next = self.compute_transition(event)?;
        self.phase = next;
        Ok(next)
    }

    fn compute_transition(&self, event: MatchEvent) -> Result<MatchPhase, InvalidTransition> {
        let next = match (self.phase, event) {
            (MatchPhase::Pending, MatchEvent::StartMatch) => MatchPhase::AwaitingShot,
            (MatchPhase::AwaitingShot, MatchEvent::ShotRecorded) => MatchPhase::AwaitingSave,
            (MatchPhase::AwaitingSave, MatchEvent::SaveRecorded) => MatchPhase::Resolving,
            (MatchPhase::Resolving, MatchEvent::NextTurn) => MatchPhase::AwaitingShot,
            (MatchPhase::Resolving, MatchEvent::MatchDecided) => MatchPhase::MatchOver,
            (MatchPhase::MatchOver, MatchEvent::RematchPrompted) => {
                MatchPhase::AwaitingRematchVotes
            }
            (MatchPhase::MatchOver | MatchPhase::AwaitingRematchVotes, MatchEvent::Rematch) => {
                MatchPhase::Pending
            }
            (from, MatchEvent::Terminate) if from != MatchPhase::Terminated => {
                MatchPhase::Terminated
            }
            (from, event) => return Err(InvalidTransition { from, event }),
        };

        Ok(next)
    }
}
