use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{
    dto::format_timestamp,
    services::coordinator::{MatchSnapshot, RematchVote},
    state::state_machine::MatchPhase,
};

/// Request payload used by the matchmaker to seat two connected players.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateMatchRequest {
    pub player_a: Uuid,
    pub player_b: Uuid,
}

impl Validate for CreateMatchRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.player_a == self.player_b {
            let mut err = ValidationError::new("distinct_players");
            err.message = Some("A player cannot be matched against themselves".into());
            errors.add("player_b", err);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// One seat of a match as exposed over REST.
#[derive(Debug, Serialize, ToSchema)]
pub struct ParticipantSummary {
    pub id: Uuid,
    pub name: String,
    pub score: u32,
    /// Whether the participant already answered the rematch prompt.
    pub voted: bool,
}

/// Read-only view of a live match.
#[derive(Debug, Serialize, ToSchema)]
pub struct MatchSummary {
    pub room_id: Uuid,
    /// Persisted record id; changes on rematch.
    pub match_id: Uuid,
    pub phase: MatchPhase,
    pub round: u32,
    pub players: Vec<ParticipantSummary>,
    pub shooter: Uuid,
    pub goalkeeper: Uuid,
    /// RFC 3339 timestamp of the current match record.
    pub created_at: String,
}

impl From<MatchSnapshot> for MatchSummary {
    fn from(snapshot: MatchSnapshot) -> Self {
        let players = snapshot
            .players
            .iter()
            .zip(snapshot.scores)
            .zip(snapshot.votes)
            .map(|((participant, score), vote)| ParticipantSummary {
                id: participant.id,
                name: participant.name.clone(),
                score,
                voted: vote != RematchVote::NotVoted,
            })
            .collect();

        Self {
            room_id: snapshot.room_id,
            match_id: snapshot.match_id,
            phase: snapshot.phase,
            round: snapshot.round,
            players,
            shooter: snapshot.shooter,
            goalkeeper: snapshot.goalkeeper,
            created_at: format_timestamp(snapshot.created_at),
        }
    }
}

/// Response listing every live match.
#[derive(Debug, Serialize, ToSchema)]
pub struct MatchListResponse {
    pub matches: Vec<MatchSummary>,
}
