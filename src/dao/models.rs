use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utoipa::ToSchema;
use uuid::Uuid;

/// Stable identity of a player.
pub type PlayerId = Uuid;
/// Identifier of a persisted match record. A rematch gets a fresh one.
pub type MatchId = Uuid;

/// Externally visible presence of a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PlayerStatus {
    Online,
    Ingame,
    Offline,
}

impl fmt::Display for PlayerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PlayerStatus::Online => "online",
            PlayerStatus::Ingame => "ingame",
            PlayerStatus::Offline => "offline",
        })
    }
}

/// Why a match record was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// Regulation or sudden death produced a winner.
    Normal,
    /// A participant left the match on purpose.
    PlayerQuit,
    /// A participant's connection dropped.
    Disconnect,
}

impl EndReason {
    pub fn code(self) -> &'static str {
        match self {
            EndReason::Normal => "normal",
            EndReason::PlayerQuit => "player_quit",
            EndReason::Disconnect => "disconnect",
        }
    }
}

/// Persisted result of a single round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundOutcomeEntity {
    Goal,
    Saved,
}

/// Match row created when two players are paired (or agree to a rematch).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchEntity {
    pub id: MatchId,
    pub player_a: PlayerId,
    pub player_b: PlayerId,
    pub created_at: OffsetDateTime,
    /// `None` until the match is closed, and for draws.
    pub winner: Option<PlayerId>,
    pub end_reason: Option<EndReason>,
}

/// Detail row for one resolved round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundEntity {
    pub match_id: MatchId,
    pub round: u32,
    pub shooter: PlayerId,
    pub goalkeeper: PlayerId,
    /// Shot choice in `Direction-Height` form.
    pub shot: String,
    /// Save choice in `Direction-Height` form.
    pub save: String,
    pub outcome: RoundOutcomeEntity,
}

/// Ranking points and presence for a player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerEntity {
    pub id: PlayerId,
    pub points: i64,
    pub status: PlayerStatus,
}

impl PlayerEntity {
    pub fn new(id: PlayerId) -> Self {
        Self {
            id,
            points: 0,
            status: PlayerStatus::Offline,
        }
    }
}
