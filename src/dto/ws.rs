use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::{
    dao::models::PlayerStatus,
    dto::validation::validate_player_name,
    state::roles::Role,
};

#[derive(Debug, Deserialize, Serialize, ToSchema, PartialEq)]
/// Messages accepted from player WebSocket clients.
#[serde(tag = "type")]
pub enum PlayerInboundMessage {
    #[serde(rename = "identification")]
    Identification(Identification),
    #[serde(rename = "shoot")]
    Shoot { choice: String },
    #[serde(rename = "goalkeeper", alias = "save")]
    Save { choice: String },
    #[serde(rename = "play_again_response")]
    PlayAgainResponse { accept: bool },
    #[serde(rename = "quit_game")]
    QuitGame,
    #[serde(rename = "chat")]
    Chat { message: String },
    /// The client-side countdown for `role` reached zero.
    #[serde(rename = "timeout")]
    Timeout { role: Role },
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Deserialize, Serialize, ToSchema, PartialEq)]
/// First frame a player must send after connecting.
pub struct Identification {
    pub id: Uuid,
    pub name: String,
}

impl Validate for Identification {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Err(e) = validate_player_name(&self.name) {
            errors.add("name", e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Error raised while decoding an inbound frame.
#[derive(Debug, thiserror::Error)]
pub enum InboundError {
    #[error("malformed message: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid message: {0}")]
    Validation(#[from] ValidationErrors),
}

impl PlayerInboundMessage {
    /// Parse a text frame and validate the identification payload when present.
    pub fn from_json_str(text: &str) -> Result<Self, InboundError> {
        let message: Self = serde_json::from_str(text)?;
        if let Self::Identification(identification) = &message {
            identification.validate()?;
        }
        Ok(message)
    }
}

/// Final result of a match from one participant's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MatchResultKind {
    Win,
    Lose,
    Draw,
}

#[derive(Debug, Clone, Serialize, ToSchema, PartialEq)]
/// Messages pushed to players. The `type` tag is the message kind.
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlayerOutboundMessage {
    /// Acknowledges the identification frame.
    Identified { id: Uuid, name: String },
    MatchStart {
        match_id: Uuid,
        role: Role,
        opponent: String,
        message: String,
    },
    /// Sent to the participant who must act now.
    YourTurn { role: Role, timeout_secs: u64 },
    /// Sent to the participant waiting on the other one.
    OpponentTurn { timeout_secs: u64 },
    /// Sent to the goalkeeper once the shot is in.
    GoalkeeperTurn { timeout_secs: u64 },
    #[serde(rename = "animate_shoot_vao")]
    AnimateGoal { shot: String, save: String, goal: bool },
    #[serde(rename = "animate_shoot_khong_vao")]
    AnimateSaved { shot: String, save: String, goal: bool },
    KickResult {
        round: u32,
        goal: bool,
        shot: String,
        save: String,
    },
    /// Scoreline from the recipient's point of view after `round`.
    UpdateScore {
        your_score: u32,
        opponent_score: u32,
        round: u32,
    },
    MatchResult {
        result: MatchResultKind,
        your_score: u32,
        opponent_score: u32,
    },
    MatchEnd { message: String },
    PlayAgainRequest { message: String },
    /// The recipient's turn timed out and `auto_choice` was picked for them.
    Timeout { auto_choice: String, message: String },
    /// The opponent's turn timed out and `auto_choice` was picked for them.
    OpponentTimeout { auto_choice: String, message: String },
    Error { message: String },
    StatusUpdate {
        player_id: Uuid,
        name: String,
        status: PlayerStatus,
    },
    Chat { from: String, message: String },
}

impl PlayerOutboundMessage {
    /// Wire name of the message kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Identified { .. } => "identified",
            Self::MatchStart { .. } => "match_start",
            Self::YourTurn { .. } => "your_turn",
            Self::OpponentTurn { .. } => "opponent_turn",
            Self::GoalkeeperTurn { .. } => "goalkeeper_turn",
            Self::AnimateGoal { .. } => "animate_shoot_vao",
            Self::AnimateSaved { .. } => "animate_shoot_khong_vao",
            Self::KickResult { .. } => "kick_result",
            Self::UpdateScore { .. } => "update_score",
            Self::MatchResult { .. } => "match_result",
            Self::MatchEnd { .. } => "match_end",
            Self::PlayAgainRequest { .. } => "play_again_request",
            Self::Timeout { .. } => "timeout",
            Self::OpponentTimeout { .. } => "opponent_timeout",
            Self::Error { .. } => "error",
            Self::StatusUpdate { .. } => "status_update",
            Self::Chat { .. } => "chat",
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}
