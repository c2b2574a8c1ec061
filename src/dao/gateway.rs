use futures::future::BoxFuture;

use crate::dao::{
    models::{EndReason, MatchId, PlayerId, PlayerStatus, RoundOutcomeEntity},
    storage::StorageResult,
};

/// Round detail handed to [`PersistenceGateway::record_round`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundRecord {
    pub match_id: MatchId,
    pub round: u32,
    pub shooter: PlayerId,
    pub goalkeeper: PlayerId,
    pub shot: String,
    pub save: String,
    pub outcome: RoundOutcomeEntity,
}

/// Abstraction over the persistence collaborator used by match coordinators.
///
/// Calls are fire-and-report: errors come back to the caller, retries (if any)
/// belong to the implementation.
pub trait PersistenceGateway: Send + Sync {
    fn create_match(
        &self,
        player_a: PlayerId,
        player_b: PlayerId,
    ) -> BoxFuture<'static, StorageResult<MatchId>>;
    fn record_round(&self, record: RoundRecord) -> BoxFuture<'static, StorageResult<()>>;
    fn record_match_result(
        &self,
        match_id: MatchId,
        winner: Option<PlayerId>,
        reason: EndReason,
    ) -> BoxFuture<'static, StorageResult<()>>;
    fn update_player_points(
        &self,
        player: PlayerId,
        delta: i64,
    ) -> BoxFuture<'static, StorageResult<()>>;
    fn update_player_status(
        &self,
        player: PlayerId,
        status: PlayerStatus,
    ) -> BoxFuture<'static, StorageResult<()>>;
}
