use std::sync::Arc;

use dashmap::DashMap;
use futures::future::BoxFuture;
use indexmap::IndexMap;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::dao::{
    gateway::{PersistenceGateway, RoundRecord},
    models::{EndReason, MatchEntity, MatchId, PlayerEntity, PlayerId, PlayerStatus, RoundEntity},
    storage::{StorageError, StorageResult},
};

/// Process-local persistence backend. Matches keep their creation order.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    matches: Arc<RwLock<IndexMap<MatchId, MatchEntity>>>,
    rounds: Arc<RwLock<Vec<RoundEntity>>>,
    players: Arc<DashMap<PlayerId, PlayerEntity>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every match created so far, oldest first.
    pub async fn matches(&self) -> Vec<MatchEntity> {
        self.matches.read().await.values().cloned().collect()
    }

    pub async fn find_match(&self, id: MatchId) -> Option<MatchEntity> {
        self.matches.read().await.get(&id).cloned()
    }

    /// Round details recorded for `match_id`, in round order.
    pub async fn rounds(&self, match_id: MatchId) -> Vec<RoundEntity> {
        let mut rounds: Vec<RoundEntity> = self
            .rounds
            .read()
            .await
            .iter()
            .filter(|round| round.match_id == match_id)
            .cloned()
            .collect();
        rounds.sort_by_key(|round| round.round);
        rounds
    }

    pub fn player(&self, id: PlayerId) -> Option<PlayerEntity> {
        self.players.get(&id).map(|entry| entry.value().clone())
    }
}

impl PersistenceGateway for InMemoryStore {
    fn create_match(
        &self,
        player_a: PlayerId,
        player_b: PlayerId,
    ) -> BoxFuture<'static, StorageResult<MatchId>> {
        let matches = Arc::clone(&self.matches);
        Box::pin(async move {
            let id = Uuid::new_v4();
            let entity = MatchEntity {
                id,
                player_a,
                player_b,
                created_at: OffsetDateTime::now_utc(),
                winner: None,
                end_reason: None,
            };
            matches.write().await.insert(id, entity);
            debug!(match_id = %id, "match record created");
            Ok(id)
        })
    }

    fn record_round(&self, record: RoundRecord) -> BoxFuture<'static, StorageResult<()>> {
        let matches = Arc::clone(&self.matches);
        let rounds = Arc::clone(&self.rounds);
        Box::pin(async move {
            if !matches.read().await.contains_key(&record.match_id) {
                return Err(StorageError::MatchNotFound(record.match_id));
            }
            rounds.write().await.push(RoundEntity {
                match_id: record.match_id,
                round: record.round,
                shooter: record.shooter,
                goalkeeper: record.goalkeeper,
                shot: record.shot,
                save: record.save,
                outcome: record.outcome,
            });
            Ok(())
        })
    }

    fn record_match_result(
        &self,
        match_id: MatchId,
        winner: Option<PlayerId>,
        reason: EndReason,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let matches = Arc::clone(&self.matches);
        Box::pin(async move {
            let mut guard = matches.write().await;
            let entity = guard
                .get_mut(&match_id)
                .ok_or(StorageError::MatchNotFound(match_id))?;
            entity.winner = winner;
            entity.end_reason = Some(reason);
            Ok(())
        })
    }

    fn update_player_points(
        &self,
        player: PlayerId,
        delta: i64,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let players = Arc::clone(&self.players);
        Box::pin(async move {
            players
                .entry(player)
                .or_insert_with(|| PlayerEntity::new(player))
                .points += delta;
            Ok(())
        })
    }

    fn update_player_status(
        &self,
        player: PlayerId,
        status: PlayerStatus,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let players = Arc::clone(&self.players);
        Box::pin(async move {
            players
                .entry(player)
                .or_insert_with(|| PlayerEntity::new(player))
                .status = status;
            Ok(())
        })
    }
}
