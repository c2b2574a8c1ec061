#![allow(dead_code)]

use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    time::Duration,
};

use futures::future::BoxFuture;
use penalty_shootout_back::{
    dao::{
        gateway::{PersistenceGateway, RoundRecord},
        memory::InMemoryStore,
        models::{EndReason, MatchId, PlayerId, PlayerStatus},
        storage::{StorageError, StorageResult},
    },
    dto::ws::PlayerOutboundMessage,
    services::{
        coordinator::{MatchCoordinator, MatchSettings, MatchSnapshot, Participant},
        notifier::Notifier,
    },
    state::choice::Choice,
};
use rand::{SeedableRng, rngs::StdRng};
use uuid::Uuid;

/// Notifier that keeps every message for later inspection.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(PlayerId, PlayerOutboundMessage)>>,
    broadcasts: Mutex<Vec<PlayerOutboundMessage>>,
}

impl Notifier for RecordingNotifier {
    fn send(&self, player: PlayerId, message: PlayerOutboundMessage) {
        self.sent.lock().unwrap().push((player, message));
    }

    fn broadcast(&self, message: PlayerOutboundMessage) {
        self.broadcasts.lock().unwrap().push(message);
    }
}

impl RecordingNotifier {
    pub fn messages_for(&self, player: PlayerId) -> Vec<PlayerOutboundMessage> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(to, _)| *to == player)
            .map(|(_, message)| message.clone())
            .collect()
    }

    pub fn kinds_for(&self, player: PlayerId) -> Vec<&'static str> {
        self.messages_for(player)
            .iter()
            .map(PlayerOutboundMessage::kind)
            .collect()
    }

    pub fn count(&self, player: PlayerId, kind: &str) -> usize {
        self.kinds_for(player)
            .into_iter()
            .filter(|k| *k == kind)
            .count()
    }

    pub fn last(&self, player: PlayerId, kind: &str) -> Option<PlayerOutboundMessage> {
        self.messages_for(player)
            .into_iter()
            .rev()
            .find(|message| message.kind() == kind)
    }

    pub fn broadcasts(&self) -> Vec<PlayerOutboundMessage> {
        self.broadcasts.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
        self.broadcasts.lock().unwrap().clear();
    }
}

/// In-memory store whose individual operations can be switched to fail.
#[derive(Default)]
pub struct FlakyStore {
    pub inner: InMemoryStore,
    pub fail_rounds: AtomicBool,
    pub fail_create: AtomicBool,
    /// Milliseconds `create_match` waits before writing the record.
    pub create_delay_ms: AtomicU64,
}

impl FlakyStore {
    fn outage() -> StorageError {
        StorageError::unavailable(
            "store offline".into(),
            std::io::Error::other("connection refused"),
        )
    }
}

impl PersistenceGateway for FlakyStore {
    fn create_match(
        &self,
        player_a: PlayerId,
        player_b: PlayerId,
    ) -> BoxFuture<'static, StorageResult<MatchId>> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Box::pin(async { Err(Self::outage()) });
        }
        let delay = Duration::from_millis(self.create_delay_ms.load(Ordering::SeqCst));
        let created = self.inner.create_match(player_a, player_b);
        Box::pin(async move {
            tokio::time::sleep(delay).await;
            created.await
        })
    }

    fn record_round(&self, record: RoundRecord) -> BoxFuture<'static, StorageResult<()>> {
        if self.fail_rounds.load(Ordering::SeqCst) {
            return Box::pin(async { Err(Self::outage()) });
        }
        self.inner.record_round(record)
    }

    fn record_match_result(
        &self,
        match_id: MatchId,
        winner: Option<PlayerId>,
        reason: EndReason,
    ) -> BoxFuture<'static, StorageResult<()>> {
        self.inner.record_match_result(match_id, winner, reason)
    }

    fn update_player_points(
        &self,
        player: PlayerId,
        delta: i64,
    ) -> BoxFuture<'static, StorageResult<()>> {
        self.inner.update_player_points(player, delta)
    }

    fn update_player_status(
        &self,
        player: PlayerId,
        status: PlayerStatus,
    ) -> BoxFuture<'static, StorageResult<()>> {
        self.inner.update_player_status(player, status)
    }
}

pub const GOAL_SHOT: &str = "Left-Low";
pub const MISSED_DIVE: &str = "Right-High";

pub fn choice(raw: &str) -> Choice {
    raw.parse().unwrap()
}

/// A started match between two fresh players.
pub struct Harness {
    pub coordinator: Arc<MatchCoordinator>,
    pub notifier: Arc<RecordingNotifier>,
    pub store: Arc<FlakyStore>,
    pub a: PlayerId,
    pub b: PlayerId,
    pub settings: MatchSettings,
}

impl Harness {
    pub async fn start() -> Self {
        Self::start_with(MatchSettings::default()).await
    }

    pub async fn start_with(settings: MatchSettings) -> Self {
        let notifier = Arc::new(RecordingNotifier::default());
        let store = Arc::new(FlakyStore::default());
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let coordinator = MatchCoordinator::create(
            Uuid::new_v4(),
            [
                Participant {
                    id: a,
                    name: "alice".into(),
                },
                Participant {
                    id: b,
                    name: "bob".into(),
                },
            ],
            settings,
            notifier.clone(),
            store.clone(),
            StdRng::seed_from_u64(42),
        )
        .await
        .unwrap();
        coordinator.start_match().await.unwrap();

        Self {
            coordinator,
            notifier,
            store,
            a,
            b,
            settings,
        }
    }

    /// Regulation of two rounds keeps end-of-match scenarios short.
    pub fn short_match() -> MatchSettings {
        MatchSettings {
            regulation_rounds: 2,
            ..MatchSettings::default()
        }
    }

    pub async fn snapshot(&self) -> MatchSnapshot {
        self.coordinator.snapshot().await
    }

    pub async fn shooter(&self) -> PlayerId {
        self.snapshot().await.shooter
    }

    pub async fn keeper(&self) -> PlayerId {
        self.snapshot().await.goalkeeper
    }

    pub fn other(&self, player: PlayerId) -> PlayerId {
        if player == self.a { self.b } else { self.a }
    }

    /// Play one round by hand; the shooter scores when `goal` is set.
    pub async fn play_round(&self, goal: bool) {
        let (shooter, keeper) = (self.shooter().await, self.keeper().await);
        self.coordinator
            .submit_shot(shooter, choice(GOAL_SHOT))
            .await
            .unwrap();
        let dive = if goal { MISSED_DIVE } else { GOAL_SHOT };
        self.coordinator
            .submit_save(keeper, choice(dive))
            .await
            .unwrap();
    }

    pub async fn wait(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
