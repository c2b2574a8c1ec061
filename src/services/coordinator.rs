//! Per-match turn coordinator: roles, turn deadlines, round resolution,
//! rematch negotiation and forfeits for exactly two participants.
//!
//! Every mutating operation takes the match's single lock, so player actions
//! arriving from two sockets and timer callbacks are applied one at a time.
//! Timer callbacks carry the turn they were armed for and re-check it under
//! the lock before doing anything.

use std::{sync::Arc, time::Duration};

use futures::future::BoxFuture;
use rand::rngs::StdRng;
use thiserror::Error;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    dao::{
        gateway::{PersistenceGateway, RoundRecord},
        models::{EndReason, MatchId, PlayerId, PlayerStatus, RoundOutcomeEntity},
        storage::StorageError,
    },
    dto::ws::{MatchResultKind, PlayerOutboundMessage},
    services::notifier::Notifier,
    state::{
        choice::{Choice, ChoiceParseError},
        outcome,
        roles::{Role, RoleTable, Seat},
        round_tracker::{DEFAULT_REGULATION_ROUNDS, RoundProgress, RoundTracker},
        state_machine::{InvalidTransition, MatchEvent, MatchPhase, MatchStateMachine},
        timeout::{TimeoutScheduler, TurnTimers},
    },
};

/// Identifier of a live match room. Stable across rematches, unlike [`MatchId`].
pub type RoomId = Uuid;

/// Tunables applied uniformly to every turn of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchSettings {
    pub turn_timeout: Duration,
    pub regulation_rounds: u32,
    pub rematch_prompt_delay: Duration,
    pub winner_points: i64,
}

impl Default for MatchSettings {
    fn default() -> Self {
        Self {
            turn_timeout: Duration::from_secs(15),
            regulation_rounds: DEFAULT_REGULATION_ROUNDS,
            rematch_prompt_delay: Duration::from_secs(3),
            winner_points: 3,
        }
    }
}

/// One of the two players seated in a match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub id: PlayerId,
    pub name: String,
}

/// Post-match answer of one participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RematchVote {
    #[default]
    NotVoted,
    Yes,
    No,
}

/// Reasons an action is refused or only partially applied.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("player `{0}` is not part of this match")]
    NotParticipant(PlayerId),
    #[error("not your turn: waiting for the {expected:?}")]
    WrongTurn { expected: Role },
    #[error("action not allowed while the match is {phase:?}")]
    OutOfPhase { phase: MatchPhase },
    #[error("the shot has not been taken yet")]
    ShotNotRecorded,
    #[error("rematch vote already recorded")]
    AlreadyVoted,
    #[error(transparent)]
    InvalidChoice(#[from] ChoiceParseError),
    #[error(transparent)]
    Transition(#[from] InvalidTransition),
    /// The state change was applied and players were notified, but storing it failed.
    #[error("persistence failed: {0}")]
    Persistence(#[from] StorageError),
}

/// Read-only view of a match.
#[derive(Debug, Clone)]
pub struct MatchSnapshot {
    pub room_id: RoomId,
    pub match_id: MatchId,
    pub created_at: OffsetDateTime,
    pub phase: MatchPhase,
    pub round: u32,
    pub players: [Participant; 2],
    pub scores: [u32; 2],
    pub shooter: PlayerId,
    pub goalkeeper: PlayerId,
    pub shot: Option<Choice>,
    pub save: Option<Choice>,
    pub votes: [RematchVote; 2],
}

impl MatchSnapshot {
    pub fn score_of(&self, player: PlayerId) -> Option<u32> {
        self.players
            .iter()
            .position(|participant| participant.id == player)
            .map(|index| self.scores[index])
    }
}

/// The turn a deadline was armed for; a deadline firing for any other turn is stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TurnKey {
    epoch: u64,
    round: u32,
}

struct MatchInner {
    match_id: MatchId,
    created_at: OffsetDateTime,
    machine: MatchStateMachine,
    roles: RoleTable,
    tracker: RoundTracker,
    shot: Option<Choice>,
    save: Option<Choice>,
    votes: [RematchVote; 2],
    /// Bumped on every rematch so deadlines from a previous match go stale.
    epoch: u64,
    timers: TurnTimers,
    rng: StdRng,
}

impl MatchInner {
    fn turn_key(&self) -> TurnKey {
        TurnKey {
            epoch: self.epoch,
            round: self.tracker.current_round(),
        }
    }
}

/// Keep the first storage failure, keep going on later ones.
fn merge_failure(slot: &mut Result<(), StorageError>, next: Result<(), StorageError>) {
    if slot.is_ok() {
        *slot = next;
    }
}

/// Coordinates a single match between two participants.
pub struct MatchCoordinator {
    room_id: RoomId,
    players: [Participant; 2],
    settings: MatchSettings,
    notifier: Arc<dyn Notifier>,
    store: Arc<dyn PersistenceGateway>,
    scheduler: TimeoutScheduler,
    inner: Mutex<MatchInner>,
}

impl MatchCoordinator {
    /// Persist a new match record and assign opening roles at random.
    pub async fn create(
        room_id: RoomId,
        players: [Participant; 2],
        settings: MatchSettings,
        notifier: Arc<dyn Notifier>,
        store: Arc<dyn PersistenceGateway>,
        mut rng: StdRng,
    ) -> Result<Arc<Self>, StorageError> {
        let match_id = store.create_match(players[0].id, players[1].id).await?;
        let roles = RoleTable::random(&mut rng);
        info!(
            room_id = %room_id,
            match_id = %match_id,
            shooter = %players[roles.shooter().index()].id,
            "match created"
        );

        Ok(Arc::new(Self {
            room_id,
            players,
            settings,
            notifier,
            store,
            scheduler: TimeoutScheduler::new(),
            inner: Mutex::new(MatchInner {
                match_id,
                created_at: OffsetDateTime::now_utc(),
                machine: MatchStateMachine::new(),
                roles,
                tracker: RoundTracker::new(settings.regulation_rounds),
                shot: None,
                save: None,
                votes: [RematchVote::NotVoted; 2],
                epoch: 0,
                timers: TurnTimers::default(),
                rng,
            }),
        }))
    }

    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    pub fn players(&self) -> &[Participant; 2] {
        &self.players
    }

    pub async fn snapshot(&self) -> MatchSnapshot {
        let inner = self.inner.lock().await;
        MatchSnapshot {
            room_id: self.room_id,
            match_id: inner.match_id,
            created_at: inner.created_at,
            phase: inner.machine.phase(),
            round: inner.tracker.current_round(),
            players: self.players.clone(),
            scores: [
                inner.tracker.score(Seat::A),
                inner.tracker.score(Seat::B),
            ],
            shooter: self.participant(inner.roles.shooter()).id,
            goalkeeper: self.participant(inner.roles.goalkeeper()).id,
            shot: inner.shot,
            save: inner.save,
            votes: inner.votes,
        }
    }

    pub async fn is_terminated(&self) -> bool {
        self.inner.lock().await.machine.phase() == MatchPhase::Terminated
    }

    /// Announce roles to both participants and request the first shot.
    pub async fn start_match(self: &Arc<Self>) -> Result<(), ActionError> {
        let mut inner = self.inner.lock().await;
        self.start_locked(&mut inner).await
    }

    /// Record the shooter's choice and hand the turn to the goalkeeper.
    pub async fn submit_shot(
        self: &Arc<Self>,
        player: PlayerId,
        choice: Choice,
    ) -> Result<(), ActionError> {
        let mut inner = self.inner.lock().await;
        if let Err(err) = self.check_turn(&inner, player, Role::Shooter) {
            return Err(self.rejected(player, err));
        }
        let phase = inner.machine.phase();
        if phase != MatchPhase::AwaitingShot {
            return Err(self.rejected(player, ActionError::OutOfPhase { phase }));
        }
        self.record_shot(&mut inner, choice)
    }

    /// Record the goalkeeper's choice and resolve the round.
    pub async fn submit_save(
        self: &Arc<Self>,
        player: PlayerId,
        choice: Choice,
    ) -> Result<(), ActionError> {
        let mut inner = self.inner.lock().await;
        if let Err(err) = self.check_turn(&inner, player, Role::Goalkeeper) {
            return Err(self.rejected(player, err));
        }
        match inner.machine.phase() {
            MatchPhase::AwaitingSave => {}
            MatchPhase::AwaitingShot => {
                return Err(self.rejected(player, ActionError::ShotNotRecorded));
            }
            phase => return Err(self.rejected(player, ActionError::OutOfPhase { phase })),
        }
        self.resolve_round(&mut inner, choice).await
    }

    /// A client reported its countdown for `role` reached zero. Behaves like the
    /// server-side deadline and is ignored once the turn has moved on.
    pub async fn report_timeout(
        self: &Arc<Self>,
        player: PlayerId,
        role: Role,
    ) -> Result<(), ActionError> {
        let mut inner = self.inner.lock().await;
        if let Err(err) = self.check_turn(&inner, player, role) {
            return Err(self.rejected(player, err));
        }
        match (role, inner.machine.phase()) {
            (Role::Shooter, MatchPhase::AwaitingShot) => self.expire_shot_turn(&mut inner),
            (Role::Goalkeeper, MatchPhase::AwaitingSave) => self.expire_save_turn(&mut inner).await,
            (_, phase) => {
                debug!(room_id = %self.room_id, player_id = %player, ?phase, "late timeout report ignored");
                Ok(())
            }
        }
    }

    /// Record a post-match vote; acts once both participants have answered.
    pub async fn submit_rematch_vote(
        self: &Arc<Self>,
        player: PlayerId,
        wants_rematch: bool,
    ) -> Result<(), ActionError> {
        let mut inner = self.inner.lock().await;
        let Some(seat) = self.seat_of(player) else {
            return Err(self.rejected(player, ActionError::NotParticipant(player)));
        };
        let phase = inner.machine.phase();
        if !matches!(
            phase,
            MatchPhase::MatchOver | MatchPhase::AwaitingRematchVotes
        ) {
            return Err(self.rejected(player, ActionError::OutOfPhase { phase }));
        }
        if inner.votes[seat.index()] != RematchVote::NotVoted {
            return Err(self.rejected(player, ActionError::AlreadyVoted));
        }

        inner.votes[seat.index()] = if wants_rematch {
            RematchVote::Yes
        } else {
            RematchVote::No
        };
        info!(
            room_id = %self.room_id,
            player_id = %player,
            wants_rematch,
            "rematch vote recorded"
        );

        if inner.votes.contains(&RematchVote::NotVoted) {
            return Ok(());
        }
        if inner.votes == [RematchVote::Yes, RematchVote::Yes] {
            self.rematch(&mut inner).await
        } else {
            self.end_session(&mut inner).await
        }
    }

    /// The participant's connection dropped: the other one wins immediately.
    pub async fn handle_disconnect(&self, player: PlayerId) -> Result<(), ActionError> {
        self.abandon(player, EndReason::Disconnect).await
    }

    /// The participant left on purpose: the other one wins immediately.
    pub async fn handle_player_quit(&self, player: PlayerId) -> Result<(), ActionError> {
        self.abandon(player, EndReason::PlayerQuit).await
    }

    /// Forward a chat line to both participants.
    pub fn relay_chat(&self, player: PlayerId, message: &str) -> Result<(), ActionError> {
        let Some(seat) = self.seat_of(player) else {
            return Err(self.rejected(player, ActionError::NotParticipant(player)));
        };
        let message = message.trim();
        if message.is_empty() {
            return Ok(());
        }
        self.send_both(PlayerOutboundMessage::Chat {
            from: self.participant(seat).name.clone(),
            message: message.to_string(),
        });
        Ok(())
    }

    async fn start_locked(self: &Arc<Self>, inner: &mut MatchInner) -> Result<(), ActionError> {
        inner.machine.apply(MatchEvent::StartMatch)?;
        info!(
            room_id = %self.room_id,
            match_id = %inner.match_id,
            shooter = %self.participant(inner.roles.shooter()).id,
            "match started"
        );

        for seat in Seat::BOTH {
            let role = inner.roles.role_of(seat);
            let message = match role {
                Role::Shooter => "Match started! You are the shooter.",
                Role::Goalkeeper => "Match started! You are the goalkeeper.",
            };
            self.send(
                seat,
                PlayerOutboundMessage::MatchStart {
                    match_id: inner.match_id,
                    role,
                    opponent: self.participant(seat.other()).name.clone(),
                    message: message.into(),
                },
            );
        }
        self.begin_shot_turn(inner);

        let mut stored = Ok(());
        for seat in Seat::BOTH {
            merge_failure(&mut stored, self.set_status(seat, PlayerStatus::Ingame).await);
        }
        stored.map_err(Into::into)
    }

    fn begin_shot_turn(self: &Arc<Self>, inner: &mut MatchInner) {
        inner.shot = None;
        inner.save = None;

        let timeout_secs = self.settings.turn_timeout.as_secs();
        let shooter = inner.roles.shooter();
        self.send(
            shooter,
            PlayerOutboundMessage::YourTurn {
                role: Role::Shooter,
                timeout_secs,
            },
        );
        self.send(
            shooter.other(),
            PlayerOutboundMessage::OpponentTurn { timeout_secs },
        );

        let deadline = Arc::clone(self).shot_deadline(inner.turn_key());
        let handle = self.scheduler.schedule(self.settings.turn_timeout, deadline);
        inner.timers.arm(Role::Shooter, handle);
    }

    fn record_shot(self: &Arc<Self>, inner: &mut MatchInner, choice: Choice) -> Result<(), ActionError> {
        inner.machine.apply(MatchEvent::ShotRecorded)?;
        inner.shot = Some(choice);
        inner.timers.disarm(Role::Shooter);
        debug!(
            room_id = %self.room_id,
            round = inner.tracker.current_round(),
            shot = %choice,
            "shot recorded"
        );

        let timeout_secs = self.settings.turn_timeout.as_secs();
        let keeper = inner.roles.goalkeeper();
        self.send(keeper, PlayerOutboundMessage::GoalkeeperTurn { timeout_secs });
        self.send(
            keeper.other(),
            PlayerOutboundMessage::OpponentTurn { timeout_secs },
        );

        let deadline = Arc::clone(self).save_deadline(inner.turn_key());
        let handle = self.scheduler.schedule(self.settings.turn_timeout, deadline);
        inner.timers.arm(Role::Goalkeeper, handle);
        Ok(())
    }

    async fn resolve_round(
        self: &Arc<Self>,
        inner: &mut MatchInner,
        save: Choice,
    ) -> Result<(), ActionError> {
        let shot = inner.shot.ok_or(ActionError::ShotNotRecorded)?;
        inner.machine.apply(MatchEvent::SaveRecorded)?;
        inner.save = Some(save);
        inner.timers.disarm(Role::Goalkeeper);

        let result = outcome::resolve(shot, save, &mut inner.rng);
        let goal = result.is_goal();
        let shooter = inner.roles.shooter();
        let keeper = inner.roles.goalkeeper();
        let round = inner.tracker.current_round();
        inner.tracker.apply_result(shooter, goal);
        info!(
            room_id = %self.room_id,
            match_id = %inner.match_id,
            round,
            shot = %shot,
            save = %save,
            outcome = ?result,
            "round resolved"
        );

        let (shot_label, save_label) = (shot.to_string(), save.to_string());
        self.send_both(if goal {
            PlayerOutboundMessage::AnimateGoal {
                shot: shot_label.clone(),
                save: save_label.clone(),
                goal,
            }
        } else {
            PlayerOutboundMessage::AnimateSaved {
                shot: shot_label.clone(),
                save: save_label.clone(),
                goal,
            }
        });
        self.send_both(PlayerOutboundMessage::KickResult {
            round,
            goal,
            shot: shot_label.clone(),
            save: save_label.clone(),
        });
        for seat in Seat::BOTH {
            self.send(
                seat,
                PlayerOutboundMessage::UpdateScore {
                    your_score: inner.tracker.score(seat),
                    opponent_score: inner.tracker.score(seat.other()),
                    round,
                },
            );
        }

        let mut stored = self
            .store
            .record_round(RoundRecord {
                match_id: inner.match_id,
                round,
                shooter: self.participant(shooter).id,
                goalkeeper: self.participant(keeper).id,
                shot: shot_label,
                save: save_label,
                outcome: if goal {
                    RoundOutcomeEntity::Goal
                } else {
                    RoundOutcomeEntity::Saved
                },
            })
            .await;
        if let Err(err) = &stored {
            warn!(room_id = %self.room_id, round, error = %err, "failed to record round");
        }

        let progress = inner.tracker.advance_round();
        inner.roles.swap();

        match progress {
            RoundProgress::Continue => {
                inner.machine.apply(MatchEvent::NextTurn)?;
                self.begin_shot_turn(inner);
            }
            RoundProgress::MatchOver => {
                inner.machine.apply(MatchEvent::MatchDecided)?;
                merge_failure(&mut stored, self.conclude_match(inner).await);
            }
        }
        stored.map_err(Into::into)
    }

    async fn conclude_match(self: &Arc<Self>, inner: &mut MatchInner) -> Result<(), StorageError> {
        let winner = inner.tracker.leader();
        info!(
            room_id = %self.room_id,
            match_id = %inner.match_id,
            score_a = inner.tracker.score(Seat::A),
            score_b = inner.tracker.score(Seat::B),
            winner = ?winner.map(|seat| self.participant(seat).id),
            "match decided"
        );

        for seat in Seat::BOTH {
            let result = match winner {
                Some(leader) if leader == seat => MatchResultKind::Win,
                Some(_) => MatchResultKind::Lose,
                None => MatchResultKind::Draw,
            };
            self.send(
                seat,
                PlayerOutboundMessage::MatchResult {
                    result,
                    your_score: inner.tracker.score(seat),
                    opponent_score: inner.tracker.score(seat.other()),
                },
            );
        }

        let prompt = Arc::clone(self).rematch_prompt(inner.epoch);
        let handle = self
            .scheduler
            .schedule(self.settings.rematch_prompt_delay, prompt);
        inner.timers.arm_rematch_prompt(handle);

        let winner_id = winner.map(|seat| self.participant(seat).id);
        let mut stored = Ok(());
        if let Some(id) = winner_id {
            merge_failure(
                &mut stored,
                self.store
                    .update_player_points(id, self.settings.winner_points)
                    .await,
            );
        }
        merge_failure(
            &mut stored,
            self.store
                .record_match_result(inner.match_id, winner_id, EndReason::Normal)
                .await,
        );
        if let Err(err) = &stored {
            warn!(room_id = %self.room_id, error = %err, "failed to record match result");
        }
        stored
    }

    /// Both participants agreed: fresh record, 0-0, roles swapped again.
    async fn rematch(self: &Arc<Self>, inner: &mut MatchInner) -> Result<(), ActionError> {
        inner.timers.disarm_all();
        let match_id = match self
            .store
            .create_match(self.players[0].id, self.players[1].id)
            .await
        {
            Ok(id) => id,
            Err(err) => {
                warn!(room_id = %self.room_id, error = %err, "failed to create rematch record; ending session");
                self.send_both(PlayerOutboundMessage::error("Could not start a rematch."));
                // The storage error is what the caller needs to see.
                let _ = self.end_session(inner).await;
                return Err(err.into());
            }
        };

        inner.match_id = match_id;
        inner.created_at = OffsetDateTime::now_utc();
        inner.tracker.reset();
        inner.votes = [RematchVote::NotVoted; 2];
        inner.epoch += 1;
        inner.roles.swap();
        inner.shot = None;
        inner.save = None;
        inner.machine.apply(MatchEvent::Rematch)?;
        info!(room_id = %self.room_id, match_id = %match_id, "rematch accepted");

        self.start_locked(inner).await
    }

    /// Rematch declined: both players go back to the lobby.
    async fn end_session(&self, inner: &mut MatchInner) -> Result<(), ActionError> {
        inner.timers.disarm_all();
        inner.votes = [RematchVote::NotVoted; 2];
        inner.machine.apply(MatchEvent::Terminate)?;
        info!(room_id = %self.room_id, match_id = %inner.match_id, "session terminated");

        self.send_both(PlayerOutboundMessage::MatchEnd {
            message: "The match is over.".into(),
        });

        let mut stored = Ok(());
        for seat in Seat::BOTH {
            merge_failure(&mut stored, self.set_status(seat, PlayerStatus::Online).await);
        }
        stored.map_err(Into::into)
    }

    async fn abandon(&self, player: PlayerId, reason: EndReason) -> Result<(), ActionError> {
        let mut inner = self.inner.lock().await;
        let Some(leaver) = self.seat_of(player) else {
            return Err(ActionError::NotParticipant(player));
        };
        let phase = inner.machine.phase();
        if phase == MatchPhase::Terminated {
            debug!(room_id = %self.room_id, player_id = %player, "match already terminated");
            return Ok(());
        }

        inner.timers.disarm_all();
        inner.votes = [RematchVote::NotVoted; 2];
        inner.machine.apply(MatchEvent::Terminate)?;

        let remaining = leaver.other();
        let forfeit = !phase.is_concluded();
        info!(
            room_id = %self.room_id,
            match_id = %inner.match_id,
            player_id = %player,
            reason = reason.code(),
            forfeit,
            "participant left the match"
        );

        let (to_remaining, to_leaver) = if forfeit {
            (
                "Your opponent left. You win the match!",
                "You left the match. You lose the match!",
            )
        } else {
            ("Your opponent left.", "You left the match.")
        };
        self.send(
            remaining,
            PlayerOutboundMessage::MatchEnd {
                message: to_remaining.into(),
            },
        );
        self.send(
            leaver,
            PlayerOutboundMessage::MatchEnd {
                message: to_leaver.into(),
            },
        );

        let mut stored = Ok(());
        if forfeit {
            let winner = self.participant(remaining).id;
            merge_failure(
                &mut stored,
                self.store
                    .update_player_points(winner, self.settings.winner_points)
                    .await,
            );
            merge_failure(
                &mut stored,
                self.store
                    .record_match_result(inner.match_id, Some(winner), reason)
                    .await,
            );
        }

        let leaver_status = match reason {
            EndReason::Disconnect => PlayerStatus::Offline,
            EndReason::PlayerQuit | EndReason::Normal => PlayerStatus::Online,
        };
        merge_failure(&mut stored, self.set_status(remaining, PlayerStatus::Online).await);
        merge_failure(&mut stored, self.set_status(leaver, leaver_status).await);
        if let Err(err) = &stored {
            warn!(room_id = %self.room_id, error = %err, "failed to persist forfeit");
        }
        stored.map_err(Into::into)
    }

    fn shot_deadline(self: Arc<Self>, key: TurnKey) -> BoxFuture<'static, ()> {
        Box::pin(async move {
            if let Err(err) = self.on_shot_timeout(key).await {
                warn!(room_id = %self.room_id, error = %err, "shot timeout handling failed");
            }
        })
    }

    fn save_deadline(self: Arc<Self>, key: TurnKey) -> BoxFuture<'static, ()> {
        Box::pin(async move {
            if let Err(err) = self.on_save_timeout(key).await {
                warn!(room_id = %self.room_id, error = %err, "save timeout handling failed");
            }
        })
    }

    fn rematch_prompt(self: Arc<Self>, epoch: u64) -> BoxFuture<'static, ()> {
        Box::pin(async move {
            let mut inner = self.inner.lock().await;
            if inner.epoch != epoch || inner.machine.phase() != MatchPhase::MatchOver {
                debug!(room_id = %self.room_id, "stale rematch prompt suppressed");
                return;
            }
            if let Err(err) = inner.machine.apply(MatchEvent::RematchPrompted) {
                warn!(room_id = %self.room_id, error = %err, "failed to prompt for rematch");
                return;
            }
            self.send_both(PlayerOutboundMessage::PlayAgainRequest {
                message: "Do you want to play again?".into(),
            });
        })
    }

    async fn on_shot_timeout(self: &Arc<Self>, key: TurnKey) -> Result<(), ActionError> {
        let mut inner = self.inner.lock().await;
        if inner.turn_key() != key
            || inner.machine.phase() != MatchPhase::AwaitingShot
            || inner.shot.is_some()
        {
            debug!(room_id = %self.room_id, round = key.round, "stale shot timeout suppressed");
            return Ok(());
        }
        self.expire_shot_turn(&mut inner)
    }

    async fn on_save_timeout(self: &Arc<Self>, key: TurnKey) -> Result<(), ActionError> {
        let mut inner = self.inner.lock().await;
        if inner.turn_key() != key
            || inner.machine.phase() != MatchPhase::AwaitingSave
            || inner.save.is_some()
        {
            debug!(room_id = %self.room_id, round = key.round, "stale save timeout suppressed");
            return Ok(());
        }
        self.expire_save_turn(&mut inner).await
    }

    fn expire_shot_turn(self: &Arc<Self>, inner: &mut MatchInner) -> Result<(), ActionError> {
        let shooter = inner.roles.shooter();
        info!(
            room_id = %self.room_id,
            round = inner.tracker.current_round(),
            player_id = %self.participant(shooter).id,
            "shot turn timed out"
        );
        self.announce_auto_pick(shooter);
        self.record_shot(inner, Choice::AUTO)
    }

    async fn expire_save_turn(self: &Arc<Self>, inner: &mut MatchInner) -> Result<(), ActionError> {
        let keeper = inner.roles.goalkeeper();
        info!(
            room_id = %self.room_id,
            round = inner.tracker.current_round(),
            player_id = %self.participant(keeper).id,
            "save turn timed out"
        );
        self.announce_auto_pick(keeper);
        self.resolve_round(inner, Choice::AUTO).await
    }

    fn announce_auto_pick(&self, seat: Seat) {
        let auto_choice = Choice::AUTO.to_string();
        self.send(
            seat,
            PlayerOutboundMessage::Timeout {
                auto_choice: auto_choice.clone(),
                message: format!("Time's up! '{auto_choice}' was picked for you."),
            },
        );
        self.send(
            seat.other(),
            PlayerOutboundMessage::OpponentTimeout {
                auto_choice: auto_choice.clone(),
                message: format!("Time's up! '{auto_choice}' was picked for your opponent."),
            },
        );
    }

    fn check_turn(&self, inner: &MatchInner, player: PlayerId, role: Role) -> Result<Seat, ActionError> {
        let seat = self
            .seat_of(player)
            .ok_or(ActionError::NotParticipant(player))?;
        if inner.roles.holder(role) != seat {
            return Err(ActionError::WrongTurn { expected: role });
        }
        Ok(seat)
    }

    /// Report a refused action to its sender (and to the opponent for ordering errors).
    fn rejected(&self, player: PlayerId, err: ActionError) -> ActionError {
        debug!(room_id = %self.room_id, player_id = %player, error = %err, "action rejected");
        let notice = PlayerOutboundMessage::error(err.to_string());
        self.notifier.send(player, notice.clone());
        if matches!(err, ActionError::ShotNotRecorded) {
            if let Some(seat) = self.seat_of(player) {
                self.send(seat.other(), notice);
            }
        }
        err
    }

    /// Publish the new presence first, then persist it.
    async fn set_status(&self, seat: Seat, status: PlayerStatus) -> Result<(), StorageError> {
        let participant = self.participant(seat);
        self.notifier.broadcast(PlayerOutboundMessage::StatusUpdate {
            player_id: participant.id,
            name: participant.name.clone(),
            status,
        });
        self.store
            .update_player_status(participant.id, status)
            .await
            .inspect_err(|err| {
                warn!(player_id = %participant.id, %status, error = %err, "failed to persist player status");
            })
    }

    fn seat_of(&self, player: PlayerId) -> Option<Seat> {
        Seat::BOTH
            .into_iter()
            .find(|seat| self.participant(*seat).id == player)
    }

    fn participant(&self, seat: Seat) -> &Participant {
        &self.players[seat.index()]
    }

    fn send(&self, seat: Seat, message: PlayerOutboundMessage) {
        self.notifier.send(self.participant(seat).id, message);
    }

    fn send_both(&self, message: PlayerOutboundMessage) {
        self.send(Seat::A, message.clone());
        self.send(Seat::B, message);
    }
}
