mod common;

use std::time::Duration;

use penalty_shootout_back::{
    dao::models::{EndReason, PlayerStatus},
    dto::ws::{MatchResultKind, PlayerOutboundMessage},
    services::coordinator::ActionError,
    state::{choice::Choice, roles::Role, state_machine::MatchPhase},
};

use common::{GOAL_SHOT, Harness, choice};

#[tokio::test(start_paused = true)]
async fn match_start_announces_roles_and_first_turn() {
    let h = Harness::start().await;
    let (shooter, keeper) = (h.shooter().await, h.keeper().await);

    assert!(matches!(
        h.notifier.last(shooter, "match_start"),
        Some(PlayerOutboundMessage::MatchStart { role: Role::Shooter, .. })
    ));
    assert!(matches!(
        h.notifier.last(keeper, "match_start"),
        Some(PlayerOutboundMessage::MatchStart { role: Role::Goalkeeper, .. })
    ));
    assert_eq!(h.notifier.count(shooter, "your_turn"), 1);
    assert_eq!(h.notifier.count(keeper, "opponent_turn"), 1);

    let snapshot = h.snapshot().await;
    assert_eq!(snapshot.phase, MatchPhase::AwaitingShot);
    assert_eq!(snapshot.round, 1);
    assert_eq!(snapshot.scores, [0, 0]);

    let ingame = h
        .notifier
        .broadcasts()
        .into_iter()
        .filter(|message| {
            matches!(
                message,
                PlayerOutboundMessage::StatusUpdate {
                    status: PlayerStatus::Ingame,
                    ..
                }
            )
        })
        .count();
    assert_eq!(ingame, 2);
    assert_eq!(h.store.inner.player(h.a).unwrap().status, PlayerStatus::Ingame);
    assert_eq!(h.store.inner.player(h.b).unwrap().status, PlayerStatus::Ingame);
}

#[tokio::test(start_paused = true)]
async fn shot_timeout_picks_for_the_shooter_and_late_shot_is_rejected() {
    let h = Harness::start().await;
    let (shooter, keeper) = (h.shooter().await, h.keeper().await);

    h.wait(Duration::from_secs(16)).await;

    assert!(matches!(
        h.notifier.last(shooter, "timeout"),
        Some(PlayerOutboundMessage::Timeout { auto_choice, .. }) if auto_choice == "Center-Low"
    ));
    assert_eq!(h.notifier.count(keeper, "opponent_timeout"), 1);
    assert_eq!(h.notifier.count(keeper, "goalkeeper_turn"), 1);

    let snapshot = h.snapshot().await;
    assert_eq!(snapshot.phase, MatchPhase::AwaitingSave);
    assert_eq!(snapshot.shot, Some(Choice::AUTO));

    let late = h.coordinator.submit_shot(shooter, choice(GOAL_SHOT)).await;
    assert!(matches!(late, Err(ActionError::OutOfPhase { .. })));
    assert_eq!(h.snapshot().await.shot, Some(Choice::AUTO));

    h.coordinator
        .submit_save(keeper, choice("center-low"))
        .await
        .unwrap();
    assert!(matches!(
        h.notifier.last(shooter, "kick_result"),
        Some(PlayerOutboundMessage::KickResult { round: 1, goal: false, .. })
    ));
}

#[tokio::test(start_paused = true)]
async fn both_deadlines_resolve_the_round_and_swap_roles() {
    let h = Harness::start().await;
    let (shooter, keeper) = (h.shooter().await, h.keeper().await);

    h.wait(Duration::from_secs(31)).await;

    let snapshot = h.snapshot().await;
    assert_eq!(snapshot.round, 2);
    assert_eq!(snapshot.phase, MatchPhase::AwaitingShot);
    assert_eq!(snapshot.shooter, keeper);
    assert_eq!(snapshot.goalkeeper, shooter);
    assert_eq!(h.notifier.count(shooter, "kick_result"), 1);
    assert_eq!(h.notifier.count(keeper, "timeout"), 1);
    assert_eq!(h.notifier.count(shooter, "animate_shoot_khong_vao"), 1);
}

#[tokio::test(start_paused = true)]
async fn timely_shot_cancels_the_shot_deadline() {
    let h = Harness::start().await;
    let shooter = h.shooter().await;

    h.wait(Duration::from_secs(14)).await;
    h.coordinator
        .submit_shot(shooter, choice(GOAL_SHOT))
        .await
        .unwrap();
    h.wait(Duration::from_secs(2)).await;

    assert_eq!(h.notifier.count(h.a, "timeout"), 0);
    assert_eq!(h.notifier.count(h.b, "timeout"), 0);
    assert_eq!(h.snapshot().await.shot, Some(choice(GOAL_SHOT)));

    // A client countdown reaching zero after the shot changes nothing.
    h.coordinator
        .report_timeout(shooter, Role::Shooter)
        .await
        .unwrap();
    assert_eq!(h.snapshot().await.phase, MatchPhase::AwaitingSave);
}

#[tokio::test(start_paused = true)]
async fn client_reported_timeout_fills_in_the_save() {
    let h = Harness::start().await;
    let (shooter, keeper) = (h.shooter().await, h.keeper().await);

    h.coordinator
        .submit_shot(shooter, choice("Center-High"))
        .await
        .unwrap();
    h.coordinator
        .report_timeout(keeper, Role::Goalkeeper)
        .await
        .unwrap();

    assert_eq!(h.notifier.count(keeper, "timeout"), 1);
    assert_eq!(h.notifier.count(shooter, "opponent_timeout"), 1);
    assert_eq!(h.notifier.count(shooter, "kick_result"), 1);
    assert_eq!(h.snapshot().await.round, 2);
}

#[tokio::test(start_paused = true)]
async fn regulation_ends_with_the_leader_winning() {
    let h = Harness::start().await;
    let first_match = h.snapshot().await.match_id;

    let mut b_shots = 0;
    for _ in 0..10 {
        let goal = if h.shooter().await == h.a {
            true
        } else {
            b_shots += 1;
            b_shots <= 3
        };
        h.play_round(goal).await;
    }

    let snapshot = h.snapshot().await;
    assert_eq!(snapshot.phase, MatchPhase::MatchOver);
    assert_eq!(snapshot.score_of(h.a), Some(5));
    assert_eq!(snapshot.score_of(h.b), Some(3));

    assert_eq!(
        h.notifier.last(h.a, "match_result"),
        Some(PlayerOutboundMessage::MatchResult {
            result: MatchResultKind::Win,
            your_score: 5,
            opponent_score: 3,
        })
    );
    assert_eq!(
        h.notifier.last(h.b, "match_result"),
        Some(PlayerOutboundMessage::MatchResult {
            result: MatchResultKind::Lose,
            your_score: 3,
            opponent_score: 5,
        })
    );
    assert_eq!(
        h.notifier.last(h.b, "update_score"),
        Some(PlayerOutboundMessage::UpdateScore {
            your_score: 3,
            opponent_score: 5,
            round: 10,
        })
    );
    assert_eq!(
        h.notifier.count(h.a, "your_turn") + h.notifier.count(h.b, "your_turn"),
        10
    );

    assert_eq!(h.store.inner.player(h.a).unwrap().points, 3);
    assert_eq!(h.store.inner.player(h.b).unwrap().points, 0);
    let record = h.store.inner.find_match(first_match).await.unwrap();
    assert_eq!(record.winner, Some(h.a));
    assert_eq!(record.end_reason, Some(EndReason::Normal));
    assert_eq!(h.store.inner.rounds(first_match).await.len(), 10);

    assert_eq!(h.notifier.count(h.a, "play_again_request"), 0);
    h.wait(Duration::from_secs(4)).await;
    assert_eq!(h.notifier.count(h.a, "play_again_request"), 1);
    assert_eq!(h.notifier.count(h.b, "play_again_request"), 1);
    assert_eq!(h.snapshot().await.phase, MatchPhase::AwaitingRematchVotes);
}

#[tokio::test(start_paused = true)]
async fn tied_regulation_goes_to_sudden_death_pairs() {
    let h = Harness::start().await;
    for _ in 0..10 {
        h.play_round(false).await;
    }
    let snapshot = h.snapshot().await;
    assert_eq!(snapshot.phase, MatchPhase::AwaitingShot);
    assert_eq!(snapshot.round, 11);

    let x = h.shooter().await;
    let y = h.other(x);

    // Round 11 alone never decides.
    h.play_round(true).await;
    assert_eq!(h.snapshot().await.phase, MatchPhase::AwaitingShot);
    // Rounds 11-12 level at 1-1.
    h.play_round(true).await;
    assert_eq!(h.snapshot().await.phase, MatchPhase::AwaitingShot);
    assert_eq!(h.snapshot().await.round, 13);

    h.play_round(true).await;
    assert_eq!(h.snapshot().await.phase, MatchPhase::AwaitingShot);
    h.play_round(false).await;

    let snapshot = h.snapshot().await;
    assert_eq!(snapshot.phase, MatchPhase::MatchOver);
    assert_eq!(snapshot.score_of(x), Some(2));
    assert_eq!(snapshot.score_of(y), Some(1));
    assert!(matches!(
        h.notifier.last(x, "match_result"),
        Some(PlayerOutboundMessage::MatchResult { result: MatchResultKind::Win, .. })
    ));
}

#[tokio::test(start_paused = true)]
async fn accepted_rematch_starts_fresh_with_roles_swapped() {
    let h = Harness::start_with(Harness::short_match()).await;
    let first_shooter = h.shooter().await;
    let first_match = h.snapshot().await.match_id;
    h.play_round(true).await;
    h.play_round(false).await;
    assert_eq!(h.snapshot().await.phase, MatchPhase::MatchOver);

    h.wait(Duration::from_secs(4)).await;
    h.coordinator.submit_rematch_vote(h.a, true).await.unwrap();
    assert_eq!(h.snapshot().await.phase, MatchPhase::AwaitingRematchVotes);
    h.coordinator.submit_rematch_vote(h.b, true).await.unwrap();

    let snapshot = h.snapshot().await;
    assert_ne!(snapshot.match_id, first_match);
    assert_eq!(snapshot.phase, MatchPhase::AwaitingShot);
    assert_eq!(snapshot.round, 1);
    assert_eq!(snapshot.scores, [0, 0]);
    assert_ne!(snapshot.shooter, first_shooter);
    assert_eq!(h.notifier.count(h.a, "match_start"), 2);
    assert_eq!(h.notifier.count(h.b, "match_start"), 2);
    assert_eq!(h.store.inner.matches().await.len(), 2);

    // Deadlines belong to the new match.
    h.wait(Duration::from_secs(16)).await;
    assert_eq!(h.notifier.count(snapshot.shooter, "timeout"), 1);
}

#[tokio::test(start_paused = true)]
async fn declined_rematch_ends_the_session() {
    let h = Harness::start_with(Harness::short_match()).await;
    h.play_round(true).await;
    h.play_round(false).await;

    // Votes are accepted before the prompt goes out.
    h.coordinator.submit_rematch_vote(h.a, false).await.unwrap();
    let again = h.coordinator.submit_rematch_vote(h.a, true).await;
    assert!(matches!(again, Err(ActionError::AlreadyVoted)));

    h.coordinator.submit_rematch_vote(h.b, true).await.unwrap();
    assert!(h.coordinator.is_terminated().await);
    assert_eq!(h.notifier.count(h.a, "match_end"), 1);
    assert_eq!(h.notifier.count(h.b, "match_end"), 1);
    assert_eq!(h.store.inner.player(h.a).unwrap().status, PlayerStatus::Online);
    assert_eq!(h.store.inner.player(h.b).unwrap().status, PlayerStatus::Online);

    h.wait(Duration::from_secs(5)).await;
    assert_eq!(h.notifier.count(h.a, "play_again_request"), 0);
}

#[tokio::test(start_paused = true)]
async fn disconnect_mid_match_awards_the_opponent() {
    let h = Harness::start().await;
    h.play_round(true).await;
    let match_id = h.snapshot().await.match_id;

    h.coordinator.handle_disconnect(h.a).await.unwrap();

    assert!(h.coordinator.is_terminated().await);
    assert!(matches!(
        h.notifier.last(h.b, "match_end"),
        Some(PlayerOutboundMessage::MatchEnd { message }) if message.contains("win")
    ));
    assert_eq!(h.store.inner.player(h.b).unwrap().points, 3);
    assert_eq!(h.store.inner.player(h.a).unwrap().points, 0);
    assert_eq!(h.store.inner.player(h.a).unwrap().status, PlayerStatus::Offline);
    assert_eq!(h.store.inner.player(h.b).unwrap().status, PlayerStatus::Online);
    let record = h.store.inner.find_match(match_id).await.unwrap();
    assert_eq!(record.winner, Some(h.b));
    assert_eq!(record.end_reason, Some(EndReason::Disconnect));

    h.wait(Duration::from_secs(60)).await;
    assert_eq!(h.notifier.count(h.b, "play_again_request"), 0);
    assert_eq!(h.notifier.count(h.a, "timeout"), 0);
    assert_eq!(h.notifier.count(h.b, "timeout"), 0);

    // The survivor leaving afterwards changes nothing.
    h.coordinator.handle_disconnect(h.b).await.unwrap();
    assert_eq!(h.store.inner.player(h.b).unwrap().points, 3);
}

#[tokio::test(start_paused = true)]
async fn quitting_forfeits_with_the_quit_reason() {
    let h = Harness::start().await;
    let match_id = h.snapshot().await.match_id;

    h.coordinator.handle_player_quit(h.b).await.unwrap();

    let record = h.store.inner.find_match(match_id).await.unwrap();
    assert_eq!(record.winner, Some(h.a));
    assert_eq!(record.end_reason, Some(EndReason::PlayerQuit));
    assert_eq!(h.store.inner.player(h.a).unwrap().points, 3);
    assert_eq!(h.store.inner.player(h.b).unwrap().status, PlayerStatus::Online);
    assert_eq!(h.notifier.count(h.a, "match_end"), 1);
}

#[tokio::test(start_paused = true)]
async fn leaving_after_the_final_whistle_keeps_the_result() {
    let h = Harness::start_with(Harness::short_match()).await;
    let winner = h.shooter().await;
    let match_id = h.snapshot().await.match_id;
    h.play_round(true).await;
    h.play_round(false).await;

    h.coordinator.handle_disconnect(h.other(winner)).await.unwrap();

    assert_eq!(h.store.inner.player(winner).unwrap().points, 3);
    let record = h.store.inner.find_match(match_id).await.unwrap();
    assert_eq!(record.end_reason, Some(EndReason::Normal));

    h.wait(Duration::from_secs(5)).await;
    assert_eq!(h.notifier.count(winner, "play_again_request"), 0);
}

#[tokio::test(start_paused = true)]
async fn save_before_shot_is_reported_to_both_players() {
    let h = Harness::start().await;
    let keeper = h.keeper().await;

    let result = h.coordinator.submit_save(keeper, choice(GOAL_SHOT)).await;

    assert!(matches!(result, Err(ActionError::ShotNotRecorded)));
    assert_eq!(h.notifier.count(h.a, "error"), 1);
    assert_eq!(h.notifier.count(h.b, "error"), 1);
    assert_eq!(h.snapshot().await.phase, MatchPhase::AwaitingShot);
}

#[tokio::test(start_paused = true)]
async fn out_of_turn_actions_are_rejected_to_the_sender() {
    let h = Harness::start().await;
    let (shooter, keeper) = (h.shooter().await, h.keeper().await);

    let result = h.coordinator.submit_shot(keeper, choice(GOAL_SHOT)).await;
    assert!(matches!(
        result,
        Err(ActionError::WrongTurn {
            expected: Role::Shooter
        })
    ));
    assert_eq!(h.notifier.count(keeper, "error"), 1);
    assert_eq!(h.notifier.count(shooter, "error"), 0);

    let stranger = uuid::Uuid::new_v4();
    let result = h.coordinator.submit_shot(stranger, choice(GOAL_SHOT)).await;
    assert!(matches!(result, Err(ActionError::NotParticipant(id)) if id == stranger));

    let vote = h.coordinator.submit_rematch_vote(shooter, true).await;
    assert!(matches!(vote, Err(ActionError::OutOfPhase { .. })));
}

#[tokio::test(start_paused = true)]
async fn persistence_failure_does_not_stall_the_match() {
    let h = Harness::start().await;
    let (shooter, keeper) = (h.shooter().await, h.keeper().await);
    h.store
        .fail_rounds
        .store(true, std::sync::atomic::Ordering::SeqCst);

    h.coordinator
        .submit_shot(shooter, choice(GOAL_SHOT))
        .await
        .unwrap();
    let result = h.coordinator.submit_save(keeper, choice("Right-Low")).await;

    assert!(matches!(result, Err(ActionError::Persistence(_))));
    assert_eq!(h.notifier.count(h.a, "kick_result"), 1);
    assert_eq!(h.notifier.count(h.b, "update_score"), 1);
    assert_eq!(h.snapshot().await.round, 2);
    assert_eq!(h.notifier.count(keeper, "your_turn"), 1);
}

#[tokio::test(start_paused = true)]
async fn failed_rematch_record_ends_the_session() {
    let h = Harness::start_with(Harness::short_match()).await;
    h.play_round(true).await;
    h.play_round(false).await;
    h.store
        .fail_create
        .store(true, std::sync::atomic::Ordering::SeqCst);

    h.coordinator.submit_rematch_vote(h.a, true).await.unwrap();
    let result = h.coordinator.submit_rematch_vote(h.b, true).await;

    assert!(matches!(result, Err(ActionError::Persistence(_))));
    assert!(h.coordinator.is_terminated().await);
    assert_eq!(h.notifier.count(h.a, "match_end"), 1);
    assert_eq!(h.notifier.count(h.b, "error"), 1);
}

#[tokio::test(start_paused = true)]
async fn chat_is_relayed_to_both_players() {
    let h = Harness::start().await;

    h.coordinator.relay_chat(h.a, "  good luck  ").unwrap();

    assert_eq!(
        h.notifier.last(h.b, "chat"),
        Some(PlayerOutboundMessage::Chat {
            from: "alice".into(),
            message: "good luck".into(),
        })
    );
    assert_eq!(h.notifier.count(h.a, "chat"), 1);
}
