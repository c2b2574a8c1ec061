use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use rand::{SeedableRng, rngs::StdRng};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dao::models::PlayerId,
    dto::{
        matches::{CreateMatchRequest, MatchListResponse, MatchSummary},
        ws::{PlayerInboundMessage, PlayerOutboundMessage},
    },
    error::ServiceError,
    services::{
        coordinator::{ActionError, MatchCoordinator, Participant, RoomId},
        notifier::Notifier,
    },
    state::{SharedState, choice::Choice},
};

/// Seat two connected, idle players in a fresh match and start it.
pub async fn create_match(
    state: &SharedState,
    request: CreateMatchRequest,
) -> Result<MatchSummary, ServiceError> {
    let CreateMatchRequest { player_a, player_b } = request;
    let players = [participant(state, player_a)?, participant(state, player_b)?];

    let room_id = Uuid::new_v4();
    reserve_seats(state, room_id, [player_a, player_b])?;

    let notifier: Arc<dyn Notifier> = state.connections().clone();
    let coordinator = match MatchCoordinator::create(
        room_id,
        players,
        state.config().match_settings(),
        notifier,
        state.store(),
        StdRng::from_os_rng(),
    )
    .await
    {
        Ok(coordinator) => coordinator,
        Err(err) => {
            warn!(room_id = %room_id, error = %err, "failed to create match record");
            free_seats(state, room_id, &[player_a, player_b]);
            return Err(err.into());
        }
    };
    state.matches().insert(room_id, Arc::clone(&coordinator));

    match coordinator.start_match().await {
        Ok(()) => {}
        // Players were notified; only the presence write failed.
        Err(ActionError::Persistence(err)) => {
            warn!(room_id = %room_id, error = %err, "match started with persistence errors");
        }
        Err(err) => {
            release_match(state, &coordinator);
            return Err(err.into());
        }
    }

    // A socket closing while the record was written found no match to forfeit.
    for player in [player_a, player_b] {
        if state.connections().is_connected(player) {
            continue;
        }
        warn!(room_id = %room_id, player_id = %player, "player left while the match was opening");
        if let Err(err) = coordinator.handle_disconnect(player).await {
            warn!(room_id = %room_id, player_id = %player, error = %err, "disconnect handling failed");
        }
    }
    if coordinator.is_terminated().await {
        release_match(state, &coordinator);
        return Err(ServiceError::InvalidState(format!(
            "match `{room_id}` ended before it started: a player disconnected"
        )));
    }
    info!(room_id = %room_id, %player_a, %player_b, "match room opened");

    Ok(coordinator.snapshot().await.into())
}

/// Route an in-match message from `player` to its coordinator.
///
/// Rejections have already been reported to the player by the time this returns.
pub async fn handle_player_message(
    state: &SharedState,
    player: PlayerId,
    message: PlayerInboundMessage,
) -> Result<(), ServiceError> {
    let coordinator = match message {
        PlayerInboundMessage::Identification(_) => {
            warn!(player_id = %player, "ignoring duplicate identification message");
            return Ok(());
        }
        PlayerInboundMessage::Unknown => {
            notify(state, player, PlayerOutboundMessage::error("Unknown message type."));
            return Err(ServiceError::InvalidInput("unknown message type".into()));
        }
        _ => match state.match_of(player) {
            Some(coordinator) => coordinator,
            None => {
                notify(state, player, PlayerOutboundMessage::error("You are not in a match."));
                return Err(ServiceError::InvalidState(format!(
                    "player `{player}` is not in a match"
                )));
            }
        },
    };

    let result = match message {
        PlayerInboundMessage::Shoot { choice } => match parse_choice(state, player, &choice) {
            Ok(choice) => coordinator.submit_shot(player, choice).await,
            Err(err) => Err(err),
        },
        PlayerInboundMessage::Save { choice } => match parse_choice(state, player, &choice) {
            Ok(choice) => coordinator.submit_save(player, choice).await,
            Err(err) => Err(err),
        },
        PlayerInboundMessage::Timeout { role } => coordinator.report_timeout(player, role).await,
        PlayerInboundMessage::PlayAgainResponse { accept } => {
            coordinator.submit_rematch_vote(player, accept).await
        }
        PlayerInboundMessage::QuitGame => coordinator.handle_player_quit(player).await,
        PlayerInboundMessage::Chat { message } => coordinator.relay_chat(player, &message),
        PlayerInboundMessage::Identification(_) | PlayerInboundMessage::Unknown => Ok(()),
    };

    release_if_terminated(state, &coordinator).await;
    result.map_err(Into::into)
}

/// The player's socket closed; forfeit any match they are seated in.
pub async fn handle_disconnect(state: &SharedState, player: PlayerId) -> Result<(), ServiceError> {
    let Some(coordinator) = state.match_of(player) else {
        return Ok(());
    };
    let result = coordinator.handle_disconnect(player).await;
    release_if_terminated(state, &coordinator).await;
    result.map_err(Into::into)
}

/// True when `player` is seated in a live match.
pub fn is_in_match(state: &SharedState, player: PlayerId) -> bool {
    state.player_rooms().contains_key(&player)
}

/// Snapshot every live match.
pub async fn list_matches(state: &SharedState) -> MatchListResponse {
    let coordinators: Vec<_> = state
        .matches()
        .iter()
        .map(|entry| Arc::clone(entry.value()))
        .collect();

    let mut matches = Vec::with_capacity(coordinators.len());
    for coordinator in coordinators {
        matches.push(coordinator.snapshot().await.into());
    }
    MatchListResponse { matches }
}

pub async fn get_match(state: &SharedState, room_id: RoomId) -> Result<MatchSummary, ServiceError> {
    let coordinator = state
        .matches()
        .get(&room_id)
        .map(|entry| Arc::clone(entry.value()))
        .ok_or_else(|| ServiceError::NotFound(format!("match `{room_id}` not found")))?;
    Ok(coordinator.snapshot().await.into())
}

/// Drop a terminated match from the registry so both players can be paired again.
pub async fn release_if_terminated(state: &SharedState, coordinator: &Arc<MatchCoordinator>) {
    if coordinator.is_terminated().await {
        release_match(state, coordinator);
    }
}

fn release_match(state: &SharedState, coordinator: &Arc<MatchCoordinator>) {
    let room_id = coordinator.room_id();
    if state.matches().remove(&room_id).is_some() {
        info!(room_id = %room_id, "match room released");
    }
    let seated = coordinator.players().clone().map(|participant| participant.id);
    free_seats(state, room_id, &seated);
}

fn participant(state: &SharedState, id: PlayerId) -> Result<Participant, ServiceError> {
    let name = state
        .connections()
        .name(id)
        .ok_or_else(|| ServiceError::NotFound(format!("player `{id}` is not connected")))?;
    Ok(Participant { id, name })
}

/// Claim both seats for `room_id`, or neither.
fn reserve_seats(
    state: &SharedState,
    room_id: RoomId,
    players: [PlayerId; 2],
) -> Result<(), ServiceError> {
    let mut claimed = Vec::with_capacity(players.len());
    for player in players {
        // The entry guard must be gone before touching other keys.
        let inserted = match state.player_rooms().entry(player) {
            Entry::Vacant(slot) => {
                slot.insert(room_id);
                true
            }
            Entry::Occupied(_) => false,
        };
        if !inserted {
            free_seats(state, room_id, &claimed);
            return Err(ServiceError::InvalidState(format!(
                "player `{player}` is already in a match"
            )));
        }
        claimed.push(player);
    }
    Ok(())
}

fn free_seats(state: &SharedState, room_id: RoomId, players: &[PlayerId]) {
    for player in players {
        state
            .player_rooms()
            .remove_if(player, |_, seated_in| *seated_in == room_id);
    }
}

fn parse_choice(state: &SharedState, player: PlayerId, raw: &str) -> Result<Choice, ActionError> {
    raw.parse::<Choice>().map_err(|err| {
        notify(state, player, PlayerOutboundMessage::error(err.to_string()));
        ActionError::from(err)
    })
}

fn notify(state: &SharedState, player: PlayerId, message: PlayerOutboundMessage) {
    state.connections().send(player, message);
}
