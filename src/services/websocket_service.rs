use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{info, warn};

use crate::{
    dao::models::{PlayerId, PlayerStatus},
    dto::ws::{Identification, PlayerInboundMessage, PlayerOutboundMessage},
    services::{match_service, notifier::{Notifier, send_message_to_websocket}},
    state::{PlayerConnection, SharedState},
};

/// Handle the full lifecycle for an individual player WebSocket connection.
pub async fn handle_socket(state: SharedState, socket: WebSocket) {
    let (mut sender, mut receiver) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Message>();

    // Dedicated writer task keeps outbound messages flowing even while we await inbound frames.
    let writer_task = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            if sender.send(message).await.is_err() {
                break;
            }
        }
    });

    let ident_timeout = state.config().identification_timeout();
    let initial_message = match tokio::time::timeout(ident_timeout, receiver.next()).await {
        Ok(Some(Ok(Message::Text(text)))) => text,
        Ok(Some(Ok(Message::Close(_)))) => {
            finalize(writer_task, outbound_tx).await;
            return;
        }
        Ok(Some(Ok(_))) => {
            let _ = outbound_tx.send(Message::Close(None));
            finalize(writer_task, outbound_tx).await;
            return;
        }
        Ok(Some(Err(err))) => {
            warn!(error = %err, "websocket receive error");
            finalize(writer_task, outbound_tx).await;
            return;
        }
        Ok(None) | Err(_) => {
            warn!("websocket identification timed out");
            finalize(writer_task, outbound_tx).await;
            return;
        }
    };

    let inbound = match PlayerInboundMessage::from_json_str(&initial_message) {
        Ok(message) => message,
        Err(err) => {
            warn!(error = %err, "failed to parse or validate player message");
            let _ = send_message_to_websocket(
                &outbound_tx,
                &PlayerOutboundMessage::error(err.to_string()),
            );
            let _ = outbound_tx.send(Message::Close(None));
            finalize(writer_task, outbound_tx).await;
            return;
        }
    };

    let PlayerInboundMessage::Identification(Identification { id: player_id, name }) = inbound else {
        warn!("first message was not identification");
        let _ = outbound_tx.send(Message::Close(None));
        finalize(writer_task, outbound_tx).await;
        return;
    };
    let name = name.trim().to_string();

    let registered = state.connections().register(PlayerConnection {
        id: player_id,
        name: name.clone(),
        tx: outbound_tx.clone(),
    });
    if !registered {
        warn!(player_id = %player_id, "player already connected; refusing second socket");
        let _ = send_message_to_websocket(
            &outbound_tx,
            &PlayerOutboundMessage::error("This player is already connected."),
        );
        let _ = outbound_tx.send(Message::Close(None));
        finalize(writer_task, outbound_tx).await;
        return;
    }

    info!(player_id = %player_id, name = %name, "player connected");
    let _ = send_message_to_websocket(
        &outbound_tx,
        &PlayerOutboundMessage::Identified {
            id: player_id,
            name: name.clone(),
        },
    );
    publish_presence(&state, player_id, &name, PlayerStatus::Online).await;

    while let Some(message) = receiver.next().await {
        match message {
            Ok(Message::Text(text)) => {
                info!(player_id = %player_id, payload = %text, "received player message");

                match PlayerInboundMessage::from_json_str(&text) {
                    Ok(msg) => {
                        if let Err(err) =
                            match_service::handle_player_message(&state, player_id, msg).await
                        {
                            warn!(player_id = %player_id, error = %err, "player action failed");
                        }
                    }
                    Err(err) => {
                        warn!(player_id = %player_id, error = %err, "failed to parse or validate player message");
                        state
                            .connections()
                            .send(player_id, PlayerOutboundMessage::error(err.to_string()));
                    }
                }
            }
            Ok(Message::Ping(payload)) => {
                let _ = outbound_tx.send(Message::Pong(payload));
            }
            Ok(Message::Close(frame)) => {
                info!(player_id = %player_id, "player closed the connection");
                let _ = outbound_tx.send(Message::Close(frame));
                break;
            }
            Ok(Message::Binary(_)) => {}
            Ok(Message::Pong(_)) => {}
            Err(err) => {
                warn!(player_id = %player_id, error = %err, "websocket error");
                break;
            }
        }
    }

    close_player_session(&state, player_id, &name).await;
    finalize(writer_task, outbound_tx).await;
}

/// Tear down a player session once their socket is gone.
///
/// The socket leaves the registry before the seat check: a pairing still in flight
/// then either fails to find the player or sees them gone once its match is live.
pub async fn close_player_session(state: &SharedState, player_id: PlayerId, name: &str) {
    state.connections().unregister(player_id);
    if match_service::is_in_match(state, player_id) {
        if let Err(err) = match_service::handle_disconnect(state, player_id).await {
            warn!(player_id = %player_id, error = %err, "disconnect handling failed");
        }
    } else {
        publish_presence(state, player_id, name, PlayerStatus::Offline).await;
    }
    info!(player_id = %player_id, "player disconnected");
}

/// Broadcast a presence change, then persist it.
async fn publish_presence(state: &SharedState, player: PlayerId, name: &str, status: PlayerStatus) {
    state
        .connections()
        .broadcast(PlayerOutboundMessage::StatusUpdate {
            player_id: player,
            name: name.to_string(),
            status,
        });
    if let Err(err) = state.store().update_player_status(player, status).await {
        warn!(player_id = %player, %status, error = %err, "failed to persist player status");
    }
}

/// Ensure the writer task winds down before we return from the socket handler.
async fn finalize(writer_task: JoinHandle<()>, outbound_tx: mpsc::UnboundedSender<Message>) {
    drop(outbound_tx);
    let _ = writer_task.await;
}
