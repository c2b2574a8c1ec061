use axum::extract::ws::Message;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::{
    dao::models::PlayerId,
    dto::{sse::ServerEvent, ws::PlayerOutboundMessage},
    state::connections::ConnectionRegistry,
};

/// Outbound side of the match core: typed, fire-and-forget delivery to players.
pub trait Notifier: Send + Sync {
    /// Deliver `message` to a single player. Unknown or disconnected players are skipped.
    fn send(&self, player: PlayerId, message: PlayerOutboundMessage);
    /// Deliver `message` to everybody currently connected (presence updates).
    fn broadcast(&self, message: PlayerOutboundMessage);
}

impl Notifier for ConnectionRegistry {
    fn send(&self, player: PlayerId, message: PlayerOutboundMessage) {
        let Some(tx) = self.sender(player) else {
            debug!(player_id = %player, kind = message.kind(), "player not connected; dropping message");
            return;
        };
        if send_message_to_websocket(&tx, &message).is_err() {
            warn!(player_id = %player, kind = message.kind(), "writer closed; dropping message");
        }
    }

    fn broadcast(&self, message: PlayerOutboundMessage) {
        for tx in self.senders() {
            let _ = send_message_to_websocket(&tx, &message);
        }
        match ServerEvent::json(Some(message.kind().to_string()), &message) {
            Ok(event) => self.presence().broadcast(event),
            Err(err) => warn!(error = %err, "failed to serialize presence event"),
        }
    }
}

/// Serialize a payload and push it onto the provided WebSocket sender.
///
/// Serialization failures are logged and swallowed; only a closed writer is reported.
pub fn send_message_to_websocket<T>(
    tx: &mpsc::UnboundedSender<Message>,
    value: &T,
) -> Result<(), mpsc::error::SendError<Message>>
where
    T: ?Sized + serde::Serialize + std::fmt::Debug,
{
    let payload = match serde_json::to_string(value) {
        Ok(p) => p,
        Err(err) => {
            warn!(error = %err, "failed to serialize message `{value:?}`");
            return Ok(());
        }
    };

    tx.send(Message::Text(payload.into()))
}
