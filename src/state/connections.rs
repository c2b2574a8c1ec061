use axum::extract::ws::Message;
use dashmap::{DashMap, mapref::entry::Entry};
use tokio::sync::mpsc;

use crate::{dao::models::PlayerId, state::sse::SseHub};

#[derive(Clone)]
/// Handle used to push messages to a connected player.
pub struct PlayerConnection {
    pub id: PlayerId,
    pub name: String,
    pub tx: mpsc::UnboundedSender<Message>,
}

/// Live player sockets keyed by player id, plus the presence broadcast hub.
pub struct ConnectionRegistry {
    players: DashMap<PlayerId, PlayerConnection>,
    presence: SseHub,
}

impl ConnectionRegistry {
    pub fn new(presence_capacity: usize) -> Self {
        Self {
            players: DashMap::new(),
            presence: SseHub::new(presence_capacity),
        }
    }

    /// Register a socket. Returns `false` when the player already has one.
    pub fn register(&self, connection: PlayerConnection) -> bool {
        match self.players.entry(connection.id) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(connection);
                true
            }
        }
    }

    pub fn unregister(&self, id: PlayerId) -> Option<PlayerConnection> {
        self.players.remove(&id).map(|(_, connection)| connection)
    }

    pub fn is_connected(&self, id: PlayerId) -> bool {
        self.players.contains_key(&id)
    }

    pub fn name(&self, id: PlayerId) -> Option<String> {
        self.players.get(&id).map(|entry| entry.name.clone())
    }

    pub fn sender(&self, id: PlayerId) -> Option<mpsc::UnboundedSender<Message>> {
        self.players.get(&id).map(|entry| entry.tx.clone())
    }

    /// Snapshot of every writer channel, taken without holding shard locks afterwards.
    pub fn senders(&self) -> Vec<mpsc::UnboundedSender<Message>> {
        self.players.iter().map(|entry| entry.tx.clone()).collect()
    }

    pub fn connected_count(&self) -> usize {
        self.players.len()
    }

    /// Broadcast hub feeding the presence SSE stream.
    pub fn presence(&self) -> &SseHub {
        &self.presence
    }
}
