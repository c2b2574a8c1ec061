pub mod choice;
pub mod connections;
pub mod outcome;
pub mod roles;
pub mod round_tracker;
mod sse;
pub mod state_machine;
pub mod timeout;

use std::sync::Arc;

use dashmap::DashMap;

use crate::{
    config::AppConfig,
    dao::{gateway::PersistenceGateway, models::PlayerId},
    services::coordinator::{MatchCoordinator, RoomId},
};

pub use self::connections::{ConnectionRegistry, PlayerConnection};
pub use self::sse::SseHub;

pub type SharedState = Arc<AppState>;

/// Capacity of the presence broadcast channel.
const PRESENCE_CAPACITY: usize = 64;

/// Central application state: configuration, persistence, live sockets and live matches.
pub struct AppState {
    config: Arc<AppConfig>,
    store: Arc<dyn PersistenceGateway>,
    connections: Arc<ConnectionRegistry>,
    matches: DashMap<RoomId, Arc<MatchCoordinator>>,
    player_rooms: DashMap<PlayerId, RoomId>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    pub fn new(config: AppConfig, store: Arc<dyn PersistenceGateway>) -> SharedState {
        Arc::new(Self {
            config: Arc::new(config),
            store,
            connections: Arc::new(ConnectionRegistry::new(PRESENCE_CAPACITY)),
            matches: DashMap::new(),
            player_rooms: DashMap::new(),
        })
    }

    pub fn config(&self) -> Arc<AppConfig> {
        Arc::clone(&self.config)
    }

    pub fn store(&self) -> Arc<dyn PersistenceGateway> {
        Arc::clone(&self.store)
    }

    /// Registry of connected player sockets, also the notifier handed to coordinators.
    pub fn connections(&self) -> &Arc<ConnectionRegistry> {
        &self.connections
    }

    /// Broadcast hub used for the presence SSE stream.
    pub fn presence_sse(&self) -> &SseHub {
        self.connections.presence()
    }

    /// Live matches keyed by room.
    pub fn matches(&self) -> &DashMap<RoomId, Arc<MatchCoordinator>> {
        &self.matches
    }

    /// Room each seated player belongs to.
    pub fn player_rooms(&self) -> &DashMap<PlayerId, RoomId> {
        &self.player_rooms
    }

    /// Coordinator of the match `player` is seated in, if any.
    pub fn match_of(&self, player: PlayerId) -> Option<Arc<MatchCoordinator>> {
        let room_id = *self.player_rooms.get(&player)?;
        self.matches
            .get(&room_id)
            .map(|entry| Arc::clone(entry.value()))
    }
}
