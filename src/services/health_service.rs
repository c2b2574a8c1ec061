use tracing::debug;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Report liveness along with a few in-memory counters.
pub fn health_status(state: &SharedState) -> HealthResponse {
    let connected_players = state.connections().connected_count();
    let live_matches = state.matches().len();
    debug!(connected_players, live_matches, "health check");
    HealthResponse::ok(connected_players, live_matches)
}
