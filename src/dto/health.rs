use serde::Serialize;
use utoipa::ToSchema;

/// Simple health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status.
    pub status: String,
    /// Player sockets currently identified.
    pub connected_players: usize,
    /// Match rooms currently open.
    pub live_matches: usize,
}

impl HealthResponse {
    /// Create a health response indicating the system is operational.
    pub fn ok(connected_players: usize, live_matches: usize) -> Self {
        Self {
            status: "ok".to_string(),
            connected_players,
            live_matches,
        }
    }
}
