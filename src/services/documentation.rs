use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the penalty shootout server.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sse::presence_stream,
        crate::routes::websocket::ws_handler,
        crate::routes::matches::create_match,
        crate::routes::matches::list_matches,
        crate::routes::matches::get_match,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::ws::PlayerInboundMessage,
            crate::dto::ws::PlayerOutboundMessage,
            crate::dto::sse::Handshake,
            crate::dto::matches::CreateMatchRequest,
            crate::dto::matches::MatchSummary,
            crate::dto::matches::MatchListResponse,
            crate::dao::models::PlayerStatus,
            crate::state::state_machine::MatchPhase,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "sse", description = "Server-sent events streams"),
        (name = "players", description = "WebSocket operations for player clients"),
        (name = "matches", description = "Match rooms"),
    )
)]
pub struct ApiDoc;
