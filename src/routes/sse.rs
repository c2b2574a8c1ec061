use std::convert::Infallible;

use axum::{Router, extract::State, response::sse::Sse, routing::get};
use futures::Stream;
use tracing::info;

use crate::{services::sse_service, state::SharedState};

#[utoipa::path(
    get,
    path = "/sse/presence",
    tag = "sse",
    responses((status = 200, description = "Player presence SSE stream", content_type = "text/event-stream", body = String))
)]
/// Stream player presence changes (`status_update`) to dashboards.
pub async fn presence_stream(
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = Result<axum::response::sse::Event, Infallible>>> {
    let receiver = sse_service::subscribe_presence(&state);
    info!("New presence SSE connection");
    sse_service::broadcast_presence_handshake(
        state.presence_sse(),
        state.connections().connected_count(),
    );
    sse_service::to_sse_stream(receiver)
}

/// Configure the SSE endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/sse/presence", get(presence_stream))
}
