use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use axum_valid::Valid;
use uuid::Uuid;

use crate::{
    dto::matches::{CreateMatchRequest, MatchListResponse, MatchSummary},
    error::AppError,
    services::match_service,
    state::SharedState,
};

/// Match room endpoints used by the matchmaker and by dashboards.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/matches", get(list_matches).post(create_match))
        .route("/matches/{room_id}", get(get_match))
}

/// Seat two connected players in a new match and start it.
#[utoipa::path(
    post,
    path = "/matches",
    tag = "matches",
    request_body = CreateMatchRequest,
    responses(
        (status = 201, description = "Match started", body = MatchSummary),
        (status = 400, description = "Both ids designate the same player"),
        (status = 404, description = "A player is not connected"),
        (status = 409, description = "A player is already in a match")
    )
)]
pub async fn create_match(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<CreateMatchRequest>>,
) -> Result<(StatusCode, Json<MatchSummary>), AppError> {
    let summary = match_service::create_match(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(summary)))
}

/// List every live match.
#[utoipa::path(
    get,
    path = "/matches",
    tag = "matches",
    responses((status = 200, description = "Live matches", body = MatchListResponse))
)]
pub async fn list_matches(State(state): State<SharedState>) -> Json<MatchListResponse> {
    Json(match_service::list_matches(&state).await)
}

/// Retrieve a live match by its room identifier.
#[utoipa::path(
    get,
    path = "/matches/{room_id}",
    tag = "matches",
    params(("room_id" = Uuid, Path, description = "Identifier of the match room")),
    responses(
        (status = 200, description = "Match", body = MatchSummary),
        (status = 404, description = "No such live match")
    )
)]
pub async fn get_match(
    State(state): State<SharedState>,
    Path(room_id): Path<Uuid>,
) -> Result<Json<MatchSummary>, AppError> {
    Ok(Json(match_service::get_match(&state, room_id).await?))
}
