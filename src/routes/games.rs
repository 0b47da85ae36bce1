use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    dto::game::{GameHistoryResponse, GameInfo},
    error::AppError,
    services::game_service,
    state::SharedState,
};

/// Read-only game lookups.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/games/history", get(game_history))
        .route("/games/{id}", get(game_info))
}

/// Optional bound on the history listing.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct HistoryQuery {
    /// Maximum number of games returned.
    pub limit: Option<usize>,
}

/// List recently finished games, newest first, secrets included.
#[utoipa::path(
    get,
    path = "/games/history",
    tag = "game",
    params(HistoryQuery),
    responses(
        (status = 200, description = "Recently finished games", body = GameHistoryResponse)
    )
)]
pub async fn game_history(
    State(state): State<SharedState>,
    Query(query): Query<HistoryQuery>,
) -> Json<GameHistoryResponse> {
    Json(game_service::recent_games(&state, query.limit))
}

/// Fetch the public view of a game.
#[utoipa::path(
    get,
    path = "/games/{id}",
    tag = "game",
    params(("id" = String, Path, description = "Game identifier")),
    responses(
        (status = 200, description = "Current game state", body = GameInfo),
        (status = 404, description = "Game not found")
    )
)]
pub async fn game_info(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<GameInfo>, AppError> {
    let info = game_service::game_info(&state, &id).await?;
    Ok(Json(info))
}
