use axum::{Json, Router, body::Bytes, extract::State, routing::post};

use crate::{
    dto::action::{ActionRequest, ActionResponse},
    error::AppError,
    services::action_service,
    state::SharedState,
};

/// Routes of the request/response binding.
pub fn router() -> Router<SharedState> {
    Router::new().route("/api/action", post(action))
}

/// Run a named game action (`startAIGame`, `makeGuess`).
#[utoipa::path(
    post,
    path = "/api/action",
    tag = "game",
    request_body = ActionRequest,
    responses(
        (status = 200, description = "Action applied", body = ActionResponse),
        (status = 400, description = "Malformed body, invalid input or refused action", body = ActionResponse),
        (status = 404, description = "Game not found", body = ActionResponse)
    )
)]
pub async fn action(
    State(state): State<SharedState>,
    body: Bytes,
) -> Result<Json<ActionResponse>, AppError> {
    // Parsed by hand so malformed bodies get the same envelope as every other failure.
    let request: ActionRequest = serde_json::from_slice(&body)?;
    let response = action_service::handle_action(&state, request).await?;
    Ok(Json(response))
}
