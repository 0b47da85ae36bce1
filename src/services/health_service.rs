use crate::{dto::health::HealthResponse, state::SharedState};

/// Report liveness together with the in-memory load.
pub fn health_status(state: &SharedState) -> HealthResponse {
    HealthResponse::ok(
        state.registry().game_count(),
        state.connections().len(),
    )
}
