use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Baseball Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::action::action,
        crate::routes::games::game_info,
        crate::routes::games::game_history,
        crate::routes::websocket::ws_handler,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::action::ActionRequest,
            crate::dto::action::ActionResponse,
            crate::dto::action::StartAgentGameInput,
            crate::dto::action::MakeGuessInput,
            crate::dto::action::RestartGameInput,
            crate::dto::game::DifficultyDto,
            crate::dto::game::GameInfo,
            crate::dto::game::FinishedGameDto,
            crate::dto::game::GameHistoryResponse,
            crate::dto::game::GuessResultDto,
            crate::dto::ws::ConnectedPayload,
            crate::dto::ws::GameStartedPayload,
            crate::dto::ws::PlayerJoinedPayload,
            crate::dto::ws::SecretSetPayload,
            crate::dto::ws::GuessResultPayload,
            crate::dto::ws::AgentGuessPayload,
            crate::dto::ws::GameOverPayload,
            crate::dto::ws::PlayerLeftPayload,
            crate::dto::ws::ErrorPayload,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "game", description = "Request/response game actions and lookups"),
        (name = "players", description = "WebSocket sessions for players"),
    )
)]
pub struct ApiDoc;
