/// Request/response action dispatch.
pub mod action_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Named events pushed to game members.
pub mod game_events;
/// Periodic cleanup of finished games.
pub mod game_reaper;
/// Game orchestration: lifecycle, guesses and agent turns.
pub mod game_service;
/// Health check service.
pub mod health_service;
/// WebSocket connection and message handling service.
pub mod websocket_service;
