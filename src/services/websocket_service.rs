use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    dto::ws::ClientMessage,
    error::ServiceError,
    services::{
        game_events,
        game_service::{self, AgentTurns},
    },
    state::{PlayerConnection, SharedState},
};

/// The writer task of a connection has stopped; the socket is gone.
#[derive(Debug, Error)]
#[error("connection closed")]
pub struct ConnectionClosed;

/// Handle the full lifecycle of a player WebSocket connection.
pub async fn handle_socket(state: SharedState, socket: WebSocket) {
    let (mut sender, mut receiver) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Message>();

    // Dedicated writer task keeps outbound messages flowing even while we await inbound frames.
    let writer_task = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            if sender.send(message).await.is_err() {
                break;
            }
        }
    });

    let player_id = Uuid::new_v4().simple().to_string();
    state.connect(PlayerConnection {
        id: player_id.clone(),
        tx: outbound_tx.clone(),
    });
    info!(player = %player_id, "player connected");
    game_events::send_connected(&state, &player_id);

    while let Some(message) = receiver.next().await {
        match message {
            Ok(Message::Text(text)) => {
                debug!(player = %player_id, payload = %text, "received player message");

                match ClientMessage::from_json_str(&text) {
                    Ok(message) => {
                        if let Err(err) = dispatch(&state, &player_id, message).await {
                            warn!(player = %player_id, error = %err, "request rejected");
                            game_events::send_error(&state, &player_id, &err.to_string());
                        }
                    }
                    Err(err) => {
                        warn!(player = %player_id, error = %err, "failed to parse player message");
                        game_events::send_error(&state, &player_id, "malformed message");
                    }
                }
            }
            Ok(Message::Ping(payload)) => {
                let _ = outbound_tx.send(Message::Pong(payload));
            }
            Ok(Message::Close(frame)) => {
                info!(player = %player_id, "player closed socket");
                let _ = outbound_tx.send(Message::Close(frame));
                break;
            }
            Ok(Message::Binary(_)) => {}
            Ok(Message::Pong(_)) => {}
            Err(err) => {
                warn!(player = %player_id, error = %err, "websocket error");
                break;
            }
        }
    }

    game_service::disconnect(&state, &player_id).await;
    info!(player = %player_id, "player disconnected");

    finalize(writer_task, outbound_tx).await;
}

async fn dispatch(
    state: &SharedState,
    player_id: &str,
    message: ClientMessage,
) -> Result<(), ServiceError> {
    match message {
        ClientMessage::StartAiGame(options) => {
            let digit_count = options.and_then(|options| options.digit_count());
            let difficulty = options.and_then(|options| options.difficulty());
            game_service::start_agent_game(state, player_id, digit_count, difficulty.map(Into::into))
                .await?;
        }
        ClientMessage::RestartGame => {
            game_service::restart_game(state, player_id, None).await?;
        }
        ClientMessage::CreateGame(digit_count) => {
            game_service::create_two_player_game(state, player_id, digit_count).await?;
        }
        ClientMessage::JoinGame(game_id) => {
            game_service::join_game(state, player_id, &game_id).await?;
        }
        ClientMessage::SetSecret(secret) => {
            game_service::set_secret(state, player_id, secret).await?;
        }
        ClientMessage::MakeGuess(guess) => {
            game_service::make_guess(state, player_id, None, guess, AgentTurns::Scheduled).await?;
        }
        ClientMessage::LeaveGame => {
            game_service::leave_game(state, player_id).await?;
        }
    }
    Ok(())
}

/// Serialize a payload and push it onto the provided WebSocket sender.
///
/// Serialization failures are logged and swallowed; only a closed writer is reported.
pub fn send_message_to_websocket<T>(
    tx: &mpsc::UnboundedSender<Message>,
    value: &T,
) -> Result<(), ConnectionClosed>
where
    T: ?Sized + serde::Serialize + std::fmt::Debug,
{
    let payload = match serde_json::to_string(value) {
        Ok(p) => p,
        Err(err) => {
            warn!(error = %err, "failed to serialize message `{value:?}`");
            return Ok(());
        }
    };

    tx.send(Message::Text(payload.into()))
        .map_err(|_| ConnectionClosed)
}

/// Ensure the writer task winds down before we return from the socket handler.
async fn finalize(writer_task: JoinHandle<()>, outbound_tx: mpsc::UnboundedSender<Message>) {
    drop(outbound_tx);
    let _ = writer_task.await;
}
