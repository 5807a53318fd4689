use crate::{
    game::{SessionError, SessionEvent},
    models::{Placement, SessionId},
    websocket::messages::{ClientMessage, ServerMessage},
    AppState,
};
use axum::{
    extract::{
        ws::{Message, WebSocket},
        Path, State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use futures::{sink::SinkExt, stream::StreamExt};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};

/// WebSocket upgrade handler for one session
pub async fn handle_websocket(
    ws: WebSocketUpgrade,
    Path(session_id): Path<SessionId>,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, SessionError> {
    // Subscribe before upgrading so an unknown session is a plain 404
    let events = state.sessions.subscribe(session_id)?;
    tracing::info!("WebSocket subscriber joining session {}", session_id);

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, session_id, events)))
}

/// Handle individual WebSocket connection
async fn handle_socket(
    socket: WebSocket,
    state: Arc<AppState>,
    session_id: SessionId,
    mut events: broadcast::Receiver<SessionEvent>,
) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::channel::<ServerMessage>(100);

    tracing::info!("WebSocket connection established for session {}", session_id);

    // Start the client off with the current state
    match state.sessions.get_state(session_id) {
        Ok(snapshot) => {
            let _ = tx.send(ServerMessage::State { snapshot }).await;
        }
        Err(e) => {
            let _ = tx
                .send(ServerMessage::Error {
                    message: e.to_string(),
                })
                .await;
        }
    }

    // Spawn a task to send direct replies and session events to the client
    let mut send_task = tokio::spawn(async move {
        loop {
            let msg = tokio::select! {
                direct = rx.recv() => match direct {
                    Some(msg) => msg,
                    None => break,
                },
                event = events.recv() => match event {
                    Ok(event) => ServerMessage::from(event),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!("WebSocket subscriber lagged, skipped {} events", skipped);
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
            };

            match serde_json::to_string(&msg) {
                Ok(json) => {
                    if sender.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!("Failed to serialize message: {}", e);
                }
            }
        }
    });

    // Handle incoming messages from the client
    let state_for_recv = state.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(client_msg) => {
                        if let Err(e) =
                            handle_client_message(client_msg, &state_for_recv, session_id, &tx).await
                        {
                            tracing::error!("Error handling message: {}", e);
                            let error_msg = ServerMessage::Error {
                                message: e.to_string(),
                            };
                            let _ = tx.send(error_msg).await;
                        }
                    }
                    Err(e) => {
                        tracing::error!("Failed to parse message: {}", e);
                        let error_msg = ServerMessage::Error {
                            message: format!("Invalid message format: {}", e),
                        };
                        let _ = tx.send(error_msg).await;
                    }
                },
                Message::Close(_) => {
                    tracing::info!("Client disconnected from session {}", session_id);
                    break;
                }
                _ => {}
            }
        }
    });

    // Wait for either task to finish
    tokio::select! {
        _ = (&mut send_task) => {
            recv_task.abort();
        }
        _ = (&mut recv_task) => {
            send_task.abort();
        }
    }

    tracing::info!("WebSocket connection closed for session {}", session_id);
}

/// Handle individual client messages. Move results reach every subscriber
/// through the session's event channel, including this one.
async fn handle_client_message(
    msg: ClientMessage,
    state: &AppState,
    session_id: SessionId,
    tx: &mpsc::Sender<ServerMessage>,
) -> anyhow::Result<()> {
    match msg {
        ClientMessage::SubmitMove { tiles } => {
            tracing::info!(
                "Session {} move submitted over WebSocket: {} tiles",
                session_id,
                tiles.len()
            );
            state
                .sessions
                .submit_move(session_id, &Placement::new(tiles))?;
        }
        ClientMessage::Pass => {
            tracing::info!("Session {} pass submitted over WebSocket", session_id);
            state.sessions.pass(session_id)?;
        }
        ClientMessage::GetState => {
            let snapshot = state.sessions.get_state(session_id)?;
            tx.send(ServerMessage::State { snapshot }).await?;
        }
    }

    Ok(())
}
