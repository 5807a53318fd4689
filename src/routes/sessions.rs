use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::game::{BoardDimensions, SessionError};
use crate::models::{GameSnapshot, MoveOutcome, Placement, SessionId};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub players: Vec<String>,
    pub rows: Option<usize>,
    pub cols: Option<usize>,
    pub max_stack_height: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateSessionResponse {
    pub session_id: SessionId,
}

/// HTTP status for an engine error
pub fn status_for(error: &SessionError) -> StatusCode {
    match error {
        SessionError::SessionNotFound(_) => StatusCode::NOT_FOUND,
        SessionError::SessionBusy(_) | SessionError::InvalidSessionState(_) => StatusCode::CONFLICT,
        SessionError::InvalidConfig(_) => StatusCode::BAD_REQUEST,
        SessionError::Board(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for SessionError {
    fn into_response(self) -> Response {
        let status = status_for(&self);
        if status.is_server_error() {
            tracing::error!("Session error: {}", self);
        } else {
            tracing::debug!("Session request refused: {}", self);
        }

        let retryable = matches!(self, SessionError::SessionBusy(_));
        (
            status,
            Json(json!({
                "error": self.to_string(),
                "retryable": retryable,
            })),
        )
            .into_response()
    }
}

/// Create a session; omitted board settings fall back to the configured rules
pub async fn create_session(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<CreateSessionResponse>), SessionError> {
    let defaults = state.sessions.rules();
    let dimensions = BoardDimensions {
        rows: payload.rows.unwrap_or(defaults.rows),
        cols: payload.cols.unwrap_or(defaults.cols),
    };
    let max_stack_height = payload
        .max_stack_height
        .unwrap_or(defaults.max_stack_height);

    tracing::info!(
        "Creating session for {} players on a {}x{} board",
        payload.players.len(),
        dimensions.rows,
        dimensions.cols
    );

    let session_id = state
        .sessions
        .create_session(payload.players, dimensions, max_stack_height)?;

    Ok((
        StatusCode::CREATED,
        Json(CreateSessionResponse { session_id }),
    ))
}

pub async fn get_state(
    State(state): State<Arc<AppState>>,
    Path(id): Path<SessionId>,
) -> Result<Json<GameSnapshot>, SessionError> {
    state.sessions.get_state(id).map(Json)
}

pub async fn submit_move(
    State(state): State<Arc<AppState>>,
    Path(id): Path<SessionId>,
    Json(placement): Json<Placement>,
) -> Result<Json<MoveOutcome>, SessionError> {
    tracing::info!("Move submitted to session {} ({} tiles)", id, placement.len());
    state.sessions.submit_move(id, &placement).map(Json)
}

pub async fn pass(
    State(state): State<Arc<AppState>>,
    Path(id): Path<SessionId>,
) -> Result<Json<MoveOutcome>, SessionError> {
    tracing::info!("Pass submitted to session {}", id);
    state.sessions.pass(id).map(Json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BoardError;
    use uuid::Uuid;

    #[test]
    fn test_status_mapping() {
        let id = Uuid::new_v4();
        assert_eq!(status_for(&SessionError::SessionNotFound(id)), StatusCode::NOT_FOUND);
        assert_eq!(status_for(&SessionError::SessionBusy(id)), StatusCode::CONFLICT);
        assert_eq!(
            status_for(&SessionError::InvalidSessionState("over".into())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_for(&SessionError::InvalidConfig("rows".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&SessionError::Board(BoardError::OutOfBounds { row: 1, col: 1 })),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_create_request_defaults() {
        let request: CreateSessionRequest =
            serde_json::from_str(r#"{"players": ["ada", "grace"]}"#).unwrap();
        assert_eq!(request.players.len(), 2);
        assert!(request.rows.is_none());
        assert!(request.max_stack_height.is_none());
    }

    #[test]
    fn test_placement_request_body() {
        let placement: Placement = serde_json::from_str(
            r#"{"tiles": [{"row": 4, "col": 3, "letter": "C"}, {"row": 4, "col": 4, "letter": "A"}]}"#,
        )
        .unwrap();
        assert_eq!(placement.len(), 2);
        assert_eq!(placement.tiles[1].letter, 'A');
    }
}
