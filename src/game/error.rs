use thiserror::Error;

use crate::models::{BoardError, SessionId};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session {0} not found")]
    SessionNotFound(SessionId),

    #[error("session {0} is busy evaluating another move")]
    SessionBusy(SessionId),

    #[error("invalid session state: {0}")]
    InvalidSessionState(String),

    #[error("invalid session configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Board(#[from] BoardError),
}
