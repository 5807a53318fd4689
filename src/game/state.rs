//! Turn state machine.
//!
//! Every change of a session's turn state goes through [`transition`], a pure
//! function of the current state and an event. Replaying the same events from
//! the same start always lands in the same state.

use serde::{Deserialize, Serialize};

use super::error::SessionError;
use crate::models::PlayerIndex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TurnState {
    WaitingForMove { player: PlayerIndex },
    Evaluating { player: PlayerIndex },
    TurnComplete { player: PlayerIndex },
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnEvent {
    Submit,
    Rejected,
    Accepted,
    Pass,
    Advance { next: PlayerIndex, game_over: bool },
}

impl TurnState {
    /// Player whose turn it is, if any
    pub fn player(&self) -> Option<PlayerIndex> {
        match *self {
            TurnState::WaitingForMove { player }
            | TurnState::Evaluating { player }
            | TurnState::TurnComplete { player } => Some(player),
            TurnState::GameOver => None,
        }
    }

    pub fn is_game_over(&self) -> bool {
        matches!(self, TurnState::GameOver)
    }
}

pub fn transition(state: TurnState, event: TurnEvent) -> Result<TurnState, SessionError> {
    use TurnEvent as E;
    use TurnState as S;

    match (state, event) {
        (S::WaitingForMove { player }, E::Submit) => Ok(S::Evaluating { player }),
        (S::WaitingForMove { player }, E::Pass) => Ok(S::TurnComplete { player }),
        (S::Evaluating { player }, E::Rejected) => Ok(S::WaitingForMove { player }),
        (S::Evaluating { player }, E::Accepted) => Ok(S::TurnComplete { player }),
        (S::TurnComplete { .. }, E::Advance { game_over: true, .. }) => Ok(S::GameOver),
        (S::TurnComplete { .. }, E::Advance { next, .. }) => {
            Ok(S::WaitingForMove { player: next })
        }
        (S::GameOver, _) => Err(SessionError::InvalidSessionState(
            "game is over; no further moves are accepted".to_string(),
        )),
        (state, event) => Err(SessionError::InvalidSessionState(format!(
            "cannot apply {event:?} while {state:?}"
        ))),
    }
}
