use serde::{Deserialize, Serialize};

use crate::game::SessionEvent;
use crate::models::{GameSnapshot, MoveOutcome, PlayerIndex, TilePlacement};

/// Messages sent from client to server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    SubmitMove { tiles: Vec<TilePlacement> },
    Pass,
    GetState,
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    State {
        snapshot: GameSnapshot,
    },
    MoveResult {
        player: PlayerIndex,
        outcome: MoveOutcome,
        snapshot: GameSnapshot,
    },
    GameOver {
        winner: Option<PlayerIndex>,
        final_scores: Vec<ScoreInfo>,
    },
    Error {
        message: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScoreInfo {
    pub player: PlayerIndex,
    pub name: String,
    pub score: i32,
}

impl ScoreInfo {
    pub fn from_snapshot(snapshot: &GameSnapshot) -> Vec<Self> {
        snapshot
            .players
            .iter()
            .enumerate()
            .map(|(player, p)| ScoreInfo {
                player,
                name: p.name.clone(),
                score: p.score,
            })
            .collect()
    }
}

impl From<SessionEvent> for ServerMessage {
    fn from(event: SessionEvent) -> Self {
        match event {
            SessionEvent::MoveResolved {
                player,
                outcome,
                snapshot,
            } => ServerMessage::MoveResult {
                player,
                outcome,
                snapshot,
            },
            SessionEvent::GameOver { winner, snapshot } => ServerMessage::GameOver {
                winner,
                final_scores: ScoreInfo::from_snapshot(&snapshot),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_client_message_format() {
        let msg: ClientMessage = serde_json::from_value(json!({
            "type": "submit_move",
            "tiles": [{"row": 4, "col": 3, "letter": "C"}]
        }))
        .unwrap();
        match msg {
            ClientMessage::SubmitMove { tiles } => assert_eq!(tiles[0].letter, 'C'),
            other => panic!("unexpected message {other:?}"),
        }

        let pass: ClientMessage = serde_json::from_value(json!({"type": "pass"})).unwrap();
        assert!(matches!(pass, ClientMessage::Pass));
    }

    #[test]
    fn test_error_message_format() {
        let value = serde_json::to_value(ServerMessage::Error {
            message: "nope".to_string(),
        })
        .unwrap();
        assert_eq!(value, json!({"type": "error", "message": "nope"}));
    }
}
