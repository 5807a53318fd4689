use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::game::{validator::RejectionReason, TurnState};
use crate::models::board::{Board, Direction, Position, Word};

pub type SessionId = Uuid;

/// Seat index of a player within a session
pub type PlayerIndex = usize;

/// One tile a player wants to put down this turn
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq)]
pub struct TilePlacement {
    #[serde(flatten)]
    pub position: Position,
    pub letter: char,
}

/// A turn's proposed tiles, in the order the player laid them
#[derive(Debug, Clone, Default, Serialize, Deserialize, Eq, PartialEq)]
pub struct Placement {
    pub tiles: Vec<TilePlacement>,
}

impl Placement {
    pub fn new(tiles: Vec<TilePlacement>) -> Self {
        Self { tiles }
    }

    /// Lay `letters` in consecutive cells starting at `start`.
    /// Bounds are checked by the validator, not here.
    pub fn line(start: Position, direction: Direction, letters: &str) -> Self {
        let tiles = letters
            .chars()
            .enumerate()
            .map(|(offset, letter)| {
                let position = match direction {
                    Direction::Horizontal => Position::new(start.row, start.col + offset),
                    Direction::Vertical => Position::new(start.row + offset, start.col),
                };
                TilePlacement { position, letter }
            })
            .collect();

        Self { tiles }
    }

    pub fn single(position: Position, letter: char) -> Self {
        Self {
            tiles: vec![TilePlacement { position, letter }],
        }
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        self.tiles.iter().map(|tile| tile.position)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct Player {
    pub name: String,
    pub score: i32,
    /// Letters in hand. Always empty when racks are disabled.
    pub rack: Vec<char>,
}

impl Player {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            score: 0,
            rack: Vec::new(),
        }
    }
}

/// An accepted placement as recorded in the move history
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct MoveRecord {
    pub player: PlayerIndex,
    pub placement: Placement,
    pub score: i32,
    pub words: Vec<String>,
    pub played_at: DateTime<Utc>,
}

/// Read-only view of a session handed to the presentation layer
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct GameSnapshot {
    pub session_id: SessionId,
    pub board: Board,
    pub players: Vec<Player>,
    pub current_player: Option<PlayerIndex>,
    pub turn: TurnState,
    pub game_over: bool,
    pub winner: Option<PlayerIndex>,
    pub move_count: usize,
    pub tiles_in_bag: usize,
    pub created_at: DateTime<Utc>,
}

/// Result of a submitted move or a pass
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
#[serde(into = "MoveOutcomeBody", try_from = "MoveOutcomeBody")]
pub enum MoveOutcome {
    Accepted {
        score_delta: i32,
        words_formed: Vec<Word>,
    },
    Rejected {
        reason: RejectionReason,
    },
}

impl MoveOutcome {
    pub fn passed() -> Self {
        MoveOutcome::Accepted {
            score_delta: 0,
            words_formed: Vec::new(),
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, MoveOutcome::Accepted { .. })
    }
}

/// Wire shape: `{accepted: true, score_delta, words_formed}` or `{accepted: false, reason}`
#[derive(Debug, Clone, Serialize, Deserialize)]
struct MoveOutcomeBody {
    accepted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    score_delta: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    words_formed: Option<Vec<Word>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reason: Option<RejectionReason>,
}

impl From<MoveOutcome> for MoveOutcomeBody {
    fn from(outcome: MoveOutcome) -> Self {
        match outcome {
            MoveOutcome::Accepted {
                score_delta,
                words_formed,
            } => Self {
                accepted: true,
                score_delta: Some(score_delta),
                words_formed: Some(words_formed),
                reason: None,
            },
            MoveOutcome::Rejected { reason } => Self {
                accepted: false,
                score_delta: None,
                words_formed: None,
                reason: Some(reason),
            },
        }
    }
}

impl TryFrom<MoveOutcomeBody> for MoveOutcome {
    type Error = String;

    fn try_from(body: MoveOutcomeBody) -> Result<Self, Self::Error> {
        if body.accepted {
            Ok(MoveOutcome::Accepted {
                score_delta: body.score_delta.unwrap_or_default(),
                words_formed: body.words_formed.unwrap_or_default(),
            })
        } else {
            body.reason
                .map(|reason| MoveOutcome::Rejected { reason })
                .ok_or_else(|| "rejected outcome is missing a reason".to_string())
        }
    }
}
