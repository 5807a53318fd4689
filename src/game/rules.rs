use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::models::Position;

/// Where the opening placement of a game may go
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FirstMoveRule {
    /// Anywhere on the board
    #[default]
    Anywhere,
    /// Must cover one of the central cells
    CoverCenter,
}

impl FromStr for FirstMoveRule {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "anywhere" => Ok(FirstMoveRule::Anywhere),
            "center" | "cover_center" => Ok(FirstMoveRule::CoverCenter),
            other => Err(format!("unknown first move rule: {other}")),
        }
    }
}

/// Tunable rules for a session. Defaults follow the boxed Upwords game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRules {
    pub rows: usize,
    pub cols: usize,
    pub max_stack_height: usize,
    /// Largest row or column count a session may ask for
    pub max_board_side: usize,
    /// Largest stack height a session may ask for
    pub stack_height_cap: usize,
    /// Deal racks from a tile bag and only allow letters the mover holds
    pub racks_enabled: bool,
    pub rack_size: usize,
    /// Added when a move uses a full rack
    pub all_tiles_bonus: i32,
    /// Added per word formed beyond the primary one
    pub perpendicular_word_bonus: i32,
    /// Accepted placements after which the game ends
    pub move_limit: Option<usize>,
    pub first_move_rule: FirstMoveRule,
    pub max_players: usize,
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            rows: 10,
            cols: 10,
            max_stack_height: 5,
            max_board_side: 20,
            stack_height_cap: 10,
            racks_enabled: false,
            rack_size: 7,
            all_tiles_bonus: 20,
            perpendicular_word_bonus: 1,
            move_limit: None,
            first_move_rule: FirstMoveRule::Anywhere,
            max_players: 4,
        }
    }
}

impl GameRules {
    /// Board dimensions and stack height must lie within `1..=` their caps
    pub fn check_board_limits(&self) -> Result<(), String> {
        for (name, value, cap) in [
            ("rows", self.rows, self.max_board_side),
            ("cols", self.cols, self.max_board_side),
            ("max_stack_height", self.max_stack_height, self.stack_height_cap),
        ] {
            if value == 0 || value > cap {
                return Err(format!("{name} must be between 1 and {cap}, got {value}"));
            }
        }
        Ok(())
    }

    /// The middle cells of the board: 2x2 on even sides, 1x1 on odd ones
    pub fn center_cells(&self) -> Vec<Position> {
        let rows = center_span(self.rows);
        let cols = center_span(self.cols);

        rows.flat_map(|row| cols.clone().map(move |col| Position::new(row, col)))
            .collect()
    }
}

fn center_span(len: usize) -> std::ops::RangeInclusive<usize> {
    if len % 2 == 0 {
        (len / 2).saturating_sub(1)..=len / 2
    } else {
        len / 2..=len / 2
    }
}
