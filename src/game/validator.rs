use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

use super::rules::{FirstMoveRule, GameRules};
use super::tiles::take_from_rack;
use crate::dictionary::Dictionary;
use crate::models::board::trace_word;
use crate::models::{Board, Direction, Placement, Position, TilePlacement, Word};
use crate::utils::letters::normalize_letter;

/// Why a placement was turned down. The session stays on the same player.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum RejectionReason {
    #[error("placement has no tiles")]
    EmptyPlacement,

    #[error("{letter:?} is not a playable letter")]
    InvalidLetter { letter: char },

    #[error("({row}, {col}) is outside the board")]
    OutOfBounds { row: usize, col: usize },

    #[error("({row}, {col}) is used more than once")]
    DuplicateCell { row: usize, col: usize },

    #[error("letter {letter} is not in the player's rack")]
    NotInRack { letter: char },

    #[error("tiles must lie in a single row or column")]
    NotSingleLine,

    #[error("tiles must form one unbroken run")]
    NotContiguous,

    #[error("placement must touch or cover an existing tile")]
    NotConnected,

    #[error("stack at ({row}, {col}) is already at maximum height")]
    StackOverflow { row: usize, col: usize },

    #[error("{word:?} is not a valid word")]
    InvalidWord { word: String },

    #[error("stacking the same letter at ({row}, {col}) changes nothing")]
    NoOpStack { row: usize, col: usize },
}

/// A tile as it will sit once the move is applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedTile {
    pub position: Position,
    pub letter: char,
    pub height: usize,
}

/// A placement that passed every rule, ready to apply and score
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedMove {
    pub tiles: Vec<PlacedTile>,
    /// Primary word first, then perpendicular words
    pub words: Vec<Word>,
    pub uses_full_rack: bool,
}

impl AcceptedMove {
    pub fn placement(&self) -> Placement {
        Placement::new(
            self.tiles
                .iter()
                .map(|tile| TilePlacement {
                    position: tile.position,
                    letter: tile.letter,
                })
                .collect(),
        )
    }
}

pub struct MoveValidator<'a> {
    dictionary: &'a Dictionary,
    rules: &'a GameRules,
}

impl<'a> MoveValidator<'a> {
    pub fn new(dictionary: &'a Dictionary, rules: &'a GameRules) -> Self {
        Self { dictionary, rules }
    }

    /// Check a placement against the board without touching it.
    /// `rack` is the mover's hand when racks are in play.
    pub fn validate(
        &self,
        board: &Board,
        placement: &Placement,
        rack: Option<&[char]>,
    ) -> Result<AcceptedMove, RejectionReason> {
        let tiles = Self::normalize(board, placement)?;

        if let Some(rack) = rack {
            let letters: Vec<char> = tiles.iter().map(|tile| tile.letter).collect();
            take_from_rack(&mut rack.to_vec(), &letters)
                .map_err(|letter| RejectionReason::NotInRack { letter })?;
        }

        let direction = Self::line_direction(&tiles)?;
        Self::check_contiguous(board, &tiles, direction)?;
        self.check_connected(board, &tiles)?;
        Self::check_stack_limit(board, &tiles)?;
        let words = self.check_words(board, &tiles, direction)?;
        Self::check_changes_letters(board, &tiles)?;

        let placed = tiles
            .iter()
            .map(|tile| PlacedTile {
                position: tile.position,
                letter: tile.letter,
                height: board.height_at(tile.position) + 1,
            })
            .collect();

        tracing::debug!(
            "Placement accepted with words {:?}",
            words.iter().map(|w| w.text.as_str()).collect::<Vec<_>>()
        );

        Ok(AcceptedMove {
            tiles: placed,
            words,
            uses_full_rack: rack.is_some_and(|rack| tiles.len() == rack.len()),
        })
    }

    /// Uppercase letters and catch malformed input before the rules run
    fn normalize(board: &Board, placement: &Placement) -> Result<Vec<TilePlacement>, RejectionReason> {
        if placement.is_empty() {
            return Err(RejectionReason::EmptyPlacement);
        }

        let mut seen = HashSet::new();
        placement
            .tiles
            .iter()
            .map(|tile| {
                let letter = normalize_letter(tile.letter)
                    .ok_or(RejectionReason::InvalidLetter { letter: tile.letter })?;
                let Position { row, col } = tile.position;
                if !board.contains(tile.position) {
                    return Err(RejectionReason::OutOfBounds { row, col });
                }
                if !seen.insert(tile.position) {
                    return Err(RejectionReason::DuplicateCell { row, col });
                }
                Ok(TilePlacement {
                    position: tile.position,
                    letter,
                })
            })
            .collect()
    }

    /// The shared line of the tiles. `None` for a lone tile, whose direction
    /// is decided by the words it forms.
    fn line_direction(tiles: &[TilePlacement]) -> Result<Option<Direction>, RejectionReason> {
        let first = tiles[0].position;
        if tiles.len() == 1 {
            return Ok(None);
        }

        if tiles.iter().all(|tile| tile.position.row == first.row) {
            Ok(Some(Direction::Horizontal))
        } else if tiles.iter().all(|tile| tile.position.col == first.col) {
            Ok(Some(Direction::Vertical))
        } else {
            Err(RejectionReason::NotSingleLine)
        }
    }

    fn check_contiguous(
        board: &Board,
        tiles: &[TilePlacement],
        direction: Option<Direction>,
    ) -> Result<(), RejectionReason> {
        let Some(direction) = direction else {
            return Ok(());
        };

        let placed: HashSet<usize> = tiles
            .iter()
            .map(|tile| direction.along(tile.position))
            .collect();
        let start = placed.iter().copied().min().unwrap_or_default();
        let end = placed.iter().copied().max().unwrap_or_default();
        let anchor = tiles[0].position;

        let gap = (start..=end).any(|offset| {
            let pos = match direction {
                Direction::Horizontal => Position::new(anchor.row, offset),
                Direction::Vertical => Position::new(offset, anchor.col),
            };
            !placed.contains(&offset) && !board.is_occupied(pos)
        });

        if gap {
            Err(RejectionReason::NotContiguous)
        } else {
            Ok(())
        }
    }

    fn check_connected(&self, board: &Board, tiles: &[TilePlacement]) -> Result<(), RejectionReason> {
        if board.is_empty() {
            return match self.rules.first_move_rule {
                FirstMoveRule::Anywhere => Ok(()),
                FirstMoveRule::CoverCenter => {
                    let center = self.rules.center_cells();
                    if tiles.iter().any(|tile| center.contains(&tile.position)) {
                        Ok(())
                    } else {
                        Err(RejectionReason::NotConnected)
                    }
                }
            };
        }

        let connected = tiles.iter().any(|tile| {
            board.is_occupied(tile.position)
                || board
                    .neighbors(tile.position)
                    .any(|near| board.is_occupied(near))
        });

        if connected {
            Ok(())
        } else {
            Err(RejectionReason::NotConnected)
        }
    }

    fn check_stack_limit(board: &Board, tiles: &[TilePlacement]) -> Result<(), RejectionReason> {
        match tiles
            .iter()
            .find(|tile| board.height_at(tile.position) >= board.max_height())
        {
            Some(tile) => Err(RejectionReason::StackOverflow {
                row: tile.position.row,
                col: tile.position.col,
            }),
            None => Ok(()),
        }
    }

    /// Trace every word the placement forms or changes, as if it were applied
    fn check_words(
        &self,
        board: &Board,
        tiles: &[TilePlacement],
        direction: Option<Direction>,
    ) -> Result<Vec<Word>, RejectionReason> {
        let overlay: HashMap<Position, char> = tiles
            .iter()
            .map(|tile| (tile.position, tile.letter))
            .collect();
        let letter_at = |pos: Position| {
            overlay
                .get(&pos)
                .copied()
                .or_else(|| board.active_letter_at(pos))
        };
        let trace = |pos: Position, dir: Direction| {
            trace_word(board.rows(), board.cols(), pos, dir, &letter_at)
        };

        let anchor = tiles[0].position;
        let direction = direction.unwrap_or_else(|| {
            if trace(anchor, Direction::Horizontal).len() >= 2 {
                Direction::Horizontal
            } else {
                Direction::Vertical
            }
        });

        let primary = trace(anchor, direction);
        let mut words = Vec::with_capacity(tiles.len() + 1);
        let primary_text = primary.text.clone();
        if primary.len() >= 2 {
            words.push(primary);
        }

        for tile in tiles {
            let cross = trace(tile.position, direction.perpendicular());
            if cross.len() >= 2 {
                words.push(cross);
            }
        }

        if words.is_empty() {
            return Err(RejectionReason::InvalidWord { word: primary_text });
        }

        if let Some(bad) = words.iter().find(|word| !self.dictionary.is_valid(&word.text)) {
            tracing::debug!("Rejected word {}", bad.text);
            return Err(RejectionReason::InvalidWord {
                word: bad.text.clone(),
            });
        }

        Ok(words)
    }

    fn check_changes_letters(board: &Board, tiles: &[TilePlacement]) -> Result<(), RejectionReason> {
        match tiles
            .iter()
            .find(|tile| board.active_letter_at(tile.position) == Some(tile.letter))
        {
            Some(tile) => Err(RejectionReason::NoOpStack {
                row: tile.position.row,
                col: tile.position.col,
            }),
            None => Ok(()),
        }
    }
}
