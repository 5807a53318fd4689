//! Board model: a fixed grid of tile stacks.
//!
//! Each cell owns a bounded stack of tiles, bottom to top. Only the top tile
//! is active and takes part in words; the tiles underneath are kept so a
//! cell's full letter history can always be read back.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use thiserror::Error;

/// Inline capacity of a cell stack. Taller configured stacks spill to the heap.
pub const INLINE_STACK: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    #[error("position ({row}, {col}) is outside the board")]
    OutOfBounds { row: usize, col: usize },

    #[error("stack at ({row}, {col}) is already at the maximum height of {max}")]
    StackOverflow { row: usize, col: usize, max: usize },

    #[error("board dimensions must be non-zero (got {rows}x{cols}, max height {max_height})")]
    InvalidDimensions {
        rows: usize,
        cols: usize,
        max_height: usize,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Hash, Eq, PartialEq, PartialOrd, Ord)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Step one cell along `direction`, backwards when `forward` is false.
    /// Returns `None` when the step leaves a `rows` x `cols` grid.
    pub fn step(self, direction: Direction, forward: bool, rows: usize, cols: usize) -> Option<Self> {
        let (dr, dc) = direction.delta();
        let (row, col) = if forward {
            (self.row + dr, self.col + dc)
        } else {
            (self.row.checked_sub(dr)?, self.col.checked_sub(dc)?)
        };

        (row < rows && col < cols).then_some(Self { row, col })
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Hash, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Horizontal,
    Vertical,
}

impl Direction {
    fn delta(self) -> (usize, usize) {
        match self {
            Direction::Horizontal => (0, 1),
            Direction::Vertical => (1, 0),
        }
    }

    pub fn perpendicular(self) -> Self {
        match self {
            Direction::Horizontal => Direction::Vertical,
            Direction::Vertical => Direction::Horizontal,
        }
    }

    /// Coordinate that varies along this direction
    pub fn along(self, pos: Position) -> usize {
        match self {
            Direction::Horizontal => pos.col,
            Direction::Vertical => pos.row,
        }
    }
}

/// A letter tile and the level it sits at (1 is the board surface).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq)]
pub struct Tile {
    pub letter: char,
    pub height: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct Cell {
    pub position: Position,
    pub tiles: SmallVec<[Tile; INLINE_STACK]>,
}

impl Cell {
    fn new(position: Position) -> Self {
        Self {
            position,
            tiles: SmallVec::new(),
        }
    }

    pub fn height(&self) -> usize {
        self.tiles.len()
    }

    pub fn active_letter(&self) -> Option<char> {
        self.tiles.last().map(|tile| tile.letter)
    }
}

/// Maximal contiguous run of active letters along one line.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct Word {
    pub text: String,
    pub direction: Direction,
    pub cells: Vec<Position>,
}

impl Word {
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Trace the run through `start` along `direction` using an arbitrary letter lookup.
/// Shared by the board itself and by move validation, which looks through
/// not-yet-applied tiles.
pub(crate) fn trace_word<F>(
    rows: usize,
    cols: usize,
    start: Position,
    direction: Direction,
    letter_at: F,
) -> Word
where
    F: Fn(Position) -> Option<char>,
{
    let mut word = Word {
        text: String::new(),
        direction,
        cells: Vec::new(),
    };

    if letter_at(start).is_none() {
        return word;
    }

    let mut first = start;
    while let Some(prev) = first.step(direction, false, rows, cols) {
        if letter_at(prev).is_none() {
            break;
        }
        first = prev;
    }

    let mut cursor = Some(first);
    while let Some(pos) = cursor {
        let Some(letter) = letter_at(pos) else {
            break;
        };
        word.text.push(letter);
        word.cells.push(pos);
        cursor = pos.step(direction, true, rows, cols);
    }

    word
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct Board {
    rows: usize,
    cols: usize,
    max_height: usize,
    cells: Vec<Vec<Cell>>,
}

impl Board {
    /// Create an empty board
    pub fn new(rows: usize, cols: usize, max_height: usize) -> Result<Self, BoardError> {
        if rows == 0 || cols == 0 || max_height == 0 {
            return Err(BoardError::InvalidDimensions {
                rows,
                cols,
                max_height,
            });
        }

        let cells = (0..rows)
            .map(|row| (0..cols).map(|col| Cell::new(Position { row, col })).collect())
            .collect();

        Ok(Self {
            rows,
            cols,
            max_height,
            cells,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn max_height(&self) -> usize {
        self.max_height
    }

    pub fn contains(&self, pos: Position) -> bool {
        pos.row < self.rows && pos.col < self.cols
    }

    fn cell(&self, pos: Position) -> Option<&Cell> {
        self.cells.get(pos.row).and_then(|row| row.get(pos.col))
    }

    /// Height of the stack at `pos`; zero for empty or off-board cells
    pub fn height_at(&self, pos: Position) -> usize {
        self.cell(pos).map_or(0, Cell::height)
    }

    pub fn active_letter_at(&self, pos: Position) -> Option<char> {
        self.cell(pos).and_then(Cell::active_letter)
    }

    pub fn is_occupied(&self, pos: Position) -> bool {
        self.height_at(pos) > 0
    }

    /// Every tile at `pos`, bottom to top
    pub fn stack_at(&self, pos: Position) -> &[Tile] {
        self.cell(pos)
            .map(|cell| cell.tiles.as_slice())
            .unwrap_or_default()
    }

    /// Push a letter onto the stack at `pos`, returning the new height
    pub fn place(&mut self, pos: Position, letter: char) -> Result<usize, BoardError> {
        let max = self.max_height;
        let cell = self
            .cells
            .get_mut(pos.row)
            .and_then(|row| row.get_mut(pos.col))
            .ok_or(BoardError::OutOfBounds {
                row: pos.row,
                col: pos.col,
            })?;

        if cell.height() >= max {
            return Err(BoardError::StackOverflow {
                row: pos.row,
                col: pos.col,
                max,
            });
        }

        let height = cell.height() + 1;
        cell.tiles.push(Tile { letter, height });
        Ok(height)
    }

    /// Maximal run of active letters through `pos` along `direction`
    pub fn word_at(&self, pos: Position, direction: Direction) -> Word {
        trace_word(self.rows, self.cols, pos, direction, |p| {
            self.active_letter_at(p)
        })
    }

    /// Orthogonal neighbours that lie on the board
    pub fn neighbors(&self, pos: Position) -> impl Iterator<Item = Position> + '_ {
        [Direction::Horizontal, Direction::Vertical]
            .into_iter()
            .flat_map(move |dir| {
                [
                    pos.step(dir, false, self.rows, self.cols),
                    pos.step(dir, true, self.rows, self.cols),
                ]
            })
            .flatten()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.iter().flatten().all(|cell| cell.height() == 0)
    }

    /// True when no cell can take another tile
    pub fn is_full(&self) -> bool {
        self.cells
            .iter()
            .flatten()
            .all(|cell| cell.height() >= self.max_height)
    }

    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter().flatten()
    }

    /// Active letters row by row, `.` for empty cells
    pub fn render(&self) -> String {
        self.cells
            .iter()
            .map(|row| {
                row.iter()
                    .map(|cell| cell.active_letter().unwrap_or('.'))
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
