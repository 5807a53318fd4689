pub mod board;
pub mod game;

pub use board::{Board, BoardError, Cell, Direction, Position, Tile, Word};
pub use game::{
    GameSnapshot, MoveOutcome, MoveRecord, Placement, Player, PlayerIndex, SessionId,
    TilePlacement,
};
