// Game engine modules

pub mod error;
pub mod manager;
pub mod rules;
pub mod scorer;
pub mod session;
pub mod state;
pub mod tiles;
pub mod validator;

pub use error::SessionError;
pub use manager::{BoardDimensions, SessionEvent, SessionManager};
pub use rules::{FirstMoveRule, GameRules};
pub use scorer::Scorer;
pub use session::GameSession;
pub use state::{TurnEvent, TurnState};
pub use tiles::TileBag;
pub use validator::{AcceptedMove, MoveValidator, RejectionReason};
