use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

use super::error::SessionError;
use super::rules::GameRules;
use super::scorer::Scorer;
use super::state::{transition, TurnEvent, TurnState};
use super::tiles::{take_from_rack, TileBag};
use super::validator::MoveValidator;
use crate::dictionary::Dictionary;
use crate::models::{
    Board, BoardError, GameSnapshot, MoveOutcome, MoveRecord, Placement, Player, PlayerIndex,
    SessionId,
};

/// One game: board, players, turn state and history.
///
/// All mutation goes through [`GameSession::submit`] and [`GameSession::pass`];
/// a rejected placement leaves every field as it was.
pub struct GameSession {
    id: SessionId,
    rules: GameRules,
    dictionary: Arc<Dictionary>,
    board: Board,
    players: Vec<Player>,
    state: TurnState,
    history: Vec<MoveRecord>,
    consecutive_passes: usize,
    bag: Option<TileBag>,
    created_at: DateTime<Utc>,
    turn_started_at: Instant,
    finished_at: Option<Instant>,
}

impl GameSession {
    /// Start a session with an empty board. `seed` shuffles the tile bag when
    /// racks are enabled.
    #[instrument(skip(dictionary, rules), fields(players = player_names.len()))]
    pub fn new(
        id: SessionId,
        player_names: Vec<String>,
        rules: GameRules,
        dictionary: Arc<Dictionary>,
        seed: u64,
    ) -> Result<Self, SessionError> {
        if player_names.is_empty() || player_names.len() > rules.max_players {
            return Err(SessionError::InvalidConfig(format!(
                "a session needs between 1 and {} players, got {}",
                rules.max_players,
                player_names.len()
            )));
        }

        rules
            .check_board_limits()
            .map_err(SessionError::InvalidConfig)?;

        let board = Board::new(rules.rows, rules.cols, rules.max_stack_height).map_err(
            |e| match e {
                BoardError::InvalidDimensions { .. } => SessionError::InvalidConfig(e.to_string()),
                other => SessionError::Board(other),
            },
        )?;

        let mut players: Vec<Player> = player_names.into_iter().map(Player::new).collect();

        let bag = if rules.racks_enabled {
            let mut bag = TileBag::shuffled(seed);
            for player in &mut players {
                player.rack = bag.draw(rules.rack_size);
            }
            Some(bag)
        } else {
            None
        };

        info!(
            session_id = %id,
            rows = rules.rows,
            cols = rules.cols,
            max_stack_height = rules.max_stack_height,
            "Created game session"
        );

        Ok(Self {
            id,
            rules,
            dictionary,
            board,
            players,
            state: TurnState::WaitingForMove { player: 0 },
            history: Vec::new(),
            consecutive_passes: 0,
            bag,
            created_at: Utc::now(),
            turn_started_at: Instant::now(),
            finished_at: None,
        })
    }

    /// Replace the tile bag, re-dealing every rack from it
    pub fn with_bag(mut self, mut bag: TileBag) -> Self {
        if self.rules.racks_enabled {
            for player in &mut self.players {
                player.rack = bag.draw(self.rules.rack_size);
            }
            self.bag = Some(bag);
        }
        self
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    pub fn history(&self) -> &[MoveRecord] {
        &self.history
    }

    pub fn rules(&self) -> &GameRules {
        &self.rules
    }

    pub fn is_game_over(&self) -> bool {
        self.state.is_game_over()
    }

    pub fn current_player(&self) -> Option<PlayerIndex> {
        self.state.player()
    }

    fn waiting_player(&self) -> Result<PlayerIndex, SessionError> {
        match self.state {
            TurnState::WaitingForMove { player } => Ok(player),
            TurnState::GameOver => Err(SessionError::InvalidSessionState(
                "game is over; no further moves are accepted".to_string(),
            )),
            other => Err(SessionError::InvalidSessionState(format!(
                "session is not waiting for a move ({other:?})"
            ))),
        }
    }

    /// Validate a placement and, if it holds, apply it and end the turn.
    /// A rule violation comes back as `Ok(MoveOutcome::Rejected)`.
    #[instrument(skip(self, placement), fields(session_id = %self.id, tiles = placement.len()))]
    pub fn submit(&mut self, placement: &Placement) -> Result<MoveOutcome, SessionError> {
        let player = self.waiting_player()?;
        let evaluating = transition(self.state, TurnEvent::Submit)?;

        let validator = MoveValidator::new(&self.dictionary, &self.rules);
        let rack = self
            .bag
            .is_some()
            .then(|| self.players[player].rack.as_slice());

        let accepted = match validator.validate(&self.board, placement, rack) {
            Ok(accepted) => accepted,
            Err(reason) => {
                warn!(
                    player,
                    %reason,
                    cells = ?placement.positions().collect::<Vec<_>>(),
                    "Placement rejected"
                );
                self.state = transition(evaluating, TurnEvent::Rejected)?;
                return Ok(MoveOutcome::Rejected { reason });
            }
        };

        for tile in &accepted.tiles {
            let height = self.board.place(tile.position, tile.letter)?;
            debug_assert_eq!(height, tile.height);
        }

        let score = Scorer::calculate_score(&accepted, &self.rules);
        self.players[player].score += score;

        if let Some(bag) = self.bag.as_mut() {
            let letters: Vec<char> = accepted.tiles.iter().map(|tile| tile.letter).collect();
            let rack = &mut self.players[player].rack;
            take_from_rack(rack, &letters).map_err(|letter| {
                SessionError::InvalidSessionState(format!("rack lost letter {letter} mid-move"))
            })?;
            let missing = self.rules.rack_size.saturating_sub(rack.len());
            rack.extend(bag.draw(missing));
        }

        self.history.push(MoveRecord {
            player,
            placement: accepted.placement(),
            score,
            words: accepted.words.iter().map(|word| word.text.clone()).collect(),
            played_at: Utc::now(),
        });
        self.consecutive_passes = 0;

        info!(
            player,
            score,
            words = ?accepted.words.iter().map(|w| w.text.as_str()).collect::<Vec<_>>(),
            "Placement accepted"
        );
        debug!("Board after move:\n{}", self.board.render());

        self.state = transition(evaluating, TurnEvent::Accepted)?;
        self.finish_turn(player)?;

        Ok(MoveOutcome::Accepted {
            score_delta: score,
            words_formed: accepted.words,
        })
    }

    /// Give up the turn. Always accepted while the game is running.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub fn pass(&mut self) -> Result<MoveOutcome, SessionError> {
        let player = self.waiting_player()?;
        self.state = transition(self.state, TurnEvent::Pass)?;
        self.consecutive_passes += 1;

        debug!(player, passes = self.consecutive_passes, "Player passed");

        self.finish_turn(player)?;
        Ok(MoveOutcome::passed())
    }

    /// Pass on behalf of a player whose turn has run longer than `timeout`
    pub fn expire_turn(&mut self, now: Instant, timeout: Duration) -> Result<Option<MoveOutcome>, SessionError> {
        if !matches!(self.state, TurnState::WaitingForMove { .. }) {
            return Ok(None);
        }

        if now.saturating_duration_since(self.turn_started_at) <= timeout {
            return Ok(None);
        }

        warn!(
            session_id = %self.id,
            player = ?self.current_player(),
            "Turn timed out; passing"
        );
        self.pass().map(Some)
    }

    fn finish_turn(&mut self, player: PlayerIndex) -> Result<(), SessionError> {
        let game_over = self.end_condition_met(player);
        let next = (player + 1) % self.players.len();

        self.state = transition(self.state, TurnEvent::Advance { next, game_over })?;

        if game_over {
            self.finished_at = Some(Instant::now());
            info!(
                session_id = %self.id,
                winner = ?self.winner(),
                moves = self.history.len(),
                "Game over"
            );
        } else {
            self.turn_started_at = Instant::now();
        }

        Ok(())
    }

    fn end_condition_met(&self, last_mover: PlayerIndex) -> bool {
        let everyone_passed = self.consecutive_passes >= self.players.len();
        let move_limit_reached = self
            .rules
            .move_limit
            .is_some_and(|limit| self.history.len() >= limit);
        let out_of_tiles = self
            .bag
            .as_ref()
            .is_some_and(|bag| bag.is_empty() && self.players[last_mover].rack.is_empty());

        everyone_passed || self.board.is_full() || move_limit_reached || out_of_tiles
    }

    /// Seat with the highest score once the game is over; `None` on a tie
    pub fn winner(&self) -> Option<PlayerIndex> {
        if !self.is_game_over() {
            return None;
        }

        let best = self.players.iter().map(|p| p.score).max()?;
        let mut leaders = self
            .players
            .iter()
            .enumerate()
            .filter(|(_, p)| p.score == best);

        match (leaders.next(), leaders.next()) {
            (Some((index, _)), None) => Some(index),
            _ => None,
        }
    }

    /// Rebuild the board by replaying every accepted placement onto an empty one
    pub fn replay_board(&self) -> Result<Board, BoardError> {
        let mut board = Board::new(self.rules.rows, self.rules.cols, self.rules.max_stack_height)?;
        for record in &self.history {
            for tile in &record.placement.tiles {
                board.place(tile.position, tile.letter)?;
            }
        }
        Ok(board)
    }

    pub fn finished_at(&self) -> Option<Instant> {
        self.finished_at
    }

    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            session_id: self.id,
            board: self.board.clone(),
            players: self.players.clone(),
            current_player: self.current_player(),
            turn: self.state,
            game_over: self.is_game_over(),
            winner: self.winner(),
            move_count: self.history.len(),
            tiles_in_bag: self.bag.as_ref().map_or(0, TileBag::remaining),
            created_at: self.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::validator::RejectionReason;
    use crate::models::{Direction, Position};
    use proptest::prelude::*;
    use uuid::Uuid;

    fn pos(row: usize, col: usize) -> Position {
        Position::new(row, col)
    }

    fn dictionary() -> Arc<Dictionary> {
        Arc::new(Dictionary::from_words([
            "CAT", "CATS", "COT", "CUT", "AT", "TO", "HAT", "HATS", "OAT", "ACT", "TA",
        ]))
    }

    fn session_with(players: usize, rules: GameRules) -> GameSession {
        let names = (1..=players).map(|n| format!("player{n}")).collect();
        GameSession::new(Uuid::new_v4(), names, rules, dictionary(), 7).unwrap()
    }

    fn session(players: usize) -> GameSession {
        session_with(players, GameRules::default())
    }

    fn cat() -> Placement {
        Placement::line(pos(4, 3), Direction::Horizontal, "CAT")
    }

    #[test]
    fn test_cat_through_center_scores_three() {
        let mut game = session(2);
        let outcome = game.submit(&cat()).unwrap();

        match outcome {
            MoveOutcome::Accepted {
                score_delta,
                words_formed,
            } => {
                assert_eq!(score_delta, 3);
                assert_eq!(words_formed[0].text, "CAT");
            }
            other => panic!("expected acceptance, got {other:?}"),
        }

        assert_eq!(game.board().active_letter_at(pos(4, 3)), Some('C'));
        assert_eq!(game.board().active_letter_at(pos(4, 4)), Some('A'));
        assert_eq!(game.board().active_letter_at(pos(4, 5)), Some('T'));
        assert_eq!(game.players()[0].score, 3);
        assert_eq!(game.state(), TurnState::WaitingForMove { player: 1 });
        assert_eq!(game.history().len(), 1);
    }

    #[test]
    fn test_same_letter_stack_rejected_without_change() {
        let mut game = session(2);
        game.submit(&cat()).unwrap();
        let before = game.snapshot();

        let outcome = game.submit(&Placement::single(pos(4, 5), 'T')).unwrap();
        assert_eq!(
            outcome,
            MoveOutcome::Rejected {
                reason: RejectionReason::NoOpStack { row: 4, col: 5 }
            }
        );
        assert_eq!(game.snapshot(), before);
        assert_eq!(game.state(), TurnState::WaitingForMove { player: 1 });
    }

    #[test]
    fn test_unknown_word_rejected() {
        let mut game = session(1);
        let outcome = game
            .submit(&Placement::line(pos(4, 3), Direction::Horizontal, "XQZ"))
            .unwrap();
        assert_eq!(
            outcome,
            MoveOutcome::Rejected {
                reason: RejectionReason::InvalidWord {
                    word: "XQZ".to_string()
                }
            }
        );
        assert!(game.board().is_empty());
    }

    #[test]
    fn test_stack_past_max_rejected() {
        let mut game = session(1);
        game.submit(&cat()).unwrap();
        // C -> H -> C -> H -> C brings (4, 3) to height 5
        for letter in ['H', 'C', 'H', 'C'] {
            let outcome = game.submit(&Placement::single(pos(4, 3), letter)).unwrap();
            assert!(outcome.is_accepted(), "{letter} should stack");
        }
        assert_eq!(game.board().height_at(pos(4, 3)), 5);

        let before = game.board().clone();
        let outcome = game.submit(&Placement::single(pos(4, 3), 'H')).unwrap();
        assert_eq!(
            outcome,
            MoveOutcome::Rejected {
                reason: RejectionReason::StackOverflow { row: 4, col: 3 }
            }
        );
        assert_eq!(game.board(), &before);
    }

    #[test]
    fn test_stacked_tile_scores_height() {
        let mut game = session(2);
        game.submit(&cat()).unwrap();
        let outcome = game.submit(&Placement::single(pos(4, 3), 'H')).unwrap();
        assert_eq!(
            outcome,
            MoveOutcome::Accepted {
                score_delta: 2,
                words_formed: vec![game.board().word_at(pos(4, 3), Direction::Horizontal)],
            }
        );
        assert_eq!(game.players()[1].score, 2);
    }

    #[test]
    fn test_moves_after_game_over_fail() {
        let mut game = session_with(
            2,
            GameRules {
                move_limit: Some(1),
                ..GameRules::default()
            },
        );
        game.submit(&cat()).unwrap();
        assert!(game.is_game_over());
        assert_eq!(game.winner(), Some(0));

        let before = game.snapshot();
        let result = game.submit(&Placement::single(pos(4, 6), 'S'));
        assert!(matches!(result, Err(SessionError::InvalidSessionState(_))));
        assert!(matches!(game.pass(), Err(SessionError::InvalidSessionState(_))));
        assert_eq!(game.snapshot(), before);
    }

    #[test]
    fn test_everyone_passing_ends_game() {
        let mut game = session(3);
        game.pass().unwrap();
        game.pass().unwrap();
        assert!(!game.is_game_over());
        assert_eq!(game.pass().unwrap(), MoveOutcome::passed());
        assert!(game.is_game_over());
        assert_eq!(game.winner(), None);
    }

    #[test]
    fn test_accepted_move_resets_pass_streak() {
        let mut game = session(2);
        game.pass().unwrap();
        game.submit(&Placement::line(pos(4, 3), Direction::Horizontal, "CAT"))
            .unwrap();
        game.pass().unwrap();
        assert!(!game.is_game_over());
    }

    #[test]
    fn test_turn_order_cycles() {
        let mut game = session(3);
        let moves = [
            cat(),
            Placement::single(pos(4, 6), 'S'),
            Placement::single(pos(4, 3), 'H'),
            Placement::single(pos(5, 5), 'O'),
        ];

        let mut seen = Vec::new();
        for placement in &moves {
            seen.push(game.current_player().unwrap());
            assert!(game.submit(placement).unwrap().is_accepted());
        }
        seen.push(game.current_player().unwrap());
        assert_eq!(seen, vec![0, 1, 2, 0, 1]);
    }

    #[test]
    fn test_replay_reproduces_board() {
        let mut game = session(2);
        game.submit(&cat()).unwrap();
        game.submit(&Placement::single(pos(4, 3), 'H')).unwrap();
        game.submit(&Placement::single(pos(4, 6), 'S')).unwrap();
        let outcome = game.submit(&Placement::single(pos(4, 3), 'C')).unwrap();
        assert!(outcome.is_accepted());
        assert_eq!(game.board().height_at(pos(4, 3)), 3);

        assert_eq!(&game.replay_board().unwrap(), game.board());
    }

    #[test]
    fn test_snapshot_is_stable() {
        let mut game = session(2);
        game.submit(&cat()).unwrap();
        assert_eq!(game.snapshot(), game.snapshot());
    }

    #[test]
    fn test_player_count_limits() {
        let rules = GameRules::default();
        let none = GameSession::new(Uuid::new_v4(), vec![], rules.clone(), dictionary(), 0);
        assert!(matches!(none, Err(SessionError::InvalidConfig(_))));

        let crowd = (0..5).map(|n| n.to_string()).collect();
        let too_many = GameSession::new(Uuid::new_v4(), crowd, rules, dictionary(), 0);
        assert!(matches!(too_many, Err(SessionError::InvalidConfig(_))));
    }

    #[test]
    fn test_invalid_board_dimensions() {
        let rules = GameRules {
            rows: 0,
            ..GameRules::default()
        };
        let result = GameSession::new(Uuid::new_v4(), vec!["a".into()], rules, dictionary(), 0);
        assert!(matches!(result, Err(SessionError::InvalidConfig(_))));
    }

    #[test]
    fn test_oversized_board_rejected() {
        let huge = GameRules {
            rows: usize::MAX,
            cols: 1,
            ..GameRules::default()
        };
        let result = GameSession::new(Uuid::new_v4(), vec!["a".into()], huge, dictionary(), 0);
        assert!(matches!(result, Err(SessionError::InvalidConfig(_))));

        let wide = GameRules {
            rows: 3000,
            cols: 3000,
            ..GameRules::default()
        };
        let result = GameSession::new(Uuid::new_v4(), vec!["a".into()], wide, dictionary(), 0);
        assert!(matches!(result, Err(SessionError::InvalidConfig(_))));
    }

    #[test]
    fn test_stack_height_over_cap_rejected() {
        let rules = GameRules {
            max_stack_height: 1000,
            ..GameRules::default()
        };
        let result = GameSession::new(Uuid::new_v4(), vec!["a".into()], rules, dictionary(), 0);
        assert!(matches!(result, Err(SessionError::InvalidConfig(_))));
    }

    #[test]
    fn test_turn_timeout_passes() {
        let mut game = session(2);
        let started = Instant::now();

        assert_eq!(
            game.expire_turn(started, Duration::from_secs(30)).unwrap(),
            None
        );

        let later = started + Duration::from_secs(31);
        assert_eq!(
            game.expire_turn(later, Duration::from_secs(30)).unwrap(),
            Some(MoveOutcome::passed())
        );
        assert_eq!(game.current_player(), Some(1));
    }

    fn rack_rules() -> GameRules {
        GameRules {
            racks_enabled: true,
            rack_size: 3,
            ..GameRules::default()
        }
    }

    #[test]
    fn test_racks_are_dealt_and_refilled() {
        // Draws come off the end: player 0 gets T, A, C; player 1 gets S, H, O
        let bag = TileBag::from_tiles(vec!['E', 'E', 'O', 'H', 'S', 'C', 'A', 'T']);
        let mut game = session_with(2, rack_rules()).with_bag(bag);
        assert_eq!(game.players()[0].rack, vec!['T', 'A', 'C']);
        assert_eq!(game.players()[1].rack, vec!['S', 'H', 'O']);

        let outcome = game.submit(&cat()).unwrap();
        // 3 floor tiles + 20 for using the whole rack
        assert_eq!(
            outcome,
            MoveOutcome::Accepted {
                score_delta: 23,
                words_formed: vec![game.board().word_at(pos(4, 4), Direction::Horizontal)],
            }
        );
        assert_eq!(game.players()[0].rack, vec!['E', 'E']);
        assert_eq!(game.snapshot().tiles_in_bag, 0);
    }

    #[test]
    fn test_letters_must_come_from_rack() {
        let bag = TileBag::from_tiles(vec!['O', 'H', 'S', 'Z', 'Z', 'Z']);
        let mut game = session_with(2, rack_rules()).with_bag(bag);

        let outcome = game.submit(&cat()).unwrap();
        assert_eq!(
            outcome,
            MoveOutcome::Rejected {
                reason: RejectionReason::NotInRack { letter: 'C' }
            }
        );
        assert_eq!(game.players()[0].rack, vec!['Z', 'Z', 'Z']);
    }

    #[test]
    fn test_emptying_rack_with_empty_bag_ends_game() {
        let bag = TileBag::from_tiles(vec!['O', 'H', 'S', 'T', 'A', 'C']);
        let mut game = session_with(2, rack_rules()).with_bag(bag);
        game.submit(&cat()).unwrap();

        assert!(game.is_game_over());
        assert_eq!(game.winner(), Some(0));
    }

    proptest! {
        #[test]
        fn prop_rejections_leave_session_untouched(
            tiles in proptest::collection::vec((0usize..12, 0usize..12, proptest::char::range('A', 'Z')), 0..5)
        ) {
            let mut game = session(2);
            game.submit(&cat()).unwrap();
            let before = game.snapshot();

            let placement = Placement::new(
                tiles
                    .into_iter()
                    .map(|(row, col, letter)| crate::models::TilePlacement { position: pos(row, col), letter })
                    .collect(),
            );
            let outcome = game.submit(&placement).unwrap();

            if outcome.is_accepted() {
                for tile in &placement.tiles {
                    prop_assert!(game.board().height_at(tile.position) > before.board.height_at(tile.position));
                    prop_assert_eq!(game.board().active_letter_at(tile.position), Some(tile.letter));
                }
                prop_assert_eq!(&game.replay_board().unwrap(), game.board());
            } else {
                prop_assert_eq!(game.snapshot(), before);
            }
        }
    }
}
