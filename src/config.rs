use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::time::Duration;

use crate::dictionary::DEFAULT_MIN_WORD_LENGTH;
use crate::game::{FirstMoveRule, GameRules};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub game: GameConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub frontend_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GameConfig {
    pub dictionary_path: String,
    pub min_word_length: usize,
    pub board_rows: usize,
    pub board_cols: usize,
    pub max_stack_height: usize,
    pub max_board_side: usize,
    pub stack_height_cap: usize,
    pub enable_racks: bool,
    pub rack_size: usize,
    pub all_tiles_bonus: i32,
    pub perpendicular_word_bonus: i32,
    pub move_limit: Option<usize>,
    pub first_move_rule: FirstMoveRule,
    pub max_players: usize,
    /// Seconds a player may think before the turn is passed for them
    pub turn_timeout_secs: Option<u64>,
    /// Seconds a finished session stays readable before it is dropped
    pub finished_session_ttl_secs: u64,
}

impl GameConfig {
    /// Engine rules derived from this configuration
    pub fn rules(&self) -> GameRules {
        GameRules {
            rows: self.board_rows,
            cols: self.board_cols,
            max_stack_height: self.max_stack_height,
            max_board_side: self.max_board_side,
            stack_height_cap: self.stack_height_cap,
            racks_enabled: self.enable_racks,
            rack_size: self.rack_size,
            all_tiles_bonus: self.all_tiles_bonus,
            perpendicular_word_bonus: self.perpendicular_word_bonus,
            move_limit: self.move_limit,
            first_move_rule: self.first_move_rule,
            max_players: self.max_players,
        }
    }

    pub fn turn_timeout(&self) -> Option<Duration> {
        self.turn_timeout_secs.map(Duration::from_secs)
    }

    pub fn finished_session_ttl(&self) -> Duration {
        Duration::from_secs(self.finished_session_ttl_secs)
    }
}

/// Read `name`, falling back to `default` when unset, and parse it
fn parse_var<T>(name: &str, default: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    raw.parse()
        .map_err(|e| anyhow::anyhow!("{} must be valid: {}", name, e))
}

/// Read an optional numeric variable; unset or empty means `None`
fn parse_optional_var<T>(name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("{} must be a number", name)),
        _ => Ok(None),
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let server = ServerConfig {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parse_var("PORT", "3000")?,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
        };

        let defaults = GameRules::default();

        let game = GameConfig {
            dictionary_path: env::var("DICTIONARY_PATH")
                .unwrap_or_else(|_| "./dictionary.txt".to_string()),
            min_word_length: parse_var("MIN_WORD_LENGTH", &DEFAULT_MIN_WORD_LENGTH.to_string())?,
            board_rows: parse_var("BOARD_ROWS", &defaults.rows.to_string())?,
            board_cols: parse_var("BOARD_COLS", &defaults.cols.to_string())?,
            max_stack_height: parse_var("MAX_STACK_HEIGHT", &defaults.max_stack_height.to_string())?,
            max_board_side: parse_var("MAX_BOARD_SIDE", &defaults.max_board_side.to_string())?,
            stack_height_cap: parse_var(
                "STACK_HEIGHT_CAP",
                &defaults.stack_height_cap.to_string(),
            )?,
            enable_racks: parse_var("ENABLE_RACKS", "false")?,
            rack_size: parse_var("RACK_SIZE", &defaults.rack_size.to_string())?,
            all_tiles_bonus: parse_var("ALL_TILES_BONUS", &defaults.all_tiles_bonus.to_string())?,
            perpendicular_word_bonus: parse_var(
                "PERPENDICULAR_WORD_BONUS",
                &defaults.perpendicular_word_bonus.to_string(),
            )?,
            move_limit: parse_optional_var("MOVE_LIMIT")?,
            first_move_rule: parse_var("FIRST_MOVE_RULE", "anywhere")?,
            max_players: parse_var("MAX_PLAYERS", &defaults.max_players.to_string())?,
            turn_timeout_secs: parse_optional_var("TURN_TIMEOUT_SECS")?,
            finished_session_ttl_secs: parse_var("FINISHED_SESSION_TTL_SECS", "600")?,
        };

        Ok(Config { server, game })
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
