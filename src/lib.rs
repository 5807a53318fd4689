pub mod config;
pub mod dictionary;
pub mod game;
pub mod models;
pub mod routes;
pub mod utils;
pub mod websocket;

use std::sync::Arc;

use config::Config;
use dictionary::Dictionary;
use game::SessionManager;

/// Application state shared across all handlers
pub struct AppState {
    pub config: Config,
    pub dictionary: Arc<Dictionary>,
    pub sessions: SessionManager,
}

impl AppState {
    pub fn new(config: Config, dictionary: Dictionary) -> Self {
        let dictionary = Arc::new(dictionary);
        let sessions = SessionManager::new(Arc::clone(&dictionary), config.game.rules());

        Self {
            config,
            dictionary,
            sessions,
        }
    }
}
