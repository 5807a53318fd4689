//! Registry of live sessions.
//!
//! Each session sits behind its own mutex. Calls take it with `try_lock`, so
//! two submissions for the same session never interleave: the second one gets
//! `SessionBusy` and is expected to retry. Sessions share nothing mutable; the
//! dictionary is one immutable `Arc` for all of them.

use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{broadcast, Mutex};
use uuid::Uuid;

use super::error::SessionError;
use super::rules::GameRules;
use super::session::GameSession;
use crate::dictionary::Dictionary;
use crate::models::{GameSnapshot, MoveOutcome, Placement, PlayerIndex, SessionId};

/// Buffered events per session before slow subscribers start lagging
const EVENT_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BoardDimensions {
    pub rows: usize,
    pub cols: usize,
}

/// Something that happened in a session, pushed to its subscribers
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    MoveResolved {
        player: PlayerIndex,
        outcome: MoveOutcome,
        snapshot: GameSnapshot,
    },
    GameOver {
        winner: Option<PlayerIndex>,
        snapshot: GameSnapshot,
    },
}

#[derive(Clone)]
struct SessionEntry {
    session: Arc<Mutex<GameSession>>,
    events: broadcast::Sender<SessionEvent>,
}

/// Counts from one pass of [`SessionManager::sweep`]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    pub turns_expired: usize,
    pub sessions_removed: usize,
}

pub struct SessionManager {
    sessions: DashMap<SessionId, SessionEntry>,
    dictionary: Arc<Dictionary>,
    rules: GameRules,
}

impl SessionManager {
    pub fn new(dictionary: Arc<Dictionary>, rules: GameRules) -> Self {
        Self {
            sessions: DashMap::new(),
            dictionary,
            rules,
        }
    }

    pub fn rules(&self) -> &GameRules {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Start a new session on an empty board
    pub fn create_session(
        &self,
        players: Vec<String>,
        dimensions: BoardDimensions,
        max_stack_height: usize,
    ) -> Result<SessionId, SessionError> {
        let rules = GameRules {
            rows: dimensions.rows,
            cols: dimensions.cols,
            max_stack_height,
            ..self.rules.clone()
        };

        let id = Uuid::new_v4();
        let session = GameSession::new(
            id,
            players,
            rules,
            Arc::clone(&self.dictionary),
            rand::random(),
        )?;
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        self.sessions.insert(
            id,
            SessionEntry {
                session: Arc::new(Mutex::new(session)),
                events,
            },
        );

        tracing::info!("Session {} registered ({} live)", id, self.sessions.len());
        Ok(id)
    }

    fn entry(&self, id: SessionId) -> Result<SessionEntry, SessionError> {
        self.sessions
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or(SessionError::SessionNotFound(id))
    }

    /// Run `f` against the session while holding its lock
    fn with_session<T>(
        &self,
        id: SessionId,
        f: impl FnOnce(&mut GameSession) -> Result<T, SessionError>,
    ) -> Result<(T, SessionEntry), SessionError> {
        let entry = self.entry(id)?;
        let result = {
            let mut session = entry
                .session
                .try_lock()
                .map_err(|_| SessionError::SessionBusy(id))?;
            f(&mut *session)?
        };
        Ok((result, entry))
    }

    pub fn submit_move(
        &self,
        id: SessionId,
        placement: &Placement,
    ) -> Result<MoveOutcome, SessionError> {
        let ((player, outcome, snapshot), entry) = self.with_session(id, |session| {
            let player = session
                .current_player()
                .ok_or_else(|| SessionError::InvalidSessionState("game is over".to_string()))?;
            let outcome = session.submit(placement)?;
            Ok((player, outcome, session.snapshot()))
        })?;

        Self::publish(&entry, player, &outcome, snapshot);
        Ok(outcome)
    }

    pub fn pass(&self, id: SessionId) -> Result<MoveOutcome, SessionError> {
        let ((player, outcome, snapshot), entry) = self.with_session(id, |session| {
            let player = session
                .current_player()
                .ok_or_else(|| SessionError::InvalidSessionState("game is over".to_string()))?;
            let outcome = session.pass()?;
            Ok((player, outcome, session.snapshot()))
        })?;

        Self::publish(&entry, player, &outcome, snapshot);
        Ok(outcome)
    }

    pub fn get_state(&self, id: SessionId) -> Result<GameSnapshot, SessionError> {
        self.with_session(id, |session| Ok(session.snapshot()))
            .map(|(snapshot, _)| snapshot)
    }

    /// Receive every event published for the session from now on
    pub fn subscribe(&self, id: SessionId) -> Result<broadcast::Receiver<SessionEvent>, SessionError> {
        self.entry(id).map(|entry| entry.events.subscribe())
    }

    fn publish(entry: &SessionEntry, player: PlayerIndex, outcome: &MoveOutcome, snapshot: GameSnapshot) {
        let game_over = snapshot.game_over;
        let winner = snapshot.winner;

        // No subscribers is fine
        let _ = entry.events.send(SessionEvent::MoveResolved {
            player,
            outcome: outcome.clone(),
            snapshot: snapshot.clone(),
        });

        if game_over && outcome.is_accepted() {
            let _ = entry.events.send(SessionEvent::GameOver { winner, snapshot });
        }
    }

    /// Pass expired turns and drop sessions that finished more than `finished_ttl` ago.
    /// Busy sessions are skipped and picked up on the next sweep.
    pub fn sweep(&self, now: Instant, turn_timeout: Option<Duration>, finished_ttl: Duration) -> SweepReport {
        let mut report = SweepReport::default();
        let mut expired = Vec::new();

        let ids: Vec<SessionId> = self.sessions.iter().map(|entry| *entry.key()).collect();

        for id in ids {
            let Ok(entry) = self.entry(id) else {
                continue;
            };
            let Ok(mut session) = entry.session.try_lock() else {
                continue;
            };

            if let Some(finished_at) = session.finished_at() {
                if now.saturating_duration_since(finished_at) > finished_ttl {
                    expired.push(id);
                }
                continue;
            }

            let Some(timeout) = turn_timeout else {
                continue;
            };
            let player = session.current_player();

            match session.expire_turn(now, timeout) {
                Ok(Some(outcome)) => {
                    report.turns_expired += 1;
                    let snapshot = session.snapshot();
                    drop(session);
                    if let Some(player) = player {
                        Self::publish(&entry, player, &outcome, snapshot);
                    }
                }
                Ok(None) => {}
                Err(e) => tracing::error!("Failed to expire turn in session {}: {}", id, e),
            }
        }

        for id in expired {
            if self.sessions.remove(&id).is_some() {
                report.sessions_removed += 1;
                tracing::info!("Removed finished session {} (retention period expired)", id);
            }
        }

        report
    }
}
