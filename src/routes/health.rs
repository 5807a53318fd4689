use std::sync::Arc;

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::AppState;

/// Health check endpoint
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "upwords-backend",
        "version": env!("CARGO_PKG_VERSION"),
        "dictionary_words": state.dictionary.len(),
        "min_word_length": state.dictionary.min_word_length(),
        "live_sessions": state.sessions.len()
    }))
}
