pub mod health;
pub mod sessions;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::{websocket, AppState};

pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api", api_routes())
}

fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/sessions", post(sessions::create_session))
        .route("/sessions/{id}", get(sessions::get_state))
        .route("/sessions/{id}/moves", post(sessions::submit_move))
        .route("/sessions/{id}/pass", post(sessions::pass))
        // WebSocket endpoint
        .route("/sessions/{id}/ws", get(websocket::handle_websocket))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, GameConfig, ServerConfig};
    use crate::dictionary::Dictionary;
    use crate::game::{FirstMoveRule, GameRules};
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use uuid::Uuid;

    fn test_config() -> Config {
        let defaults = GameRules::default();
        Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                frontend_url: "http://localhost:3000".to_string(),
            },
            game: GameConfig {
                dictionary_path: "unused.txt".to_string(),
                min_word_length: 2,
                board_rows: defaults.rows,
                board_cols: defaults.cols,
                max_stack_height: defaults.max_stack_height,
                max_board_side: defaults.max_board_side,
                stack_height_cap: defaults.stack_height_cap,
                enable_racks: false,
                rack_size: defaults.rack_size,
                all_tiles_bonus: defaults.all_tiles_bonus,
                perpendicular_word_bonus: defaults.perpendicular_word_bonus,
                move_limit: None,
                first_move_rule: FirstMoveRule::Anywhere,
                max_players: defaults.max_players,
                turn_timeout_secs: None,
                finished_session_ttl_secs: 600,
            },
        }
    }

    fn app() -> Router {
        let dictionary = Dictionary::from_words(["CAT", "CATS", "HAT"]);
        let state = Arc::new(AppState::new(test_config(), dictionary));
        create_routes().with_state(state)
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    async fn create(app: &Router, players: Value) -> String {
        let (status, body) = send(app, "POST", "/api/sessions", Some(json!({ "players": players }))).await;
        assert_eq!(status, StatusCode::CREATED);
        body["session_id"].as_str().unwrap().to_string()
    }

    fn cat() -> Value {
        json!({
            "tiles": [
                {"row": 4, "col": 3, "letter": "C"},
                {"row": 4, "col": 4, "letter": "A"},
                {"row": 4, "col": 5, "letter": "T"}
            ]
        })
    }

    #[tokio::test]
    async fn test_health() {
        let app = app();
        let (status, body) = send(&app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["dictionary_words"], 3);
        assert_eq!(body["min_word_length"], 2);
        assert_eq!(body["live_sessions"], 0);
    }

    #[tokio::test]
    async fn test_create_move_and_read_state() {
        let app = app();
        let id = create(&app, json!(["ada", "grace"])).await;

        let (status, outcome) =
            send(&app, "POST", &format!("/api/sessions/{id}/moves"), Some(cat())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(outcome["accepted"], true);
        assert_eq!(outcome["score_delta"], 3);
        assert_eq!(outcome["words_formed"][0]["text"], "CAT");

        let (status, snapshot) = send(&app, "GET", &format!("/api/sessions/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(snapshot["session_id"], id.as_str());
        assert_eq!(snapshot["move_count"], 1);
        assert_eq!(snapshot["current_player"], 1);
        assert_eq!(snapshot["players"][0]["score"], 3);
        assert_eq!(snapshot["game_over"], false);
    }

    #[tokio::test]
    async fn test_rejected_move_is_ok_with_reason() {
        let app = app();
        let id = create(&app, json!(["ada"])).await;

        let bad = json!({"tiles": [{"row": 0, "col": 0, "letter": "X"}, {"row": 0, "col": 1, "letter": "Q"}]});
        let (status, outcome) =
            send(&app, "POST", &format!("/api/sessions/{id}/moves"), Some(bad)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(outcome["accepted"], false);
        assert_eq!(outcome["reason"]["code"], "invalid_word");
    }

    #[tokio::test]
    async fn test_unknown_session_is_not_found() {
        let app = app();
        let missing = Uuid::new_v4();

        let (status, body) = send(&app, "GET", &format!("/api/sessions/{missing}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["retryable"], false);
        assert!(body["error"].as_str().unwrap().contains("not found"));

        let (status, _) = send(&app, "POST", &format!("/api/sessions/{missing}/pass"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_move_after_game_over_conflicts() {
        let app = app();
        // One player passing ends the game
        let id = create(&app, json!(["solo"])).await;

        let (status, outcome) = send(&app, "POST", &format!("/api/sessions/{id}/pass"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(outcome["accepted"], true);

        let (status, body) =
            send(&app, "POST", &format!("/api/sessions/{id}/moves"), Some(cat())).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["retryable"], false);

        let (_, snapshot) = send(&app, "GET", &format!("/api/sessions/{id}"), None).await;
        assert_eq!(snapshot["game_over"], true);
        assert_eq!(snapshot["move_count"], 0);
    }

    #[tokio::test]
    async fn test_create_rejects_bad_settings() {
        let app = app();

        let (status, _) = send(
            &app,
            "POST",
            "/api/sessions",
            Some(json!({"players": ["ada"], "rows": 3000, "cols": 3000})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&app, "POST", "/api/sessions", Some(json!({"players": []}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, health) = send(&app, "GET", "/health", None).await;
        assert_eq!(health["live_sessions"], 0);
    }

    #[tokio::test]
    async fn test_websocket_route_is_mounted() {
        let app = app();
        let id = create(&app, json!(["ada"])).await;

        // A plain GET without upgrade headers is refused by the upgrade extractor,
        // not by the router
        let (status, _) = send(&app, "GET", &format!("/api/sessions/{id}/ws"), None).await;
        assert!(status.is_client_error());
        assert_ne!(status, StatusCode::NOT_FOUND);
    }
}
