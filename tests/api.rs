//! HTTP-level tests driving the full router against the in-memory store.

use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use what_a_song_back::{
    config::AppConfig,
    dao::game_store::memory::MemoryGameStore,
    routes,
    state::{AppState, SharedState},
};

const ADMIN_TOKEN: &str = "curator-secret";

async fn setup() -> (Router, SharedState, MemoryGameStore) {
    let state = AppState::new(AppConfig::default().with_admin_token(ADMIN_TOKEN));
    let store = MemoryGameStore::new();
    state.set_game_store(Arc::new(store.clone())).await;
    (routes::router(state.clone()), state, store)
}

fn song(song_id: &str, game_date: &str) -> Value {
    json!({
        "song_id": song_id,
        "song_title": "Imagine",
        "acceptable_answers": ["imagine"],
        "artist": "John Lennon",
        "album": "Imagine",
        "release_year": 1971,
        "popularity": 80,
        "original_language": "en",
        "translated_lyrics": ["דמיין שאין גן עדן", "זה קל אם תנסה"],
        "original_lyrics": "Imagine there's no heaven\nIt's easy if you try",
        "game_date": game_date,
    })
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    headers: &[(&str, &str)],
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn publish(app: &Router, body: Value) -> (StatusCode, Value) {
    send(app, "POST", "/admin/songs", &[("x-admin-token", ADMIN_TOKEN)], Some(body)).await
}

/// Open a session for `user` and start it, returning its id.
async fn start_session(app: &Router, user: &str, song_id: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/sessions",
        &[("x-user-id", user)],
        Some(json!({ "song_id": song_id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "opened");
    let id = body["session"]["session_id"].as_str().unwrap().to_owned();

    let (status, view) = send(app, "POST", &format!("/sessions/{id}/start"), &[], None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["phase"], "in_progress");
    id
}

async fn guess(app: &Router, id: &str, guess: &str) -> Value {
    let (status, view) = send(
        app,
        "POST",
        &format!("/sessions/{id}/guess"),
        &[],
        Some(json!({ "guess": guess })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    view
}

/// Open the event stream of a session.
async fn open_events(app: &Router, id: &str) -> Body {
    let request = Request::builder()
        .uri(format!("/sessions/{id}/events"))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    response.into_body()
}

/// Read an event stream until the server ends it.
async fn read_to_end(body: Body) -> String {
    let collected = tokio::time::timeout(Duration::from_secs(5), body.collect())
        .await
        .expect("event stream kept running")
        .unwrap();
    String::from_utf8(collected.to_bytes().to_vec()).unwrap()
}

/// Whether an event stream carried an event named `name`.
fn has_event(text: &str, name: &str) -> bool {
    text.lines()
        .filter_map(|line| line.strip_prefix("event:"))
        .any(|event| event.trim() == name)
}

#[tokio::test]
async fn healthcheck_reports_storage_state() {
    let (app, state, _store) = setup().await;
    let (status, body) = send(&app, "GET", "/healthcheck", &[], None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    state.clear_game_store().await;
    let (_, body) = send(&app, "GET", "/healthcheck", &[], None).await;
    assert_eq!(body["status"], "degraded");
}

#[tokio::test]
async fn admin_routes_require_the_token() {
    let (app, _state, _store) = setup().await;

    let (status, _) = send(&app, "GET", "/admin/songs", &[], None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        "GET",
        "/admin/songs",
        &[("x-admin-token", "wrong")],
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = publish(&app, song("imagine", "2025-06-01")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_active"], true);
    assert_eq!(body["game_date"], "2025-06-01");
}

#[tokio::test]
async fn publishing_validates_and_rejects_date_conflicts() {
    let (app, _state, _store) = setup().await;

    let mut invalid = song("imagine", "2025-06-01");
    invalid["song_title"] = json!("  ");
    let (status, _) = publish(&app, invalid).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = publish(&app, song("imagine", "2025-06-01")).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = publish(&app, song("yesterday", "2025-06-01")).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn previews_never_leak_the_answer() {
    let (app, _state, _store) = setup().await;
    publish(&app, song("imagine", "2025-06-01")).await;

    let (status, body) = send(&app, "GET", "/challenges/imagine", &[], None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["line_count"], 2);
    assert!(body.get("song_title").is_none());
    assert!(body.get("artist").is_none());

    let (status, _) = send(&app, "GET", "/challenges/unknown", &[], None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn finished_song_cannot_be_replayed() {
    let (app, _state, store) = setup().await;
    publish(&app, song("imagine", "2025-06-01")).await;

    let id = start_session(&app, "player-1", "imagine").await;
    let won = guess(&app, &id, "  IMAGINE ").await;
    assert_eq!(won["phase"], "won");
    assert_eq!(won["answer"], "Imagine");
    assert_eq!(won["persistence"], "stored");
    let score = won["score"].as_u64().unwrap();
    assert!(score > 0);

    let (status, _) = send(&app, "DELETE", &format!("/sessions/{id}"), &[], None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(
        &app,
        "POST",
        "/sessions",
        &[("x-user-id", "player-1")],
        Some(json!({ "song_id": "imagine" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "already_played");
    assert_eq!(body["result"]["score"], score);
    assert_eq!(store.score_count(), 1);

    // Another player still gets a fresh session.
    let other = start_session(&app, "player-2", "imagine").await;
    assert_ne!(other, id);
}

#[tokio::test]
async fn result_is_written_once() {
    let (app, _state, store) = setup().await;
    publish(&app, song("imagine", "2025-06-01")).await;

    let id = start_session(&app, "player-1", "imagine").await;
    guess(&app, &id, "Imagine").await;

    let again = guess(&app, &id, "Imagine").await;
    assert_eq!(again["rejected"], "game_over");
    let (_, hint) = send(&app, "POST", &format!("/sessions/{id}/hints/artist"), &[], None).await;
    assert_eq!(hint["rejected"], "game_over");

    assert_eq!(store.score_count(), 1);
}

#[tokio::test]
async fn failed_write_is_reported_without_undoing_the_result() {
    let (app, _state, store) = setup().await;
    publish(&app, song("imagine", "2025-06-01")).await;
    store.set_failing_writes(true);

    let id = start_session(&app, "player-1", "imagine").await;
    let won = guess(&app, &id, "Imagine").await;
    assert_eq!(won["phase"], "won");
    assert_eq!(won["persistence"], "failed");
    assert_eq!(store.score_count(), 0);

    let (_, current) = send(&app, "GET", &format!("/sessions/{id}"), &[], None).await;
    assert_eq!(current["phase"], "won");
    assert_eq!(current["persistence"], "failed");
}

#[tokio::test]
async fn losing_reveals_the_title_and_scores_zero() {
    let (app, _state, _store) = setup().await;
    publish(&app, song("imagine", "2025-06-01")).await;

    let id = start_session(&app, "player-1", "imagine").await;
    guess(&app, &id, "Yesterday").await;
    guess(&app, &id, "Hey Jude").await;
    let lost = guess(&app, &id, "Help").await;

    assert_eq!(lost["phase"], "lost");
    assert_eq!(lost["tries_remaining"], 0);
    assert_eq!(lost["score"], 0);
    assert_eq!(lost["answer"], "Imagine");
}

#[tokio::test]
async fn history_lists_the_players_results() {
    let (app, _state, _store) = setup().await;
    publish(&app, song("imagine", "2025-06-01")).await;
    publish(&app, song("yesterday", "2025-06-02")).await;

    let (status, _) = send(&app, "GET", "/history/scores", &[], None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let id = start_session(&app, "player-1", "imagine").await;
    guess(&app, &id, "Imagine").await;

    let (status, history) = send(
        &app,
        "GET",
        "/history/scores",
        &[("x-user-id", "player-1")],
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history["games_played"], 1);
    assert_eq!(history["games_won"], 1);
    assert_eq!(history["scores"][0]["song_id"], "imagine");

    let (status, games) = send(
        &app,
        "GET",
        "/history/games",
        &[("x-user-id", "player-1")],
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let games = games.as_array().unwrap();
    assert_eq!(games.len(), 2);
    assert_eq!(games[0]["song_id"], "yesterday");
    assert!(games[0]["result"].is_null());
    assert_eq!(games[1]["song_id"], "imagine");
    assert_eq!(games[1]["result"]["outcome"], "won");
}

#[tokio::test]
async fn degraded_storage_rejects_new_sessions() {
    let (app, state, _store) = setup().await;
    publish(&app, song("imagine", "2025-06-01")).await;
    state.clear_game_store().await;

    let (status, _) = send(
        &app,
        "POST",
        "/sessions",
        &[("x-user-id", "player-1")],
        Some(json!({ "song_id": "imagine" })),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn anonymous_results_are_stored_once_per_session() {
    let (app, _state, store) = setup().await;
    publish(&app, song("imagine", "2025-06-01")).await;

    for _ in 0..2 {
        let (status, body) = send(
            &app,
            "POST",
            "/sessions",
            &[],
            Some(json!({ "song_id": "imagine" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let id = body["session"]["session_id"].as_str().unwrap().to_owned();
        send(&app, "POST", &format!("/sessions/{id}/start"), &[], None).await;

        let won = guess(&app, &id, "Imagine").await;
        assert_eq!(won["persistence"], "stored");
        let again = guess(&app, &id, "Imagine").await;
        assert_eq!(again["rejected"], "game_over");
    }

    assert_eq!(store.score_count(), 2);
}

#[tokio::test]
async fn history_entries_carry_album_and_year() {
    let (app, _state, _store) = setup().await;
    publish(&app, song("imagine", "2025-06-01")).await;
    let id = start_session(&app, "player-1", "imagine").await;
    guess(&app, &id, "Imagine").await;

    let (_, history) = send(
        &app,
        "GET",
        "/history/scores",
        &[("x-user-id", "player-1")],
        None,
    )
    .await;
    assert_eq!(history["scores"][0]["album"], "Imagine");
    assert_eq!(history["scores"][0]["release_year"], 1971);
}

#[tokio::test]
async fn event_stream_ends_with_the_outcome() {
    let (app, _state, _store) = setup().await;
    publish(&app, song("imagine", "2025-06-01")).await;
    let id = start_session(&app, "player-1", "imagine").await;

    let events = open_events(&app, &id).await;
    guess(&app, &id, "Imagine").await;

    let text = read_to_end(events).await;
    assert!(has_event(&text, "handshake"));
    assert!(has_event(&text, "finished"));
    assert!(text.contains(r#""outcome":"won""#));
}

#[tokio::test]
async fn stream_of_a_finished_session_replays_the_outcome() {
    let (app, _state, _store) = setup().await;
    publish(&app, song("imagine", "2025-06-01")).await;
    let id = start_session(&app, "player-1", "imagine").await;
    for wrong in ["Yesterday", "Hey Jude", "Help"] {
        guess(&app, &id, wrong).await;
    }

    let text = read_to_end(open_events(&app, &id).await).await;
    assert!(has_event(&text, "handshake"));
    assert!(has_event(&text, "finished"));
    assert!(text.contains(r#""outcome":"lost""#));
}

#[tokio::test]
async fn closing_a_session_ends_its_stream() {
    let (app, _state, _store) = setup().await;
    publish(&app, song("imagine", "2025-06-01")).await;
    let id = start_session(&app, "player-1", "imagine").await;

    let events = open_events(&app, &id).await;
    let (status, _) = send(&app, "DELETE", &format!("/sessions/{id}"), &[], None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let text = read_to_end(events).await;
    assert!(has_event(&text, "closed"));
    assert!(!has_event(&text, "finished"));

    let (status, _) = send(&app, "GET", &format!("/sessions/{id}/events"), &[], None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
