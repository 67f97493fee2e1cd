use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use axum_valid::Valid;

use crate::{
    dto::session::{GuessRequest, OpenSessionRequest, OpenSessionResponse, SessionView},
    error::AppError,
    routes::identity::CurrentUser,
    services::play_service,
    state::{SharedState, challenge::HintKind, registry::SessionId},
};

/// Player endpoints driving a play session.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/sessions", post(open_session))
        .route("/sessions/{id}", get(get_session).delete(close_session))
        .route("/sessions/{id}/start", post(start_session))
        .route("/sessions/{id}/guess", post(submit_guess))
        .route("/sessions/{id}/lines/next", post(reveal_line))
        .route("/sessions/{id}/hints/{hint}", post(reveal_hint))
}

/// Open a session on a song, or return the stored result when the player
/// already finished it.
#[utoipa::path(
    post,
    path = "/sessions",
    tag = "sessions",
    params(("x-user-id" = Option<String>, Header, description = "Player identifier; omit for anonymous play")),
    request_body = OpenSessionRequest,
    responses(
        (status = 200, description = "Session opened or result already stored", body = OpenSessionResponse),
        (status = 400, description = "Invalid song id"),
        (status = 404, description = "Unknown or inactive song"),
        (status = 503, description = "Storage unavailable")
    )
)]
pub async fn open_session(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Valid(Json(request)): Valid<Json<OpenSessionRequest>>,
) -> Result<Json<OpenSessionResponse>, AppError> {
    Ok(Json(
        play_service::open_session(&state, user, request.song_id).await?,
    ))
}

/// Current state of a session.
#[utoipa::path(
    get,
    path = "/sessions/{id}",
    tag = "sessions",
    params(("id" = String, Path, description = "Session identifier (UUID)")),
    responses(
        (status = 200, description = "Session view", body = SessionView),
        (status = 404, description = "Unknown session")
    )
)]
pub async fn get_session(
    State(state): State<SharedState>,
    Path(id): Path<SessionId>,
) -> Result<Json<SessionView>, AppError> {
    Ok(Json(play_service::get(&state, id).await?))
}

/// Leave the waiting screen and start the clock.
#[utoipa::path(
    post,
    path = "/sessions/{id}/start",
    tag = "sessions",
    params(("id" = String, Path, description = "Session identifier (UUID)")),
    responses(
        (status = 200, description = "Session view; `rejected` is set when the session had already started", body = SessionView),
        (status = 404, description = "Unknown session")
    )
)]
pub async fn start_session(
    State(state): State<SharedState>,
    Path(id): Path<SessionId>,
) -> Result<Json<SessionView>, AppError> {
    Ok(Json(play_service::start(&state, id).await?))
}

/// Submit a title guess.
#[utoipa::path(
    post,
    path = "/sessions/{id}/guess",
    tag = "sessions",
    params(("id" = String, Path, description = "Session identifier (UUID)")),
    request_body = GuessRequest,
    responses(
        (status = 200, description = "Session view; `rejected` is set when the guess was ignored", body = SessionView),
        (status = 404, description = "Unknown session")
    )
)]
pub async fn submit_guess(
    State(state): State<SharedState>,
    Path(id): Path<SessionId>,
    Json(request): Json<GuessRequest>,
) -> Result<Json<SessionView>, AppError> {
    Ok(Json(play_service::guess(&state, id, &request.guess).await?))
}

/// Reveal one more lyric line.
#[utoipa::path(
    post,
    path = "/sessions/{id}/lines/next",
    tag = "sessions",
    params(("id" = String, Path, description = "Session identifier (UUID)")),
    responses(
        (status = 200, description = "Session view", body = SessionView),
        (status = 404, description = "Unknown session")
    )
)]
pub async fn reveal_line(
    State(state): State<SharedState>,
    Path(id): Path<SessionId>,
) -> Result<Json<SessionView>, AppError> {
    Ok(Json(play_service::reveal_line(&state, id).await?))
}

/// Spend a hint.
#[utoipa::path(
    post,
    path = "/sessions/{id}/hints/{hint}",
    tag = "sessions",
    params(
        ("id" = String, Path, description = "Session identifier (UUID)"),
        ("hint" = HintKind, Path, description = "Hint to reveal")
    ),
    responses(
        (status = 200, description = "Session view", body = SessionView),
        (status = 400, description = "Unknown hint"),
        (status = 404, description = "Unknown session")
    )
)]
pub async fn reveal_hint(
    State(state): State<SharedState>,
    Path((id, hint)): Path<(SessionId, HintKind)>,
) -> Result<Json<SessionView>, AppError> {
    Ok(Json(play_service::reveal_hint(&state, id, hint).await?))
}

/// Tear a session down.
#[utoipa::path(
    delete,
    path = "/sessions/{id}",
    tag = "sessions",
    params(("id" = String, Path, description = "Session identifier (UUID)")),
    responses(
        (status = 204, description = "Session closed"),
        (status = 404, description = "Unknown session")
    )
)]
pub async fn close_session(
    State(state): State<SharedState>,
    Path(id): Path<SessionId>,
) -> Result<StatusCode, AppError> {
    play_service::close(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
