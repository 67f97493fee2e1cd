use axum::{
    Json, Router,
    body::Body,
    extract::{Path, State},
    http::Request,
    middleware::{self, Next},
    response::Response,
    routing::get,
};
use axum_valid::Valid;

use crate::{
    dto::admin::{PublishSongRequest, SongSummary},
    error::AppError,
    services::admin_service,
    state::SharedState,
};

const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Curator endpoints, guarded by the configured admin token.
pub fn router(state: SharedState) -> Router<SharedState> {
    Router::new()
        .route("/admin/songs", get(list_songs).post(publish_song))
        .route("/admin/songs/{id}", get(get_song).delete(deactivate_song))
        .route_layer(middleware::from_fn_with_state(state, require_admin_token))
}

/// List every song, newest publication date first.
#[utoipa::path(
    get,
    path = "/admin/songs",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Configured admin token")),
    responses((status = 200, description = "Songs", body = [SongSummary]))
)]
pub async fn list_songs(
    State(state): State<SharedState>,
) -> Result<Json<Vec<SongSummary>>, AppError> {
    Ok(Json(admin_service::list_songs(&state).await?))
}

/// Publish or update the song of a date.
#[utoipa::path(
    post,
    path = "/admin/songs",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Configured admin token")),
    request_body = PublishSongRequest,
    responses(
        (status = 200, description = "Published song", body = SongSummary),
        (status = 400, description = "Invalid song"),
        (status = 409, description = "Another song is already published for this date")
    )
)]
pub async fn publish_song(
    State(state): State<SharedState>,
    Valid(Json(request)): Valid<Json<PublishSongRequest>>,
) -> Result<Json<SongSummary>, AppError> {
    Ok(Json(admin_service::publish_song(&state, request).await?))
}

/// Retrieve a song by its ID.
#[utoipa::path(
    get,
    path = "/admin/songs/{id}",
    tag = "admin",
    params(
        ("X-Admin-Token" = String, Header, description = "Configured admin token"),
        ("id" = String, Path, description = "Song identifier")
    ),
    responses(
        (status = 200, description = "Song", body = SongSummary),
        (status = 404, description = "Unknown song")
    )
)]
pub async fn get_song(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<SongSummary>, AppError> {
    Ok(Json(admin_service::get_song(&state, &id).await?))
}

/// Hide a song from players.
#[utoipa::path(
    delete,
    path = "/admin/songs/{id}",
    tag = "admin",
    params(
        ("X-Admin-Token" = String, Header, description = "Configured admin token"),
        ("id" = String, Path, description = "Song identifier")
    ),
    responses(
        (status = 200, description = "Deactivated song", body = SongSummary),
        (status = 404, description = "Unknown song")
    )
)]
pub async fn deactivate_song(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<SongSummary>, AppError> {
    Ok(Json(admin_service::deactivate_song(&state, &id).await?))
}

async fn require_admin_token(
    State(state): State<SharedState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let Some(expected) = state.config().admin_token() else {
        return Err(AppError::Unauthorized("admin routes are disabled".into()));
    };

    let authorized = match req
        .headers()
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
    {
        Some(provided) => provided == expected,
        None => {
            return Err(AppError::Unauthorized(
                "missing admin token header `X-Admin-Token`".into(),
            ));
        }
    };

    if !authorized {
        return Err(AppError::Unauthorized("invalid admin token".into()));
    }
    Ok(next.run(req).await)
}
