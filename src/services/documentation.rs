use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI document for What a Song Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::challenges::today,
        crate::routes::challenges::random,
        crate::routes::challenges::by_id,
        crate::routes::sessions::open_session,
        crate::routes::sessions::get_session,
        crate::routes::sessions::start_session,
        crate::routes::sessions::submit_guess,
        crate::routes::sessions::reveal_line,
        crate::routes::sessions::reveal_hint,
        crate::routes::sessions::close_session,
        crate::routes::sse::session_stream,
        crate::routes::history::scores,
        crate::routes::history::games,
        crate::routes::admin::list_songs,
        crate::routes::admin::publish_song,
        crate::routes::admin::get_song,
        crate::routes::admin::deactivate_song,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::challenge::ChallengePreview,
            crate::dto::session::OpenSessionRequest,
            crate::dto::session::OpenSessionResponse,
            crate::dto::session::GuessRequest,
            crate::dto::session::SessionView,
            crate::dto::history::ScoreRecordView,
            crate::dto::history::ScoreHistoryResponse,
            crate::dto::history::PastGame,
            crate::dto::admin::PublishSongRequest,
            crate::dto::admin::SongSummary,
            crate::dto::sse::Handshake,
            crate::dto::sse::SystemStatus,
            crate::dto::sse::TickEvent,
            crate::dto::sse::FinishedEvent,
            crate::dto::sse::ClosedEvent,
            crate::state::challenge::HintKind,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "challenges", description = "Songs available to play"),
        (name = "sessions", description = "Play sessions"),
        (name = "sse", description = "Server-sent events streams"),
        (name = "history", description = "Per-player results"),
        (name = "admin", description = "Curator operations"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_the_game_routes() {
        let doc = ApiDoc::openapi();
        for path in [
            "/healthcheck",
            "/challenges/today",
            "/sessions",
            "/sessions/{id}/hints/{hint}",
            "/sessions/{id}/events",
            "/history/games",
            "/admin/songs/{id}",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
