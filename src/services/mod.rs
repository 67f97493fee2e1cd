/// Curator publishing of daily songs.
pub mod admin_service;
/// Lookup of playable challenges.
pub mod challenge_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Per-player score history.
pub mod history_service;
/// Play-history guard and session lifecycle.
pub mod play_service;
/// Periodic eviction of idle sessions.
pub mod session_sweeper;
/// Server-Sent Events message generation.
pub mod sse_events;
/// Server-Sent Events streaming service.
pub mod sse_service;
/// Storage connection supervisor driving degraded mode.
pub mod storage_supervisor;
