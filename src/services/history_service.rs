use std::collections::HashMap;

use tracing::warn;

use crate::{
    dto::{
        challenge::ChallengePreview,
        history::{PastGame, ScoreHistoryResponse, ScoreRecordView},
    },
    error::ServiceError,
    services::challenge_service::today,
    state::{SharedState, challenge::SongChallenge, record::ScoreRecord},
};

async fn load_records(state: &SharedState, user: &str) -> Result<Vec<ScoreRecord>, ServiceError> {
    let store = state.require_game_store().await?;
    let mut records = store
        .list_user_scores(user.to_owned())
        .await?
        .into_iter()
        .map(ScoreRecord::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    records.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
    Ok(records)
}

/// Every stored result of `user`, most recent first.
pub async fn user_scores(
    state: &SharedState,
    user: &str,
) -> Result<ScoreHistoryResponse, ServiceError> {
    let records = load_records(state, user).await?;
    Ok(ScoreHistoryResponse::from_records(&records))
}

/// Daily games published up to today, newest first, with the result of
/// `user` attached when there is one.
pub async fn past_games(state: &SharedState, user: &str) -> Result<Vec<PastGame>, ServiceError> {
    let store = state.require_game_store().await?;
    let today = today();

    let mut challenges = store
        .list_songs()
        .await?
        .into_iter()
        .filter(|song| song.is_active)
        .filter_map(|song| {
            let song_id = song.id.clone();
            match SongChallenge::try_from(song) {
                Ok(challenge) => Some(challenge),
                Err(err) => {
                    warn!(song_id = %song_id, error = %err, "skipping unplayable song");
                    None
                }
            }
        })
        .filter(|challenge| challenge.game_date.is_some_and(|date| date <= today))
        .collect::<Vec<_>>();
    challenges.sort_by(|a, b| b.game_date.cmp(&a.game_date));

    let mut results = load_records(state, user)
        .await?
        .into_iter()
        .map(|record| (record.song_id.clone(), record))
        .collect::<HashMap<_, _>>();

    Ok(challenges
        .iter()
        .map(|challenge| PastGame {
            challenge: ChallengePreview::from(challenge),
            result: results
                .remove(&challenge.song_id)
                .as_ref()
                .map(ScoreRecordView::from),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use time::Duration;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{game_store::memory::MemoryGameStore, models::ScoreEntity},
        dto::admin::tests::publish_request,
        services::admin_service::publish_song,
        state::{AppState, challenge::format_game_date},
    };

    fn score(song_id: &str) -> ScoreEntity {
        ScoreEntity {
            user_id: Some("u1".into()),
            session_id: uuid::Uuid::new_v4().to_string(),
            song_id: song_id.into(),
            song_title: "Imagine".into(),
            artist: "John Lennon".into(),
            album: "Imagine".into(),
            release_year: 1971,
            is_won: false,
            tries_used: 3,
            hints_used_count: 0,
            lines_revealed: 1,
            time_elapsed_seconds: 40,
            attempts: vec!["a".into(), "b".into(), "c".into()],
            used_hint_types: vec![],
            score: 0,
            completed_at: std::time::SystemTime::now(),
        }
    }

    #[tokio::test]
    async fn past_games_skip_future_dates_and_attach_results() {
        let state = AppState::new(AppConfig::default());
        let store = MemoryGameStore::new();
        state.set_game_store(Arc::new(store.clone())).await;

        let today = today();
        for (id, offset) in [("yesterday", -1), ("today", 0), ("tomorrow", 1)] {
            let date = format_game_date(today + Duration::days(offset));
            publish_song(&state, publish_request(id, &date)).await.unwrap();
        }
        crate::dao::game_store::GameStore::save_score(&store, score("yesterday"))
            .await
            .unwrap();

        let games = past_games(&state, "u1").await.unwrap();
        let ids = games
            .iter()
            .map(|game| game.challenge.song_id.as_str())
            .collect::<Vec<_>>();
        assert_eq!(ids, ["today", "yesterday"]);
        assert!(games[0].result.is_none());
        let result = games[1].result.as_ref().unwrap();
        assert_eq!(result.tries_used, 3);
        assert_eq!(result.album, "Imagine");
        assert_eq!(result.release_year, 1971);

        let history = user_scores(&state, "u1").await.unwrap();
        assert_eq!(history.games_played, 1);
        assert_eq!(history.games_won, 0);
        assert!(user_scores(&state, "u2").await.unwrap().scores.is_empty());
    }
}
