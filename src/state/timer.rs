use std::{sync::Weak, time::Duration};

use tokio::{
    sync::Mutex,
    task::JoinHandle,
    time::{Instant, MissedTickBehavior, interval_at},
};
use tracing::debug;

use crate::{
    services::sse_events,
    state::{SseHub, registry::{LiveSession, SessionId}},
};

/// Period of the session clock.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Background task advancing the clock of one live session.
///
/// The task only holds a weak reference to the session and stops on its own
/// once the session is gone or no longer accepts ticks. Dropping the timer
/// aborts the task.
#[derive(Debug)]
pub struct SessionTimer {
    handle: JoinHandle<()>,
}

impl SessionTimer {
    /// Spawn the clock for `session`, publishing every tick on `hub`.
    pub fn spawn(
        id: SessionId,
        session: Weak<Mutex<LiveSession>>,
        hub: SseHub,
        period: Duration,
    ) -> Self {
        let handle = tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                interval.tick().await;
                let Some(session) = session.upgrade() else {
                    break;
                };
                let mut live = session.lock().await;
                match live.play.tick() {
                    Ok(elapsed) => sse_events::broadcast_tick(&hub, id, elapsed),
                    Err(reason) => {
                        debug!(session_id = %id, %reason, "session clock stopped");
                        break;
                    }
                }
            }
        });

        Self { handle }
    }

    /// Stop the clock. No tick is applied once this returns while the caller
    /// holds the session lock.
    pub fn cancel(&self) {
        self.handle.abort();
    }

    /// Whether the task has terminated.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for SessionTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::state::{challenge::tests::imagine, session::SessionPhase};

    fn live_session() -> (SessionId, Arc<Mutex<LiveSession>>) {
        let id = SessionId::new_v4();
        let live = LiveSession::new(id, Some("u1".into()), imagine(), 3);
        (id, Arc::new(Mutex::new(live)))
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_every_second_while_in_progress() {
        let (id, session) = live_session();
        session.lock().await.play.start().unwrap();
        let timer = SessionTimer::spawn(id, Arc::downgrade(&session), SseHub::new(8), TICK_PERIOD);

        tokio::time::sleep(Duration::from_millis(3_500)).await;

        assert_eq!(session.lock().await.play.elapsed_seconds(), 3);
        timer.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_timer_never_ticks_again() {
        let (id, session) = live_session();
        session.lock().await.play.start().unwrap();
        let timer = SessionTimer::spawn(id, Arc::downgrade(&session), SseHub::new(8), TICK_PERIOD);

        tokio::time::sleep(Duration::from_millis(2_500)).await;
        timer.cancel();
        tokio::time::sleep(Duration::from_secs(10)).await;

        let live = session.lock().await;
        assert_eq!(live.play.phase(), SessionPhase::InProgress);
        assert_eq!(live.play.elapsed_seconds(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn clock_stops_itself_after_game_over() {
        let (id, session) = live_session();
        session.lock().await.play.start().unwrap();
        let timer = SessionTimer::spawn(id, Arc::downgrade(&session), SseHub::new(8), TICK_PERIOD);

        tokio::time::sleep(Duration::from_millis(1_500)).await;
        {
            let mut live = session.lock().await;
            live.submit_guess("imagine").unwrap();
        }
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(session.lock().await.play.elapsed_seconds(), 1);
        assert!(timer.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn clock_stops_when_the_session_is_dropped() {
        let (id, session) = live_session();
        session.lock().await.play.start().unwrap();
        let timer = SessionTimer::spawn(id, Arc::downgrade(&session), SseHub::new(8), TICK_PERIOD);

        drop(session);
        tokio::time::sleep(Duration::from_secs(2)).await;

        assert!(timer.is_finished());
    }
}
