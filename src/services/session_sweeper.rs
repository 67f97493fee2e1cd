use std::time::Duration;

use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info};

use crate::{services::sse_events, state::SharedState};

/// How often idle sessions are looked for.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Periodically drop live sessions idle for longer than the configured
/// retention. Never returns.
pub async fn run(state: SharedState) {
    let mut ticker = interval(SWEEP_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        sweep(&state).await;
    }
}

/// Run a single eviction pass. Returns the number of dropped sessions.
pub async fn sweep(state: &SharedState) -> usize {
    let retention = state.config().session_retention();
    let evicted = state.sessions().evict_expired(retention).await;
    for id in &evicted {
        sse_events::broadcast_closed(state.sse(), *id);
    }

    let evicted = evicted.len();
    if evicted > 0 {
        info!(
            evicted,
            remaining = state.sessions().len(),
            "evicted idle play sessions"
        );
    } else {
        debug!(remaining = state.sessions().len(), "no idle play session to evict");
    }
    evicted
}
