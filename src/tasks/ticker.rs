//! Periodic tick background task

use std::sync::Arc;
use tokio::{
    sync::watch,
    time::{interval, MissedTickBehavior},
};
use tracing::{debug, error, info};

use crate::state::AppState;

/// Ticks the session while the scheduler flag is on.
///
/// The flag is driven by [`crate::scheduler::WatchScheduler`], which the
/// session switches on at start and off at pause, reset and finish. Returns
/// once the scheduler is dropped.
pub async fn ticker_task(state: Arc<AppState>, mut enabled: watch::Receiver<bool>) {
    info!("Starting ticker task ({:?} interval)", state.tick_interval);

    loop {
        // Wait until the session asks for ticks
        while !*enabled.borrow_and_update() {
            if enabled.changed().await.is_err() {
                info!("Scheduler dropped, ticker task exiting");
                return;
            }
        }

        debug!("Ticking enabled");
        let mut ticks = interval(state.tick_interval);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticks.tick() => {
                    if let Err(e) = state.tick() {
                        error!("Failed to tick timer: {}", e);
                    }
                }

                changed = enabled.changed() => {
                    if changed.is_err() {
                        info!("Scheduler dropped, ticker task exiting");
                        return;
                    }
                    if !*enabled.borrow_and_update() {
                        debug!("Ticking disabled");
                        break;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::{
        clock::ManualClock,
        scheduler::WatchScheduler,
        services::MemoryPresetStore,
        state::{SignalState, ThresholdConfig, TimerSession},
    };

    fn app(clock: &ManualClock) -> (Arc<AppState>, watch::Receiver<bool>) {
        let (scheduler, ticks) = WatchScheduler::channel();
        let session = TimerSession::new(Arc::new(clock.clone()), Box::new(scheduler));
        let state = Arc::new(AppState::new(
            session,
            Arc::new(MemoryPresetStore::new()),
            Duration::from_millis(5),
            0,
            "127.0.0.1".to_string(),
        ));
        (state, ticks)
    }

    async fn wait_for_state(state: &AppState, wanted: SignalState) -> bool {
        for _ in 0..200 {
            if state.snapshot().unwrap().state == wanted {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        false
    }

    #[tokio::test]
    async fn ticks_drive_state_while_running() {
        let clock = ManualClock::default();
        let (state, ticks) = app(&clock);
        state
            .apply_config(ThresholdConfig::new("Quick", 60, 90, 120, Some(150)))
            .unwrap();
        let task = tokio::spawn(ticker_task(Arc::clone(&state), ticks));

        state.start().unwrap();
        clock.advance_secs(61);
        assert!(wait_for_state(&state, SignalState::Green).await);

        clock.advance_secs(100);
        assert!(wait_for_state(&state, SignalState::Finish).await);
        assert!(!state.snapshot().unwrap().is_running);

        task.abort();
    }

    #[tokio::test]
    async fn paused_session_is_not_ticked() {
        let clock = ManualClock::default();
        let (state, ticks) = app(&clock);
        let task = tokio::spawn(ticker_task(Arc::clone(&state), ticks));

        state.start().unwrap();
        state.pause().unwrap();
        clock.advance_secs(10_000);
        tokio::time::sleep(Duration::from_millis(30)).await;

        let snapshot = state.snapshot().unwrap();
        assert_eq!(snapshot.state, SignalState::Blank);
        assert_eq!(snapshot.elapsed_seconds, 0);

        task.abort();
    }

    #[tokio::test]
    async fn exits_when_scheduler_dropped() {
        let clock = ManualClock::default();
        let (state, _) = app(&clock);
        let (scheduler, ticks) = WatchScheduler::channel();
        let task = tokio::spawn(ticker_task(state, ticks));

        drop(scheduler);
        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("ticker task should exit")
            .unwrap();
    }
}
