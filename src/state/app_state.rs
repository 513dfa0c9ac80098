//! Main application state management

use std::{
    sync::{Arc, Mutex, MutexGuard},
    time::{Duration, Instant},
};
use tokio::sync::broadcast;
use tracing::{info, warn};

use super::{SessionEvent, SessionSnapshot, ThresholdConfig, TimerSession};
use crate::{error::AppError, services::PresetStore};

/// Main application state shared by the HTTP handlers and the tick task
pub struct AppState {
    /// The timer; every mutation goes through this lock
    pub session: Mutex<TimerSession>,
    /// Named threshold configurations
    pub presets: Arc<dyn PresetStore>,
    /// How often the tick task samples the clock
    pub tick_interval: Duration,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
}

impl AppState {
    pub fn new(
        session: TimerSession,
        presets: Arc<dyn PresetStore>,
        tick_interval: Duration,
        port: u16,
        host: String,
    ) -> Self {
        Self {
            session: Mutex::new(session),
            presets,
            tick_interval,
            start_time: Instant::now(),
            port,
            host,
        }
    }

    fn lock_session(&self) -> Result<MutexGuard<'_, TimerSession>, AppError> {
        self.session
            .lock()
            .map_err(|e| AppError::Lock(e.to_string()))
    }

    pub fn start(&self) -> Result<SessionSnapshot, AppError> {
        let mut session = self.lock_session()?;
        session.start()?;
        Ok(session.snapshot())
    }

    pub fn pause(&self) -> Result<SessionSnapshot, AppError> {
        let mut session = self.lock_session()?;
        session.pause();
        Ok(session.snapshot())
    }

    pub fn reset(&self) -> Result<SessionSnapshot, AppError> {
        let mut session = self.lock_session()?;
        session.reset();
        Ok(session.snapshot())
    }

    /// Called by the tick task
    pub fn tick(&self) -> Result<(), AppError> {
        self.lock_session()?.tick();
        Ok(())
    }

    pub fn snapshot(&self) -> Result<SessionSnapshot, AppError> {
        Ok(self.lock_session()?.snapshot())
    }

    pub fn subscribe(&self) -> Result<broadcast::Receiver<SessionEvent>, AppError> {
        Ok(self.lock_session()?.subscribe())
    }

    /// Apply an ad-hoc configuration without storing it
    pub fn apply_config(&self, config: ThresholdConfig) -> Result<SessionSnapshot, AppError> {
        let mut session = self.lock_session()?;
        session.set_config(config)?;
        Ok(session.snapshot())
    }

    /// Apply a stored preset and write back its `last_used_at` stamp
    pub fn apply_preset(&self, id: &str) -> Result<SessionSnapshot, AppError> {
        let config = self
            .presets
            .get_config(id)
            .ok_or_else(|| AppError::PresetNotFound(id.to_string()))?;

        let (applied, snapshot) = {
            let mut session = self.lock_session()?;
            let applied = session.set_config(config)?;
            (applied, session.snapshot())
        };

        // The timer already runs with the preset; a failed stamp is not fatal.
        // Update only, so a preset deleted meanwhile stays deleted.
        match self.presets.update_config(applied) {
            Ok(true) => {}
            Ok(false) => warn!("Preset {} was deleted while being applied", id),
            Err(e) => warn!("Failed to record preset usage for {}: {}", id, e),
        }
        info!("Applied preset {}", id);

        Ok(snapshot)
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        clock::{Clock, ManualClock},
        error::TimerError,
        scheduler::ManualScheduler,
        services::{MemoryPresetStore, PresetStore},
        state::SignalState,
    };

    fn app() -> (AppState, ManualClock, Arc<MemoryPresetStore>) {
        let clock = ManualClock::default();
        let session = TimerSession::new(Arc::new(clock.clone()), Box::new(ManualScheduler::new()));
        let store = Arc::new(MemoryPresetStore::new());
        let state = AppState::new(
            session,
            store.clone(),
            Duration::from_millis(100),
            0,
            "127.0.0.1".to_string(),
        );
        (state, clock, store)
    }

    #[test]
    fn apply_preset_stamps_and_persists() {
        let (state, clock, store) = app();
        clock.advance_secs(1_000);
        let preset = ThresholdConfig::new("Lightning", 30, 45, 60, Some(75));
        store.save_config(preset.clone()).unwrap();

        let snapshot = state.apply_preset(&preset.id).unwrap();

        assert_eq!(snapshot.config.id, preset.id);
        assert_eq!(snapshot.state, SignalState::Start);
        let stored = store.get_config(&preset.id).unwrap();
        assert_eq!(stored.last_used_at, Some(clock.now()));
    }

    /// Deletes each record right after handing it out, like a concurrent
    /// `DELETE /presets/:id` landing between lookup and stamping
    struct VanishingStore(MemoryPresetStore);

    impl PresetStore for VanishingStore {
        fn list_configs(&self) -> Vec<ThresholdConfig> {
            self.0.list_configs()
        }

        fn save_config(&self, config: ThresholdConfig) -> Result<(), crate::error::StoreError> {
            self.0.save_config(config)
        }

        fn update_config(&self, config: ThresholdConfig) -> Result<bool, crate::error::StoreError> {
            self.0.update_config(config)
        }

        fn delete_config(&self, id: &str) -> Result<bool, crate::error::StoreError> {
            self.0.delete_config(id)
        }

        fn get_config(&self, id: &str) -> Option<ThresholdConfig> {
            let found = self.0.get_config(id);
            let _ = self.0.delete_config(id);
            found
        }
    }

    #[test]
    fn apply_preset_does_not_resurrect_deleted_preset() {
        let clock = ManualClock::default();
        let session = TimerSession::new(Arc::new(clock), Box::new(ManualScheduler::new()));
        let store = Arc::new(VanishingStore(MemoryPresetStore::new()));
        let preset = ThresholdConfig::new("Short-lived", 30, 45, 60, None);
        store.save_config(preset.clone()).unwrap();
        let state = AppState::new(
            session,
            store.clone(),
            Duration::from_millis(100),
            0,
            "127.0.0.1".to_string(),
        );

        let snapshot = state.apply_preset(&preset.id).unwrap();

        assert_eq!(snapshot.config.id, preset.id);
        assert!(store.list_configs().is_empty());
    }

    #[test]
    fn apply_unknown_preset_fails() {
        let (state, _, _) = app();
        assert!(matches!(
            state.apply_preset("missing"),
            Err(AppError::PresetNotFound(id)) if id == "missing"
        ));
    }

    #[test]
    fn apply_preset_while_running_leaves_store_untouched() {
        let (state, _, store) = app();
        let preset = ThresholdConfig::new("Lightning", 30, 45, 60, None);
        store.save_config(preset.clone()).unwrap();
        state.start().unwrap();

        let result = state.apply_preset(&preset.id);

        assert!(matches!(
            result,
            Err(AppError::Timer(TimerError::InvalidOperation(_)))
        ));
        assert_eq!(store.get_config(&preset.id).unwrap().last_used_at, None);
    }

    #[test]
    fn tick_moves_state_through_shared_lock() {
        let (state, clock, _) = app();
        state
            .apply_config(ThresholdConfig::new("Quick", 5, 10, 15, None))
            .unwrap();
        state.start().unwrap();

        clock.advance_secs(11);
        state.tick().unwrap();

        assert_eq!(state.snapshot().unwrap().state, SignalState::Orange);
    }

    #[test]
    fn uptime_formats_seconds() {
        let (state, _, _) = app();
        assert!(state.get_uptime().ends_with('s'));
    }
}
