//! Timer session: elapsed-time accounting and threshold-driven signal state
//!
//! # Lifecycle
//!
//! 1. `set_config` installs validated thresholds (only while stopped)
//! 2. `start` begins a fresh run, or resumes a paused one
//! 3. `tick` is called periodically while running and moves the signal up
//!    the Blank → Green → Orange → Red ladder, or to Finish
//! 4. `pause` freezes elapsed time, `reset` returns to Start
//!
//! Every committed change of state, running flag or configuration is
//! published once on a broadcast channel; ticks that change nothing publish
//! nothing.

use std::{fmt, sync::Arc};

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, info};

use super::{SessionEvent, SignalState, ThresholdConfig};
use crate::{clock::Clock, error::TimerError, scheduler::TickScheduler};

const EVENT_CAPACITY: usize = 64;

/// First-entry instant of each state during the current run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateTimestamps {
    slots: [Option<DateTime<Utc>>; SignalState::COUNT],
}

impl StateTimestamps {
    pub fn get(&self, state: SignalState) -> Option<DateTime<Utc>> {
        self.slots[state.index()]
    }

    /// Record `at` unless the state already has a timestamp.
    /// Returns whether anything was written.
    pub fn record_first(&mut self, state: SignalState, at: DateTime<Utc>) -> bool {
        let slot = &mut self.slots[state.index()];
        if slot.is_some() {
            return false;
        }
        *slot = Some(at);
        true
    }

    pub fn clear(&mut self) {
        self.slots = [None; SignalState::COUNT];
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Reached states in ladder order
    pub fn iter(&self) -> impl Iterator<Item = (SignalState, DateTime<Utc>)> + '_ {
        SignalState::ALL
            .into_iter()
            .filter_map(|state| self.get(state).map(|at| (state, at)))
    }
}

/// Highest threshold reached at `seconds`, ignoring the finish time
pub fn ladder_state(config: &ThresholdConfig, seconds: i64) -> SignalState {
    if seconds >= config.red_time {
        SignalState::Red
    } else if seconds >= config.orange_time {
        SignalState::Orange
    } else if seconds >= config.green_time {
        SignalState::Green
    } else {
        SignalState::Blank
    }
}

/// Render elapsed time as `mm:ss`; minutes keep counting past 59
pub fn format_elapsed(elapsed: TimeDelta) -> String {
    let total = elapsed.num_seconds().max(0);
    format!("{:02}:{:02}", total / 60, total % 60)
}

/// The running timer
pub struct TimerSession {
    config: ThresholdConfig,
    state: SignalState,
    is_running: bool,
    start_reference: DateTime<Utc>,
    paused_at: Option<DateTime<Utc>>,
    elapsed_when_paused: TimeDelta,
    /// Elapsed time at the sample that reached Finish
    finished_elapsed: Option<TimeDelta>,
    timestamps: StateTimestamps,
    clock: Arc<dyn Clock>,
    scheduler: Box<dyn TickScheduler>,
    events: broadcast::Sender<SessionEvent>,
}

impl TimerSession {
    /// Create a stopped session using the Custom Speech preset
    pub fn new(clock: Arc<dyn Clock>, scheduler: Box<dyn TickScheduler>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let now = clock.now();

        Self {
            config: ThresholdConfig::default(),
            state: SignalState::Start,
            is_running: false,
            start_reference: now,
            paused_at: None,
            elapsed_when_paused: TimeDelta::zero(),
            finished_elapsed: None,
            timestamps: StateTimestamps::default(),
            clock,
            scheduler,
            events,
        }
    }

    /// Receive every committed change from now on
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// The active thresholds
    pub fn config(&self) -> &ThresholdConfig {
        &self.config
    }

    /// Current signal shown to the speaker
    pub fn state(&self) -> SignalState {
        self.state
    }

    /// Whether the timer is counting (and ticking)
    pub fn is_running(&self) -> bool {
        self.is_running
    }

    /// Stopped mid-run with elapsed time frozen
    pub fn is_paused(&self) -> bool {
        self.paused_at.is_some()
    }

    /// Install a new configuration.
    ///
    /// Returns the configuration as stored, with `last_used_at` stamped, so
    /// the caller can persist it.
    pub fn set_config(&mut self, mut config: ThresholdConfig) -> Result<ThresholdConfig, TimerError> {
        if self.is_running {
            return Err(TimerError::InvalidOperation(
                "cannot change configuration while timer is running".to_string(),
            ));
        }
        config.ensure_valid()?;

        let now = self.clock.now();
        config.last_used_at = Some(now);
        self.config = config.clone();
        self.finished_elapsed = None;
        info!(
            "Configuration set to '{}' (green={}s, orange={}s, red={}s, finish={:?})",
            config.name, config.green_time, config.orange_time, config.red_time, config.finish_time
        );

        self.publish(SessionEvent::ConfigChanged {
            config_id: config.id.clone(),
            name: config.name.clone(),
            at: now,
        });
        self.apply_state(SignalState::Start, now);

        Ok(config)
    }

    /// Start a fresh run, or resume after `pause`. No-op while running.
    ///
    /// A finished timer must be reset first.
    pub fn start(&mut self) -> Result<(), TimerError> {
        if self.is_running {
            debug!("Start requested while already running");
            return Ok(());
        }
        if self.state == SignalState::Finish {
            return Err(TimerError::InvalidOperation(
                "timer has finished; reset before starting again".to_string(),
            ));
        }

        let now = self.clock.now();
        match self.paused_at.take() {
            Some(paused_at) => {
                self.start_reference += now - paused_at;
                info!("Timer resumed at {}", format_elapsed(self.elapsed_when_paused));
            }
            None => {
                self.start_reference = now;
                self.elapsed_when_paused = TimeDelta::zero();
                self.finished_elapsed = None;
                self.timestamps.clear();
                self.timestamps.record_first(SignalState::Start, now);
                self.enter_state(SignalState::Blank, now);
                info!("Timer started with '{}'", self.config.name);
            }
        }

        self.scheduler.start_ticking();
        self.set_running(true, now);
        Ok(())
    }

    /// Freeze elapsed time. No-op unless running.
    pub fn pause(&mut self) {
        if !self.is_running {
            debug!("Pause requested while not running");
            return;
        }

        let now = self.clock.now();
        self.scheduler.stop_ticking();
        self.elapsed_when_paused = self.running_elapsed(now);
        self.paused_at = Some(now);
        self.set_running(false, now);
        info!("Timer paused at {}", format_elapsed(self.elapsed_when_paused));
    }

    /// Stop, clear history and return to Start
    pub fn reset(&mut self) {
        let now = self.clock.now();
        self.scheduler.stop_ticking();
        self.paused_at = None;
        self.elapsed_when_paused = TimeDelta::zero();
        self.finished_elapsed = None;
        self.timestamps.clear();
        self.set_running(false, now);
        self.apply_state(SignalState::Start, now);
        self.start_reference = now;
        info!("Timer reset");
    }

    /// Running: time since start, minus pauses. Paused: the frozen value.
    /// Otherwise (never started, reset, or finished) zero.
    pub fn elapsed(&self) -> TimeDelta {
        if self.is_running {
            self.running_elapsed(self.clock.now())
        } else if self.paused_at.is_some() {
            self.elapsed_when_paused
        } else {
            TimeDelta::zero()
        }
    }

    /// Whole seconds elapsed; the only input to state derivation
    pub fn elapsed_seconds(&self) -> i64 {
        self.elapsed().num_seconds()
    }

    /// When `state` was first entered this run, if it has been
    pub fn state_timestamp(&self, state: SignalState) -> Option<DateTime<Utc>> {
        self.timestamps.get(state)
    }

    /// `timestamp(to) - timestamp(from)`, in whatever order the caller asks
    pub fn duration_between(&self, from: SignalState, to: SignalState) -> Option<TimeDelta> {
        Some(self.state_timestamp(to)? - self.state_timestamp(from)?)
    }

    /// Final elapsed time of a run that reached Finish; cleared by reset,
    /// a fresh start or a new configuration
    pub fn finished_elapsed(&self) -> Option<TimeDelta> {
        self.finished_elapsed
    }

    /// History of the current run
    pub fn timestamps(&self) -> &StateTimestamps {
        &self.timestamps
    }

    /// Re-derive the signal state from elapsed time. Does nothing unless running.
    pub fn tick(&mut self) {
        if !self.is_running {
            return;
        }

        let now = self.clock.now();
        let elapsed = self.running_elapsed(now);
        let seconds = elapsed.num_seconds();

        if let Some(finish) = self.config.finish_time {
            if seconds >= finish {
                self.scheduler.stop_ticking();
                self.finished_elapsed = Some(elapsed);
                self.set_running(false, now);
                self.enter_state(SignalState::Finish, now);
                info!("Finish time reached at {}", format_elapsed(elapsed));
                return;
            }
        }

        let next = ladder_state(&self.config, seconds);
        if !self.enter_state(next, now) {
            debug!("Tick at {}s, state unchanged ({})", seconds, self.state);
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let elapsed = self.elapsed();
        let started = self.timestamps.get(SignalState::Start);
        let history = self
            .timestamps
            .iter()
            .map(|(state, reached_at)| StateMark {
                state,
                reached_at,
                offset_ms: started.map(|start| (reached_at - start).num_milliseconds()),
            })
            .collect();

        SessionSnapshot {
            state: self.state,
            is_running: self.is_running,
            is_paused: self.is_paused(),
            elapsed_seconds: elapsed.num_seconds(),
            elapsed_formatted: format_elapsed(elapsed),
            finished_elapsed_seconds: self.finished_elapsed.map(|d| d.num_seconds()),
            config: self.config.clone(),
            history,
        }
    }

    fn running_elapsed(&self, now: DateTime<Utc>) -> TimeDelta {
        (now - self.start_reference).max(TimeDelta::zero())
    }

    /// Move to `next` and timestamp it if this is its first entry this run
    fn enter_state(&mut self, next: SignalState, now: DateTime<Utc>) -> bool {
        if !self.apply_state(next, now) {
            return false;
        }
        self.timestamps.record_first(next, now);
        true
    }

    fn apply_state(&mut self, next: SignalState, now: DateTime<Utc>) -> bool {
        if self.state == next {
            return false;
        }
        let previous = self.state;
        self.state = next;
        info!("Signal {} -> {}", previous, next);
        self.publish(SessionEvent::state_changed(previous, next, now));
        true
    }

    fn set_running(&mut self, running: bool, now: DateTime<Utc>) {
        if self.is_running == running {
            return;
        }
        self.is_running = running;
        self.publish(SessionEvent::RunningChanged { running, at: now });
    }

    fn publish(&self, event: SessionEvent) {
        // No subscribers is normal when nothing is watching the display
        if self.events.send(event).is_err() {
            debug!("No subscribers for session event");
        }
    }
}

impl fmt::Debug for TimerSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerSession")
            .field("config", &self.config.name)
            .field("state", &self.state)
            .field("is_running", &self.is_running)
            .field("paused_at", &self.paused_at)
            .field("elapsed_when_paused", &self.elapsed_when_paused)
            .field("finished_elapsed", &self.finished_elapsed)
            .finish_non_exhaustive()
    }
}

/// A reached state and when
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateMark {
    pub state: SignalState,
    pub reached_at: DateTime<Utc>,
    /// Wall-clock milliseconds since Start, pauses included
    pub offset_ms: Option<i64>,
}

/// Point-in-time view of the session for status reporting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub state: SignalState,
    pub is_running: bool,
    pub is_paused: bool,
    pub elapsed_seconds: i64,
    pub elapsed_formatted: String,
    /// Set once the run stopped itself at the finish time
    pub finished_elapsed_seconds: Option<i64>,
    pub config: ThresholdConfig,
    pub history: Vec<StateMark>,
}
