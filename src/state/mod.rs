//! State management module
//!
//! This module contains the timer core (signal states, threshold
//! configuration, the session state machine) and the shared application
//! state that wraps it.

pub mod signal_state;
pub mod threshold_config;
pub mod events;
pub mod timer_session;
pub mod app_state;


// Re-export main types
pub use signal_state::{AlertCue, SignalState, Waveform};
pub use threshold_config::{SpeechPreset, ThresholdConfig};
pub use events::SessionEvent;
pub use timer_session::{SessionSnapshot, StateMark, StateTimestamps, TimerSession};
pub use app_state::AppState;
