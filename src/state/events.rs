//! Change notifications published by the timer session

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{AlertCue, SignalState};

/// One committed mutation of the session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum SessionEvent {
    ConfigChanged {
        config_id: String,
        name: String,
        at: DateTime<Utc>,
    },
    StateChanged {
        previous: SignalState,
        current: SignalState,
        /// Tone for the new state, if any
        cue: Option<AlertCue>,
        at: DateTime<Utc>,
    },
    RunningChanged {
        running: bool,
        at: DateTime<Utc>,
    },
}

impl SessionEvent {
    pub fn state_changed(previous: SignalState, current: SignalState, at: DateTime<Utc>) -> Self {
        SessionEvent::StateChanged {
            previous,
            current,
            cue: current.cue(),
            at,
        }
    }

    /// Event name used on the server-sent event stream
    pub fn event_name(&self) -> &'static str {
        match self {
            SessionEvent::ConfigChanged { .. } => "config-changed",
            SessionEvent::StateChanged { .. } => "state-changed",
            SessionEvent::RunningChanged { .. } => "running-changed",
        }
    }

    pub fn to_sse_data(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_change_carries_cue() {
        let event = SessionEvent::state_changed(SignalState::Blank, SignalState::Green, Utc::now());
        assert_eq!(event.event_name(), "state-changed");

        let value: serde_json::Value = serde_json::from_str(&event.to_sse_data()).unwrap();
        assert_eq!(value["type"], "state-changed");
        assert_eq!(value["current"], "green");
        assert_eq!(value["cue"]["frequency_hz"], 800);
    }
}
