//! Signal states shown to the speaker

use std::fmt;

use serde::{Deserialize, Serialize};

/// Discrete phase of a timed speech.
///
/// `Start` through `Red` form a severity ladder; `Finish` sits outside it and
/// is reached only when a finish time is configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalState {
    /// Configured but not yet started
    Start,
    /// Running, below the green threshold
    Blank,
    Green,
    Orange,
    Red,
    /// Timer stopped itself at the finish threshold
    Finish,
}

impl SignalState {
    pub const COUNT: usize = 6;

    pub const ALL: [SignalState; Self::COUNT] = [
        SignalState::Start,
        SignalState::Blank,
        SignalState::Green,
        SignalState::Orange,
        SignalState::Red,
        SignalState::Finish,
    ];

    /// Stable slot used by per-state tables
    pub const fn index(self) -> usize {
        match self {
            SignalState::Start => 0,
            SignalState::Blank => 1,
            SignalState::Green => 2,
            SignalState::Orange => 3,
            SignalState::Red => 4,
            SignalState::Finish => 5,
        }
    }

    /// Position on the severity ladder, `None` for `Finish`
    pub fn severity(self) -> Option<u8> {
        match self {
            SignalState::Finish => None,
            other => Some(other.index() as u8),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SignalState::Start => "start",
            SignalState::Blank => "blank",
            SignalState::Green => "green",
            SignalState::Orange => "orange",
            SignalState::Red => "red",
            SignalState::Finish => "finish",
        }
    }

    /// Tone announcing this state, if it has one
    pub fn cue(self) -> Option<AlertCue> {
        match self {
            SignalState::Start | SignalState::Blank => None,
            SignalState::Green => Some(AlertCue::new(800, 500, Waveform::Sine)),
            SignalState::Orange => Some(AlertCue::new(600, 500, Waveform::Triangle)),
            SignalState::Red => Some(AlertCue::new(400, 800, Waveform::Sawtooth)),
            SignalState::Finish => Some(AlertCue::new(700, 1000, Waveform::Sine)),
        }
    }
}

impl fmt::Display for SignalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Waveform {
    Sine,
    Triangle,
    Sawtooth,
}

/// Tone description a presentation layer can play on a state change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertCue {
    pub frequency_hz: u32,
    pub duration_ms: u32,
    pub waveform: Waveform,
}

impl AlertCue {
    pub const fn new(frequency_hz: u32, duration_ms: u32, waveform: Waveform) -> Self {
        Self {
            frequency_hz,
            duration_ms,
            waveform,
        }
    }
}
