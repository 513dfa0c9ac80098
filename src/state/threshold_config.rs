//! Threshold configuration and the built-in speech presets

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TimerError;

/// Named set of thresholds, in seconds from the start of the speech
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    #[serde(default = "new_id")]
    pub id: String,
    pub name: String,
    pub green_time: i64,
    pub orange_time: i64,
    pub red_time: i64,
    /// Timer stops itself here; `None` runs until paused or reset
    #[serde(default)]
    pub finish_time: Option<i64>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub last_used_at: Option<DateTime<Utc>>,
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

impl ThresholdConfig {
    /// Create a configuration with a fresh id. Not validated.
    pub fn new(
        name: impl Into<String>,
        green_time: i64,
        orange_time: i64,
        red_time: i64,
        finish_time: Option<i64>,
    ) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            green_time,
            orange_time,
            red_time,
            finish_time,
            created_at: Utc::now(),
            last_used_at: None,
        }
    }

    /// Every violated ordering rule, or an empty list when valid
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.green_time <= 0 {
            errors.push("Green time must be greater than zero.".to_string());
        }
        if self.orange_time <= self.green_time {
            errors.push("Orange time must be greater than Green time.".to_string());
        }
        if self.red_time <= self.orange_time {
            errors.push("Red time must be greater than Orange time.".to_string());
        }
        if let Some(finish) = self.finish_time {
            if finish <= self.red_time {
                errors.push("Finish time must be greater than Red time.".to_string());
            }
        }

        errors
    }

    pub fn ensure_valid(&self) -> Result<(), TimerError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(TimerError::Validation(errors))
        }
    }

    pub fn preset(kind: SpeechPreset) -> Self {
        let (name, green, orange, red, finish) = match kind {
            SpeechPreset::TableTopics => ("Table Topics", 60, 90, 120, Some(150)),
            SpeechPreset::IceBreaker => ("Ice Breaker (4-6 min)", 240, 300, 360, Some(420)),
            SpeechPreset::Evaluation => ("Evaluation (2-3 min)", 120, 150, 180, Some(210)),
            SpeechPreset::PreparedSpeech => {
                ("Prepared Speech (5-7 min)", 300, 360, 420, Some(480))
            }
            SpeechPreset::Custom => ("Custom Speech", 180, 240, 300, None),
        };
        Self::new(name, green, orange, red, finish)
    }
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self::preset(SpeechPreset::Custom)
    }
}

/// Common speech formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechPreset {
    TableTopics,
    IceBreaker,
    Evaluation,
    PreparedSpeech,
    Custom,
}

impl SpeechPreset {
    /// Presets seeded into an empty store
    pub const DEFAULTS: [SpeechPreset; 4] = [
        SpeechPreset::TableTopics,
        SpeechPreset::IceBreaker,
        SpeechPreset::Evaluation,
        SpeechPreset::PreparedSpeech,
    ];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_are_valid() {
        for kind in SpeechPreset::DEFAULTS.into_iter().chain([SpeechPreset::Custom]) {
            let config = ThresholdConfig::preset(kind);
            assert!(config.validate().is_empty(), "{} should be valid", config.name);
        }
    }

    #[test]
    fn presets_get_distinct_ids() {
        let a = ThresholdConfig::preset(SpeechPreset::TableTopics);
        let b = ThresholdConfig::preset(SpeechPreset::TableTopics);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn validate_reports_every_violation() {
        let config = ThresholdConfig::new("broken", 0, 0, 0, Some(0));
        let errors = config.validate();
        assert_eq!(errors.len(), 4);
        assert_eq!(errors[0], "Green time must be greater than zero.");
        assert_eq!(errors[3], "Finish time must be greater than Red time.");
    }

    #[test]
    fn equal_thresholds_are_rejected() {
        let config = ThresholdConfig::new("tie", 60, 60, 120, None);
        assert_eq!(
            config.validate(),
            vec!["Orange time must be greater than Green time.".to_string()]
        );

        let config = ThresholdConfig::new("tie", 60, 90, 120, Some(120));
        assert_eq!(config.validate().len(), 1);
    }

    #[test]
    fn finish_is_optional() {
        let config = ThresholdConfig::new("open", 1, 2, 3, None);
        assert!(config.ensure_valid().is_ok());
    }

    #[test]
    fn ensure_valid_wraps_messages() {
        let config = ThresholdConfig::new("bad", -5, 10, 20, None);
        match config.ensure_valid() {
            Err(TimerError::Validation(errors)) => assert_eq!(errors.len(), 1),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn deserialize_fills_defaults() {
        let json = r#"{"name":"Quick","green_time":10,"orange_time":20,"red_time":30}"#;
        let config: ThresholdConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.finish_time, None);
        assert_eq!(config.last_used_at, None);
        assert!(Uuid::parse_str(&config.id).is_ok());
    }
}
