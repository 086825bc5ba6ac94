/// Dialogue tuning loaded from RON.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DialogueConfig {
    /// Seconds between two revealed characters.
    pub typing_speed_secs: f32,
    /// Seconds a finished session lingers before teardown.
    pub finish_delay_secs: f32,
    /// Size of the pre-allocated choice widget pool.
    pub choice_slots: usize,
    pub tick_sound: bool,
    /// Inclusive pitch range for the per-character tick.
    pub tick_pitch: (f32, f32),
    /// Show choices as soon as the last line before them is fully revealed,
    /// instead of waiting for one more advance press.
    pub present_choices_on_reveal_end: bool,
    pub seed: u64,
}

impl Default for DialogueConfig {
    fn default() -> Self {
        Self {
            typing_speed_secs: 0.04,
            finish_delay_secs: 2.0,
            choice_slots: 4,
            tick_sound: true,
            tick_pitch: (0.8, 1.3),
            present_choices_on_reveal_end: false,
            seed: 0,
        }
    }
}

impl DialogueConfig {
    pub fn load_from_ron(path: &Path) -> Result<DialogueConfig, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    pub fn parse_ron(input: &str) -> Result<DialogueConfig, ConfigError> {
        let config: DialogueConfig = ron::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.typing_speed_secs.is_finite() || self.typing_speed_secs < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "typing_speed_secs must be a non-negative number, got {}",
                self.typing_speed_secs
            )));
        }
        if !self.finish_delay_secs.is_finite() || self.finish_delay_secs < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "finish_delay_secs must be a non-negative number, got {}",
                self.finish_delay_secs
            )));
        }
        let (lo, hi) = self.tick_pitch;
        if !(lo.is_finite() && hi.is_finite()) || lo > hi {
            return Err(ConfigError::Invalid(format!(
                "tick_pitch range ({}, {}) is not ordered",
                lo, hi
            )));
        }
        Ok(())
    }

    pub fn typing_speed(&self) -> Duration {
        secs_to_duration(self.typing_speed_secs)
    }

    pub fn finish_delay(&self) -> Duration {
        secs_to_duration(self.finish_delay_secs)
    }

    pub fn with_typing_speed(mut self, secs: f32) -> Self {
        self.typing_speed_secs = secs;
        self
    }

    pub fn with_choice_slots(mut self, slots: usize) -> Self {
        self.choice_slots = slots;
        self
    }

    pub fn with_finish_delay(mut self, secs: f32) -> Self {
        self.finish_delay_secs = secs;
        self
    }

    pub fn with_choices_on_reveal_end(mut self, enabled: bool) -> Self {
        self.present_choices_on_reveal_end = enabled;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Whole microseconds, so `0.05` is exactly 50ms rather than the nearest `f32`.
/// Negative or non-finite values map to zero.
fn secs_to_duration(secs: f32) -> Duration {
    if !secs.is_finite() || secs <= 0.0 {
        return Duration::ZERO;
    }
    Duration::from_micros((f64::from(secs) * 1_000_000.0).round() as u64)
}
