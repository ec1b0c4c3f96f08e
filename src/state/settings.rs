//! Gameplay settings persisted alongside the key bindings.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Accepted scroll speed multipliers.
pub const SCROLL_SPEED_RANGE: RangeInclusive<f64> = 0.5..=10.0;
/// Accepted judge offsets in milliseconds.
pub const JUDGE_OFFSET_RANGE: RangeInclusive<i32> = -100..=100;

const DEFAULT_SCROLL_SPEED: f64 = 3.5;

/// Life gauge used during play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum GaugeMode {
    /// Standard gauge.
    #[default]
    Normal,
    /// Small recovery, fails on empty.
    Hard,
    /// Large recovery.
    Easy,
}

/// Reasons a settings value is refused.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SettingsError {
    #[error("scroll speed {0} is outside 0.5..=10.0")]
    ScrollSpeedOutOfRange(f64),
    #[error("judge offset {0}ms is outside -100..=100")]
    JudgeOffsetOutOfRange(i32),
}

/// Validated gameplay settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GameplaySettings {
    scroll_speed: f64,
    gauge_mode: GaugeMode,
    judge_offset: i32,
}

impl Default for GameplaySettings {
    fn default() -> Self {
        Self {
            scroll_speed: DEFAULT_SCROLL_SPEED,
            gauge_mode: GaugeMode::Normal,
            judge_offset: 0,
        }
    }
}

impl GameplaySettings {
    /// Build settings, rejecting out-of-range values.
    pub fn new(
        scroll_speed: f64,
        gauge_mode: GaugeMode,
        judge_offset: i32,
    ) -> Result<Self, SettingsError> {
        let mut settings = Self::default();
        settings.set_scroll_speed(scroll_speed)?;
        settings.set_judge_offset(judge_offset)?;
        settings.gauge_mode = gauge_mode;
        Ok(settings)
    }

    pub fn scroll_speed(&self) -> f64 {
        self.scroll_speed
    }

    pub fn gauge_mode(&self) -> GaugeMode {
        self.gauge_mode
    }

    pub fn judge_offset(&self) -> i32 {
        self.judge_offset
    }

    /// Update the scroll speed; NaN and out-of-range values are refused.
    pub fn set_scroll_speed(&mut self, value: f64) -> Result<(), SettingsError> {
        if !SCROLL_SPEED_RANGE.contains(&value) {
            return Err(SettingsError::ScrollSpeedOutOfRange(value));
        }
        self.scroll_speed = value;
        Ok(())
    }

    pub fn set_gauge_mode(&mut self, mode: GaugeMode) {
        self.gauge_mode = mode;
    }

    /// Update the judge offset in milliseconds.
    pub fn set_judge_offset(&mut self, value: i32) -> Result<(), SettingsError> {
        if !JUDGE_OFFSET_RANGE.contains(&value) {
            return Err(SettingsError::JudgeOffsetOutOfRange(value));
        }
        self.judge_offset = value;
        Ok(())
    }
}
