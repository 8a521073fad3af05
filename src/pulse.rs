//! Pulse parameter records.

use serde::{Deserialize, Serialize};

/// How a pulse is triggered relative to other pulses.
///
/// Informational on the host: the device only learns about a dependency
/// through an explicit secondary link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trigger {
    /// Runs on its own schedule.
    #[default]
    Independent,
    /// Gated by a primary pulse.
    Secondary,
}

/// One timed output on a microcontroller pin.
///
/// All times are milliseconds. `analog_value` is the output intensity,
/// 0 (off) to 255 (full).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PulseParams {
    /// Output channel on the device.
    pub pin: u8,
    /// Delay from experiment start to the first pulse.
    #[serde(default, alias = "offset")]
    pub offset_ms: u64,
    /// Time between successive pulse starts.
    #[serde(alias = "period")]
    pub period_ms: u64,
    /// Time the output stays on.
    #[serde(alias = "duration")]
    pub duration_ms: u64,
    /// Output intensity.
    #[serde(default = "full_intensity")]
    pub analog_value: u8,
    /// Trigger mode.
    #[serde(default)]
    pub trigger: Trigger,
}

fn full_intensity() -> u8 {
    u8::MAX
}

impl PulseParams {
    /// Independent full-intensity pulse starting at experiment start.
    pub fn new(pin: u8, period_ms: u64, duration_ms: u64) -> Self {
        Self {
            pin,
            offset_ms: 0,
            period_ms,
            duration_ms,
            analog_value: full_intensity(),
            trigger: Trigger::Independent,
        }
    }

    /// Set the delay before the first pulse.
    pub fn with_offset(mut self, offset_ms: u64) -> Self {
        self.offset_ms = offset_ms;
        self
    }

    /// Set the output intensity.
    pub fn with_intensity(mut self, analog_value: u8) -> Self {
        self.analog_value = analog_value;
        self
    }

    /// Mark the pulse as gated by a primary.
    pub fn as_secondary(mut self) -> Self {
        self.trigger = Trigger::Secondary;
        self
    }

    /// True when the pulse is meant to be gated by another.
    pub fn is_secondary(&self) -> bool {
        self.trigger == Trigger::Secondary
    }
}
