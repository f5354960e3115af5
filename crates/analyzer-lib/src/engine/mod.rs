//! Dual-pipeline evaluation engine
//!
//! Drives the fixed-window and dynamic-window pipelines one observation
//! at a time and records per-step features, verdicts and wall-clock
//! processing cost so the two strategies can be compared.

mod r#loop;
mod output;

pub use output::{to_jsonl, RecordWriter};
pub use r#loop::EvaluationLoop;

use crate::controller::{SizingPolicy, VolumeSignal};
use thiserror::Error;

/// Invalid engine configuration, rejected before any observation is
/// processed
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be >= 1, got {value}")]
    WindowLength { name: &'static str, value: usize },

    #[error("multiplicative thresholds must satisfy low < high, got low={low}, high={high}")]
    Thresholds { low: f64, high: f64 },

    #[error("max_dynamic_window_length {max} is below initial dynamic length {initial}")]
    MaxLength { max: usize, initial: usize },
}

/// Engine configuration; every knob is explicit
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Window length of the fixed pipeline; never changes after startup
    pub fixed_window_length: usize,
    /// Starting window length of the dynamic pipeline
    pub initial_dynamic_window_length: usize,
    /// Window sizing strategy for the dynamic pipeline
    pub policy: SizingPolicy,
    /// Definition of the volume signal fed to the controller
    pub volume_signal: VolumeSignal,
    /// Detection threshold applied to the window mean
    pub detection_threshold: f64,
    /// Optional cap on dynamic window growth. `None` leaves growth
    /// unbounded under sustained high volume; that resource hazard is
    /// the caller's to manage.
    pub max_dynamic_window_length: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fixed_window_length: 10,
            initial_dynamic_window_length: 10,
            policy: SizingPolicy::default(),
            volume_signal: VolumeSignal::default(),
            detection_threshold: 1.5,
            max_dynamic_window_length: None,
        }
    }
}

impl EngineConfig {
    /// Fail-fast validation; runs before any observation is admitted
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fixed_window_length < 1 {
            return Err(ConfigError::WindowLength {
                name: "fixed_window_length",
                value: self.fixed_window_length,
            });
        }
        if self.initial_dynamic_window_length < 1 {
            return Err(ConfigError::WindowLength {
                name: "initial_dynamic_window_length",
                value: self.initial_dynamic_window_length,
            });
        }
        if let SizingPolicy::Multiplicative {
            threshold_high,
            threshold_low,
        } = self.policy
        {
            if threshold_low >= threshold_high {
                return Err(ConfigError::Thresholds {
                    low: threshold_low,
                    high: threshold_high,
                });
            }
        }
        if let Some(max) = self.max_dynamic_window_length {
            if max < self.initial_dynamic_window_length {
                return Err(ConfigError::MaxLength {
                    max,
                    initial: self.initial_dynamic_window_length,
                });
            }
        }
        Ok(())
    }
}
