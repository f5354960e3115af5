//! Core data models for the traffic analyzer

use serde::{Deserialize, Serialize};

/// One unit of incoming traffic: a scalar measurement such as a packet
/// byte length or a synthetic volume sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Monotonic, gap-free arrival sequence number
    pub seq: u64,
    /// Unix timestamp (seconds) of arrival
    pub timestamp: i64,
    /// Measured value
    pub value: f64,
}

impl Observation {
    pub fn new(seq: u64, timestamp: i64, value: f64) -> Self {
        Self {
            seq,
            timestamp,
            value,
        }
    }
}

/// Statistical summary of a window of observations
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub mean: f64,
    pub stddev: f64,
}

/// One step's complete observable output: features, verdicts, wall-clock
/// cost of each pipeline and the dynamic window length that was in effect.
///
/// Processing times are in seconds. Feature and verdict fields are `None`
/// when that side's extraction failed for the step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    pub step_index: u64,
    pub fixed_feature: Option<FeatureVector>,
    pub fixed_verdict: Option<bool>,
    pub fixed_processing_time: f64,
    pub dynamic_feature: Option<FeatureVector>,
    pub dynamic_verdict: Option<bool>,
    pub dynamic_processing_time: f64,
    pub dynamic_window_length_used: usize,
}
