//! Analyzer configuration

use analyzer_lib::{SizingPolicy, VolumeSignal};
use anyhow::{bail, Result};
use serde::Deserialize;

/// Analyzer configuration, loaded from `ANALYZER_*` environment variables
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzerConfig {
    /// Window length of the fixed comparison pipeline
    #[serde(default = "default_fixed_window_length")]
    pub fixed_window_length: usize,

    /// Starting window length of the dynamic pipeline
    #[serde(default = "default_initial_dynamic_window_length")]
    pub initial_dynamic_window_length: usize,

    /// Sizing policy: "multiplicative" or "additive"
    #[serde(default = "default_policy")]
    pub policy: String,

    /// High-volume threshold (multiplicative policy)
    #[serde(default = "default_threshold_high")]
    pub threshold_high: Option<f64>,

    /// Low-volume threshold (multiplicative policy)
    #[serde(default = "default_threshold_low")]
    pub threshold_low: Option<f64>,

    /// Growth threshold (additive policy); no default, must be supplied
    #[serde(default)]
    pub threshold: Option<f64>,

    /// Volume signal definition: "observation_value" or "running_count"
    #[serde(default = "default_volume_signal")]
    pub volume_signal: String,

    /// Detection threshold applied to the window mean
    #[serde(default = "default_detection_threshold")]
    pub detection_threshold: f64,

    /// Optional cap on dynamic window growth
    #[serde(default)]
    pub max_dynamic_window_length: Option<usize>,

    /// Number of simulated packets to stream
    #[serde(default = "default_num_packets")]
    pub num_packets: u64,

    /// Optional RNG seed for a reproducible stream
    #[serde(default)]
    pub seed: Option<u64>,

    /// Attack burst start (packet index); burst is off unless both
    /// start and duration are set
    #[serde(default)]
    pub attack_start: Option<u64>,

    /// Attack burst duration in packets
    #[serde(default)]
    pub attack_duration: Option<u64>,

    /// Value added to each packet inside the burst
    #[serde(default = "default_attack_amplitude")]
    pub attack_amplitude: f64,
}

fn default_fixed_window_length() -> usize {
    10
}

fn default_initial_dynamic_window_length() -> usize {
    10
}

fn default_policy() -> String {
    "multiplicative".to_string()
}

fn default_threshold_high() -> Option<f64> {
    Some(400.0)
}

fn default_threshold_low() -> Option<f64> {
    Some(100.0)
}

fn default_volume_signal() -> String {
    "observation_value".to_string()
}

fn default_detection_threshold() -> f64 {
    300.0
}

fn default_num_packets() -> u64 {
    1000
}

fn default_attack_amplitude() -> f64 {
    200.0
}

impl AnalyzerConfig {
    /// Load configuration from the environment
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("ANALYZER"))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Resolve the sizing policy, failing fast on a missing threshold
    pub fn sizing_policy(&self) -> Result<SizingPolicy> {
        match self.policy.as_str() {
            "multiplicative" => match (self.threshold_high, self.threshold_low) {
                (Some(threshold_high), Some(threshold_low)) => Ok(SizingPolicy::Multiplicative {
                    threshold_high,
                    threshold_low,
                }),
                _ => bail!("multiplicative policy requires threshold_high and threshold_low"),
            },
            "additive" => match self.threshold {
                Some(threshold) => Ok(SizingPolicy::Additive { threshold }),
                None => bail!("additive policy requires threshold"),
            },
            other => bail!("unknown sizing policy: {other}"),
        }
    }

    /// Resolve the volume signal definition
    pub fn volume_signal(&self) -> Result<VolumeSignal> {
        match self.volume_signal.as_str() {
            "observation_value" => Ok(VolumeSignal::ObservationValue),
            "running_count" => Ok(VolumeSignal::RunningCount),
            other => bail!("unknown volume signal: {other}"),
        }
    }
}
