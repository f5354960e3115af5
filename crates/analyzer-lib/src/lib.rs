//! Adaptive windowing and detection engine for traffic streams
//!
//! This crate provides the core functionality for:
//! - Maintaining fixed and dynamically resized windows over a stream
//! - Hysteresis-based window size control
//! - Statistical feature extraction and threshold detection
//! - Side-by-side evaluation with per-step cost accounting

pub mod controller;
pub mod detector;
pub mod engine;
pub mod features;
pub mod models;
pub mod observability;
pub mod source;
pub mod window;

pub use controller::{SizingPolicy, VolumeSignal, WindowSizeController};
pub use detector::detect;
pub use engine::{to_jsonl, ConfigError, EngineConfig, EvaluationLoop, RecordWriter};
pub use features::{EmptyWindowError, FeatureExtractor};
pub use models::*;
pub use observability::EngineMetrics;
pub use source::{spawn_source, ObservationSource, ReplaySource, SimulatedSource};
pub use window::WindowStore;
