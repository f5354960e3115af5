//! Dual-pipeline evaluation loop
//!
//! One iteration per observation: the fixed pipeline runs with its
//! constant window length, the controller resizes the dynamic window,
//! then the dynamic pipeline runs with the freshly updated length.
//! Each pipeline's wall-clock cost is measured around its own
//! slice/extract/detect section so the two stay comparable.

use super::{ConfigError, EngineConfig};
use crate::controller::{VolumeSignal, WindowSizeController};
use crate::detector::detect;
use crate::features::FeatureExtractor;
use crate::models::{FeatureVector, Observation, StepRecord};
use crate::observability::EngineMetrics;
use crate::window::WindowStore;
use std::time::Instant;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info};

/// Evaluates the fixed and dynamic windowing strategies side by side
/// over one observation stream.
///
/// Single-threaded and synchronous per observation: each step record is
/// fully computed before the next observation is admitted. The loop
/// owns both window stores and the dynamic length; nothing else
/// mutates them.
pub struct EvaluationLoop {
    config: EngineConfig,
    controller: WindowSizeController,
    extractor: FeatureExtractor,
    fixed_store: WindowStore,
    dynamic_store: WindowStore,
    dynamic_length: usize,
    /// Largest dynamic length ever in effect; retention floor for eviction
    dynamic_length_high_water: usize,
    steps: u64,
    records: Vec<StepRecord>,
    metrics: EngineMetrics,
}

impl EvaluationLoop {
    /// Create a loop from validated configuration.
    ///
    /// Configuration errors are fatal and surface here, before any
    /// observation is processed.
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut controller = WindowSizeController::new(config.policy);
        if let Some(max) = config.max_dynamic_window_length {
            controller = controller.with_max_length(max);
        }

        Ok(Self {
            dynamic_length: config.initial_dynamic_window_length,
            dynamic_length_high_water: config.initial_dynamic_window_length,
            controller,
            extractor: FeatureExtractor::new(),
            fixed_store: WindowStore::new(),
            dynamic_store: WindowStore::new(),
            steps: 0,
            records: Vec::new(),
            metrics: EngineMetrics::new(),
            config,
        })
    }

    /// Window length the dynamic pipeline would use right now
    pub fn dynamic_window_length(&self) -> usize {
        self.dynamic_length
    }

    /// Number of observations processed since the last reset
    pub fn steps_processed(&self) -> u64 {
        self.steps
    }

    /// Step records accumulated so far, in arrival order
    pub fn records(&self) -> &[StepRecord] {
        &self.records
    }

    /// Drain the accumulated step records
    pub fn take_records(&mut self) -> Vec<StepRecord> {
        std::mem::take(&mut self.records)
    }

    /// Clear all history, records and the dynamic length, returning the
    /// loop to its freshly constructed state
    pub fn reset(&mut self) {
        self.fixed_store.clear();
        self.dynamic_store.clear();
        self.records.clear();
        self.steps = 0;
        self.dynamic_length = self.config.initial_dynamic_window_length;
        self.dynamic_length_high_water = self.config.initial_dynamic_window_length;
    }

    /// Process one observation through both pipelines and record the step.
    ///
    /// The fixed pipeline always runs with the length valid before this
    /// step's controller update; the dynamic pipeline always runs with
    /// the length valid after it. The first observation establishes the
    /// traffic baseline, so resizing starts with the second.
    pub fn step(&mut self, obs: Observation) -> StepRecord {
        let step_index = self.steps;
        self.fixed_store.push(obs);
        self.dynamic_store.push(obs);

        let start = Instant::now();
        let fixed_window = self.fixed_store.tail(self.config.fixed_window_length);
        let (fixed_feature, fixed_verdict) = self.evaluate(fixed_window);
        let fixed_processing_time = start.elapsed().as_secs_f64();

        let volume = match self.config.volume_signal {
            VolumeSignal::ObservationValue => obs.value,
            VolumeSignal::RunningCount => (step_index + 1) as f64,
        };

        if step_index > 0 {
            self.dynamic_length = self.controller.next_length(self.dynamic_length, volume);
            self.dynamic_length_high_water = self.dynamic_length_high_water.max(self.dynamic_length);
        }

        let start = Instant::now();
        let dynamic_window = self.dynamic_store.tail(self.dynamic_length);
        let (dynamic_feature, dynamic_verdict) = self.evaluate(dynamic_window);
        let dynamic_processing_time = start.elapsed().as_secs_f64();

        // Keep memory bounded without ever shortening a live window
        self.fixed_store.evict_to(self.config.fixed_window_length);
        self.dynamic_store.evict_to(self.dynamic_length_high_water);

        self.metrics.observe_fixed_latency(fixed_processing_time);
        self.metrics.observe_dynamic_latency(dynamic_processing_time);
        self.metrics.record_step(
            fixed_verdict.unwrap_or(false),
            dynamic_verdict.unwrap_or(false),
            self.dynamic_length,
        );

        debug!(
            step = step_index,
            volume,
            dynamic_length = self.dynamic_length,
            fixed_verdict = ?fixed_verdict,
            dynamic_verdict = ?dynamic_verdict,
            "Step evaluated"
        );

        let record = StepRecord {
            step_index,
            fixed_feature,
            fixed_verdict,
            fixed_processing_time,
            dynamic_feature,
            dynamic_verdict,
            dynamic_processing_time,
            dynamic_window_length_used: self.dynamic_length,
        };

        self.steps += 1;
        self.records.push(record.clone());
        record
    }

    /// Slice-to-verdict evaluation shared by both pipelines.
    ///
    /// Extraction failure aborts this side of the step only; the
    /// sentinel `None` pair lands in the record and the stream goes on.
    fn evaluate(&self, window: &[Observation]) -> (Option<FeatureVector>, Option<bool>) {
        match self.extractor.extract(window) {
            Ok(features) => {
                let verdict = detect(&features, self.config.detection_threshold);
                (Some(features), Some(verdict))
            }
            Err(e) => {
                debug!(error = %e, "Skipping step for one pipeline");
                (None, None)
            }
        }
    }

    /// Consume observations from a channel until it closes or shutdown
    /// fires.
    ///
    /// Channel close is normal end-of-stream, not an error. Records for
    /// observations admitted before shutdown are always retained.
    pub async fn run(
        &mut self,
        mut observations: mpsc::Receiver<Observation>,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        info!(
            fixed_window_length = self.config.fixed_window_length,
            initial_dynamic_window_length = self.config.initial_dynamic_window_length,
            policy = ?self.config.policy,
            "Starting evaluation loop"
        );

        loop {
            tokio::select! {
                maybe_obs = observations.recv() => {
                    match maybe_obs {
                        Some(obs) => {
                            self.step(obs);
                        }
                        None => {
                            info!(steps = self.steps, "Observation stream exhausted");
                            break;
                        }
                    }
                }
                _ = shutdown.recv() => {
                    info!(steps = self.steps, "Shutting down evaluation loop");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::SizingPolicy;
    use crate::source::{spawn_source, ReplaySource};

    fn engine(config: EngineConfig) -> EvaluationLoop {
        EvaluationLoop::new(config).unwrap()
    }

    fn feed(engine: &mut EvaluationLoop, values: &[f64]) {
        for (i, &v) in values.iter().enumerate() {
            engine.step(Observation::new(i as u64, 1_700_000_000 + i as i64, v));
        }
    }

    fn scenario_config() -> EngineConfig {
        EngineConfig {
            fixed_window_length: 10,
            initial_dynamic_window_length: 10,
            policy: SizingPolicy::Multiplicative {
                threshold_high: 400.0,
                threshold_low: 100.0,
            },
            volume_signal: VolumeSignal::ObservationValue,
            detection_threshold: 100.0,
            max_dynamic_window_length: None,
        }
    }

    #[test]
    fn test_window_length_sequence_under_bursty_volume() {
        let mut engine = engine(scenario_config());
        feed(&mut engine, &[50.0, 450.0, 450.0, 50.0]);

        let lengths: Vec<usize> = engine
            .records()
            .iter()
            .map(|r| r.dynamic_window_length_used)
            .collect();
        assert_eq!(lengths, vec![10, 20, 40, 20]);
    }

    #[test]
    fn test_dynamic_length_reflects_current_step_volume() {
        let mut engine = engine(scenario_config());
        // Step 0 holds the initial length; from step 1 on, each step's
        // own value drives the update before extraction
        engine.step(Observation::new(0, 0, 250.0));
        assert_eq!(engine.records()[0].dynamic_window_length_used, 10);

        engine.step(Observation::new(1, 1, 450.0));
        assert_eq!(engine.records()[1].dynamic_window_length_used, 20);

        engine.step(Observation::new(2, 2, 250.0));
        assert_eq!(engine.records()[2].dynamic_window_length_used, 20);

        engine.step(Observation::new(3, 3, 50.0));
        assert_eq!(engine.records()[3].dynamic_window_length_used, 10);
    }

    #[test]
    fn test_fixed_pipeline_sees_growing_prefix_then_full_window() {
        let mut engine = engine(EngineConfig {
            fixed_window_length: 3,
            detection_threshold: 0.0,
            ..scenario_config()
        });
        feed(&mut engine, &[300.0, 300.0, 300.0, 120.0]);

        let records = engine.records();
        // Step 0 window = [300], step 3 window = [300, 300, 120]
        assert_eq!(records[0].fixed_feature.unwrap().mean, 300.0);
        assert!((records[3].fixed_feature.unwrap().mean - 240.0).abs() < 1e-9);
    }

    #[test]
    fn test_verdicts_follow_window_mean() {
        let mut engine = engine(EngineConfig {
            fixed_window_length: 2,
            initial_dynamic_window_length: 2,
            detection_threshold: 200.0,
            ..scenario_config()
        });
        feed(&mut engine, &[150.0, 350.0]);

        let records = engine.records();
        // Step 0: mean 150 < 200; step 1: mean 250 > 200
        assert_eq!(records[0].fixed_verdict, Some(false));
        assert_eq!(records[1].fixed_verdict, Some(true));
        assert_eq!(records[1].dynamic_verdict, Some(true));
    }

    #[test]
    fn test_records_are_deterministic_except_timings() {
        let values: Vec<f64> = (0..200).map(|i| 50.0 + ((i * 37) % 450) as f64).collect();

        let mut a = engine(scenario_config());
        let mut b = engine(scenario_config());
        feed(&mut a, &values);
        feed(&mut b, &values);

        for (ra, rb) in a.records().iter().zip(b.records()) {
            assert_eq!(ra.step_index, rb.step_index);
            assert_eq!(ra.fixed_feature, rb.fixed_feature);
            assert_eq!(ra.fixed_verdict, rb.fixed_verdict);
            assert_eq!(ra.dynamic_feature, rb.dynamic_feature);
            assert_eq!(ra.dynamic_verdict, rb.dynamic_verdict);
            assert_eq!(ra.dynamic_window_length_used, rb.dynamic_window_length_used);
        }
    }

    #[test]
    fn test_eviction_does_not_change_features() {
        // Bounded run: with a growth cap the retention floor always
        // covers the live window, so physical eviction can never skew
        // the features
        let values: Vec<f64> = (0..500).map(|i| ((i * 91) % 500) as f64).collect();

        let mut engine_a = engine(EngineConfig {
            max_dynamic_window_length: Some(10),
            ..scenario_config()
        });
        feed(&mut engine_a, &values);

        // Oracle: recompute each dynamic mean from the raw sequence
        for record in engine_a.records() {
            let i = record.step_index as usize;
            let len = record.dynamic_window_length_used.min(i + 1);
            let window = &values[i + 1 - len..i + 1];
            let mean = window.iter().sum::<f64>() / window.len() as f64;
            assert!(
                (record.dynamic_feature.unwrap().mean - mean).abs() < 1e-9,
                "step {i} mean mismatch"
            );
        }
    }

    #[test]
    fn test_additive_policy_with_running_count() {
        let mut engine = engine(EngineConfig {
            policy: SizingPolicy::Additive { threshold: 2.0 },
            volume_signal: VolumeSignal::RunningCount,
            ..scenario_config()
        });
        feed(&mut engine, &[10.0, 10.0, 10.0, 10.0, 10.0]);

        let lengths: Vec<usize> = engine
            .records()
            .iter()
            .map(|r| r.dynamic_window_length_used)
            .collect();
        // Counts 1..=5; growth starts once the count exceeds 2
        assert_eq!(lengths, vec![10, 10, 11, 12, 13]);
    }

    #[test]
    fn test_growth_cap_is_enforced() {
        let mut engine = engine(EngineConfig {
            max_dynamic_window_length: Some(25),
            ..scenario_config()
        });
        feed(&mut engine, &[450.0; 6]);

        let lengths: Vec<usize> = engine
            .records()
            .iter()
            .map(|r| r.dynamic_window_length_used)
            .collect();
        assert_eq!(lengths, vec![10, 20, 25, 25, 25, 25]);
    }

    #[test]
    fn test_reset_restores_initial_state() {
        let mut engine = engine(scenario_config());
        feed(&mut engine, &[450.0, 450.0, 450.0]);
        assert_eq!(engine.dynamic_window_length(), 40);

        engine.reset();
        assert_eq!(engine.dynamic_window_length(), 10);
        assert_eq!(engine.steps_processed(), 0);
        assert!(engine.records().is_empty());

        feed(&mut engine, &[50.0, 450.0, 450.0, 50.0]);
        let lengths: Vec<usize> = engine
            .records()
            .iter()
            .map(|r| r.dynamic_window_length_used)
            .collect();
        assert_eq!(lengths, vec![10, 20, 40, 20]);
    }

    #[test]
    fn test_take_records_drains_log() {
        let mut engine = engine(scenario_config());
        feed(&mut engine, &[200.0, 200.0]);

        let records = engine.take_records();
        assert_eq!(records.len(), 2);
        assert!(engine.records().is_empty());
    }

    #[tokio::test]
    async fn test_run_consumes_stream_to_exhaustion() {
        let source = ReplaySource::new(vec![50.0, 450.0, 450.0, 50.0]);
        let (rx, handle) = spawn_source(source, 8);
        let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let mut engine = engine(scenario_config());
        engine.run(rx, shutdown_rx).await;
        handle.await.unwrap();

        assert_eq!(engine.records().len(), 4);
        let lengths: Vec<usize> = engine
            .records()
            .iter()
            .map(|r| r.dynamic_window_length_used)
            .collect();
        assert_eq!(lengths, vec![10, 20, 40, 20]);
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown_without_losing_records() {
        let (tx, rx) = mpsc::channel(8);
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        // Two observations admitted, then shutdown with the channel
        // still open
        tx.send(Observation::new(0, 0, 200.0)).await.unwrap();
        tx.send(Observation::new(1, 1, 200.0)).await.unwrap();

        let mut engine = engine(scenario_config());
        let driver = async {
            // Give the loop a chance to drain the queue before stopping
            tokio::task::yield_now().await;
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            shutdown_tx.send(()).unwrap();
        };
        tokio::join!(engine.run(rx, shutdown_rx), driver);

        assert_eq!(engine.records().len(), 2);
        drop(tx);
    }
}
