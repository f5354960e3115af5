//! Observation sources
//!
//! The engine is agnostic to where observations come from; anything that
//! yields them in arrival order works. A simulated generator stands in
//! for live capture, and a replay source feeds pre-recorded values.

use crate::models::Observation;
use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Producer of traffic observations in arrival order
#[async_trait]
pub trait ObservationSource: Send {
    /// Next observation; `Ok(None)` signals end of stream
    async fn next(&mut self) -> Result<Option<Observation>>;
}

/// Attack burst injected into simulated traffic
#[derive(Debug, Clone, Copy)]
struct Burst {
    start: u64,
    duration: u64,
    amplitude: f64,
}

/// Synthetic traffic generator with an optional injected attack burst.
///
/// Baseline values are uniform over `range`; observations inside the
/// burst interval get `amplitude` added on top.
pub struct SimulatedSource {
    rng: StdRng,
    seq: u64,
    num_packets: u64,
    range: (f64, f64),
    burst: Option<Burst>,
}

impl SimulatedSource {
    pub fn new(num_packets: u64) -> Self {
        Self {
            rng: StdRng::from_entropy(),
            seq: 0,
            num_packets,
            range: (50.0, 500.0),
            burst: None,
        }
    }

    /// Seed the generator for reproducible streams
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Baseline value range (low inclusive, high exclusive)
    pub fn with_range(mut self, low: f64, high: f64) -> Self {
        self.range = (low, high);
        self
    }

    /// Inject an attack burst of `duration` packets starting at `start`
    pub fn with_burst(mut self, start: u64, duration: u64, amplitude: f64) -> Self {
        self.burst = Some(Burst {
            start,
            duration,
            amplitude,
        });
        self
    }
}

#[async_trait]
impl ObservationSource for SimulatedSource {
    async fn next(&mut self) -> Result<Option<Observation>> {
        if self.seq >= self.num_packets {
            return Ok(None);
        }

        let mut value = self.rng.gen_range(self.range.0..self.range.1);
        if let Some(burst) = self.burst {
            if self.seq >= burst.start && self.seq < burst.start + burst.duration {
                value += burst.amplitude;
            }
        }

        let obs = Observation::new(self.seq, Utc::now().timestamp(), value);
        self.seq += 1;
        Ok(Some(obs))
    }
}

/// Replays a pre-recorded sequence of values as observations
pub struct ReplaySource {
    values: std::vec::IntoIter<f64>,
    seq: u64,
}

impl ReplaySource {
    pub fn new(values: Vec<f64>) -> Self {
        Self {
            values: values.into_iter(),
            seq: 0,
        }
    }
}

#[async_trait]
impl ObservationSource for ReplaySource {
    async fn next(&mut self) -> Result<Option<Observation>> {
        match self.values.next() {
            Some(value) => {
                let obs = Observation::new(self.seq, Utc::now().timestamp(), value);
                self.seq += 1;
                Ok(Some(obs))
            }
            None => Ok(None),
        }
    }
}

/// Bridge a source onto a bounded channel on its own task.
///
/// Single producer, single consumer: the engine blocks on the receiving
/// end, and the task stops at end-of-stream, on a source error, or when
/// the receiver is dropped.
pub fn spawn_source<S>(
    mut source: S,
    capacity: usize,
) -> (mpsc::Receiver<Observation>, JoinHandle<()>)
where
    S: ObservationSource + 'static,
{
    let (tx, rx) = mpsc::channel(capacity);
    let handle = tokio::spawn(async move {
        loop {
            match source.next().await {
                Ok(Some(obs)) => {
                    if tx.send(obs).await.is_err() {
                        debug!("Observation consumer dropped, stopping source");
                        break;
                    }
                }
                Ok(None) => {
                    debug!("Observation source exhausted");
                    break;
                }
                Err(e) => {
                    warn!(error = %e, "Observation source failed");
                    break;
                }
            }
        }
    });
    (rx, handle)
}
