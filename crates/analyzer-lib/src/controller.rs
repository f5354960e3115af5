//! Dynamic window sizing
//!
//! Resizes the dynamic window once per step from an observed
//! traffic-volume signal. Two strategies are selectable: a
//! multiplicative hysteresis policy (grow under high volume, shrink
//! under low volume, hold in between) and an additive single-threshold
//! policy.

/// Default high-volume threshold for the multiplicative policy
pub const DEFAULT_THRESHOLD_HIGH: f64 = 400.0;

/// Default low-volume threshold for the multiplicative policy
pub const DEFAULT_THRESHOLD_LOW: f64 = 100.0;

/// Window sizing policy
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SizingPolicy {
    /// Hysteresis with two thresholds: double above `threshold_high`,
    /// halve (integer floor, never below 1) below `threshold_low`,
    /// hold otherwise
    Multiplicative {
        threshold_high: f64,
        threshold_low: f64,
    },
    /// Grow by one above `threshold`, hold otherwise
    Additive { threshold: f64 },
}

impl Default for SizingPolicy {
    fn default() -> Self {
        Self::Multiplicative {
            threshold_high: DEFAULT_THRESHOLD_HIGH,
            threshold_low: DEFAULT_THRESHOLD_LOW,
        }
    }
}

/// Definition of the traffic-volume signal fed to the controller.
///
/// Either the raw sample value or a running packet count can drive the
/// controller; the engine makes the choice explicit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VolumeSignal {
    /// The raw value of the current observation
    #[default]
    ObservationValue,
    /// Count of observations admitted so far
    RunningCount,
}

/// Computes the next dynamic window length from the current length and
/// the step's volume signal
#[derive(Debug, Clone, Copy)]
pub struct WindowSizeController {
    policy: SizingPolicy,
    /// Optional cap on growth; `None` leaves growth unbounded
    max_length: Option<usize>,
}

impl WindowSizeController {
    pub fn new(policy: SizingPolicy) -> Self {
        Self {
            policy,
            max_length: None,
        }
    }

    /// Cap the window length; growth past the cap clamps instead
    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }

    pub fn policy(&self) -> SizingPolicy {
        self.policy
    }

    /// Next window length for the given volume signal. Pure; the
    /// controller holds no per-stream state.
    pub fn next_length(&self, current: usize, volume: f64) -> usize {
        let next = match self.policy {
            SizingPolicy::Multiplicative {
                threshold_high,
                threshold_low,
            } => {
                if volume > threshold_high {
                    current.saturating_mul(2)
                } else if volume < threshold_low {
                    (current / 2).max(1)
                } else {
                    current
                }
            }
            SizingPolicy::Additive { threshold } => {
                if volume > threshold {
                    current.saturating_add(1)
                } else {
                    current
                }
            }
        };

        match self.max_length {
            Some(cap) => next.min(cap),
            None => next,
        }
    }
}

impl Default for WindowSizeController {
    fn default() -> Self {
        Self::new(SizingPolicy::default())
    }
}
