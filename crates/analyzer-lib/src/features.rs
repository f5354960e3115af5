//! Feature extraction over a window of observations
//!
//! Reduces a window to summary statistics for detection. Mean and
//! standard deviation use the population formulas; a single-element
//! window has a standard deviation of exactly 0.

use crate::models::{FeatureVector, Observation};
use thiserror::Error;

/// A window with zero observations has no defined statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot extract features from an empty window")]
pub struct EmptyWindowError;

/// Reduces a window of observations to a [`FeatureVector`]
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureExtractor;

impl FeatureExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract mean and population standard deviation from `window`.
    ///
    /// An empty window is a typed error, never a NaN or degenerate
    /// feature vector.
    pub fn extract(&self, window: &[Observation]) -> Result<FeatureVector, EmptyWindowError> {
        if window.is_empty() {
            return Err(EmptyWindowError);
        }

        let n = window.len() as f64;
        let mean = window.iter().map(|o| o.value).sum::<f64>() / n;
        let variance = window.iter().map(|o| (o.value - mean).powi(2)).sum::<f64>() / n;

        Ok(FeatureVector {
            mean,
            stddev: variance.sqrt(),
        })
    }
}
