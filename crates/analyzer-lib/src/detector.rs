//! Threshold detection predicate

use crate::models::FeatureVector;

/// Anomaly verdict: the window's mean exceeds the detection threshold.
///
/// Pure function; no state, no side effects. The threshold is
/// configuration, never inferred from the stream.
pub fn detect(features: &FeatureVector, threshold: f64) -> bool {
    features.mean > threshold
}
