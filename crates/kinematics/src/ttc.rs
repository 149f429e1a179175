//! Time-to-collision evaluation

use serde::{Deserialize, Serialize};

use crate::error::SampleError;
use crate::sample::KinematicSample;

/// TTC for the decision engine
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TtcResult {
    /// Seconds until contact, +inf when the human is not closing
    pub ttc_seconds: f64,
    /// Whether a human is being tracked at all
    pub human_detected: bool,
}

impl TtcResult {
    /// Result for a tick with nobody tracked
    pub fn clear() -> Self {
        Self {
            ttc_seconds: f64::INFINITY,
            human_detected: false,
        }
    }

    /// Result for a detected human with the given TTC
    pub fn detected(ttc_seconds: f64) -> Self {
        Self {
            ttc_seconds,
            human_detected: true,
        }
    }

    /// True when the human is approaching
    pub fn is_closing(&self) -> bool {
        self.ttc_seconds.is_finite()
    }
}

/// TTC = distance / closing velocity; +inf for stationary or receding humans
pub fn time_to_collision(distance_m: f64, closing_velocity_mps: f64) -> f64 {
    if closing_velocity_mps <= 0.0 {
        return f64::INFINITY;
    }
    distance_m / closing_velocity_mps
}

/// Evaluate a sample.
///
/// Rejects negative or non-finite kinematics instead of clamping them.
pub fn evaluate(sample: &KinematicSample) -> Result<TtcResult, SampleError> {
    if !sample.distance_m.is_finite() {
        return Err(SampleError::NonFinite {
            field: "distance_m",
            value: sample.distance_m,
        });
    }
    if !sample.closing_velocity_mps.is_finite() {
        return Err(SampleError::NonFinite {
            field: "closing_velocity_mps",
            value: sample.closing_velocity_mps,
        });
    }
    if sample.distance_m < 0.0 {
        return Err(SampleError::NegativeDistance(sample.distance_m));
    }

    Ok(TtcResult::detected(time_to_collision(
        sample.distance_m,
        sample.closing_velocity_mps,
    )))
}
