//! Sample Error Types

use std::time::Duration;
use thiserror::Error;

/// Reasons a kinematic sample is rejected
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SampleError {
    /// Distance below zero
    #[error("distance {0} m is negative")]
    NegativeDistance(f64),

    /// NaN or infinite measurement
    #[error("{field} is not finite ({value})")]
    NonFinite { field: &'static str, value: f64 },

    /// Confidence outside [0, 1]
    #[error("confidence {0} is outside [0, 1]")]
    ConfidenceOutOfRange(f64),

    /// Timestamp did not advance past the last accepted sample
    #[error("timestamp {current:?} does not advance past {last:?}")]
    NonMonotonicTimestamp { last: Duration, current: Duration },

    /// Value outside the plausible physical range
    #[error("{field} value {value} is out of range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
}
