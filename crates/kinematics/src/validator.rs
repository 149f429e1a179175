//! Sample Validator for Range and Ordering Checks

use crate::error::SampleError;
use crate::sample::KinematicSample;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Validation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Largest plausible distance (m)
    pub max_distance_m: f64,
    /// Largest plausible closing speed in either direction (m/s)
    pub max_speed_mps: f64,
    /// Largest plausible acceleration magnitude (m/s²)
    pub max_acceleration_mps2: f64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_distance_m: 100.0,
            max_speed_mps: 15.0,
            max_acceleration_mps2: 50.0,
        }
    }
}

/// Validator for per-tick kinematic samples
pub struct SampleValidator {
    config: ValidationConfig,
}

impl SampleValidator {
    /// Create a new validator with given config
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Validate a single value against a range
    pub fn validate_range(
        &self,
        field: &'static str,
        value: f64,
        range: (f64, f64),
    ) -> Result<(), SampleError> {
        if value < range.0 || value > range.1 {
            Err(SampleError::OutOfRange {
                field,
                value,
                min: range.0,
                max: range.1,
            })
        } else {
            Ok(())
        }
    }

    /// Validate a sample against the previous accepted timestamp.
    ///
    /// Only faults that make the TTC undecidable reject a sample: non-finite
    /// distance or velocity, negative distance, confidence outside [0, 1] and
    /// a timestamp that does not advance. Implausible magnitudes are reported
    /// by [`SampleValidator::plausibility`] and never block a decision.
    pub fn validate(
        &self,
        sample: &KinematicSample,
        last_timestamp: Option<Duration>,
    ) -> Result<(), SampleError> {
        for (field, value) in [
            ("distance_m", sample.distance_m),
            ("closing_velocity_mps", sample.closing_velocity_mps),
        ] {
            if !value.is_finite() {
                return Err(SampleError::NonFinite { field, value });
            }
        }

        if sample.distance_m < 0.0 {
            return Err(SampleError::NegativeDistance(sample.distance_m));
        }

        self.validate_confidence(sample.confidence)?;
        self.validate_timestamp(sample.timestamp, last_timestamp)
    }

    /// Diagnostics for an accepted sample whose magnitudes look implausible.
    ///
    /// Returns the first finding; the caller logs it and keeps the sample.
    pub fn plausibility(&self, sample: &KinematicSample) -> Option<SampleError> {
        if !sample.acceleration_mps2.is_finite() {
            return Some(SampleError::NonFinite {
                field: "acceleration_mps2",
                value: sample.acceleration_mps2,
            });
        }

        let speed = self.config.max_speed_mps;
        let acceleration = self.config.max_acceleration_mps2;
        [
            ("distance_m", sample.distance_m, (0.0, self.config.max_distance_m)),
            ("closing_velocity_mps", sample.closing_velocity_mps, (-speed, speed)),
            ("acceleration_mps2", sample.acceleration_mps2, (-acceleration, acceleration)),
        ]
        .into_iter()
        .find_map(|(field, value, range)| self.validate_range(field, value, range).err())
    }

    /// Validate a confidence value on its own (frames without humans)
    pub fn validate_confidence(&self, confidence: f64) -> Result<(), SampleError> {
        if !(0.0..=1.0).contains(&confidence) {
            return Err(SampleError::ConfidenceOutOfRange(confidence));
        }
        Ok(())
    }

    /// Validate timestamp ordering on its own (frames without humans)
    pub fn validate_timestamp(
        &self,
        timestamp: Duration,
        last_timestamp: Option<Duration>,
    ) -> Result<(), SampleError> {
        match last_timestamp {
            Some(last) if timestamp <= last => {
                debug!(
                    "Sample timestamp {:?} does not advance past {:?}",
                    timestamp, last
                );
                Err(SampleError::NonMonotonicTimestamp {
                    last,
                    current: timestamp,
                })
            }
            _ => Ok(()),
        }
    }
}

impl Default for SampleValidator {
    fn default() -> Self {
        Self::new(ValidationConfig::default())
    }
}
