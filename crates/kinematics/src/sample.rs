//! Kinematic samples and per-tick perception frames

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::time::Duration;

use crate::ttc::time_to_collision;

/// Kinematics of the closest tracked human for one control tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KinematicSample {
    /// Distance to the human (meters)
    pub distance_m: f64,
    /// Closing velocity, positive when approaching (m/s)
    pub closing_velocity_mps: f64,
    /// Closing acceleration (m/s²)
    pub acceleration_mps2: f64,
    /// Sensor confidence (0-1)
    pub confidence: f64,
    /// Monotonic offset from the loop epoch
    pub timestamp: Duration,
}

impl KinematicSample {
    pub fn new(
        distance_m: f64,
        closing_velocity_mps: f64,
        acceleration_mps2: f64,
        confidence: f64,
        timestamp: Duration,
    ) -> Self {
        Self {
            distance_m,
            closing_velocity_mps,
            acceleration_mps2,
            confidence,
            timestamp,
        }
    }
}

/// One human as reported by the fusion stage
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackedHuman {
    /// Distance to the human (meters)
    pub distance_m: f64,
    /// Closing velocity, positive when approaching (m/s)
    pub closing_velocity_mps: f64,
    /// Closing acceleration (m/s²)
    pub acceleration_mps2: f64,
}

impl TrackedHuman {
    pub fn new(distance_m: f64, closing_velocity_mps: f64, acceleration_mps2: f64) -> Self {
        Self {
            distance_m,
            closing_velocity_mps,
            acceleration_mps2,
        }
    }

    /// Time to collision for this human (seconds, +inf when not closing)
    pub fn ttc_seconds(&self) -> f64 {
        time_to_collision(self.distance_m, self.closing_velocity_mps)
    }
}

/// Complete fusion output for one control tick
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerceptionFrame {
    /// Monotonic offset from the loop epoch
    pub timestamp: Duration,
    /// Overall sensor confidence (0-1)
    pub confidence: f64,
    /// All humans currently tracked
    pub humans: Vec<TrackedHuman>,
}

impl PerceptionFrame {
    pub fn new(timestamp: Duration, confidence: f64, humans: Vec<TrackedHuman>) -> Self {
        Self {
            timestamp,
            confidence,
            humans,
        }
    }

    /// Frame with no tracked humans
    pub fn empty(timestamp: Duration, confidence: f64) -> Self {
        Self::new(timestamp, confidence, Vec::new())
    }

    /// Build the sample for the human that drives the decision.
    ///
    /// Selects the minimum current distance; equal distances fall back to the
    /// lower TTC. Returns `None` when nobody is tracked.
    pub fn closest_sample(&self) -> Option<KinematicSample> {
        self.humans
            .iter()
            .min_by(|a, b| compare_closest(a, b))
            .map(|human| {
                KinematicSample::new(
                    human.distance_m,
                    human.closing_velocity_mps,
                    human.acceleration_mps2,
                    self.confidence,
                    self.timestamp,
                )
            })
    }
}

fn compare_closest(a: &TrackedHuman, b: &TrackedHuman) -> Ordering {
    a.distance_m
        .total_cmp(&b.distance_m)
        .then_with(|| a.ttc_seconds().total_cmp(&b.ttc_seconds()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_frame_has_no_sample() {
        let frame = PerceptionFrame::empty(Duration::from_millis(50), 0.9);
        assert!(frame.closest_sample().is_none());
    }

    #[test]
    fn test_closest_by_distance() {
        let frame = PerceptionFrame::new(
            Duration::from_millis(100),
            0.95,
            vec![
                TrackedHuman::new(6.0, 3.0, 0.0),
                TrackedHuman::new(2.5, 0.1, 0.0),
                TrackedHuman::new(4.0, 2.0, 0.0),
            ],
        );

        let sample = frame.closest_sample().unwrap();
        assert_eq!(sample.distance_m, 2.5);
        assert_eq!(sample.confidence, 0.95);
        assert_eq!(sample.timestamp, Duration::from_millis(100));
    }

    #[test]
    fn test_distance_tie_prefers_lower_ttc() {
        let frame = PerceptionFrame::new(
            Duration::ZERO,
            1.0,
            vec![
                TrackedHuman::new(3.0, -1.0, 0.0), // receding
                TrackedHuman::new(3.0, 2.0, 0.0),  // TTC 1.5s
                TrackedHuman::new(3.0, 1.0, 0.0),  // TTC 3.0s
            ],
        );

        let sample = frame.closest_sample().unwrap();
        assert_eq!(sample.closing_velocity_mps, 2.0);
    }
}
