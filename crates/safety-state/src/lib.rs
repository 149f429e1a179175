//! Safety State Decision
//!
//! Turns per-tick kinematics into a discrete safety communication state:
//! - TTC threshold mapping
//! - THREAT bypass below 0.5s, no hysteresis
//! - Confidence and integrity overlays
//! - Per-boundary de-escalation dwell

pub mod config;
pub mod engine;
pub mod hysteresis;
pub mod state;

pub use config::{DecisionConfig, DwellRule, DwellTable, TtcThresholds};
pub use engine::{Decision, DecisionInput, DecisionReason, StateDecisionEngine};
pub use hysteresis::{DwellCondition, HysteresisTimer, HysteresisTracker};
pub use state::SafetyState;

use thiserror::Error;

/// Decision configuration errors, raised at startup
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Threshold {name} has invalid value {value}")]
    InvalidThreshold { name: &'static str, value: f64 },

    #[error("Threshold {lower} must be below {upper}")]
    UnorderedThresholds {
        lower: &'static str,
        upper: &'static str,
    },

    #[error("Dwell rule for {boundary} is invalid: {reason}")]
    InvalidDwell {
        boundary: &'static str,
        reason: String,
    },

    #[error("Confidence thresholds low={low} medium={medium} must satisfy 0 < low <= medium <= 1")]
    InvalidConfidence { low: f64, medium: f64 },
}
