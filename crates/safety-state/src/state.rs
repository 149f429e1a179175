//! Safety communication states

use serde::{Deserialize, Serialize};
use std::fmt;

/// Safety communication state
///
/// The first six variants are core states ordered by severity. The last three
/// are overlays that sit outside the severity scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SafetyState {
    /// Nobody relevant nearby
    #[default]
    Idle,
    /// Human detected, no closing motion of concern
    Awareness,
    /// Robot announces what it is about to do
    Intent,
    /// Active safety measures
    Care,
    /// Emergency response
    Critical,
    /// Imminent contact
    Threat,
    /// Sensor confidence degraded
    MedConf,
    /// Sensor confidence poor
    LowConf,
    /// Diagnostic self-check requested
    Integrity,
}

impl SafetyState {
    /// All states in declaration order
    pub const ALL: [SafetyState; 9] = [
        SafetyState::Idle,
        SafetyState::Awareness,
        SafetyState::Intent,
        SafetyState::Care,
        SafetyState::Critical,
        SafetyState::Threat,
        SafetyState::MedConf,
        SafetyState::LowConf,
        SafetyState::Integrity,
    ];

    /// Core states, least severe first
    pub const CORE: [SafetyState; 6] = [
        SafetyState::Idle,
        SafetyState::Awareness,
        SafetyState::Intent,
        SafetyState::Care,
        SafetyState::Critical,
        SafetyState::Threat,
    ];

    /// Severity ordinal, `None` for overlays
    pub fn severity(self) -> Option<u8> {
        match self {
            SafetyState::Idle => Some(0),
            SafetyState::Awareness => Some(1),
            SafetyState::Intent => Some(2),
            SafetyState::Care => Some(3),
            SafetyState::Critical => Some(4),
            SafetyState::Threat => Some(5),
            SafetyState::MedConf | SafetyState::LowConf | SafetyState::Integrity => None,
        }
    }

    pub fn is_core(self) -> bool {
        self.severity().is_some()
    }

    pub fn is_overlay(self) -> bool {
        !self.is_core()
    }

    /// Next lower core state
    pub fn step_down(self) -> Option<SafetyState> {
        match self {
            SafetyState::Awareness => Some(SafetyState::Idle),
            SafetyState::Intent => Some(SafetyState::Awareness),
            SafetyState::Care => Some(SafetyState::Intent),
            SafetyState::Critical => Some(SafetyState::Care),
            SafetyState::Threat => Some(SafetyState::Critical),
            SafetyState::Idle
            | SafetyState::MedConf
            | SafetyState::LowConf
            | SafetyState::Integrity => None,
        }
    }

    /// Whether the motion channel must bring the robot to a stop
    pub fn is_emergency(self) -> bool {
        matches!(self, SafetyState::Critical | SafetyState::Threat)
    }

    /// Wire name
    pub fn as_str(self) -> &'static str {
        match self {
            SafetyState::Idle => "IDLE",
            SafetyState::Awareness => "AWARENESS",
            SafetyState::Intent => "INTENT",
            SafetyState::Care => "CARE",
            SafetyState::Critical => "CRITICAL",
            SafetyState::Threat => "THREAT",
            SafetyState::MedConf => "MED_CONF",
            SafetyState::LowConf => "LOW_CONF",
            SafetyState::Integrity => "INTEGRITY",
        }
    }
}

impl fmt::Display for SafetyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
