//! Per-tick signal record handed to actuator and logging collaborators

use kinematics::{KinematicSample, TtcResult};
use safety_state::SafetyState;
use serde::{Deserialize, Serialize};
use signaling::{Adsr, LightPattern, MotionAction, RenderedSignal, SoundPattern, Trajectory};
use std::time::Duration;

/// Light channel output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightRecord {
    pub pattern: LightPattern,
    pub color_rgb: [u8; 3],
    pub intensity: f64,
    pub frequency_hz: f64,
}

/// Sound channel output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoundRecord {
    pub pattern: SoundPattern,
    pub frequency_hz: f64,
    pub volume_db: f64,
    pub envelope: Adsr,
}

/// Motion channel output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotionRecord {
    pub action: MotionAction,
    pub speed_modifier: f64,
    pub trajectory: Trajectory,
    pub deceleration_mps2: f64,
}

/// Signal record for one tick.
///
/// Carries kinematics, confidence and the rendered channels only; there is no
/// field for any attribute of the person.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalRecord {
    /// Loop time (ms)
    pub timestamp_ms: u64,
    pub state: SafetyState,
    /// `None` when the human is not closing
    pub ttc_seconds: Option<f64>,
    pub distance_m: Option<f64>,
    pub closing_velocity_ms: Option<f64>,
    pub light: LightRecord,
    pub sound: SoundRecord,
    pub motion: MotionRecord,
    pub confidence: f64,
}

impl SignalRecord {
    pub fn new(
        now: Duration,
        state: SafetyState,
        ttc: &TtcResult,
        sample: Option<&KinematicSample>,
        confidence: f64,
        signal: &RenderedSignal,
    ) -> Self {
        Self {
            timestamp_ms: u64::try_from(now.as_millis()).unwrap_or(u64::MAX),
            state,
            ttc_seconds: ttc.ttc_seconds.is_finite().then_some(ttc.ttc_seconds),
            distance_m: sample.map(|s| s.distance_m),
            closing_velocity_ms: sample.map(|s| s.closing_velocity_mps),
            light: LightRecord {
                pattern: signal.light_pattern,
                color_rgb: signal.light_color,
                intensity: signal.light_intensity,
                frequency_hz: signal.light_frequency_hz,
            },
            sound: SoundRecord {
                pattern: signal.sound_pattern,
                frequency_hz: signal.sound_frequency_hz,
                volume_db: signal.sound_volume_db,
                envelope: signal.sound_envelope,
            },
            motion: MotionRecord {
                action: signal.motion_action,
                speed_modifier: signal.motion_speed_modifier,
                trajectory: signal.motion_trajectory,
                deceleration_mps2: signal.motion_deceleration_mps2,
            },
            confidence,
        }
    }

    /// Single-line JSON encoding
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
