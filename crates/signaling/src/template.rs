//! Canonical signal templates
//!
//! One template per safety state. Light, sound and motion each carry the
//! state on their own so any single channel is enough to read it.

use safety_state::SafetyState;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::TemplateError;

/// Volume used for the silent sound channel (dBFS)
pub const SILENCE_DB: f64 = -60.0;

/// Light pattern shown on the status ring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LightPattern {
    Breathing,
    Pulse,
    Directional,
    Flash,
    Strobe,
    Steady,
}

/// Intensity waveform
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Waveform {
    Steady,
    Sine,
    Triangle,
    /// Rectangular wave, `duty` is the on-fraction of each period
    Square { duty: f64 },
}

/// Light channel descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightSpec {
    pub pattern: LightPattern,
    pub frequency_hz: f64,
    /// (baseline, peak) intensity, 0-1
    pub intensity_range: (f64, f64),
    pub color_rgb: [u8; 3],
    pub waveform: Waveform,
}

/// Sound pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoundPattern {
    Silent,
    Chime,
    Tone,
    RisingSweep,
    Alarm,
    Siren,
    DoubleBeep,
    Diagnostic,
}

/// Carrier frequency of the sound channel
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Silent,
    Fixed {
        hz: f64,
    },
    /// Linear sweep over `sweep_s`, restarting every `period_s`
    Sweep {
        start_hz: f64,
        end_hz: f64,
        sweep_s: f64,
        period_s: f64,
    },
}

/// Attack/decay/sustain/release envelope
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Adsr {
    pub attack_s: f64,
    pub decay_s: f64,
    /// Sustain level, 0-1
    pub sustain: f64,
    pub release_s: f64,
}

impl Adsr {
    pub const fn new(attack_s: f64, decay_s: f64, sustain: f64, release_s: f64) -> Self {
        Self {
            attack_s,
            decay_s,
            sustain,
            release_s,
        }
    }
}

/// Sound channel descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoundSpec {
    pub pattern: SoundPattern,
    pub tone: Tone,
    /// Output level (dBFS)
    pub volume_db: f64,
    pub adsr: Adsr,
}

/// Motion behaviour requested from the planner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotionAction {
    Continue,
    Yield,
    SlowDown,
    Stop,
    EmergencyStop,
    Hold,
}

/// Trajectory shaping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trajectory {
    Nominal,
    /// Increase lateral clearance
    Widen,
    /// Curve away from the human
    GiveWay,
    Halt,
    /// Back off along the approach axis
    Retreat,
}

/// Motion channel descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotionSpec {
    pub action: MotionAction,
    /// (min, max) fraction of nominal speed
    pub speed_modifier_range: (f64, f64),
    pub trajectory: Trajectory,
    pub deceleration_mps2: f64,
}

/// Light, sound and motion for one state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalTemplate {
    pub light: LightSpec,
    pub sound: SoundSpec,
    pub motion: MotionSpec,
}

impl SignalTemplate {
    /// Canonical template for a state
    pub fn canonical(state: SafetyState) -> Self {
        match state {
            SafetyState::Idle => Self {
                light: light(LightPattern::Breathing, Waveform::Sine, 0.2, (0.10, 0.30), [200, 220, 255]),
                sound: SoundSpec {
                    pattern: SoundPattern::Silent,
                    tone: Tone::Silent,
                    volume_db: SILENCE_DB,
                    adsr: Adsr::new(0.0, 0.0, 0.0, 0.0),
                },
                motion: motion(MotionAction::Continue, (1.0, 1.0), Trajectory::Nominal, 0.0),
            },
            SafetyState::Awareness => Self {
                light: light(LightPattern::Pulse, Waveform::Sine, 0.5, (0.30, 0.50), [0, 200, 255]),
                sound: SoundSpec {
                    pattern: SoundPattern::Chime,
                    tone: Tone::Fixed { hz: 440.0 },
                    volume_db: -30.0,
                    adsr: Adsr::new(0.01, 0.15, 0.0, 0.30),
                },
                motion: motion(MotionAction::Continue, (0.8, 1.0), Trajectory::Nominal, 0.3),
            },
            SafetyState::Intent => Self {
                light: light(LightPattern::Directional, Waveform::Triangle, 1.0, (0.40, 0.70), [255, 200, 0]),
                sound: SoundSpec {
                    pattern: SoundPattern::Tone,
                    tone: Tone::Fixed { hz: 660.0 },
                    volume_db: -24.0,
                    adsr: Adsr::new(0.02, 0.10, 0.6, 0.20),
                },
                motion: motion(MotionAction::Yield, (0.5, 0.8), Trajectory::Widen, 0.5),
            },
            SafetyState::Care => Self {
                light: light(LightPattern::Flash, Waveform::Square { duty: 0.5 }, 2.0, (0.50, 0.80), [255, 140, 0]),
                sound: SoundSpec {
                    pattern: SoundPattern::RisingSweep,
                    tone: Tone::Sweep {
                        start_hz: 600.0,
                        end_hz: 900.0,
                        sweep_s: 0.5,
                        period_s: 1.0,
                    },
                    volume_db: -18.0,
                    adsr: Adsr::new(0.01, 0.05, 0.8, 0.10),
                },
                motion: motion(MotionAction::SlowDown, (0.3, 0.5), Trajectory::GiveWay, 1.0),
            },
            SafetyState::Critical => Self {
                light: light(LightPattern::Flash, Waveform::Square { duty: 0.5 }, 4.0, (0.70, 1.00), [255, 0, 0]),
                sound: SoundSpec {
                    pattern: SoundPattern::Alarm,
                    tone: Tone::Sweep {
                        start_hz: 800.0,
                        end_hz: 1600.0,
                        sweep_s: 0.25,
                        period_s: 0.5,
                    },
                    volume_db: -8.0,
                    adsr: Adsr::new(0.005, 0.02, 0.9, 0.05),
                },
                motion: motion(MotionAction::Stop, (0.0, 0.1), Trajectory::Halt, 2.5),
            },
            SafetyState::Threat => Self {
                light: light(LightPattern::Strobe, Waveform::Square { duty: 0.3 }, 8.0, (0.90, 1.00), [255, 0, 0]),
                sound: SoundSpec {
                    pattern: SoundPattern::Siren,
                    tone: Tone::Sweep {
                        start_hz: 1000.0,
                        end_hz: 2500.0,
                        sweep_s: 0.2,
                        period_s: 0.25,
                    },
                    volume_db: -3.0,
                    adsr: Adsr::new(0.0, 0.0, 1.0, 0.05),
                },
                motion: motion(MotionAction::EmergencyStop, (0.0, 0.0), Trajectory::Retreat, 4.0),
            },
            SafetyState::MedConf => Self {
                light: light(LightPattern::Pulse, Waveform::Sine, 1.0, (0.30, 0.60), [160, 0, 255]),
                sound: SoundSpec {
                    pattern: SoundPattern::Tone,
                    tone: Tone::Fixed { hz: 520.0 },
                    volume_db: -30.0,
                    adsr: Adsr::new(0.02, 0.10, 0.5, 0.20),
                },
                motion: motion(MotionAction::SlowDown, (0.5, 0.7), Trajectory::Nominal, 0.5),
            },
            SafetyState::LowConf => Self {
                light: light(LightPattern::Pulse, Waveform::Triangle, 1.5, (0.40, 0.70), [200, 0, 200]),
                sound: SoundSpec {
                    pattern: SoundPattern::DoubleBeep,
                    tone: Tone::Fixed { hz: 520.0 },
                    volume_db: -24.0,
                    adsr: Adsr::new(0.01, 0.05, 0.7, 0.10),
                },
                motion: motion(MotionAction::SlowDown, (0.1, 0.3), Trajectory::Nominal, 1.0),
            },
            SafetyState::Integrity => Self {
                light: light(LightPattern::Steady, Waveform::Steady, 0.0, (0.50, 0.50), [0, 0, 255]),
                sound: SoundSpec {
                    pattern: SoundPattern::Diagnostic,
                    tone: Tone::Fixed { hz: 1000.0 },
                    volume_db: -36.0,
                    adsr: Adsr::new(0.05, 0.10, 0.4, 0.30),
                },
                motion: motion(MotionAction::Hold, (0.0, 0.0), Trajectory::Halt, 1.0),
            },
        }
    }
}

fn light(
    pattern: LightPattern,
    waveform: Waveform,
    frequency_hz: f64,
    intensity_range: (f64, f64),
    color_rgb: [u8; 3],
) -> LightSpec {
    LightSpec {
        pattern,
        frequency_hz,
        intensity_range,
        color_rgb,
        waveform,
    }
}

fn motion(
    action: MotionAction,
    speed_modifier_range: (f64, f64),
    trajectory: Trajectory,
    deceleration_mps2: f64,
) -> MotionSpec {
    MotionSpec {
        action,
        speed_modifier_range,
        trajectory,
        deceleration_mps2,
    }
}

/// Templates for all nine states; immutable once validated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateTable {
    /// Indexed by `slot`, in `SafetyState::ALL` order
    templates: [SignalTemplate; 9],
}

impl TemplateTable {
    /// Table of canonical templates
    pub fn canonical() -> Self {
        Self {
            templates: SafetyState::ALL.map(SignalTemplate::canonical),
        }
    }

    /// Replace one state's template
    pub fn with(mut self, state: SafetyState, template: SignalTemplate) -> Self {
        self.templates[slot(state)] = template;
        self
    }

    /// Template for a state
    pub fn get(&self, state: SafetyState) -> &SignalTemplate {
        &self.templates[slot(state)]
    }

    /// Check every template. Called once at startup.
    pub fn validate(&self) -> Result<(), TemplateError> {
        for state in SafetyState::ALL {
            validate_template(state, self.get(state))?;
        }
        info!("Validated {} signal templates", self.templates.len());
        Ok(())
    }
}

impl Default for TemplateTable {
    fn default() -> Self {
        Self::canonical()
    }
}

fn slot(state: SafetyState) -> usize {
    match state {
        SafetyState::Idle => 0,
        SafetyState::Awareness => 1,
        SafetyState::Intent => 2,
        SafetyState::Care => 3,
        SafetyState::Critical => 4,
        SafetyState::Threat => 5,
        SafetyState::MedConf => 6,
        SafetyState::LowConf => 7,
        SafetyState::Integrity => 8,
    }
}

fn check_range(
    state: SafetyState,
    field: &'static str,
    value: f64,
    min: f64,
    max: f64,
) -> Result<(), TemplateError> {
    if !value.is_finite() || value < min || value > max {
        return Err(TemplateError::OutOfRange {
            state,
            field,
            value,
            min,
            max,
        });
    }
    Ok(())
}

fn check_unit_range(
    state: SafetyState,
    field: &'static str,
    (lo, hi): (f64, f64),
) -> Result<(), TemplateError> {
    check_range(state, field, lo, 0.0, 1.0)?;
    check_range(state, field, hi, 0.0, 1.0)?;
    if lo > hi {
        return Err(TemplateError::InvertedRange { state, field, lo, hi });
    }
    Ok(())
}

fn validate_template(state: SafetyState, template: &SignalTemplate) -> Result<(), TemplateError> {
    let light = &template.light;
    check_unit_range(state, "intensity_range", light.intensity_range)?;
    match light.waveform {
        Waveform::Steady => check_range(state, "light.frequency_hz", light.frequency_hz, 0.0, 50.0)?,
        Waveform::Sine | Waveform::Triangle => {
            check_range(state, "light.frequency_hz", light.frequency_hz, 0.01, 50.0)?
        }
        Waveform::Square { duty } => {
            check_range(state, "light.frequency_hz", light.frequency_hz, 0.01, 50.0)?;
            check_range(state, "duty", duty, 0.01, 0.99)?;
        }
    }

    let sound = &template.sound;
    check_range(state, "volume_db", sound.volume_db, SILENCE_DB, 0.0)?;
    check_range(state, "adsr.attack_s", sound.adsr.attack_s, 0.0, 10.0)?;
    check_range(state, "adsr.decay_s", sound.adsr.decay_s, 0.0, 10.0)?;
    check_range(state, "adsr.sustain", sound.adsr.sustain, 0.0, 1.0)?;
    check_range(state, "adsr.release_s", sound.adsr.release_s, 0.0, 10.0)?;
    match sound.tone {
        Tone::Silent => {}
        Tone::Fixed { hz } => check_range(state, "tone.hz", hz, 20.0, 20_000.0)?,
        Tone::Sweep {
            start_hz,
            end_hz,
            sweep_s,
            period_s,
        } => {
            check_range(state, "sweep.start_hz", start_hz, 20.0, 20_000.0)?;
            check_range(state, "sweep.end_hz", end_hz, 20.0, 20_000.0)?;
            if !(sweep_s > 0.0 && period_s.is_finite() && sweep_s <= period_s) {
                return Err(TemplateError::InvalidSweep {
                    state,
                    sweep_s,
                    period_s,
                });
            }
        }
    }

    let motion = &template.motion;
    check_unit_range(state, "speed_modifier_range", motion.speed_modifier_range)?;
    check_range(state, "deceleration_mps2", motion.deceleration_mps2, 0.0, 10.0)?;
    if state.is_emergency()
        && !matches!(motion.action, MotionAction::Stop | MotionAction::EmergencyStop)
    {
        return Err(TemplateError::UnsafeMotion {
            state,
            action: motion.action,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_table_is_valid() {
        assert!(TemplateTable::canonical().validate().is_ok());
    }

    #[test]
    fn test_lookup_matches_state() {
        let table = TemplateTable::canonical();
        for state in SafetyState::ALL {
            assert_eq!(table.get(state), &SignalTemplate::canonical(state));
        }
    }

    #[test]
    fn test_severity_raises_urgency() {
        let table = TemplateTable::canonical();
        let mut last_volume = f64::NEG_INFINITY;
        let mut last_speed = f64::INFINITY;
        for state in SafetyState::CORE {
            let template = table.get(state);
            assert!(template.sound.volume_db >= last_volume, "{}", state);
            assert!(template.motion.speed_modifier_range.1 <= last_speed, "{}", state);
            last_volume = template.sound.volume_db;
            last_speed = template.motion.speed_modifier_range.1;
        }
    }

    #[test]
    fn test_inverted_intensity_rejected() {
        let mut template = SignalTemplate::canonical(SafetyState::Care);
        template.light.intensity_range = (0.9, 0.2);
        let table = TemplateTable::canonical().with(SafetyState::Care, template);
        assert!(matches!(
            table.validate(),
            Err(TemplateError::InvertedRange { state: SafetyState::Care, .. })
        ));
    }

    #[test]
    fn test_bad_sweep_rejected() {
        let mut template = SignalTemplate::canonical(SafetyState::Critical);
        template.sound.tone = Tone::Sweep {
            start_hz: 800.0,
            end_hz: 1600.0,
            sweep_s: 1.0,
            period_s: 0.5,
        };
        let table = TemplateTable::canonical().with(SafetyState::Critical, template);
        assert!(matches!(table.validate(), Err(TemplateError::InvalidSweep { .. })));
    }

    #[test]
    fn test_emergency_must_stop() {
        let mut template = SignalTemplate::canonical(SafetyState::Threat);
        template.motion.action = MotionAction::SlowDown;
        let table = TemplateTable::canonical().with(SafetyState::Threat, template);
        assert!(matches!(
            table.validate(),
            Err(TemplateError::UnsafeMotion { state: SafetyState::Threat, .. })
        ));
    }

    #[test]
    fn test_template_serializes() {
        let json = serde_json::to_string(&SignalTemplate::canonical(SafetyState::Care)).unwrap();
        assert!(json.contains("\"rising_sweep\""));
        assert!(json.contains("\"give_way\""));
    }

    #[test]
    fn test_table_round_trips() {
        let json = serde_json::to_string(&TemplateTable::canonical()).unwrap();
        let table: TemplateTable = serde_json::from_str(&json).unwrap();
        assert!(table.validate().is_ok());
        assert_eq!(table, TemplateTable::canonical());
    }

    #[test]
    fn test_short_table_does_not_deserialize() {
        let idle = serde_json::to_value(SignalTemplate::canonical(SafetyState::Idle)).unwrap();
        let short = serde_json::json!({ "templates": [idle] });
        assert!(serde_json::from_value::<TemplateTable>(short).is_err());

        let empty = serde_json::json!({ "templates": [] });
        assert!(serde_json::from_value::<TemplateTable>(empty).is_err());
    }
}
