//! Signal renderer
//!
//! Pure function from a template, the blended continuous parameters and the
//! time since the state was entered to concrete actuator values.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::blender::ContinuousParams;
use crate::template::{Adsr, LightPattern, MotionAction, SignalTemplate, SoundPattern, Trajectory};
use crate::waveform;

/// Concrete output for one tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedSignal {
    pub light_pattern: LightPattern,
    pub light_color: [u8; 3],
    /// Intensity, 0-1
    pub light_intensity: f64,
    pub light_frequency_hz: f64,
    pub sound_pattern: SoundPattern,
    /// Carrier frequency, 0 when silent
    pub sound_frequency_hz: f64,
    pub sound_volume_db: f64,
    pub sound_envelope: Adsr,
    pub motion_action: MotionAction,
    /// Permitted fraction of nominal speed, 0-1
    pub motion_speed_modifier: f64,
    pub motion_trajectory: Trajectory,
    pub motion_deceleration_mps2: f64,
}

/// Render a template at `phase_time` into the state
pub fn render(
    template: &SignalTemplate,
    params: &ContinuousParams,
    phase_time: Duration,
) -> RenderedSignal {
    let t = phase_time.as_secs_f64();
    let light = &template.light;
    let level = waveform::unit_level(light.waveform, light.frequency_hz, t);
    let intensity = waveform::scale(level, params.intensity_baseline, params.intensity_peak);

    RenderedSignal {
        light_pattern: light.pattern,
        light_color: light.color_rgb,
        light_intensity: intensity.clamp(0.0, 1.0),
        light_frequency_hz: light.frequency_hz,
        sound_pattern: template.sound.pattern,
        sound_frequency_hz: waveform::tone_frequency(template.sound.tone, t),
        sound_volume_db: params.volume_db,
        sound_envelope: template.sound.adsr,
        motion_action: template.motion.action,
        motion_speed_modifier: params.speed_modifier.clamp(0.0, 1.0),
        motion_trajectory: template.motion.trajectory,
        motion_deceleration_mps2: template.motion.deceleration_mps2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::{TemplateTable, SILENCE_DB};
    use safety_state::SafetyState;

    fn render_state(state: SafetyState, ms: u64) -> RenderedSignal {
        let table = TemplateTable::canonical();
        let template = table.get(state);
        render(
            template,
            &ContinuousParams::from_template(template),
            Duration::from_millis(ms),
        )
    }

    #[test]
    fn test_idle_is_quiet() {
        let signal = render_state(SafetyState::Idle, 1234);
        assert_eq!(signal.sound_frequency_hz, 0.0);
        assert_eq!(signal.sound_volume_db, SILENCE_DB);
        assert_eq!(signal.motion_speed_modifier, 1.0);
        assert!((0.10..=0.30).contains(&signal.light_intensity));
    }

    #[test]
    fn test_threat_strobe_and_stop() {
        // 8 Hz, 30% duty: on for the first 37.5 ms of every 125 ms
        let on = render_state(SafetyState::Threat, 0);
        let off = render_state(SafetyState::Threat, 50);
        assert_eq!(on.light_intensity, 1.0);
        assert_eq!(off.light_intensity, 0.9);
        assert_eq!(on.motion_speed_modifier, 0.0);
        assert_eq!(on.motion_action, MotionAction::EmergencyStop);
        assert_eq!(on.sound_frequency_hz, 1000.0);
    }

    #[test]
    fn test_care_sweep_frequency() {
        let signal = render_state(SafetyState::Care, 250);
        assert!((signal.sound_frequency_hz - 750.0).abs() < 1e-9);
        let held = render_state(SafetyState::Care, 800);
        assert_eq!(held.sound_frequency_hz, 900.0);
    }

    #[test]
    fn test_integrity_steady() {
        for ms in [0, 333, 1000] {
            assert_eq!(render_state(SafetyState::Integrity, ms).light_intensity, 0.5);
        }
    }

    #[test]
    fn test_discrete_attributes_follow_template() {
        let table = TemplateTable::canonical();
        let idle = ContinuousParams::from_template(table.get(SafetyState::Idle));
        // Blended values from IDLE, discrete values from CRITICAL
        let signal = render(table.get(SafetyState::Critical), &idle, Duration::ZERO);
        assert_eq!(signal.light_color, [255, 0, 0]);
        assert_eq!(signal.motion_action, MotionAction::Stop);
        assert_eq!(signal.motion_speed_modifier, 1.0);
    }
}
