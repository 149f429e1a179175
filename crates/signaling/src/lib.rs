//! Trimodal Signaling
//!
//! Renders a safety state into light, sound and motion:
//! - Canonical per-state signal templates
//! - Cubic Bezier easing between templates on state change
//! - Sine, triangle, square and sweep waveforms

pub mod bezier;
pub mod blender;
pub mod renderer;
pub mod template;
pub mod waveform;

pub use bezier::{CubicBezier, CurveClass};
pub use blender::{ContinuousParams, TransitionBlender, TransitionDescriptor};
pub use renderer::{render, RenderedSignal};
pub use template::{
    Adsr, LightPattern, LightSpec, MotionAction, MotionSpec, SignalTemplate, SoundPattern,
    SoundSpec, TemplateTable, Tone, Trajectory, Waveform, SILENCE_DB,
};

use safety_state::SafetyState;
use thiserror::Error;

/// Template table errors, raised at startup
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TemplateError {
    #[error("{state}: {field} value {value} is out of range [{min}, {max}]")]
    OutOfRange {
        state: SafetyState,
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("{state}: {field} range ({lo}, {hi}) is inverted")]
    InvertedRange {
        state: SafetyState,
        field: &'static str,
        lo: f64,
        hi: f64,
    },

    #[error("{state}: sweep of {sweep_s}s does not fit its {period_s}s period")]
    InvalidSweep {
        state: SafetyState,
        sweep_s: f64,
        period_s: f64,
    },

    #[error("{state}: motion action {action:?} does not stop the robot")]
    UnsafeMotion { state: SafetyState, action: MotionAction },
}
