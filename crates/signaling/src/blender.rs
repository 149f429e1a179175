//! Transition blending between signal templates
//!
//! Continuous parameters ease from the previous values to the new template
//! along the transition's curve. Discrete attributes (pattern, color,
//! waveform, action) follow the new state from the first tick.

use safety_state::SafetyState;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::bezier::{CubicBezier, CurveClass};
use crate::template::{SignalTemplate, TemplateTable};

/// Parameters that are interpolated across a transition
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContinuousParams {
    /// Lower end of the light intensity range
    pub intensity_baseline: f64,
    /// Upper end of the light intensity range
    pub intensity_peak: f64,
    pub volume_db: f64,
    /// Permitted fraction of nominal speed
    pub speed_modifier: f64,
}

impl ContinuousParams {
    pub fn from_template(template: &SignalTemplate) -> Self {
        Self {
            intensity_baseline: template.light.intensity_range.0,
            intensity_peak: template.light.intensity_range.1,
            volume_db: template.sound.volume_db,
            speed_modifier: template.motion.speed_modifier_range.1,
        }
    }

    /// `self + (other - self) * k`, exact at k = 0 and k = 1
    pub fn blend(&self, other: &Self, k: f64) -> Self {
        Self {
            intensity_baseline: lerp(self.intensity_baseline, other.intensity_baseline, k),
            intensity_peak: lerp(self.intensity_peak, other.intensity_peak, k),
            volume_db: lerp(self.volume_db, other.volume_db, k),
            speed_modifier: lerp(self.speed_modifier, other.speed_modifier, k),
        }
    }
}

fn lerp(from: f64, to: f64, k: f64) -> f64 {
    if k <= 0.0 {
        from
    } else if k >= 1.0 {
        to
    } else {
        from + (to - from) * k
    }
}

/// A transition in progress
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionDescriptor {
    pub from: SafetyState,
    pub to: SafetyState,
    pub class: CurveClass,
    pub curve: CubicBezier,
    pub duration_ms: u32,
    /// Loop time the transition began
    pub start_time: Duration,
    /// Live values at the moment the transition began
    pub start_params: ContinuousParams,
    pub target_params: ContinuousParams,
}

impl TransitionDescriptor {
    /// Elapsed fraction, `min(1, elapsed / duration)`
    pub fn progress(&self, now: Duration) -> f64 {
        if self.duration_ms == 0 {
            return 1.0;
        }
        let elapsed = now.saturating_sub(self.start_time).as_secs_f64() * 1000.0;
        (elapsed / self.duration_ms as f64).min(1.0)
    }

    pub fn is_complete(&self, now: Duration) -> bool {
        self.progress(now) >= 1.0
    }

    /// Blended parameters at `now`
    pub fn params_at(&self, now: Duration) -> ContinuousParams {
        let eased = self.curve.ease(self.progress(now));
        self.start_params.blend(&self.target_params, eased)
    }
}

/// Holds the rendered target state and any transition towards it
#[derive(Debug, Clone)]
pub struct TransitionBlender {
    table: Arc<TemplateTable>,
    target: SafetyState,
    active: Option<TransitionDescriptor>,
}

impl TransitionBlender {
    pub fn new(table: Arc<TemplateTable>, initial: SafetyState) -> Self {
        Self {
            table,
            target: initial,
            active: None,
        }
    }

    /// State whose discrete attributes are rendered
    pub fn target(&self) -> SafetyState {
        self.target
    }

    pub fn active(&self) -> Option<&TransitionDescriptor> {
        self.active.as_ref()
    }

    pub fn template(&self) -> &SignalTemplate {
        self.table.get(self.target)
    }

    /// Start a transition to `to`.
    ///
    /// A transition still running is replaced, starting from its live values.
    pub fn on_state_change(&mut self, to: SafetyState, now: Duration) -> &TransitionDescriptor {
        let start_params = self.params_at(now);
        let from = self.target;
        if let Some(previous) = self.active.take() {
            debug!(
                "Preempting {} -> {} transition at {:.0}%",
                previous.from,
                previous.to,
                previous.progress(now) * 100.0
            );
        }

        let class = CurveClass::select(from, to);
        self.target = to;
        self.active.insert(TransitionDescriptor {
            from,
            to,
            class,
            curve: class.curve(),
            duration_ms: class.duration_ms(),
            start_time: now,
            start_params,
            target_params: ContinuousParams::from_template(self.table.get(to)),
        })
    }

    /// Blended parameters at `now`; the target template once settled
    pub fn params_at(&self, now: Duration) -> ContinuousParams {
        match &self.active {
            Some(transition) => transition.params_at(now),
            None => ContinuousParams::from_template(self.table.get(self.target)),
        }
    }

    /// Drop a finished transition
    pub fn settle(&mut self, now: Duration) {
        if self.active.as_ref().is_some_and(|t| t.is_complete(now)) {
            self.active = None;
        }
    }
}
