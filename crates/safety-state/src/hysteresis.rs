//! De-escalation dwell tracking
//!
//! Only the boundary directly below the current state is tracked. Its timer
//! accumulates while the boundary's condition holds and drops to zero on the
//! first tick where it does not.

use kinematics::TtcResult;
use std::time::Duration;
use tracing::debug;

use crate::config::{DwellRule, DwellTable};
use crate::SafetyState;

/// What must stay true for a de-escalation to be allowed
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DwellCondition {
    /// TTC strictly above the given seconds
    TtcAbove(f64),
    /// No human tracked at all
    NoDetection,
}

impl DwellCondition {
    fn from_rule(rule: &DwellRule) -> Self {
        match rule.min_ttc_s {
            Some(ttc) => DwellCondition::TtcAbove(ttc),
            None => DwellCondition::NoDetection,
        }
    }

    /// Whether the condition holds for this tick
    pub fn holds(&self, ttc: &TtcResult) -> bool {
        match *self {
            DwellCondition::TtcAbove(min) => ttc.ttc_seconds > min,
            DwellCondition::NoDetection => !ttc.human_detected,
        }
    }
}

/// Dwell accumulator for one boundary
#[derive(Debug, Clone, PartialEq)]
pub struct HysteresisTimer {
    /// (from, to) states of the boundary
    pub boundary: (SafetyState, SafetyState),
    /// Condition that feeds the timer
    pub condition: DwellCondition,
    elapsed: Duration,
    required: Duration,
}

impl HysteresisTimer {
    fn new(from: SafetyState, to: SafetyState, rule: &DwellRule) -> Self {
        Self {
            boundary: (from, to),
            condition: DwellCondition::from_rule(rule),
            elapsed: Duration::ZERO,
            required: rule.sustain(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn required(&self) -> Duration {
        self.required
    }

    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }

    pub fn required_seconds(&self) -> f64 {
        self.required.as_secs_f64()
    }

    pub fn is_satisfied(&self) -> bool {
        self.elapsed >= self.required
    }

    fn advance(&mut self, ttc: &TtcResult, dt: Duration) {
        if self.condition.holds(ttc) {
            // Cap at one tick past the requirement
            self.elapsed = (self.elapsed + dt).min(self.required + dt);
        } else {
            if !self.elapsed.is_zero() {
                debug!(
                    "Dwell {} -> {} interrupted after {:.2}s",
                    self.boundary.0,
                    self.boundary.1,
                    self.elapsed_seconds()
                );
            }
            self.elapsed = Duration::ZERO;
        }
    }
}

/// Tracks the single active de-escalation boundary
#[derive(Debug, Clone)]
pub struct HysteresisTracker {
    dwell: DwellTable,
    bound_to: Option<SafetyState>,
    active: Option<HysteresisTimer>,
}

impl HysteresisTracker {
    pub fn new(dwell: DwellTable) -> Self {
        Self {
            dwell,
            bound_to: None,
            active: None,
        }
    }

    /// Feed one tick. Returns true when the boundary below `current` has been
    /// satisfied for its full duration.
    pub fn observe(&mut self, current: SafetyState, ttc: &TtcResult, dt: Duration) -> bool {
        if self.bound_to != Some(current) {
            self.bind(current);
        }

        match self.active.as_mut() {
            Some(timer) => {
                timer.advance(ttc, dt);
                timer.is_satisfied()
            }
            None => false,
        }
    }

    /// Drop all accumulated dwell
    pub fn reset(&mut self) {
        self.bound_to = None;
        self.active = None;
    }

    /// Timer for the boundary currently tracked
    pub fn active(&self) -> Option<&HysteresisTimer> {
        self.active.as_ref()
    }

    fn bind(&mut self, current: SafetyState) {
        self.bound_to = Some(current);
        self.active = match (self.dwell.rule_for(current), current.step_down()) {
            (Some(rule), Some(lower)) => Some(HysteresisTimer::new(current, lower, rule)),
            _ => None,
        };
    }
}

impl Default for HysteresisTracker {
    fn default() -> Self {
        Self::new(DwellTable::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TICK: Duration = Duration::from_millis(50);

    fn feed(tracker: &mut HysteresisTracker, state: SafetyState, ttc: f64, ticks: usize) -> bool {
        let mut satisfied = false;
        for _ in 0..ticks {
            satisfied = tracker.observe(state, &TtcResult::detected(ttc), TICK);
        }
        satisfied
    }

    #[test]
    fn test_care_requires_three_seconds() {
        let mut tracker = HysteresisTracker::default();
        assert!(!feed(&mut tracker, SafetyState::Care, 4.0, 59));
        assert!(feed(&mut tracker, SafetyState::Care, 4.0, 1));
    }

    #[test]
    fn test_interruption_resets() {
        let mut tracker = HysteresisTracker::default();
        feed(&mut tracker, SafetyState::Care, 4.0, 58);
        assert!(!feed(&mut tracker, SafetyState::Care, 2.0, 1));
        assert_eq!(tracker.active().unwrap().elapsed(), Duration::ZERO);
        assert!(!feed(&mut tracker, SafetyState::Care, 4.0, 59));
    }

    #[test]
    fn test_bounded_overshoot() {
        let mut tracker = HysteresisTracker::default();
        feed(&mut tracker, SafetyState::Threat, 5.0, 400);
        let timer = tracker.active().unwrap();
        assert!(timer.elapsed() <= timer.required() + TICK);
        assert!(timer.is_satisfied());
    }

    #[test]
    fn test_state_switch_resets() {
        let mut tracker = HysteresisTracker::default();
        feed(&mut tracker, SafetyState::Critical, 3.0, 30);
        assert_eq!(tracker.active().unwrap().elapsed(), Duration::from_millis(1500));

        tracker.observe(SafetyState::Care, &TtcResult::detected(3.0), TICK);
        let timer = tracker.active().unwrap();
        assert_eq!(timer.boundary, (SafetyState::Care, SafetyState::Intent));
        assert_eq!(timer.elapsed(), TICK);
    }

    #[test]
    fn test_awareness_needs_no_detection() {
        let mut tracker = HysteresisTracker::default();
        // A tracked but far-away human keeps the timer at zero
        assert!(!feed(&mut tracker, SafetyState::Awareness, f64::INFINITY, 250));

        let mut satisfied = false;
        for _ in 0..200 {
            satisfied = tracker.observe(SafetyState::Awareness, &TtcResult::clear(), TICK);
        }
        assert!(satisfied);
    }

    #[test]
    fn test_idle_and_overlays_have_no_boundary() {
        let mut tracker = HysteresisTracker::default();
        for state in [SafetyState::Idle, SafetyState::LowConf, SafetyState::Integrity] {
            assert!(!tracker.observe(state, &TtcResult::clear(), TICK));
            assert!(tracker.active().is_none());
        }
    }

    #[test]
    fn test_reset() {
        let mut tracker = HysteresisTracker::default();
        feed(&mut tracker, SafetyState::Intent, 8.0, 10);
        tracker.reset();
        assert!(tracker.active().is_none());
    }
}
