//! State decision engine
//!
//! Maps one tick of TTC, confidence and the integrity request onto the next
//! safety state. The current state is passed in by the caller on every tick;
//! the engine only owns the hysteresis tracker.
//!
//! Decision order, each step short-circuiting the rest:
//! 1. integrity request
//! 2. THREAT bypass (TTC below the bypass threshold, no hysteresis)
//! 3. confidence overlays
//! 4. TTC mapping with proximity floor
//! 5. hysteresis gate (escalate immediately, de-escalate one step after dwell)

use kinematics::TtcResult;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use crate::config::DecisionConfig;
use crate::hysteresis::HysteresisTracker;
use crate::{ConfigError, SafetyState};

/// Everything the engine looks at for one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecisionInput {
    /// TTC of the closest tracked human
    pub ttc: TtcResult,
    /// Distance of the closest tracked human, if any (m)
    pub distance_m: Option<f64>,
    /// Sensor confidence (0-1)
    pub confidence: f64,
    /// External diagnostic request
    pub integrity_requested: bool,
    /// Time since the previous tick
    pub dt: Duration,
}

/// Which rule produced the decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecisionReason {
    IntegrityOverride,
    ThreatBypass,
    LowConfidence,
    MediumConfidence,
    /// Leaving an overlay for a core state
    OverlayExit,
    Escalation,
    /// Dwell satisfied, stepped down one state
    DwellSatisfied,
    /// Lower candidate, dwell not yet satisfied
    HeldByHysteresis,
    Unchanged,
}

/// Engine output for one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub state: SafetyState,
    pub changed: bool,
    pub reason: DecisionReason,
}

/// Deterministic state decision engine
#[derive(Debug, Clone)]
pub struct StateDecisionEngine {
    config: DecisionConfig,
    tracker: HysteresisTracker,
}

impl StateDecisionEngine {
    /// Create an engine; the configuration is validated here and never again
    pub fn new(config: DecisionConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        info!(
            "Creating decision engine: bypass < {}s, confidence {}/{}",
            config.thresholds.threat_s, config.low_confidence, config.medium_confidence
        );
        Ok(Self {
            tracker: HysteresisTracker::new(config.dwell.clone()),
            config,
        })
    }

    pub fn config(&self) -> &DecisionConfig {
        &self.config
    }

    pub fn tracker(&self) -> &HysteresisTracker {
        &self.tracker
    }

    /// Decide the next state
    pub fn decide(&mut self, current: SafetyState, input: &DecisionInput) -> Decision {
        if input.integrity_requested {
            return self.finish(current, SafetyState::Integrity, DecisionReason::IntegrityOverride);
        }

        if input.ttc.ttc_seconds < self.config.thresholds.threat_s {
            return self.finish(current, SafetyState::Threat, DecisionReason::ThreatBypass);
        }

        if input.confidence < self.config.low_confidence {
            return self.finish(current, SafetyState::LowConf, DecisionReason::LowConfidence);
        }
        if input.confidence < self.config.medium_confidence {
            return self.finish(current, SafetyState::MedConf, DecisionReason::MediumConfidence);
        }

        let candidate = self.core_candidate(&input.ttc, input.distance_m);

        let current_severity = match current.severity() {
            Some(severity) => severity,
            None => return self.finish(current, candidate, DecisionReason::OverlayExit),
        };

        let satisfied = self.tracker.observe(current, &input.ttc, input.dt);
        let candidate_severity = candidate.severity().unwrap_or(0);

        if candidate_severity > current_severity {
            return self.finish(current, candidate, DecisionReason::Escalation);
        }
        if candidate_severity == current_severity {
            return self.finish(current, current, DecisionReason::Unchanged);
        }

        match current.step_down() {
            Some(lower) if satisfied => self.finish(current, lower, DecisionReason::DwellSatisfied),
            _ => {
                if let Some(timer) = self.tracker.active() {
                    debug!(
                        "Holding {} (candidate {}): dwell {:.2}/{:.2}s",
                        current,
                        candidate,
                        timer.elapsed_seconds(),
                        timer.required_seconds()
                    );
                }
                self.finish(current, current, DecisionReason::HeldByHysteresis)
            }
        }
    }

    /// Core state the TTC maps to, before hysteresis
    pub fn core_candidate(&self, ttc: &TtcResult, distance_m: Option<f64>) -> SafetyState {
        if !ttc.human_detected {
            return SafetyState::Idle;
        }

        let t = &self.config.thresholds;
        let value = ttc.ttc_seconds;
        let mapped = if value < t.threat_s {
            SafetyState::Threat
        } else if value < t.critical_s {
            SafetyState::Critical
        } else if value < t.care_s {
            SafetyState::Care
        } else if value < t.intent_s {
            SafetyState::Intent
        } else if value < t.awareness_s {
            SafetyState::Awareness
        } else {
            SafetyState::Idle
        };

        let within_floor = distance_m.is_some_and(|d| d < self.config.proximity_floor_m);
        if mapped == SafetyState::Idle && within_floor {
            SafetyState::Awareness
        } else {
            mapped
        }
    }

    fn finish(
        &mut self,
        current: SafetyState,
        next: SafetyState,
        reason: DecisionReason,
    ) -> Decision {
        let changed = next != current;
        if changed {
            self.tracker.reset();
            info!("State {} -> {} ({:?})", current, next, reason);
        }
        Decision {
            state: next,
            changed,
            reason,
        }
    }
}

impl Default for StateDecisionEngine {
    fn default() -> Self {
        Self {
            tracker: HysteresisTracker::default(),
            config: DecisionConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TICK: Duration = Duration::from_millis(50);

    fn input(ttc: f64, confidence: f64) -> DecisionInput {
        DecisionInput {
            ttc: TtcResult::detected(ttc),
            distance_m: Some(ttc.min(50.0)),
            confidence,
            integrity_requested: false,
            dt: TICK,
        }
    }

    fn run(
        engine: &mut StateDecisionEngine,
        mut state: SafetyState,
        tick: DecisionInput,
        ticks: usize,
    ) -> SafetyState {
        for _ in 0..ticks {
            state = engine.decide(state, &tick).state;
        }
        state
    }

    #[test]
    fn test_threshold_table() {
        let engine = StateDecisionEngine::default();
        let cases = [
            (0.3, SafetyState::Threat),
            (0.5, SafetyState::Critical),
            (1.49, SafetyState::Critical),
            (1.5, SafetyState::Care),
            (2.99, SafetyState::Care),
            (3.0, SafetyState::Intent),
            (5.0, SafetyState::Awareness),
            (9.99, SafetyState::Awareness),
            (10.0, SafetyState::Idle),
            (f64::INFINITY, SafetyState::Idle),
        ];
        for (ttc, expected) in cases {
            let actual = engine.core_candidate(&TtcResult::detected(ttc), Some(20.0));
            assert_eq!(actual, expected, "ttc {}", ttc);
        }
        assert_eq!(
            engine.core_candidate(&TtcResult::clear(), None),
            SafetyState::Idle
        );
    }

    #[test]
    fn test_escalation_is_immediate() {
        let mut engine = StateDecisionEngine::default();
        let decision = engine.decide(SafetyState::Idle, &input(2.0, 0.95));
        assert_eq!(decision.state, SafetyState::Care);
        assert!(decision.changed);
        assert_eq!(decision.reason, DecisionReason::Escalation);
    }

    #[test]
    fn test_bypass_ignores_confidence() {
        let mut engine = StateDecisionEngine::default();
        let decision = engine.decide(SafetyState::LowConf, &input(0.4, 0.1));
        assert_eq!(decision.state, SafetyState::Threat);
        assert_eq!(decision.reason, DecisionReason::ThreatBypass);
    }

    #[test]
    fn test_integrity_outranks_bypass() {
        let mut engine = StateDecisionEngine::default();
        let mut tick = input(0.2, 0.95);
        tick.integrity_requested = true;
        assert_eq!(engine.decide(SafetyState::Care, &tick).state, SafetyState::Integrity);

        tick.integrity_requested = false;
        assert_eq!(engine.decide(SafetyState::Integrity, &tick).state, SafetyState::Threat);
    }

    #[test]
    fn test_confidence_overlays() {
        let mut engine = StateDecisionEngine::default();
        assert_eq!(engine.decide(SafetyState::Idle, &input(4.0, 0.59)).state, SafetyState::LowConf);
        assert_eq!(engine.decide(SafetyState::Idle, &input(4.0, 0.60)).state, SafetyState::MedConf);
        assert_eq!(engine.decide(SafetyState::Idle, &input(4.0, 0.79)).state, SafetyState::MedConf);
        assert_eq!(engine.decide(SafetyState::Idle, &input(4.0, 0.80)).state, SafetyState::Intent);
    }

    #[test]
    fn test_overlay_exit_is_immediate() {
        let mut engine = StateDecisionEngine::default();
        let decision = engine.decide(SafetyState::MedConf, &input(20.0, 0.95));
        assert_eq!(decision.state, SafetyState::Idle);
        assert_eq!(decision.reason, DecisionReason::OverlayExit);
    }

    #[test]
    fn test_dwell_interrupted_does_not_deescalate() {
        let mut engine = StateDecisionEngine::default();
        // 2.9s of TTC 4.0 then one tick back at 2.0
        let state = run(&mut engine, SafetyState::Care, input(4.0, 0.95), 58);
        assert_eq!(state, SafetyState::Care);
        let state = run(&mut engine, state, input(2.0, 0.95), 1);
        assert_eq!(state, SafetyState::Care);
        let state = run(&mut engine, state, input(4.0, 0.95), 59);
        assert_eq!(state, SafetyState::Care);
    }

    #[test]
    fn test_dwell_satisfied_steps_down_once() {
        let mut engine = StateDecisionEngine::default();
        let state = run(&mut engine, SafetyState::Care, input(20.0, 0.95), 59);
        assert_eq!(state, SafetyState::Care);

        let decision = engine.decide(state, &input(20.0, 0.95));
        assert_eq!(decision.state, SafetyState::Intent);
        assert_eq!(decision.reason, DecisionReason::DwellSatisfied);
    }

    #[test]
    fn test_threat_needs_ttc_above_075() {
        let mut engine = StateDecisionEngine::default();
        // TTC 0.6 maps to CRITICAL but does not feed the THREAT dwell
        let state = run(&mut engine, SafetyState::Threat, input(0.6, 0.95), 100);
        assert_eq!(state, SafetyState::Threat);
        let state = run(&mut engine, state, input(0.8, 0.95), 40);
        assert_eq!(state, SafetyState::Critical);
    }

    #[test]
    fn test_proximity_floor() {
        let mut engine = StateDecisionEngine::default();
        let tick = DecisionInput {
            ttc: TtcResult::detected(f64::INFINITY),
            distance_m: Some(1.0),
            confidence: 0.95,
            integrity_requested: false,
            dt: TICK,
        };
        assert_eq!(engine.decide(SafetyState::Idle, &tick).state, SafetyState::Awareness);
    }

    #[test]
    fn test_stationary_human_never_escalates() {
        let mut engine = StateDecisionEngine::default();
        for distance in [0.2, 1.0, 3.0, 8.0] {
            let tick = DecisionInput {
                ttc: TtcResult::detected(f64::INFINITY),
                distance_m: Some(distance),
                confidence: 0.95,
                integrity_requested: false,
                dt: TICK,
            };
            let state = engine.decide(SafetyState::Idle, &tick).state;
            assert!(matches!(state, SafetyState::Idle | SafetyState::Awareness));
        }
    }

    #[test]
    fn test_stable_input_is_idempotent() {
        let mut engine = StateDecisionEngine::default();
        let tick = input(4.0, 0.95);
        let mut state = engine.decide(SafetyState::Idle, &tick).state;
        for _ in 0..500 {
            let decision = engine.decide(state, &tick);
            assert!(!decision.changed);
            state = decision.state;
        }
        assert_eq!(state, SafetyState::Intent);
    }

    #[test]
    fn test_monotonic_escalation() {
        let mut engine = StateDecisionEngine::default();
        let mut state = SafetyState::Idle;
        let mut ttc = 12.0;
        while ttc > 0.1 {
            let next = engine.decide(state, &input(ttc, 0.95)).state;
            assert!(next.severity() >= state.severity());
            assert_eq!(next, engine.core_candidate(&TtcResult::detected(ttc), Some(20.0)));
            state = next;
            ttc -= 0.05;
        }
        assert_eq!(state, SafetyState::Threat);
    }

    #[test]
    fn test_decision_inputs_are_kinematic_only() {
        let tick = input(3.0, 0.9);
        // Exhaustive destructuring; a new field fails to compile here
        let DecisionInput {
            ttc,
            distance_m,
            confidence,
            integrity_requested,
            dt,
        } = tick;
        let mut a = StateDecisionEngine::default();
        let mut b = StateDecisionEngine::default();
        let rebuilt = DecisionInput {
            ttc,
            distance_m,
            confidence,
            integrity_requested,
            dt,
        };
        assert_eq!(
            a.decide(SafetyState::Idle, &tick),
            b.decide(SafetyState::Idle, &rebuilt)
        );
    }

    proptest::proptest! {
        #[test]
        fn prop_bypass_from_any_state(
            index in 0usize..9,
            ttc in 0.0f64..0.4999,
            confidence in 0.0f64..=1.0,
        ) {
            let mut engine = StateDecisionEngine::default();
            let current = SafetyState::ALL[index];
            let decision = engine.decide(current, &input(ttc, confidence));
            proptest::prop_assert_eq!(decision.state, SafetyState::Threat);
        }
    }
}
