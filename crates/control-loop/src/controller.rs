//! Safety Controller Implementation
//!
//! Runs one tick of the pipeline: closest-human selection, validation, TTC,
//! state decision, transition blending and rendering. A tick never fails.
//! The first rejected frame re-emits the previous record together with the
//! fault; further ticks without a valid sample degrade like missed frames.

use kinematics::{
    evaluate, KinematicSample, PerceptionFrame, SampleError, SampleValidator, TtcResult,
};
use safety_state::{DecisionInput, SafetyState, StateDecisionEngine};
use signaling::{render, TemplateTable, TransitionBlender};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::ControlLoopConfig;
use crate::history::{StateChange, StateHistory};
use crate::record::SignalRecord;
use crate::ControllerError;

/// Outcome of one tick
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    /// Record to hand to the actuators
    pub record: SignalRecord,
    /// Whether the state changed on this tick
    pub changed: bool,
    /// Why the tick's input was rejected, if it was
    pub fault: Option<SampleError>,
}

/// Owns all mutable safety state for the loop
pub struct SafetyController {
    config: ControlLoopConfig,
    engine: StateDecisionEngine,
    validator: SampleValidator,
    blender: TransitionBlender,
    table: Arc<TemplateTable>,
    state: SafetyState,
    state_entered: Duration,
    last_timestamp: Option<Duration>,
    last_record: Option<SignalRecord>,
    missed_ticks: u32,
    history: StateHistory,
}

impl SafetyController {
    /// Create a controller. All configuration is checked here.
    pub fn new(config: ControlLoopConfig, table: TemplateTable) -> Result<Self, ControllerError> {
        config.validate()?;
        table.validate()?;

        let table = Arc::new(table);
        let engine = StateDecisionEngine::new(config.decision.clone())?;
        info!(
            "Creating safety controller: tick {}ms, deadline {}ms",
            config.tick_period_ms, config.deadline_ms
        );

        Ok(Self {
            engine,
            validator: SampleValidator::new(config.validation.clone()),
            blender: TransitionBlender::new(Arc::clone(&table), SafetyState::Idle),
            table,
            state: SafetyState::Idle,
            state_entered: Duration::ZERO,
            last_timestamp: None,
            last_record: None,
            missed_ticks: 0,
            history: StateHistory::new(config.history_capacity),
            config,
        })
    }

    /// Controller with default configuration and canonical templates
    pub fn with_defaults() -> Result<Self, ControllerError> {
        Self::new(ControlLoopConfig::default(), TemplateTable::canonical())
    }

    /// Process the frame that arrived for this tick
    pub fn tick(&mut self, frame: &PerceptionFrame, integrity_requested: bool) -> TickReport {
        metrics::counter!("safety_ticks_total").increment(1);

        let sample = frame.closest_sample();
        let ttc = match self.check_frame(frame, sample.as_ref()) {
            Ok(ttc) => ttc,
            Err(fault) => return self.reject(fault, frame.timestamp),
        };

        let now = frame.timestamp;
        let dt = self.elapsed_since_last(now);
        self.last_timestamp = Some(now);
        if self.missed_ticks > 0 {
            info!("Frames resumed after {} missed ticks", self.missed_ticks);
            self.missed_ticks = 0;
        }

        let input = DecisionInput {
            ttc,
            distance_m: sample.as_ref().map(|s| s.distance_m),
            confidence: frame.confidence,
            integrity_requested,
            dt,
        };
        self.advance(&input, now, sample.as_ref())
    }

    /// No frame arrived within the tick.
    ///
    /// Degrades to LOW_CONF, then forces INTEGRITY once the configured number
    /// of consecutive ticks has passed without a valid sample.
    pub fn tick_missed(&mut self, now: Duration) -> TickReport {
        metrics::counter!("safety_ticks_total").increment(1);
        metrics::counter!("safety_missed_ticks_total").increment(1);
        warn!(
            "Missed perception frame at {:?} ({} consecutive)",
            now,
            self.missed_ticks + 1
        );
        self.degrade(now)
    }

    pub fn state(&self) -> SafetyState {
        self.state
    }

    pub fn history(&self) -> &StateHistory {
        &self.history
    }

    /// Consecutive ticks without a valid sample, missed or rejected
    pub fn missed_ticks(&self) -> u32 {
        self.missed_ticks
    }

    pub fn blender(&self) -> &TransitionBlender {
        &self.blender
    }

    pub fn config(&self) -> &ControlLoopConfig {
        &self.config
    }

    fn check_frame(
        &self,
        frame: &PerceptionFrame,
        sample: Option<&KinematicSample>,
    ) -> Result<TtcResult, SampleError> {
        match sample {
            Some(sample) => {
                self.validator.validate(sample, self.last_timestamp)?;
                if let Some(finding) = self.validator.plausibility(sample) {
                    metrics::counter!("safety_implausible_samples_total").increment(1);
                    warn!("Keeping implausible sample: {}", finding);
                }
                evaluate(sample)
            }
            None => {
                self.validator.validate_confidence(frame.confidence)?;
                self.validator
                    .validate_timestamp(frame.timestamp, self.last_timestamp)?;
                Ok(TtcResult::clear())
            }
        }
    }

    fn elapsed_since_last(&self, now: Duration) -> Duration {
        match self.last_timestamp {
            Some(last) => now.saturating_sub(last),
            None => self.config.tick_period(),
        }
    }

    fn advance(
        &mut self,
        input: &DecisionInput,
        now: Duration,
        sample: Option<&KinematicSample>,
    ) -> TickReport {
        let decision = self.engine.decide(self.state, input);

        if decision.changed {
            metrics::counter!("safety_state_changes_total", "to" => decision.state.as_str())
                .increment(1);
            self.history.push(StateChange {
                timestamp: now,
                from: self.state,
                to: decision.state,
                reason: decision.reason,
                ttc_seconds: input.ttc.ttc_seconds.is_finite().then_some(input.ttc.ttc_seconds),
            });
            let transition = self.blender.on_state_change(decision.state, now);
            debug!(
                "Blending {} -> {} over {}ms ({:?})",
                transition.from, transition.to, transition.duration_ms, transition.class
            );
            self.state = decision.state;
            self.state_entered = now;
        }

        if let Some(severity) = self.state.severity() {
            metrics::gauge!("safety_state_severity").set(f64::from(severity));
        }

        let params = self.blender.params_at(now);
        self.blender.settle(now);
        let signal = render(
            self.table.get(self.state),
            &params,
            now.saturating_sub(self.state_entered),
        );
        let record = SignalRecord::new(now, self.state, &input.ttc, sample, input.confidence, &signal);
        self.last_record = Some(record.clone());

        TickReport {
            record,
            changed: decision.changed,
            fault: None,
        }
    }

    /// Tick with confidence 0 and no kinematics
    fn degrade(&mut self, now: Duration) -> TickReport {
        self.missed_ticks += 1;
        let integrity = self.missed_ticks >= self.config.max_missed_ticks;

        let dt = self.elapsed_since_last(now);
        if self.last_timestamp.map_or(true, |last| now > last) {
            self.last_timestamp = Some(now);
        }

        let input = DecisionInput {
            ttc: TtcResult::clear(),
            distance_m: None,
            confidence: 0.0,
            integrity_requested: integrity,
            dt,
        };
        self.advance(&input, now, None)
    }

    fn reject(&mut self, fault: SampleError, timestamp: Duration) -> TickReport {
        metrics::counter!("safety_rejected_samples_total").increment(1);

        if self.missed_ticks > 0 {
            warn!(
                "Rejected perception frame ({} consecutive without a valid sample): {}",
                self.missed_ticks + 1,
                fault
            );
            let now = self.last_timestamp.map_or(timestamp, |last| timestamp.max(last));
            let mut report = self.degrade(now);
            report.fault = Some(fault);
            return report;
        }

        warn!("Rejected perception frame, holding {}: {}", self.state, fault);
        self.missed_ticks = 1;
        let record = match &self.last_record {
            Some(record) => record.clone(),
            None => {
                let template = self.table.get(self.state);
                let signal = render(template, &self.blender.params_at(timestamp), Duration::ZERO);
                SignalRecord::new(timestamp, self.state, &TtcResult::clear(), None, 0.0, &signal)
            }
        };

        TickReport {
            record,
            changed: false,
            fault: Some(fault),
        }
    }
}
