//! Fixed-rate loop driver
//!
//! Polls a frame source once per tick on a tokio interval, feeds the
//! controller and publishes every report. Late ticks are skipped, not burst.

use kinematics::PerceptionFrame;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{info, warn};

use crate::controller::{SafetyController, TickReport};

/// What a source delivers for one tick
#[derive(Debug, Clone, PartialEq)]
pub struct TickInput {
    pub frame: PerceptionFrame,
    /// Diagnostics request INTEGRITY regardless of kinematics
    pub integrity_requested: bool,
}

impl TickInput {
    pub fn new(frame: PerceptionFrame) -> Self {
        Self {
            frame,
            integrity_requested: false,
        }
    }
}

/// Perception side of the loop
pub trait FrameSource {
    /// Latest frame at loop time `now`, `None` if nothing arrived
    fn poll_frame(&mut self, now: Duration) -> Option<TickInput>;
}

/// Actuator side of the loop
pub trait SignalSink {
    fn publish(&mut self, report: &TickReport);
}

/// Run the loop until `max_ticks` ticks have been processed (forever if `None`).
///
/// Returns the number of ticks processed. A frame older than the deadline is
/// handled as a missed tick.
pub async fn run<S, K>(
    controller: &mut SafetyController,
    source: &mut S,
    sink: &mut K,
    max_ticks: Option<u64>,
) -> u64
where
    S: FrameSource,
    K: SignalSink,
{
    let period = controller.config().tick_period();
    let deadline = Duration::from_millis(controller.config().deadline_ms);
    info!(
        "Starting safety loop at {:.0} Hz",
        1.0 / period.as_secs_f64()
    );

    let epoch = Instant::now();
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut ticks = 0u64;
    while max_ticks.map_or(true, |max| ticks < max) {
        let scheduled = interval.tick().await;
        let now = scheduled.saturating_duration_since(epoch);

        let report = match source.poll_frame(now) {
            Some(input) if now.saturating_sub(input.frame.timestamp) > deadline => {
                warn!(
                    "Dropping frame from {:?}, older than the {:?} deadline",
                    input.frame.timestamp, deadline
                );
                controller.tick_missed(now)
            }
            Some(input) => controller.tick(&input.frame, input.integrity_requested),
            None => controller.tick_missed(now),
        };
        sink.publish(&report);

        let spent = scheduled.elapsed();
        if spent > period {
            warn!("Tick at {:?} overran its period ({:?})", now, spent);
        }
        ticks += 1;
    }

    info!("Safety loop stopped after {} ticks", ticks);
    ticks
}

#[cfg(test)]
mod tests {
    use super::*;
    use kinematics::TrackedHuman;
    use safety_state::SafetyState;

    struct Approach;

    impl FrameSource for Approach {
        fn poll_frame(&mut self, now: Duration) -> Option<TickInput> {
            let distance = 6.0 - now.as_secs_f64();
            Some(TickInput::new(PerceptionFrame::new(
                now,
                0.95,
                vec![TrackedHuman::new(distance, 1.0, 0.0)],
            )))
        }
    }

    struct Silent;

    impl FrameSource for Silent {
        fn poll_frame(&mut self, _now: Duration) -> Option<TickInput> {
            None
        }
    }

    struct Stale;

    impl FrameSource for Stale {
        fn poll_frame(&mut self, _now: Duration) -> Option<TickInput> {
            Some(TickInput::new(PerceptionFrame::empty(Duration::ZERO, 0.95)))
        }
    }

    #[derive(Default)]
    struct Collect(Vec<TickReport>);

    impl SignalSink for Collect {
        fn publish(&mut self, report: &TickReport) {
            self.0.push(report.clone());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fixed_rate_ticks() {
        let mut controller = SafetyController::with_defaults().unwrap();
        let mut sink = Collect::default();

        let ticks = run(&mut controller, &mut Approach, &mut sink, Some(10)).await;

        assert_eq!(ticks, 10);
        let stamps: Vec<u64> = sink.0.iter().map(|r| r.record.timestamp_ms).collect();
        assert_eq!(stamps, (0..10).map(|i| i * 50).collect::<Vec<_>>());
        // 6 m at 1 m/s, then 5.55 m
        assert_eq!(sink.0[0].record.state, SafetyState::Awareness);
        assert_eq!(sink.0[9].record.state, SafetyState::Awareness);
    }

    #[tokio::test(start_paused = true)]
    async fn test_silent_source_forces_integrity() {
        let mut controller = SafetyController::with_defaults().unwrap();
        let mut sink = Collect::default();

        run(&mut controller, &mut Silent, &mut sink, Some(5)).await;

        assert_eq!(sink.0[0].record.state, SafetyState::LowConf);
        assert_eq!(sink.0[3].record.state, SafetyState::Integrity);
        assert_eq!(controller.state(), SafetyState::Integrity);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_frames_count_as_missed() {
        let mut controller = SafetyController::with_defaults().unwrap();
        let mut sink = Collect::default();

        run(&mut controller, &mut Stale, &mut sink, Some(10)).await;

        // Repeats of the t=0 frame are rejected, then dropped once past the deadline
        assert!(sink.0[1].fault.is_some());
        assert_eq!(sink.0[1].record.state, SafetyState::Idle);
        assert_eq!(sink.0[2].record.state, SafetyState::LowConf);
        assert_eq!(sink.0[4].record.state, SafetyState::Integrity);
        assert!(sink.0[5].fault.is_none());
        assert_eq!(sink.0[9].record.state, SafetyState::Integrity);
        assert_eq!(controller.missed_ticks(), 9);
    }
}
