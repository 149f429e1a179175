//! Safety Signaling Simulator - Main Entry Point
//!
//! Drives the control loop with a scripted approach-and-retreat and prints
//! one JSON signal record per tick.
//!
//! Usage: safety-sim [config.toml]

use control_loop::{
    init_logging, run, ControlLoopConfig, FrameSource, SafetyController, SignalSink, TickInput,
    TickReport,
};
use kinematics::{PerceptionFrame, TrackedHuman};
use signaling::TemplateTable;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

/// Person walks towards the robot, stops, then walks away
struct ScriptedApproach {
    start_m: f64,
    speed_mps: f64,
    closest_m: f64,
    approach_s: f64,
    pause_s: f64,
    confidence: f64,
}

impl ScriptedApproach {
    fn new() -> Self {
        let start_m = 12.0;
        let speed_mps = 1.4;
        let closest_m = 0.6;
        Self {
            start_m,
            speed_mps,
            closest_m,
            approach_s: (start_m - closest_m) / speed_mps,
            pause_s: 2.0,
            confidence: 0.92,
        }
    }

    fn duration(&self) -> Duration {
        Duration::from_secs_f64(2.0 * self.approach_s + self.pause_s)
    }

    fn human_at(&self, t: f64) -> TrackedHuman {
        if t < self.approach_s {
            TrackedHuman::new(self.start_m - self.speed_mps * t, self.speed_mps, 0.0)
        } else if t < self.approach_s + self.pause_s {
            TrackedHuman::new(self.closest_m, 0.0, 0.0)
        } else {
            let away = t - self.approach_s - self.pause_s;
            TrackedHuman::new(self.closest_m + self.speed_mps * away, -self.speed_mps, 0.0)
        }
    }
}

impl FrameSource for ScriptedApproach {
    fn poll_frame(&mut self, now: Duration) -> Option<TickInput> {
        let human = self.human_at(now.as_secs_f64());
        Some(TickInput::new(PerceptionFrame::new(
            now,
            self.confidence,
            vec![human],
        )))
    }
}

/// Writes every record to stdout as a JSON line
struct JsonLines;

impl SignalSink for JsonLines {
    fn publish(&mut self, report: &TickReport) {
        if let Some(fault) = &report.fault {
            warn!("Tick fault: {}", fault);
        }
        match report.record.to_json() {
            Ok(line) => println!("{}", line),
            Err(e) => warn!("Failed to encode signal record: {}", e),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = ControlLoopConfig::load(config_path.as_deref())?;
    init_logging(&config.log)?;

    info!("=== Safety Signaling Simulator v{} ===", env!("CARGO_PKG_VERSION"));

    let script = ScriptedApproach::new();
    let script_ms = u64::try_from(script.duration().as_millis()).unwrap_or(u64::MAX);
    let ticks = script_ms / config.tick_period_ms + 1;
    info!("Running scripted approach for {} ticks", ticks);

    let mut controller = SafetyController::new(config, TemplateTable::canonical())?;
    let mut source = script;
    run(&mut controller, &mut source, &mut JsonLines, Some(ticks)).await;

    for change in controller.history().iter() {
        info!(
            "{:>8.2}s  {} -> {} ({:?})",
            change.timestamp.as_secs_f64(),
            change.from,
            change.to,
            change.reason
        );
    }
    info!("Finished in state {}", controller.state());

    Ok(())
}
