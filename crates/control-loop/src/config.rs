//! Control loop configuration

use kinematics::ValidationConfig;
use safety_state::DecisionConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::ControllerError;

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Max level: trace, debug, info, warn, error
    pub level: String,
    /// Emit JSON lines instead of human-readable text
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Complete loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlLoopConfig {
    /// Tick period (ms), 50 = 20 Hz
    pub tick_period_ms: u64,
    /// End-to-end deadline from sample to actuator (ms)
    pub deadline_ms: u64,
    /// Consecutive missed ticks before INTEGRITY is forced
    pub max_missed_ticks: u32,
    /// State changes kept in the history
    pub history_capacity: usize,
    pub decision: DecisionConfig,
    pub validation: ValidationConfig,
    pub log: LogConfig,
}

impl Default for ControlLoopConfig {
    fn default() -> Self {
        Self {
            tick_period_ms: 50,
            deadline_ms: 200,
            max_missed_ticks: 4,
            history_capacity: 256,
            decision: DecisionConfig::default(),
            validation: ValidationConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl ControlLoopConfig {
    /// Load from an optional TOML/JSON/YAML file, then `SAFETY_*` environment
    /// variables (`SAFETY_TICK_PERIOD_MS`, `SAFETY_DECISION__PROXIMITY_FLOOR_M`).
    pub fn load(path: Option<&Path>) -> Result<Self, ControllerError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            info!("Loading control loop config from {}", path.display());
            builder = builder.add_source(config::File::from(path));
        }
        builder = builder.add_source(
            config::Environment::with_prefix("SAFETY")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let loaded: Self = builder.build()?.try_deserialize()?;
        loaded.validate()?;
        Ok(loaded)
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_period_ms)
    }

    /// Check loop-level settings and the nested decision config
    pub fn validate(&self) -> Result<(), ControllerError> {
        if self.tick_period_ms == 0 {
            return Err(ControllerError::Loop("tick_period_ms must be positive".into()));
        }
        if self.tick_period_ms > self.deadline_ms {
            return Err(ControllerError::Loop(format!(
                "tick period {}ms exceeds the {}ms deadline",
                self.tick_period_ms, self.deadline_ms
            )));
        }
        if self.max_missed_ticks == 0 {
            return Err(ControllerError::Loop("max_missed_ticks must be positive".into()));
        }
        if self.history_capacity == 0 {
            return Err(ControllerError::Loop("history_capacity must be positive".into()));
        }
        self.decision.validate()?;
        Ok(())
    }
}
