//! Safety Signaling Control Loop
//!
//! Fixed-rate loop that ties the pipeline together:
//! - Frame validation and closest-human TTC
//! - State decision with hysteresis
//! - Transition blending and trimodal rendering
//! - Per-tick signal records and state history

pub mod config;
pub mod controller;
pub mod history;
pub mod record;
pub mod runner;

pub use crate::config::{ControlLoopConfig, LogConfig};
pub use controller::{SafetyController, TickReport};
pub use history::{StateChange, StateHistory};
pub use record::{LightRecord, MotionRecord, SignalRecord, SoundRecord};
pub use runner::{run, FrameSource, SignalSink, TickInput};

use thiserror::Error;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Startup errors. Nothing after startup returns an error.
#[derive(Error, Debug)]
pub enum ControllerError {
    #[error("Invalid decision config: {0}")]
    Decision(#[from] safety_state::ConfigError),

    #[error("Invalid signal templates: {0}")]
    Templates(#[from] signaling::TemplateError),

    #[error("Failed to load config: {0}")]
    Load(#[from] ::config::ConfigError),

    #[error("Invalid loop config: {0}")]
    Loop(String),
}

/// Initialize logging
pub fn init_logging(config: &LogConfig) -> anyhow::Result<()> {
    let level: Level = config
        .level
        .parse()
        .map_err(|_| anyhow::anyhow!("unknown log level '{}'", config.level))?;

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true);

    if config.json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}
