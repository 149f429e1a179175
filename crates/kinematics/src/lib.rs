//! Kinematic Inputs
//!
//! Provides per-tick kinematic samples, closest-human selection, input
//! validation, and time-to-collision evaluation.

mod error;
mod sample;
mod ttc;
mod validator;

pub use error::SampleError;
pub use sample::{KinematicSample, PerceptionFrame, TrackedHuman};
pub use ttc::{evaluate, time_to_collision, TtcResult};
pub use validator::{SampleValidator, ValidationConfig};
