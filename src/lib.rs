//! face-retarget - Real-time face retargeting onto a rigged avatar
//!
//! Reads per-frame expression scores and a head transform from a single-face
//! detector and drives an avatar rig with them:
//! - Morph target weights via a fixed expression vocabulary
//! - Eye rotations synthesized from directional gaze scores
//! - Head rotation decomposed from the facial transformation matrix
//! - MediaPipe Face Landmarker input over UDP

pub mod config;
pub mod error;
pub mod output;
pub mod retarget;
pub mod rig;
pub mod tracking;

pub use config::Config;
pub use error::{Result, RetargetError};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
