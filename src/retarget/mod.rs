//! Retargeting pipeline
//!
//! Turns one detector output into rig updates:
//! - `vocabulary`: detector expression names → rig morph target names
//! - `pose`: facial transform matrix → head rotation
//! - `gaze`: directional eye scores → eye rotations
//! - `morph`: expression scores → morph weights
//! - `cycle`: the per-frame state machine tying them together
//! - `driver`: the per-refresh callback around the cycle and renderer

pub mod cycle;
pub mod driver;
pub mod gaze;
pub mod morph;
pub mod pose;
pub mod vocabulary;

pub use cycle::{CyclePhase, CycleStats, FrameOutcome, RetargetCycle};
pub use driver::{FrameDriver, FrameTick, VideoPlane};
pub use gaze::EyeGaze;
pub use pose::PoseDecomposition;
pub use vocabulary::VocabularyMap;
