//! Per-frame retarget cycle
//!
//! One pass per display refresh: check the feed is ready, run the detector
//! once, then write head pose, eye gaze and morph weights onto the rig. A
//! failed detection leaves the rig exactly as the previous frame left it.

use serde::Serialize;

use super::vocabulary::VocabularyMap;
use super::{gaze, morph, pose};
use crate::config::Config;
use crate::error::DetectorError;
use crate::rig::RigState;
use crate::tracking::{DetectionResult, Detector, VideoSource};

/// Where the cycle is within the current frame. There is no terminal phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum CyclePhase {
    #[default]
    Idle,
    Detecting,
    Applying,
    Settled,
}

/// What a single frame did to the rig
#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    /// Video not ready; rig untouched
    NotReady,
    /// Detection applied
    Applied {
        present: bool,
        head_updated: bool,
        weights_written: usize,
    },
    /// Detector failed; rig untouched
    DetectorFailed(DetectorError),
}

/// Running counters for the cycle
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CycleStats {
    pub frames: u64,
    pub applied: u64,
    pub not_ready: u64,
    pub detector_failures: u64,
    pub malformed_poses: u64,
    pub last_error: Option<String>,
}

/// Sole writer of the rig state
pub struct RetargetCycle {
    rig: RigState,
    vocabulary: &'static VocabularyMap,
    eye_rotation_limit: f32,
    phase: CyclePhase,
    stats: CycleStats,
}

impl RetargetCycle {
    /// `eye_rotation_limit` is in radians.
    pub fn new(rig: RigState, eye_rotation_limit: f32) -> Self {
        Self {
            rig,
            vocabulary: VocabularyMap::shared(),
            eye_rotation_limit,
            phase: CyclePhase::Idle,
            stats: CycleStats::default(),
        }
    }

    /// Build the rig and cycle parameters from configuration
    pub fn from_config(config: &Config) -> crate::Result<Self> {
        let rig = RigState::from_config(&config.rig)?;
        Ok(Self::new(rig, config.retarget.eye_rotation_limit()))
    }

    pub fn rig(&self) -> &RigState {
        &self.rig
    }

    pub fn phase(&self) -> CyclePhase {
        self.phase
    }

    pub fn stats(&self) -> &CycleStats {
        &self.stats
    }

    fn enter(&mut self, phase: CyclePhase) {
        tracing::trace!("cycle {:?} -> {:?}", self.phase, phase);
        self.phase = phase;
    }

    /// Run one frame against the tracker.
    pub fn run_frame<S>(&mut self, tracker: &mut S, timestamp_ms: f64) -> FrameOutcome
    where
        S: VideoSource + Detector,
    {
        self.enter(CyclePhase::Idle);
        self.stats.frames += 1;

        if !tracker.ready_state().has_metadata() {
            self.stats.not_ready += 1;
            self.enter(CyclePhase::Settled);
            return FrameOutcome::NotReady;
        }

        self.enter(CyclePhase::Detecting);
        let frame = tracker.current_frame();
        let result = match tracker.detect(&frame, timestamp_ms) {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!("Detection failed at {:.1}ms: {}", timestamp_ms, e);
                self.stats.detector_failures += 1;
                self.stats.last_error = Some(e.to_string());
                self.enter(CyclePhase::Settled);
                return FrameOutcome::DetectorFailed(e);
            }
        };

        let outcome = self.apply_detection(&result);
        self.enter(CyclePhase::Settled);
        outcome
    }

    /// Write one detection result onto the rig. Applying the same result
    /// twice leaves the rig as the first application did.
    pub fn apply_detection(&mut self, result: &DetectionResult) -> FrameOutcome {
        self.enter(CyclePhase::Applying);

        let mut head_updated = false;
        if result.present {
            if let Some(matrix) = &result.pose_matrix {
                match pose::decompose(matrix) {
                    Ok(decomposition) => {
                        self.rig
                            .head_mut()
                            .set_rotation(decomposition.rig_head_rotation());
                        head_updated = true;
                    }
                    Err(e) => {
                        tracing::warn!("Head pose skipped: {}", e);
                        self.stats.malformed_poses += 1;
                        self.stats.last_error = Some(e.to_string());
                    }
                }
            }
        }

        let gaze = gaze::synthesize(&result.expression_scores, self.eye_rotation_limit);
        let left = self.rig.left_eye_mut();
        left.set_rotation_x(gaze.left_pitch);
        left.set_rotation_z(gaze.left_yaw);
        let right = self.rig.right_eye_mut();
        right.set_rotation_x(gaze.right_pitch);
        right.set_rotation_z(gaze.right_yaw);

        let weights_written = morph::apply(&result.expression_scores, self.vocabulary, &mut self.rig);

        self.stats.applied += 1;
        FrameOutcome::Applied {
            present: result.present,
            head_updated,
            weights_written,
        }
    }
}
