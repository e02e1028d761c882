//! Tracking module
//!
//! Collaborator interfaces for the camera feed and the face detector, the
//! per-frame detection result, and a MediaPipe Face Landmarker backend
//! (JSON over UDP from a helper process).

pub mod mediapipe;

use std::collections::BTreeMap;

use crate::error::DetectorError;

/// Readiness of the video feed, ordered like `HTMLMediaElement.readyState`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum ReadyState {
    /// No information about the stream yet
    #[default]
    HaveNothing,
    /// Dimensions are known
    HaveMetadata,
    /// The current frame is available
    HaveCurrentData,
    /// The current and at least the next frame are available
    HaveFutureData,
    /// Enough data to play through
    HaveEnoughData,
}

impl ReadyState {
    /// Whether the retarget cycle may run a detection on this feed
    pub fn has_metadata(self) -> bool {
        self >= ReadyState::HaveMetadata
    }
}

/// Descriptor of the frame handed to the detector. Pixel data stays with the
/// video source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VideoFrame {
    pub width: u32,
    pub height: u32,
    /// Monotonic frame counter of the source
    pub sequence: u64,
}

/// One detector output. At most one face.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectionResult {
    /// Expression name → score in [0, 1]
    pub expression_scores: BTreeMap<String, f32>,
    /// Column-major facial transformation matrix, present only with a face
    pub pose_matrix: Option<[f32; 16]>,
    /// Whether a face was found this frame
    pub present: bool,
}

impl DetectionResult {
    /// No face, no scores
    pub fn empty() -> Self {
        Self::default()
    }

    /// A detected face
    pub fn face(expression_scores: BTreeMap<String, f32>, pose_matrix: Option<[f32; 16]>) -> Self {
        Self {
            expression_scores,
            pose_matrix,
            present: true,
        }
    }

    /// Score of one expression, 0.0 when missing
    pub fn score(&self, name: &str) -> f32 {
        self.expression_scores.get(name).copied().unwrap_or(0.0)
    }
}

/// The camera feed as seen by the retarget cycle.
pub trait VideoSource {
    /// Pull whatever the feed has produced since the last refresh.
    fn refresh(&mut self) {}

    fn ready_state(&self) -> ReadyState;

    /// Native pixel size, (0, 0) when unknown
    fn dimensions(&self) -> (u32, u32);

    fn current_frame(&self) -> VideoFrame;
}

/// A single-face expression and head pose detector.
///
/// Calls are synchronous: the retarget cycle never issues a second call before
/// the first returns.
pub trait Detector {
    fn detect(&mut self, frame: &VideoFrame, timestamp_ms: f64) -> Result<DetectionResult, DetectorError>;
}
