//! End-to-end frames through the driver with synthetic trackers

use std::collections::{BTreeMap, VecDeque};

use glam::{Mat4, Quat, Vec3};

use face_retarget::config::{Config, MeshConfig};
use face_retarget::error::DetectorError;
use face_retarget::output::Renderer;
use face_retarget::retarget::{FrameDriver, FrameOutcome, FrameTick, RetargetCycle, VideoPlane};
use face_retarget::rig::RigState;
use face_retarget::tracking::{DetectionResult, Detector, ReadyState, VideoFrame, VideoSource};

/// Replays queued detections; an empty queue means the detector errors.
struct FakeTracker {
    ready: ReadyState,
    dimensions: (u32, u32),
    queue: VecDeque<Result<DetectionResult, DetectorError>>,
    refreshes: usize,
    detect_calls: Vec<f64>,
}

impl FakeTracker {
    fn new(queue: Vec<Result<DetectionResult, DetectorError>>) -> Self {
        Self {
            ready: ReadyState::HaveEnoughData,
            dimensions: (1280, 720),
            queue: queue.into(),
            refreshes: 0,
            detect_calls: Vec::new(),
        }
    }
}

impl VideoSource for FakeTracker {
    fn refresh(&mut self) {
        self.refreshes += 1;
    }

    fn ready_state(&self) -> ReadyState {
        self.ready
    }

    fn dimensions(&self) -> (u32, u32) {
        self.dimensions
    }

    fn current_frame(&self) -> VideoFrame {
        VideoFrame {
            width: self.dimensions.0,
            height: self.dimensions.1,
            sequence: self.refreshes as u64,
        }
    }
}

impl Detector for FakeTracker {
    fn detect(&mut self, _frame: &VideoFrame, timestamp_ms: f64) -> Result<DetectionResult, DetectorError> {
        self.detect_calls.push(timestamp_ms);
        self.queue
            .pop_front()
            .unwrap_or_else(|| Err(DetectorError::Unavailable("queue exhausted".into())))
    }
}

/// Keeps a copy of every rig it is asked to render
#[derive(Default)]
struct RecordingRenderer {
    frames: Vec<(RigState, VideoPlane)>,
}

impl Renderer for RecordingRenderer {
    fn render_frame(&mut self, rig: &RigState, plane: VideoPlane) {
        self.frames.push((rig.clone(), plane));
    }
}

fn scores(pairs: &[(&str, f32)]) -> BTreeMap<String, f32> {
    pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

fn head_matrix(pitch: f32, yaw: f32) -> [f32; 16] {
    let rotation = Quat::from_rotation_x(pitch) * Quat::from_rotation_y(yaw);
    Mat4::from_rotation_translation(rotation, Vec3::new(0.0, 0.0, -40.0)).to_cols_array()
}

fn driver(queue: Vec<Result<DetectionResult, DetectorError>>) -> FrameDriver<FakeTracker, RecordingRenderer> {
    let config = Config::default();
    let cycle = RetargetCycle::from_config(&config).unwrap();
    FrameDriver::new(
        cycle,
        FakeTracker::new(queue),
        RecordingRenderer::default(),
        config.driver.video_plane_pixels_per_unit,
    )
}

#[test]
fn jaw_open_drives_au_26_on_every_mesh() {
    let mut driver = driver(vec![Ok(DetectionResult::face(
        scores(&[("jawOpen", 0.9)]),
        Some(head_matrix(0.0, 0.0)),
    ))]);

    driver.tick(0.0);

    let (rig, _) = &driver.renderer().frames[0];
    for mesh in rig.meshes() {
        for (target, &weight) in mesh.target_names().iter().zip(mesh.influences()) {
            if target == "AU_26" {
                assert_eq!(weight, 0.9, "{} on {}", target, mesh.name());
            } else {
                assert_eq!(weight, 0.0, "{} on {}", target, mesh.name());
            }
        }
    }
}

#[test]
fn absent_face_resets_weights_and_keeps_head() {
    let mut absent_scores = scores(&[("jawOpen", 0.0), ("mouthSmileLeft", 0.0), ("browInnerUp", 0.0)]);
    for name in [
        "eyeLookInLeft",
        "eyeLookOutLeft",
        "eyeLookUpLeft",
        "eyeLookDownLeft",
        "eyeLookInRight",
        "eyeLookOutRight",
        "eyeLookUpRight",
        "eyeLookDownRight",
    ] {
        absent_scores.insert(name.to_string(), 0.0);
    }

    let mut driver = driver(vec![
        Ok(DetectionResult::face(
            scores(&[("jawOpen", 0.7), ("mouthSmileRight", 0.4), ("browInnerUp", 0.2), ("eyeLookOutLeft", 0.5)]),
            Some(head_matrix(0.2, -0.3)),
        )),
        Ok(DetectionResult {
            expression_scores: absent_scores,
            pose_matrix: None,
            present: false,
        }),
    ]);

    driver.tick(0.0);
    driver.tick(16.7);

    let frames = &driver.renderer().frames;
    let (first, _) = &frames[0];
    let (second, _) = &frames[1];

    assert_ne!(first.head().rotation(), Vec3::ZERO);
    assert_eq!(second.head().rotation(), first.head().rotation());
    assert!(second.meshes().iter().all(|m| m.influences().iter().all(|&w| w == 0.0)));
    assert_eq!(second.left_eye().rotation(), Vec3::ZERO);
    assert_eq!(second.right_eye().rotation(), Vec3::ZERO);
}

#[test]
fn detector_failure_leaves_rig_unchanged() {
    let mut driver = driver(vec![
        Ok(DetectionResult::face(
            scores(&[("mouthPucker", 0.6), ("eyeLookDownLeft", 0.3)]),
            Some(head_matrix(0.1, 0.1)),
        )),
        Err(DetectorError::Unavailable("inference failed".into())),
    ]);

    driver.tick(0.0);
    driver.tick(16.7);

    assert!(matches!(
        driver.last_outcome(),
        Some(FrameOutcome::DetectorFailed(DetectorError::Unavailable(_)))
    ));
    let frames = &driver.renderer().frames;
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[1].0, frames[0].0);

    let stats = driver.cycle().stats();
    assert_eq!(stats.frames, 2);
    assert_eq!(stats.applied, 1);
    assert_eq!(stats.detector_failures, 1);
    assert!(stats.last_error.as_deref().unwrap().contains("inference failed"));
}

#[test]
fn repeated_detection_is_idempotent() {
    let result = DetectionResult::face(
        scores(&[
            ("jawOpen", 0.35),
            ("noseSneerLeft", 0.15),
            ("eyeLookInRight", 0.4),
            ("eyeLookUpLeft", 0.25),
        ]),
        Some(head_matrix(-0.15, 0.45)),
    );
    let mut driver = driver(vec![Ok(result.clone()), Ok(result)]);

    driver.tick(0.0);
    driver.tick(16.7);

    let frames = &driver.renderer().frames;
    assert_eq!(frames[0].0, frames[1].0);
}

#[test]
fn not_ready_video_skips_detection_but_still_renders() {
    let mut driver = driver(vec![Ok(DetectionResult::face(scores(&[("jawOpen", 1.0)]), None))]);
    driver.tracker_mut().ready = ReadyState::HaveNothing;
    driver.tracker_mut().dimensions = (0, 0);

    driver.tick(0.0);

    assert_eq!(driver.last_outcome(), Some(&FrameOutcome::NotReady));
    assert!(driver.tracker().detect_calls.is_empty());
    assert_eq!(driver.tracker().refreshes, 1);

    let (rig, plane) = &driver.renderer().frames[0];
    assert_eq!(rig.weight("AU_26"), Some(0.0));
    assert_eq!(*plane, VideoPlane::default());

    driver.tracker_mut().ready = ReadyState::HaveMetadata;
    driver.tracker_mut().dimensions = (1280, 720);
    driver.tick(16.7);
    assert_eq!(driver.tracker().detect_calls, vec![16.7]);
    assert_eq!(driver.renderer().frames[1].0.weight("AU_26"), Some(1.0));
}

#[test]
fn render_sees_the_frame_it_follows() {
    let mut driver = driver(vec![
        Ok(DetectionResult::face(scores(&[("browDownLeft", 0.1)]), None)),
        Ok(DetectionResult::face(scores(&[("browDownLeft", 0.5)]), None)),
        Ok(DetectionResult::face(scores(&[("browDownLeft", 0.8)]), None)),
    ]);

    for i in 0..3 {
        driver.tick(i as f64 * 16.7);
    }

    let weights: Vec<_> = driver
        .renderer()
        .frames
        .iter()
        .map(|(rig, _)| rig.weight("AU_4"))
        .collect();
    assert_eq!(weights, vec![Some(0.1), Some(0.5), Some(0.8)]);

    let (_, plane) = &driver.renderer().frames[0];
    assert!((plane.width - 12.8).abs() < 1e-5);
    assert!((plane.height - 7.2).abs() < 1e-5);
}

#[test]
fn gaze_turns_both_eyes_the_same_way() {
    let mut driver = driver(vec![Ok(DetectionResult::face(
        scores(&[("eyeLookOutLeft", 0.8), ("eyeLookInLeft", 0.2), ("eyeLookInRight", 0.6)]),
        None,
    ))]);

    driver.tick(0.0);

    let limit = 30f32.to_radians();
    let (rig, _) = &driver.renderer().frames[0];
    assert!((rig.left_eye().rotation().z - 0.6 * limit).abs() < 1e-5);
    assert!((rig.right_eye().rotation().z - 0.6 * limit).abs() < 1e-5);
}

#[test]
fn custom_rig_only_receives_its_own_targets() {
    let mut config = Config::default();
    config.rig.meshes = vec![MeshConfig {
        name: "Face".into(),
        morph_targets: vec!["AU_12".into()],
    }];
    let cycle = RetargetCycle::from_config(&config).unwrap();
    let mut driver = FrameDriver::new(
        cycle,
        FakeTracker::new(vec![Ok(DetectionResult::face(
            scores(&[("mouthSmileLeft", 0.3), ("jawOpen", 0.9)]),
            None,
        ))]),
        RecordingRenderer::default(),
        100.0,
    );

    driver.tick(0.0);

    assert!(matches!(
        driver.last_outcome(),
        Some(FrameOutcome::Applied { weights_written: 1, .. })
    ));
    let (rig, _) = &driver.renderer().frames[0];
    assert_eq!(rig.weight("AU_12"), Some(0.3));
    assert_eq!(rig.weight("AU_26"), None);
}
