//! Eye gaze synthesis.
//!
//! The rig has no morph targets for eye aim, so the eight directional
//! "eyeLook*" scores are folded into pitch/yaw rotations for the eye nodes.
//! Each axis has two opposing scores; adding one and subtracting the other
//! gives a differential in roughly [-1, 1].

use serde::Serialize;
use std::collections::BTreeMap;

pub const EYE_LOOK_IN_LEFT: &str = "eyeLookInLeft";
pub const EYE_LOOK_OUT_LEFT: &str = "eyeLookOutLeft";
pub const EYE_LOOK_UP_LEFT: &str = "eyeLookUpLeft";
pub const EYE_LOOK_DOWN_LEFT: &str = "eyeLookDownLeft";
pub const EYE_LOOK_IN_RIGHT: &str = "eyeLookInRight";
pub const EYE_LOOK_OUT_RIGHT: &str = "eyeLookOutRight";
pub const EYE_LOOK_UP_RIGHT: &str = "eyeLookUpRight";
pub const EYE_LOOK_DOWN_RIGHT: &str = "eyeLookDownRight";

/// Eye rotations in radians.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct EyeGaze {
    pub left_pitch: f32,
    pub left_yaw: f32,
    pub right_pitch: f32,
    pub right_yaw: f32,
}

#[derive(Default)]
struct EyeScoreAccumulator {
    left_horizontal: f32,
    right_horizontal: f32,
    left_vertical: f32,
    right_vertical: f32,
}

/// Derive eye rotations from the directional scores.
///
/// Left yaw is out minus in; right yaw is in minus out, so both eyes turn the
/// same way on an avatar facing the viewer. Pitch is down minus up for both.
/// Missing or non-finite scores contribute nothing; others are bounded to
/// [0, 1] so no eye turns past `eye_rotation_limit`.
pub fn synthesize(scores: &BTreeMap<String, f32>, eye_rotation_limit: f32) -> EyeGaze {
    let mut acc = EyeScoreAccumulator::default();

    for (name, &score) in scores {
        if !score.is_finite() {
            continue;
        }
        let score = score.clamp(0.0, 1.0);
        match name.as_str() {
            EYE_LOOK_OUT_LEFT => acc.left_horizontal += score,
            EYE_LOOK_IN_LEFT => acc.left_horizontal -= score,
            EYE_LOOK_IN_RIGHT => acc.right_horizontal += score,
            EYE_LOOK_OUT_RIGHT => acc.right_horizontal -= score,
            EYE_LOOK_DOWN_LEFT => acc.left_vertical += score,
            EYE_LOOK_UP_LEFT => acc.left_vertical -= score,
            EYE_LOOK_DOWN_RIGHT => acc.right_vertical += score,
            EYE_LOOK_UP_RIGHT => acc.right_vertical -= score,
            _ => {}
        }
    }

    EyeGaze {
        left_pitch: acc.left_vertical * eye_rotation_limit,
        left_yaw: acc.left_horizontal * eye_rotation_limit,
        right_pitch: acc.right_vertical * eye_rotation_limit,
        right_yaw: acc.right_horizontal * eye_rotation_limit,
    }
}
