//! Head pose matrix decomposition.
//!
//! The detector's facial transformation matrix is a column-major 4x4 affine
//! transform in camera space. Only the rotation ends up on the rig, but the
//! full decomposition is kept for logging and snapshots.

use glam::{Mat3, Mat4, Quat, Vec3};
use serde::Serialize;

use crate::error::PoseError;

/// Below this |det| the upper 3x3 is treated as degenerate.
const MIN_BASIS_DETERMINANT: f32 = 1e-6;

/// |m13| above this is treated as gimbal lock (pitch of ±90° about Y).
const GIMBAL_THRESHOLD: f32 = 0.999_999_9;

/// Translation, rotation and scale recovered from a pose matrix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PoseDecomposition {
    pub translation: Vec3,
    /// Euler angles in radians, XYZ order (R = Rx * Ry * Rz)
    pub rotation: Vec3,
    pub quaternion: Quat,
    pub scale: Vec3,
}

impl PoseDecomposition {
    /// Head rotation in rig space.
    pub fn rig_head_rotation(&self) -> Vec3 {
        to_rig_head_rotation(self.rotation)
    }
}

/// Decompose a column-major 4x4 transform.
pub fn decompose(matrix: &[f32; 16]) -> Result<PoseDecomposition, PoseError> {
    if let Some(i) = matrix.iter().position(|v| !v.is_finite()) {
        return Err(PoseError::Malformed(format!(
            "element {} is {}",
            i, matrix[i]
        )));
    }

    let m = Mat4::from_cols_array(matrix);
    let basis = Mat3::from_mat4(m);
    let det = basis.determinant();
    if det.abs() < MIN_BASIS_DETERMINANT {
        return Err(PoseError::Malformed(format!(
            "degenerate basis (determinant {:e})",
            det
        )));
    }

    let mut scale = Vec3::new(
        basis.x_axis.length(),
        basis.y_axis.length(),
        basis.z_axis.length(),
    );
    // A reflection is folded into X, same convention as three.js.
    if det < 0.0 {
        scale.x = -scale.x;
    }

    let orthonormal = Mat3::from_cols(
        basis.x_axis / scale.x,
        basis.y_axis / scale.y,
        basis.z_axis / scale.z,
    );
    let quaternion = Quat::from_mat3(&orthonormal).normalize();
    let rotation = euler_xyz(&Mat3::from_quat(quaternion));
    let translation = m.w_axis.truncate();

    if !(quaternion.is_finite() && rotation.is_finite() && translation.is_finite()) {
        return Err(PoseError::Malformed(
            "decomposition produced non-finite values".to_string(),
        ));
    }

    Ok(PoseDecomposition {
        translation,
        rotation,
        quaternion,
        scale,
    })
}

/// XYZ Euler angles from a pure rotation matrix.
fn euler_xyz(m: &Mat3) -> Vec3 {
    let m11 = m.x_axis.x;
    let m12 = m.y_axis.x;
    let m13 = m.z_axis.x;
    let m22 = m.y_axis.y;
    let m23 = m.z_axis.y;
    let m32 = m.y_axis.z;
    let m33 = m.z_axis.z;

    let y = m13.clamp(-1.0, 1.0).asin();
    if m13.abs() < GIMBAL_THRESHOLD {
        Vec3::new((-m23).atan2(m33), y, (-m12).atan2(m11))
    } else {
        Vec3::new(m32.atan2(m22), y, 0.0)
    }
}

/// Map a detector-space Euler rotation onto the rig's head node.
///
/// rig X = source X, rig Y = source Z, rig Z = -source Y. This constant belongs
/// to the MediaPipe / reference head pair; another detector or rig needs its
/// own remap.
pub fn to_rig_head_rotation(source: Vec3) -> Vec3 {
    Vec3::new(source.x, source.z, -source.y)
}
