//! Math value types crossing the boundary
//!
//! Re-exports the glam types the engine exchanges by value, plus the small
//! conventions both sides agree on (Euler order, units).

pub use glam::{EulerRot, Mat3, Quat, Vec2, Vec3};

/// Euler angles cross the boundary in degrees, applied in this order.
pub const EULER_ORDER: EulerRot = EulerRot::YXZ;

/// Which frame a transform value is expressed in.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Space {
    /// Relative to the parent
    Local,
    /// World space
    Global,
}

/// Build a rotation from (pitch, yaw, roll) degrees around (x, y, z).
pub fn quat_from_euler_degrees(degrees: Vec3) -> Quat {
    let r = degrees * (std::f32::consts::PI / 180.0);
    Quat::from_euler(EULER_ORDER, r.y, r.x, r.z)
}

/// Inverse of [`quat_from_euler_degrees`].
pub fn euler_degrees(rotation: Quat) -> Vec3 {
    let (yaw, pitch, roll) = rotation.to_euler(EULER_ORDER);
    Vec3::new(pitch, yaw, roll) * (180.0 / std::f32::consts::PI)
}

/// Rotation that points -Z at `dir` with `up` as the up hint.
///
/// Returns `None` when `dir` is zero or parallel to `up`.
pub fn look_rotation(dir: Vec3, up: Vec3) -> Option<Quat> {
    let forward = dir.try_normalize()?;
    let right = up.cross(-forward).try_normalize()?;
    let up = (-forward).cross(right);
    Some(Quat::from_mat3(&Mat3::from_cols(right, up, -forward)))
}
