//! Core types shared by the physics, IK and gameplay crates

use glam::{Mat3, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Squared length below which a direction is treated as degenerate
pub const DEGENERATE_SQR_LENGTH: f32 = 1e-3;

/// World-space pose of a body or bone
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }
}

impl Transform {
    /// Create a new transform at the given position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Create a new transform with position and rotation
    pub fn from_position_rotation(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    /// Get the forward direction (negative Z in local space)
    pub fn forward(&self) -> Vec3 {
        self.rotation * -Vec3::Z
    }

    /// Get the right direction (positive X in local space)
    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }
}

/// Build a rotation whose forward axis is exactly `forward` and whose up axis
/// is `up` orthogonalized against it.
///
/// When the two are parallel the rotation that carries `Vec3::Y` onto `up` is
/// returned instead.
pub fn look_rotation(forward: Vec3, up: Vec3) -> Quat {
    let forward = forward.normalize_or_zero();
    let up = up.normalize_or_zero();
    if forward == Vec3::ZERO {
        return Quat::from_rotation_arc(Vec3::Y, if up == Vec3::ZERO { Vec3::Y } else { up });
    }

    let back = -forward;
    let right = up.cross(back);
    if right.length_squared() < DEGENERATE_SQR_LENGTH {
        return Quat::from_rotation_arc(Vec3::Y, if up == Vec3::ZERO { Vec3::Y } else { up });
    }
    let right = right.normalize();
    let up = back.cross(right);

    Quat::from_mat3(&Mat3::from_cols(right, up, back)).normalize()
}

/// Project `v` onto the plane whose normal is `normal`
pub fn project_on_plane(v: Vec3, normal: Vec3) -> Vec3 {
    let sqr = normal.length_squared();
    if sqr < f32::EPSILON {
        return v;
    }
    v - normal * (v.dot(normal) / sqr)
}

/// RGBA color with floating point components (0.0 to 1.0)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const RED: Color = Color::rgb(1.0, 0.0, 0.0);
    pub const GREEN: Color = Color::rgb(0.0, 1.0, 0.0);
    pub const BLUE: Color = Color::rgb(0.0, 0.0, 1.0);
    pub const YELLOW: Color = Color::rgb(1.0, 0.92, 0.016);
    pub const CYAN: Color = Color::rgb(0.0, 1.0, 1.0);
    pub const MAGENTA: Color = Color::rgb(1.0, 0.0, 1.0);

    /// Create a color from RGB values (alpha = 1.0)
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn test_identity_axes() {
        let transform = Transform::default();
        assert_eq!(transform.forward(), -Vec3::Z);
        assert_eq!(transform.right(), Vec3::X);
    }

    #[test]
    fn test_look_rotation_flat() {
        let rotation = look_rotation(-Vec3::Z, Vec3::Y);
        assert!(rotation.angle_between(Quat::IDENTITY) < 1e-4);

        let rotation = look_rotation(Vec3::X, Vec3::Y);
        assert!(approx(rotation * -Vec3::Z, Vec3::X));
        assert!(approx(rotation * Vec3::Y, Vec3::Y));
    }

    #[test]
    fn test_look_rotation_keeps_forward_exact_on_slope() {
        let normal = Vec3::new(0.3, 1.0, 0.0).normalize();
        let rotation = look_rotation(-Vec3::Z, normal);
        assert!(approx(rotation * -Vec3::Z, -Vec3::Z));
        assert!(approx(rotation * Vec3::Y, normal));
    }

    #[test]
    fn test_look_rotation_degenerate() {
        let rotation = look_rotation(Vec3::Y, Vec3::Y);
        assert!(approx(rotation * Vec3::Y, Vec3::Y));
    }

    #[test]
    fn test_project_on_plane() {
        let projected = project_on_plane(Vec3::new(1.0, 2.0, 3.0), Vec3::Y);
        assert!(approx(projected, Vec3::new(1.0, 0.0, 3.0)));
        assert_eq!(project_on_plane(Vec3::X, Vec3::ZERO), Vec3::X);
    }
}
