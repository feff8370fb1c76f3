//! Math utilities and types
//!
//! Thin aliases over nalgebra plus the handful of affine helpers the scene
//! graph and the player camera need.

pub use nalgebra::{Matrix3, Matrix4, Unit, Vector2, Vector3, Vector4};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Principal axis used by the degree-based rotation helpers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// +X
    X,
    /// +Y
    Y,
    /// +Z
    Z,
}

impl Axis {
    /// Unit vector along this axis
    pub fn unit(self) -> Vec3 {
        match self {
            Self::X => Vec3::x(),
            Self::Y => Vec3::y(),
            Self::Z => Vec3::z(),
        }
    }
}

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;

    /// Radians to degrees conversion factor
    pub const RAD_TO_DEG: f32 = 180.0 / PI;
}

/// Math utility functions
pub mod utils {
    use super::constants;

    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees * constants::DEG_TO_RAD
    }

    /// Convert radians to degrees
    pub fn rad_to_deg(radians: f32) -> f32 {
        radians * constants::RAD_TO_DEG
    }
}

/// Extension trait for Mat4 with the elementary affine matrices
pub trait Mat4Ext {
    /// Rotation of `degrees` about an arbitrary axis. A zero axis yields identity.
    fn rotation_degrees(degrees: f32, axis: &Vec3) -> Mat4;

    /// Rotation of `degrees` about a principal axis
    fn rotation_about(axis: Axis, degrees: f32) -> Mat4;

    /// Right-handed look-at view matrix
    fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4;

    /// Apply the matrix to a point with an implicit w of one
    fn apply_point(&self, point: Vec3) -> Vec3;

    /// Apply the matrix to a direction with an implicit w of zero
    fn apply_vector(&self, vector: Vec3) -> Vec3;
}

impl Mat4Ext for Mat4 {
    fn rotation_degrees(degrees: f32, axis: &Vec3) -> Mat4 {
        match Unit::try_new(*axis, f32::EPSILON) {
            Some(axis) => Mat4::from_axis_angle(&axis, utils::deg_to_rad(degrees)),
            None => Mat4::identity(),
        }
    }

    fn rotation_about(axis: Axis, degrees: f32) -> Mat4 {
        Self::rotation_degrees(degrees, &axis.unit())
    }

    fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4 {
        Mat4::look_at_rh(&Point3::from(eye), &Point3::from(target), &up)
    }

    fn apply_point(&self, point: Vec3) -> Vec3 {
        self.transform_point(&Point3::from(point)).coords
    }

    fn apply_vector(&self, vector: Vec3) -> Vec3 {
        self.transform_vector(&vector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rotation_about_y_turns_x_into_negative_z() {
        let rotated = Mat4::rotation_about(Axis::Y, 90.0).apply_vector(Vec3::x());
        assert_relative_eq!(rotated, -Vec3::z(), epsilon = 1e-6);
    }

    #[test]
    fn test_zero_axis_rotation_is_identity() {
        assert_eq!(Mat4::rotation_degrees(45.0, &Vec3::zeros()), Mat4::identity());
    }

    #[test]
    fn test_apply_point_includes_translation() {
        let m = Mat4::new_translation(&Vec3::new(1.0, 2.0, 3.0));
        assert_relative_eq!(m.apply_point(Vec3::zeros()), Vec3::new(1.0, 2.0, 3.0));
        assert_relative_eq!(m.apply_vector(Vec3::x()), Vec3::x());
    }
}
