//! Node-local affine transform with a cached inverse

use crate::foundation::math::{Axis, Mat4, Mat4Ext, Vec3, Vec4};

/// 4×4 affine transform paired with its inverse
///
/// Every mutator replaces both matrices together, so `inverse()` is always
/// the inverse of `matrix()`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeTransform {
    matrix: Mat4,
    inverse: Mat4,
}

impl Default for NodeTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl NodeTransform {
    /// Identity transform
    pub fn identity() -> Self {
        Self {
            matrix: Mat4::identity(),
            inverse: Mat4::identity(),
        }
    }

    /// Wrap an invertible matrix; `None` when it has no inverse
    pub fn from_matrix(matrix: Mat4) -> Option<Self> {
        matrix.try_inverse().map(|inverse| Self { matrix, inverse })
    }

    /// Replace the matrix and recompute the inverse
    ///
    /// A singular matrix (zero scale) is rejected with a warning and the
    /// previous transform is kept. Returns whether the matrix was applied.
    pub fn set(&mut self, matrix: Mat4) -> bool {
        match Self::from_matrix(matrix) {
            Some(transform) => {
                *self = transform;
                true
            }
            None => {
                log::warn!("Singular node transform rejected, keeping the previous one");
                false
            }
        }
    }

    /// Current matrix
    pub fn matrix(&self) -> &Mat4 {
        &self.matrix
    }

    /// Inverse of the current matrix
    pub fn inverse(&self) -> &Mat4 {
        &self.inverse
    }

    /// Left-multiply a translation
    pub fn translate(&mut self, offset: Vec3) -> bool {
        self.set(Mat4::new_translation(&offset) * self.matrix)
    }

    /// Left-multiply a non-uniform scale
    pub fn scale(&mut self, factors: Vec3) -> bool {
        self.set(Mat4::new_nonuniform_scaling(&factors) * self.matrix)
    }

    /// Left-multiply a rotation of `degrees` about `axis`
    pub fn rotate(&mut self, degrees: f32, axis: &Vec3) -> bool {
        self.set(Mat4::rotation_degrees(degrees, axis) * self.matrix)
    }

    /// Left-multiply a rotation about a principal axis
    pub fn rotate_about(&mut self, axis: Axis, degrees: f32) -> bool {
        self.rotate(degrees, &axis.unit())
    }

    /// Image of the local origin
    pub fn location(&self) -> Vec3 {
        (self.matrix * Vec4::new(0.0, 0.0, 0.0, 1.0)).xyz()
    }
}
