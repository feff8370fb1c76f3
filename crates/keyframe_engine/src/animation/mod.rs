//! Keyframe animation
//!
//! A [`Keyframe`] is one immutable vertex snapshot, a [`Model`] is an ordered
//! loop of keyframes with hold times, and a [`Renderable`] is the per-node
//! instance that walks a model tick by tick.

mod keyframe;
mod model;
mod renderable;

pub use keyframe::{Keyframe, KeyframeVertex};
pub use model::{Model, ModelFrame};
pub use renderable::{AnimationCursor, Renderable};

use thiserror::Error;

/// Errors raised while building or querying animation data
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnimationError {
    /// A keyframe was built from zero vertices
    #[error("keyframe has no vertices")]
    EmptyMesh,

    /// Normal or UV array length differs from the position array
    #[error("{attribute} count {found} does not match vertex count {expected}")]
    AttributeCountMismatch {
        /// Which attribute array was wrong
        attribute: &'static str,
        /// Position count
        expected: usize,
        /// Offending array length
        found: usize,
    },

    /// Vertex stream is not made of whole triangles
    #[error("vertex count {0} is not a multiple of 3")]
    NotTriangles(usize),

    /// Appended keyframe disagrees with the model's vertex count
    #[error("keyframe has {found} vertices, model expects {expected}")]
    VertexCountMismatch {
        /// Vertex count of the keyframes already in the model
        expected: usize,
        /// Vertex count of the rejected keyframe
        found: usize,
    },

    /// Hold duration must be at least one tick
    #[error("keyframe hold must be at least one tick")]
    ZeroHold,

    /// Query on a model without keyframes
    #[error("model has no keyframes")]
    NoKeyframes,
}
