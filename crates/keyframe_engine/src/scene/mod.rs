//! Scene management
//!
//! Transforms, bounding boxes and the node tree that ties them together.

mod bounds;
mod scene_graph;
mod transform;

pub use bounds::AABB;
pub use scene_graph::{NodeFlags, NodeId, SceneError, SceneGraph, SceneNode};
pub use transform::NodeTransform;
