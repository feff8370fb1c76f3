//! # Keyframe Engine
//!
//! The scene core of a small real-time 3D game: a transform hierarchy with
//! axis-aligned collision boxes, keyframe-blended mesh animation, and the
//! renderer/audio boundaries the game loop talks to.
//!
//! ## Features
//!
//! - **Scene graph**: slot-map arena of nodes, pre-order update/draw, first-match box collision
//! - **Keyframe animation**: immutable vertex snapshots with tangent frames, looped with per-frame holds
//! - **Asset caches**: OBJ-backed keyframes, named animations and materials shared through `Arc`
//! - **Boundaries**: [`render::Renderer`] and [`audio::AudioSink`] traits with headless implementations
//!
//! ## Quick Start
//!
//! ```rust
//! use keyframe_engine::prelude::*;
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut models = ModelCache::new("assets");
//! models.insert_mesh("cube.obj", &MeshData::cube(0.5))?;
//! let model = models.define_animation("cube", &[("cube.obj", 1)])?;
//!
//! let mut graph: SceneGraph<()> = SceneGraph::new();
//! let root = graph.insert(SceneNode::new("root"));
//! let cube = SceneNode::geometry("cube", Renderable::new(model, Arc::new(Material::default()))?);
//! let id = graph.add_child(root, cube)?;
//!
//! let probe = AABB::from_center_extents(Vec3::zeros(), Vec3::repeat(0.1));
//! assert_eq!(graph.is_colliding_with(root, &probe), Some(id));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod animation;
pub mod assets;
pub mod audio;
pub mod config;
pub mod foundation;
pub mod render;
pub mod scene;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        animation::{AnimationError, Keyframe, Model, Renderable},
        assets::{AssetError, MaterialCache, MeshData, ModelCache},
        audio::{AudioSink, MusicTrack},
        config::{Config, ConfigError},
        foundation::math::{Axis, Mat4, Mat4Ext, Vec2, Vec3},
        render::{DrawCommand, Light, Material, Renderer, UniformValue},
        scene::{NodeId, SceneGraph, SceneNode, AABB},
    };
}
