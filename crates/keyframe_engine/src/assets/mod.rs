//! Asset loading and caching
//!
//! Meshes come from OBJ files and become keyframes; keyframes are grouped
//! into named animations. Materials are registered by alias.

mod material_cache;
mod model_cache;
mod obj_loader;

pub use material_cache::MaterialCache;
pub use model_cache::ModelCache;
pub use obj_loader::{MeshData, ObjError, ObjLoader};

use thiserror::Error;

use crate::animation::AnimationError;

/// Asset loading errors
#[derive(Error, Debug)]
pub enum AssetError {
    /// Mesh file could not be read or parsed
    #[error("failed to load mesh '{path}': {source}")]
    Mesh {
        /// File as requested
        path: String,
        /// Parser failure
        #[source]
        source: ObjError,
    },

    /// Mesh parsed but is not a valid keyframe
    #[error("invalid keyframe '{name}': {source}")]
    Keyframe {
        /// Keyframe name
        name: String,
        /// Validation failure
        #[source]
        source: AnimationError,
    },

    /// Keyframes could not be assembled into an animation
    #[error("invalid animation '{alias}': {source}")]
    Animation {
        /// Animation alias
        alias: String,
        /// Validation failure
        #[source]
        source: AnimationError,
    },
}
