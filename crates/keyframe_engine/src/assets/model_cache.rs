//! Keyframe and animation cache

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::{AssetError, MeshData, ObjLoader};
use crate::animation::{Keyframe, Model};

/// Owns every keyframe and animation the game uses
///
/// Keyframes are keyed by file name and loaded from `asset_root` on first
/// use. Animations are keyed by alias and built once from those keyframes.
#[derive(Debug, Default)]
pub struct ModelCache {
    asset_root: PathBuf,
    keyframes: HashMap<String, Arc<Keyframe>>,
    animations: HashMap<String, Arc<Model>>,
}

impl ModelCache {
    /// Cache resolving keyframe files against `asset_root`
    pub fn new(asset_root: impl Into<PathBuf>) -> Self {
        Self { asset_root: asset_root.into(), ..Self::default() }
    }

    /// Directory keyframe files are resolved against
    pub fn asset_root(&self) -> &Path {
        &self.asset_root
    }

    /// Register a keyframe under `name` without touching the file system
    pub fn insert_keyframe(&mut self, name: impl Into<String>, keyframe: Keyframe) -> Arc<Keyframe> {
        let keyframe = Arc::new(keyframe);
        self.keyframes.insert(name.into(), Arc::clone(&keyframe));
        keyframe
    }

    /// Register a keyframe built from an in-memory mesh
    pub fn insert_mesh(&mut self, name: impl Into<String>, mesh: &MeshData) -> Result<Arc<Keyframe>, AssetError> {
        let name = name.into();
        let keyframe = Keyframe::from_mesh(mesh).map_err(|source| AssetError::Keyframe { name: name.clone(), source })?;
        Ok(self.insert_keyframe(name, keyframe))
    }

    /// Keyframe for `file`, loading it on first request
    pub fn keyframe(&mut self, file: &str) -> Result<Arc<Keyframe>, AssetError> {
        if let Some(keyframe) = self.keyframes.get(file) {
            return Ok(Arc::clone(keyframe));
        }

        let path = self.asset_root.join(file);
        log::info!("Loading keyframe {}", path.display());
        let mesh = ObjLoader::load_obj(&path).map_err(|source| AssetError::Mesh { path: path.display().to_string(), source })?;
        self.insert_mesh(file, &mesh)
    }

    /// Build an animation from `(keyframe file, hold ticks)` pairs and store it under `alias`
    ///
    /// Redefining an alias replaces it for future lookups; nodes already
    /// holding the old model keep it.
    pub fn define_animation<S: AsRef<str>>(&mut self, alias: &str, frames: &[(S, u32)]) -> Result<Arc<Model>, AssetError> {
        let mut model = Model::new(alias);
        for (file, hold) in frames {
            let keyframe = self.keyframe(file.as_ref())?;
            model
                .add_keyframe(keyframe, *hold)
                .map_err(|source| AssetError::Animation { alias: alias.to_string(), source })?;
        }

        log::debug!("Defined animation '{alias}' with {} keyframes", model.len());
        let model = Arc::new(model);
        self.animations.insert(alias.to_string(), Arc::clone(&model));
        Ok(model)
    }

    /// Animation registered as `alias`
    ///
    /// An unknown alias yields (and caches) an empty model, which every
    /// consumer rejects at bind time.
    pub fn animation(&mut self, alias: &str) -> Arc<Model> {
        Arc::clone(self.animations.entry(alias.to_string()).or_insert_with(|| {
            log::warn!("Animation '{alias}' requested before it was defined");
            Arc::new(Model::new(alias))
        }))
    }

    /// Whether `alias` was defined
    pub fn has_animation(&self, alias: &str) -> bool {
        self.animations.get(alias).is_some_and(|m| !m.is_empty())
    }
}
