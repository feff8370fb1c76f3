//! Asset assembly
//!
//! Builds the engine caches from the manifest and hands out renderables,
//! the entity kit and resolved particle profiles.

use std::collections::BTreeMap;
use std::sync::Arc;

use keyframe_engine::animation::Renderable;
use keyframe_engine::assets::{MaterialCache, MeshData, ModelCache};
use keyframe_engine::render::Material;
use keyframe_engine::scene::SceneNode;

use crate::config::{AssetManifest, GameConfig};
use crate::entities::{Behavior, EntityKit, ParticleProfile, ParticleProfiles, ParticleSettings};
use crate::error::GameResult;

/// Model and material caches for one game
#[derive(Debug)]
pub struct Assets {
    /// Keyframes and animations
    pub models: ModelCache,
    /// Materials
    pub materials: MaterialCache,
}

impl Assets {
    /// Load every animation and material in `manifest`, reading meshes from its root
    pub fn load(manifest: &AssetManifest) -> GameResult<Self> {
        Self::build(manifest, |_| None)
    }

    /// Like [`Assets::load`], but meshes `placeholder` returns are used instead of files
    ///
    /// Files the closure declines are still read from disk.
    pub fn build(manifest: &AssetManifest, mut placeholder: impl FnMut(&str) -> Option<MeshData>) -> GameResult<Self> {
        let mut models = ModelCache::new(&manifest.root);
        for file in manifest.mesh_files() {
            if let Some(mesh) = placeholder(file) {
                models.insert_mesh(file, &mesh)?;
            }
        }

        for animation in &manifest.animations {
            let frames: Vec<(&str, u32)> = animation.frames.iter().map(|f| (f.file.as_str(), f.hold)).collect();
            models.define_animation(&animation.alias, &frames)?;
        }

        let mut materials = MaterialCache::new();
        for material in &manifest.materials {
            materials.insert(material.clone());
        }

        log::info!("Assets ready: {} animations, {} materials", manifest.animations.len(), materials.len());
        Ok(Self { models, materials })
    }

    /// Renderable drawing animation `model` with material `material`
    pub fn renderable(&mut self, model: &str, material: &str) -> GameResult<Renderable> {
        Ok(Renderable::new(self.models.animation(model), self.materials.get(material))?)
    }

    /// Solid static node
    pub fn geometry(&mut self, name: &str, model: &str, material: &str) -> GameResult<SceneNode<Behavior>> {
        Ok(SceneNode::geometry(name, self.renderable(model, material)?))
    }

    /// Models, materials and cues entities switch to at run time
    pub fn entity_kit(&mut self, config: &GameConfig) -> EntityKit {
        EntityKit {
            spike_spawn: self.models.animation("spike_spawn"),
            spike_living: self.models.animation("spike_living"),
            spike_dying: self.models.animation("spike_dying"),
            hurt_material: self.materials.get("hurt"),
            contact_damage: config.gameplay.contact_damage,
            cues: config.sounds.clone(),
        }
    }

    /// Resolve each profile's model and material
    pub fn particle_profiles(&mut self, settings: &BTreeMap<String, ParticleSettings>) -> ParticleProfiles {
        let mut profiles = ParticleProfiles::new();
        for (name, settings) in settings {
            let profile = ParticleProfile {
                model: self.models.animation(&settings.model),
                material: self.materials.get(&settings.material),
                settings: settings.clone(),
            };
            profiles.insert(name.clone(), profile);
        }
        profiles
    }

    /// Material alias as a shared handle
    pub fn material(&mut self, alias: &str) -> Arc<Material> {
        self.materials.get(alias)
    }
}

/// Stand-in mesh for an asset file, sized like the real one
///
/// Lets the game run without the art directory.
pub fn placeholder_mesh(file: &str) -> MeshData {
    let half = match file {
        "cube.obj" | "table.obj" | "pillar.obj" => 1.0,
        "cake.obj" => 0.8,
        "spike0.obj" => 0.05,
        _ => 0.5,
    };
    MeshData::cube(half)
}

#[cfg(test)]
pub(crate) fn test_assets() -> Assets {
    let config = GameConfig::default();
    Assets::build(&config.assets, |file| Some(placeholder_mesh(file))).unwrap()
}
