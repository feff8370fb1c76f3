//! Material registry

use std::collections::HashMap;
use std::sync::Arc;

use crate::render::Material;

/// Materials by alias, shared with every node that draws with them
#[derive(Debug, Default)]
pub struct MaterialCache {
    cache: HashMap<String, Arc<Material>>,
}

impl MaterialCache {
    /// Create a new empty material cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `material` under its own name, replacing any previous entry
    pub fn insert(&mut self, material: Material) -> Arc<Material> {
        let material = Arc::new(material);
        self.cache.insert(material.name.clone(), Arc::clone(&material));
        material
    }

    /// Material registered as `alias`
    ///
    /// An unknown alias yields (and caches) an untextured placeholder, which
    /// the scene graph refuses to draw.
    pub fn get(&mut self, alias: &str) -> Arc<Material> {
        Arc::clone(self.cache.entry(alias.to_string()).or_insert_with(|| {
            log::warn!("Material '{alias}' requested before it was defined");
            Arc::new(Material::unloaded(alias))
        }))
    }

    /// Number of registered materials
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Nothing registered yet
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::MaterialTextures;

    #[test]
    fn test_insert_and_share() {
        let mut cache = MaterialCache::new();
        let inserted = cache.insert(Material {
            name: "cake".into(),
            textures: MaterialTextures { diffuse: "cake_d.png".into(), ..Default::default() },
            ..Default::default()
        });
        let fetched = cache.get("cake");
        assert!(Arc::ptr_eq(&inserted, &fetched));
        assert!(fetched.is_loaded());
    }

    #[test]
    fn test_unknown_alias_gives_placeholder() {
        let mut cache = MaterialCache::new();
        let placeholder = cache.get("nothing");
        assert!(!placeholder.is_loaded());
        assert_eq!(placeholder.name, "nothing");
        assert_eq!(cache.len(), 1);
    }
}
