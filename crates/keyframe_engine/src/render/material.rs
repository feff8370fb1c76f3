//! Surface materials
//!
//! Textures are referenced by name only; uploading them is the renderer's job.

use serde::{Deserialize, Serialize};

use super::{Renderer, UniformValue};
use crate::foundation::math::Vec3;

/// Texture sampler slots, in binding order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureSlot {
    /// Base color
    Diffuse = 0,
    /// Specular intensity
    Specular = 1,
    /// Tangent-space normals
    Normal = 2,
    /// Emissive mask
    SelfIllumination = 3,
}

impl TextureSlot {
    /// All slots in binding order
    pub const ALL: [Self; 4] = [Self::Diffuse, Self::Specular, Self::Normal, Self::SelfIllumination];

    /// Sampler uniform fed with this slot's unit
    pub fn sampler_uniform(self) -> &'static str {
        match self {
            Self::Diffuse => "diffuseMap",
            Self::Specular => "specularMap",
            Self::Normal => "normalMap",
            Self::SelfIllumination => "selfillumMap",
        }
    }

    /// Texture unit index
    pub fn unit(self) -> i32 {
        self as i32
    }
}

/// Texture names for each sampler slot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialTextures {
    /// Base color texture
    pub diffuse: String,
    /// Specular map
    pub specular: String,
    /// Normal map
    pub normal: String,
    /// Self-illumination map
    pub self_illumination: String,
}

impl MaterialTextures {
    /// Texture bound to `slot`
    pub fn get(&self, slot: TextureSlot) -> &str {
        match slot {
            TextureSlot::Diffuse => &self.diffuse,
            TextureSlot::Specular => &self.specular,
            TextureSlot::Normal => &self.normal,
            TextureSlot::SelfIllumination => &self.self_illumination,
        }
    }
}

/// Blinn-Phong style material
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    /// Alias the material is registered under
    pub name: String,
    /// Sampler textures
    pub textures: MaterialTextures,
    /// Specular color `k_s`
    pub specular_color: Vec3,
    /// Specular exponent `p`
    pub specular_coefficient: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: String::new(),
            textures: MaterialTextures::default(),
            specular_color: Vec3::zeros(),
            specular_coefficient: 1.0,
        }
    }
}

impl Material {
    /// Placeholder material for an alias that was never defined
    pub fn unloaded(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Self::default() }
    }

    /// A material without a diffuse texture has nothing to draw with
    pub fn is_loaded(&self) -> bool {
        !self.textures.diffuse.is_empty()
    }

    /// Per-draw uniforms
    pub fn bind_uniforms(&self, renderer: &mut dyn Renderer) {
        renderer.set_uniform("k_s", UniformValue::Vec3(self.specular_color));
        renderer.set_uniform("p", UniformValue::Float(self.specular_coefficient));
    }

    /// Sampler-to-unit assignments, identical for every material
    pub fn bind_sampler_uniforms(renderer: &mut dyn Renderer) {
        for slot in TextureSlot::ALL {
            renderer.set_uniform(slot.sampler_uniform(), UniformValue::Int(slot.unit()));
        }
    }
}
