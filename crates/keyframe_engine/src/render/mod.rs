//! Rendering boundary
//!
//! Materials, lights and the command stream the scene graph emits. Actual
//! GPU work lives behind the [`Renderer`] trait.

mod command;
mod lighting;
mod material;
mod uniforms;

pub use command::{DrawCommand, Renderer, UniformValue};
pub use lighting::{write_light_uniforms, Light, MAX_LIGHTS};
pub use material::{Material, MaterialTextures, TextureSlot};
pub use uniforms::{RecordingRenderer, UniformTable};
