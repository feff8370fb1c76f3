//! Renderer boundary
//!
//! The scene graph never touches a graphics API. It hands a [`Renderer`]
//! named uniforms and one [`DrawCommand`] per visible renderable node.

use std::sync::Arc;

use crate::animation::{Model, Renderable};
use crate::foundation::math::{Mat4, Vec3};
use crate::render::Material;

/// Value written to a named shader uniform
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    /// `int` / sampler
    Int(i32),
    /// `float`
    Float(f32),
    /// `vec3`
    Vec3(Vec3),
    /// `mat4`
    Mat4(Mat4),
}

/// Everything needed to draw one blended keyframe pair
#[derive(Debug, Clone)]
pub struct DrawCommand {
    /// Accumulated world transform, uploaded as `M`
    pub world: Mat4,
    /// Interpolation factor between the two keyframes
    pub blend: f32,
    /// Opacity
    pub alpha: f32,
    /// Vertices per keyframe
    pub vertex_count: usize,
    /// Index of the keyframe bound to the first attribute set
    pub current_keyframe: usize,
    /// Index of the keyframe bound to the second attribute set
    pub next_keyframe: usize,
    /// Keyframe source
    pub model: Arc<Model>,
    /// Surface material
    pub material: Arc<Material>,
}

impl DrawCommand {
    /// Snapshot of a renderable at `world`
    ///
    /// `None` when the renderable's model lost its keyframes.
    pub fn for_renderable(world: Mat4, renderable: &Renderable) -> Option<Self> {
        let model = renderable.model();
        let vertex_count = model.vertex_count().ok()?;
        let current_keyframe = renderable.keyframe_index();
        Some(Self {
            world,
            blend: renderable.blend(),
            alpha: renderable.alpha(),
            vertex_count,
            current_keyframe,
            next_keyframe: (current_keyframe + 1) % model.len(),
            model: Arc::clone(model),
            material: Arc::clone(renderable.material()),
        })
    }
}

/// External renderer the scene draws into
pub trait Renderer {
    /// Write a named uniform; unknown names are the renderer's to ignore
    fn set_uniform(&mut self, name: &str, value: UniformValue);

    /// Issue one draw
    fn draw(&mut self, command: DrawCommand);
}
