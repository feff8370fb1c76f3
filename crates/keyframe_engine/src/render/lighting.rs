//! Point lights and their shader uniforms

use serde::{Deserialize, Serialize};

use super::{Renderer, UniformValue};
use crate::foundation::math::Vec3;

/// Maximum number of lights the shader accepts
pub const MAX_LIGHTS: usize = 16;

/// Point light
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Light {
    /// World-space position
    pub position: Vec3,
    /// RGB intensity
    pub color: Vec3,
    /// Scalar power
    pub power: f32,
}

impl Light {
    /// Create a light
    pub fn new(position: Vec3, color: Vec3, power: f32) -> Self {
        Self { position, color, power }
    }
}

/// Write `LightColor[i]`, `LightPosition_WS[i]`, `LightPower[i]` and `numLights`
pub fn write_light_uniforms(lights: &[Light], renderer: &mut dyn Renderer) {
    for (i, light) in lights.iter().enumerate() {
        renderer.set_uniform(&format!("LightColor[{i}]"), UniformValue::Vec3(light.color));
        renderer.set_uniform(&format!("LightPosition_WS[{i}]"), UniformValue::Vec3(light.position));
        renderer.set_uniform(&format!("LightPower[{i}]"), UniformValue::Float(light.power));
    }
    renderer.set_uniform("numLights", UniformValue::Int(lights.len() as i32));
}
