//! In-memory renderer used by the headless binary and by tests

use std::collections::HashMap;

use super::{DrawCommand, Renderer, UniformValue};

/// Uniform names a shader declares, with their last written values
///
/// Writing an undeclared name is logged and dropped, the way a shader
/// reports a missing uniform location.
#[derive(Debug, Clone, Default)]
pub struct UniformTable {
    values: HashMap<String, Option<UniformValue>>,
}

impl UniformTable {
    /// Table accepting exactly `names`
    pub fn with_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { values: names.into_iter().map(|n| (n.into(), None)).collect() }
    }

    /// Declare one more name
    pub fn declare(&mut self, name: impl Into<String>) {
        self.values.entry(name.into()).or_insert(None);
    }

    /// Store `value` if `name` is declared; returns whether it was stored
    pub fn set(&mut self, name: &str, value: UniformValue) -> bool {
        match self.values.get_mut(name) {
            Some(slot) => {
                *slot = Some(value);
                true
            }
            None => {
                log::warn!("Uniform '{name}' is not declared, ignoring");
                false
            }
        }
    }

    /// Last value written to `name`
    pub fn get(&self, name: &str) -> Option<UniformValue> {
        self.values.get(name).copied().flatten()
    }
}

/// Renderer that keeps every command instead of drawing it
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    /// Uniform state
    pub uniforms: UniformTable,
    /// Draws issued since the last [`RecordingRenderer::clear`]
    pub commands: Vec<DrawCommand>,
}

impl RecordingRenderer {
    /// Recorder backed by `uniforms`
    pub fn new(uniforms: UniformTable) -> Self {
        Self { uniforms, commands: Vec::new() }
    }

    /// Drop recorded commands, keep uniform state
    pub fn clear(&mut self) {
        self.commands.clear();
    }
}

impl Renderer for RecordingRenderer {
    fn set_uniform(&mut self, name: &str, value: UniformValue) {
        self.uniforms.set(name, value);
    }

    fn draw(&mut self, command: DrawCommand) {
        self.commands.push(command);
    }
}
