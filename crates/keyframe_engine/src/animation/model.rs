//! Ordered keyframe loops

use std::sync::Arc;

use super::{AnimationError, Keyframe};
use crate::scene::AABB;

/// A keyframe together with how many ticks it is held
#[derive(Debug, Clone)]
pub struct ModelFrame {
    /// Shared vertex snapshot
    pub keyframe: Arc<Keyframe>,
    /// Ticks spent on this keyframe before moving to the next, at least 1
    pub hold: u32,
}

/// Looping sequence of keyframes sharing one vertex count
///
/// Indices wrap modulo the number of keyframes, so callers can keep
/// counting forward forever.
#[derive(Debug, Clone, Default)]
pub struct Model {
    name: String,
    frames: Vec<ModelFrame>,
}

impl Model {
    /// Empty model
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), frames: Vec::new() }
    }

    /// Diagnostic name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Append a keyframe held for `hold` ticks
    pub fn add_keyframe(&mut self, keyframe: Arc<Keyframe>, hold: u32) -> Result<(), AnimationError> {
        if hold == 0 {
            return Err(AnimationError::ZeroHold);
        }
        if let Some(first) = self.frames.first() {
            let expected = first.keyframe.vertex_count();
            if keyframe.vertex_count() != expected {
                return Err(AnimationError::VertexCountMismatch { expected, found: keyframe.vertex_count() });
            }
        }
        self.frames.push(ModelFrame { keyframe, hold });
        Ok(())
    }

    /// Number of keyframes
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// True when no keyframe was added yet
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// More than one keyframe
    pub fn is_animated(&self) -> bool {
        self.frames.len() > 1
    }

    fn frame(&self, index: usize) -> Result<&ModelFrame, AnimationError> {
        if self.frames.is_empty() {
            return Err(AnimationError::NoKeyframes);
        }
        Ok(&self.frames[index % self.frames.len()])
    }

    /// Keyframe `index` and its successor, both wrapped
    pub fn bind_keyframe(&self, index: usize) -> Result<(&Arc<Keyframe>, &Arc<Keyframe>), AnimationError> {
        let current = &self.frame(index)?.keyframe;
        let next = &self.frame(index.wrapping_add(1))?.keyframe;
        Ok((current, next))
    }

    /// Hold of keyframe `index`, wrapped
    pub fn frame_length(&self, index: usize) -> Result<u32, AnimationError> {
        Ok(self.frame(index)?.hold)
    }

    /// Shared vertex count
    pub fn vertex_count(&self) -> Result<usize, AnimationError> {
        Ok(self.frame(0)?.keyframe.vertex_count())
    }

    /// Bounds of the first keyframe
    pub fn bounding_box(&self) -> Result<AABB, AnimationError> {
        Ok(self.frame(0)?.keyframe.bounding_box())
    }
}
