//! Per-node animation instance

use std::sync::Arc;

use super::{AnimationError, Model};
use crate::render::Material;
use crate::scene::AABB;

/// Position of one instance inside its model's keyframe loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationCursor {
    keyframe: usize,
    elapsed: u32,
    hold: u32,
}

impl AnimationCursor {
    /// Cursor at keyframe 0 of `model`
    pub fn start(model: &Model) -> Result<Self, AnimationError> {
        Ok(Self { keyframe: 0, elapsed: 0, hold: model.frame_length(0)? })
    }

    /// Current keyframe index, always below the model's keyframe count
    pub fn keyframe(&self) -> usize {
        self.keyframe
    }

    /// Ticks spent on the current keyframe
    pub fn elapsed(&self) -> u32 {
        self.elapsed
    }

    /// Hold of the current keyframe
    pub fn hold(&self) -> u32 {
        self.hold
    }

    /// Fraction of the way from the current keyframe to the next, in `[0, 1)`
    pub fn blend(&self) -> f32 {
        self.elapsed as f32 / self.hold as f32
    }

    /// One tick forward; rolls over to the next keyframe when the hold is used up
    pub fn step(&mut self, model: &Model) -> Result<(), AnimationError> {
        if !model.is_animated() {
            return Ok(());
        }
        self.elapsed += 1;
        if self.elapsed >= self.hold {
            self.elapsed = 0;
            self.keyframe = (self.keyframe + 1) % model.len();
            self.hold = model.frame_length(self.keyframe)?;
        }
        Ok(())
    }
}

/// Model and material bound to a scene node, plus its animation state
#[derive(Debug, Clone)]
pub struct Renderable {
    model: Arc<Model>,
    material: Arc<Material>,
    cursor: AnimationCursor,
    alpha: f32,
}

impl Renderable {
    /// Bind a model with at least one keyframe
    pub fn new(model: Arc<Model>, material: Arc<Material>) -> Result<Self, AnimationError> {
        let cursor = AnimationCursor::start(&model)?;
        Ok(Self { model, material, cursor, alpha: 1.0 })
    }

    /// Bound model
    pub fn model(&self) -> &Arc<Model> {
        &self.model
    }

    /// Swap the model and restart at keyframe 0
    ///
    /// On error the previous model stays bound.
    pub fn set_model(&mut self, model: Arc<Model>) -> Result<(), AnimationError> {
        self.cursor = AnimationCursor::start(&model)?;
        self.model = model;
        Ok(())
    }

    /// Bound material
    pub fn material(&self) -> &Arc<Material> {
        &self.material
    }

    /// Swap the material, keeping the animation state
    pub fn set_material(&mut self, material: Arc<Material>) {
        self.material = material;
    }

    /// Animation state
    pub fn cursor(&self) -> &AnimationCursor {
        &self.cursor
    }

    /// Shortcut for `cursor().keyframe()`
    pub fn keyframe_index(&self) -> usize {
        self.cursor.keyframe()
    }

    /// Blend towards the next keyframe
    pub fn blend(&self) -> f32 {
        self.cursor.blend()
    }

    /// Opacity handed to the renderer
    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    /// Set opacity
    pub fn set_alpha(&mut self, alpha: f32) {
        self.alpha = alpha;
    }

    /// Bounds of the model's first keyframe
    pub fn bounding_box(&self) -> AABB {
        // `new`/`set_model` guarantee at least one keyframe
        self.model.bounding_box().unwrap_or_default()
    }

    /// Advance the animation by one tick
    pub fn advance(&mut self) {
        if let Err(err) = self.cursor.step(&self.model) {
            log::warn!("Animation of '{}' stalled: {err}", self.model.name());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::Keyframe;
    use crate::assets::MeshData;
    use approx::assert_relative_eq;

    fn model(holds: &[u32]) -> Arc<Model> {
        let keyframe = Arc::new(Keyframe::from_mesh(&MeshData::cube(1.0)).unwrap());
        let mut model = Model::new("test");
        for &hold in holds {
            model.add_keyframe(keyframe.clone(), hold).unwrap();
        }
        Arc::new(model)
    }

    #[test]
    fn test_requires_a_keyframe() {
        let err = Renderable::new(model(&[]), Arc::new(Material::default())).unwrap_err();
        assert_eq!(err, AnimationError::NoKeyframes);
    }

    #[test]
    fn test_cursor_walks_holds() {
        let mut renderable = Renderable::new(model(&[3, 1]), Arc::new(Material::default())).unwrap();
        assert_eq!(renderable.keyframe_index(), 0);

        renderable.advance();
        assert_relative_eq!(renderable.blend(), 1.0 / 3.0);
        renderable.advance();
        renderable.advance();
        assert_eq!(renderable.keyframe_index(), 1);
        assert_relative_eq!(renderable.blend(), 0.0);

        renderable.advance();
        assert_eq!(renderable.keyframe_index(), 0);
        assert_eq!(renderable.cursor().hold(), 3);
    }

    #[test]
    fn test_static_model_never_advances() {
        let mut renderable = Renderable::new(model(&[1]), Arc::new(Material::default())).unwrap();
        for _ in 0..10 {
            renderable.advance();
        }
        assert_eq!(*renderable.cursor(), AnimationCursor { keyframe: 0, elapsed: 0, hold: 1 });
    }

    #[test]
    fn test_set_model_resets_cursor() {
        let mut renderable = Renderable::new(model(&[2, 2]), Arc::new(Material::default())).unwrap();
        renderable.advance();
        renderable.advance();
        renderable.advance();
        assert_eq!(renderable.keyframe_index(), 1);

        renderable.set_model(model(&[60, 1])).unwrap();
        assert_eq!(renderable.keyframe_index(), 0);
        assert_eq!(renderable.cursor().elapsed(), 0);
        assert_eq!(renderable.cursor().hold(), 60);

        assert!(renderable.set_model(model(&[])).is_err());
        assert_eq!(renderable.cursor().hold(), 60);
    }
}
