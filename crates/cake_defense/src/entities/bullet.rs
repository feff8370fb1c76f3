//! Player projectiles
//!
//! A bullet only moves and ages here; hits are resolved by the level once
//! the whole tree has been updated.

use keyframe_engine::animation::Renderable;
use keyframe_engine::foundation::math::Vec3;
use keyframe_engine::scene::{NodeId, SceneGraph, SceneNode};

use super::Behavior;

/// Bullet flight state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bullet {
    velocity: Vec3,
    life: i32,
}

impl Bullet {
    /// Bullet flying `velocity` per tick for `life` ticks
    pub fn new(velocity: Vec3, life: i32) -> Self {
        Self { velocity, life }
    }

    /// Displacement per tick
    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    /// Ticks left
    pub fn life(&self) -> i32 {
        self.life
    }

    /// Out of flight time
    pub fn is_dead(&self) -> bool {
        self.life <= 0
    }
}

/// Bullet node scaled by `scale` and placed at `location`
pub fn bullet_node(renderable: Renderable, bullet: Bullet, location: Vec3, scale: f32) -> SceneNode<Behavior> {
    let mut node = SceneNode::geometry("bullet", renderable).with_behavior(Behavior::Bullet(bullet));
    node.scale(Vec3::repeat(scale));
    node.translate(location);
    node
}

/// Move one step and age
pub fn update(graph: &mut SceneGraph<Behavior>, id: NodeId) {
    let Some(node) = graph.get_mut(id) else {
        return;
    };
    let Some(Behavior::Bullet(bullet)) = node.behavior.as_mut() else {
        return;
    };
    bullet.life -= 1;
    let velocity = bullet.velocity;
    node.translate(velocity);
}
