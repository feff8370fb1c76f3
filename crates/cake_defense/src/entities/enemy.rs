//! Spike enemies
//!
//! An enemy appears (spawn animation), walks toward the origin on the XZ
//! plane while alive, and plays its dying animation once shot down. It is
//! dead, and swept by the level, when the dying animation leaves its first
//! keyframe.

use std::sync::Arc;

use keyframe_engine::animation::{AnimationError, Renderable};
use keyframe_engine::foundation::math::Vec3;
use keyframe_engine::render::Material;
use keyframe_engine::scene::{NodeId, SceneGraph, SceneNode};
use rand::Rng;

use super::particle::signed_unit;
use super::{switch_model, Behavior, EntityKit, TickContext};

const MIN_LIFE: i32 = 1;
const MIN_SPEED: f64 = 0.01;

/// Enemy life cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnemyState {
    /// Spawn animation playing; does not move
    Spawning,
    /// Walking toward the cake
    Living,
    /// Death animation playing; no longer solid
    Dying,
}

/// Enemy state
#[derive(Debug, Clone, PartialEq)]
pub struct Enemy {
    state: EnemyState,
    life: i32,
    speed: f32,
    was_hurt: bool,
}

impl Enemy {
    /// Fresh enemy scaled to `difficulty`
    ///
    /// Life is `d/20 ± d/10` truncated, at least 1; speed is
    /// `d/1000 ± d/3000`, at least 0.01.
    pub fn spawn<R: Rng + ?Sized>(difficulty: i32, rng: &mut R) -> Self {
        let d = f64::from(difficulty);

        let r = f64::from(signed_unit(rng));
        let life = (d / 20.0 + r * d / 10.0) as i32;

        let r = f64::from(signed_unit(rng));
        let speed = d / 1000.0 + r * d / 3000.0;

        Self {
            state: EnemyState::Spawning,
            life: life.max(MIN_LIFE),
            speed: speed.max(MIN_SPEED) as f32,
            was_hurt: false,
        }
    }

    /// Current state
    pub fn state(&self) -> EnemyState {
        self.state
    }

    /// Hits left
    pub fn life(&self) -> i32 {
        self.life
    }

    /// Distance walked per tick
    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Hit since the last draw
    pub fn was_hurt(&self) -> bool {
        self.was_hurt
    }

    /// Read and clear the hurt flag
    pub fn take_hurt_flash(&mut self) -> bool {
        std::mem::take(&mut self.was_hurt)
    }

    /// Dying and the dying animation has moved past its first keyframe
    pub fn is_dead(&self, keyframe: usize) -> bool {
        self.state == EnemyState::Dying && keyframe != 0
    }
}

/// Enemy node at `location`
///
/// The box is taken from the living model, since the spawn model starts
/// collapsed, and the node then plays the spawn animation.
pub fn enemy_node(kit: &EntityKit, material: Arc<Material>, enemy: Enemy, location: Vec3) -> Result<SceneNode<Behavior>, AnimationError> {
    let mut renderable = Renderable::new(Arc::clone(&kit.spike_living), material)?;
    let bounds = renderable.bounding_box();
    renderable.set_model(Arc::clone(&kit.spike_spawn))?;

    let mut node = SceneNode::geometry("enemy", renderable).with_behavior(Behavior::Enemy(enemy));
    node.set_bounding_box(bounds);
    node.translate(location);
    Ok(node)
}

/// Horizontal step of length at most `speed` toward the origin
fn approach_step(location: Vec3, speed: f32) -> Vec3 {
    let mut step = (-location).try_normalize(f32::EPSILON).unwrap_or_else(Vec3::zeros) * speed;
    step.y = 0.0;
    step
}

/// Advance one enemy's state machine
pub fn update(graph: &mut SceneGraph<Behavior>, id: NodeId, ctx: &mut TickContext<'_>) {
    let Some(node) = graph.get_mut(id) else {
        return;
    };
    let keyframe = node.renderable.as_ref().map_or(0, Renderable::keyframe_index);
    let Some(Behavior::Enemy(enemy)) = node.behavior.as_mut() else {
        return;
    };

    let state = enemy.state;
    match state {
        EnemyState::Spawning => {
            if keyframe == 1 {
                enemy.state = EnemyState::Living;
                switch_model(node.renderable.as_mut(), &ctx.kit.spike_living);
            }
        }
        EnemyState::Living => {
            let speed = enemy.speed;
            let step = approach_step(node.location(), speed);
            node.translate(step);

            let bounds = node.bounding_box();
            let touches_player = node.is_solid() && bounds.intersects(&ctx.player.bounding_box());
            let touches_cake = !touches_player && ctx.cake.and_then(|cake| graph.is_colliding_with(cake, &bounds)).is_some();

            if touches_player || touches_cake {
                if let Some(node) = graph.get_mut(id) {
                    node.translate(-step);
                }
                ctx.player.hurt(ctx.kit.contact_damage);
                ctx.warn();
            }
        }
        EnemyState::Dying => {}
    }
}

/// A bullet hit: lose one life, die at zero
///
/// Only living enemies can be hurt.
pub fn take_hit(node: &mut SceneNode<Behavior>, ctx: &mut TickContext<'_>) {
    let Some(Behavior::Enemy(enemy)) = node.behavior.as_mut() else {
        return;
    };
    if enemy.state != EnemyState::Living {
        return;
    }

    enemy.life -= 1;
    enemy.was_hurt = true;
    if enemy.life <= 0 {
        enemy.state = EnemyState::Dying;
        switch_model(node.renderable.as_mut(), &ctx.kit.spike_dying);
        node.set_solid(false);
        ctx.stats.difficulty += 1;
        ctx.stats.kills += 1;
        ctx.audio.play_sound(&ctx.kit.cues.enemy_death);
        log::debug!("Enemy destroyed, difficulty now {}", ctx.stats.difficulty);
    } else {
        ctx.audio.play_sound(&ctx.kit.cues.enemy_hurt);
    }
}

/// Dead enemy node, ready to be swept
pub fn node_is_dead(node: &SceneNode<Behavior>) -> bool {
    let keyframe = node.renderable.as_ref().map_or(0, Renderable::keyframe_index);
    node.behavior.as_ref().and_then(Behavior::as_enemy).is_some_and(|enemy| enemy.is_dead(keyframe))
}
