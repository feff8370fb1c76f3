//! First-person player
//!
//! The player is not part of any scene graph: it carries its own box and
//! collides against whichever level is current.

use keyframe_engine::foundation::math::utils::{deg_to_rad, rad_to_deg};
use keyframe_engine::foundation::math::{Mat4, Mat4Ext, Vec3};
use keyframe_engine::foundation::time::Cooldown;
use keyframe_engine::scene::AABB;

use crate::config::PlayerConfig;
use crate::level::{Collision, Level};

const MAX_PITCH_DEGREES: f32 = 89.0;

/// What a movement attempt did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MoveOutcome {
    /// Location changed
    pub moved: bool,
    /// The first blocking node was an enemy
    pub enemy_contact: bool,
}

/// Player position, orientation and vitals
#[derive(Debug, Clone)]
pub struct Player {
    settings: PlayerConfig,
    location: Vec3,
    /// Radians; x is pitch, y is yaw
    rotation: Vec3,
    gravity: f32,
    can_jump: bool,
    shoot_cooldown: Cooldown,
    health: f64,
}

impl Player {
    /// Player at the origin with full health
    pub fn new(settings: PlayerConfig) -> Self {
        Self {
            location: Vec3::zeros(),
            rotation: Vec3::zeros(),
            gravity: 0.0,
            can_jump: false,
            shoot_cooldown: Cooldown::new(settings.shoot_cooldown),
            health: settings.health,
            settings,
        }
    }

    /// Eye position
    pub fn location(&self) -> Vec3 {
        self.location
    }

    /// Teleport; the box follows
    pub fn set_location(&mut self, location: Vec3) {
        self.location = location;
    }

    /// Pitch, yaw and roll in radians
    pub fn rotation(&self) -> Vec3 {
        self.rotation
    }

    /// Replace the orientation
    pub fn set_rotation(&mut self, rotation: Vec3) {
        self.rotation = rotation;
    }

    /// Turn by `delta` radians; pitch stays within ±89°
    pub fn rotate(&mut self, delta: Vec3) {
        self.rotation += delta;
        let limit = deg_to_rad(MAX_PITCH_DEGREES);
        self.rotation.x = self.rotation.x.clamp(-limit, limit);
    }

    /// Collision box around the location
    pub fn bounding_box(&self) -> AABB {
        AABB::from_center_extents(self.location, self.settings.half_extents)
    }

    fn yaw(&self) -> Mat4 {
        Mat4::rotation_degrees(rad_to_deg(self.rotation.y), &Vec3::new(0.0, -1.0, 0.0))
    }

    fn orientation(&self) -> Mat4 {
        self.yaw() * Mat4::rotation_degrees(rad_to_deg(self.rotation.x), &Vec3::new(-1.0, 0.0, 0.0))
    }

    /// Unit vector the player looks along
    pub fn view_vector(&self) -> Vec3 {
        self.orientation().apply_vector(Vec3::new(0.0, 0.0, -1.0))
    }

    /// World-to-eye matrix
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at(self.location, self.location + self.view_vector(), Vec3::y())
    }

    /// Move by `delta`, given in the player's yaw frame
    ///
    /// A blocked horizontal move slides along Z, then along X. A blocked
    /// vertical move does not slide.
    pub fn try_to_move(&mut self, delta: Vec3, level: &Level) -> MoveOutcome {
        let step = self.yaw().apply_vector(delta);
        let start = self.bounding_box();
        let blocked = |offset: Vec3| level.find_collision_with(&start.translated(offset));

        let Some(hit) = blocked(step) else {
            self.location += step;
            return MoveOutcome { moved: true, enemy_contact: false };
        };
        let enemy_contact = matches!(hit, Collision::Enemy(_));

        if delta.y != 0.0 {
            return MoveOutcome { moved: false, enemy_contact };
        }

        let slides = [Vec3::new(0.0, step.y, step.z), Vec3::new(step.x, step.y, 0.0)];
        match slides.into_iter().find(|&slide| blocked(slide).is_none()) {
            Some(slide) => {
                self.location += slide;
                MoveOutcome { moved: true, enemy_contact }
            }
            None => MoveOutcome { moved: false, enemy_contact },
        }
    }

    /// Apply one tick of vertical velocity, then accelerate downward
    ///
    /// The player can jump exactly when this move was blocked.
    pub fn update_gravity(&mut self, level: &Level) -> MoveOutcome {
        let outcome = self.try_to_move(Vec3::new(0.0, self.gravity, 0.0), level);
        self.gravity = (self.gravity - self.settings.gravity_acceleration).max(self.settings.terminal_velocity);
        self.can_jump = !outcome.moved;
        outcome
    }

    /// Current vertical velocity
    pub fn gravity(&self) -> f32 {
        self.gravity
    }

    /// Standing on something
    pub fn can_jump(&self) -> bool {
        self.can_jump
    }

    /// Launch upward if standing; returns whether it happened
    pub fn jump(&mut self) -> bool {
        if !self.can_jump {
            return false;
        }
        self.gravity = self.settings.jump_velocity;
        self.can_jump = false;
        true
    }

    /// Weapon is ready
    pub fn can_shoot(&self) -> bool {
        self.shoot_cooldown.is_ready()
    }

    /// Start the weapon cooldown; returns whether a shot was allowed
    pub fn shoot(&mut self) -> bool {
        self.shoot_cooldown.try_trigger()
    }

    /// Count the weapon cooldown down
    pub fn update_shoot_cooldown(&mut self) {
        self.shoot_cooldown.tick();
    }

    /// Health left
    pub fn health(&self) -> f64 {
        self.health
    }

    /// Lose `amount` health
    pub fn hurt(&mut self, amount: f64) {
        self.health -= amount;
    }

    /// Out of health
    pub fn is_dead(&self) -> bool {
        self.health <= 0.0
    }

    /// Full health, standing still, weapon ready
    pub fn reset(&mut self) {
        *self = Self::new(self.settings.clone());
    }
}
