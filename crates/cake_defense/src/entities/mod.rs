//! Game entities
//!
//! Enemies, bullets, particles and emitters live in the level's scene graph
//! as [`Behavior`] components; the player lives outside it. Updates run as
//! the graph's per-node hook and receive a [`TickContext`] with everything
//! outside the graph they may touch.

pub mod bullet;
pub mod enemy;
pub mod particle;
pub mod player;

pub use bullet::Bullet;
pub use enemy::{Enemy, EnemyState};
pub use particle::{MeanVar, Particle, ParticleProfile, ParticleProfiles, ParticleSettings, ParticleSystem};
pub use player::{MoveOutcome, Player};

use std::sync::Arc;

use keyframe_engine::animation::{Model, Renderable};
use keyframe_engine::audio::AudioSink;
use keyframe_engine::foundation::time::Cooldown;
use keyframe_engine::render::Material;
use keyframe_engine::scene::{NodeId, SceneGraph};
use rand::rngs::StdRng;

use crate::config::SoundCues;
use crate::game::GameStats;

/// Per-node game state
#[derive(Debug, Clone)]
pub enum Behavior {
    /// Hostile spike
    Enemy(Enemy),
    /// Player projectile
    Bullet(Bullet),
    /// Single particle
    Particle(Particle),
    /// Particle emitter; its children are its particles
    ParticleSystem(ParticleSystem),
}

impl Behavior {
    /// Enemy state, if this is an enemy
    pub fn as_enemy(&self) -> Option<&Enemy> {
        match self {
            Self::Enemy(enemy) => Some(enemy),
            _ => None,
        }
    }

    /// Mutable enemy state, if this is an enemy
    pub fn as_enemy_mut(&mut self) -> Option<&mut Enemy> {
        match self {
            Self::Enemy(enemy) => Some(enemy),
            _ => None,
        }
    }

    /// Bullet state, if this is a bullet
    pub fn as_bullet(&self) -> Option<&Bullet> {
        match self {
            Self::Bullet(bullet) => Some(bullet),
            _ => None,
        }
    }

    /// Particle state, if this is a particle
    pub fn as_particle(&self) -> Option<&Particle> {
        match self {
            Self::Particle(particle) => Some(particle),
            _ => None,
        }
    }

    /// Emitter state, if this is an emitter
    pub fn as_particle_system(&self) -> Option<&ParticleSystem> {
        match self {
            Self::ParticleSystem(system) => Some(system),
            _ => None,
        }
    }
}

/// Shared resources entities switch to at run time
#[derive(Debug, Clone)]
pub struct EntityKit {
    /// Enemy appearing
    pub spike_spawn: Arc<Model>,
    /// Enemy walking cycle
    pub spike_living: Arc<Model>,
    /// Enemy collapsing
    pub spike_dying: Arc<Model>,
    /// Material flashed on a hurt enemy
    pub hurt_material: Arc<Material>,
    /// Health the player loses per tick of enemy contact
    pub contact_damage: f64,
    /// Sound cue names
    pub cues: SoundCues,
}

/// Everything outside the scene graph an update may touch
pub struct TickContext<'a> {
    /// The player, for contact checks and damage
    pub player: &'a mut Player,
    /// Cue output
    pub audio: &'a mut dyn AudioSink,
    /// Difficulty and kill counters
    pub stats: &'a mut GameStats,
    /// Gate for the contact warning cue
    pub warning: &'a mut Cooldown,
    /// Random source for spawning and emission
    pub rng: &'a mut StdRng,
    /// Shared models, materials and cues
    pub kit: &'a EntityKit,
    /// Protected object enemies must not touch
    pub cake: Option<NodeId>,
}

impl TickContext<'_> {
    /// Play the contact warning unless it sounded recently
    pub fn warn(&mut self) {
        if self.warning.try_trigger() {
            self.audio.play_sound(&self.kit.cues.warning);
        }
    }
}

/// Switch `renderable` to `model`, keeping the old one if the new one is unusable
pub(crate) fn switch_model(renderable: Option<&mut Renderable>, model: &Arc<Model>) {
    if let Some(renderable) = renderable {
        if let Err(err) = renderable.set_model(Arc::clone(model)) {
            log::warn!("Cannot switch to model '{}': {err}", model.name());
        }
    }
}

/// Run the behavior of node `id`
pub fn update_node(graph: &mut SceneGraph<Behavior>, id: NodeId, ctx: &mut TickContext<'_>) {
    let Some(behavior) = graph.get(id).and_then(|node| node.behavior.as_ref()) else {
        return;
    };
    match behavior {
        Behavior::Enemy(_) => enemy::update(graph, id, ctx),
        Behavior::Bullet(_) => bullet::update(graph, id),
        Behavior::Particle(_) => particle::update_particle(graph, id),
        Behavior::ParticleSystem(_) => particle::update_system(graph, id, &mut *ctx.rng),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use keyframe_engine::animation::{Keyframe, Model};
    use keyframe_engine::assets::MeshData;
    use keyframe_engine::audio::RecordingAudio;
    use keyframe_engine::foundation::time::Cooldown;
    use keyframe_engine::render::{Material, MaterialTextures};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::{EntityKit, Player, TickContext};
    use crate::config::{GameConfig, PlayerConfig};
    use crate::game::GameStats;

    /// Everything a [`TickContext`] borrows
    pub struct Fixture {
        pub player: Player,
        pub audio: RecordingAudio,
        pub stats: GameStats,
        pub warning: Cooldown,
        pub rng: StdRng,
        pub kit: EntityKit,
    }

    impl Fixture {
        /// Player parked far from everything
        pub fn new(kit: EntityKit) -> Self {
            let mut player = Player::new(PlayerConfig::default());
            player.set_location(keyframe_engine::foundation::math::Vec3::new(100.0, 0.0, 100.0));
            Self {
                player,
                audio: RecordingAudio::default(),
                stats: GameStats::default(),
                warning: Cooldown::new(15),
                rng: StdRng::seed_from_u64(17),
                kit,
            }
        }

        pub fn ctx(&mut self) -> TickContext<'_> {
            TickContext {
                player: &mut self.player,
                audio: &mut self.audio,
                stats: &mut self.stats,
                warning: &mut self.warning,
                rng: &mut self.rng,
                kit: &self.kit,
                cake: None,
            }
        }
    }

    /// Kit with cube stand-ins for the spike animations
    pub fn kit() -> EntityKit {
        EntityKit {
            spike_spawn: animated("spike_spawn", &[60, 1]),
            spike_living: animated("spike_living", &[11, 11]),
            spike_dying: animated("spike_dying", &[30, 1]),
            hurt_material: textured("hurt"),
            contact_damage: 0.1,
            cues: GameConfig::default().sounds,
        }
    }

    /// Model of `holds.len()` identical unit cubes
    pub fn animated(name: &str, holds: &[u32]) -> Arc<Model> {
        let keyframe = Arc::new(Keyframe::from_mesh(&MeshData::cube(0.5)).unwrap());
        let mut model = Model::new(name);
        for &hold in holds {
            model.add_keyframe(Arc::clone(&keyframe), hold).unwrap();
        }
        Arc::new(model)
    }

    /// Single-frame unit cube
    pub fn cube_model(name: &str, hold: u32) -> Arc<Model> {
        animated(name, &[hold])
    }

    /// Material with a diffuse texture, so it draws
    pub fn textured(name: &str) -> Arc<Material> {
        Arc::new(Material {
            name: name.into(),
            textures: MaterialTextures { diffuse: format!("{name}.bmp"), ..MaterialTextures::default() },
            ..Material::default()
        })
    }
}
