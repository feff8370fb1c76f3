//! Short-lived particles and the emitters that spawn them
//!
//! An emitter is a plain grouping node whose children are its particles.
//! Every sampled quantity follows `mean + r * var` with `r` uniform in
//! `[-1, 1]`, drawn per axis for vectors.

use std::collections::HashMap;
use std::sync::Arc;

use keyframe_engine::animation::{Model, Renderable};
use keyframe_engine::foundation::math::Vec3;
use keyframe_engine::render::Material;
use keyframe_engine::scene::{NodeId, SceneGraph, SceneNode};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::Behavior;

/// Uniform sample in `[-1, 1]`
pub fn signed_unit<R: Rng + ?Sized>(rng: &mut R) -> f32 {
    rng.gen_range(-1.0..=1.0)
}

/// Mean and spread of a sampled quantity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeanVar<T> {
    /// Center value
    pub mean: T,
    /// Maximum deviation from the mean
    pub var: T,
}

impl<T> MeanVar<T> {
    /// Create a distribution
    pub fn new(mean: T, var: T) -> Self {
        Self { mean, var }
    }
}

impl MeanVar<f32> {
    /// Constant value
    pub fn fixed(mean: f32) -> Self {
        Self::new(mean, 0.0)
    }

    /// Draw one value
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        self.mean + signed_unit(rng) * self.var
    }
}

impl MeanVar<Vec3> {
    /// Constant vector
    pub fn fixed(mean: Vec3) -> Self {
        Self::new(mean, Vec3::zeros())
    }

    /// Draw one vector, each axis independently
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec3 {
        let r = Vec3::new(signed_unit(rng), signed_unit(rng), signed_unit(rng));
        self.mean + r.component_mul(&self.var)
    }
}

/// Emission parameters, as stored in the game configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleSettings {
    /// Animation alias every particle draws
    pub model: String,
    /// Material alias every particle draws with
    pub material: String,
    /// Particles emitted per tick (rounded)
    pub number: MeanVar<f32>,
    /// Particle lifetime in ticks (truncated)
    pub life: MeanVar<f32>,
    /// Initial velocity per tick
    pub velocity: MeanVar<Vec3>,
    /// Velocity change per tick
    pub acceleration: MeanVar<Vec3>,
    /// Spawn position; the mean is replaced by the emitter location
    pub position: MeanVar<Vec3>,
    /// Particle scale
    pub scale: MeanVar<Vec3>,
}

impl Default for ParticleSettings {
    fn default() -> Self {
        Self {
            model: String::new(),
            material: String::new(),
            number: MeanVar::<f32>::fixed(0.0),
            life: MeanVar::<f32>::fixed(0.0),
            velocity: MeanVar::<Vec3>::fixed(Vec3::zeros()),
            acceleration: MeanVar::<Vec3>::fixed(Vec3::zeros()),
            position: MeanVar::<Vec3>::fixed(Vec3::zeros()),
            scale: MeanVar::<Vec3>::fixed(Vec3::zeros()),
        }
    }
}

/// Settings with their model and material resolved
#[derive(Debug, Clone, Default)]
pub struct ParticleProfile {
    /// Sampling parameters
    pub settings: ParticleSettings,
    /// Shared particle model
    pub model: Arc<Model>,
    /// Shared particle material
    pub material: Arc<Material>,
}

impl ParticleProfile {
    /// Copy of this profile emitting around `location`
    #[must_use]
    pub fn at(&self, location: Vec3) -> Self {
        let mut profile = self.clone();
        profile.settings.position.mean = location;
        profile
    }
}

/// Named emitter profiles
#[derive(Debug, Clone, Default)]
pub struct ParticleProfiles {
    profiles: HashMap<String, ParticleProfile>,
}

impl ParticleProfiles {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace a profile
    pub fn insert(&mut self, name: impl Into<String>, profile: ParticleProfile) {
        self.profiles.insert(name.into(), profile);
    }

    /// Profile registered as `name`; unknown names get an emitter that never emits
    pub fn get(&self, name: &str) -> ParticleProfile {
        self.profiles.get(name).cloned().unwrap_or_else(|| {
            log::debug!("Unknown particle profile '{name}', emitting nothing");
            ParticleProfile::default()
        })
    }

    /// Number of registered profiles
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    /// Nothing registered
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

/// One particle's motion state
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    velocity: Vec3,
    acceleration: Vec3,
    life: i32,
    start_life: i32,
}

impl Particle {
    /// Particle living `life` ticks
    pub fn new(velocity: Vec3, acceleration: Vec3, life: i32) -> Self {
        Self { velocity, acceleration, life, start_life: life }
    }

    /// Ticks left
    pub fn life(&self) -> i32 {
        self.life
    }

    /// Current velocity
    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    /// Out of life
    pub fn is_dead(&self) -> bool {
        self.life <= 0
    }

    /// Fraction of life left, used as draw alpha
    fn fade(&self) -> f32 {
        if self.start_life == 0 {
            0.0
        } else {
            self.life as f32 / self.start_life as f32
        }
    }
}

/// Emitter state
#[derive(Debug, Clone)]
pub struct ParticleSystem {
    profile: ParticleProfile,
    life: i32,
}

impl ParticleSystem {
    /// Emitter that keeps emitting for `life` ticks
    pub fn new(profile: ParticleProfile, life: i32) -> Self {
        Self { profile, life }
    }

    /// Ticks of emission left
    pub fn life(&self) -> i32 {
        self.life
    }

    /// Profile this emitter samples from
    pub fn profile(&self) -> &ParticleProfile {
        &self.profile
    }
}

/// Grouping node carrying an emitter
pub fn emitter_node(system: ParticleSystem) -> SceneNode<Behavior> {
    SceneNode::new("particle_system").with_behavior(Behavior::ParticleSystem(system))
}

/// Emitter is done and all of its particles are gone
pub fn system_is_dead(graph: &SceneGraph<Behavior>, id: NodeId) -> bool {
    let Some(node) = graph.get(id) else {
        return true;
    };
    let finished = node.behavior.as_ref().and_then(Behavior::as_particle_system).map_or(true, |system| system.life <= 0);
    finished && node.children().is_empty()
}

/// Age one particle
pub fn update_particle(graph: &mut SceneGraph<Behavior>, id: NodeId) {
    let Some(node) = graph.get_mut(id) else {
        return;
    };
    let Some(Behavior::Particle(particle)) = node.behavior.as_mut() else {
        return;
    };

    let alpha = particle.fade();
    let velocity = particle.velocity;
    particle.velocity += particle.acceleration;
    particle.life -= 1;

    if let Some(renderable) = node.renderable.as_mut() {
        renderable.set_alpha(alpha);
    }
    node.translate(velocity);
}

/// Emit this tick's particles, drop dead ones, age the emitter
///
/// Particle children are aged by the traversal after this returns.
pub fn update_system<R: Rng + ?Sized>(graph: &mut SceneGraph<Behavior>, id: NodeId, rng: &mut R) {
    let Some(system) = graph.get(id).and_then(|n| n.behavior.as_ref()).and_then(Behavior::as_particle_system) else {
        return;
    };
    let profile = system.profile.clone();
    let emitting = system.life > 0;

    if emitting {
        let count = profile.settings.number.sample(rng).round();
        for _ in 0..count.max(0.0) as usize {
            match spawn_particle(&profile, rng) {
                Some(particle) => {
                    if let Err(err) = graph.add_child(id, particle) {
                        log::warn!("Could not attach particle: {err}");
                    }
                }
                None => break,
            }
        }
    }

    let dead: Vec<NodeId> = graph
        .children(id)
        .iter()
        .copied()
        .filter(|&child| {
            graph
                .get(child)
                .and_then(|n| n.behavior.as_ref())
                .and_then(Behavior::as_particle)
                .is_some_and(Particle::is_dead)
        })
        .collect();
    for child in dead {
        graph.remove(child);
    }

    if let Some(Behavior::ParticleSystem(system)) = graph.get_mut(id).and_then(|n| n.behavior.as_mut()) {
        system.life -= 1;
    }
}

fn spawn_particle<R: Rng + ?Sized>(profile: &ParticleProfile, rng: &mut R) -> Option<SceneNode<Behavior>> {
    let settings = &profile.settings;
    let life = settings.life.sample(rng) as i32;
    let velocity = settings.velocity.sample(rng);
    let acceleration = settings.acceleration.sample(rng);
    let position = settings.position.sample(rng);
    let scale = settings.scale.sample(rng);

    let renderable = match Renderable::new(Arc::clone(&profile.model), Arc::clone(&profile.material)) {
        Ok(renderable) => renderable,
        Err(err) => {
            log::warn!("Particle model '{}' unusable: {err}", settings.model);
            return None;
        }
    };

    let mut node = SceneNode::geometry("particle", renderable).with_behavior(Behavior::Particle(Particle::new(velocity, acceleration, life)));
    node.scale(scale);
    node.translate(position);
    node.set_solid(false);
    Some(node)
}
