//! Levels: scene groups, lights and per-tick collision resolution
//!
//! A level keeps four top-level groups in one scene graph and visits them in
//! a fixed order: bullets, static geometry, enemies, then particle systems
//! (drawn last so their transparency blends over everything else).

use std::sync::Arc;

use keyframe_engine::foundation::math::{Axis, Mat4, Mat4Ext, Vec3};
use keyframe_engine::render::{write_light_uniforms, Light, Material, Renderer, MAX_LIGHTS};
use keyframe_engine::scene::{NodeId, SceneError, SceneGraph, SceneNode, AABB};
use rand::Rng;

use crate::assets::Assets;
use crate::entities::particle::{self, emitter_node};
use crate::entities::{enemy, update_node, Behavior, Bullet, Enemy, ParticleProfile, ParticleProfiles, ParticleSystem, TickContext};
use crate::error::{GameError, GameResult};

/// Emitter left behind by a bullet every tick
pub const TRAIL_PROFILE: &str = "trail";
/// Emitter where a bullet ends
pub const IMPACT_PROFILE: &str = "impact";
/// Emitter marking an enemy spawn
pub const SPAWNER_PROFILE: &str = "spawner";

/// First node a box ran into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collision {
    /// Static geometry
    Static(NodeId),
    /// A solid enemy
    Enemy(NodeId),
    /// The protected cake
    Cake(NodeId),
}

impl Collision {
    /// Node that was hit
    pub fn node(self) -> NodeId {
        match self {
            Self::Static(id) | Self::Enemy(id) | Self::Cake(id) => id,
        }
    }
}

/// One playable scene
#[derive(Debug, Clone)]
pub struct Level {
    graph: SceneGraph<Behavior>,
    bullets: NodeId,
    statics: NodeId,
    enemies: NodeId,
    particle_systems: NodeId,
    cake: Option<NodeId>,
    lights: Vec<Light>,
}

impl Default for Level {
    fn default() -> Self {
        Self::new()
    }
}

impl Level {
    /// Empty level
    pub fn new() -> Self {
        let mut graph = SceneGraph::new();
        let bullets = graph.insert(SceneNode::new("bullets"));
        let statics = graph.insert(SceneNode::new("static"));
        let enemies = graph.insert(SceneNode::new("enemies"));
        let particle_systems = graph.insert(SceneNode::new("particle_systems"));
        Self { graph, bullets, statics, enemies, particle_systems, cake: None, lights: Vec::new() }
    }

    fn groups(&self) -> [NodeId; 4] {
        [self.bullets, self.statics, self.enemies, self.particle_systems]
    }

    /// Scene graph holding every group
    pub fn graph(&self) -> &SceneGraph<Behavior> {
        &self.graph
    }

    /// Mutable scene graph
    pub fn graph_mut(&mut self) -> &mut SceneGraph<Behavior> {
        &mut self.graph
    }

    /// Add solid scenery
    pub fn add_static(&mut self, node: SceneNode<Behavior>) -> Result<NodeId, SceneError> {
        self.graph.add_child(self.statics, node)
    }

    /// Add scenery and protect it from enemies
    pub fn set_cake(&mut self, node: SceneNode<Behavior>) -> Result<NodeId, SceneError> {
        let id = self.add_static(node)?;
        self.cake = Some(id);
        Ok(id)
    }

    /// Protected node, if any
    pub fn cake(&self) -> Option<NodeId> {
        self.cake
    }

    /// Add an enemy
    pub fn add_enemy(&mut self, node: SceneNode<Behavior>) -> Result<NodeId, SceneError> {
        self.graph.add_child(self.enemies, node)
    }

    /// Add a bullet
    pub fn add_bullet(&mut self, node: SceneNode<Behavior>) -> Result<NodeId, SceneError> {
        self.graph.add_child(self.bullets, node)
    }

    /// Add a particle emitter
    pub fn add_particle_system(&mut self, system: ParticleSystem) -> Result<NodeId, SceneError> {
        self.graph.add_child(self.particle_systems, emitter_node(system))
    }

    /// Start an emitter of `profile` at `location`
    pub fn spawn_emitter(&mut self, profile: &ParticleProfile, location: Vec3, life: i32) -> Result<NodeId, SceneError> {
        self.add_particle_system(ParticleSystem::new(profile.at(location), life))
    }

    /// Add a light; the shader takes at most [`MAX_LIGHTS`]
    pub fn add_light(&mut self, light: Light) -> GameResult<()> {
        if self.lights.len() >= MAX_LIGHTS {
            return Err(GameError::TooManyLights(MAX_LIGHTS));
        }
        self.lights.push(light);
        Ok(())
    }

    /// Lights in upload order
    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    /// Move the first light to `location`
    pub fn light_follow_player(&mut self, location: Vec3) {
        if let Some(light) = self.lights.first_mut() {
            light.position = location;
        }
    }

    /// Live bullets
    pub fn bullets(&self) -> &[NodeId] {
        self.graph.children(self.bullets)
    }

    /// Scenery nodes
    pub fn statics(&self) -> &[NodeId] {
        self.graph.children(self.statics)
    }

    /// Live enemies
    pub fn enemies(&self) -> &[NodeId] {
        self.graph.children(self.enemies)
    }

    /// Live emitters
    pub fn particle_systems(&self) -> &[NodeId] {
        self.graph.children(self.particle_systems)
    }

    /// First solid scenery node overlapping `bounds`
    pub fn find_static_collision(&self, bounds: &AABB) -> Option<NodeId> {
        self.graph.is_colliding_with(self.statics, bounds)
    }

    /// First solid enemy overlapping `bounds`
    pub fn find_enemy_collision(&self, bounds: &AABB) -> Option<NodeId> {
        self.graph.is_colliding_with(self.enemies, bounds)
    }

    /// Part of the cake overlapping `bounds`
    pub fn find_cake_collision(&self, bounds: &AABB) -> Option<NodeId> {
        self.cake.and_then(|cake| self.graph.is_colliding_with(cake, bounds))
    }

    /// Scenery, then enemies, then the cake; bullets and particles never block
    pub fn find_collision_with(&self, bounds: &AABB) -> Option<Collision> {
        self.find_static_collision(bounds)
            .map(Collision::Static)
            .or_else(|| self.find_enemy_collision(bounds).map(Collision::Enemy))
            .or_else(|| self.find_cake_collision(bounds).map(Collision::Cake))
    }

    /// One tick: behaviors, bullet hits, then cleanup
    pub fn update(&mut self, ctx: &mut TickContext<'_>, profiles: &ParticleProfiles) {
        ctx.cake = self.cake;
        for group in self.groups() {
            self.graph.update(group, &mut |graph, id| update_node(graph, id, ctx));
        }

        self.resolve_bullets(ctx, profiles);

        let dead_systems: Vec<NodeId> =
            self.particle_systems().iter().copied().filter(|&id| particle::system_is_dead(&self.graph, id)).collect();
        for id in dead_systems {
            self.graph.remove(id);
        }

        let dead_enemies: Vec<NodeId> =
            self.enemies().iter().copied().filter(|&id| self.graph.get(id).is_some_and(enemy::node_is_dead)).collect();
        for id in dead_enemies {
            log::trace!("Removing dead enemy {id:?}");
            self.graph.remove(id);
        }
    }

    /// Each bullet leaves a trail, then ends on scenery, on an enemy, or when
    /// it runs out of time. Every ended bullet bursts into an impact.
    fn resolve_bullets(&mut self, ctx: &mut TickContext<'_>, profiles: &ParticleProfiles) {
        let trail = profiles.get(TRAIL_PROFILE);
        let impact = profiles.get(IMPACT_PROFILE);

        let mut spent = Vec::new();
        for bullet in self.bullets().to_vec() {
            let Some(node) = self.graph.get(bullet) else {
                continue;
            };
            let location = node.location();
            let expired = node.behavior.as_ref().and_then(Behavior::as_bullet).map_or(true, Bullet::is_dead);

            self.emit(&trail, location);

            if self.graph.node_collides_with_node(self.statics, bullet).is_some() {
                spent.push(bullet);
            } else if let Some(target) = self.graph.node_collides_with_node(self.enemies, bullet) {
                if let Some(node) = self.graph.get_mut(target) {
                    enemy::take_hit(node, ctx);
                    if enemy::node_is_dead(node) {
                        self.graph.remove(target);
                    }
                }
                spent.push(bullet);
            } else if expired {
                spent.push(bullet);
            }
        }

        for bullet in spent {
            if let Some(location) = self.graph.get(bullet).map(SceneNode::location) {
                self.emit(&impact, location);
            }
            self.graph.remove(bullet);
        }
    }

    fn emit(&mut self, profile: &ParticleProfile, location: Vec3) {
        if let Err(err) = self.spawn_emitter(profile, location, 1) {
            log::warn!("Could not start emitter: {err}");
        }
    }

    /// Write the light uniforms and draw every group from identity
    ///
    /// Enemies hit since the last draw are drawn once with `hurt_material`.
    pub fn draw(&mut self, renderer: &mut dyn Renderer, hurt_material: &Arc<Material>) {
        write_light_uniforms(&self.lights, renderer);

        let mut flashed = Vec::new();
        for id in self.enemies().to_vec() {
            let Some(node) = self.graph.get_mut(id) else {
                continue;
            };
            let hurt = node.behavior.as_mut().and_then(Behavior::as_enemy_mut).is_some_and(Enemy::take_hurt_flash);
            if let (true, Some(renderable)) = (hurt, node.renderable.as_mut()) {
                flashed.push((id, Arc::clone(renderable.material())));
                renderable.set_material(Arc::clone(hurt_material));
            }
        }

        for group in self.groups() {
            self.graph.draw(group, &Mat4::identity(), renderer);
        }

        for (id, material) in flashed {
            if let Some(renderable) = self.graph.get_mut(id).and_then(|n| n.renderable.as_mut()) {
                renderable.set_material(material);
            }
        }
    }
}

fn placed(mut node: SceneNode<Behavior>, scale: Option<f32>, location: Vec3) -> SceneNode<Behavior> {
    if let Some(scale) = scale {
        node.scale(Vec3::repeat(scale));
    }
    node.translate(location);
    node
}

fn pick<'a, R: Rng + ?Sized>(rng: &mut R, choices: &[&'a str]) -> &'a str {
    choices[rng.gen_range(0..choices.len())]
}

/// The arena: a round room of blocks with the cake on a table in the middle
pub fn make_test_level<R: Rng + ?Sized>(assets: &mut Assets, rng: &mut R) -> GameResult<Level> {
    const BLOCK: &str = "testAnim3";
    let mut level = Level::new();

    for (height, materials) in [(-5.0, ["floor0", "floor1"]), (5.0, ["ceiling0", "ceiling1"])] {
        for z in -10..=10_i32 {
            for x in -10..=10_i32 {
                if x * x + z * z > 100 {
                    continue;
                }
                let node = assets.geometry("block", BLOCK, pick(rng, &materials))?;
                level.add_static(placed(node, None, Vec3::new(2.0 * x as f32, height, 2.0 * z as f32)))?;
            }
        }
    }

    for z in -10..=10_i32 {
        for x in -10..=10_i32 {
            for y in 0..4 {
                if x * x + z * z < 100 {
                    continue;
                }
                let node = assets.geometry("wall", BLOCK, pick(rng, &["wall0", "wall1"]))?;
                level.add_static(placed(node, None, Vec3::new(2.0 * x as f32, -3.0 + 2.0 * y as f32, 2.0 * z as f32)))?;
            }
        }
    }

    let table = assets.geometry("table", "table", "table")?;
    level.add_static(placed(table, None, Vec3::new(0.0, -4.0, 0.0)))?;
    let cake = assets.geometry("cake", "cake", "cake")?;
    level.set_cake(placed(cake, Some(0.5), Vec3::new(0.0, -2.8, 0.0)))?;

    for light in [
        Light::new(Vec3::new(0.0, 2.0, 0.0), Vec3::new(0.5, 0.5, 0.5), 40.0),
        Light::new(Vec3::new(16.0, 0.0, 0.0), Vec3::new(1.0, 0.1, 0.1), 40.0),
        Light::new(Vec3::new(-16.0, 0.0, 0.0), Vec3::new(0.1, 1.0, 0.1), 40.0),
        Light::new(Vec3::new(0.0, 0.0, -16.0), Vec3::new(0.1, 0.1, 1.0), 40.0),
        Light::new(Vec3::new(0.0, 0.0, 16.0), Vec3::new(1.0, 1.0, 0.1), 40.0),
    ] {
        level.add_light(light)?;
    }

    log::info!("Built arena with {} static nodes", level.statics().len());
    Ok(level)
}

/// Title backdrop: a floor, a ring of idle spikes and a small cake
pub fn make_menu_scene(assets: &mut Assets) -> GameResult<Level> {
    let mut level = Level::new();

    for z in -8..=8_i32 {
        for x in -8..=8_i32 {
            let node = assets.geometry("block", "testAnim3", "floor1")?;
            level.add_static(placed(node, None, Vec3::new(2.0 * x as f32, 0.0, 2.0 * z as f32)))?;
        }
    }

    for step in 0..6_u8 {
        let angle = f32::from(step) * 60.0;
        let location = Mat4::rotation_about(Axis::Y, angle).apply_point(Vec3::new(1.0, 1.25, 0.0));
        let spike = assets.geometry("spike", "spike_living", "spike0")?;
        level.add_static(placed(spike, Some(0.25), location))?;
    }

    let table = assets.geometry("table", "table", "table")?;
    level.add_static(placed(table, Some(0.25), Vec3::new(0.0, 1.25, 0.0)))?;
    let cake = assets.geometry("cake", "cake", "cake")?;
    level.add_static(placed(cake, Some(0.1), Vec3::new(0.0, 1.6, 0.0)))?;

    level.add_light(Light::new(Vec3::new(0.0, 4.0, 0.0), Vec3::new(1.0, 0.75, 0.5), 10.0))?;
    Ok(level)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::test_assets;
    use crate::config::GameConfig;
    use crate::entities::bullet::bullet_node;
    use crate::entities::enemy::enemy_node;
    use crate::entities::test_support::{cube_model, kit, textured, Fixture};
    use crate::entities::EnemyState;
    use approx::assert_relative_eq;
    use keyframe_engine::animation::Renderable;
    use keyframe_engine::render::{RecordingRenderer, UniformTable, UniformValue};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn block(location: Vec3) -> SceneNode<Behavior> {
        let renderable = Renderable::new(cube_model("block", 1), textured("wall0")).unwrap();
        placed(SceneNode::geometry("block", renderable), None, location)
    }

    fn bullet(location: Vec3, velocity: Vec3, life: i32) -> SceneNode<Behavior> {
        let renderable = Renderable::new(cube_model("bullet", 1), textured("bullet")).unwrap();
        bullet_node(renderable, Bullet::new(velocity, life), location, 0.25)
    }

    fn living_enemy(fixture: &mut Fixture, location: Vec3) -> SceneNode<Behavior> {
        let enemy = Enemy::spawn(0, &mut fixture.rng);
        let node = enemy_node(&fixture.kit, textured("spike0"), enemy, location).unwrap();
        // let the spawn animation finish
        let mut graph = SceneGraph::new();
        let id = graph.insert(node);
        for _ in 0..60 {
            graph.update(id, &mut |g, n| update_node(g, n, &mut fixture.ctx()));
        }
        graph.get(id).unwrap().clone()
    }

    fn profiles() -> ParticleProfiles {
        let config = GameConfig::default();
        test_assets().particle_profiles(&config.particles)
    }

    #[test]
    fn test_collision_priority() {
        let mut level = Level::new();
        let mut fixture = Fixture::new(kit());
        let wall = level.add_static(block(Vec3::zeros())).unwrap();
        let enemy = level.add_enemy(living_enemy(&mut fixture, Vec3::new(3.0, 0.0, 0.0))).unwrap();

        let probe = AABB::from_center_extents(Vec3::new(0.25, 0.0, 0.0), Vec3::repeat(0.1));
        assert_eq!(level.find_collision_with(&probe), Some(Collision::Static(wall)));

        let probe = AABB::from_center_extents(Vec3::new(3.0, 0.0, 0.0), Vec3::repeat(0.1));
        assert_eq!(level.find_collision_with(&probe), Some(Collision::Enemy(enemy)));

        let probe = AABB::from_center_extents(Vec3::new(5.0, 0.0, 0.0), Vec3::repeat(0.1));
        assert_eq!(level.find_collision_with(&probe), None);
    }

    #[test]
    fn test_bullet_hitting_scenery_becomes_impact() {
        let mut level = Level::new();
        let mut fixture = Fixture::new(kit());
        level.add_static(block(Vec3::new(0.0, 0.0, -3.0))).unwrap();
        level.add_bullet(bullet(Vec3::new(0.0, 0.0, -2.4), Vec3::new(0.0, 0.0, -0.1), 300)).unwrap();

        level.update(&mut fixture.ctx(), &profiles());
        assert!(level.bullets().is_empty());
        // one trail and one impact emitter
        assert_eq!(level.particle_systems().len(), 2);
    }

    #[test]
    fn test_bullet_kills_weak_enemy() {
        let mut level = Level::new();
        let mut fixture = Fixture::new(kit());
        let enemy = level.add_enemy(living_enemy(&mut fixture, Vec3::new(0.0, 0.0, -5.0))).unwrap();
        level.add_bullet(bullet(Vec3::new(0.0, 0.0, -4.4), Vec3::new(0.0, 0.0, -0.1), 300)).unwrap();

        level.update(&mut fixture.ctx(), &profiles());
        assert!(level.bullets().is_empty());
        assert_eq!(fixture.stats.kills, 1);
        let state = level.graph().get(enemy).unwrap().behavior.as_ref().and_then(Behavior::as_enemy).unwrap().state();
        assert_eq!(state, EnemyState::Dying);

        // swept once the dying animation moves on
        for _ in 0..30 {
            level.update(&mut fixture.ctx(), &profiles());
        }
        assert!(level.enemies().is_empty());
    }

    #[test]
    fn test_expired_bullet_is_removed() {
        let mut level = Level::new();
        let mut fixture = Fixture::new(kit());
        level.add_bullet(bullet(Vec3::zeros(), Vec3::new(0.0, 0.0, -0.1), 2)).unwrap();

        level.update(&mut fixture.ctx(), &profiles());
        assert_eq!(level.bullets().len(), 1);
        level.update(&mut fixture.ctx(), &profiles());
        assert!(level.bullets().is_empty());
    }

    #[test]
    fn test_finished_emitters_are_swept() {
        let mut level = Level::new();
        let mut fixture = Fixture::new(kit());
        level.spawn_emitter(&ParticleProfile::default(), Vec3::zeros(), 1).unwrap();
        level.update(&mut fixture.ctx(), &profiles());
        assert!(level.particle_systems().is_empty());
    }

    #[test]
    fn test_light_limit() {
        let mut level = Level::new();
        for _ in 0..MAX_LIGHTS {
            level.add_light(Light::new(Vec3::zeros(), Vec3::repeat(1.0), 1.0)).unwrap();
        }
        assert!(matches!(level.add_light(Light::new(Vec3::zeros(), Vec3::repeat(1.0), 1.0)), Err(GameError::TooManyLights(16))));
        level.light_follow_player(Vec3::new(1.0, 2.0, 3.0));
        assert_relative_eq!(level.lights()[0].position, Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_draw_flashes_hurt_enemy_once() {
        let mut level = Level::new();
        let mut fixture = Fixture::new(kit());
        level.add_enemy(living_enemy(&mut fixture, Vec3::zeros())).unwrap();
        let mut hit = living_enemy(&mut fixture, Vec3::new(0.0, 0.0, -5.0));
        enemy::take_hit(&mut hit, &mut fixture.ctx());
        let hit = level.add_enemy(hit).unwrap();
        level.add_light(Light::new(Vec3::zeros(), Vec3::repeat(1.0), 5.0)).unwrap();

        let uniforms = UniformTable::with_names(["numLights", "LightColor[0]", "LightPosition_WS[0]", "LightPower[0]"]);
        let mut renderer = RecordingRenderer::new(uniforms);
        let hurt = textured("hurt");
        level.draw(&mut renderer, &hurt);
        assert_eq!(renderer.uniforms.get("numLights"), Some(UniformValue::Int(1)));
        assert_eq!(renderer.commands.len(), 2);
        assert_eq!(renderer.commands[0].material.name, "spike0");
        assert_eq!(renderer.commands[1].material.name, "hurt");

        renderer.clear();
        level.draw(&mut renderer, &hurt);
        assert!(renderer.commands.iter().all(|c| c.material.name == "spike0"));
        let restored = level.graph().get(hit).unwrap().renderable.as_ref().unwrap();
        assert_eq!(restored.material().name, "spike0");
    }

    #[test]
    fn test_arena_layout() {
        let mut assets = test_assets();
        let mut rng = StdRng::seed_from_u64(9);
        let level = make_test_level(&mut assets, &mut rng).unwrap();

        assert_eq!(level.lights().len(), 5);
        let cake = level.cake().unwrap();
        assert!(level.statics().contains(&cake));
        assert_relative_eq!(level.graph().get(cake).unwrap().location(), Vec3::new(0.0, -2.8, 0.0), epsilon = 1e-6);

        // a box just above the floor in the middle of the room touches the table
        let probe = AABB::from_center_extents(Vec3::new(0.0, -3.5, 0.0), Vec3::repeat(0.1));
        assert!(level.find_static_collision(&probe).is_some());
        // open floor between the table and the walls
        let probe = AABB::from_center_extents(Vec3::new(15.0, -3.0, 0.0), Vec3::repeat(0.5));
        assert!(level.find_collision_with(&probe).is_none());
    }

    #[test]
    fn test_menu_layout() {
        let mut assets = test_assets();
        let level = make_menu_scene(&mut assets).unwrap();
        assert_eq!(level.statics().len(), 17 * 17 + 6 + 2);
        assert_eq!(level.lights().len(), 1);
        assert!(level.cake().is_none());

        let first_spike = level.statics()[17 * 17];
        assert_relative_eq!(level.graph().get(first_spike).unwrap().location(), Vec3::new(1.0, 1.25, 0.0), epsilon = 1e-6);
    }
}
