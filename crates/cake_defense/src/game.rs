//! Per-tick orchestration: spawning, player input, level switching and defeat

use keyframe_engine::audio::{AudioSink, MusicTrack};
use keyframe_engine::foundation::math::utils::deg_to_rad;
use keyframe_engine::foundation::math::{Axis, Mat4, Mat4Ext, Vec2, Vec3};
use keyframe_engine::foundation::time::Cooldown;
use keyframe_engine::render::{Material, Renderer, TextureSlot, UniformValue, MAX_LIGHTS};
use rand::rngs::StdRng;
use rand::Rng;

use crate::assets::Assets;
use crate::config::GameConfig;
use crate::entities::bullet::bullet_node;
use crate::entities::enemy::enemy_node;
use crate::entities::{Bullet, Enemy, EntityKit, ParticleProfiles, Player, TickContext};
use crate::error::GameResult;
use crate::level::{make_menu_scene, make_test_level, Level, SPAWNER_PROFILE};

/// Shader toggles written every draw, in [`GraphicsConfig`](crate::config::GraphicsConfig) order
const TOGGLE_UNIFORMS: [&str; 6] =
    ["use_normal_mapping", "use_specular_mapping", "use_texture_mapping", "use_self_illumination", "use_lights", "show_normals"];

/// Running score
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GameStats {
    /// Grows with every kill and scales spawned enemies
    pub difficulty: i32,
    /// Enemies killed
    pub kills: u32,
    /// Ticks survived in the arena
    pub timesteps_lasted: u64,
}

/// Input sampled once per tick
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlayerInput {
    /// Cursor movement since the last tick
    pub look: Vec2,
    /// Walk forward
    pub forward: bool,
    /// Walk backward
    pub back: bool,
    /// Strafe left
    pub left: bool,
    /// Strafe right
    pub right: bool,
    /// Jump if standing
    pub jump: bool,
    /// Fire if the weapon is ready
    pub fire: bool,
}

impl PlayerInput {
    /// Unnormalized walk direction in view space
    fn walk_direction(&self) -> Vec3 {
        let mut direction = Vec3::zeros();
        for (pressed, step) in [
            (self.forward, Vec3::new(0.0, 0.0, -1.0)),
            (self.back, Vec3::new(0.0, 0.0, 1.0)),
            (self.left, Vec3::new(-1.0, 0.0, 0.0)),
            (self.right, Vec3::new(1.0, 0.0, 0.0)),
        ] {
            if pressed {
                direction += step;
            }
        }
        direction
    }
}

/// Which level is live
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelKind {
    /// Title backdrop
    Menu,
    /// The arena
    Main,
}

/// The whole game: both levels, the player and everything a tick touches
pub struct Game<A: AudioSink> {
    config: GameConfig,
    assets: Assets,
    kit: EntityKit,
    profiles: ParticleProfiles,
    menu: Level,
    main: Level,
    current: LevelKind,
    player: Player,
    audio: A,
    stats: GameStats,
    warning: Cooldown,
    spawn_timer: Cooldown,
    rng: StdRng,
    failed: bool,
}

impl<A: AudioSink> Game<A> {
    /// Build both levels and park the player on the menu
    pub fn new(config: GameConfig, mut assets: Assets, mut audio: A, mut rng: StdRng) -> GameResult<Self> {
        let kit = assets.entity_kit(&config);
        let profiles = assets.particle_profiles(&config.particles);
        let menu = make_menu_scene(&mut assets)?;
        let main = make_test_level(&mut assets, &mut rng)?;
        audio.play_music(MusicTrack::Alive);

        let mut game = Self {
            player: Player::new(config.player.clone()),
            warning: Cooldown::new(config.gameplay.warning_cooldown),
            spawn_timer: Cooldown::new(config.gameplay.spawn_cooldown),
            config,
            assets,
            kit,
            profiles,
            menu,
            main,
            current: LevelKind::Menu,
            audio,
            stats: GameStats::default(),
            rng,
            failed: false,
        };
        game.switch_level(LevelKind::Menu);
        Ok(game)
    }

    /// Leave the menu for the arena; ignored once the game is lost
    pub fn start(&mut self) {
        if self.failed {
            log::info!("Game over, not restarting");
            return;
        }
        self.audio.play_sound(&self.kit.cues.select);
        self.audio.play_music(MusicTrack::Alive);
        self.switch_level(LevelKind::Main);
    }

    /// Make `kind` live and place the player for it
    pub fn switch_level(&mut self, kind: LevelKind) {
        let settings = &self.config.player;
        let (location, rotation) = match kind {
            LevelKind::Menu => (settings.menu_location, settings.menu_rotation_degrees.map(deg_to_rad)),
            LevelKind::Main => (settings.main_location, Vec3::zeros()),
        };
        self.player.set_location(location);
        self.player.set_rotation(rotation);
        self.current = kind;
        log::info!("Switched to {kind:?}");
    }

    /// Advance everything by one tick
    pub fn tick(&mut self, input: &PlayerInput) -> GameResult<()> {
        let in_arena = self.current == LevelKind::Main;

        if in_arena {
            self.run_spawner()?;
            self.apply_gravity();
            self.apply_input(input)?;
            self.stats.timesteps_lasted += 1;
        }

        self.player.update_shoot_cooldown();
        let level = match self.current {
            LevelKind::Menu => &mut self.menu,
            LevelKind::Main => &mut self.main,
        };
        let mut ctx = TickContext {
            player: &mut self.player,
            audio: &mut self.audio,
            stats: &mut self.stats,
            warning: &mut self.warning,
            rng: &mut self.rng,
            kit: &self.kit,
            cake: None,
        };
        level.update(&mut ctx, &self.profiles);
        self.warning.tick();

        if in_arena && self.player.is_dead() && !self.config.gameplay.cheats {
            log::info!(
                "Defeated after {} ticks with {} kills",
                self.stats.timesteps_lasted,
                self.stats.kills
            );
            self.failed = true;
            self.switch_level(LevelKind::Menu);
            self.audio.play_music(MusicTrack::Defeated);
        }

        if self.config.gameplay.light_follows_player {
            let location = self.player.location();
            self.level_mut().light_follow_player(location);
        }
        Ok(())
    }

    fn run_spawner(&mut self) -> GameResult<()> {
        if self.spawn_timer.is_ready() {
            let gameplay = &self.config.gameplay;
            let speedup = u32::try_from(self.stats.difficulty / 2).unwrap_or(0);
            self.spawn_timer.trigger_for(gameplay.spawn_cooldown.saturating_sub(speedup));

            let angle = self.rng.gen_range(0..360_u16);
            let location = Mat4::rotation_about(Axis::Y, f32::from(angle))
                .apply_point(Vec3::new(gameplay.spawn_radius, gameplay.spawn_height, 0.0));
            let material = match gameplay.enemy_materials.len() {
                0 => self.kit.hurt_material.clone(),
                n => {
                    let alias = &gameplay.enemy_materials[self.rng.gen_range(0..n)];
                    self.assets.material(alias)
                }
            };
            let enemy = Enemy::spawn(self.stats.difficulty, &mut self.rng);
            log::debug!("Spawning enemy with {} life at {location:?}", enemy.life());

            self.main.add_enemy(enemy_node(&self.kit, material, enemy, location)?)?;
            let profile = self.profiles.get(SPAWNER_PROFILE);
            self.main.spawn_emitter(&profile, location, gameplay.spawn_emitter_life)?;
            self.audio.play_sound(&self.kit.cues.enemy_spawn);
        }
        self.spawn_timer.tick();
        Ok(())
    }

    fn apply_gravity(&mut self) {
        let could_jump = self.player.can_jump();
        let outcome = self.player.update_gravity(&self.main);
        if !could_jump && self.player.can_jump() {
            self.audio.play_sound(&self.kit.cues.land);
        }
        if outcome.enemy_contact {
            self.hurt_player();
        }
    }

    fn apply_input(&mut self, input: &PlayerInput) -> GameResult<()> {
        let sensitivity = self.config.gameplay.look_sensitivity;
        self.player.rotate(Vec3::new(input.look.y * sensitivity, input.look.x * sensitivity, 0.0));

        let mut direction = input.walk_direction();
        direction.y = 0.0;
        if let Some(direction) = direction.try_normalize(f32::EPSILON) {
            let outcome = self.player.try_to_move(direction * self.config.gameplay.move_speed, &self.main);
            if outcome.enemy_contact {
                self.hurt_player();
            }
        }

        if input.jump && self.player.jump() {
            self.audio.play_sound(&self.kit.cues.jump);
        }

        if input.fire && self.player.shoot() {
            let gameplay = &self.config.gameplay;
            let renderable = self.assets.renderable("bullet", "bullet")?;
            let bullet = Bullet::new(self.player.view_vector(), gameplay.bullet_life);
            self.main.add_bullet(bullet_node(renderable, bullet, self.player.location(), gameplay.bullet_scale))?;
            self.audio.play_sound(&self.kit.cues.shoot);
        }
        Ok(())
    }

    fn hurt_player(&mut self) {
        self.player.hurt(self.kit.contact_damage);
        if self.warning.try_trigger() {
            self.audio.play_sound(&self.kit.cues.warning);
        }
    }

    /// Write the per-frame uniforms and draw the live level
    pub fn draw(&mut self, renderer: &mut dyn Renderer) {
        renderer.set_uniform("V", UniformValue::Mat4(self.player.view_matrix()));
        Material::bind_sampler_uniforms(renderer);

        let graphics = &self.config.graphics;
        let toggles = [
            graphics.normal_mapping,
            graphics.specular_mapping,
            graphics.texture_mapping,
            graphics.self_illumination,
            graphics.use_lights,
            graphics.show_normals,
        ];
        for (name, enabled) in TOGGLE_UNIFORMS.into_iter().zip(toggles) {
            renderer.set_uniform(name, UniformValue::Int(i32::from(enabled)));
        }
        renderer.set_uniform("k_a", UniformValue::Vec3(graphics.ambient));

        let hurt = self.kit.hurt_material.clone();
        self.level_mut().draw(renderer, &hurt);
    }

    /// Live level
    pub fn level(&self) -> &Level {
        match self.current {
            LevelKind::Menu => &self.menu,
            LevelKind::Main => &self.main,
        }
    }

    fn level_mut(&mut self) -> &mut Level {
        match self.current {
            LevelKind::Menu => &mut self.menu,
            LevelKind::Main => &mut self.main,
        }
    }

    /// Which level is live
    pub fn current(&self) -> LevelKind {
        self.current
    }

    /// The player
    pub fn player(&self) -> &Player {
        &self.player
    }

    /// Mutable player, for scripted runs
    pub fn player_mut(&mut self) -> &mut Player {
        &mut self.player
    }

    /// Score so far
    pub fn stats(&self) -> &GameStats {
        &self.stats
    }

    /// Lost and back on the menu
    pub fn is_failed(&self) -> bool {
        self.failed
    }

    /// Audio output
    pub fn audio(&self) -> &A {
        &self.audio
    }
}

/// Every uniform [`Game::draw`] and the scene can write
pub fn shader_uniform_names() -> Vec<String> {
    let mut names: Vec<String> = ["V", "k_a", "k_s", "p", "numLights"].into_iter().map(String::from).collect();
    names.extend(TOGGLE_UNIFORMS.iter().map(|name| (*name).to_string()));
    names.extend(TextureSlot::ALL.iter().map(|slot| slot.sampler_uniform().to_string()));
    for i in 0..MAX_LIGHTS {
        names.push(format!("LightColor[{i}]"));
        names.push(format!("LightPosition_WS[{i}]"));
        names.push(format!("LightPower[{i}]"));
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::test_assets;
    use approx::assert_relative_eq;
    use keyframe_engine::audio::RecordingAudio;
    use keyframe_engine::render::{RecordingRenderer, UniformTable};
    use rand::SeedableRng;

    fn game() -> Game<RecordingAudio> {
        Game::new(GameConfig::default(), test_assets(), RecordingAudio::default(), StdRng::seed_from_u64(3)).unwrap()
    }

    #[test]
    fn test_starts_on_menu_with_music() {
        let game = game();
        assert_eq!(game.current(), LevelKind::Menu);
        assert_eq!(game.audio().music, vec![MusicTrack::Alive]);
        assert_relative_eq!(game.player().location(), Vec3::new(1.5, 3.0, 1.1));
        assert_relative_eq!(game.player().rotation().y, deg_to_rad(-45.0));
    }

    #[test]
    fn test_menu_tick_spawns_nothing() {
        let mut game = game();
        for _ in 0..200 {
            game.tick(&PlayerInput::default()).unwrap();
        }
        assert!(game.level().enemies().is_empty());
        assert_eq!(game.stats().timesteps_lasted, 0);
    }

    #[test]
    fn test_spawner_cadence() {
        let mut game = game();
        game.start();
        assert_eq!(game.audio().count("Blip_Select11.wav"), 1);
        assert_eq!(game.current(), LevelKind::Main);

        game.tick(&PlayerInput::default()).unwrap();
        assert_eq!(game.level().enemies().len(), 1);
        assert_eq!(game.audio().count("Randomize9.wav"), 1);

        for _ in 0..119 {
            game.tick(&PlayerInput::default()).unwrap();
        }
        assert_eq!(game.level().enemies().len(), 1);
        game.tick(&PlayerInput::default()).unwrap();
        assert_eq!(game.level().enemies().len(), 2);
    }

    #[test]
    fn test_fire_creates_bullet_and_cooldown() {
        let mut game = game();
        game.start();
        let fire = PlayerInput { fire: true, ..PlayerInput::default() };
        game.tick(&fire).unwrap();
        assert_eq!(game.level().bullets().len(), 1);
        assert_eq!(game.audio().count("Explosion3.wav"), 1);

        game.tick(&fire).unwrap();
        assert_eq!(game.audio().count("Explosion3.wav"), 1);
    }

    #[test]
    fn test_player_lands_once() {
        let mut game = game();
        game.start();
        for _ in 0..200 {
            game.tick(&PlayerInput::default()).unwrap();
        }
        assert!(game.player().can_jump());
        assert_eq!(game.audio().count("Explosion5.wav"), 1);

        game.tick(&PlayerInput { jump: true, ..PlayerInput::default() }).unwrap();
        assert!(!game.player().can_jump());
        assert_eq!(game.audio().count("Jump5.wav"), 1);
    }

    #[test]
    fn test_defeat_is_final() {
        let mut game = game();
        game.start();
        game.player_mut().hurt(1000.0);
        game.tick(&PlayerInput::default()).unwrap();

        assert!(game.is_failed());
        assert_eq!(game.current(), LevelKind::Menu);
        assert_eq!(game.audio().music.last(), Some(&MusicTrack::Defeated));

        game.start();
        assert_eq!(game.current(), LevelKind::Menu);
    }

    #[test]
    fn test_draw_writes_frame_uniforms() {
        let mut game = game();
        let mut renderer = RecordingRenderer::new(UniformTable::with_names(shader_uniform_names()));
        game.draw(&mut renderer);

        assert_eq!(renderer.uniforms.get("use_lights"), Some(UniformValue::Int(1)));
        assert_eq!(renderer.uniforms.get("show_normals"), Some(UniformValue::Int(0)));
        assert_eq!(renderer.uniforms.get("numLights"), Some(UniformValue::Int(1)));
        assert_eq!(renderer.uniforms.get("diffuseMap"), Some(UniformValue::Int(0)));
        assert!(!renderer.commands.is_empty());
    }
}
