//! Game configuration
//!
//! Every tunable the game reads lives here, with defaults that reproduce the
//! stock game. Files may override any subset; missing fields keep their
//! defaults.

use std::collections::BTreeMap;
use std::path::PathBuf;

use keyframe_engine::config::Config;
use keyframe_engine::foundation::math::Vec3;
use keyframe_engine::render::{Material, MaterialTextures};
use serde::{Deserialize, Serialize};

use crate::entities::{MeanVar, ParticleSettings};

/// Root configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Spawning, movement and weapon tuning
    pub gameplay: GameplayConfig,
    /// Player physics and placement
    pub player: PlayerConfig,
    /// Shader toggles written every frame
    pub graphics: GraphicsConfig,
    /// Sound cue file names
    pub sounds: SoundCues,
    /// Meshes, animations and materials
    pub assets: AssetManifest,
    /// Emitter profiles by name
    pub particles: BTreeMap<String, ParticleSettings>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            gameplay: GameplayConfig::default(),
            player: PlayerConfig::default(),
            graphics: GraphicsConfig::default(),
            sounds: SoundCues::default(),
            assets: AssetManifest::default(),
            particles: stock_particles(),
        }
    }
}

impl Config for GameConfig {}

/// Gameplay tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameplayConfig {
    /// Ticks between enemy spawns at difficulty 0; each kill shortens it by half a tick
    pub spawn_cooldown: u32,
    /// Enemies appear on a ring of this radius around the cake
    pub spawn_radius: f32,
    /// Height enemies appear at
    pub spawn_height: f32,
    /// Lifetime of the emitter marking a spawn
    pub spawn_emitter_life: i32,
    /// Enemy material aliases, one picked at random per enemy
    pub enemy_materials: Vec<String>,
    /// Health lost per tick of enemy contact
    pub contact_damage: f64,
    /// Minimum ticks between contact warnings
    pub warning_cooldown: u32,
    /// Distance walked per tick
    pub move_speed: f32,
    /// Radians turned per pixel of mouse motion
    pub look_sensitivity: f32,
    /// Ticks a bullet flies
    pub bullet_life: i32,
    /// Uniform scale of bullet models
    pub bullet_scale: f32,
    /// Health never ends the game
    pub cheats: bool,
    /// The first light tracks the player
    pub light_follows_player: bool,
}

impl Default for GameplayConfig {
    fn default() -> Self {
        Self {
            spawn_cooldown: 120,
            spawn_radius: 19.0,
            spawn_height: -3.0,
            spawn_emitter_life: 60,
            enemy_materials: (0..7).map(|i| format!("spike{i}")).collect(),
            contact_damage: 0.1,
            warning_cooldown: 15,
            move_speed: 0.1,
            look_sensitivity: 0.01,
            bullet_life: 300,
            bullet_scale: 0.25,
            cheats: false,
            light_follows_player: false,
        }
    }
}

/// Player physics and placement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Starting health
    pub health: f64,
    /// Ticks between shots
    pub shoot_cooldown: u32,
    /// Fastest fall per tick (negative)
    pub terminal_velocity: f32,
    /// Downward acceleration per tick
    pub gravity_acceleration: f32,
    /// Upward velocity a jump starts with
    pub jump_velocity: f32,
    /// Half size of the collision box
    pub half_extents: Vec3,
    /// Where the player stands in the arena
    pub main_location: Vec3,
    /// Where the camera sits on the menu
    pub menu_location: Vec3,
    /// Menu camera pitch and yaw, in degrees
    pub menu_rotation_degrees: Vec3,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            health: 100.0,
            shoot_cooldown: 5,
            terminal_velocity: -0.5,
            gravity_acceleration: 0.01,
            jump_velocity: 0.25,
            half_extents: Vec3::new(0.5, 1.0, 0.5),
            main_location: Vec3::new(0.0, 2.0, 0.0),
            menu_location: Vec3::new(1.5, 3.0, 1.1),
            menu_rotation_degrees: Vec3::new(45.0, -45.0, 0.0),
        }
    }
}

/// Shader feature toggles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphicsConfig {
    /// Sample normal maps
    pub normal_mapping: bool,
    /// Sample specular maps
    pub specular_mapping: bool,
    /// Sample diffuse textures
    pub texture_mapping: bool,
    /// Sample self-illumination maps
    pub self_illumination: bool,
    /// Apply point lights
    pub use_lights: bool,
    /// Render normals as colors
    pub show_normals: bool,
    /// Scene ambient color `k_a`
    pub ambient: Vec3,
}

impl Default for GraphicsConfig {
    fn default() -> Self {
        Self {
            normal_mapping: true,
            specular_mapping: true,
            texture_mapping: true,
            self_illumination: true,
            use_lights: true,
            show_normals: false,
            ambient: Vec3::zeros(),
        }
    }
}

/// Sound file names, relative to the asset root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SoundCues {
    /// Enemy touching the player or the cake
    pub warning: String,
    /// Enemy shot down
    pub enemy_death: String,
    /// Enemy shot but alive
    pub enemy_hurt: String,
    /// Enemy appearing
    pub enemy_spawn: String,
    /// Player landing
    pub land: String,
    /// Player jumping
    pub jump: String,
    /// Weapon fired
    pub shoot: String,
    /// Menu button
    pub select: String,
    /// Cues loaded before the first tick
    pub preload: Vec<String>,
    /// Looping track while alive
    pub music_alive: String,
    /// Track after defeat
    pub music_defeated: String,
}

impl Default for SoundCues {
    fn default() -> Self {
        Self {
            warning: "Laser_Shoot3.wav".into(),
            enemy_death: "Laser_Shoot11.wav".into(),
            enemy_hurt: "Hit_Hurt13.wav".into(),
            enemy_spawn: "Randomize9.wav".into(),
            land: "Explosion5.wav".into(),
            jump: "Jump5.wav".into(),
            shoot: "Explosion3.wav".into(),
            select: "Blip_Select11.wav".into(),
            preload: ["Jump5.wav", "Explosion5.wav", "Explosion3.wav", "Explosion8.wav"].map(String::from).to_vec(),
            music_alive: "The Lift.ogg".into(),
            music_defeated: "funeral.ogg".into(),
        }
    }
}

impl SoundCues {
    /// Every file the game may ask the sound bank for
    pub fn all_files(&self) -> Vec<&str> {
        let mut files: Vec<&str> = [
            &self.warning,
            &self.enemy_death,
            &self.enemy_hurt,
            &self.enemy_spawn,
            &self.land,
            &self.jump,
            &self.shoot,
            &self.select,
            &self.music_alive,
            &self.music_defeated,
        ]
        .into_iter()
        .chain(&self.preload)
        .map(String::as_str)
        .collect();
        files.sort_unstable();
        files.dedup();
        files
    }
}

/// One keyframe of an animation definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameDef {
    /// Mesh file
    pub file: String,
    /// Ticks the frame is held
    pub hold: u32,
}

/// Animation alias and its keyframes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimationDef {
    /// Alias used by the game
    pub alias: String,
    /// Keyframes in order
    pub frames: Vec<FrameDef>,
}

impl AnimationDef {
    fn new(alias: &str, frames: &[(&str, u32)]) -> Self {
        Self {
            alias: alias.into(),
            frames: frames.iter().map(|&(file, hold)| FrameDef { file: file.into(), hold }).collect(),
        }
    }
}

/// Where assets live and how they are assembled
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetManifest {
    /// Directory mesh, texture and sound names are relative to
    pub root: PathBuf,
    /// Animations by alias
    pub animations: Vec<AnimationDef>,
    /// Materials by alias
    pub materials: Vec<Material>,
}

impl Default for AssetManifest {
    fn default() -> Self {
        Self { root: PathBuf::from("Assets"), animations: stock_animations(), materials: stock_materials() }
    }
}

impl AssetManifest {
    /// Every mesh file referenced by an animation, without duplicates
    pub fn mesh_files(&self) -> Vec<&str> {
        let mut files: Vec<&str> = self.animations.iter().flat_map(|a| a.frames.iter().map(|f| f.file.as_str())).collect();
        files.sort_unstable();
        files.dedup();
        files
    }
}

fn stock_animations() -> Vec<AnimationDef> {
    vec![
        AnimationDef::new("spike_spawn", &[("spike0.obj", 60), ("spike1.obj", 1)]),
        AnimationDef::new("spike_living", &[("spike1.obj", 11), ("spike2.obj", 11)]),
        AnimationDef::new("spike_dying", &[("spike1.obj", 30), ("spike0.obj", 1)]),
        AnimationDef::new("testAnim3", &[("cube.obj", 100)]),
        AnimationDef::new("bullet", &[("bullet.obj", 1)]),
        AnimationDef::new("table", &[("table.obj", 1)]),
        AnimationDef::new("cake", &[("cake.obj", 1)]),
        AnimationDef::new("pillar", &[("pillar.obj", 1)]),
    ]
}

fn material(name: &str, textures: [&str; 4], specular: f32, coefficient: f32) -> Material {
    let [diffuse, specular_map, normal, self_illumination] = textures.map(String::from);
    Material {
        name: name.into(),
        textures: MaterialTextures { diffuse, specular: specular_map, normal, self_illumination },
        specular_color: Vec3::repeat(specular),
        specular_coefficient: coefficient,
    }
}

fn stock_materials() -> Vec<Material> {
    const SPEC: f32 = 0.3;
    let mut materials = vec![
        material("wall0", ["wall.bmp", "randspec.bmp", "wall_normal.bmp", "nospec.bmp"], 0.1, 100.0),
        material("wall1", ["wall2.bmp", "randspec.bmp", "wall2-normal.bmp", "nospec.bmp"], 0.1, 100.0),
        material("floor0", ["floor.bmp", "fullspec.bmp", "floor-normal.bmp", "nospec.bmp"], 0.5, 50.0),
        material("floor1", ["floor2.bmp", "fullspec.bmp", "floor-normal.bmp", "nospec.bmp"], 0.5, 50.0),
        material("ceiling0", ["ceil.bmp", "fullspec.bmp", "ceil-normal.bmp", "nospec.bmp"], 0.1, 10.0),
        material("ceiling1", ["ceil2.bmp", "fullspec.bmp", "ceil-normal.bmp", "nospec.bmp"], 0.1, 10.0),
    ];

    let spikes = ["spike", "spike_orange", "spike_yellow", "spike_green", "spike_cyan", "spike_blue", "spike_purple"];
    for (i, texture) in spikes.iter().enumerate() {
        let diffuse = format!("{texture}.bmp");
        materials.push(material(&format!("spike{i}"), [diffuse.as_str(), "fullspec.bmp", "flatnormal.bmp", "spike_illum.bmp"], SPEC, 100.0));
    }

    materials.extend([
        material("hurt", ["fullspec.bmp", "nospec.bmp", "flatnormal.bmp", "fullspec.bmp"], SPEC, 100.0),
        material("bullet", ["orange.bmp", "fullspec.bmp", "flatnormal.bmp", "fullspec.bmp"], SPEC, 100.0),
        material("table", ["wood.bmp", "nospec.bmp", "flatnormal.bmp", "nospec.bmp"], SPEC, 100.0),
        material("cake", ["cake.bmp", "nospec.bmp", "flatnormal.bmp", "nospec.bmp"], SPEC, 100.0),
        material("spawner_particle", ["cyan.bmp", "nospec.bmp", "flatnormal.bmp", "fullspec.bmp"], SPEC, 100.0),
    ]);
    materials
}

fn stock_particles() -> BTreeMap<String, ParticleSettings> {
    let scale = MeanVar::<Vec3>::fixed(Vec3::repeat(0.1));
    let burst = |material: &str, number, life, velocity_var: f32, acceleration| ParticleSettings {
        model: "bullet".into(),
        material: material.into(),
        number,
        life,
        velocity: MeanVar::new(Vec3::zeros(), Vec3::repeat(velocity_var)),
        acceleration: MeanVar::<Vec3>::fixed(acceleration),
        scale,
        ..ParticleSettings::default()
    };

    BTreeMap::from([
        ("impact".to_string(), burst("bullet", MeanVar::new(20.0, 1.0), MeanVar::new(15.0, 5.0), 0.1, Vec3::zeros())),
        ("trail".to_string(), burst("bullet", MeanVar::new(0.3, 0.5), MeanVar::new(15.0, 1.0), 0.04, Vec3::repeat(-0.001))),
        ("spawner".to_string(), burst("spawner_particle", MeanVar::new(5.0, 1.0), MeanVar::<f32>::fixed(60.0), 0.04, Vec3::zeros())),
    ])
}
