//! Headless run of Cake Defense
//!
//! Loads `cake_defense.toml` (defaults when absent), builds the game from the
//! asset directory or from stand-in meshes, and plays a scripted session
//! against a recording renderer.

use std::process::ExitCode;

use cake_defense::assets::{placeholder_mesh, Assets};
use cake_defense::game::shader_uniform_names;
use cake_defense::{Game, GameConfig, GameResult, PlayerInput};
use keyframe_engine::audio::{AudioSink, NullAudio, SoundBank};
use keyframe_engine::config::Config;
use keyframe_engine::foundation::logging;
use keyframe_engine::foundation::math::Vec2;
use keyframe_engine::render::{RecordingRenderer, UniformTable};
use rand::rngs::StdRng;
use rand::SeedableRng;

const CONFIG_PATH: &str = "cake_defense.toml";
const SESSION_TICKS: u32 = 3600;

fn main() -> ExitCode {
    logging::init("info");
    log::info!("Starting Cake Defense");

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> GameResult<()> {
    let config = GameConfig::load_or_default(CONFIG_PATH)?;
    let rng = StdRng::from_entropy();

    if config.assets.root.is_dir() {
        let assets = Assets::load(&config.assets)?;
        let mut sounds = SoundBank::new(&config.assets.root);
        let loaded = sounds.preload(config.sounds.all_files())?;
        log::info!("Preloaded {loaded} sounds");
        play(Game::new(config, assets, sounds, rng)?)
    } else {
        log::warn!("No asset directory at {}, using stand-in meshes", config.assets.root.display());
        let assets = Assets::build(&config.assets, |file| Some(placeholder_mesh(file)))?;
        play(Game::new(config, assets, NullAudio, rng)?)
    }
}

/// Circle the cake while firing, turning a little every tick
fn scripted_input(tick: u32) -> PlayerInput {
    PlayerInput {
        look: Vec2::new(2.0, 0.0),
        forward: tick % 240 < 120,
        left: true,
        jump: tick % 90 == 0,
        fire: true,
        ..PlayerInput::default()
    }
}

fn play<A: AudioSink>(mut game: Game<A>) -> GameResult<()> {
    let mut renderer = RecordingRenderer::new(UniformTable::with_names(shader_uniform_names()));
    game.start();

    for tick in 0..SESSION_TICKS {
        game.tick(&scripted_input(tick))?;
        renderer.clear();
        game.draw(&mut renderer);

        if tick % 600 == 0 {
            log::info!(
                "tick {tick}: health {:.1}, {} enemies, {} draw calls",
                game.player().health(),
                game.level().enemies().len(),
                renderer.commands.len()
            );
        }
        if game.is_failed() {
            break;
        }
    }

    let stats = game.stats();
    log::info!(
        "Session over: {} kills, difficulty {}, lasted {} ticks",
        stats.kills,
        stats.difficulty,
        stats.timesteps_lasted
    );
    Ok(())
}
