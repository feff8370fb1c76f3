//! Game error type

use keyframe_engine::animation::AnimationError;
use keyframe_engine::assets::AssetError;
use keyframe_engine::audio::AudioError;
use keyframe_engine::config::ConfigError;
use keyframe_engine::scene::SceneError;
use thiserror::Error;

/// Anything that can stop the game from setting up
#[derive(Error, Debug)]
pub enum GameError {
    /// Mesh or animation could not be built
    #[error(transparent)]
    Asset(#[from] AssetError),

    /// Renderable could not be attached to a model
    #[error(transparent)]
    Animation(#[from] AnimationError),

    /// Sound cue could not be loaded
    #[error(transparent)]
    Audio(#[from] AudioError),

    /// Configuration file could not be read or written
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Scene structure was inconsistent
    #[error(transparent)]
    Scene(#[from] SceneError),

    /// A level already holds the maximum number of lights
    #[error("level already has {0} lights")]
    TooManyLights(usize),
}

/// Result alias for game setup
pub type GameResult<T> = Result<T, GameError>;
