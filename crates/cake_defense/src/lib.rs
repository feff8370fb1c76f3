//! # Cake Defense
//!
//! A first-person arena game on [`keyframe_engine`]: spikes crawl in from the
//! walls towards a cake on a table and the player shoots them down before
//! they can reach it.
//!
//! [`game::Game`] owns both levels and runs one tick at a time against any
//! [`keyframe_engine::audio::AudioSink`] and
//! [`keyframe_engine::render::Renderer`], so the whole loop runs headless.

#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod assets;
pub mod config;
pub mod entities;
pub mod error;
pub mod game;
pub mod level;

pub use config::GameConfig;
pub use error::{GameError, GameResult};
pub use game::{Game, GameStats, LevelKind, PlayerInput};
pub use level::Level;
