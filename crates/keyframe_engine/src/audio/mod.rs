//! Audio boundary
//!
//! Gameplay code fires named cues and switches music tracks through
//! [`AudioSink`]; playback itself belongs to whatever implements it.
//! Everything here is single-threaded, like the rest of the tick.

mod sound_bank;

pub use sound_bank::SoundBank;

use thiserror::Error;

/// Audio errors
#[derive(Error, Debug)]
pub enum AudioError {
    /// Sound file missing or unreadable
    #[error("failed to load sound '{path}': {source}")]
    Load {
        /// Resolved file path
        path: String,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },
}

/// Background music selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MusicTrack {
    /// Looping track while the player is alive
    Alive,
    /// One-shot track after defeat
    Defeated,
}

impl MusicTrack {
    /// Whether the track repeats until replaced
    pub fn loops(self) -> bool {
        matches!(self, Self::Alive)
    }
}

/// Fire-and-forget audio output
pub trait AudioSink {
    /// Play a one-shot sound effect identified by its file name
    fn play_sound(&mut self, cue: &str);

    /// Replace the current music track
    fn play_music(&mut self, track: MusicTrack);
}

/// Sink that drops everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAudio;

impl AudioSink for NullAudio {
    fn play_sound(&mut self, cue: &str) {
        log::trace!("(muted) sound {cue}");
    }

    fn play_music(&mut self, track: MusicTrack) {
        log::trace!("(muted) music {track:?}");
    }
}

/// Sink that remembers every request, in order
#[derive(Debug, Default, Clone)]
pub struct RecordingAudio {
    /// Sound cues played
    pub sounds: Vec<String>,
    /// Music tracks started
    pub music: Vec<MusicTrack>,
}

impl RecordingAudio {
    /// How many times `cue` was played
    pub fn count(&self, cue: &str) -> usize {
        self.sounds.iter().filter(|s| *s == cue).count()
    }
}

impl AudioSink for RecordingAudio {
    fn play_sound(&mut self, cue: &str) {
        self.sounds.push(cue.to_string());
    }

    fn play_music(&mut self, track: MusicTrack) {
        self.music.push(track);
    }
}
