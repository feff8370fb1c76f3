//! Preloaded sound clips

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use super::{AudioError, AudioSink, MusicTrack};

/// Sound clips read from disk once and kept in memory
///
/// As a sink it only reports what it would play; handing the bytes to a
/// mixer is left to the platform layer.
#[derive(Debug, Default)]
pub struct SoundBank {
    root: PathBuf,
    clips: HashMap<String, Arc<[u8]>>,
    current_music: Option<MusicTrack>,
}

impl SoundBank {
    /// Bank resolving cue names against `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), ..Self::default() }
    }

    /// Clip for `cue`, reading it on first request
    pub fn load(&mut self, cue: &str) -> Result<Arc<[u8]>, AudioError> {
        if let Some(clip) = self.clips.get(cue) {
            return Ok(Arc::clone(clip));
        }

        let path = self.root.join(cue);
        log::info!("Loading sound {}", path.display());
        let bytes = std::fs::read(&path).map_err(|source| AudioError::Load { path: path.display().to_string(), source })?;
        let clip: Arc<[u8]> = bytes.into();
        self.clips.insert(cue.to_string(), Arc::clone(&clip));
        Ok(clip)
    }

    /// Load every cue up front; the first missing file aborts
    pub fn preload<'a>(&mut self, cues: impl IntoIterator<Item = &'a str>) -> Result<usize, AudioError> {
        let mut loaded = 0;
        for cue in cues {
            self.load(cue)?;
            loaded += 1;
        }
        Ok(loaded)
    }

    /// Already-loaded clip
    pub fn get(&self, cue: &str) -> Option<Arc<[u8]>> {
        self.clips.get(cue).cloned()
    }

    /// Track most recently requested
    pub fn current_music(&self) -> Option<MusicTrack> {
        self.current_music
    }
}

impl AudioSink for SoundBank {
    fn play_sound(&mut self, cue: &str) {
        match self.clips.get(cue) {
            Some(clip) => log::debug!("Playing {cue} ({} bytes)", clip.len()),
            None => log::warn!("Sound {cue} was not preloaded, skipping"),
        }
    }

    fn play_music(&mut self, track: MusicTrack) {
        log::info!("Music: {track:?} (looping: {})", track.loops());
        self.current_music = Some(track);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preload_and_play() {
        let dir = std::env::temp_dir().join(format!("keyframe_engine_sounds_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("hit.wav"), b"RIFF").unwrap();

        let mut bank = SoundBank::new(&dir);
        assert_eq!(bank.preload(["hit.wav"]).unwrap(), 1);
        assert_eq!(bank.get("hit.wav").unwrap().len(), 4);

        bank.play_sound("hit.wav");
        bank.play_music(MusicTrack::Defeated);
        assert_eq!(bank.current_music(), Some(MusicTrack::Defeated));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let mut bank = SoundBank::new("no/such/dir");
        assert!(matches!(bank.preload(["ghost.wav"]), Err(AudioError::Load { .. })));
    }
}
