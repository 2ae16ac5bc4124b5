pub mod elevenlabs;
pub mod provider;

use crate::audio::{cache::AudioCache, renderer};
use crate::config::{Config, PlaybackConfig};
use anyhow::Context;
use std::fs;
use std::path::{Path, PathBuf};

pub use provider::{select_synthesizer, SpeechSynthesizer};

/// Turns commentary into audio: cache lookup, synthesis, optional file
/// output and optional playback.
pub struct Speaker {
    synthesizer: Box<dyn SpeechSynthesizer>,
    settings: String,
    cache: Option<AudioCache>,
    playback: Option<PlaybackConfig>,
    audio_dir: Option<PathBuf>,
}

impl Speaker {
    pub fn new(synthesizer: Box<dyn SpeechSynthesizer>) -> Self {
        Self {
            synthesizer,
            settings: String::new(),
            cache: None,
            playback: None,
            audio_dir: None,
        }
    }

    pub fn from_config(
        config: &Config,
        backend_override: Option<&str>,
        audio_dir: Option<PathBuf>,
    ) -> anyhow::Result<Self> {
        let synthesizer = select_synthesizer(&config.tts, backend_override)?;
        let (max_size_bytes, max_entries) = config.cache_limits();
        let cache = match config.default_cache_dir() {
            Ok(dir) => Some(AudioCache::new(
                dir,
                synthesizer.extension(),
                max_size_bytes,
                max_entries,
            )),
            Err(err) => {
                tracing::debug!(error = ?err, "audio cache disabled");
                None
            }
        };

        let settings = serde_json::to_string(&config.tts).context("serialize tts config")?;
        let mut speaker = Self::new(synthesizer)
            .with_settings(&settings)
            .with_audio_dir(audio_dir);
        speaker.cache = cache;
        if config.playback.enabled {
            speaker.playback = Some(config.playback.clone());
        }
        Ok(speaker)
    }

    /// Synthesis settings folded into the cache key.
    pub fn with_settings(mut self, settings: &str) -> Self {
        self.settings = settings.to_string();
        self
    }

    pub fn with_audio_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.audio_dir = dir;
        self
    }

    pub fn with_cache(mut self, cache: AudioCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn name(&self) -> &str {
        self.synthesizer.name()
    }

    pub fn extension(&self) -> &str {
        self.synthesizer.extension()
    }

    pub fn synthesize(&self, text: &str) -> anyhow::Result<Vec<u8>> {
        let key = AudioCache::key(self.synthesizer.name(), &self.settings, text);
        if let Some(bytes) = self.cache.as_ref().and_then(|cache| cache.get(&key)) {
            tracing::debug!(backend = self.name(), "audio cache hit");
            return Ok(bytes);
        }

        let audio = self
            .synthesizer
            .synthesize(text)
            .with_context(|| format!("synthesize with {}", self.name()))?;

        if let Some(cache) = &self.cache {
            if let Err(err) = cache.put(&key, &audio) {
                tracing::debug!(error = ?err, "cache write failed");
            }
        }

        Ok(audio)
    }

    /// Synthesizes `text`, saves it as `{stem}.{ext}` when an audio directory
    /// is set, and plays it when playback is enabled. Returns the saved path.
    pub fn speak(&self, text: &str, stem: &str) -> anyhow::Result<Option<PathBuf>> {
        let audio = self.synthesize(text)?;
        let extension = self.synthesizer.extension();

        let saved = match &self.audio_dir {
            Some(dir) => Some(write_clip(dir, stem, extension, &audio)?),
            None => None,
        };

        if let Some(playback) = &self.playback {
            match &saved {
                Some(path) => renderer::play_file(path, playback)?,
                None => renderer::play_bytes(&audio, extension, playback)?,
            }
        }

        Ok(saved)
    }
}

fn write_clip(dir: &Path, stem: &str, extension: &str, audio: &[u8]) -> anyhow::Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    let path = dir.join(format!("{stem}.{extension}"));
    fs::write(&path, audio).with_context(|| format!("write {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SpeechError;
    use std::cell::Cell;
    use std::rc::Rc;

    struct CountingSynth {
        calls: Rc<Cell<usize>>,
    }

    impl SpeechSynthesizer for CountingSynth {
        fn name(&self) -> &str {
            "counting"
        }

        fn synthesize(&self, text: &str) -> Result<Vec<u8>, SpeechError> {
            self.calls.set(self.calls.get() + 1);
            Ok(text.as_bytes().to_vec())
        }

        fn extension(&self) -> &str {
            "wav"
        }
    }

    #[test]
    fn second_request_is_served_from_cache() {
        let calls = Rc::new(Cell::new(0));
        let dir = tempfile::tempdir().unwrap();
        let speaker = Speaker::new(Box::new(CountingSynth { calls: calls.clone() }))
            .with_cache(AudioCache::new(dir.path().to_path_buf(), "wav", 1024, 10));

        assert_eq!(speaker.synthesize("Goal!").unwrap(), b"Goal!");
        assert_eq!(speaker.synthesize("Goal!").unwrap(), b"Goal!");
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn changed_settings_miss_the_cache() {
        let calls = Rc::new(Cell::new(0));
        let dir = tempfile::tempdir().unwrap();
        let cache = AudioCache::new(dir.path().to_path_buf(), "wav", 1024, 10);

        let mut tts = crate::config::TtsConfig::default();
        let first = serde_json::to_string(&tts).unwrap();
        tts.stability = 0.3;
        let second = serde_json::to_string(&tts).unwrap();

        for settings in [&first, &first, &second] {
            Speaker::new(Box::new(CountingSynth { calls: calls.clone() }))
                .with_settings(settings)
                .with_cache(cache.clone())
                .synthesize("Goal!")
                .unwrap();
        }
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn speak_writes_clip_to_audio_dir() {
        let calls = Rc::new(Cell::new(0));
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("clips");
        let speaker =
            Speaker::new(Box::new(CountingSynth { calls })).with_audio_dir(Some(out.clone()));

        let saved = speaker.speak("Kick off", "000_kick_off").unwrap().unwrap();
        assert_eq!(saved, out.join("000_kick_off.wav"));
        assert_eq!(fs::read(saved).unwrap(), b"Kick off");
    }
}
