use crate::config::TtsConfig;
use crate::error::SpeechError;
use anyhow::bail;

use super::elevenlabs::ElevenLabsSynthesizer;

pub trait SpeechSynthesizer {
    fn name(&self) -> &str;
    fn synthesize(&self, text: &str) -> Result<Vec<u8>, SpeechError>;
    /// File extension of the audio this backend returns.
    fn extension(&self) -> &str;
}

pub fn select_synthesizer(
    config: &TtsConfig,
    backend_override: Option<&str>,
) -> anyhow::Result<Box<dyn SpeechSynthesizer>> {
    let name = backend_override
        .or(config.backend.as_deref())
        .unwrap_or("elevenlabs");
    match name {
        "elevenlabs" => Ok(Box::new(ElevenLabsSynthesizer::from_config(config)?)),
        _ => bail!("unknown tts backend: {name}"),
    }
}
