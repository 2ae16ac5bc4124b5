use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use serde::Serialize;
use url::Url;

use super::provider::SpeechSynthesizer;
use crate::config::TtsConfig;
use crate::error::SpeechError;

const API_KEY_HEADER: &str = "xi-api-key";

pub struct ElevenLabsSynthesizer {
    api_key: Option<String>,
    api_key_env: String,
    base_url: Url,
    voice_id: String,
    model_id: String,
    stability: f32,
    similarity_boost: f32,
    client: Client,
}

impl std::fmt::Debug for ElevenLabsSynthesizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElevenLabsSynthesizer")
            .field("base_url", &self.base_url)
            .field("voice_id", &self.voice_id)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: VoiceSettings,
}

#[derive(Debug, Serialize)]
struct VoiceSettings {
    stability: f32,
    similarity_boost: f32,
}

impl ElevenLabsSynthesizer {
    pub fn from_config(config: &TtsConfig) -> anyhow::Result<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty());
        Self::new(api_key, config)
    }

    pub fn new(api_key: Option<String>, config: &TtsConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            api_key,
            api_key_env: config.api_key_env.clone(),
            base_url: crate::config::base_url(&config.base_url),
            voice_id: config.voice_id.clone(),
            model_id: config.model_id.clone(),
            stability: config.stability,
            similarity_boost: config.similarity_boost,
            client,
        })
    }
}

impl SpeechSynthesizer for ElevenLabsSynthesizer {
    fn name(&self) -> &str {
        "elevenlabs"
    }

    fn synthesize(&self, text: &str) -> Result<Vec<u8>, SpeechError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| SpeechError::MissingApiKey(self.api_key_env.clone()))?;
        let url = self
            .base_url
            .join(&format!("text-to-speech/{}", self.voice_id))
            .map_err(|e| SpeechError::Request(format!("invalid base url: {e}")))?;

        let request = SpeechRequest {
            text,
            model_id: &self.model_id,
            voice_settings: VoiceSettings {
                stability: self.stability,
                similarity_boost: self.similarity_boost,
            },
        };

        tracing::debug!(voice = %self.voice_id, chars = text.len(), "requesting speech");
        let response = self
            .client
            .post(url)
            .header(API_KEY_HEADER, api_key)
            .header(ACCEPT, "audio/mpeg")
            .json(&request)
            .send()
            .map_err(|e| SpeechError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().unwrap_or_default();
            return Err(SpeechError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let audio = response
            .bytes()
            .map_err(|e| SpeechError::Request(e.to_string()))?;
        if audio.is_empty() {
            return Err(SpeechError::EmptyAudio);
        }
        Ok(audio.to_vec())
    }

    fn extension(&self) -> &str {
        "mp3"
    }
}
