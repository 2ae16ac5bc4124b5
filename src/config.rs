use anyhow::{bail, Context};
use directories::BaseDirs;
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub taste: TasteConfig,
    #[serde(default)]
    pub tts: TtsConfig,
    #[serde(default)]
    pub playback: PlaybackConfig,
    #[serde(default)]
    pub pacing: PacingConfig,
    #[serde(default)]
    pub default_profile: Option<String>,
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
    #[serde(default)]
    pub cache_max_mb: Option<u64>,
    #[serde(default)]
    pub cache_max_entries: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_llm_backend")]
    pub backend: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub api_key_env: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_base_url")]
    pub base_url: Option<Url>,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TasteConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_taste_url", deserialize_with = "deserialize_base_url")]
    pub base_url: Url,
    #[serde(default = "default_taste_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TtsConfig {
    #[serde(default)]
    pub backend: Option<String>,
    #[serde(default = "default_voice_id")]
    pub voice_id: String,
    #[serde(default = "default_tts_model")]
    pub model_id: String,
    #[serde(default = "default_voice_setting")]
    pub stability: f32,
    #[serde(default = "default_voice_setting")]
    pub similarity_boost: f32,
    #[serde(default = "default_tts_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_tts_url", deserialize_with = "deserialize_base_url")]
    pub base_url: Url,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_player")]
    pub command: String,
    #[serde(default = "default_volume")]
    pub volume: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PacingConfig {
    #[serde(default = "default_enabled")]
    pub realtime: bool,
    #[serde(default = "default_speed")]
    pub speed: f64,
}

pub const LLM_BACKENDS: [&str; 2] = ["openai", "gemini"];
pub const TTS_BACKENDS: [&str; 1] = ["elevenlabs"];

impl Config {
    /// Explicit path first, then `./matchcast.json`, then the user config dir.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from_path(path);
        }

        let project = Self::project_path();
        if project.exists() {
            return Self::load_from_path(&project);
        }

        if let Ok(path) = Self::default_path() {
            if path.exists() {
                return Self::load_from_path(&path);
            }
        }

        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config at {}", path.display()))?;
        let config: Config = serde_json::from_str(&raw)
            .with_context(|| format!("parse config at {}", path.display()))?;
        tracing::debug!(path = %path.display(), "config loaded");
        Ok(config)
    }

    pub fn init_default() -> anyhow::Result<PathBuf> {
        let path = Self::default_path()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let config = Self::default();
        fs::write(&path, serde_json::to_string_pretty(&config)?)?;
        Ok(path)
    }

    pub fn default_path() -> anyhow::Result<PathBuf> {
        let base = BaseDirs::new().context("unable to resolve home directory")?;
        Ok(base.config_dir().join("matchcast").join("config.json"))
    }

    pub fn default_cache_dir(&self) -> anyhow::Result<PathBuf> {
        if let Some(dir) = &self.cache_dir {
            return Ok(dir.clone());
        }
        let base = BaseDirs::new().context("unable to resolve home directory")?;
        Ok(base.cache_dir().join("matchcast"))
    }

    pub fn cache_limits(&self) -> (u64, usize) {
        let max_mb = self.cache_max_mb.unwrap_or(100);
        let max_entries = self.cache_max_entries.unwrap_or(500);
        (max_mb * 1024 * 1024, max_entries)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if !LLM_BACKENDS.contains(&self.llm.backend.as_str()) {
            bail!("unsupported llm backend: {}", self.llm.backend);
        }

        if self.llm.max_tokens == 0 {
            bail!("llm.max_tokens must be greater than 0");
        }

        if !(0.0..=2.0).contains(&self.llm.temperature) {
            bail!("llm.temperature must be between 0.0 and 2.0");
        }

        if let Some(backend) = &self.tts.backend {
            if !TTS_BACKENDS.contains(&backend.as_str()) {
                bail!("unsupported tts backend: {backend}");
            }
        }

        for (name, value) in [
            ("tts.stability", self.tts.stability),
            ("tts.similarity_boost", self.tts.similarity_boost),
            ("playback.volume", self.playback.volume),
        ] {
            if !(0.0..=1.0).contains(&value) {
                bail!("{name} must be between 0.0 and 1.0");
            }
        }

        if !(self.pacing.speed.is_finite() && self.pacing.speed > 0.0) {
            bail!("pacing.speed must be a positive number");
        }

        if self.playback.command.trim().is_empty() {
            bail!("playback.command must not be empty");
        }

        if let Some(max_mb) = self.cache_max_mb {
            if max_mb == 0 {
                bail!("cache_max_mb must be greater than 0");
            }
        }

        if let Some(max_entries) = self.cache_max_entries {
            if max_entries == 0 {
                bail!("cache_max_entries must be greater than 0");
            }
        }

        Ok(())
    }

    fn project_path() -> PathBuf {
        PathBuf::from("matchcast.json")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm: LlmConfig::default(),
            taste: TasteConfig::default(),
            tts: TtsConfig::default(),
            playback: PlaybackConfig::default(),
            pacing: PacingConfig::default(),
            default_profile: None,
            cache_dir: None,
            cache_max_mb: Some(100),
            cache_max_entries: Some(500),
        }
    }
}

impl LlmConfig {
    pub fn model_or(&self, fallback: &str) -> String {
        self.model.clone().unwrap_or_else(|| fallback.to_string())
    }

    pub fn api_key_env_or(&self, fallback: &str) -> String {
        self.api_key_env
            .clone()
            .unwrap_or_else(|| fallback.to_string())
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            backend: default_llm_backend(),
            model: None,
            api_key_env: None,
            base_url: None,
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl Default for TasteConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            base_url: default_taste_url(),
            api_key_env: default_taste_key_env(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            backend: Some("elevenlabs".to_string()),
            voice_id: default_voice_id(),
            model_id: default_tts_model(),
            stability: default_voice_setting(),
            similarity_boost: default_voice_setting(),
            api_key_env: default_tts_key_env(),
            base_url: default_tts_url(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            command: default_player(),
            volume: default_volume(),
        }
    }
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            realtime: default_enabled(),
            speed: default_speed(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_llm_backend() -> String {
    "openai".to_string()
}

fn default_max_tokens() -> u32 {
    100
}

fn default_temperature() -> f32 {
    0.7
}

fn default_timeout_seconds() -> u64 {
    15
}

fn default_taste_url() -> Url {
    Url::parse("https://hackathon.api.qloo.com/").expect("static url")
}

fn default_taste_key_env() -> String {
    "QLOO_API_KEY".to_string()
}

fn default_voice_id() -> String {
    "21m00Tcm4TlvDq8ikWAM".to_string()
}

fn default_tts_model() -> String {
    "eleven_monolingual_v1".to_string()
}

fn default_voice_setting() -> f32 {
    0.75
}

fn default_tts_key_env() -> String {
    "ELEVENLABS_API_KEY".to_string()
}

fn default_tts_url() -> Url {
    Url::parse("https://api.elevenlabs.io/v1/").expect("static url")
}

fn default_player() -> String {
    if cfg!(target_os = "macos") {
        "afplay".to_string()
    } else {
        "ffplay".to_string()
    }
}

fn default_volume() -> f32 {
    0.8
}

fn default_speed() -> f64 {
    1.0
}

/// Endpoint paths are joined onto base URLs, which only keeps the last
/// segment when the path ends in `/`.
pub(crate) fn base_url(url: &Url) -> Url {
    let mut url = url.clone();
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

fn deserialize_base_url<'de, D>(deserializer: D) -> Result<Url, D::Error>
where
    D: Deserializer<'de>,
{
    Url::deserialize(deserializer).map(|url| base_url(&url))
}

fn deserialize_optional_base_url<'de, D>(deserializer: D) -> Result<Option<Url>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Url>::deserialize(deserializer)?.map(|url| base_url(&url)))
}
