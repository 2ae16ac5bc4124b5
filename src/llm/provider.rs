use crate::config::LlmConfig;
use crate::error::GenerationError;
use anyhow::bail;

use super::{gemini::GeminiGenerator, openai::OpenAiGenerator};

pub trait TextGenerator {
    fn name(&self) -> &str;
    fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

pub fn select_generator(
    config: &LlmConfig,
    backend_override: Option<&str>,
) -> anyhow::Result<Box<dyn TextGenerator>> {
    let name = backend_override.unwrap_or(config.backend.as_str());
    match name {
        "openai" => Ok(Box::new(OpenAiGenerator::from_config(config)?)),
        "gemini" => Ok(Box::new(GeminiGenerator::from_config(config)?)),
        _ => bail!("unknown llm backend: {name}"),
    }
}

/// Reads the key named by `env` without failing; a missing key is reported on
/// each generate call instead.
pub(crate) fn api_key_from_env(env: &str) -> Option<String> {
    std::env::var(env).ok().filter(|key| !key.trim().is_empty())
}

pub(crate) fn error_message(body: &str) -> Option<String> {
    let parsed = serde_json::from_str::<serde_json::Value>(body).ok()?;
    parsed
        .pointer("/error/message")
        .and_then(|m| m.as_str())
        .or_else(|| parsed.get("message").and_then(|m| m.as_str()))
        .map(ToOwned::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selects_configured_backend() {
        let config = LlmConfig::default();
        assert_eq!(select_generator(&config, None).unwrap().name(), "openai");
        assert_eq!(
            select_generator(&config, Some("gemini")).unwrap().name(),
            "gemini"
        );
    }

    #[test]
    fn rejects_unknown_backend() {
        let config = LlmConfig::default();
        assert!(select_generator(&config, Some("bard")).is_err());
    }

    #[test]
    fn extracts_nested_error_message() {
        assert_eq!(
            error_message(r#"{"error":{"message":"quota exceeded"}}"#).as_deref(),
            Some("quota exceeded")
        );
        assert_eq!(error_message("not json"), None);
    }
}
