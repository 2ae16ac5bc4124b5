use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use super::provider::{api_key_from_env, error_message, TextGenerator};
use crate::config::LlmConfig;
use crate::error::GenerationError;

const DEFAULT_MODEL: &str = "gemini-1.5-flash";
const DEFAULT_KEY_ENV: &str = "GEMINI_API_KEY";
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/";
const API_KEY_HEADER: &str = "x-goog-api-key";

/// `generateContent` backend.
pub struct GeminiGenerator {
    api_key: Option<String>,
    api_key_env: String,
    base_url: Url,
    model: String,
    max_tokens: u32,
    temperature: f32,
    client: Client,
}

impl std::fmt::Debug for GeminiGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiGenerator")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

impl GeminiGenerator {
    pub fn from_config(config: &LlmConfig) -> anyhow::Result<Self> {
        let api_key_env = config.api_key_env_or(DEFAULT_KEY_ENV);
        let api_key = api_key_from_env(&api_key_env);
        Self::new(api_key, api_key_env, config)
    }

    pub fn new(
        api_key: Option<String>,
        api_key_env: String,
        config: &LlmConfig,
    ) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        let base_url = match &config.base_url {
            Some(url) => crate::config::base_url(url),
            None => Url::parse(DEFAULT_BASE_URL)?,
        };

        Ok(Self {
            api_key,
            api_key_env,
            base_url,
            model: config.model_or(DEFAULT_MODEL),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            client,
        })
    }
}

impl TextGenerator for GeminiGenerator {
    fn name(&self) -> &str {
        "gemini"
    }

    fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| GenerationError::MissingApiKey(self.api_key_env.clone()))?;
        let url = self
            .base_url
            .join(&format!("models/{}:generateContent", self.model))
            .map_err(|e| GenerationError::Request(format!("invalid base url: {e}")))?;

        let request = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                max_output_tokens: self.max_tokens,
                temperature: self.temperature,
            },
        };

        tracing::debug!(model = %self.model, prompt_chars = prompt.len(), "requesting gemini content");
        let response = self
            .client
            .post(url)
            .header(API_KEY_HEADER, api_key)
            .json(&request)
            .send()
            .map_err(|e| GenerationError::Request(e.to_string()))?;

        let status = response.status();
        let body = response.text().unwrap_or_default();
        if !status.is_success() {
            return Err(GenerationError::Api {
                status: status.as_u16(),
                message: error_message(&body).unwrap_or(body),
            });
        }

        let parsed: GenerateResponse = serde_json::from_str(&body)
            .map_err(|e| GenerationError::Request(format!("failed to parse response: {e}")))?;

        // Blocked prompts come back as a candidate with no parts.
        parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .and_then(|content| content.parts.into_iter().find_map(|part| part.text))
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or(GenerationError::EmptyResponse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generator_for(server: &mockito::Server) -> GeminiGenerator {
        let config = LlmConfig {
            backend: "gemini".to_string(),
            base_url: Some(Url::parse(&format!("{}/", server.url())).unwrap()),
            timeout_seconds: 1,
            ..LlmConfig::default()
        };
        GeminiGenerator::new(Some("fake-key".to_string()), "TEST_KEY".to_string(), &config)
            .unwrap()
    }

    #[test]
    fn returns_first_candidate_text() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/models/gemini-1.5-flash:generateContent")
            .match_header("x-goog-api-key", "fake-key")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"candidates":[{"content":{"parts":[{"text":"Messi, from nowhere!"}]}}]}"#)
            .expect(1)
            .create();

        let generator = generator_for(&server);
        assert_eq!(generator.generate("prompt").unwrap(), "Messi, from nowhere!");
        mock.assert();
    }

    #[test]
    fn blocked_candidate_is_empty_response() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("POST", "/models/gemini-1.5-flash:generateContent")
            .with_status(200)
            .with_body(r#"{"candidates":[{"finishReason":"SAFETY"}]}"#)
            .create();

        let generator = generator_for(&server);
        assert!(matches!(
            generator.generate("prompt").unwrap_err(),
            GenerationError::EmptyResponse
        ));
    }

    #[test]
    fn server_error_carries_status() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("POST", "/models/gemini-1.5-flash:generateContent")
            .with_status(500)
            .create();

        let generator = generator_for(&server);
        assert!(matches!(
            generator.generate("prompt").unwrap_err(),
            GenerationError::Api { status: 500, .. }
        ));
    }
}
