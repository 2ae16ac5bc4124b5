use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use super::provider::{api_key_from_env, error_message, TextGenerator};
use crate::config::LlmConfig;
use crate::error::GenerationError;

const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
const DEFAULT_KEY_ENV: &str = "OPENAI_API_KEY";
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1/";

/// Chat-completions backend.
pub struct OpenAiGenerator {
    api_key: Option<String>,
    api_key_env: String,
    base_url: Url,
    model: String,
    max_tokens: u32,
    temperature: f32,
    client: Client,
}

impl std::fmt::Debug for OpenAiGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiGenerator")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiGenerator {
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

impl TextGenerator for OpenAiGenerator {
    fn name(&self) -> &str {
        "openai"
    }

    fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| GenerationError::MissingApiKey(self.api_key_env.clone()))?;
        let url = self
            .base_url
            .join("chat/completions")
            .map_err(|e| GenerationError::Request(format!("invalid base url: {e}")))?;

        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        tracing::debug!(model = %self.model, prompt_chars = prompt.len(), "requesting chat completion");
        let response = self
            .client
            .post(url)
            .bearer_auth(api_key)
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

        let parsed: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| GenerationError::Request(format!("failed to parse response: {e}")))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or(GenerationError::EmptyResponse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generator_for(server: &mockito::Server, key: Option<&str>) -> OpenAiGenerator {
        let config = LlmConfig {
            base_url: Some(Url::parse(&format!("{}/", server.url())).unwrap()),
            timeout_seconds: 1,
            ..LlmConfig::default()
        };
        OpenAiGenerator::new(key.map(str::to_string), "TEST_KEY".to_string(), &config).unwrap()
    }

    #[test]
    fn returns_trimmed_completion() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer fake-key")
            .match_body(mockito::Matcher::PartialJsonString(
                r#"{"model": "gpt-3.5-turbo", "max_tokens": 100}"#.to_string(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[{"message":{"role":"assistant","content":"  What a header!  "}}]}"#)
            .expect(1)
            .create();

        let generator = generator_for(&server, Some("fake-key"));
        assert_eq!(generator.generate("prompt").unwrap(), "What a header!");
        mock.assert();
    }

    #[test]
    fn missing_key_fails_without_request() {
        let mut server = mockito::Server::new();
        let mock = server.mock("POST", "/chat/completions").expect(0).create();

        let generator = generator_for(&server, None);
        let err = generator.generate("prompt").unwrap_err();
        assert!(matches!(err, GenerationError::MissingApiKey(ref env) if env == "TEST_KEY"));
        mock.assert();
    }

    #[test]
    fn rate_limit_is_an_api_error() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(429)
            .with_body(r#"{"error":{"message":"Rate limit reached"}}"#)
            .create();

        let generator = generator_for(&server, Some("fake-key"));
        match generator.generate("prompt").unwrap_err() {
            GenerationError::Api { status, message } => {
                assert_eq!(status, 429);
                assert_eq!(message, "Rate limit reached");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_choices_are_an_error() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices":[]}"#)
            .create();

        let generator = generator_for(&server, Some("fake-key"));
        assert!(matches!(
            generator.generate("prompt").unwrap_err(),
            GenerationError::EmptyResponse
        ));
    }

    #[test]
    fn base_url_without_trailing_slash_keeps_version_segment() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices":[{"message":{"role":"assistant","content":"Goal!"}}]}"#)
            .expect(1)
            .create();

        let config = LlmConfig {
            base_url: Some(Url::parse(&format!("{}/v1", server.url())).unwrap()),
            timeout_seconds: 1,
            ..LlmConfig::default()
        };
        let generator =
            OpenAiGenerator::new(Some("fake-key".to_string()), "TEST_KEY".to_string(), &config)
                .unwrap();
        assert_eq!(generator.generate("prompt").unwrap(), "Goal!");
        mock.assert();
    }
}
