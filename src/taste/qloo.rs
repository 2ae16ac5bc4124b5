use std::collections::HashMap;
use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;
use url::Url;

use super::{static_profile, Style, TasteLookup, TasteProfile};
use crate::config::TasteConfig;
use crate::error::LookupError;
use crate::llm::provider::api_key_from_env;

const API_KEY_HEADER: &str = "X-Api-Key";
const AFFINITY_THRESHOLD: f64 = 0.7;

/// Taste profiles from the Qloo audiences API.
pub struct QlooClient {
    api_key: String,
    base_url: Url,
    client: Client,
}

impl std::fmt::Debug for QlooClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QlooClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct AudienceResponse {
    #[serde(default)]
    affinity_scores: Option<HashMap<String, f64>>,
}

impl QlooClient {
    pub fn new(config: &TasteConfig) -> Result<Self, LookupError> {
        let api_key = api_key_from_env(&config.api_key_env)
            .ok_or_else(|| LookupError::MissingApiKey(config.api_key_env.clone()))?;
        Self::with_key(api_key, config)
    }

    pub fn with_key(api_key: String, config: &TasteConfig) -> Result<Self, LookupError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| LookupError::Request(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            api_key,
            base_url: crate::config::base_url(&config.base_url),
            client,
        })
    }

    fn endpoint(&self) -> Result<Url, LookupError> {
        self.base_url
            .join("v2/audiences/types")
            .map_err(|e| LookupError::Request(format!("invalid base url: {e}")))
    }
}

impl TasteLookup for QlooClient {
    fn name(&self) -> &str {
        "qloo"
    }

    fn lookup(&self, label: &str) -> Result<TasteProfile, LookupError> {
        tracing::debug!(label, "fetching taste profile");
        let response = self
            .client
            .get(self.endpoint()?)
            .header(API_KEY_HEADER, &self.api_key)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .map_err(|e| LookupError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Api {
                status: status.as_u16(),
            });
        }

        let body: AudienceResponse = response
            .json()
            .map_err(|e| LookupError::Parse(e.to_string()))?;

        Ok(profile_from_affinities(body.affinity_scores.as_ref()))
    }
}

fn profile_from_affinities(scores: Option<&HashMap<String, f64>>) -> TasteProfile {
    let score = |key: &str| {
        scores
            .and_then(|s| s.get(key).copied())
            .unwrap_or(0.0)
    };

    if score("analytical_content") > AFFINITY_THRESHOLD {
        TasteProfile::new(Style::Analytical, &["stats", "tactics"])
    } else if score("drama_narratives") > AFFINITY_THRESHOLD {
        TasteProfile::new(Style::Emotional, &["passion", "player_narratives"])
    } else if score("comedy_genres") > AFFINITY_THRESHOLD {
        TasteProfile::new(Style::Humorous, &["jokes", "lighthearted"])
    } else {
        static_profile("balanced")
    }
}
