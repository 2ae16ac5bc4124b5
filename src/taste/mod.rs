pub mod qloo;

use crate::config::Config;
use crate::error::LookupError;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Style {
    Analytical,
    Emotional,
    Humorous,
    #[default]
    Balanced,
}

impl Style {
    /// Lenient parse: anything outside the four known styles is balanced.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "analytical" => Style::Analytical,
            "emotional" => Style::Emotional,
            "humorous" => Style::Humorous,
            _ => Style::Balanced,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Style::Analytical => "analytical",
            Style::Emotional => "emotional",
            Style::Humorous => "humorous",
            Style::Balanced => "balanced",
        }
    }
}

impl From<String> for Style {
    fn from(raw: String) -> Self {
        Style::parse(&raw)
    }
}

impl From<Style> for String {
    fn from(style: Style) -> Self {
        style.as_str().to_string()
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How commentary should be phrased for one listener.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TasteProfile {
    #[serde(default)]
    pub style: Style,
    #[serde(default)]
    pub focus: Vec<String>,
}

impl TasteProfile {
    pub fn new(style: Style, focus: &[&str]) -> Self {
        Self {
            style,
            focus: focus.iter().map(|f| f.to_string()).collect(),
        }
    }
}

pub trait TasteLookup {
    fn name(&self) -> &str;
    fn lookup(&self, label: &str) -> Result<TasteProfile, LookupError>;
}

/// Local profile table used whenever the taste service is unavailable.
pub fn static_profile(label: &str) -> TasteProfile {
    match Style::parse(label) {
        Style::Analytical => TasteProfile::new(Style::Analytical, &["stats", "tactics", "efficiency"]),
        Style::Emotional => {
            TasteProfile::new(Style::Emotional, &["passion", "drama", "player_narratives"])
        }
        Style::Humorous => TasteProfile::new(Style::Humorous, &["jokes", "lighthearted", "sarcasm"]),
        Style::Balanced => TasteProfile::new(Style::Balanced, &["general", "key_moments"]),
    }
}

pub fn select_lookup(config: &Config) -> Option<Box<dyn TasteLookup>> {
    if !config.taste.enabled {
        return None;
    }
    match qloo::QlooClient::new(&config.taste) {
        Ok(client) => Some(Box::new(client)),
        Err(err) => {
            tracing::debug!(error = %err, "taste service unavailable");
            None
        }
    }
}

/// Resolves a preference label, falling back to the static table on any
/// service failure.
pub fn resolve_profile(lookup: Option<&dyn TasteLookup>, label: &str) -> TasteProfile {
    let Some(lookup) = lookup else {
        tracing::info!(label, "no taste service configured; using static profile");
        return static_profile(label);
    };

    match lookup.lookup(label) {
        Ok(profile) => {
            tracing::debug!(service = lookup.name(), style = %profile.style, "taste profile resolved");
            profile
        }
        Err(err) => {
            tracing::warn!(service = lookup.name(), error = %err, "taste lookup failed; using static profile");
            static_profile(label)
        }
    }
}
