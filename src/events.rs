use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventType {
    KickOff,
    ShotOnGoal,
    Foul,
    PossessionChange,
    Halftime,
    Penalty,
    Save,
    Corner,
    Substitution,
    EndGame,
    /// Any event type the describer has no template for, kept verbatim.
    Other(String),
}

impl EventType {
    pub const KNOWN: [EventType; 10] = [
        EventType::KickOff,
        EventType::ShotOnGoal,
        EventType::Foul,
        EventType::PossessionChange,
        EventType::Halftime,
        EventType::Penalty,
        EventType::Save,
        EventType::Corner,
        EventType::Substitution,
        EventType::EndGame,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            EventType::KickOff => "kick_off",
            EventType::ShotOnGoal => "shot_on_goal",
            EventType::Foul => "foul",
            EventType::PossessionChange => "possession_change",
            EventType::Halftime => "halftime",
            EventType::Penalty => "penalty",
            EventType::Save => "save",
            EventType::Corner => "corner",
            EventType::Substitution => "substitution",
            EventType::EndGame => "end_game",
            EventType::Other(raw) => raw,
        }
    }
}

impl From<String> for EventType {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "kick_off" => EventType::KickOff,
            "shot_on_goal" => EventType::ShotOnGoal,
            "foul" => EventType::Foul,
            "possession_change" => EventType::PossessionChange,
            "halftime" => EventType::Halftime,
            "penalty" => EventType::Penalty,
            "save" => EventType::Save,
            "corner" => EventType::Corner,
            "substitution" => EventType::Substitution,
            "end_game" => EventType::EndGame,
            _ => EventType::Other(raw),
        }
    }
}

impl From<&str> for EventType {
    fn from(raw: &str) -> Self {
        EventType::from(raw.to_string())
    }
}

impl From<EventType> for String {
    fn from(event_type: EventType) -> Self {
        event_type.as_str().to_string()
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One timestamped occurrence in a simulated match.
///
/// Only `event_type` is required; every other field may be absent and is
/// left out of rendered text when it is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameEvent {
    #[serde(default)]
    pub time: u64,
    #[serde(default = "default_sport")]
    pub sport: String,
    pub event_type: EventType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fouled_player: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winning_team: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<String>,
}

fn default_sport() -> String {
    "Football".to_string()
}

impl GameEvent {
    pub fn new(time: u64, event_type: impl Into<EventType>) -> Self {
        Self {
            time,
            sport: default_sport(),
            event_type: event_type.into(),
            player: None,
            team: None,
            outcome: None,
            fouled_player: None,
            winning_team: None,
            metadata: BTreeMap::new(),
            score: None,
        }
    }

    pub fn player(mut self, player: &str) -> Self {
        self.player = Some(player.to_string());
        self
    }

    pub fn team(mut self, team: &str) -> Self {
        self.team = Some(team.to_string());
        self
    }

    pub fn outcome(mut self, outcome: &str) -> Self {
        self.outcome = Some(outcome.to_string());
        self
    }

    pub fn fouled_player(mut self, fouled_player: &str) -> Self {
        self.fouled_player = Some(fouled_player.to_string());
        self
    }

    pub fn winning_team(mut self, team: &str) -> Self {
        self.winning_team = Some(team.to_string());
        self
    }

    pub fn meta(mut self, key: &str, value: &str) -> Self {
        self.metadata
            .insert(key.to_string(), Value::String(value.to_string()));
        self
    }

    pub fn score(mut self, score: &str) -> Self {
        self.score = Some(score.to_string());
        self
    }

    /// String-valued metadata only; numbers and nested values are `None`.
    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        non_blank(self.metadata.get(key).and_then(Value::as_str))
    }
}

/// Treats empty or whitespace-only strings the same as a missing field.
pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// The scripted demo match: eleven events from kick-off to the final whistle.
pub fn demo_match() -> Vec<GameEvent> {
    vec![
        GameEvent::new(0, EventType::KickOff).score("0-0"),
        GameEvent::new(10, EventType::ShotOnGoal)
            .player("Ronaldo")
            .team("Al Nassr")
            .outcome("scored")
            .meta("shot_type", "header")
            .score("1-0"),
        GameEvent::new(25, EventType::Foul)
            .player("Messi")
            .team("Inter Miami")
            .fouled_player("opponent")
            .outcome("yellow_card")
            .score("1-0"),
        GameEvent::new(40, EventType::PossessionChange)
            .team("Inter Miami")
            .score("1-0"),
        GameEvent::new(50, EventType::Save)
            .player("Goalkeeper")
            .team("Al Nassr")
            .score("1-0"),
        GameEvent::new(60, EventType::Halftime).score("1-0"),
        GameEvent::new(75, EventType::Penalty)
            .player("Ronaldo")
            .team("Al Nassr")
            .score("1-0"),
        GameEvent::new(80, EventType::ShotOnGoal)
            .player("Ronaldo")
            .team("Al Nassr")
            .outcome("scored")
            .meta("shot_type", "penalty_kick")
            .score("2-0"),
        GameEvent::new(95, EventType::Substitution)
            .team("Inter Miami")
            .meta("player_out", "Busquets")
            .meta("player_in", "New Midfielder")
            .score("2-0"),
        GameEvent::new(110, EventType::ShotOnGoal)
            .player("Messi")
            .team("Inter Miami")
            .outcome("scored")
            .meta("shot_type", "finesse")
            .score("2-1"),
        GameEvent::new(120, EventType::EndGame)
            .winning_team("Al Nassr")
            .score("2-1"),
    ]
}

/// Reads an event feed: a JSON array of events.
pub fn load_feed(path: &Path) -> anyhow::Result<Vec<GameEvent>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read event feed at {}", path.display()))?;
    let events: Vec<GameEvent> = serde_json::from_str(&raw)
        .with_context(|| format!("parse event feed at {}", path.display()))?;
    if events.is_empty() {
        anyhow::bail!("event feed {} contains no events", path.display());
    }
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_match_is_ordered() {
        let events = demo_match();
        assert_eq!(events.len(), 11);
        assert!(events.windows(2).all(|w| w[0].time < w[1].time));
    }

    #[test]
    fn unknown_event_type_is_kept_verbatim() {
        let event: GameEvent =
            serde_json::from_str(r#"{"time": 5, "event_type": "offside"}"#).unwrap();
        assert_eq!(event.event_type, EventType::Other("offside".to_string()));
        assert_eq!(event.event_type.as_str(), "offside");
        assert_eq!(event.sport, "Football");
    }

    #[test]
    fn event_type_is_required() {
        let parsed = serde_json::from_str::<GameEvent>(r#"{"time": 5}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn serializes_without_absent_fields() {
        let json = serde_json::to_value(GameEvent::new(60, EventType::Halftime)).unwrap();
        assert_eq!(json["event_type"], "halftime");
        assert!(json.get("player").is_none());
        assert!(json.get("metadata").is_none());
    }

    #[test]
    fn load_feed_keeps_structured_metadata() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(
            &mut file,
            br#"[{"time": 10, "event_type": "shot_on_goal",
                 "metadata": {"shot_type": "volley", "distance_m": 25}},
                {"time": 30, "event_type": "foul",
                 "metadata": {"card": {"color": "yellow"}}}]"#,
        )
        .unwrap();

        let events = load_feed(file.path()).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].metadata_value("shot_type"), Some("volley"));
        assert_eq!(events[0].metadata_value("distance_m"), None);
        assert_eq!(events[0].metadata["distance_m"], 25);
        assert_eq!(events[1].metadata["card"]["color"], "yellow");
    }

    #[test]
    fn load_feed_rejects_empty_array() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, b"[]").unwrap();
        assert!(load_feed(file.path()).is_err());
    }
}
