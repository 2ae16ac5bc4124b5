use crate::describe::describe;
use crate::events::{non_blank, GameEvent};
use crate::taste::{Style, TasteProfile};
use serde_json::Value;

const DEFAULT_FOCUS: &str = "general sports action";

/// Builds the full instruction sent to the text generator for one event.
///
/// Layout: framing, a context block with every known field, the plain
/// description, then the style directive. Pure; never fails.
pub fn build_prompt(event: &GameEvent, profile: &TasteProfile) -> String {
    let sport = non_blank(Some(event.sport.as_str())).unwrap_or("sports");
    let mut prompt = format!(
        "You are a sports commentator covering a live {sport} match. \
Use the real names given below and never use placeholders such as [Player Name]. \
If a detail is missing, leave it out instead of guessing.\n"
    );

    prompt.push_str("\nEvent context:\n");
    for (label, value) in context_lines(event) {
        prompt.push_str(&format!("- {label}: {value}\n"));
    }

    prompt.push_str(&format!("\nWhat happened: {}\n", describe(event)));

    prompt.push_str(&format!("\nStyle: {}\n", profile.style));
    prompt.push_str(&style_directive(profile));
    prompt.push('\n');
    prompt
}

/// Tone and focus instructions for a profile's style.
pub fn style_directive(profile: &TasteProfile) -> String {
    match profile.style {
        Style::Analytical => {
            let focus = if profile.focus.is_empty() {
                DEFAULT_FOCUS.to_string()
            } else {
                profile.focus.join(", ")
            };
            format!(
                "Provide highly analytical commentary for this event. Focus on {focus}. \
Discuss strategy, statistics, efficiency, or historical context. \
Keep it concise, professional, and insightful. Use a calm, composed tone."
            )
        }
        Style::Emotional => "Provide passionate and emotional commentary for this event. \
Focus on the drama, player narratives, and the impact on the game's momentum. \
Convey excitement, tension, or disappointment naturally. Use an enthusiastic, high-energy tone."
            .to_string(),
        Style::Humorous => "Provide lighthearted and humorous commentary for this event. \
Incorporate a playful tone, witty observations, or a relevant, funny analogy. \
Keep it entertaining and concise. Use a jovial, slightly cheeky tone."
            .to_string(),
        Style::Balanced => "Provide balanced commentary for this event. \
Focus on the key action, player involvement, and immediate impact. \
Keep it engaging and to the point. Use a standard, engaging sports commentary tone."
            .to_string(),
    }
}

fn context_lines(event: &GameEvent) -> Vec<(String, String)> {
    let mut lines = vec![
        ("Time".to_string(), format!("{}s", event.time)),
        ("Sport".to_string(), event.sport.clone()),
        ("Event type".to_string(), event.event_type.to_string()),
    ];

    let optional = [
        ("Player", &event.player),
        ("Team", &event.team),
        ("Outcome", &event.outcome),
        ("Fouled player", &event.fouled_player),
        ("Winning team", &event.winning_team),
        ("Score", &event.score),
    ];
    for (label, value) in optional {
        if let Some(value) = non_blank(value.as_deref()) {
            lines.push((label.to_string(), value.to_string()));
        }
    }

    for (key, value) in &event.metadata {
        let rendered = match value {
            Value::Null => continue,
            Value::String(text) => text.clone(),
            other => other.to_string(),
        };
        if let Some(value) = non_blank(Some(&rendered)) {
            lines.push((key.replace('_', " "), value.to_string()));
        }
    }

    lines.retain(|(_, value)| !value.trim().is_empty());
    lines
}
