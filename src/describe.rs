use crate::events::{non_blank, EventType, GameEvent};

/// Renders what happened in an event as plain sentences, independent of any
/// commentary style. Missing fields drop the clause that would mention them.
pub fn describe(event: &GameEvent) -> String {
    let player = non_blank(event.player.as_deref());
    let team = non_blank(event.team.as_deref());
    let score = non_blank(event.score.as_deref());

    match &event.event_type {
        EventType::KickOff => {
            let mut text = "The game kicks off!".to_string();
            if let Some(score) = score {
                text.push_str(&format!(" The score is {score}."));
            }
            text
        }
        EventType::ShotOnGoal if event.outcome.as_deref() == Some("scored") => {
            let mut text = format!("{} scores a magnificent goal!", actor(player, team));
            if let Some(score) = score {
                text.push_str(&format!(" The score is now {score}."));
            }
            if let Some(shot_type) = event.metadata_value("shot_type") {
                text.push_str(&format!(" It was a brilliant {} shot.", humanize(shot_type)));
            }
            text
        }
        EventType::ShotOnGoal => {
            let mut text = format!(
                "{} takes a shot, but it's missed or saved!",
                actor(player, team)
            );
            if let Some(score) = score {
                text.push_str(&format!(" The score remains {score}."));
            }
            text
        }
        EventType::Foul => {
            let mut text = match (player, team) {
                (None, None) => "A foul is committed".to_string(),
                _ => format!("A foul committed by {}", actor(player, team)),
            };
            if let Some(fouled) = non_blank(event.fouled_player.as_deref()) {
                text.push_str(&format!(" on {fouled}"));
            }
            text.push('.');
            if let Some(outcome) = non_blank(event.outcome.as_deref()) {
                text.push_str(&format!(" The referee issues a {}.", humanize(outcome)));
            }
            text
        }
        EventType::PossessionChange => match team {
            Some(team) => format!("Possession changes hands, now with {team}."),
            None => "Possession changes hands.".to_string(),
        },
        EventType::Halftime => {
            let mut text = "It's halftime!".to_string();
            if let Some(score) = score {
                text.push_str(&format!(" The score is {score}."));
            }
            text
        }
        EventType::EndGame => {
            let mut text = "The game has ended!".to_string();
            if let Some(score) = score {
                text.push_str(&format!(" The final score is {score}."));
            }
            if let Some(winner) = non_blank(event.winning_team.as_deref()) {
                text.push_str(&format!(" {winner} take the win."));
            }
            text
        }
        EventType::Save => {
            let keeper = match team {
                Some(team) => format!("the {team} goalkeeper"),
                None => "the goalkeeper".to_string(),
            };
            let mut text = match player {
                Some(player) => format!("Incredible save by {keeper} against a shot from {player}!"),
                None => format!("Incredible save by {keeper}!"),
            };
            if let Some(score) = score {
                text.push_str(&format!(" The score remains {score}."));
            }
            text
        }
        EventType::Penalty => {
            let mut text = match team {
                Some(team) => format!("Penalty awarded to {team}!"),
                None => "Penalty awarded!".to_string(),
            };
            if let Some(player) = player {
                text.push_str(&format!(" {player} steps up to take it."));
            }
            text
        }
        EventType::Corner => match team {
            Some(team) => format!("Corner kick for {team}."),
            None => "Corner kick.".to_string(),
        },
        EventType::Substitution => {
            let mut text = match team {
                Some(team) => format!("Substitution for {team}"),
                None => "Substitution".to_string(),
            };
            let off = event.metadata_value("player_out");
            let on = event.metadata_value("player_in");
            match (off, on) {
                (Some(off), Some(on)) => text.push_str(&format!(": {off} off, {on} on.")),
                (Some(off), None) => text.push_str(&format!(": {off} off.")),
                (None, Some(on)) => text.push_str(&format!(": {on} on.")),
                (None, None) => text.push('.'),
            }
            text
        }
        EventType::Other(raw) => match non_blank(Some(raw)) {
            Some(raw) => format!("A key moment in the game: {raw}."),
            None => "A key moment in the game.".to_string(),
        },
    }
}

fn actor(player: Option<&str>, team: Option<&str>) -> String {
    match (player, team) {
        (Some(player), Some(team)) => format!("{player} of {team}"),
        (Some(player), None) => player.to_string(),
        (None, Some(team)) => team.to_string(),
        (None, None) => "A player".to_string(),
    }
}

fn humanize(raw: &str) -> String {
    raw.replace('_', " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::demo_match;

    #[test]
    fn scored_header_mentions_everyone() {
        let event = GameEvent::new(10, EventType::ShotOnGoal)
            .player("Ronaldo")
            .team("Al Nassr")
            .outcome("scored")
            .meta("shot_type", "header")
            .score("1-0");
        let text = describe(&event);
        for needle in ["Ronaldo", "Al Nassr", "1-0", "header"] {
            assert!(text.contains(needle), "{text:?} missing {needle}");
        }
    }

    #[test]
    fn every_known_type_renders_with_no_fields() {
        for event_type in EventType::KNOWN {
            let text = describe(&GameEvent::new(0, event_type.clone()));
            assert!(!text.is_empty(), "{event_type} rendered empty");
            assert!(!text.contains("None"), "{text:?}");
            assert!(!text.contains("{"), "{text:?}");
            assert!(!text.contains("  "), "{text:?}");
        }
    }

    #[test]
    fn unknown_type_uses_generic_sentence() {
        let text = describe(&GameEvent::new(3, "var_review"));
        assert_eq!(text, "A key moment in the game: var_review.");
    }

    #[test]
    fn foul_outcome_loses_underscores() {
        let events = demo_match();
        let text = describe(&events[2]);
        assert_eq!(
            text,
            "A foul committed by Messi of Inter Miami on opponent. The referee issues a yellow card."
        );
    }

    #[test]
    fn missed_shot_keeps_score() {
        let event = GameEvent::new(30, EventType::ShotOnGoal)
            .player("Messi")
            .outcome("wide")
            .score("0-0");
        assert_eq!(
            describe(&event),
            "Messi takes a shot, but it's missed or saved! The score remains 0-0."
        );
    }

    #[test]
    fn substitution_reads_metadata() {
        let events = demo_match();
        assert_eq!(
            describe(&events[8]),
            "Substitution for Inter Miami: Busquets off, New Midfielder on."
        );
    }

    #[test]
    fn blank_fields_count_as_missing() {
        let event = GameEvent::new(0, EventType::Corner).team("  ");
        assert_eq!(describe(&event), "Corner kick.");
    }

    #[test]
    fn end_game_names_the_winner() {
        let text = describe(demo_match().last().unwrap());
        assert_eq!(
            text,
            "The game has ended! The final score is 2-1. Al Nassr take the win."
        );
    }
}
