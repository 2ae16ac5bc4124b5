pub mod delivery;
pub mod pacer;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::SessionError;
use crate::events::GameEvent;
use crate::llm::TextGenerator;
use crate::prompt::build_prompt;
use crate::taste::TasteProfile;
use crate::tts::Speaker;
use delivery::{CommentaryRecord, Delivery};
use pacer::{Clock, Pacer};

/// Substituted whenever the text generator fails.
pub const FALLBACK_COMMENTARY: &str = "Commentary AI is temporarily unavailable.";

#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub records: usize,
    pub fallbacks: usize,
    pub spoken: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// One listener's commentary run over a fixed list of events.
///
/// Owns the selected taste profile; selecting again replaces it.
pub struct CommentarySession<'a> {
    profile: Option<TasteProfile>,
    generator: &'a dyn TextGenerator,
    speaker: Option<&'a Speaker>,
    clock: &'a dyn Clock,
    realtime: bool,
    speed: f64,
}

impl<'a> CommentarySession<'a> {
    pub fn new(generator: &'a dyn TextGenerator, clock: &'a dyn Clock) -> Self {
        Self {
            profile: None,
            generator,
            speaker: None,
            clock,
            realtime: true,
            speed: 1.0,
        }
    }

    pub fn with_speaker(mut self, speaker: Option<&'a Speaker>) -> Self {
        self.speaker = speaker;
        self
    }

    pub fn with_pacing(mut self, realtime: bool, speed: f64) -> Self {
        self.realtime = realtime;
        self.speed = speed;
        self
    }

    pub fn select_profile(&mut self, profile: TasteProfile) {
        tracing::info!(style = %profile.style, focus = ?profile.focus, "profile selected");
        self.profile = Some(profile);
    }

    pub fn profile(&self) -> Option<&TasteProfile> {
        self.profile.as_ref()
    }

    /// Generates commentary for one event. The bool is false when the
    /// fallback text was used.
    pub fn narrate(&self, event: &GameEvent, profile: &TasteProfile) -> (CommentaryRecord, bool) {
        let prompt = build_prompt(event, profile);
        let (commentary, generated) = match self.generator.generate(&prompt) {
            Ok(text) => (text, true),
            Err(err) => {
                tracing::warn!(
                    backend = self.generator.name(),
                    time = event.time,
                    event_type = %event.event_type,
                    error = %err,
                    "generation failed; using fallback"
                );
                (FALLBACK_COMMENTARY.to_string(), false)
            }
        };

        let record = CommentaryRecord {
            time: event.time,
            event_type: event.event_type.clone(),
            commentary,
            style: profile.style,
        };
        (record, generated)
    }

    /// Narrates every event in ascending `time` order, then sends the end
    /// marker. Fails before touching any event when no profile is selected.
    pub fn run(
        &self,
        events: &[GameEvent],
        delivery: &mut dyn Delivery,
    ) -> Result<SessionReport, SessionError> {
        let Some(profile) = self.profile.as_ref() else {
            let err = SessionError::ProfileNotSelected;
            delivery.fail(&err.to_string())?;
            return Err(err);
        };

        let mut ordered: Vec<&GameEvent> = events.iter().collect();
        ordered.sort_by_key(|event| event.time);

        let started_at = Utc::now();
        let pacer = Pacer::start(self.clock, self.speed, self.realtime);
        let mut report = SessionReport {
            records: 0,
            fallbacks: 0,
            spoken: 0,
            started_at,
            finished_at: started_at,
        };

        tracing::info!(events = ordered.len(), style = %profile.style, "session started");
        for event in ordered {
            let waited = pacer.wait_for(self.clock, event.time);
            tracing::debug!(time = event.time, waited_ms = waited.as_millis() as u64, "event due");

            let (record, generated) = self.narrate(event, profile);
            if !generated {
                report.fallbacks += 1;
            }
            tracing::info!(time = record.time, event_type = %record.event_type, "commentary ready");

            if let Some(speaker) = self.speaker {
                let stem = format!("{:04}_{}", record.time, record.event_type);
                match speaker.speak(&record.commentary, &stem) {
                    Ok(_) => report.spoken += 1,
                    Err(err) => tracing::warn!(error = ?err, "speech failed; continuing"),
                }
            }

            delivery.deliver(&record)?;
            report.records += 1;
        }

        delivery.finish()?;
        report.finished_at = Utc::now();
        tracing::info!(
            records = report.records,
            fallbacks = report.fallbacks,
            spoken = report.spoken,
            "session finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::delivery::{BatchDelivery, StreamDelivery};
    use super::pacer::testing::ManualClock;
    use super::*;
    use crate::error::{GenerationError, SpeechError};
    use crate::events::{demo_match, EventType};
    use crate::taste::{static_profile, Style};
    use crate::tts::SpeechSynthesizer;
    use std::cell::RefCell;
    use std::time::Duration;

    /// Answers with the prompt's event type, failing on the listed ones.
    struct ScriptedGenerator {
        fail_on: Vec<&'static str>,
        prompts: RefCell<Vec<String>>,
    }

    impl ScriptedGenerator {
        fn new(fail_on: Vec<&'static str>) -> Self {
            Self {
                fail_on,
                prompts: RefCell::new(Vec::new()),
            }
        }
    }

    impl TextGenerator for ScriptedGenerator {
        fn name(&self) -> &str {
            "scripted"
        }

        fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
            self.prompts.borrow_mut().push(prompt.to_string());
            let event_type = prompt
                .lines()
                .find_map(|line| line.strip_prefix("- Event type: "))
                .unwrap_or("unknown");
            if self.fail_on.iter().any(|f| *f == event_type) {
                return Err(GenerationError::Api {
                    status: 503,
                    message: "overloaded".to_string(),
                });
            }
            Ok(format!("commentary for {event_type}"))
        }
    }

    struct BrokenSynth;

    impl SpeechSynthesizer for BrokenSynth {
        fn name(&self) -> &str {
            "broken"
        }

        fn synthesize(&self, _text: &str) -> Result<Vec<u8>, SpeechError> {
            Err(SpeechError::EmptyAudio)
        }

        fn extension(&self) -> &str {
            "mp3"
        }
    }

    #[test]
    fn demo_match_streams_eleven_records_and_end_marker() {
        let generator = ScriptedGenerator::new(vec![]);
        let clock = ManualClock::new();
        let mut session = CommentarySession::new(&generator, &clock);
        session.select_profile(static_profile("analytical"));

        let mut delivery = StreamDelivery::new(Vec::new());
        let report = session.run(&demo_match(), &mut delivery).unwrap();
        assert_eq!(report.records, 11);
        assert_eq!(report.fallbacks, 0);

        let text = String::from_utf8(delivery.into_inner()).unwrap();
        let frames: Vec<&str> = text.split("\n\n").filter(|f| !f.is_empty()).collect();
        assert_eq!(frames.len(), 12);
        assert_eq!(frames[11], "event: end\ndata: {\"message\":\"Game ended\"}");

        let times: Vec<u64> = frames[..11]
            .iter()
            .map(|frame| {
                let json: serde_json::Value =
                    serde_json::from_str(frame.strip_prefix("data: ").unwrap()).unwrap();
                json["time"].as_u64().unwrap()
            })
            .collect();
        assert!(times.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn paces_events_to_their_offsets() {
        let generator = ScriptedGenerator::new(vec![]);
        let clock = ManualClock::new();
        let mut session = CommentarySession::new(&generator, &clock).with_pacing(true, 10.0);
        session.select_profile(static_profile("balanced"));

        let mut delivery = BatchDelivery::new(Vec::new());
        session.run(&demo_match(), &mut delivery).unwrap();
        assert_eq!(clock.total_slept(), Duration::from_secs(12));
    }

    #[test]
    fn out_of_order_events_are_sorted() {
        let generator = ScriptedGenerator::new(vec![]);
        let clock = ManualClock::new();
        let mut session = CommentarySession::new(&generator, &clock).with_pacing(false, 1.0);
        session.select_profile(static_profile("humorous"));

        let events = vec![
            GameEvent::new(30, EventType::Corner),
            GameEvent::new(0, EventType::KickOff),
            GameEvent::new(15, EventType::Foul),
        ];
        let mut delivery = BatchDelivery::new(Vec::new());
        session.run(&events, &mut delivery).unwrap();

        let times: Vec<u64> = delivery.records().iter().map(|r| r.time).collect();
        assert_eq!(times, vec![0, 15, 30]);
        assert!(delivery.records().iter().all(|r| r.style == Style::Humorous));
        assert!(clock.sleeps.borrow().is_empty());
    }

    #[test]
    fn generator_failure_uses_fallback_and_continues() {
        let generator = ScriptedGenerator::new(vec!["foul", "save"]);
        let clock = ManualClock::new();
        let mut session = CommentarySession::new(&generator, &clock).with_pacing(false, 1.0);
        session.select_profile(static_profile("emotional"));

        let mut delivery = BatchDelivery::new(Vec::new());
        let report = session.run(&demo_match(), &mut delivery).unwrap();
        assert_eq!(report.records, 11);
        assert_eq!(report.fallbacks, 2);

        let foul = &delivery.records()[2];
        assert_eq!(foul.event_type, EventType::Foul);
        assert_eq!(foul.commentary, FALLBACK_COMMENTARY);
        assert_eq!(delivery.records()[1].commentary, "commentary for shot_on_goal");
    }

    #[test]
    fn missing_profile_fails_before_any_event() {
        let generator = ScriptedGenerator::new(vec![]);
        let clock = ManualClock::new();
        let session = CommentarySession::new(&generator, &clock);

        let mut delivery = StreamDelivery::new(Vec::new());
        let err = session.run(&demo_match(), &mut delivery).unwrap_err();
        assert!(matches!(err, SessionError::ProfileNotSelected));
        assert!(generator.prompts.borrow().is_empty());

        let text = String::from_utf8(delivery.into_inner()).unwrap();
        assert!(text.starts_with("event: error\n"));
        assert!(text.contains("Please select a commentary profile first."));
    }

    #[test]
    fn reselecting_replaces_the_profile() {
        let generator = ScriptedGenerator::new(vec![]);
        let clock = ManualClock::new();
        let mut session = CommentarySession::new(&generator, &clock);
        session.select_profile(static_profile("analytical"));
        session.select_profile(static_profile("humorous"));
        assert_eq!(session.profile().unwrap().style, Style::Humorous);
    }

    #[test]
    fn speech_failures_are_swallowed() {
        let generator = ScriptedGenerator::new(vec![]);
        let clock = ManualClock::new();
        let speaker = Speaker::new(Box::new(BrokenSynth));
        let mut session = CommentarySession::new(&generator, &clock)
            .with_pacing(false, 1.0)
            .with_speaker(Some(&speaker));
        session.select_profile(static_profile("balanced"));

        let mut delivery = BatchDelivery::new(Vec::new());
        let report = session.run(&demo_match(), &mut delivery).unwrap();
        assert_eq!(report.records, 11);
        assert_eq!(report.spoken, 0);
    }
}
