pub mod audio;
pub mod cli;
pub mod config;
pub mod describe;
pub mod error;
pub mod events;
pub mod llm;
pub mod prompt;
pub mod session;
pub mod taste;
pub mod tts;

use anyhow::Context;
use cli::{Cli, Commands, OutputFormat};
use config::Config;
use events::GameEvent;
use session::delivery::{BatchDelivery, Delivery, StreamDelivery};
use session::pacer::SystemClock;
use session::CommentarySession;
use std::path::Path;

pub fn run(cli: Cli) -> anyhow::Result<()> {
    setup_tracing(cli.verbose);
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Run(args) => run_session(args, config_path),
        Commands::Events(args) => events_cmd(args),
        Commands::Describe(args) => describe_cmd(args),
        Commands::Prompt(args) => prompt_cmd(args, config_path),
        Commands::Profile(args) => profile_cmd(args, config_path),
        Commands::TestTts(args) => test_tts(args, config_path),
        Commands::Config(args) => config_cmd(args, config_path),
    }
}

fn setup_tracing(verbose: bool) {
    let filter = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_events(path: Option<&Path>) -> anyhow::Result<Vec<GameEvent>> {
    match path {
        Some(path) => events::load_feed(path),
        None => Ok(events::demo_match()),
    }
}

fn run_session(args: cli::RunArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
    let mut config = Config::load(config_path).context("load config")?;
    if let Some(speed) = args.speed {
        config.pacing.speed = speed;
    }
    if args.no_wait {
        config.pacing.realtime = false;
    }
    config.validate().context("invalid config")?;
    let events = load_events(args.events.as_deref())?;

    let generator = llm::select_generator(&config.llm, args.backend.as_deref())
        .context("select text generator")?;

    let speaker = if args.speak || args.audio_dir.is_some() {
        let speaker =
            tts::Speaker::from_config(&config, args.tts_backend.as_deref(), args.audio_dir.clone())
                .context("select speech synthesizer")?;
        Some(speaker)
    } else {
        None
    };

    let clock = SystemClock;
    let mut session = CommentarySession::new(generator.as_ref(), &clock)
        .with_pacing(config.pacing.realtime, config.pacing.speed)
        .with_speaker(speaker.as_ref());

    let label = args.profile.or_else(|| config.default_profile.clone());
    if let Some(label) = label {
        let lookup = taste::select_lookup(&config);
        session.select_profile(taste::resolve_profile(lookup.as_deref(), &label));
    }

    let stdout = std::io::stdout();
    let mut delivery: Box<dyn Delivery> = match args.format {
        OutputFormat::Batch => Box::new(BatchDelivery::new(stdout.lock())),
        OutputFormat::Stream => Box::new(StreamDelivery::new(stdout.lock())),
    };

    let report = session.run(&events, delivery.as_mut())?;
    tracing::debug!(
        started_at = %report.started_at,
        finished_at = %report.finished_at,
        "session report"
    );
    Ok(())
}

fn events_cmd(args: cli::EventsArgs) -> anyhow::Result<()> {
    let events = load_events(args.events.as_deref())?;
    println!("{}", serde_json::to_string_pretty(&events)?);
    Ok(())
}

fn describe_cmd(args: cli::EventsArgs) -> anyhow::Result<()> {
    for event in load_events(args.events.as_deref())? {
        println!("[{:>4}s] {}", event.time, describe::describe(&event));
    }
    Ok(())
}

fn prompt_cmd(args: cli::PromptArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
    let config = Config::load(config_path).context("load config")?;
    let label = args
        .profile
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "balanced".to_string());
    let profile = taste::static_profile(&label);

    let events = load_events(args.events.as_deref())?;
    let selected: Vec<&GameEvent> = events
        .iter()
        .filter(|event| args.time.map_or(true, |time| event.time == time))
        .collect();
    if selected.is_empty() {
        anyhow::bail!("no event at the requested time");
    }

    for event in selected {
        println!("=== {}s {} ===", event.time, event.event_type);
        println!("{}", prompt::build_prompt(event, &profile));
    }
    Ok(())
}

fn profile_cmd(args: cli::ProfileArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
    let config = Config::load(config_path).context("load config")?;
    let lookup = taste::select_lookup(&config);
    let profile = taste::resolve_profile(lookup.as_deref(), &args.label);
    println!("{}", serde_json::to_string_pretty(&profile)?);
    Ok(())
}

fn test_tts(args: cli::TestTtsArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
    let config = Config::load(config_path).context("load config")?;
    let text = args
        .text
        .unwrap_or_else(|| "And it's a goal!".to_string());

    let speaker = tts::Speaker::from_config(&config, args.backend.as_deref(), None)?;
    let clip = speaker.synthesize(&text).context("tts synthesis")?;

    match args.output {
        Some(path) => {
            std::fs::write(&path, &clip).context("write output")?;
            println!("Wrote {} bytes to {}", clip.len(), path.display());
        }
        None => audio::renderer::play_bytes(&clip, speaker.extension(), &config.playback)?,
    }

    Ok(())
}

fn config_cmd(args: cli::ConfigArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
    if args.init {
        let path = Config::init_default()?;
        println!("Initialized config at {}", path.display());
        return Ok(());
    }

    if args.show {
        let config = Config::load(config_path)?;
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    if args.validate {
        let config = Config::load(config_path)?;
        config.validate()?;
        println!("Config OK");
        return Ok(());
    }

    let path = match config_path {
        Some(path) => path.to_path_buf(),
        None => Config::default_path()?,
    };
    println!("{}", path.display());
    Ok(())
}
