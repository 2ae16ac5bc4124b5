use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "matchcast", version, about = "AI sports commentary for scripted match events")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(long, global = true, value_name = "PATH", help = "Config file to use")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Narrate a match from kick-off to the final whistle
    Run(RunArgs),
    /// Print the match events as JSON
    Events(EventsArgs),
    /// Print the plain description of each event
    Describe(EventsArgs),
    /// Print the prompts a profile would send, without calling any service
    Prompt(PromptArgs),
    /// Resolve a preference label into a taste profile
    Profile(ProfileArgs),
    TestTts(TestTtsArgs),
    Config(ConfigArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One JSON array once the match is over
    Batch,
    /// One server-sent event per commentary, then an end event
    Stream,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    #[arg(long, help = "Preference label: analytical, emotional, humorous or balanced")]
    pub profile: Option<String>,

    #[arg(long, value_name = "PATH", help = "JSON event feed (defaults to the demo match)")]
    pub events: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Stream)]
    pub format: OutputFormat,

    #[arg(long, help = "Skip real-time pacing")]
    pub no_wait: bool,

    #[arg(long, help = "Pacing multiplier (2.0 plays the match twice as fast)")]
    pub speed: Option<f64>,

    #[arg(long, help = "Override text generation backend")]
    pub backend: Option<String>,

    #[arg(long, help = "Speak each commentary")]
    pub speak: bool,

    #[arg(long, help = "Override TTS backend")]
    pub tts_backend: Option<String>,

    #[arg(long, value_name = "DIR", help = "Save spoken commentary to this directory")]
    pub audio_dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct EventsArgs {
    #[arg(long, value_name = "PATH", help = "JSON event feed (defaults to the demo match)")]
    pub events: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct PromptArgs {
    #[arg(long, help = "Preference label")]
    pub profile: Option<String>,

    #[arg(long, value_name = "PATH", help = "JSON event feed (defaults to the demo match)")]
    pub events: Option<PathBuf>,

    #[arg(long, value_name = "SECONDS", help = "Only the event at this match time")]
    pub time: Option<u64>,
}

#[derive(Args, Debug)]
pub struct ProfileArgs {
    #[arg(value_name = "LABEL")]
    pub label: String,
}

#[derive(Args, Debug)]
pub struct TestTtsArgs {
    #[arg(long, help = "Text to synthesize")]
    pub text: Option<String>,

    #[arg(long, help = "TTS backend")]
    pub backend: Option<String>,

    #[arg(long, value_name = "PATH", help = "Save audio to file")]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[arg(long, help = "Show current config as JSON")]
    pub show: bool,

    #[arg(long, help = "Create default config file")]
    pub init: bool,

    #[arg(long, help = "Validate configuration")]
    pub validate: bool,
}
