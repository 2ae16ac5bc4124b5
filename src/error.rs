use thiserror::Error;

/// Failure of a text-generation backend. Never fatal to a session.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("API key not set: {0}")]
    MissingApiKey(String),

    #[error("request failed: {0}")]
    Request(String),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("response contained no commentary")]
    EmptyResponse,
}

/// Failure of the taste-profile service; callers fall back to the static table.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("API key not set: {0}")]
    MissingApiKey(String),

    #[error("request failed: {0}")]
    Request(String),

    #[error("API error {status}")]
    Api { status: u16 },

    #[error("unreadable response: {0}")]
    Parse(String),
}

#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("API key not set: {0}")]
    MissingApiKey(String),

    #[error("request failed: {0}")]
    Request(String),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("synthesizer returned no audio")]
    EmptyAudio,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Please select a commentary profile first.")]
    ProfileNotSelected,

    #[error("delivery failed: {0}")]
    Delivery(#[from] std::io::Error),
}
