pub mod gemini;
pub mod openai;
pub mod provider;

pub use provider::{select_generator, TextGenerator};
