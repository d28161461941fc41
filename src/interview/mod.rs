//! Interview translation session
//!
//! Turns recognized utterances into a bilingual transcript: each final
//! result is attributed to a speaker, translated into the other party's
//! language, appended to an ordered message list and read aloud.

mod message;
mod session;

pub use message::{LivePreview, Speaker, TranslationMessage};
pub use session::{InterviewConfig, InterviewStats, InterviewTranslationSession};
