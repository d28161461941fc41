use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who spoke an utterance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    /// Caseworker conducting the interview (speaks the primary language)
    Staff,
    /// Person being interviewed
    Client,
}

impl Speaker {
    pub fn other(self) -> Self {
        match self {
            Speaker::Staff => Speaker::Client,
            Speaker::Client => Speaker::Staff,
        }
    }
}

/// One utterance in the bilingual transcript; never mutated after creation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationMessage {
    pub id: Uuid,

    /// When the utterance was recognized
    pub timestamp: DateTime<Utc>,

    pub speaker: Speaker,

    pub original_text: String,

    /// Equals `original_text` when translation was skipped or failed
    pub translated_text: String,

    pub original_language: String,

    pub target_language: String,

    /// Recognition confidence (0.0 to 1.0)
    pub confidence: f32,
}

/// Progressive translation of the utterance still being spoken
///
/// Interim text carries no provider language tag, so the source language is
/// guessed from the writing system alone and anchored on the staff language.
/// A client language written in the same script as the staff language (say
/// `es` against `en`) is previewed as staff speech translated for the client.
/// The final message for the utterance uses the provider's detection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LivePreview {
    pub original_text: String,
    pub translated_text: String,
    pub word_count: usize,
}
