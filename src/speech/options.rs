use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Options for one recognition session, as supplied by the host application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognitionOptions {
    /// Application language code (e.g., "fr")
    pub language: String,

    /// Languages to auto-detect between; ignored unless more than one
    pub candidate_languages: Vec<String>,

    /// Keep recognizing until explicitly stopped
    pub continuous: bool,

    /// Deliver partial results while the speaker is talking
    pub interim_results: bool,

    /// Force a hard stop after this many seconds
    pub max_duration_seconds: Option<u64>,

    /// Shorter silence timeouts for lower latency
    pub fast_mode: bool,

    /// Keep the transport open across pauses
    pub persist_connection: bool,
}

impl Default for RecognitionOptions {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            candidate_languages: Vec::new(),
            continuous: true,
            interim_results: true,
            max_duration_seconds: None,
            fast_mode: false,
            persist_connection: true,
        }
    }
}

/// Silence timeouts handed to the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SilenceTimeouts {
    pub initial_silence_ms: u64,
    pub end_silence_ms: u64,
}

impl SilenceTimeouts {
    pub const NORMAL: Self = Self {
        initial_silence_ms: 8000,
        end_silence_ms: 1200,
    };

    pub const FAST: Self = Self {
        initial_silence_ms: 3000,
        end_silence_ms: 500,
    };

    pub fn for_mode(fast_mode: bool) -> Self {
        if fast_mode {
            Self::FAST
        } else {
            Self::NORMAL
        }
    }
}

/// Tuning knobs shared by every session a controller runs
#[derive(Debug, Clone)]
pub struct ControllerSettings {
    /// Maximum reconnect attempts per chain
    pub max_attempts: u32,
    /// Delay before the first reconnect; doubles per attempt
    pub base_delay: Duration,
    /// Window in which an identical final result is treated as a duplicate
    pub duplicate_window: Duration,
    /// Final results shorter than this (trimmed, in chars) are dropped
    pub min_text_chars: usize,
    /// Words needed before the first chunk signal of an utterance
    pub chunk_min_words: usize,
    /// Idle time after which a persistent session is soft-paused
    pub idle_timeout: Duration,
    /// How often the idle watchdog checks
    pub watchdog_interval: Duration,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
            duplicate_window: Duration::from_millis(2000),
            min_text_chars: 2,
            chunk_min_words: 5,
            idle_timeout: Duration::from_secs(300),   // 5 minutes
            watchdog_interval: Duration::from_secs(60),
        }
    }
}
