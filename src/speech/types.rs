use crate::error::{ErrorKind, SpeechError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// State of the current recognition session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// No active provider session (initial state, or soft-paused)
    Idle,
    /// Streaming audio, results may arrive
    Listening,
    /// Provider detected end of speech, waiting for the next utterance or result
    Processing,
    /// Transport dropped, a retry is scheduled
    Reconnecting,
    /// Hard teardown executed, this session is finished
    Stopped,
}

impl SessionState {
    /// Listening or Processing: the provider is expected to produce results
    pub fn is_active(self) -> bool {
        matches!(self, SessionState::Listening | SessionState::Processing)
    }
}

/// Authoritative result for one utterance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognitionResult {
    /// Recognized text
    pub text: String,

    /// Confidence score (0.0 to 1.0)
    pub confidence: f32,

    /// Application language code, best effort
    pub detected_language: String,

    /// Utterance duration in seconds
    pub duration_seconds: f64,
}

/// Provisional transcript for the utterance in progress
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterimResult {
    /// Growing prefix of the current utterance
    pub text: String,

    /// Whitespace-separated word count of `text`
    pub word_count: usize,

    /// Set when enough new words accumulated to translate progressively
    pub chunk: Option<ChunkSignal>,
}

/// Trigger to translate the transcript accumulated so far
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkSignal {
    pub text: String,
    pub word_count: usize,
}

/// Why the status changed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StatusCause {
    Started,
    Paused,
    Resumed,
    SpeechStarted,
    SpeechEnded,
    Reconnecting { attempt: u32, delay_ms: u64 },
    /// Continuous session stopped without a user request
    Anomaly,
    IdleTimeout,
    MaxDuration,
    Stopped,
}

/// Session status change delivered to status listeners
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEvent {
    pub session_id: Uuid,
    pub state: SessionState,
    pub cause: StatusCause,
}

/// Error delivered to error listeners
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionError {
    pub session_id: Uuid,
    pub kind: ErrorKind,
    /// Stable, human-readable message
    pub message: String,
    /// Whether the session was torn down because of it
    pub fatal: bool,
}

impl SessionError {
    pub fn new(session_id: Uuid, error: &SpeechError, fatal: bool) -> Self {
        Self {
            session_id,
            kind: error.kind(),
            message: error.to_string(),
            fatal,
        }
    }
}
