//! Collaborator contracts consumed by the session layer.
//!
//! Implementations live elsewhere (see `crate::nats`) or in tests.

use super::options::SilenceTimeouts;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Why the provider delivered a final event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonCode {
    RecognizedSpeech,
    NoMatch,
    EndOfStream,
}

/// Provider-side cancellation category, when the provider reports one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancellationCode {
    AuthenticationFailure,
    Forbidden,
    TooManyRequests,
    ConnectionFailure,
    ServiceTimeout,
    ServiceUnavailable,
    BadRequest,
    RuntimeError,
    Unspecified,
}

/// Raw failure reported by a recognizer
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderError {
    pub code: CancellationCode,
    pub detail: String,
}

impl ProviderError {
    pub fn new(code: CancellationCode, detail: impl Into<String>) -> Self {
        Self {
            code,
            detail: detail.into(),
        }
    }
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.code, self.detail)
    }
}

impl std::error::Error for ProviderError {}

/// Events a recognizer pushes into the session
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderEvent {
    SessionStarted,
    SessionStopped,
    SpeechStartDetected,
    SpeechEndDetected,
    Recognizing {
        text: String,
    },
    Recognized {
        text: String,
        reason: ReasonCode,
        confidence: Option<f32>,
        /// Provider locale tag, if auto-detection ran
        language: Option<String>,
        duration_seconds: Option<f64>,
    },
    Canceled(ProviderError),
}

/// How the provider should pick between candidate languages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoDetect {
    pub locales: Vec<String>,
    /// Favor low added latency over marginal accuracy
    pub prioritize_latency: bool,
}

/// Everything a recognizer needs to open a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub locale: String,
    pub auto_detect: Option<AutoDetect>,
    pub interim_results: bool,
    pub timeouts: SilenceTimeouts,
}

/// Where a recognizer delivers its events
///
/// Each sink is stamped with the generation of the session that created it;
/// the controller ignores events from older generations.
#[derive(Debug, Clone)]
pub struct EventSink {
    generation: u64,
    tx: mpsc::UnboundedSender<(u64, ProviderEvent)>,
}

impl EventSink {
    pub(crate) fn new(generation: u64, tx: mpsc::UnboundedSender<(u64, ProviderEvent)>) -> Self {
        Self { generation, tx }
    }

    /// Deliver an event; returns false once the controller is gone
    pub fn send(&self, event: ProviderEvent) -> bool {
        self.tx.send((self.generation, event)).is_ok()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// An open recognizer connection (transport plus audio input)
#[async_trait::async_trait]
pub trait RecognitionProvider: Send {
    /// Recognize a single utterance, then stop
    async fn start_once(&mut self) -> Result<(), ProviderError>;

    /// Recognize until `stop_continuous`
    async fn start_continuous(&mut self) -> Result<(), ProviderError>;

    /// Stop producing results; the connection stays open
    async fn stop_continuous(&mut self) -> Result<(), ProviderError>;

    /// Release the connection and the microphone
    async fn close(&mut self) -> Result<(), ProviderError>;
}

/// Opens recognizer connections
#[async_trait::async_trait]
pub trait RecognizerConnector: Send + Sync {
    async fn connect(
        &self,
        config: &ProviderConfig,
        events: EventSink,
    ) -> Result<Box<dyn RecognitionProvider>, ProviderError>;

    /// Backend name for logging
    fn name(&self) -> &str;
}

/// Machine translation service; fallible and possibly slow
#[async_trait::async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str, source: &str, target: &str) -> Result<String>;
}

/// Text-to-speech service; failures are always ignorable
#[async_trait::async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str, locale: &str, voice: Option<&str>) -> Result<()>;
}
