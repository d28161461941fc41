use crate::speech::{
    AutoDetect, CancellationCode, ProviderConfig, ProviderError, ProviderEvent, ReasonCode,
};
use serde::{Deserialize, Serialize};

/// Control message published to the STT service on `stt.control.<session>`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum RecognizerControl {
    Start {
        session_id: String,
        locale: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        auto_detect: Option<AutoDetect>,
        continuous: bool,
        interim_results: bool,
        initial_silence_ms: u64,
        end_silence_ms: u64,
    },
    Stop {
        session_id: String,
    },
    Close {
        session_id: String,
    },
}

impl RecognizerControl {
    pub fn start(session_id: &str, config: &ProviderConfig, continuous: bool) -> Self {
        Self::Start {
            session_id: session_id.to_string(),
            locale: config.locale.clone(),
            auto_detect: config.auto_detect.clone(),
            continuous,
            interim_results: config.interim_results,
            initial_silence_ms: config.timeouts.initial_silence_ms,
            end_silence_ms: config.timeouts.end_silence_ms,
        }
    }

    pub fn session_id(&self) -> &str {
        match self {
            Self::Start { session_id, .. }
            | Self::Stop { session_id }
            | Self::Close { session_id } => session_id,
        }
    }
}

/// Transcript message received from STT service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptMessage {
    pub session_id: String,
    pub text: String,
    pub partial: bool,
    pub timestamp: String,
    #[serde(default)]
    pub confidence: Option<f32>,
    /// Locale tag chosen by auto-detection
    #[serde(default)]
    pub language: Option<String>,
    /// Final messages only; absent means recognized speech
    #[serde(default)]
    pub reason: Option<ReasonCode>,
    #[serde(default)]
    pub duration_seconds: Option<f64>,
}

impl From<TranscriptMessage> for ProviderEvent {
    fn from(msg: TranscriptMessage) -> Self {
        if msg.partial {
            ProviderEvent::Recognizing { text: msg.text }
        } else {
            ProviderEvent::Recognized {
                text: msg.text,
                reason: msg.reason.unwrap_or(ReasonCode::RecognizedSpeech),
                confidence: msg.confidence,
                language: msg.language,
                duration_seconds: msg.duration_seconds,
            }
        }
    }
}

/// Lifecycle notification from the STT service on `stt.event.<session>`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RecognizerEvent {
    SessionStarted,
    SessionStopped,
    SpeechStart,
    SpeechEnd,
    Canceled {
        #[serde(default = "unspecified")]
        code: CancellationCode,
        #[serde(default)]
        detail: String,
    },
}

fn unspecified() -> CancellationCode {
    CancellationCode::Unspecified
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognizerEventMessage {
    pub session_id: String,
    #[serde(flatten)]
    pub event: RecognizerEvent,
}

impl From<RecognizerEvent> for ProviderEvent {
    fn from(event: RecognizerEvent) -> Self {
        match event {
            RecognizerEvent::SessionStarted => ProviderEvent::SessionStarted,
            RecognizerEvent::SessionStopped => ProviderEvent::SessionStopped,
            RecognizerEvent::SpeechStart => ProviderEvent::SpeechStartDetected,
            RecognizerEvent::SpeechEnd => ProviderEvent::SpeechEndDetected,
            RecognizerEvent::Canceled { code, detail } => {
                ProviderEvent::Canceled(ProviderError::new(code, detail))
            }
        }
    }
}

/// Request sent on `translate.request`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslateRequest {
    pub text: String,
    pub source: String,
    pub target: String,
}

/// Reply to a `TranslateRequest`; exactly one of the fields is set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslateResponse {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Text to be spoken, published on `tts.speak`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeakRequest {
    pub text: String,
    pub locale: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,
    pub timestamp: String,
}
