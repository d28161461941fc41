pub mod config;
pub mod error;
pub mod http;
pub mod interview;
pub mod nats;
pub mod speech;

pub use config::Config;
pub use error::{ErrorKind, SpeechError};
pub use http::{create_router, AppState, SpeechServices};
pub use interview::{
    InterviewConfig, InterviewStats, InterviewTranslationSession, LivePreview, Speaker,
    TranslationMessage,
};
pub use nats::{NatsClient, NatsConnector, NatsSynthesizer, NatsTranslator, TranscriptMessage};
pub use speech::{
    ControllerSettings, RecognitionOptions, RecognitionResult, SessionController, SessionState,
};
