pub mod client;
pub mod messages;
pub mod provider;

pub use client::NatsClient;
pub use messages::{
    RecognizerControl, RecognizerEvent, RecognizerEventMessage, SpeakRequest, TranscriptMessage,
    TranslateRequest, TranslateResponse,
};
pub use provider::{NatsConnector, NatsRecognizer, NatsSynthesizer, NatsTranslator};
