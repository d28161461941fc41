//! Real-time speech recognition session management
//!
//! This module provides the `SessionController` abstraction that manages:
//! - The recognizer connection (start, soft pause, resume, hard stop)
//! - Failure classification and reconnect back-off
//! - Duplicate suppression for final results
//! - Interim-result chunking for progressive translation
//! - Language tag mapping and detection fallback
//! - Fan-out of results, errors and status to any number of listeners

pub mod chunk;
pub mod controller;
pub mod dedup;
pub mod language;
pub mod lifecycle;
pub mod listeners;
pub mod machine;
mod options;
pub mod provider;
pub mod retry;
mod types;

pub use chunk::ChunkAggregator;
pub use controller::{SessionController, SessionSnapshot};
pub use dedup::DuplicateSuppressor;
pub use language::{Evidence, LanguageResolver, Resolution};
pub use lifecycle::{ConnectionLifecycle, TeardownMode};
pub use listeners::{ListenerKind, ListenerRegistry, Subscription};
pub use options::{ControllerSettings, RecognitionOptions, SilenceTimeouts};
pub use provider::{
    AutoDetect, CancellationCode, EventSink, ProviderConfig, ProviderError, ProviderEvent,
    ReasonCode, RecognitionProvider, RecognizerConnector, SpeechSynthesizer, Translator,
};
pub use retry::{Classification, Disposition, RetryPolicy, RetryState};
pub use types::{
    ChunkSignal, InterimResult, RecognitionResult, SessionError, SessionState, StatusCause,
    StatusEvent,
};
