//! In-memory collaborators shared by the integration tests.

#![allow(dead_code)]

use anyhow::{bail, Result};
use speech_bridge::speech::{
    CancellationCode, EventSink, ProviderConfig, ProviderError, ProviderEvent, ReasonCode,
    RecognitionProvider, RecognizerConnector, SessionError, SpeechSynthesizer, StatusEvent,
    Subscription, Translator,
};
use speech_bridge::{RecognitionResult, SessionController};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Default)]
struct ConnectorState {
    connects: Vec<Instant>,
    sinks: Vec<EventSink>,
    configs: Vec<ProviderConfig>,
    starts: usize,
    stops: usize,
    closes: usize,
    start_failures: VecDeque<ProviderError>,
}

/// Recognizer connector that records every call and fails on demand
#[derive(Clone, Default)]
pub struct MockConnector {
    state: Arc<Mutex<ConnectorState>>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next provider start fail with `error`
    pub fn fail_next_start(&self, error: ProviderError) {
        self.state.lock().unwrap().start_failures.push_back(error);
    }

    pub fn fail_next_starts(&self, count: usize, code: CancellationCode, detail: &str) {
        for _ in 0..count {
            self.fail_next_start(ProviderError::new(code, detail));
        }
    }

    pub fn connect_count(&self) -> usize {
        self.state.lock().unwrap().connects.len()
    }

    pub fn connect_times(&self) -> Vec<Instant> {
        self.state.lock().unwrap().connects.clone()
    }

    pub fn start_count(&self) -> usize {
        self.state.lock().unwrap().starts
    }

    pub fn stop_count(&self) -> usize {
        self.state.lock().unwrap().stops
    }

    pub fn close_count(&self) -> usize {
        self.state.lock().unwrap().closes
    }

    pub fn last_config(&self) -> Option<ProviderConfig> {
        self.state.lock().unwrap().configs.last().cloned()
    }

    /// Sink handed to the `index`-th connection
    pub fn sink(&self, index: usize) -> EventSink {
        self.state.lock().unwrap().sinks[index].clone()
    }

    /// Push an event through the most recent connection
    pub fn emit(&self, event: ProviderEvent) -> bool {
        let sink = self.state.lock().unwrap().sinks.last().cloned();
        sink.map_or(false, |sink| sink.send(event))
    }
}

#[async_trait::async_trait]
impl RecognizerConnector for MockConnector {
    async fn connect(
        &self,
        config: &ProviderConfig,
        events: EventSink,
    ) -> Result<Box<dyn RecognitionProvider>, ProviderError> {
        let mut state = self.state.lock().unwrap();
        state.connects.push(Instant::now());
        state.sinks.push(events);
        state.configs.push(config.clone());
        Ok(Box::new(MockProvider {
            state: Arc::clone(&self.state),
        }))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

struct MockProvider {
    state: Arc<Mutex<ConnectorState>>,
}

impl MockProvider {
    fn start(&self) -> Result<(), ProviderError> {
        let mut state = self.state.lock().unwrap();
        state.starts += 1;
        match state.start_failures.pop_front() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait::async_trait]
impl RecognitionProvider for MockProvider {
    async fn start_once(&mut self) -> Result<(), ProviderError> {
        self.start()
    }

    async fn start_continuous(&mut self) -> Result<(), ProviderError> {
        self.start()
    }

    async fn stop_continuous(&mut self) -> Result<(), ProviderError> {
        self.state.lock().unwrap().stops += 1;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), ProviderError> {
        self.state.lock().unwrap().closes += 1;
        Ok(())
    }
}

/// Translator that tags text with the target language
#[derive(Default)]
pub struct MockTranslator {
    failing: AtomicBool,
    calls: Mutex<Vec<(String, String, String)>>,
}

impl MockTranslator {
    pub fn failing() -> Self {
        let translator = Self::default();
        translator.set_failing(true);
        translator
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// (text, source, target) for every call
    pub fn calls(&self) -> Vec<(String, String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Translator for MockTranslator {
    async fn translate(&self, text: &str, source: &str, target: &str) -> Result<String> {
        self.calls.lock().unwrap().push((
            text.to_string(),
            source.to_string(),
            target.to_string(),
        ));
        if self.failing.load(Ordering::SeqCst) {
            bail!("translation service unavailable");
        }
        Ok(format!("[{}] {}", target, text))
    }
}

/// Synthesizer that records what it was asked to speak
#[derive(Default)]
pub struct MockSynthesizer {
    failing: AtomicBool,
    calls: Mutex<Vec<(String, String, Option<String>)>>,
}

impl MockSynthesizer {
    pub fn failing() -> Self {
        let synthesizer = Self::default();
        synthesizer.failing.store(true, Ordering::SeqCst);
        synthesizer
    }

    /// (text, locale, voice) for every call
    pub fn calls(&self) -> Vec<(String, String, Option<String>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl SpeechSynthesizer for MockSynthesizer {
    async fn synthesize(&self, text: &str, locale: &str, voice: Option<&str>) -> Result<()> {
        self.calls.lock().unwrap().push((
            text.to_string(),
            locale.to_string(),
            voice.map(str::to_string),
        ));
        if self.failing.load(Ordering::SeqCst) {
            bail!("audio output busy");
        }
        Ok(())
    }
}

/// Everything the controller delivered to its listeners
pub struct Recorder {
    pub results: Arc<Mutex<Vec<RecognitionResult>>>,
    pub interim: Arc<Mutex<Vec<speech_bridge::speech::InterimResult>>>,
    pub errors: Arc<Mutex<Vec<SessionError>>>,
    pub status: Arc<Mutex<Vec<StatusEvent>>>,
    _subscriptions: Vec<Subscription>,
}

impl Recorder {
    pub fn attach(controller: &SessionController) -> Self {
        let results = Arc::new(Mutex::new(Vec::new()));
        let interim = Arc::new(Mutex::new(Vec::new()));
        let errors = Arc::new(Mutex::new(Vec::new()));
        let status = Arc::new(Mutex::new(Vec::new()));

        let listeners = controller.listeners();
        let r = Arc::clone(&results);
        let i = Arc::clone(&interim);
        let e = Arc::clone(&errors);
        let s = Arc::clone(&status);
        let subscriptions = vec![
            listeners.on_result(move |result| r.lock().unwrap().push(result.clone())),
            listeners.on_interim(move |interim| i.lock().unwrap().push(interim.clone())),
            listeners.on_error(move |error| e.lock().unwrap().push(error.clone())),
            listeners.on_status(move |status| s.lock().unwrap().push(status.clone())),
        ];

        Self {
            results,
            interim,
            errors,
            status,
            _subscriptions: subscriptions,
        }
    }

    pub fn results(&self) -> Vec<RecognitionResult> {
        self.results.lock().unwrap().clone()
    }

    pub fn interim(&self) -> Vec<speech_bridge::speech::InterimResult> {
        self.interim.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<SessionError> {
        self.errors.lock().unwrap().clone()
    }

    pub fn status(&self) -> Vec<StatusEvent> {
        self.status.lock().unwrap().clone()
    }
}

/// Let the controller drain its queue (time is paused in these tests)
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

pub fn recognized(text: &str, language: Option<&str>) -> ProviderEvent {
    ProviderEvent::Recognized {
        text: text.to_string(),
        reason: ReasonCode::RecognizedSpeech,
        confidence: Some(0.9),
        language: language.map(str::to_string),
        duration_seconds: Some(1.5),
    }
}

pub fn recognizing(text: &str) -> ProviderEvent {
    ProviderEvent::Recognizing {
        text: text.to_string(),
    }
}

pub fn words(n: usize) -> String {
    (1..=n)
        .map(|i| format!("word{}", i))
        .collect::<Vec<_>>()
        .join(" ")
}
