//! Speech collaborators backed by NATS services.

use super::client::{NatsClient, CONTROL_SUBJECT, SPEAK_SUBJECT, TRANSLATE_SUBJECT};
use super::messages::{
    RecognizerControl, RecognizerEventMessage, SpeakRequest, TranscriptMessage, TranslateRequest,
    TranslateResponse,
};
use crate::speech::{
    CancellationCode, EventSink, ProviderConfig, ProviderError, ProviderEvent,
    RecognitionProvider, RecognizerConnector, SpeechSynthesizer, Translator,
};
use anyhow::{bail, Result};
use futures::stream::StreamExt;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

fn connection_failure(e: anyhow::Error) -> ProviderError {
    ProviderError::new(CancellationCode::ConnectionFailure, format!("{:#}", e))
}

/// Opens recognizer sessions on a remote STT service
pub struct NatsConnector {
    client: NatsClient,
}

impl NatsConnector {
    pub fn new(client: NatsClient) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl RecognizerConnector for NatsConnector {
    async fn connect(
        &self,
        config: &ProviderConfig,
        events: EventSink,
    ) -> Result<Box<dyn RecognitionProvider>, ProviderError> {
        let session_id = Uuid::new_v4().to_string();

        let transcripts = self
            .client
            .subscribe_transcripts()
            .await
            .map_err(connection_failure)?;
        let lifecycle = self
            .client
            .subscribe_events(&session_id)
            .await
            .map_err(connection_failure)?;

        info!(
            "Recognizer session {} opened (locale={}, generation={})",
            session_id,
            config.locale,
            events.generation()
        );

        let forwarder = tokio::spawn(forward(
            session_id.clone(),
            transcripts,
            lifecycle,
            events,
        ));

        Ok(Box::new(NatsRecognizer {
            client: self.client.clone(),
            session_id,
            config: config.clone(),
            forwarder,
        }))
    }

    fn name(&self) -> &str {
        "nats"
    }
}

/// Relay messages for one recognizer session into the controller
async fn forward(
    session_id: String,
    mut transcripts: async_nats::Subscriber,
    mut lifecycle: async_nats::Subscriber,
    sink: EventSink,
) {
    loop {
        let event: ProviderEvent = tokio::select! {
            msg = transcripts.next() => {
                let Some(msg) = msg else { break };
                match serde_json::from_slice::<TranscriptMessage>(&msg.payload) {
                    Ok(transcript) if transcript.session_id == session_id => transcript.into(),
                    Ok(_) => continue,
                    Err(e) => {
                        warn!("Failed to parse transcript message: {}", e);
                        continue;
                    }
                }
            }
            msg = lifecycle.next() => {
                let Some(msg) = msg else { break };
                match serde_json::from_slice::<RecognizerEventMessage>(&msg.payload) {
                    Ok(event) => event.event.into(),
                    Err(e) => {
                        warn!("Failed to parse recognizer event: {}", e);
                        continue;
                    }
                }
            }
        };

        if !sink.send(event) {
            break;
        }
    }

    debug!("Recognizer relay for {} finished", session_id);
}

/// One open session on the remote STT service
pub struct NatsRecognizer {
    client: NatsClient,
    session_id: String,
    config: ProviderConfig,
    forwarder: JoinHandle<()>,
}

impl NatsRecognizer {
    async fn control(&self, message: RecognizerControl) -> Result<(), ProviderError> {
        let subject = format!("{}.{}", CONTROL_SUBJECT, self.session_id);
        self.client
            .publish_json(subject, &message)
            .await
            .map_err(connection_failure)
    }
}

#[async_trait::async_trait]
impl RecognitionProvider for NatsRecognizer {
    async fn start_once(&mut self) -> Result<(), ProviderError> {
        self.control(RecognizerControl::start(&self.session_id, &self.config, false))
            .await
    }

    async fn start_continuous(&mut self) -> Result<(), ProviderError> {
        self.control(RecognizerControl::start(&self.session_id, &self.config, true))
            .await
    }

    async fn stop_continuous(&mut self) -> Result<(), ProviderError> {
        self.control(RecognizerControl::Stop {
            session_id: self.session_id.clone(),
        })
        .await
    }

    async fn close(&mut self) -> Result<(), ProviderError> {
        info!("Closing recognizer session {}", self.session_id);
        self.forwarder.abort();
        self.control(RecognizerControl::Close {
            session_id: self.session_id.clone(),
        })
        .await
    }
}

impl Drop for NatsRecognizer {
    fn drop(&mut self) {
        self.forwarder.abort();
    }
}

/// Request/reply client for the translation service
pub struct NatsTranslator {
    client: NatsClient,
    timeout: Duration,
}

impl NatsTranslator {
    pub fn new(client: NatsClient, timeout: Duration) -> Self {
        Self { client, timeout }
    }
}

#[async_trait::async_trait]
impl Translator for NatsTranslator {
    async fn translate(&self, text: &str, source: &str, target: &str) -> Result<String> {
        let request = TranslateRequest {
            text: text.to_string(),
            source: source.to_string(),
            target: target.to_string(),
        };

        let response: TranslateResponse = self
            .client
            .request_json(TRANSLATE_SUBJECT.to_string(), &request, self.timeout)
            .await?;

        match response {
            TranslateResponse { error: Some(e), .. } => bail!("Translation service error: {}", e),
            TranslateResponse { text: Some(text), .. } => Ok(text),
            TranslateResponse { .. } => bail!("Translation service returned no text"),
        }
    }
}

/// Fire-and-forget publisher for the text-to-speech service
pub struct NatsSynthesizer {
    client: NatsClient,
}

impl NatsSynthesizer {
    pub fn new(client: NatsClient) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl SpeechSynthesizer for NatsSynthesizer {
    async fn synthesize(&self, text: &str, locale: &str, voice: Option<&str>) -> Result<()> {
        let request = SpeakRequest {
            text: text.to_string(),
            locale: locale.to_string(),
            voice: voice.map(str::to_string),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        self.client
            .publish_json(SPEAK_SUBJECT.to_string(), &request)
            .await
    }
}
