use anyhow::{Context, Result};
use async_nats::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info};

/// Subject prefix for recognizer control messages
pub const CONTROL_SUBJECT: &str = "stt.control";
/// Partial and final transcripts from every session
pub const TRANSCRIPT_SUBJECT: &str = "stt.text.>";
/// Subject prefix for recognizer lifecycle events
pub const EVENT_SUBJECT: &str = "stt.event";
pub const TRANSLATE_SUBJECT: &str = "translate.request";
pub const SPEAK_SUBJECT: &str = "tts.speak";

#[derive(Clone)]
pub struct NatsClient {
    client: Client,
}

impl NatsClient {
    /// Connect to NATS server
    pub async fn connect(url: &str) -> Result<Self> {
        info!("Connecting to NATS at {}", url);

        let client = async_nats::connect(url)
            .await
            .context("Failed to connect to NATS")?;

        info!("Connected to NATS successfully");

        Ok(Self { client })
    }

    /// Publish a JSON-encoded message
    pub async fn publish_json<T: Serialize>(&self, subject: String, message: &T) -> Result<()> {
        let payload = serde_json::to_vec(message)?;

        self.client
            .publish(subject.clone(), payload.into())
            .await
            .with_context(|| format!("Failed to publish to {}", subject))?;

        // Make sure the message leaves before the caller moves on
        self.client
            .flush()
            .await
            .context("Failed to flush NATS connection")?;

        debug!("Published to {}", subject);
        Ok(())
    }

    /// Send a JSON request and decode the JSON reply
    pub async fn request_json<Req, Resp>(
        &self,
        subject: String,
        request: &Req,
        timeout: Duration,
    ) -> Result<Resp>
    where
        Req: Serialize,
        Resp: DeserializeOwned,
    {
        let payload = serde_json::to_vec(request)?;

        let reply = tokio::time::timeout(timeout, self.client.request(subject.clone(), payload.into()))
            .await
            .with_context(|| format!("Request to {} timed out after {:?}", subject, timeout))?
            .with_context(|| format!("Request to {} failed", subject))?;

        serde_json::from_slice(&reply.payload)
            .with_context(|| format!("Invalid reply from {}", subject))
    }

    /// Subscribe to transcript messages
    pub async fn subscribe_transcripts(&self) -> Result<async_nats::Subscriber> {
        // The STT service publishes to stt.text.partial and stt.text.final;
        // messages are filtered by session_id in the payload
        self.subscribe(TRANSCRIPT_SUBJECT.to_string()).await
    }

    /// Subscribe to lifecycle events for one recognizer session
    pub async fn subscribe_events(&self, session_id: &str) -> Result<async_nats::Subscriber> {
        self.subscribe(format!("{}.{}", EVENT_SUBJECT, session_id))
            .await
    }

    async fn subscribe(&self, subject: String) -> Result<async_nats::Subscriber> {
        info!("Subscribing to {}", subject);

        let subscriber = self
            .client
            .subscribe(subject.clone())
            .await
            .with_context(|| format!("Failed to subscribe to {}", subject))?;

        Ok(subscriber)
    }
}
