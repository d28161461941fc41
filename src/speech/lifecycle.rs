use super::provider::{EventSink, ProviderConfig, ProviderError, RecognitionProvider, RecognizerConnector};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, warn};

/// How much of the connection a teardown releases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TeardownMode {
    /// Stop producing results, keep the transport open for `resume`
    Soft,
    /// Release the transport and the microphone
    Hard,
}

/// Outcome of `ConnectionLifecycle::resume`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeOutcome {
    /// The open transport was reused
    Reused,
    /// Nothing to reuse; the caller must start a new session
    NeedsStart,
}

/// Owns the recognizer connection for the current session
pub struct ConnectionLifecycle {
    connector: Arc<dyn RecognizerConnector>,
    transport: Option<Box<dyn RecognitionProvider>>,
    recognizing: bool,
    last_activity: Instant,
    idle_timeout: Duration,
}

impl ConnectionLifecycle {
    pub fn new(connector: Arc<dyn RecognizerConnector>, idle_timeout: Duration) -> Self {
        Self {
            connector,
            transport: None,
            recognizing: false,
            last_activity: Instant::now(),
            idle_timeout,
        }
    }

    /// Open a fresh connection and begin recognizing
    ///
    /// Any previous connection is hard-torn-down first so two sessions never
    /// hold the transport at once.
    pub async fn start(
        &mut self,
        config: &ProviderConfig,
        continuous: bool,
        events: EventSink,
    ) -> Result<(), ProviderError> {
        if self.transport.is_some() {
            self.teardown(TeardownMode::Hard).await;
        }

        info!(
            "Connecting to {} (locale={}, generation={})",
            self.connector.name(),
            config.locale,
            events.generation()
        );
        let mut transport = self.connector.connect(config, events).await?;

        let started = if continuous {
            transport.start_continuous().await
        } else {
            transport.start_once().await
        };

        if let Err(e) = started {
            // Never keep a half-open transport around
            if let Err(close_err) = transport.close().await {
                warn!("Failed to close transport after start failure: {}", close_err);
            }
            return Err(e);
        }

        self.transport = Some(transport);
        self.recognizing = true;
        self.touch();
        Ok(())
    }

    /// Restart recognition on the still-open transport, if there is one
    pub async fn resume(&mut self, continuous: bool) -> Result<ResumeOutcome, ProviderError> {
        let Some(transport) = self.transport.as_mut() else {
            return Ok(ResumeOutcome::NeedsStart);
        };

        if continuous {
            transport.start_continuous().await?;
        } else {
            transport.start_once().await?;
        }

        self.recognizing = true;
        self.touch();
        info!("Resumed recognition on existing transport");
        Ok(ResumeOutcome::Reused)
    }

    /// The single teardown path for every caller
    pub async fn teardown(&mut self, mode: TeardownMode) {
        if let Some(transport) = self.transport.as_mut() {
            if self.recognizing {
                if let Err(e) = transport.stop_continuous().await {
                    warn!("Failed to stop recognition: {}", e);
                }
            }
        }
        self.recognizing = false;

        if mode == TeardownMode::Hard {
            if let Some(mut transport) = self.transport.take() {
                if let Err(e) = transport.close().await {
                    warn!("Failed to close transport: {}", e);
                }
                info!("Transport released");
            }
        }
    }

    /// Record provider activity
    pub fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    pub fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_activity)
    }

    /// Whether the watchdog should soft-pause a persistent session
    pub fn idle_expired(&self, now: Instant, persist_connection: bool) -> bool {
        persist_connection && self.recognizing && self.idle_for(now) > self.idle_timeout
    }

    pub fn has_transport(&self) -> bool {
        self.transport.is_some()
    }

    pub fn is_recognizing(&self) -> bool {
        self.recognizing
    }
}
