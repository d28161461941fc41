//! Top-level speech session orchestrator.
//!
//! [`SessionController`] is a cheap, cloneable handle. All work happens in a
//! single actor task that owns the connection, the retry chain and the
//! per-utterance filters. Commands, provider events and timers are drained
//! from one `select!` loop, so every state change runs to completion before
//! the next one starts.

use super::chunk::{self, ChunkAggregator};
use super::dedup::DuplicateSuppressor;
use super::language::LanguageResolver;
use super::lifecycle::{ConnectionLifecycle, ResumeOutcome, TeardownMode};
use super::listeners::ListenerRegistry;
use super::machine::{self, Context, Effect, Input, Transition};
use super::options::{ControllerSettings, RecognitionOptions, SilenceTimeouts};
use super::provider::{EventSink, ProviderConfig, ProviderError, ProviderEvent, ReasonCode, RecognizerConnector};
use super::retry::{Classification, Disposition, RetryPolicy, RetryState};
use super::types::{InterimResult, RecognitionResult, SessionError, SessionState, StatusEvent};
use crate::error::{ErrorKind, SpeechError};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Provider stops sooner than this after a connect count toward the reconnect chain
const FLAP_WINDOW: Duration = Duration::from_secs(5);

/// Point-in-time view of the controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub session_id: Option<Uuid>,
    pub state: SessionState,
    pub retry_attempt: u32,
}

type Reply<T> = oneshot::Sender<Result<T, SpeechError>>;

enum Command {
    Start {
        options: RecognitionOptions,
        reply: Reply<Uuid>,
    },
    Pause {
        reply: Reply<()>,
    },
    Resume {
        reply: Reply<()>,
    },
    Stop {
        reply: Reply<()>,
    },
}

/// Handle to a running session controller
#[derive(Clone)]
pub struct SessionController {
    commands: mpsc::Sender<Command>,
    listeners: ListenerRegistry,
    snapshot: watch::Receiver<SessionSnapshot>,
}

impl SessionController {
    /// Spawn the controller task on the current Tokio runtime
    pub fn spawn(connector: Arc<dyn RecognizerConnector>, settings: ControllerSettings) -> Self {
        let (commands_tx, commands_rx) = mpsc::channel(32);
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(SessionSnapshot {
            session_id: None,
            state: SessionState::Idle,
            retry_attempt: 0,
        });
        let listeners = ListenerRegistry::new();

        let actor = SessionActor {
            lifecycle: ConnectionLifecycle::new(connector, settings.idle_timeout),
            listeners: listeners.clone(),
            policy: RetryPolicy::new(settings.max_attempts, settings.base_delay),
            resolver: LanguageResolver::default(),
            suppressor: DuplicateSuppressor::new(settings.duplicate_window, settings.min_text_chars),
            aggregator: ChunkAggregator::new(settings.chunk_min_words),
            settings,
            session: None,
            generation: 0,
            events_tx,
            retry_at: None,
            deadline: None,
            utterance_started: None,
            snapshot: snapshot_tx,
        };
        tokio::spawn(actor.run(commands_rx, events_rx));

        Self {
            commands: commands_tx,
            listeners,
            snapshot: snapshot_rx,
        }
    }

    /// Subscribe to results, interim results, errors and status changes
    pub fn listeners(&self) -> &ListenerRegistry {
        &self.listeners
    }

    /// Start a new session, stopping any previous one first
    ///
    /// Recoverable connection failures are retried in the background and
    /// still return `Ok`; only fatal failures are returned.
    pub async fn start(&self, options: RecognitionOptions) -> Result<Uuid, SpeechError> {
        self.request(|reply| Command::Start { options, reply }).await
    }

    /// Soft-pause: stop producing results but keep the transport when persisting
    pub async fn pause(&self) -> Result<(), SpeechError> {
        self.request(|reply| Command::Pause { reply }).await
    }

    /// Resume on the open transport, or start again with the same options
    pub async fn resume(&self) -> Result<(), SpeechError> {
        self.request(|reply| Command::Resume { reply }).await
    }

    /// Hard stop: release the transport and cancel any pending retry
    pub async fn stop(&self) -> Result<(), SpeechError> {
        self.request(|reply| Command::Stop { reply }).await
    }

    pub fn state(&self) -> SessionState {
        self.snapshot.borrow().state
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot.borrow().clone()
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(Reply<T>) -> Command,
    ) -> Result<T, SpeechError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands
            .send(command(reply_tx))
            .await
            .map_err(|_| SpeechError::ControllerClosed)?;
        reply_rx.await.map_err(|_| SpeechError::ControllerClosed)?
    }
}

/// One logical recognition attempt
struct Session {
    id: Uuid,
    options: RecognitionOptions,
    provider_config: ProviderConfig,
    state: SessionState,
    retry: RetryState,
    connected_at: Option<Instant>,
    /// Attempts of the chain the last successful connect ended
    carried_attempts: u32,
}

impl Session {
    fn context(&self) -> Context {
        Context {
            continuous: self.options.continuous,
            persist_connection: self.options.persist_connection,
        }
    }
}

struct SessionActor {
    settings: ControllerSettings,
    lifecycle: ConnectionLifecycle,
    listeners: ListenerRegistry,
    policy: RetryPolicy,
    resolver: LanguageResolver,
    suppressor: DuplicateSuppressor,
    aggregator: ChunkAggregator,
    session: Option<Session>,
    /// Bumped on every connect and hard teardown; older events are dropped
    generation: u64,
    events_tx: mpsc::UnboundedSender<(u64, ProviderEvent)>,
    retry_at: Option<Instant>,
    deadline: Option<Instant>,
    utterance_started: Option<Instant>,
    snapshot: watch::Sender<SessionSnapshot>,
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

impl SessionActor {
    async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        mut events: mpsc::UnboundedReceiver<(u64, ProviderEvent)>,
    ) {
        let mut watchdog = tokio::time::interval(self.settings.watchdog_interval);
        watchdog.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!("Session controller started");

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => self.handle_command(command).await,
                    None => break,
                },
                Some((generation, event)) = events.recv() => {
                    if generation == self.generation {
                        self.handle_event(event).await;
                    } else {
                        debug!("Dropping event from stale generation {}: {:?}", generation, event);
                    }
                }
                _ = sleep_until(self.retry_at) => {
                    self.retry_at = None;
                    self.retry_now().await;
                }
                _ = sleep_until(self.deadline) => {
                    self.deadline = None;
                    info!("Maximum session duration reached");
                    self.apply(Input::MaxDuration).await;
                }
                _ = watchdog.tick() => self.check_idle().await,
            }
        }

        // Every handle is gone
        self.lifecycle.teardown(TeardownMode::Hard).await;
        info!("Session controller stopped");
    }

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::Start { options, reply } => {
                let id = self.begin_session(options).await;
                let result = self.connect().await.map(|_| id);
                let _ = reply.send(result);
            }
            Command::Pause { reply } => {
                self.apply(Input::PauseRequested).await;
                let _ = reply.send(Ok(()));
            }
            Command::Resume { reply } => {
                let result = self.resume().await;
                let _ = reply.send(result);
            }
            Command::Stop { reply } => {
                if self.session.is_some() {
                    self.apply(Input::StopRequested).await;
                } else {
                    self.lifecycle.teardown(TeardownMode::Hard).await;
                }
                let _ = reply.send(Ok(()));
            }
        }
    }

    /// Replace the current session; the old one is fully stopped first
    async fn begin_session(&mut self, options: RecognitionOptions) -> Uuid {
        if let Some(previous) = &self.session {
            if previous.state != SessionState::Stopped {
                info!("Stopping session {} before starting a new one", previous.id);
                self.apply(Input::StopRequested).await;
            }
        }

        let provider_config = self.provider_config(&options);
        let id = Uuid::new_v4();
        info!(
            "Starting session {} (language={}, candidates={:?}, continuous={})",
            id, options.language, options.candidate_languages, options.continuous
        );

        self.deadline = options
            .max_duration_seconds
            .map(|secs| Instant::now() + Duration::from_secs(secs));
        self.retry_at = None;
        self.suppressor.reset();
        self.aggregator.reset();
        self.utterance_started = None;
        self.session = Some(Session {
            id,
            options,
            provider_config,
            state: SessionState::Idle,
            retry: RetryState::default(),
            connected_at: None,
            carried_attempts: 0,
        });
        self.publish_snapshot();
        id
    }

    fn provider_config(&self, options: &RecognitionOptions) -> ProviderConfig {
        let auto_detect = if options.candidate_languages.len() > 1 {
            match self.resolver.configure_auto_detect(&options.candidate_languages) {
                Ok(auto) => Some(auto),
                Err(e) => {
                    warn!("Auto-detection disabled: {}", e);
                    None
                }
            }
        } else {
            None
        };

        ProviderConfig {
            locale: self.resolver.to_provider_tag(&options.language),
            auto_detect,
            interim_results: options.interim_results,
            timeouts: SilenceTimeouts::for_mode(options.fast_mode),
        }
    }

    /// Open the provider with the session's original parameters
    async fn connect(&mut self) -> Result<(), SpeechError> {
        let Some(session) = self.session.as_ref() else {
            return Err(SpeechError::NotStarted);
        };
        let config = session.provider_config.clone();
        let continuous = session.options.continuous;

        self.generation += 1;
        let sink = EventSink::new(self.generation, self.events_tx.clone());

        match self.lifecycle.start(&config, continuous, sink).await {
            Ok(()) => {
                if let Some(session) = self.session.as_mut() {
                    session.carried_attempts = session.retry.attempt;
                    session.retry.reset();
                    session.connected_at = Some(Instant::now());
                }
                self.apply(Input::Started).await;
                Ok(())
            }
            Err(e) => {
                warn!("Provider start failed: {}", e);
                let disposition = self.dispose(&e);
                let fatal = match &disposition {
                    Disposition::Fatal(err) => Some(err.clone()),
                    Disposition::Retry { .. } => None,
                };
                self.apply(Input::Failed(disposition)).await;
                match fatal {
                    Some(err) => Err(err),
                    None => Ok(()),
                }
            }
        }
    }

    async fn resume(&mut self) -> Result<(), SpeechError> {
        let Some(session) = self.session.as_ref() else {
            return Err(SpeechError::NotStarted);
        };

        match session.state {
            SessionState::Listening | SessionState::Processing | SessionState::Reconnecting => {
                Ok(())
            }
            SessionState::Stopped => {
                let options = session.options.clone();
                self.begin_session(options).await;
                self.connect().await
            }
            SessionState::Idle => {
                let continuous = session.options.continuous;
                match self.lifecycle.resume(continuous).await {
                    Ok(ResumeOutcome::Reused) => {
                        self.apply(Input::Resumed).await;
                        Ok(())
                    }
                    // No live transport: resuming is a fresh start
                    Ok(ResumeOutcome::NeedsStart) => self.connect().await,
                    Err(e) => {
                        warn!("Resume failed: {}", e);
                        let disposition = self.dispose(&e);
                        let fatal = match &disposition {
                            Disposition::Fatal(err) => Some(err.clone()),
                            Disposition::Retry { .. } => None,
                        };
                        self.apply(Input::Failed(disposition)).await;
                        fatal.map_or(Ok(()), Err)
                    }
                }
            }
        }
    }

    async fn retry_now(&mut self) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        if session.state != SessionState::Reconnecting {
            return;
        }

        info!(
            "Reconnect attempt {}/{} for session {}",
            session.retry.attempt,
            self.policy.max_attempts(),
            session.id
        );
        // Failures are reported through the error listeners
        let _ = self.connect().await;
    }

    async fn check_idle(&mut self) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        if !session.state.is_active() {
            return;
        }

        let now = Instant::now();
        if self
            .lifecycle
            .idle_expired(now, session.options.persist_connection)
        {
            info!(
                "Session {} idle for {:?}, releasing recognition",
                session.id,
                self.lifecycle.idle_for(now)
            );
            self.apply(Input::IdleTimeout).await;
        }
    }

    fn dispose(&self, error: &ProviderError) -> Disposition {
        let classification = self.policy.classify(error);
        self.decide(classification, &error.detail)
    }

    fn decide(&self, classification: Classification, detail: &str) -> Disposition {
        let fresh = RetryState::default();
        let retry = self.session.as_ref().map_or(&fresh, |s| &s.retry);
        self.policy.decide(retry, classification, detail)
    }

    async fn handle_event(&mut self, event: ProviderEvent) {
        self.lifecycle.touch();

        let Some(session) = self.session.as_ref() else {
            return;
        };
        let state = session.state;

        match event {
            ProviderEvent::SessionStarted => {
                debug!("Provider session started for {}", session.id);
            }
            ProviderEvent::SessionStopped => self.provider_stopped().await,
            ProviderEvent::SpeechStartDetected => {
                self.utterance_started.get_or_insert_with(Instant::now);
                self.apply(Input::SpeechStarted).await;
            }
            ProviderEvent::SpeechEndDetected => self.apply(Input::SpeechEnded).await,
            ProviderEvent::Recognizing { text } => {
                if state.is_active() {
                    self.on_interim(text);
                }
            }
            ProviderEvent::Recognized {
                text,
                reason,
                confidence,
                language,
                duration_seconds,
            } => {
                if !state.is_active() {
                    debug!("Ignoring final result while {:?}", state);
                    return;
                }
                match reason {
                    ReasonCode::RecognizedSpeech => {
                        self.on_final(text, confidence, language, duration_seconds)
                            .await
                    }
                    ReasonCode::NoMatch => self.apply(Input::NoMatch).await,
                    ReasonCode::EndOfStream => self.provider_stopped().await,
                }
            }
            ProviderEvent::Canceled(err) => {
                if state == SessionState::Idle {
                    // The transport kept across a pause died; resume will start fresh
                    info!("Held transport canceled while paused: {}", err);
                    self.lifecycle.teardown(TeardownMode::Hard).await;
                    self.generation += 1;
                    return;
                }
                if !state.is_active() {
                    return;
                }
                warn!("Provider canceled session {}: {}", session.id, err);
                let disposition = self.dispose(&err);
                self.apply(Input::Failed(disposition)).await;
            }
        }
    }

    async fn provider_stopped(&mut self) {
        if let Some(session) = self.session.as_mut() {
            // A stop right after a reconnect continues the previous chain
            let flapping = session
                .connected_at
                .is_some_and(|at| at.elapsed() < FLAP_WINDOW);
            if flapping && session.retry.attempt < session.carried_attempts {
                session.retry.attempt = session.carried_attempts;
            }
        }
        let disposition = self.decide(
            Classification::of(ErrorKind::UnexpectedTermination),
            "session stopped by provider",
        );
        self.apply(Input::ProviderStopped { disposition }).await;
    }

    fn on_interim(&mut self, text: String) {
        self.utterance_started.get_or_insert_with(Instant::now);
        let chunk = self.aggregator.observe(&text);

        let wants_interim = self
            .session
            .as_ref()
            .is_some_and(|s| s.options.interim_results);
        if !wants_interim {
            return;
        }

        let interim = InterimResult {
            word_count: chunk::word_count(&text),
            text,
            chunk,
        };
        self.listeners.emit_interim(&interim);
    }

    async fn on_final(
        &mut self,
        text: String,
        confidence: Option<f32>,
        language: Option<String>,
        duration_seconds: Option<f64>,
    ) {
        let now = Instant::now();
        let started = self.utterance_started.take();

        if !self.suppressor.should_emit(&text, now) {
            debug!("Suppressed duplicate or empty final result: {:?}", text);
            self.apply(Input::FinalReceived).await;
            return;
        }

        let Some(session) = self.session.as_ref() else {
            return;
        };
        let resolution = self.resolver.resolve(
            language.as_deref(),
            &text,
            &session.options.language,
            &session.options.candidate_languages,
        );
        debug!(
            "Resolved language {} via {:?} (provider tag {:?})",
            resolution.language, resolution.evidence, language
        );

        let duration = duration_seconds.unwrap_or_else(|| {
            started.map_or(0.0, |t| now.saturating_duration_since(t).as_secs_f64())
        });
        let result = RecognitionResult {
            text: text.trim().to_string(),
            confidence: confidence.unwrap_or(1.0).clamp(0.0, 1.0),
            detected_language: resolution.language,
            duration_seconds: duration,
        };

        // Reset chunking before delivery so no chunk signal can trail the result
        self.apply(Input::FinalReceived).await;
        self.listeners.emit_result(&result);
    }

    /// Feed one input through the state machine and execute its effects
    async fn apply(&mut self, input: Input) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        let from = session.state;
        let Transition { next, effects } = machine::transition(session.context(), from, input);
        session.state = next;
        if from != next {
            debug!("Session {}: {:?} -> {:?}", session.id, from, next);
        }
        if next == SessionState::Stopped {
            self.deadline = None;
        }
        self.publish_snapshot();

        for effect in effects {
            self.run_effect(effect).await;
        }
    }

    async fn run_effect(&mut self, effect: Effect) {
        let Some(session_id) = self.session.as_ref().map(|s| s.id) else {
            return;
        };

        match effect {
            Effect::Teardown(mode) => {
                info!("Teardown ({:?}) for session {}", mode, session_id);
                self.lifecycle.teardown(mode).await;
                if mode == TeardownMode::Hard {
                    self.generation += 1;
                }
            }
            Effect::ScheduleRetry {
                attempt,
                delay,
                error,
            } => {
                info!(
                    "Scheduling reconnect {} for session {} in {:?} ({})",
                    attempt,
                    session_id,
                    delay,
                    error.detail().unwrap_or_default()
                );
                if let Some(session) = self.session.as_mut() {
                    session.retry.record(attempt, delay, error);
                }
                self.retry_at = Some(Instant::now() + delay);
                self.publish_snapshot();
            }
            Effect::CancelRetry => {
                if self.retry_at.take().is_some() {
                    debug!("Cleared pending reconnect for session {}", session_id);
                }
            }
            Effect::ResetUtterance => {
                self.aggregator.reset();
                self.utterance_started = None;
            }
            Effect::ReportAnomaly => {
                warn!(
                    "Continuous session {} stopped without a stop request",
                    session_id
                );
            }
            Effect::ReportError { error, fatal } => {
                if fatal {
                    error!(
                        "Session {} failed: {} ({})",
                        session_id,
                        error,
                        error.detail().unwrap_or_default()
                    );
                } else {
                    info!("Session {}: {}", session_id, error);
                }
                self.listeners
                    .emit_error(&SessionError::new(session_id, &error, fatal));
            }
            Effect::Status(cause) => {
                let state = self
                    .session
                    .as_ref()
                    .map_or(SessionState::Idle, |s| s.state);
                self.listeners.emit_status(&StatusEvent {
                    session_id,
                    state,
                    cause,
                });
            }
        }
    }

    fn publish_snapshot(&self) {
        let snapshot = match &self.session {
            Some(session) => SessionSnapshot {
                session_id: Some(session.id),
                state: session.state,
                retry_attempt: session.retry.attempt,
            },
            None => SessionSnapshot {
                session_id: None,
                state: SessionState::Idle,
                retry_attempt: 0,
            },
        };
        self.snapshot.send_replace(snapshot);
    }
}
