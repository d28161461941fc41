use super::message::{LivePreview, Speaker, TranslationMessage};
use crate::error::SpeechError;
use crate::speech::{
    ChunkSignal, LanguageResolver, RecognitionOptions, RecognitionResult, SessionController,
    SessionState, SpeechSynthesizer, Subscription, Translator,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Languages and voices for a two-party interview
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterviewConfig {
    /// Primary language, spoken by staff
    pub staff_language: String,

    /// Language the client speaks
    pub client_language: String,

    /// Auto-detect candidates; empty means staff + client languages
    pub candidate_languages: Vec<String>,

    /// Application language code → synthesizer voice id
    pub voices: HashMap<String, String>,

    pub fast_mode: bool,

    pub max_duration_seconds: Option<u64>,

    pub persist_connection: bool,
}

impl Default for InterviewConfig {
    fn default() -> Self {
        Self {
            staff_language: "en".to_string(),
            client_language: "es".to_string(),
            candidate_languages: Vec::new(),
            voices: HashMap::new(),
            fast_mode: false,
            max_duration_seconds: None,
            persist_connection: true,
        }
    }
}

/// Statistics about an interview session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterviewStats {
    pub state: SessionState,

    /// When the interview session was created
    pub started_at: DateTime<Utc>,

    /// Total duration in seconds
    pub duration_secs: f64,

    /// Utterances in the transcript
    pub message_count: usize,

    /// Utterances that were actually translated
    pub translated_count: usize,

    /// Translation calls that failed and fell back to the original text
    pub failed_translations: usize,
}

enum Work {
    Final(RecognitionResult),
    Chunk(ChunkSignal),
    /// Acknowledged once everything queued before it is processed
    Flush(oneshot::Sender<()>),
}

/// Shared between the session handle and its worker task
struct Interpreter {
    config: InterviewConfig,
    translator: Arc<dyn Translator>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    resolver: LanguageResolver,
    messages: RwLock<Vec<TranslationMessage>>,
    preview: RwLock<Option<LivePreview>>,
    translated_count: AtomicUsize,
    failed_translations: AtomicUsize,
}

impl Interpreter {
    fn candidates(&self) -> Vec<String> {
        if self.config.candidate_languages.is_empty() {
            vec![
                self.config.staff_language.clone(),
                self.config.client_language.clone(),
            ]
        } else {
            self.config.candidate_languages.clone()
        }
    }

    /// Speaker and target language for an utterance in `language`
    fn route(&self, language: &str) -> (Speaker, String) {
        if language == self.config.staff_language {
            (Speaker::Staff, self.config.client_language.clone())
        } else {
            (Speaker::Client, self.config.staff_language.clone())
        }
    }

    async fn process(&self, work: Work) {
        match work {
            Work::Final(result) => {
                self.process_final(result).await;
            }
            Work::Chunk(chunk) => self.process_chunk(chunk).await,
            Work::Flush(done) => {
                let _ = done.send(());
            }
        }
    }

    async fn process_final(&self, result: RecognitionResult) -> TranslationMessage {
        // The utterance is complete; its preview is superseded
        *self.preview.write().await = None;

        let source = result.detected_language.clone();
        let (speaker, target) = self.route(&source);

        let mut translated = None;
        if source != target {
            match self.translator.translate(&result.text, &source, &target).await {
                Ok(text) if !text.trim().is_empty() => {
                    self.translated_count.fetch_add(1, Ordering::SeqCst);
                    translated = Some(text);
                }
                Ok(_) => {
                    warn!("Translation {} -> {} came back empty, showing original", source, target);
                    self.failed_translations.fetch_add(1, Ordering::SeqCst);
                }
                Err(e) => {
                    warn!("Translation {} -> {} failed, showing original: {:#}", source, target, e);
                    self.failed_translations.fetch_add(1, Ordering::SeqCst);
                }
            }
        }

        let message = TranslationMessage {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            speaker,
            translated_text: translated
                .clone()
                .unwrap_or_else(|| result.text.clone()),
            original_text: result.text,
            original_language: source,
            target_language: target.clone(),
            confidence: result.confidence,
        };

        {
            let mut messages = self.messages.write().await;
            messages.push(message.clone());
        }
        info!(
            "{:?} ({} -> {}): {}",
            message.speaker, message.original_language, message.target_language, message.translated_text
        );

        if let Some(text) = translated {
            let locale = self.resolver.to_provider_tag(&target);
            let voice = self.config.voices.get(&target).map(String::as_str);
            if let Err(e) = self.synthesizer.synthesize(&text, &locale, voice).await {
                // Playback is best effort
                warn!("Speech synthesis failed: {:#}", e);
            }
        }

        message
    }

    async fn process_chunk(&self, chunk: ChunkSignal) {
        let source = self
            .resolver
            .resolve(None, &chunk.text, &self.config.staff_language, &self.candidates())
            .language;
        let (_, target) = self.route(&source);

        let translated_text = if source == target {
            chunk.text.clone()
        } else {
            match self.translator.translate(&chunk.text, &source, &target).await {
                Ok(text) => text,
                Err(e) => {
                    debug!("Preview translation failed: {:#}", e);
                    return;
                }
            }
        };

        *self.preview.write().await = Some(LivePreview {
            original_text: chunk.text,
            translated_text,
            word_count: chunk.word_count,
        });
    }
}

/// Bilingual interview transcript built on a `SessionController`
pub struct InterviewTranslationSession {
    controller: SessionController,
    interpreter: Arc<Interpreter>,
    created_at: DateTime<Utc>,
    work_tx: mpsc::UnboundedSender<Work>,
    _subscriptions: Vec<Subscription>,
}

impl InterviewTranslationSession {
    /// Attach to `controller`; must be called inside a Tokio runtime
    pub fn new(
        controller: SessionController,
        translator: Arc<dyn Translator>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        config: InterviewConfig,
    ) -> Self {
        let interpreter = Arc::new(Interpreter {
            config,
            translator,
            synthesizer,
            resolver: LanguageResolver::default(),
            messages: RwLock::new(Vec::new()),
            preview: RwLock::new(None),
            translated_count: AtomicUsize::new(0),
            failed_translations: AtomicUsize::new(0),
        });

        // Listener callbacks are synchronous; queue the work so translations
        // run one at a time in speech order
        let (work_tx, mut work_rx) = mpsc::unbounded_channel();
        let results_tx = work_tx.clone();
        let interim_tx = work_tx.clone();
        let result_sub = controller.listeners().on_result(move |result| {
            let _ = results_tx.send(Work::Final(result.clone()));
        });
        let interim_sub = controller.listeners().on_interim(move |interim| {
            if let Some(chunk) = &interim.chunk {
                let _ = interim_tx.send(Work::Chunk(chunk.clone()));
            }
        });

        // Exits once the session and its subscriptions are dropped
        let worker_interpreter = Arc::clone(&interpreter);
        tokio::spawn(async move {
            debug!("Interview worker started");
            while let Some(work) = work_rx.recv().await {
                worker_interpreter.process(work).await;
            }
            debug!("Interview worker stopped");
        });

        Self {
            controller,
            interpreter,
            created_at: Utc::now(),
            work_tx,
            _subscriptions: vec![result_sub, interim_sub],
        }
    }

    /// Options the underlying recognition session is started with
    pub fn recognition_options(&self) -> RecognitionOptions {
        let config = &self.interpreter.config;
        RecognitionOptions {
            language: config.staff_language.clone(),
            candidate_languages: self.interpreter.candidates(),
            continuous: true,
            interim_results: true,
            max_duration_seconds: config.max_duration_seconds,
            fast_mode: config.fast_mode,
            persist_connection: config.persist_connection,
        }
    }

    pub async fn start(&self) -> Result<Uuid, SpeechError> {
        info!(
            "Starting interview (staff={}, client={})",
            self.interpreter.config.staff_language, self.interpreter.config.client_language
        );
        self.controller.start(self.recognition_options()).await
    }

    pub async fn pause(&self) -> Result<(), SpeechError> {
        self.controller.pause().await
    }

    pub async fn resume(&self) -> Result<(), SpeechError> {
        self.controller.resume().await
    }

    /// Stop recognition
    ///
    /// Results recognized before the stop are translated before this returns.
    pub async fn stop(&self) -> Result<InterviewStats, SpeechError> {
        self.controller.stop().await?;
        self.flush().await;
        Ok(self.stats().await)
    }

    /// Wait until every queued result and chunk has been processed
    pub async fn flush(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self.work_tx.send(Work::Flush(done_tx)).is_ok() {
            let _ = done_rx.await;
        }
    }

    /// Translate one final result and append it to the transcript
    pub async fn process_result(&self, result: RecognitionResult) -> TranslationMessage {
        self.interpreter.process_final(result).await
    }

    /// Ordered transcript so far
    pub async fn messages(&self) -> Vec<TranslationMessage> {
        self.interpreter.messages.read().await.clone()
    }

    /// Progressive translation of the utterance in progress
    pub async fn preview(&self) -> Option<LivePreview> {
        self.interpreter.preview.read().await.clone()
    }

    pub fn controller(&self) -> &SessionController {
        &self.controller
    }

    pub fn config(&self) -> &InterviewConfig {
        &self.interpreter.config
    }

    pub async fn stats(&self) -> InterviewStats {
        let duration = Utc::now().signed_duration_since(self.created_at);
        InterviewStats {
            state: self.controller.state(),
            started_at: self.created_at,
            duration_secs: duration.num_milliseconds() as f64 / 1000.0,
            message_count: self.interpreter.messages.read().await.len(),
            translated_count: self.interpreter.translated_count.load(Ordering::SeqCst),
            failed_translations: self.interpreter.failed_translations.load(Ordering::SeqCst),
        }
    }
}
