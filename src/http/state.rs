use crate::interview::{InterviewConfig, InterviewTranslationSession};
use crate::speech::{ControllerSettings, RecognizerConnector, SpeechSynthesizer, Translator};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Collaborators and defaults used to build new interview sessions
pub struct SpeechServices {
    pub connector: Arc<dyn RecognizerConnector>,
    pub translator: Arc<dyn Translator>,
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
    pub settings: ControllerSettings,
    /// Used for any field a start request leaves out
    pub defaults: InterviewConfig,
}

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Interview sessions (interview_id → session), kept after stop for their transcript
    pub sessions: Arc<RwLock<HashMap<String, Arc<InterviewTranslationSession>>>>,

    pub services: Arc<SpeechServices>,
}

impl AppState {
    pub fn new(services: SpeechServices) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            services: Arc::new(services),
        }
    }

    pub async fn get(&self, interview_id: &str) -> Option<Arc<InterviewTranslationSession>> {
        self.sessions.read().await.get(interview_id).cloned()
    }
}
