use crate::interview::InterviewConfig;
use crate::speech::ControllerSettings;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;

/// Environment variables override file settings, e.g. `SPEECH_BRIDGE__NATS__URL`
pub const ENV_PREFIX: &str = "SPEECH_BRIDGE";

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    #[serde(default)]
    pub nats: NatsConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
    #[serde(default)]
    pub interview: InterviewConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct NatsConfig {
    pub url: String,
    /// How long to wait for a translation reply
    pub translate_timeout_ms: u64,
}

impl Default for NatsConfig {
    fn default() -> Self {
        Self {
            url: "nats://localhost:4222".to_string(),
            translate_timeout_ms: 5000,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub duplicate_window_ms: u64,
    pub min_text_chars: usize,
    pub chunk_min_words: usize,
    pub idle_timeout_secs: u64,
    pub watchdog_interval_secs: u64,
    pub persist_connection: bool,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
            duplicate_window_ms: 2000,
            min_text_chars: 2,
            chunk_min_words: 5,
            idle_timeout_secs: 300,     // 5 minutes
            watchdog_interval_secs: 60, // 1 minute
            persist_connection: true,
        }
    }
}

impl SpeechConfig {
    pub fn to_settings(&self) -> ControllerSettings {
        ControllerSettings {
            max_attempts: self.max_attempts,
            base_delay: Duration::from_millis(self.base_delay_ms),
            duplicate_window: Duration::from_millis(self.duplicate_window_ms),
            min_text_chars: self.min_text_chars,
            chunk_min_words: self.chunk_min_words,
            idle_timeout: Duration::from_secs(self.idle_timeout_secs),
            watchdog_interval: Duration::from_secs(self.watchdog_interval_secs),
        }
    }
}

impl Config {
    /// Load `path` (extension optional) and apply environment overrides
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to load config from {}", path))?;

        settings
            .try_deserialize()
            .context("Invalid configuration")
    }

    /// Interview defaults with the speech-level connection policy applied
    pub fn interview_defaults(&self) -> InterviewConfig {
        InterviewConfig {
            persist_connection: self.speech.persist_connection,
            ..self.interview.clone()
        }
    }
}
