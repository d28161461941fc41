use super::provider::{CancellationCode, ProviderError};
use crate::error::{ErrorKind, SpeechError};
use std::time::Duration;

/// Result of classifying a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub kind: ErrorKind,
    pub recoverable: bool,
}

impl Classification {
    pub fn of(kind: ErrorKind) -> Self {
        Self {
            kind,
            recoverable: kind.is_recoverable(),
        }
    }
}

// Checked before the recoverable keywords: "connection refused: permission denied" is fatal
const PERMISSION_KEYWORDS: &[&str] = &["permission", "denied", "not allowed", "microphone"];
const QUOTA_KEYWORDS: &[&str] = &["quota", "credential", "subscription", "unauthorized", "api key", "429"];
const NETWORK_KEYWORDS: &[&str] = &[
    "network",
    "timeout",
    "timed out",
    "connection",
    "temporary",
    "temporarily",
    "unavailable",
];

/// What to do about a failure in the current reconnect chain
#[derive(Debug, Clone, PartialEq)]
pub enum Disposition {
    Retry {
        attempt: u32,
        delay: Duration,
        error: SpeechError,
    },
    Fatal(SpeechError),
}

/// Progress through one chain of reconnect attempts
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetryState {
    /// Retries scheduled so far in this chain
    pub attempt: u32,
    pub last_error: Option<SpeechError>,
    pub next_delay: Option<Duration>,
}

impl RetryState {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Commit a scheduled retry
    pub fn record(&mut self, attempt: u32, delay: Duration, error: SpeechError) {
        self.attempt = attempt;
        self.next_delay = Some(delay);
        self.last_error = Some(error);
    }
}

/// Failure classification and exponential back-off
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Classify a provider failure by its code, then by keywords in the detail
    pub fn classify(&self, error: &ProviderError) -> Classification {
        let kind = match error.code {
            CancellationCode::AuthenticationFailure | CancellationCode::TooManyRequests => {
                ErrorKind::Quota
            }
            CancellationCode::Forbidden => ErrorKind::Permission,
            CancellationCode::ConnectionFailure
            | CancellationCode::ServiceTimeout
            | CancellationCode::ServiceUnavailable => ErrorKind::Network,
            CancellationCode::BadRequest
            | CancellationCode::RuntimeError
            | CancellationCode::Unspecified => classify_message(&error.detail),
        };
        Classification::of(kind)
    }

    /// `base_delay * 2^(attempt-1)`, attempt starting at 1
    pub fn next_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(1u32 << exponent)
    }

    pub fn should_retry(&self, attempt: u32, classification: Classification) -> bool {
        classification.recoverable && attempt <= self.max_attempts
    }

    /// Decide the next step for a failure without mutating `state`
    pub fn decide(
        &self,
        state: &RetryState,
        classification: Classification,
        detail: &str,
    ) -> Disposition {
        let error = SpeechError::from_kind(classification.kind, detail);
        if !classification.recoverable {
            return Disposition::Fatal(error);
        }

        let attempt = state.attempt + 1;
        if self.should_retry(attempt, classification) {
            Disposition::Retry {
                attempt,
                delay: self.next_delay(attempt),
                error,
            }
        } else {
            Disposition::Fatal(SpeechError::RetriesExhausted {
                attempts: state.attempt,
                detail: detail.to_string(),
            })
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(1000))
    }
}

/// Keyword classification for free-form provider messages
pub fn classify_message(message: &str) -> ErrorKind {
    let lower = message.to_lowercase();
    let has = |words: &[&str]| words.iter().any(|w| lower.contains(w));

    if has(PERMISSION_KEYWORDS) {
        ErrorKind::Permission
    } else if has(QUOTA_KEYWORDS) {
        ErrorKind::Quota
    } else if has(NETWORK_KEYWORDS) {
        ErrorKind::Network
    } else {
        ErrorKind::Unknown
    }
}
