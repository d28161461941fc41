use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Coarse category of a speech failure, as delivered to error listeners
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Microphone or credentials denied
    Permission,
    /// Connectivity, timeout or temporary unavailability
    Network,
    /// Audio was heard but nothing was recognized
    NoMatch,
    /// Quota exhausted or credentials misconfigured
    Quota,
    /// Continuous session ended without being asked to
    UnexpectedTermination,
    /// Anything the classifier could not place
    Unknown,
}

impl ErrorKind {
    /// Whether a failure of this kind is worth retrying
    pub fn is_recoverable(self) -> bool {
        matches!(self, ErrorKind::Network | ErrorKind::UnexpectedTermination)
    }
}

/// Errors surfaced by the speech session layer
///
/// `Display` is the stable, user-facing message. Raw provider detail is kept
/// in the variant for logging and is never shown to the user.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SpeechError {
    #[error("Microphone or speech service access was denied. Check permissions and try again.")]
    Permission { detail: String },

    #[error("The speech service is temporarily unreachable.")]
    Network { detail: String },

    #[error("Nothing was recognized. Please repeat.")]
    NoMatch,

    #[error("The speech service quota or credentials are misconfigured. Contact an administrator.")]
    Quota { detail: String },

    #[error("The speech session ended unexpectedly.")]
    UnexpectedTermination,

    #[error("The speech service could not be reached after {attempts} attempts.")]
    RetriesExhausted { attempts: u32, detail: String },

    #[error("There is no speech session to resume.")]
    NotStarted,

    #[error("The speech session controller is no longer running.")]
    ControllerClosed,

    #[error("The speech service reported an error.")]
    Provider { detail: String },
}

impl SpeechError {
    /// Build the error for a classified provider failure
    pub fn from_kind(kind: ErrorKind, detail: impl Into<String>) -> Self {
        let detail = detail.into();
        match kind {
            ErrorKind::Permission => SpeechError::Permission { detail },
            ErrorKind::Network => SpeechError::Network { detail },
            ErrorKind::NoMatch => SpeechError::NoMatch,
            ErrorKind::Quota => SpeechError::Quota { detail },
            ErrorKind::UnexpectedTermination => SpeechError::UnexpectedTermination,
            ErrorKind::Unknown => SpeechError::Provider { detail },
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            SpeechError::Permission { .. } => ErrorKind::Permission,
            SpeechError::Network { .. } | SpeechError::RetriesExhausted { .. } => ErrorKind::Network,
            SpeechError::NoMatch => ErrorKind::NoMatch,
            SpeechError::Quota { .. } => ErrorKind::Quota,
            SpeechError::UnexpectedTermination => ErrorKind::UnexpectedTermination,
            SpeechError::NotStarted | SpeechError::ControllerClosed | SpeechError::Provider { .. } => {
                ErrorKind::Unknown
            }
        }
    }

    /// Raw provider detail, if any
    pub fn detail(&self) -> Option<&str> {
        match self {
            SpeechError::Permission { detail }
            | SpeechError::Network { detail }
            | SpeechError::Quota { detail }
            | SpeechError::RetriesExhausted { detail, .. }
            | SpeechError::Provider { detail } => Some(detail),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_hides_provider_detail() {
        let err = SpeechError::from_kind(ErrorKind::Quota, "HTTP 429 subscription key xyz");
        let message = err.to_string();
        assert!(!message.contains("xyz"));
        assert_eq!(err.detail(), Some("HTTP 429 subscription key xyz"));
        assert_eq!(err.kind(), ErrorKind::Quota);
    }

    #[test]
    fn test_quota_and_network_messages_differ() {
        let quota = SpeechError::from_kind(ErrorKind::Quota, "");
        let network = SpeechError::from_kind(ErrorKind::Network, "");
        assert_ne!(quota.to_string(), network.to_string());
    }
}
