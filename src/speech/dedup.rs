use std::time::Duration;
use tokio::time::Instant;

/// Drops final results that repeat the previous one within a short window
///
/// Recognizers can deliver the same final utterance twice when the
/// transport retries. The same phrase spoken again later is kept.
#[derive(Debug, Clone)]
pub struct DuplicateSuppressor {
    window: Duration,
    min_chars: usize,
    last: Option<(String, Instant)>,
}

impl DuplicateSuppressor {
    pub fn new(window: Duration, min_chars: usize) -> Self {
        Self {
            window,
            min_chars,
            last: None,
        }
    }

    /// Returns true if `text` should be emitted, recording it as the latest
    pub fn should_emit(&mut self, text: &str, now: Instant) -> bool {
        let trimmed = text.trim();
        if trimmed.chars().count() < self.min_chars {
            return false;
        }

        if let Some((last_text, emitted_at)) = &self.last {
            if last_text == trimmed && now.saturating_duration_since(*emitted_at) < self.window {
                return false;
            }
        }

        self.last = Some((trimmed.to_string(), now));
        true
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

impl Default for DuplicateSuppressor {
    fn default() -> Self {
        Self::new(Duration::from_millis(2000), 2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeat_inside_window_is_dropped() {
        let mut dedup = DuplicateSuppressor::default();
        let t0 = Instant::now();

        assert!(dedup.should_emit("hello", t0));
        assert!(!dedup.should_emit("hello", t0 + Duration::from_millis(1000)));
        assert!(dedup.should_emit("hello", t0 + Duration::from_millis(3000)));
    }

    #[test]
    fn test_window_measured_from_last_emission() {
        let mut dedup = DuplicateSuppressor::default();
        let t0 = Instant::now();

        assert!(dedup.should_emit("hello", t0));
        // Suppressed repeats do not extend the window
        assert!(!dedup.should_emit("hello", t0 + Duration::from_millis(1500)));
        assert!(dedup.should_emit("hello", t0 + Duration::from_millis(2000)));
    }

    #[test]
    fn test_different_text_passes() {
        let mut dedup = DuplicateSuppressor::default();
        let t0 = Instant::now();

        assert!(dedup.should_emit("hello", t0));
        assert!(dedup.should_emit("goodbye", t0 + Duration::from_millis(10)));
        assert!(dedup.should_emit("hello", t0 + Duration::from_millis(20)));
    }

    #[test]
    fn test_near_empty_text_rejected() {
        let mut dedup = DuplicateSuppressor::default();
        let now = Instant::now();

        assert!(!dedup.should_emit("", now));
        assert!(!dedup.should_emit("   ", now));
        assert!(!dedup.should_emit(" a ", now));
        assert!(dedup.should_emit("ok", now));
    }

    #[test]
    fn test_surrounding_whitespace_ignored_for_equality() {
        let mut dedup = DuplicateSuppressor::default();
        let t0 = Instant::now();

        assert!(dedup.should_emit("hello", t0));
        assert!(!dedup.should_emit(" hello ", t0 + Duration::from_millis(100)));
    }

    #[test]
    fn test_reset_forgets_last() {
        let mut dedup = DuplicateSuppressor::default();
        let t0 = Instant::now();

        assert!(dedup.should_emit("hello", t0));
        dedup.reset();
        assert!(dedup.should_emit("hello", t0 + Duration::from_millis(100)));
    }
}
