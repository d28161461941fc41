use super::types::ChunkSignal;

/// Decides when the growing interim transcript is worth translating
///
/// Translating every interim update is wasteful and flickers; batching by a
/// word threshold bounds both latency and translation volume.
#[derive(Debug, Clone)]
pub struct ChunkAggregator {
    min_words: usize,
    last_signaled: usize,
    last_observed: usize,
}

impl ChunkAggregator {
    pub fn new(min_words: usize) -> Self {
        Self {
            min_words,
            last_signaled: 0,
            last_observed: 0,
        }
    }

    /// Feed the latest interim text; returns a signal when enough new words arrived
    pub fn observe(&mut self, interim_text: &str) -> Option<ChunkSignal> {
        let word_count = word_count(interim_text);

        if word_count < self.last_observed {
            // Shrinking transcript means the recognizer started a new utterance
            self.last_signaled = 0;
            self.last_observed = word_count;
            return None;
        }
        self.last_observed = word_count;

        if word_count >= self.min_words && word_count > self.last_signaled {
            self.last_signaled = word_count;
            return Some(ChunkSignal {
                text: interim_text.trim().to_string(),
                word_count,
            });
        }

        None
    }

    /// Called when the utterance ends with a final result
    pub fn reset(&mut self) {
        self.last_signaled = 0;
        self.last_observed = 0;
    }
}

impl Default for ChunkAggregator {
    fn default() -> Self {
        Self::new(5)
    }
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}
