use std::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;

use crate::audio::{wav, AudioFormat};
use crate::error::ConfigError;
use crate::types::Part;

/// When buffered model output is handed downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlushPolicy {
    /// Hold everything until the turn completes (`all`).
    #[default]
    OnTurnComplete,
    /// Flush as soon as this many server messages are buffered (`threshold(n)`).
    WhenBufferedReach(NonZeroUsize),
}

impl FlushPolicy {
    /// `None` when `n` is zero.
    pub fn threshold(n: usize) -> Option<Self> {
        NonZeroUsize::new(n).map(FlushPolicy::WhenBufferedReach)
    }
}

impl fmt::Display for FlushPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlushPolicy::OnTurnComplete => write!(f, "all"),
            FlushPolicy::WhenBufferedReach(n) => write!(f, "threshold({})", n),
        }
    }
}

impl FromStr for FlushPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        if normalized == "all" {
            return Ok(FlushPolicy::OnTurnComplete);
        }
        normalized
            .strip_prefix("threshold(")
            .and_then(|rest| rest.strip_suffix(')'))
            .and_then(|n| n.trim().parse::<usize>().ok())
            .and_then(FlushPolicy::threshold)
            .ok_or_else(|| ConfigError::InvalidFlushPolicy(s.to_string()))
    }
}

/// The output of one flush. Owns everything that was buffered.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TurnFlush {
    /// Audio parts combined into a WAV container, if there were any.
    pub audio: Option<Vec<u8>>,
    /// Text parts concatenated in arrival order.
    pub text: String,
    /// Number of server messages that went into this flush.
    pub messages: usize,
}

impl TurnFlush {
    pub fn is_empty(&self) -> bool {
        self.audio.is_none() && self.text.is_empty()
    }
}

/// Buffers model output for the current turn and decides when to flush it.
#[derive(Debug)]
pub struct TurnAggregator {
    policy: FlushPolicy,
    format: AudioFormat,
    messages: Vec<Vec<Part>>,
}

impl TurnAggregator {
    pub fn new(policy: FlushPolicy, format: AudioFormat) -> Self {
        Self {
            policy,
            format,
            messages: Vec::new(),
        }
    }

    pub fn policy(&self) -> FlushPolicy {
        self.policy
    }

    pub fn buffered_messages(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Buffer the parts of one server message. Returns a flush if the policy
    /// calls for one now.
    pub fn push(&mut self, parts: Vec<Part>) -> Option<TurnFlush> {
        self.messages.push(parts);
        let policy = self.policy;
        match policy {
            FlushPolicy::WhenBufferedReach(threshold) if self.messages.len() >= threshold.get() => {
                tracing::debug!("buffered {} messages, flushing mid-turn", self.messages.len());
                Some(self.flush())
            }
            _ => None,
        }
    }

    /// The turn is over: flush unconditionally. May be empty after a threshold flush.
    pub fn complete(&mut self) -> TurnFlush {
        self.flush()
    }

    /// Drop everything buffered without producing output.
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    fn flush(&mut self) -> TurnFlush {
        let messages = std::mem::take(&mut self.messages);
        let count = messages.len();

        let mut audio = Vec::new();
        let mut text = String::new();
        for part in messages.into_iter().flatten() {
            let (part_text, inline_data) = part.into_parts();
            if let Some(t) = part_text {
                text.push_str(&t);
            }
            match inline_data {
                Some(blob) if blob.is_audio() => audio.push(blob.into_data()),
                Some(blob) => tracing::debug!("ignoring inline data of type {}", blob.mime_type()),
                None => {}
            }
        }

        TurnFlush {
            audio: wav::combine_and_wrap(&audio, self.format),
            text,
            messages: count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Blob;
    use base64::Engine;

    fn audio_part(bytes: &[u8]) -> Part {
        let data = base64::engine::general_purpose::STANDARD.encode(bytes);
        Part::inline_data(Blob::new("audio/pcm;rate=24000", data))
    }

    #[test]
    fn test_flush_policy_parse() {
        assert_eq!("all".parse::<FlushPolicy>().unwrap(), FlushPolicy::OnTurnComplete);
        assert_eq!(" ALL ".parse::<FlushPolicy>().unwrap(), FlushPolicy::OnTurnComplete);
        assert_eq!("threshold(3)".parse::<FlushPolicy>().unwrap(), FlushPolicy::threshold(3).unwrap());
        assert!("threshold(0)".parse::<FlushPolicy>().is_err());
        assert!("threshold(x)".parse::<FlushPolicy>().is_err());
        assert!("eager".parse::<FlushPolicy>().is_err());
        assert_eq!(FlushPolicy::threshold(5).unwrap().to_string(), "threshold(5)");
        assert_eq!(FlushPolicy::OnTurnComplete.to_string(), "all");
    }

    #[test]
    fn test_holds_until_turn_complete() {
        let mut turn = TurnAggregator::new(FlushPolicy::OnTurnComplete, AudioFormat::playback());
        assert!(turn.push(vec![audio_part(&[1, 2])]).is_none());
        assert!(turn.push(vec![Part::text("Hi "), audio_part(&[3, 4])]).is_none());
        assert!(turn.push(vec![Part::text("there")]).is_none());
        assert_eq!(turn.buffered_messages(), 3);

        let flush = turn.complete();
        assert!(turn.is_empty());
        assert_eq!(flush.messages, 3);
        assert_eq!(flush.text, "Hi there");
        assert_eq!(wav::wav_to_pcm(&flush.audio.unwrap()), &[1, 2, 3, 4]);
    }

    #[test]
    fn test_threshold_flushes_mid_turn() {
        let mut turn = TurnAggregator::new(FlushPolicy::threshold(2).unwrap(), AudioFormat::playback());
        assert!(turn.push(vec![audio_part(&[1, 2])]).is_none());

        let flush = turn.push(vec![audio_part(&[3, 4]), audio_part(&[5, 6])]).unwrap();
        assert!(turn.is_empty());
        assert_eq!(flush.messages, 2);
        assert_eq!(wav::wav_to_pcm(&flush.audio.unwrap()), &[1, 2, 3, 4, 5, 6]);

        // the completing flush that follows is a no-op
        let flush = turn.complete();
        assert!(flush.is_empty());
        assert_eq!(flush.messages, 0);
    }

    #[test]
    fn test_threshold_counts_messages_not_parts() {
        let mut turn = TurnAggregator::new(FlushPolicy::threshold(2).unwrap(), AudioFormat::playback());
        let parts = vec![audio_part(&[1]), audio_part(&[2]), audio_part(&[3])];
        assert!(turn.push(parts).is_none());
        assert_eq!(turn.buffered_messages(), 1);
    }

    #[test]
    fn test_text_only_turn_has_no_audio() {
        let mut turn = TurnAggregator::new(FlushPolicy::OnTurnComplete, AudioFormat::playback());
        turn.push(vec![Part::text("just words")]);
        turn.push(vec![Part::inline_data(Blob::new("image/png", "AAAA".to_string()))]);
        let flush = turn.complete();
        assert!(flush.audio.is_none());
        assert_eq!(flush.text, "just words");
    }

    #[test]
    fn test_clear() {
        let mut turn = TurnAggregator::new(FlushPolicy::OnTurnComplete, AudioFormat::playback());
        turn.push(vec![audio_part(&[1, 2])]);
        turn.clear();
        assert!(turn.complete().is_empty());
    }
}
