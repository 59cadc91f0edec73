mod io;
pub mod wav;

pub use io::{AudioInput, AudioOutput};

use crate::types::audio::pcm_mime_type;

/// Default playback volume for rendered turns.
pub const DEFAULT_VOLUME: f32 = 0.9;

/// Shape of a raw PCM stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFormat {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Number of interleaved channels.
    pub channels: u16,
    pub bits_per_sample: u16,
}

impl AudioFormat {
    pub fn new(sample_rate: u32, channels: u16, bits_per_sample: u16) -> Self {
        Self {
            sample_rate,
            channels,
            bits_per_sample,
        }
    }

    /// 24kHz mono 16-bit, what the model speaks in.
    pub fn playback() -> Self {
        Self::new(24000, 1, 16)
    }

    /// 16kHz mono 16-bit, what the model expects to hear.
    pub fn capture() -> Self {
        Self::new(16000, 1, 16)
    }

    /// Bytes per frame. Saturates at `u16::MAX` for formats a WAV header cannot describe.
    pub fn block_align(&self) -> u16 {
        self.channels.saturating_mul(self.bits_per_sample / 8)
    }

    /// Bytes per second. Saturates at `u32::MAX`.
    pub fn byte_rate(&self) -> u32 {
        self.sample_rate.saturating_mul(u32::from(self.block_align()))
    }

    /// Duration in milliseconds of `bytes` of audio in this format.
    pub fn duration_ms(&self, bytes: usize) -> f64 {
        match self.byte_rate() {
            0 => 0.0,
            rate => bytes as f64 * 1000.0 / rate as f64,
        }
    }

    /// `audio/pcm;rate=<n>` for this format's sample rate.
    pub fn mime_type(&self) -> String {
        pcm_mime_type(self.sample_rate)
    }
}

impl Default for AudioFormat {
    fn default() -> Self {
        Self::playback()
    }
}

/// Clamp a volume into `[0.0, 1.0]`.
pub fn clamp_volume(volume: f32) -> f32 {
    if volume.is_nan() {
        return 0.0;
    }
    volume.clamp(0.0, 1.0)
}
