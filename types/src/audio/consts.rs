/// Mime type the Live API expects for 16-bit little-endian PCM captured at 16kHz.
pub const DEFAULT_INPUT_MIME_TYPE: &str = "audio/pcm;rate=16000";

/// Mime type prefix shared by every audio payload.
pub const AUDIO_MIME_PREFIX: &str = "audio";

/// Builds the `audio/pcm;rate=<n>` mime type for raw PCM at the given sample rate.
pub fn pcm_mime_type(sample_rate: u32) -> String {
    format!("audio/pcm;rate={}", sample_rate)
}

/// Whether an inline-data mime type carries audio.
pub fn is_audio_mime_type(mime_type: &str) -> bool {
    mime_type.contains(AUDIO_MIME_PREFIX)
}
