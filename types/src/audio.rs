mod consts;
mod transcription;

pub use consts::*;
pub use transcription::AudioTranscriptionConfig;

/// Audio data encoded as base64
pub type Base64EncodedAudioBytes = String;
