/// Enables transcription of the input or output audio stream.
///
/// The Live API takes an empty object here; its presence is the switch.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AudioTranscriptionConfig {}

impl AudioTranscriptionConfig {
    pub fn new() -> Self {
        Self::default()
    }
}
