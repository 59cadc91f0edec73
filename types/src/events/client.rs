use crate::audio::{Base64EncodedAudioBytes, DEFAULT_INPUT_MIME_TYPE};
use crate::content::parts::Blob;
use crate::setup::Setup;

/// A message sent from the client. Each variant is a single-key JSON object,
/// e.g. `{"setup": {...}}` or `{"realtimeInput": {...}}`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ClientMessage {
    Setup(Setup),
    RealtimeInput(RealtimeInput),
}

/// `realtimeInput` payload. The fields are mutually optional; the helpers
/// below each build a message carrying exactly one of them.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RealtimeInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    audio: Option<Blob>,
    #[serde(skip_serializing_if = "Option::is_none")]
    video: Option<Blob>,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    audio_stream_end: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    activity_start: Option<ActivityStart>,
    #[serde(skip_serializing_if = "Option::is_none")]
    activity_end: Option<ActivityEnd>,
}

impl RealtimeInput {
    pub fn audio(data: Base64EncodedAudioBytes, mime_type: &str) -> Self {
        Self {
            audio: Some(Blob::new(mime_type, data)),
            ..Default::default()
        }
    }

    /// Audio chunk with the default 16kHz PCM mime type.
    pub fn audio_pcm(data: Base64EncodedAudioBytes) -> Self {
        Self::audio(data, DEFAULT_INPUT_MIME_TYPE)
    }

    /// A single image frame, e.g. `image/jpeg`.
    pub fn video(data: Base64EncodedAudioBytes, mime_type: &str) -> Self {
        Self {
            video: Some(Blob::new(mime_type, data)),
            ..Default::default()
        }
    }

    pub fn text(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            ..Default::default()
        }
    }

    pub fn audio_stream_end() -> Self {
        Self {
            audio_stream_end: Some(true),
            ..Default::default()
        }
    }

    pub fn activity_start() -> Self {
        Self {
            activity_start: Some(ActivityStart {}),
            ..Default::default()
        }
    }

    pub fn activity_end() -> Self {
        Self {
            activity_end: Some(ActivityEnd {}),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ActivityStart {}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ActivityEnd {}
