use crate::audio::{is_audio_mime_type, Base64EncodedAudioBytes};

/// Inline binary payload: a mime type plus base64 data.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blob {
    mime_type: String,
    data: Base64EncodedAudioBytes,
}

impl Blob {
    pub fn new(mime_type: &str, data: Base64EncodedAudioBytes) -> Self {
        Self {
            mime_type: mime_type.to_string(),
            data,
        }
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn data(&self) -> &str {
        &self.data
    }

    pub fn into_data(self) -> Base64EncodedAudioBytes {
        self.data
    }

    pub fn is_audio(&self) -> bool {
        is_audio_mime_type(&self.mime_type)
    }
}

/// One fragment of a turn: text, inline data, or (rarely) both.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<Blob>,
}

impl Part {
    pub fn text(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            inline_data: None,
        }
    }

    pub fn inline_data(blob: Blob) -> Self {
        Self {
            text: None,
            inline_data: Some(blob),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn as_inline_data(&self) -> Option<&Blob> {
        self.inline_data.as_ref()
    }

    pub fn into_parts(self) -> (Option<String>, Option<Blob>) {
        (self.text, self.inline_data)
    }
}

/// An ordered list of parts, as used by `systemInstruction` and `modelTurn`.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

impl Content {
    pub fn new(parts: Vec<Part>) -> Self {
        Self { parts }
    }

    pub fn from_text(text: &str) -> Self {
        Self::new(vec![Part::text(text)])
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    pub fn into_parts(self) -> Vec<Part> {
        self.parts
    }
}
