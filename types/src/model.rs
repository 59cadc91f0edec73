use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Namespace the Live API expects in front of every model name.
pub const MODEL_NAMESPACE: &str = "models";

/// The kind of output the model responds with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Modality {
    Text,
    Audio,
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Modality::Text => write!(f, "TEXT"),
            Modality::Audio => write!(f, "AUDIO"),
        }
    }
}

/// Models known to speak the Live protocol.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SupportedModel {
    Gemini25FlashNativeAudioPreview092025,
    #[default]
    Gemini25FlashNativeAudioPreview122025,
    Custom(String),
}

impl SupportedModel {
    pub fn model_name(&self) -> &str {
        match self {
            SupportedModel::Gemini25FlashNativeAudioPreview092025 => {
                "gemini-2.5-flash-native-audio-preview-09-2025"
            }
            SupportedModel::Gemini25FlashNativeAudioPreview122025 => {
                "gemini-2.5-flash-native-audio-preview-12-2025"
            }
            SupportedModel::Custom(name) => name,
        }
    }

    /// The name as sent in the handshake, e.g. `models/gemini-...`.
    pub fn qualified_name(&self) -> String {
        format!("{}/{}", MODEL_NAMESPACE, self.model_name())
    }

    pub fn response_modality(&self) -> Modality {
        match self {
            SupportedModel::Gemini25FlashNativeAudioPreview092025
            | SupportedModel::Gemini25FlashNativeAudioPreview122025 => Modality::Audio,
            // native-audio models are the only ones listed; unknown ones get text
            SupportedModel::Custom(_) => Modality::Text,
        }
    }
}

impl fmt::Display for SupportedModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.model_name())
    }
}

impl FromStr for SupportedModel {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.strip_prefix("models/").unwrap_or(s);
        Ok(match name {
            "gemini-2.5-flash-native-audio-preview-09-2025" => {
                SupportedModel::Gemini25FlashNativeAudioPreview092025
            }
            "gemini-2.5-flash-native-audio-preview-12-2025" => {
                SupportedModel::Gemini25FlashNativeAudioPreview122025
            }
            _ => SupportedModel::Custom(name.to_string()),
        })
    }
}

impl Serialize for SupportedModel {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.qualified_name())
    }
}

impl<'de> Deserialize<'de> for SupportedModel {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        match SupportedModel::from_str(&s) {
            Ok(model) => Ok(model),
            Err(never) => match never {},
        }
    }
}
