use crate::content::parts::Part;

/// A message received from the server.
///
/// Every field is optional: one message may carry several of them at once,
/// and fields this crate does not model are ignored.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerMessage {
    pub setup_complete: Option<SetupComplete>,
    pub server_content: Option<ServerContent>,
    pub usage_metadata: Option<UsageMetadata>,
}

/// `setupComplete` acknowledgement; always an empty object.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SetupComplete {}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerContent {
    pub model_turn: Option<ModelTurn>,
    pub turn_complete: Option<bool>,
    pub input_transcription: Option<Transcription>,
    pub output_transcription: Option<Transcription>,
}

impl ServerContent {
    /// The server only ever sends `turnComplete: true`, so presence is what counts.
    pub fn is_turn_complete(&self) -> bool {
        self.turn_complete.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ModelTurn {
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Transcription {
    pub text: String,
}

/// Token accounting reported by the server. Kept as raw JSON and passed
/// through untouched; the accessors read the commonly present counters.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct UsageMetadata(serde_json::Value);

impl UsageMetadata {
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }

    pub fn prompt_token_count(&self) -> Option<u64> {
        self.count("promptTokenCount")
    }

    pub fn response_token_count(&self) -> Option<u64> {
        self.count("responseTokenCount")
    }

    pub fn total_token_count(&self) -> Option<u64> {
        self.count("totalTokenCount")
    }

    fn count(&self, key: &str) -> Option<u64> {
        self.0.get(key).and_then(|v| v.as_u64())
    }
}
