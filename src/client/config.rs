use std::str::FromStr;

use secrecy::SecretString;

use crate::audio::{clamp_volume, AudioFormat, DEFAULT_VOLUME};
use crate::client::consts::{
    BASE_URL, BUNDLE_IDENTIFIER_HEADER, GEMINI_API_KEY, GEMINI_LIVE_FLUSH_POLICY,
    GEMINI_LIVE_MODEL, GEMINI_LIVE_TRANSCRIPTION,
};
use crate::error::ConfigError;
use crate::session::FlushPolicy;
use crate::types::setup::GenerationConfig;
use crate::types::tools::Tool;
use crate::types::{Modality, Setup, SupportedModel};

pub struct Config {
    base_url: String,
    api_key: SecretString,
    headers: Vec<(String, String)>,
    model: SupportedModel,
    response_modality: Option<Modality>,
    generation_config: Option<GenerationConfig>,
    system_instruction: Option<String>,
    tools: Vec<Tool>,
    transcription: bool,
    flush_policy: FlushPolicy,
    playback_format: AudioFormat,
    capture_format: AudioFormat,
    volume: f32,
}

pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.config.base_url = base_url.to_string();
        self
    }

    pub fn with_api_key(mut self, api_key: &str) -> Self {
        self.config.api_key = SecretString::from(api_key.to_string());
        self
    }

    /// Add a header to the upgrade request. A later header with the same
    /// name replaces an earlier one.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.config.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn with_bundle_identifier(self, bundle_id: &str) -> Self {
        self.with_header(BUNDLE_IDENTIFIER_HEADER, bundle_id)
    }

    pub fn with_model(mut self, model: SupportedModel) -> Self {
        self.config.model = model;
        self
    }

    pub fn with_response_modality(mut self, modality: Modality) -> Self {
        self.config.response_modality = Some(modality);
        self
    }

    /// Replaces every generation option, including the response modality
    /// unless `with_response_modality` is also used.
    pub fn with_generation_config(mut self, generation_config: GenerationConfig) -> Self {
        self.config.generation_config = Some(generation_config);
        self
    }

    pub fn with_system_instruction(mut self, instruction: &str) -> Self {
        self.config.system_instruction = Some(instruction.to_string());
        self
    }

    pub fn with_tools(mut self, tools: Vec<Tool>) -> Self {
        self.config.tools = tools;
        self
    }

    pub fn with_transcription(mut self, enabled: bool) -> Self {
        self.config.transcription = enabled;
        self
    }

    pub fn with_flush_policy(mut self, flush_policy: FlushPolicy) -> Self {
        self.config.flush_policy = flush_policy;
        self
    }

    pub fn with_playback_format(mut self, format: AudioFormat) -> Self {
        self.config.playback_format = format;
        self
    }

    pub fn with_capture_format(mut self, format: AudioFormat) -> Self {
        self.config.capture_format = format;
        self
    }

    pub fn with_volume(mut self, volume: f32) -> Self {
        self.config.volume = clamp_volume(volume);
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Self {
            base_url: BASE_URL.to_string(),
            api_key: std::env::var(GEMINI_API_KEY)
                .unwrap_or_else(|_| "".to_string())
                .into(),
            headers: Vec::new(),
            model: SupportedModel::default(),
            response_modality: None,
            generation_config: None,
            system_instruction: None,
            tools: Vec::new(),
            transcription: true,
            flush_policy: FlushPolicy::default(),
            playback_format: AudioFormat::playback(),
            capture_format: AudioFormat::capture(),
            volume: DEFAULT_VOLUME,
        }
    }

    /// Defaults plus the `GEMINI_LIVE_*` overrides from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Like [`Config::from_env`], reading variables through `lookup`.
    pub fn from_vars<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::new();
        if let Some(api_key) = lookup(GEMINI_API_KEY) {
            config.api_key = api_key.into();
        }
        if let Some(model) = lookup(GEMINI_LIVE_MODEL) {
            // unknown names become `Custom`, so this never fails
            config.model = SupportedModel::from_str(model.trim()).unwrap_or_default();
        }
        if let Some(policy) = lookup(GEMINI_LIVE_FLUSH_POLICY) {
            config.flush_policy = policy.parse()?;
        }
        if let Some(value) = lookup(GEMINI_LIVE_TRANSCRIPTION) {
            config.transcription = parse_bool(&value).ok_or(ConfigError::InvalidValue {
                name: GEMINI_LIVE_TRANSCRIPTION,
                value,
            })?;
        }
        Ok(config)
    }

    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn api_key(&self) -> &SecretString {
        &self.api_key
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn model(&self) -> &SupportedModel {
        &self.model
    }

    pub fn transcription(&self) -> bool {
        self.transcription
    }

    pub fn flush_policy(&self) -> FlushPolicy {
        self.flush_policy
    }

    pub fn playback_format(&self) -> AudioFormat {
        self.playback_format
    }

    pub fn capture_format(&self) -> AudioFormat {
        self.capture_format
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// The handshake payload for a new session.
    pub fn setup(&self) -> Setup {
        let mut builder = Setup::builder(self.model.clone());
        if let Some(generation_config) = self.generation_config.clone() {
            builder = builder.with_generation_config(generation_config);
        }
        if let Some(modality) = self.response_modality {
            builder = builder.with_response_modality(modality);
        }
        if let Some(instruction) = self.system_instruction.as_deref() {
            builder = builder.with_system_instruction(instruction);
        }
        builder
            .with_tools(self.tools.clone())
            .with_transcription(self.transcription)
            .build()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
