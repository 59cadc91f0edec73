use crate::audio::AudioTranscriptionConfig;
use crate::content::parts::Content;
use crate::model::{Modality, SupportedModel};
use crate::tools::Tool;

/// The body of the `setup` handshake message.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Setup {
    /// The model to talk to, sent as `models/<name>`.
    model: SupportedModel,

    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,

    /// System instructions prepended to the conversation.
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,

    /// Tools (function declarations) available to the model.
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<Tool>>,

    /// Present to have the server transcribe the caller's audio.
    #[serde(skip_serializing_if = "Option::is_none")]
    input_audio_transcription: Option<AudioTranscriptionConfig>,

    /// Present to have the server transcribe the model's audio.
    #[serde(skip_serializing_if = "Option::is_none")]
    output_audio_transcription: Option<AudioTranscriptionConfig>,
}

impl Setup {
    pub fn builder(model: SupportedModel) -> SetupConfigurator {
        SetupConfigurator::new(model)
    }

    pub fn model(&self) -> &SupportedModel {
        &self.model
    }

    pub fn generation_config(&self) -> Option<&GenerationConfig> {
        self.generation_config.as_ref()
    }

    pub fn system_instruction(&self) -> Option<&Content> {
        self.system_instruction.as_ref()
    }

    pub fn tools(&self) -> &[Tool] {
        self.tools.as_deref().unwrap_or_default()
    }

    pub fn input_audio_transcription(&self) -> bool {
        self.input_audio_transcription.is_some()
    }

    pub fn output_audio_transcription(&self) -> bool {
        self.output_audio_transcription.is_some()
    }
}

impl Default for Setup {
    fn default() -> Self {
        SetupConfigurator::new(SupportedModel::default()).build()
    }
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    response_modalities: Option<Vec<Modality>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    candidate_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    frequency_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    presence_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    speech_config: Option<SpeechConfig>,
}

impl GenerationConfig {
    pub fn new(response_modality: Modality) -> Self {
        Self {
            response_modalities: Some(vec![response_modality]),
            ..Default::default()
        }
    }

    pub fn response_modalities(&self) -> &[Modality] {
        self.response_modalities.as_deref().unwrap_or_default()
    }

    pub fn with_response_modality(mut self, modality: Modality) -> Self {
        self.response_modalities = Some(vec![modality]);
        self
    }

    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = Some(max_output_tokens);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }

    pub fn with_top_k(mut self, top_k: u32) -> Self {
        self.top_k = Some(top_k);
        self
    }

    pub fn with_candidate_count(mut self, candidate_count: u32) -> Self {
        self.candidate_count = Some(candidate_count);
        self
    }

    pub fn with_frequency_penalty(mut self, frequency_penalty: f32) -> Self {
        self.frequency_penalty = Some(frequency_penalty);
        self
    }

    pub fn with_presence_penalty(mut self, presence_penalty: f32) -> Self {
        self.presence_penalty = Some(presence_penalty);
        self
    }

    pub fn with_speech_config(mut self, speech_config: SpeechConfig) -> Self {
        self.speech_config = Some(speech_config);
        self
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SpeechConfig {
    /// BCP-47 language code of the spoken output, e.g. "ja-JP".
    /// The server takes this one key in snake case.
    #[serde(skip_serializing_if = "Option::is_none")]
    language_code: Option<String>,
}

impl SpeechConfig {
    pub fn new(language_code: &str) -> Self {
        Self {
            language_code: Some(language_code.to_string()),
        }
    }

    pub fn language_code(&self) -> Option<&str> {
        self.language_code.as_deref()
    }
}

pub struct SetupConfigurator {
    setup: Setup,
}

impl SetupConfigurator {
    pub fn new(model: SupportedModel) -> Self {
        let modality = model.response_modality();
        Self {
            setup: Setup {
                model,
                generation_config: Some(GenerationConfig::new(modality)),
                system_instruction: None,
                tools: None,
                input_audio_transcription: None,
                output_audio_transcription: None,
            },
        }
    }

    pub fn with_response_modality(mut self, modality: Modality) -> Self {
        let config = self.setup.generation_config.take().unwrap_or_default();
        self.setup.generation_config = Some(config.with_response_modality(modality));
        self
    }

    pub fn with_generation_config(mut self, generation_config: GenerationConfig) -> Self {
        self.setup.generation_config = Some(generation_config);
        self
    }

    pub fn with_system_instruction(mut self, instruction: &str) -> Self {
        self.setup.system_instruction = Some(Content::from_text(instruction));
        self
    }

    pub fn with_tools(mut self, tools: Vec<Tool>) -> Self {
        self.setup.tools = if tools.is_empty() { None } else { Some(tools) };
        self
    }

    pub fn with_input_audio_transcription(mut self, enabled: bool) -> Self {
        self.setup.input_audio_transcription = enabled.then(AudioTranscriptionConfig::new);
        self
    }

    pub fn with_output_audio_transcription(mut self, enabled: bool) -> Self {
        self.setup.output_audio_transcription = enabled.then(AudioTranscriptionConfig::new);
        self
    }

    /// Turns transcription of both directions on or off.
    pub fn with_transcription(self, enabled: bool) -> Self {
        self.with_input_audio_transcription(enabled)
            .with_output_audio_transcription(enabled)
    }

    pub fn build(self) -> Setup {
        self.setup
    }
}
