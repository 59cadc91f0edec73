//! JSON encoding of client messages and decoding of server frames.

use crate::error::{DecodeError, EncodingError};
use crate::types::audio::Base64EncodedAudioBytes;
use crate::types::events::{ClientMessage, RealtimeInput, ServerMessage, UsageMetadata};
use crate::types::{Part, Setup};

/// One logical event extracted from a server frame.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    HandshakeAck,
    /// The parts of one `modelTurn` message.
    ModelOutput(Vec<Part>),
    InputTranscriptDelta(String),
    OutputTranscriptDelta(String),
    TurnComplete,
    UsageMetadata(UsageMetadata),
    /// Synthesized from the transport, never decoded.
    TransportClosed,
}

impl InboundEvent {
    pub fn name(&self) -> &'static str {
        match self {
            InboundEvent::HandshakeAck => "setupComplete",
            InboundEvent::ModelOutput(_) => "modelTurn",
            InboundEvent::InputTranscriptDelta(_) => "inputTranscription",
            InboundEvent::OutputTranscriptDelta(_) => "outputTranscription",
            InboundEvent::TurnComplete => "turnComplete",
            InboundEvent::UsageMetadata(_) => "usageMetadata",
            InboundEvent::TransportClosed => "transportClosed",
        }
    }
}

pub fn encode_handshake(setup: &Setup) -> Result<String, EncodingError> {
    encode(&ClientMessage::Setup(setup.clone()))
}

pub fn encode_audio_chunk(
    data: Base64EncodedAudioBytes,
    mime_type: &str,
) -> Result<String, EncodingError> {
    encode_realtime_input(RealtimeInput::audio(data, mime_type))
}

pub fn encode_realtime_input(input: RealtimeInput) -> Result<String, EncodingError> {
    encode(&ClientMessage::RealtimeInput(input))
}

fn encode(message: &ClientMessage) -> Result<String, EncodingError> {
    Ok(serde_json::to_string(message)?)
}

/// Decode a server frame into the events it carries.
///
/// A single frame can hold several events; they come back in the order
/// ack, model output, input transcript, output transcript, usage, turn complete.
/// A well-formed frame with none of these is `DecodeError::Unrecognized`.
pub fn decode(frame: &[u8]) -> Result<Vec<InboundEvent>, DecodeError> {
    let message: ServerMessage = serde_json::from_slice(frame)?;
    let events = into_events(message);
    if events.is_empty() {
        return Err(DecodeError::Unrecognized);
    }
    Ok(events)
}

fn into_events(message: ServerMessage) -> Vec<InboundEvent> {
    let mut events = Vec::new();

    if message.setup_complete.is_some() {
        events.push(InboundEvent::HandshakeAck);
    }

    let mut turn_complete = false;
    if let Some(content) = message.server_content {
        turn_complete = content.is_turn_complete();
        if let Some(model_turn) = content.model_turn {
            events.push(InboundEvent::ModelOutput(model_turn.parts));
        }
        if let Some(transcription) = content.input_transcription {
            events.push(InboundEvent::InputTranscriptDelta(transcription.text));
        }
        if let Some(transcription) = content.output_transcription {
            events.push(InboundEvent::OutputTranscriptDelta(transcription.text));
        }
    }

    if let Some(usage) = message.usage_metadata {
        events.push(InboundEvent::UsageMetadata(usage));
    }

    if turn_complete {
        events.push(InboundEvent::TurnComplete);
    }

    events
}
