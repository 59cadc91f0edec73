//! Client engine for the Gemini Live bidirectional streaming API.
//!
//! [`Client`] opens a session over a WebSocket, performs the setup
//! handshake, streams microphone audio up and turns the server's
//! interleaved output back into whole turns of audio and two continuous
//! transcripts.

pub mod audio;
pub mod codec;
pub mod error;
pub mod session;
pub mod transport;
mod client;

pub use gemini_live_types as types;
pub use client::{
    build_request, connect, connect_with_config, Client, ClientTx, Config, ConfigBuilder,
    Connection, StatusRx, Stats, TranscriptRx, TurnAudioRx, TurnTextRx, UsageRx, DEFAULT_CAPACITY,
};
pub use error::{ConfigError, ConnectError, DecodeError, EncodingError, RealtimeError, Result};
pub use session::{ConnectionStatus, FlushPolicy, TranscriptSegment, TurnAudio};

#[cfg(feature = "utils")]
pub use gemini_live_utils as utils;
