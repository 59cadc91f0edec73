pub mod client;
pub mod server;

pub use client::{ActivityEnd, ActivityStart, ClientMessage, RealtimeInput};
pub use server::{ModelTurn, ServerContent, ServerMessage, SetupComplete, Transcription, UsageMetadata};
