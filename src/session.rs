//! The session engine and the pieces it is built from.
//!
//! A [`Session`] owns one connection attempt. It runs as a single task that
//! consumes [`TransportEvent`]s in order, so the state machine, the turn
//! buffer and the transcript multiplexer never need locks of their own.

mod state;
mod transcript;
mod turn;

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::{broadcast, mpsc, oneshot, watch};

use crate::audio::{AudioFormat, AudioInput, AudioOutput};
use crate::client::Stats;
use crate::codec::{self, InboundEvent};
use crate::error::{ConnectError, DecodeError};
use crate::transport::{OutboundFrame, TransportEvent};
use crate::types::events::UsageMetadata;
use crate::types::Setup;

pub use state::{ConnectionStatus, SessionStateMachine};
pub use transcript::{TranscriptChannel, TranscriptEvent, TranscriptMultiplexer, TranscriptSegment};
pub use turn::{FlushPolicy, TurnAggregator, TurnFlush};

/// A flushed block of model audio, wrapped as WAV.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnAudio {
    pub wav: Vec<u8>,
    pub format: AudioFormat,
}

/// Outbound streams of one session. Dropping it ends every stream.
pub(crate) struct Subscribers {
    pub(crate) input_transcripts: broadcast::Sender<TranscriptSegment>,
    pub(crate) output_transcripts: broadcast::Sender<TranscriptSegment>,
    pub(crate) usage: broadcast::Sender<UsageMetadata>,
    pub(crate) turn_audio: broadcast::Sender<TurnAudio>,
    pub(crate) turn_text: broadcast::Sender<String>,
}

impl Subscribers {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            input_transcripts: broadcast::channel(capacity).0,
            output_transcripts: broadcast::channel(capacity).0,
            usage: broadcast::channel(capacity).0,
            turn_audio: broadcast::channel(capacity).0,
            turn_text: broadcast::channel(capacity).0,
        }
    }
}

/// Shared between the facade (to subscribe) and the engine (to publish).
pub(crate) type SharedSubscribers = Arc<Mutex<Option<Subscribers>>>;

pub(crate) fn lock_subscribers(hub: &SharedSubscribers) -> MutexGuard<'_, Option<Subscribers>> {
    hub.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Everything a session needs from the caller's configuration.
pub(crate) struct SessionSettings {
    pub(crate) setup: Setup,
    pub(crate) flush_policy: FlushPolicy,
    pub(crate) playback: AudioFormat,
    pub(crate) volume: f32,
    pub(crate) audio_output: Option<Box<dyn AudioOutput>>,
    pub(crate) audio_input: Option<Box<dyn AudioInput>>,
}

pub(crate) struct Session {
    state: SessionStateMachine,
    turn: TurnAggregator,
    transcripts: TranscriptMultiplexer,
    setup: Setup,
    playback: AudioFormat,
    volume: f32,
    audio_output: Option<Box<dyn AudioOutput>>,
    audio_input: Option<Box<dyn AudioInput>>,
    outbound: mpsc::Sender<OutboundFrame>,
    subscribers: SharedSubscribers,
    status: watch::Sender<ConnectionStatus>,
    stats: Arc<Mutex<Stats>>,
}

impl Session {
    /// Build a session that is already `Connecting`.
    pub(crate) fn start(
        settings: SessionSettings,
        outbound: mpsc::Sender<OutboundFrame>,
        subscribers: SharedSubscribers,
        status: watch::Sender<ConnectionStatus>,
        stats: Arc<Mutex<Stats>>,
    ) -> Result<Self, ConnectError> {
        let mut state = SessionStateMachine::new();
        state.connect()?;

        Ok(Self {
            state,
            turn: TurnAggregator::new(settings.flush_policy, settings.playback),
            transcripts: TranscriptMultiplexer::new(),
            setup: settings.setup,
            playback: settings.playback,
            volume: settings.volume,
            audio_output: settings.audio_output,
            audio_input: settings.audio_input,
            outbound,
            subscribers,
            status,
            stats,
        })
    }

    pub(crate) fn status(&self) -> ConnectionStatus {
        self.state.status()
    }

    /// Drive the session until the transport ends or `shutdown` fires.
    pub(crate) async fn run(
        mut self,
        mut events: mpsc::Receiver<TransportEvent>,
        mut shutdown: oneshot::Receiver<()>,
    ) {
        self.publish_status();

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    self.teardown("disconnect requested");
                    break;
                }
                event = events.recv() => {
                    let Some(event) = event else {
                        self.teardown("transport dropped");
                        break;
                    };
                    let terminal = event.is_terminal();
                    self.handle(event).await;
                    if terminal || self.status() == ConnectionStatus::Disconnected {
                        break;
                    }
                }
            }
        }
    }

    pub(crate) async fn handle(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Connected => {
                if self.state.on_transport_connected() {
                    tracing::info!("transport connected, sending setup for {}", self.setup.model());
                    self.publish_status();
                    self.send_handshake().await;
                } else {
                    tracing::warn!("unexpected transport connect in {:?}", self.status());
                }
            }
            TransportEvent::Text(text) => self.handle_frame(text.as_bytes()),
            TransportEvent::Binary(bin) => self.handle_frame(&bin),
            TransportEvent::Closed(reason) => {
                tracing::info!("transport closed: {}", reason.as_deref().unwrap_or("no reason"));
                self.dispatch(InboundEvent::TransportClosed);
            }
            ended @ (TransportEvent::Cancelled | TransportEvent::PeerClosed) => {
                tracing::info!("transport ended: {:?}", ended);
                self.dispatch(InboundEvent::TransportClosed);
            }
        }
    }

    async fn send_handshake(&mut self) {
        let text = match codec::encode_handshake(&self.setup) {
            Ok(text) => text,
            Err(e) => {
                tracing::error!("{}", e);
                return;
            }
        };
        if let Err(e) = self.outbound.send(OutboundFrame::Text(text)).await {
            tracing::warn!("failed to send setup: {}", e);
        }
    }

    fn handle_frame(&mut self, frame: &[u8]) {
        tracing::trace!("received frame: {} bytes", frame.len());
        match codec::decode(frame) {
            Ok(events) => {
                for event in events {
                    self.dispatch(event);
                }
            }
            Err(DecodeError::Unrecognized) => tracing::debug!("dropping unrecognized frame"),
            Err(e) => tracing::warn!("dropping frame: {}", e),
        }
    }

    pub(crate) fn dispatch(&mut self, event: InboundEvent) {
        if !self.state.accepts(&event) {
            tracing::debug!("discarding {} before setup completed", event.name());
            return;
        }

        match event {
            InboundEvent::HandshakeAck => {
                if self.state.on_handshake_ack() {
                    tracing::info!("setup complete");
                    self.publish_status();
                }
            }
            InboundEvent::ModelOutput(parts) => {
                if let Some(flush) = self.turn.push(parts) {
                    self.deliver(flush);
                }
            }
            InboundEvent::InputTranscriptDelta(text) => {
                let events = self.transcripts.push(TranscriptChannel::Input, text);
                self.publish_transcripts(events);
            }
            InboundEvent::OutputTranscriptDelta(text) => {
                let events = self.transcripts.push(TranscriptChannel::Output, text);
                self.publish_transcripts(events);
            }
            InboundEvent::UsageMetadata(usage) => {
                match self.stats.lock() {
                    Ok(mut stats) => stats.update_usage(&usage),
                    Err(_) => tracing::error!("failed to update stats"),
                }
                tracing::debug!("usage: {}", usage.as_value());
                self.publish(|s| s.usage.send(usage).is_ok());
            }
            InboundEvent::TurnComplete => {
                let flush = self.turn.complete();
                tracing::debug!("turn complete, flushing {} messages", flush.messages);
                self.deliver(flush);
                let events = self.transcripts.complete();
                self.publish_transcripts(events);
            }
            InboundEvent::TransportClosed => self.teardown("transport closed"),
        }
    }

    fn deliver(&mut self, flush: TurnFlush) {
        if let Some(wav) = flush.audio {
            tracing::debug!(
                "flushing {:.0} ms of audio",
                self.playback.duration_ms(wav.len().saturating_sub(crate::audio::wav::HEADER_SIZE))
            );
            if let Some(output) = self.audio_output.as_mut() {
                output.play(wav.clone(), self.volume);
            }
            let audio = TurnAudio {
                wav,
                format: self.playback,
            };
            self.publish(|s| s.turn_audio.send(audio).is_ok());
        }
        if !flush.text.is_empty() {
            let text = flush.text;
            self.publish(|s| s.turn_text.send(text).is_ok());
        }
    }

    fn publish_transcripts(&self, events: Vec<TranscriptEvent>) {
        for event in events {
            let segment = event.segment;
            match event.channel {
                TranscriptChannel::Input => self.publish(|s| s.input_transcripts.send(segment).is_ok()),
                TranscriptChannel::Output => self.publish(|s| s.output_transcripts.send(segment).is_ok()),
            }
        }
    }

    /// Hand something to the subscribers, if the session still has any.
    /// `send` reports whether anyone was listening.
    fn publish(&self, send: impl FnOnce(&Subscribers) -> bool) {
        if let Some(subscribers) = lock_subscribers(&self.subscribers).as_ref() {
            if !send(subscribers) {
                tracing::trace!("no subscribers for event");
            }
        }
    }

    fn publish_status(&self) {
        self.status.send_replace(self.state.status());
    }

    /// Release everything the session holds. Safe to call more than once.
    pub(crate) fn teardown(&mut self, reason: &str) {
        if !self.state.disconnect() {
            return;
        }
        tracing::info!("session closed: {}", reason);

        self.turn.clear();
        self.transcripts.reset();
        if let Some(mut input) = self.audio_input.take() {
            input.stop();
        }
        if let Some(mut output) = self.audio_output.take() {
            output.stop();
        }
        lock_subscribers(&self.subscribers).take();

        self.publish_status();
    }
}
