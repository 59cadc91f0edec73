use std::sync::{Arc, Mutex};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tokio::sync::{broadcast, mpsc, oneshot, watch};

use crate::audio::{AudioInput, AudioOutput};
use crate::codec;
use crate::error::{ConnectError, RealtimeError, Result};
use crate::session::{
    lock_subscribers, ConnectionStatus, Session, SessionSettings, SharedSubscribers, Subscribers,
    TranscriptSegment, TurnAudio,
};
use crate::transport::{self, OutboundFrame, TransportChannels};
use crate::types::events::{RealtimeInput, UsageMetadata};

mod config;
mod consts;
mod stats;
mod utils;

pub use config::{Config, ConfigBuilder};
pub use consts::DEFAULT_CAPACITY;
pub use stats::Stats;
pub use utils::build_request;

pub type ClientTx = mpsc::Sender<OutboundFrame>;
pub type StatusRx = watch::Receiver<ConnectionStatus>;
pub type TranscriptRx = broadcast::Receiver<TranscriptSegment>;
pub type UsageRx = broadcast::Receiver<UsageMetadata>;
pub type TurnAudioRx = broadcast::Receiver<TurnAudio>;
pub type TurnTextRx = broadcast::Receiver<String>;

pub struct Connection {
    pub(crate) transport_handle: Option<tokio::task::JoinHandle<()>>,
    pub(crate) session_handle: tokio::task::JoinHandle<()>,
}

/// Caller-facing handle on a live session.
///
/// Streams are per session: subscribe after `connect`, and expect them to
/// close when the session ends.
pub struct Client {
    capacity: usize,
    config: Config,
    c_tx: Option<ClientTx>,
    shutdown: Option<oneshot::Sender<()>>,
    subscribers: SharedSubscribers,
    status: StatusRx,
    stats: Arc<Mutex<Stats>>,
    audio_output: Option<Box<dyn AudioOutput>>,
    audio_input: Option<Box<dyn AudioInput>>,
    connection: Option<Connection>,
}

impl Client {
    pub fn new(capacity: usize, config: Config) -> Self {
        let (_, status) = watch::channel(ConnectionStatus::Disconnected);
        Self {
            capacity,
            config,
            c_tx: None,
            shutdown: None,
            subscribers: Arc::new(Mutex::new(None)),
            status,
            stats: Arc::new(Mutex::new(Stats::new())),
            audio_output: None,
            audio_input: None,
            connection: None,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Render flushed turn audio through `output`. Takes effect on the next
    /// `connect` and is stopped when that session ends.
    pub fn set_audio_output(&mut self, output: impl AudioOutput + 'static) {
        self.audio_output = Some(Box::new(output));
    }

    /// Stop `input` when the next session ends.
    pub fn set_audio_input(&mut self, input: impl AudioInput + 'static) {
        self.audio_input = Some(Box::new(input));
    }

    /// Open a WebSocket to the configured endpoint and start a session.
    ///
    /// Returns once the connection attempt is under way; watch
    /// [`Client::status_changes`] for the handshake.
    pub fn connect(&mut self) -> std::result::Result<(), ConnectError> {
        self.ensure_disconnected()?;
        let request = build_request(&self.config)?;
        let (channels, peer) = TransportChannels::pair(self.capacity);
        let transport_handle = transport::spawn_websocket(request, peer);
        self.start(channels, Some(transport_handle))
    }

    /// Start a session over caller-supplied transport channels.
    pub fn connect_with_transport(
        &mut self,
        channels: TransportChannels,
    ) -> std::result::Result<(), ConnectError> {
        self.ensure_disconnected()?;
        self.start(channels, None)
    }

    fn ensure_disconnected(&self) -> std::result::Result<(), ConnectError> {
        if *self.status.borrow() != ConnectionStatus::Disconnected {
            return Err(ConnectError::AlreadyConnected);
        }
        Ok(())
    }

    fn start(
        &mut self,
        channels: TransportChannels,
        transport_handle: Option<tokio::task::JoinHandle<()>>,
    ) -> std::result::Result<(), ConnectError> {
        let TransportChannels { outbound, events } = channels;

        let subscribers: SharedSubscribers =
            Arc::new(Mutex::new(Some(Subscribers::new(self.capacity))));
        let (status_tx, status_rx) = watch::channel(ConnectionStatus::Connecting);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let settings = SessionSettings {
            setup: self.config.setup(),
            flush_policy: self.config.flush_policy(),
            playback: self.config.playback_format(),
            volume: self.config.volume(),
            audio_output: self.audio_output.take(),
            audio_input: self.audio_input.take(),
        };
        let session = Session::start(
            settings,
            outbound.clone(),
            subscribers.clone(),
            status_tx,
            self.stats.clone(),
        )?;
        let session_handle = tokio::spawn(session.run(events, shutdown_rx));

        self.c_tx = Some(outbound);
        self.shutdown = Some(shutdown_tx);
        self.subscribers = subscribers;
        self.status = status_rx;
        self.connection = Some(Connection {
            transport_handle,
            session_handle,
        });
        tracing::debug!("session started for {}", self.config.model());
        Ok(())
    }

    pub fn status(&self) -> ConnectionStatus {
        *self.status.borrow()
    }

    /// A watch on the current session's status. It ends at `Disconnected`.
    pub fn status_changes(&self) -> StatusRx {
        self.status.clone()
    }

    pub fn stats(&self) -> Stats {
        match self.stats.lock() {
            Ok(stats_guard) => stats_guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn input_transcripts(&self) -> Result<TranscriptRx> {
        self.subscribe(|s| s.input_transcripts.subscribe())
    }

    pub fn output_transcripts(&self) -> Result<TranscriptRx> {
        self.subscribe(|s| s.output_transcripts.subscribe())
    }

    pub fn usage_metadata(&self) -> Result<UsageRx> {
        self.subscribe(|s| s.usage.subscribe())
    }

    pub fn turn_audio(&self) -> Result<TurnAudioRx> {
        self.subscribe(|s| s.turn_audio.subscribe())
    }

    pub fn turn_text(&self) -> Result<TurnTextRx> {
        self.subscribe(|s| s.turn_text.subscribe())
    }

    fn subscribe<T>(&self, subscribe: impl FnOnce(&Subscribers) -> T) -> Result<T> {
        lock_subscribers(&self.subscribers)
            .as_ref()
            .map(subscribe)
            .ok_or(RealtimeError::NotConnected)
    }

    /// Send raw capture PCM. Dropped unless the handshake has completed.
    pub async fn send_audio_chunk(&self, pcm: &[u8]) {
        let mime_type = self.config.capture_format().mime_type();
        self.send_realtime_input(RealtimeInput::audio(STANDARD.encode(pcm), &mime_type))
            .await
    }

    /// Send one encoded image frame, e.g. a JPEG with `image/jpeg`.
    pub async fn send_video_frame(&self, data: &[u8], mime_type: &str) {
        self.send_realtime_input(RealtimeInput::video(STANDARD.encode(data), mime_type))
            .await
    }

    pub async fn send_text(&self, text: &str) {
        self.send_realtime_input(RealtimeInput::text(text)).await
    }

    /// Tell the server the microphone stream has paused.
    pub async fn send_audio_stream_end(&self) {
        self.send_realtime_input(RealtimeInput::audio_stream_end()).await
    }

    pub async fn send_activity_start(&self) {
        self.send_realtime_input(RealtimeInput::activity_start()).await
    }

    pub async fn send_activity_end(&self) {
        self.send_realtime_input(RealtimeInput::activity_end()).await
    }

    async fn send_realtime_input(&self, input: RealtimeInput) {
        let Some(tx) = self.c_tx.as_ref() else {
            tracing::trace!("not connected, dropping realtime input");
            return;
        };
        if self.status() != ConnectionStatus::HandshakeComplete {
            tracing::debug!("setup not complete, dropping realtime input");
            return;
        }
        let text = match codec::encode_realtime_input(input) {
            Ok(text) => text,
            Err(e) => {
                tracing::error!("{}", e);
                return;
            }
        };
        if let Err(e) = tx.send(OutboundFrame::Text(text)).await {
            tracing::debug!("transport gone, dropping realtime input: {}", e);
        }
    }

    /// End the current session. Does nothing when there is none.
    pub fn disconnect(&mut self) {
        let Some(shutdown) = self.shutdown.take() else {
            return;
        };
        tracing::info!("disconnecting");
        let _ = shutdown.send(());
        if let Some(tx) = self.c_tx.take() {
            if let Err(e) = tx.try_send(OutboundFrame::Close) {
                tracing::debug!("failed to queue close frame: {}", e);
            }
        }
        lock_subscribers(&self.subscribers).take();
        let (_, status) = watch::channel(ConnectionStatus::Disconnected);
        self.status = status;
    }

    /// Wait for the last session's tasks to finish, after `disconnect` or
    /// once the transport has gone away.
    pub async fn wait_closed(&mut self) {
        let Some(connection) = self.connection.take() else {
            return;
        };
        if let Err(e) = connection.session_handle.await {
            tracing::error!("session task failed: {}", e);
        }
        if let Some(transport_handle) = connection.transport_handle {
            if let Err(e) = transport_handle.await {
                tracing::error!("transport task failed: {}", e);
            }
        }
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        self.disconnect();
    }
}

pub async fn connect_with_config(capacity: usize, config: Config) -> Result<Client> {
    let mut client = Client::new(capacity, config);
    client.connect()?;
    Ok(client)
}

pub async fn connect() -> Result<Client> {
    let config = Config::new();
    connect_with_config(DEFAULT_CAPACITY, config).await
}
