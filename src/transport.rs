//! The message channel between a session and its WebSocket.
//!
//! A session never touches the socket directly: it reads [`TransportEvent`]s
//! and writes [`OutboundFrame`]s. [`TransportChannels::pair`] builds both
//! ends, which lets anything (the bundled WebSocket pump, a test, another
//! transport) sit on the other side.

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::error::ProtocolError;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::{self, Message};

/// Something that happened on the connection.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    Connected,
    Text(String),
    Binary(Vec<u8>),
    /// Orderly close, with the peer's reason if it gave one.
    Closed(Option<String>),
    /// The connection failed or was torn down locally.
    Cancelled,
    /// The peer went away without a closing handshake.
    PeerClosed,
}

impl TransportEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransportEvent::Closed(_) | TransportEvent::Cancelled | TransportEvent::PeerClosed
        )
    }
}

/// A frame to write to the connection.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundFrame {
    Text(String),
    Binary(Vec<u8>),
    /// Start the closing handshake; nothing is written after this.
    Close,
}

/// The session's ends of the transport channels.
pub struct TransportChannels {
    pub(crate) outbound: mpsc::Sender<OutboundFrame>,
    pub(crate) events: mpsc::Receiver<TransportEvent>,
}

/// The transport's ends of the channels.
pub struct TransportPeer {
    pub outbound: mpsc::Receiver<OutboundFrame>,
    pub events: mpsc::Sender<TransportEvent>,
}

impl TransportChannels {
    pub fn pair(capacity: usize) -> (TransportChannels, TransportPeer) {
        let (outbound_tx, outbound_rx) = mpsc::channel(capacity);
        let (events_tx, events_rx) = mpsc::channel(capacity);
        (
            TransportChannels {
                outbound: outbound_tx,
                events: events_rx,
            },
            TransportPeer {
                outbound: outbound_rx,
                events: events_tx,
            },
        )
    }
}

/// Open a WebSocket for `request` and pump it through `peer`.
pub(crate) fn spawn_websocket(request: Request, peer: TransportPeer) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let TransportPeer {
            mut outbound,
            events,
        } = peer;

        let ws_stream = match tokio_tungstenite::connect_async(request).await {
            Ok((ws_stream, _)) => ws_stream,
            Err(e) => {
                tracing::error!("failed to connect: {}", e);
                let _ = events.send(TransportEvent::Cancelled).await;
                return;
            }
        };
        tracing::info!("websocket connected");
        if events.send(TransportEvent::Connected).await.is_err() {
            return;
        }

        let (mut write, mut read) = ws_stream.split();

        let send_handle = tokio::spawn(async move {
            while let Some(frame) = outbound.recv().await {
                let (message, closing) = match frame {
                    OutboundFrame::Text(text) => (Message::Text(text), false),
                    OutboundFrame::Binary(bin) => (Message::Binary(bin), false),
                    OutboundFrame::Close => (Message::Close(None), true),
                };
                if let Err(e) = write.send(message).await {
                    tracing::error!("failed to send message: {}", e);
                    break;
                }
                if closing {
                    tracing::debug!("close frame sent");
                    break;
                }
            }
        });

        let terminal = loop {
            let message = match read.next().await {
                None => break Some(TransportEvent::PeerClosed),
                Some(Err(e)) => break Some(classify_error(e)),
                Some(Ok(message)) => message,
            };
            let event = match message {
                Message::Text(text) => TransportEvent::Text(text),
                Message::Binary(bin) => TransportEvent::Binary(bin),
                Message::Close(frame) => {
                    tracing::info!("connection closed: {:?}", frame);
                    break Some(TransportEvent::Closed(frame.map(|f| f.reason.to_string())));
                }
                _ => continue,
            };
            if events.send(event).await.is_err() {
                // the session is gone; nobody is left to tell
                break None;
            }
        };

        if let Some(event) = terminal {
            let _ = events.send(event).await;
        }
        send_handle.abort();
    })
}

fn classify_error(e: tungstenite::Error) -> TransportEvent {
    match e {
        tungstenite::Error::ConnectionClosed
        | tungstenite::Error::AlreadyClosed
        | tungstenite::Error::Protocol(ProtocolError::ResetWithoutClosingHandshake) => {
            TransportEvent::PeerClosed
        }
        e => {
            tracing::error!("failed to read message: {}", e);
            TransportEvent::Cancelled
        }
    }
}
