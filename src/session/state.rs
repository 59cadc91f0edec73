use crate::codec::InboundEvent;
use crate::error::ConnectError;

/// Lifecycle of one connection attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    HandshakeComplete,
}

/// Tracks the connection lifecycle and gates inbound traffic on the handshake.
#[derive(Debug, Default)]
pub struct SessionStateMachine {
    status: ConnectionStatus,
}

impl SessionStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    pub fn is_handshake_complete(&self) -> bool {
        self.status == ConnectionStatus::HandshakeComplete
    }

    /// `Disconnected -> Connecting`.
    pub fn connect(&mut self) -> Result<(), ConnectError> {
        if self.status != ConnectionStatus::Disconnected {
            return Err(ConnectError::AlreadyConnected);
        }
        self.status = ConnectionStatus::Connecting;
        Ok(())
    }

    /// `Connecting -> Connected`. Returns true when the handshake should be sent now.
    pub fn on_transport_connected(&mut self) -> bool {
        if self.status != ConnectionStatus::Connecting {
            tracing::warn!("transport connected while {:?}, ignoring", self.status);
            return false;
        }
        self.status = ConnectionStatus::Connected;
        true
    }

    /// `Connected -> HandshakeComplete`. Repeated acks are ignored.
    pub fn on_handshake_ack(&mut self) -> bool {
        match self.status {
            ConnectionStatus::Connected => {
                self.status = ConnectionStatus::HandshakeComplete;
                true
            }
            ConnectionStatus::HandshakeComplete => {
                tracing::debug!("duplicate setupComplete ignored");
                false
            }
            status => {
                tracing::warn!("setupComplete received while {:?}, ignoring", status);
                false
            }
        }
    }

    /// Whether `event` may be processed in the current state.
    pub fn accepts(&self, event: &InboundEvent) -> bool {
        match event {
            InboundEvent::HandshakeAck | InboundEvent::TransportClosed => true,
            _ => self.is_handshake_complete(),
        }
    }

    /// Any state `-> Disconnected`. Returns false if already disconnected.
    pub fn disconnect(&mut self) -> bool {
        if self.status == ConnectionStatus::Disconnected {
            return false;
        }
        self.status = ConnectionStatus::Disconnected;
        true
    }
}
