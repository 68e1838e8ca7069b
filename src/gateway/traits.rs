//! Gateway Client Trait Abstractions
//!
//! The seam between orchestration and the protocol client. The production
//! implementation (`SocketGatewayClient`) and the test double
//! (`MockGatewayClient`) both live behind `GatewayClient`, so the bootstrap
//! sequence is exercised end to end without a real gateway.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::{broadcast, mpsc};

/// Conversation identifier, opaque to this crate
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChatId(pub String);

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ChatId {
    fn from(s: &str) -> Self {
        ChatId(s.to_string())
    }
}

/// One event on the device-pairing stream.
///
/// Codes are short-lived; each is superseded by the next until the primary
/// device confirms. The gateway closes the stream when pairing ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    /// A pairing token to display as a QR code
    Code(String),
    /// Any other progress event kind, carried for logging only
    Update(String),
}

/// A message observed on the account, as delivered by the gateway
#[derive(Debug, Clone, Deserialize)]
pub struct MessageEvent {
    pub chat: ChatId,
    pub sender: String,
    #[serde(rename = "timestamp")]
    pub timestamp_ms: u64,
}

/// Events the gateway can deliver to a subscriber.
///
/// Closed sum over the kinds the gateway emits today; anything it grows later
/// lands in `Unknown` and is ignored explicitly rather than silently.
#[derive(Debug, Clone)]
pub enum GatewayEvent {
    /// A message arrived in some conversation
    Message(MessageEvent),
    /// Delivery/read receipt
    Receipt { chat: ChatId },
    /// Presence change (typing, online)
    Presence { chat: ChatId },
    /// The transport dropped; the client owns reconnection state
    Disconnected,
    /// An event kind this client does not handle
    Unknown(String),
}

/// Result type for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Gateway client errors
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("network error: {0}")]
    Network(String),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("store error: {0}")]
    Store(#[from] sqlx::Error),

    #[error("device linking failed: {0}")]
    LinkFailed(String),

    #[error("not connected to the gateway")]
    NotConnected,
}

/// Gateway client abstraction.
///
/// Implementations hold the connection, the authentication handshake, and
/// event delivery. Orchestration code owns a handle and passes it explicitly;
/// nothing here is reachable through globals.
#[async_trait]
pub trait GatewayClient: Clone + Send + Sync + 'static {
    /// Request the pairing event stream for a first-run login.
    ///
    /// Must be called before `connect`: link intent is declared to the
    /// gateway at connection time, and handlers for the pairing events are
    /// wired while the connection is being built. The returned receiver
    /// yields codes until the gateway closes the stream.
    fn begin_link(&self) -> GatewayResult<mpsc::Receiver<LinkEvent>>;

    /// Establish the gateway connection.
    ///
    /// Transient failures surface as `GatewayError::Network` so callers can
    /// retry with backoff.
    async fn connect(&self) -> GatewayResult<()>;

    /// Tear the connection down. Safe to call when not connected.
    async fn disconnect(&self);

    /// Subscribe to the gateway event stream.
    ///
    /// Each call returns an independent receiver; events sent after the call
    /// are delivered in order.
    fn subscribe(&self) -> broadcast::Receiver<GatewayEvent>;

    /// Whether the transport is currently up
    fn is_connected(&self) -> bool;
}
