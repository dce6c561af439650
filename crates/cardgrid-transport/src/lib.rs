//! Transport abstraction layer for Cardgrid.
//!
//! The game core only ever sees opaque byte messages. A [`Transport`]
//! accepts connections; each [`Connection`] is split once into a
//! [`ConnectionReader`] (owned by the per-connection handler task) and a
//! [`ConnectionWriter`] (owned exclusively by the player's session writer
//! task). Splitting up front means a blocked read never holds up a write.
//!
//! # Feature Flags
//!
//! - `websocket` (default): WebSocket transport via `tokio-tungstenite`
//!
//! The [`memory`] transport is always available and is what the room and
//! server tests drive.

mod error;
pub mod memory;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::{
    WebSocketConnection, WebSocketReader, WebSocketTransport, WebSocketWriter,
};

use std::fmt;
use std::future::Future;

/// Opaque identifier for a connection, used only for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Accepts new incoming connections.
pub trait Transport: Send + Sync + 'static {
    /// The connection type produced by this transport.
    type Connection: Connection;

    /// Waits for and accepts the next incoming connection.
    fn accept(
        &mut self,
    ) -> impl Future<Output = Result<Self::Connection, TransportError>> + Send;
}

/// A freshly accepted connection, not yet split into halves.
pub trait Connection: Send + 'static {
    /// Read half.
    type Reader: ConnectionReader;
    /// Write half.
    type Writer: ConnectionWriter;

    /// Returns the unique identifier for this connection.
    fn id(&self) -> ConnectionId;

    /// Splits the connection into independently owned halves.
    fn split(self) -> (Self::Reader, Self::Writer);
}

/// The inbound half of a connection.
pub trait ConnectionReader: Send + 'static {
    /// Receives the next message from the remote peer.
    ///
    /// Returns `Ok(None)` when the connection is cleanly closed.
    fn recv(
        &mut self,
    ) -> impl Future<Output = Result<Option<Vec<u8>>, TransportError>> + Send;
}

/// The outbound half of a connection.
pub trait ConnectionWriter: Send + 'static {
    /// Sends one message to the remote peer.
    fn send(
        &mut self,
        data: &[u8],
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Closes the outbound half. Further sends fail.
    fn close(&mut self) -> impl Future<Output = Result<(), TransportError>> + Send;
}
