//! In-process transport backed by unbounded channels.
//!
//! [`pair`] returns the server-side [`MemoryConnection`] and the client-side
//! [`MemoryPeer`]. Tests play the client through the peer without opening
//! sockets. [`listener`] wraps the same thing in a [`Transport`] so a whole
//! server can run in-process.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::mpsc;

use crate::{
    Connection, ConnectionId, ConnectionReader, ConnectionWriter, Transport,
    TransportError,
};

static NEXT_MEMORY_ID: AtomicU64 = AtomicU64::new(1);

/// Creates a connected server/client pair.
pub fn pair() -> (MemoryConnection, MemoryPeer) {
    let id = ConnectionId::new(NEXT_MEMORY_ID.fetch_add(1, Ordering::Relaxed));
    let (to_server, from_client) = mpsc::unbounded_channel();
    let (to_client, from_server) = mpsc::unbounded_channel();
    (
        MemoryConnection {
            id,
            inbound: from_client,
            outbound: to_client,
        },
        MemoryPeer {
            to_server: Some(to_server),
            from_server,
        },
    )
}

/// Creates an in-process listener and the handle clients dial it through.
/// The listener reports [`TransportError::ListenerClosed`] once every
/// connector is dropped.
pub fn listener() -> (MemoryTransport, MemoryConnector) {
    let (tx, rx) = mpsc::unbounded_channel();
    (MemoryTransport { incoming: rx }, MemoryConnector { outgoing: tx })
}

/// A [`Transport`] whose connections come from a [`MemoryConnector`].
pub struct MemoryTransport {
    incoming: mpsc::UnboundedReceiver<MemoryConnection>,
}

impl Transport for MemoryTransport {
    type Connection = MemoryConnection;

    async fn accept(&mut self) -> Result<MemoryConnection, TransportError> {
        self.incoming
            .recv()
            .await
            .ok_or(TransportError::ListenerClosed)
    }
}

/// Dials a [`MemoryTransport`].
#[derive(Clone)]
pub struct MemoryConnector {
    outgoing: mpsc::UnboundedSender<MemoryConnection>,
}

impl MemoryConnector {
    /// Opens a connection. `None` if the listener is gone.
    pub fn connect(&self) -> Option<MemoryPeer> {
        let (conn, peer) = pair();
        self.outgoing.send(conn).ok()?;
        Some(peer)
    }
}

/// Server side of an in-memory connection.
pub struct MemoryConnection {
    id: ConnectionId,
    inbound: mpsc::UnboundedReceiver<Vec<u8>>,
    outbound: mpsc::UnboundedSender<Vec<u8>>,
}

impl Connection for MemoryConnection {
    type Reader = MemoryReader;
    type Writer = MemoryWriter;

    fn id(&self) -> ConnectionId {
        self.id
    }

    fn split(self) -> (MemoryReader, MemoryWriter) {
        (
            MemoryReader {
                inbound: self.inbound,
            },
            MemoryWriter {
                id: self.id,
                outbound: Some(self.outbound),
            },
        )
    }
}

/// Read half of a [`MemoryConnection`].
pub struct MemoryReader {
    inbound: mpsc::UnboundedReceiver<Vec<u8>>,
}

impl ConnectionReader for MemoryReader {
    async fn recv(&mut self) -> Result<Option<Vec<u8>>, TransportError> {
        Ok(self.inbound.recv().await)
    }
}

/// Write half of a [`MemoryConnection`].
pub struct MemoryWriter {
    id: ConnectionId,
    outbound: Option<mpsc::UnboundedSender<Vec<u8>>>,
}

impl ConnectionWriter for MemoryWriter {
    async fn send(&mut self, data: &[u8]) -> Result<(), TransportError> {
        let outbound = self
            .outbound
            .as_ref()
            .ok_or(TransportError::ConnectionClosed(self.id))?;
        outbound
            .send(data.to_vec())
            .map_err(|_| TransportError::ConnectionClosed(self.id))
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.outbound = None;
        Ok(())
    }
}

/// Client side of an in-memory connection.
pub struct MemoryPeer {
    to_server: Option<mpsc::UnboundedSender<Vec<u8>>>,
    from_server: mpsc::UnboundedReceiver<Vec<u8>>,
}

impl MemoryPeer {
    /// Sends bytes to the server. Returns `false` once the server side is
    /// gone or [`disconnect`](Self::disconnect) was called.
    pub fn send(&self, data: impl Into<Vec<u8>>) -> bool {
        match &self.to_server {
            Some(tx) => tx.send(data.into()).is_ok(),
            None => false,
        }
    }

    /// Waits for the next message from the server. `None` once the server
    /// closed its write half.
    pub async fn recv(&mut self) -> Option<Vec<u8>> {
        self.from_server.recv().await
    }

    /// Returns a message if one is already queued.
    pub fn try_recv(&mut self) -> Option<Vec<u8>> {
        self.from_server.try_recv().ok()
    }

    /// Simulates the client hanging up: the server's reader sees a clean
    /// close.
    pub fn disconnect(&mut self) {
        self.to_server = None;
    }
}
