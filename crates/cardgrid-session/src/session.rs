//! The per-player session: an outbound queue and the writer task that
//! drains it.
//!
//! Room code never touches a socket. It enqueues typed [`GameMessage`]s and
//! returns; the writer task is the only thing that awaits the transport, so
//! a slow client stalls its own queue and nothing else.
//!
//! ```text
//!   Room ──enqueue()──→ [ bounded mpsc ] ──writer task──→ ConnectionWriter
//!                          (capacity N)      encode + send
//! ```

use std::sync::Arc;

use cardgrid_protocol::{Codec, GameMessage, PlayerId};
use cardgrid_transport::ConnectionWriter;
use tokio::sync::{Mutex, mpsc, watch};

use crate::SessionError;

/// Configuration for player sessions.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Outbound queue capacity. A full queue makes `enqueue` wait.
    ///
    /// Default: 16.
    pub outbound_capacity: usize,

    /// Display name given to players that did not pick one.
    ///
    /// Default: `"anon_player"`.
    pub default_name: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            outbound_capacity: 16,
            default_name: "anon_player".to_string(),
        }
    }
}

/// One connected player's outbound side.
///
/// Shared as `Arc<PlayerSession>` between the connection handler (which
/// closes it on disconnect) and the room seat (which enqueues game
/// messages).
#[derive(Debug)]
pub struct PlayerSession {
    id: PlayerId,
    name: String,
    /// `None` once closed. Dropping the last sender ends the writer loop
    /// after it flushes whatever is still queued.
    outbound: Mutex<Option<mpsc::Sender<GameMessage>>>,
    /// Flips to `true` on close and wakes enqueues waiting on a full queue.
    closed: watch::Sender<bool>,
}

impl PlayerSession {
    /// Creates the session and spawns its writer task on the current
    /// runtime. The task owns `writer` until it exits.
    pub fn spawn<W, C>(
        id: PlayerId,
        name: impl Into<String>,
        writer: W,
        codec: C,
        config: &SessionConfig,
    ) -> Arc<Self>
    where
        W: ConnectionWriter,
        C: Codec,
    {
        let (tx, rx) = mpsc::channel(config.outbound_capacity.max(1));
        tokio::spawn(write_loop(id, rx, writer, codec));

        let name = name.into();
        tracing::debug!(player_id = %id, %name, "session opened");
        Arc::new(Self {
            id,
            name,
            outbound: Mutex::new(Some(tx)),
            closed: watch::Sender::new(false),
        })
    }

    pub fn id(&self) -> PlayerId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Queues `message` for delivery, waiting while the queue is full.
    ///
    /// A wait for capacity ends early when the session is closed, so a
    /// client that stopped reading cannot hold its caller forever once it
    /// is torn down.
    ///
    /// # Errors
    /// [`SessionError::Closed`] after [`close`](Self::close), or once the
    /// writer task has exited because the transport failed.
    pub async fn enqueue(&self, message: GameMessage) -> Result<(), SessionError> {
        // Clone the sender so the lock is not held while waiting for room in
        // the queue; `close` must never wait behind a slow client.
        let tx = self
            .outbound
            .lock()
            .await
            .clone()
            .ok_or(SessionError::Closed(self.id))?;
        let mut closed = self.closed.subscribe();
        tokio::select! {
            sent = tx.send(message) => sent.map_err(|_| SessionError::Closed(self.id)),
            _ = closed.wait_for(|closed| *closed) => Err(SessionError::Closed(self.id)),
        }
    }

    /// Stops accepting messages. Already queued messages are still written,
    /// then the writer closes the transport. Enqueues still waiting for
    /// capacity fail. Idempotent.
    pub async fn close(&self) {
        self.closed.send_replace(true);
        if self.outbound.lock().await.take().is_some() {
            tracing::debug!(player_id = %self.id, "session closed");
        }
    }

    /// `true` after [`close`](Self::close) or once the writer has exited.
    pub async fn is_closed(&self) -> bool {
        match self.outbound.lock().await.as_ref() {
            Some(tx) => tx.is_closed(),
            None => true,
        }
    }
}

/// Drains the queue in order until every sender is gone or a write fails,
/// then closes the transport write half.
async fn write_loop<W, C>(
    player_id: PlayerId,
    mut rx: mpsc::Receiver<GameMessage>,
    mut writer: W,
    codec: C,
) where
    W: ConnectionWriter,
    C: Codec,
{
    while let Some(message) = rx.recv().await {
        let bytes = match codec.encode(&message) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!(
                    %player_id, kind = message.kind(), error = %e,
                    "failed to encode outbound message"
                );
                continue;
            }
        };
        if let Err(e) = writer.send(&bytes).await {
            tracing::debug!(%player_id, error = %e, "write failed, stopping writer");
            break;
        }
    }

    // Refuse further enqueues before releasing the transport.
    rx.close();
    if let Err(e) = writer.close().await {
        tracing::debug!(%player_id, error = %e, "close after writer exit failed");
    }
    tracing::trace!(%player_id, "writer task finished");
}
