/// Errors that can occur in the transport layer.
///
/// Any of these on an established connection is treated by the server as a
/// disconnect: the player is removed from their room and the session is torn
/// down.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The write half was already closed, or the peer went away.
    #[error("connection {0} closed")]
    ConnectionClosed(crate::ConnectionId),

    /// Writing a frame failed.
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// Reading a frame failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),

    /// Binding the listener or upgrading an accepted socket failed.
    #[error("accept failed: {0}")]
    AcceptFailed(#[source] std::io::Error),

    /// The listener is gone; no further connections will arrive.
    #[error("listener closed")]
    ListenerClosed,
}
