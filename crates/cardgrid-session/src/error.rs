//! Error types for the session layer.

use cardgrid_protocol::PlayerId;

/// Errors returned by a [`PlayerSession`](crate::PlayerSession).
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The session was closed, or its writer task already exited after a
    /// transport failure. Nothing more can be delivered to this player.
    #[error("session for player {0} is closed")]
    Closed(PlayerId),
}
