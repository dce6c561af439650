//! Unified error type for the Cardgrid server.

use cardgrid_engine::EngineError;
use cardgrid_protocol::ProtocolError;
use cardgrid_room::RoomError;
use cardgrid_session::SessionError;
use cardgrid_transport::TransportError;

use crate::ConfigError;

/// Top-level error wrapping every crate-specific error, so `?` works across
/// layers.
#[derive(Debug, thiserror::Error)]
pub enum CardgridError {
    /// Connection, send, receive, or listener failure.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Encode or decode failure.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Session(#[from] SessionError),

    /// Matchmaking or routing failure.
    #[error(transparent)]
    Room(#[from] RoomError),

    /// Catalog setup failure.
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
