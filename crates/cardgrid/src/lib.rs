//! # Cardgrid
//!
//! A two-player, card-augmented three-in-a-line game server.
//!
//! Players connect over WebSocket, are paired into rooms, receive a hand of
//! cards, and take turns playing them onto a shared 3×3 board. The server
//! is authoritative: it validates every action, resolves card effects,
//! detects wins, and reaps idle rooms.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cardgrid::prelude::*;
//!
//! # async fn run() -> Result<(), CardgridError> {
//! let config = ServerConfig::from_env()?;
//! let server = CardgridServerBuilder::from_config(config).build().await?;
//! server.run().await
//! # }
//! ```

mod config;
mod error;
mod handler;
mod server;
mod telemetry;

pub use config::{ConfigError, DEFAULT_BIND, ServerConfig};
pub use error::CardgridError;
pub use server::{CardgridServer, CardgridServerBuilder};
pub use telemetry::init_tracing;

/// Common imports for running and testing a Cardgrid server.
pub mod prelude {
    pub use crate::{
        CardgridError, CardgridServer, CardgridServerBuilder, ConfigError,
        ServerConfig, init_tracing,
    };
    pub use cardgrid_engine::{CardCatalog, MARK, standard_cards};
    pub use cardgrid_protocol::{
        Card, Codec, GameMessage, JsonCodec, PlayerId, PlayerMessage, RoomId,
    };
    pub use cardgrid_room::{
        Clock, RoomConfig, RoomRegistry, RoomState, TokioClock,
    };
    pub use cardgrid_session::{IdSource, SequentialIds, SessionConfig};
}
