//! Player sessions for Cardgrid.
//!
//! A session is the server's handle on one connected player's outbound side:
//!
//! 1. **Queue**: a bounded `mpsc` channel of [`GameMessage`]s
//!    (see [`PlayerSession::enqueue`])
//! 2. **Writer task**: the only owner of the transport write half; drains
//!    the queue in order and encodes each message through a [`Codec`]
//! 3. **Identity**: the [`IdSource`] that hands out player and room ids
//!
//! # How it fits in the stack
//!
//! ```text
//! Room Layer (above)  ← seats hold an Arc<PlayerSession>
//!     ↕
//! Session Layer (this crate)  ← queue + writer task per player
//!     ↕
//! Transport Layer (below)  ← ConnectionWriter half of a split connection
//! ```
//!
//! [`GameMessage`]: cardgrid_protocol::GameMessage
//! [`Codec`]: cardgrid_protocol::Codec

mod error;
mod ids;
mod session;

pub use error::SessionError;
pub use ids::{IdSource, SequentialIds};
pub use session::{PlayerSession, SessionConfig};
