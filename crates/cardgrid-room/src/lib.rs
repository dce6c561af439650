//! Room lifecycle and matchmaking for Cardgrid.
//!
//! Each room is a shared `Arc<Room>` whose state sits behind one async
//! mutex; the [`RoomRegistry`] finds rooms, indexes players, and reaps idle
//! rooms in the background.
//!
//! # Key types
//!
//! - [`RoomRegistry`]: matchmaking, action routing, disconnects, reaping
//! - [`Room`]: one match (seats, board, state machine)
//! - [`RoomState`]: lifecycle state machine
//! - [`RoomConfig`]: capacity, hand size, and the timing knobs
//! - [`Clock`]: time source for activity stamps

mod clock;
mod config;
mod error;
mod registry;
mod room;

pub use clock::{Clock, TokioClock};
pub use config::{RoomConfig, RoomState};
pub use error::{ActionError, RoomError};
pub use registry::RoomRegistry;
pub use room::{JoinOutcome, REASON_LINE, REASON_OPPONENT_LEFT, Room, RoomInfo, Seat};
