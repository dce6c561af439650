//! Error types for the room layer.

use cardgrid_engine::SlotId;
use cardgrid_protocol::{PlayerId, RoomId};

use crate::RoomState;

/// Registry-level failures: joining, routing, and removal.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The room does not exist (reaped or emptied).
    #[error("room {0} not found")]
    NotFound(RoomId),

    /// Every seat is taken.
    #[error("room {0} is full")]
    RoomFull(RoomId),

    /// The player already holds a seat in this room.
    #[error("player {0} already in room {1}")]
    AlreadyInRoom(PlayerId, RoomId),

    /// The player has no seat in this room.
    #[error("player {0} not in room {1}")]
    NotInRoom(PlayerId, RoomId),

    /// The player is not indexed to any room.
    #[error("player {0} is not in any room")]
    NotInAnyRoom(PlayerId),

    /// The room no longer accepts this operation.
    #[error("room {0} is {1}")]
    InvalidState(RoomId, RoomState),

    /// The room refused a player action.
    #[error(transparent)]
    Action(#[from] ActionError),
}

/// Reasons a `play_card` action is refused. The `Display` text is what the
/// player receives in the `error` message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    #[error("game is not in progress ({0})")]
    NotInProgress(RoomState),

    #[error("you are not seated in this room")]
    NotInRoom,

    #[error("not your turn")]
    NotYourTurn,

    #[error("invalid target slot {0}")]
    InvalidSlot(i64),

    #[error("card {0:?} is not in your hand")]
    CardNotInHand(String),

    #[error("{0} is blocked")]
    SlotBlocked(SlotId),
}
