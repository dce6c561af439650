//! Identifier allocation for players and rooms.

use std::sync::atomic::{AtomicU64, Ordering};

use cardgrid_protocol::{PlayerId, RoomId};

/// Hands out collision-free identifiers.
///
/// Shared by the server (player ids on connect) and the room registry
/// (room ids on creation), so implementations must be thread-safe.
pub trait IdSource: Send + Sync + 'static {
    fn next_player_id(&self) -> PlayerId;
    fn next_room_id(&self) -> RoomId;
}

/// Monotonic counters starting at 1. Never reuses an id within a process.
#[derive(Debug)]
pub struct SequentialIds {
    next_player: AtomicU64,
    next_room: AtomicU64,
}

impl SequentialIds {
    pub fn new() -> Self {
        Self {
            next_player: AtomicU64::new(1),
            next_room: AtomicU64::new(1),
        }
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::new()
    }
}

impl IdSource for SequentialIds {
    fn next_player_id(&self) -> PlayerId {
        PlayerId(self.next_player.fetch_add(1, Ordering::Relaxed))
    }

    fn next_room_id(&self) -> RoomId {
        RoomId(self.next_room.fetch_add(1, Ordering::Relaxed))
    }
}
