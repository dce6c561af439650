//! Room configuration and state machine.

use std::time::Duration;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// RoomConfig
// ---------------------------------------------------------------------------

/// Settings shared by every room a registry creates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomConfig {
    /// Seats per room. Join order is turn order.
    pub capacity: usize,

    /// Cards dealt to each player when the game starts.
    pub hand_size: usize,

    /// Grace period between the room filling up and the deal.
    pub start_delay: Duration,

    /// Rooms untouched for longer than this are reaped.
    pub idle_timeout: Duration,

    /// How often the reaper sweeps.
    pub reap_interval: Duration,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            capacity: 2,
            hand_size: 3,
            start_delay: Duration::from_millis(500),
            idle_timeout: Duration::from_secs(10 * 60),
            reap_interval: Duration::from_secs(60),
        }
    }
}

// ---------------------------------------------------------------------------
// RoomState
// ---------------------------------------------------------------------------

/// The lifecycle state of a room.
///
/// ```text
/// WaitingForPlayers → Starting → InProgress → Finished
///                         └────────────────────↗
/// ```
///
/// - **WaitingForPlayers**: accepting joins.
/// - **Starting**: both seats taken, waiting out the start delay.
/// - **InProgress**: hands dealt, turns alternate.
/// - **Finished**: someone won or left. Actions are refused until the
///   room is reaped or emptied.
///
/// `Starting → Finished` covers a player leaving during the start delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomState {
    WaitingForPlayers,
    Starting,
    InProgress,
    Finished,
}

impl RoomState {
    /// Returns `true` if the room is accepting new players.
    pub fn is_joinable(&self) -> bool {
        matches!(self, Self::WaitingForPlayers)
    }

    /// Returns `true` once the room filled and until it finishes.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Starting | Self::InProgress)
    }

    /// The regular successor, if any.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::WaitingForPlayers => Some(Self::Starting),
            Self::Starting => Some(Self::InProgress),
            Self::InProgress => Some(Self::Finished),
            Self::Finished => None,
        }
    }

    /// Returns `true` if moving to `target` is allowed.
    pub fn can_transition_to(self, target: Self) -> bool {
        self.next() == Some(target)
            || (self == Self::Starting && target == Self::Finished)
    }
}

impl std::fmt::Display for RoomState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WaitingForPlayers => write!(f, "WaitingForPlayers"),
            Self::Starting => write!(f, "Starting"),
            Self::InProgress => write!(f, "InProgress"),
            Self::Finished => write!(f, "Finished"),
        }
    }
}
