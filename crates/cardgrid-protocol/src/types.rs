//! Identity types shared by every layer.
//!
//! Both ids are opaque tokens handed out by an `IdSource`; the core only
//! compares, hashes, and prints them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A unique identifier for a connected player.
///
/// Serialized as a plain number (`#[serde(transparent)]`), so
/// `PlayerId(42)` is `42` on the wire.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// A unique identifier for a room (one match).
///
/// Ordered so the registry can keep rooms oldest-first for matchmaking.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RoomId(pub u64);

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R-{}", self.0)
    }
}
