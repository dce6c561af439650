//! Game messages exchanged with clients.
//!
//! Both directions are internally tagged JSON objects: inbound messages carry
//! an `"action"` key, outbound messages a `"type"` key.

use serde::{Deserialize, Serialize};

use crate::{Card, MarkEffect, PlayerId};

/// Client → Server.
///
/// The set of actions is closed. Anything the server does not handle decodes
/// to [`PlayerMessage::Unhandled`], which is a no-op by contract rather than
/// a decode failure.
///
/// ```rust
/// use cardgrid_protocol::PlayerMessage;
///
/// let msg: PlayerMessage = serde_json::from_str(
///     r#"{"action":"play_card","card_name":"Mark","target_slot":4}"#,
/// ).unwrap();
/// assert_eq!(
///     msg,
///     PlayerMessage::PlayCard { card_name: "Mark".into(), target_slot: 4 },
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PlayerMessage {
    /// Play `card_name` from the hand onto `target_slot`.
    ///
    /// The slot is kept signed so out-of-range values such as `-1` reach
    /// the room and get a proper invalid-action reply.
    PlayCard { card_name: String, target_slot: i64 },

    /// Any other action.
    #[serde(other)]
    Unhandled,
}

/// The visible top of one slot's effect stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotMark {
    pub slot: u8,
    #[serde(flatten)]
    pub effect: MarkEffect,
}

/// Server → Client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameMessage {
    /// Sent to each player once the room is dealt.
    GameStart {
        cards_to_add: Vec<Card>,
        your_turn: bool,
    },

    /// Sent to the acting player after a card resolved.
    PlayCardSuccess {
        target_slot: u8,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        cards_to_remove: Vec<Card>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        cards_to_add: Vec<Card>,
    },

    /// Sent to the acting player when an action was rejected.
    Error { message: String },

    /// Broadcast after every resolved action.
    GameState {
        board_state: Vec<SlotMark>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        active_player: Option<PlayerId>,
    },

    /// Broadcast when the room finishes.
    GameOver {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        winner: Option<PlayerId>,
        reason: String,
    },
}

impl GameMessage {
    /// Shorthand for an [`GameMessage::Error`].
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// The wire tag, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::GameStart { .. } => "game_start",
            Self::PlayCardSuccess { .. } => "play_card_success",
            Self::Error { .. } => "error",
            Self::GameState { .. } => "game_state",
            Self::GameOver { .. } => "game_over",
        }
    }
}
