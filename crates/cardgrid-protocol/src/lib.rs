//! Wire protocol for Cardgrid.
//!
//! - **Identity** ([`PlayerId`], [`RoomId`])
//! - **Cards** ([`Card`], [`MarkEffect`] and their enums): the data model
//!   the catalog owns and the board stores; also part of outbound messages.
//! - **Messages** ([`PlayerMessage`] inbound, [`GameMessage`] outbound)
//! - **Codec** ([`Codec`] trait, [`JsonCodec`])
//!
//! ```text
//! Transport (bytes) → Protocol (PlayerMessage / GameMessage) → Room
//! ```

mod card;
mod codec;
mod error;
mod message;
mod types;

pub use card::{Card, CardType, DamageType, ImpactShape, ImpactType, MarkEffect};
pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use message::{GameMessage, PlayerMessage, SlotMark};
pub use types::{PlayerId, RoomId};
