//! Card templates and the board effects they produce.
//!
//! A [`Card`] is an immutable template owned by the catalog. Playing a card
//! copies its embedded [`MarkEffect`] and stamps the acting player as owner;
//! the copy is what lands on the board. Both types travel on the wire
//! (`game_start` carries the dealt hand, `game_state` carries effects).

use serde::{Deserialize, Serialize};

use crate::PlayerId;

/// Broad behavior class of a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardType {
    /// Does nothing when played.
    Null,
    /// Places marks and/or damages existing ones.
    Attack,
    /// Recognized but not yet implemented: playing one is a no-op.
    Buff,
}

/// Whether a card affects its target slot only, or a derived set of slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImpactType {
    Singular,
    Multiple,
}

/// Geometry used to derive the affected slots of a `Multiple` card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImpactShape {
    /// The target slot alone.
    None,
    /// The target and every slot touching it, diagonals included.
    Radius,
    /// Every slot in the target's row or column.
    Lines,
}

/// How an effect's damage interacts with what is already on a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageType {
    /// Placement: refused when the slot holds a blocking effect.
    Place,
    /// Ignores blocking effects.
    Pure,
}

/// A stateful board impact.
///
/// `owner` is identity only: an effect never keeps a player alive, and
/// templates in the catalog have no owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkEffect {
    pub owner: Option<PlayerId>,
    pub health: i32,
    pub damage: i32,
    pub destroyable: bool,
    pub stackable: bool,
    pub blocking: bool,
    pub displayable: bool,
    pub win_eligible: bool,
    pub damage_type: DamageType,
    pub graphic_path: String,
}

impl MarkEffect {
    /// Returns a copy of this template owned by `player`.
    pub fn owned_by(&self, player: PlayerId) -> Self {
        Self {
            owner: Some(player),
            ..self.clone()
        }
    }

    /// An effect with no health left must not stay on the board.
    pub fn is_dead(&self) -> bool {
        self.health <= 0
    }
}

/// An immutable card template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    #[serde(rename = "type")]
    pub card_type: CardType,
    /// Unique key within a catalog.
    pub name: String,
    pub description: String,
    /// Draw weight. Non-negative; normalized across the catalog.
    pub rarity: f64,
    pub impact_type: ImpactType,
    pub impact_shape: ImpactShape,
    pub graphic_path: String,
    pub marker_path: String,
    pub mark_effect: MarkEffect,
}
