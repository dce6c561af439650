//! The 3×3 board and its per-slot effect stacks.

use std::fmt;

use cardgrid_protocol::{MarkEffect, PlayerId, SlotMark};

use crate::EngineError;

/// Width and height of the board.
pub const BOARD_DIM: u8 = 3;

/// Number of slots on a board.
pub const SLOT_COUNT: usize = (BOARD_DIM * BOARD_DIM) as usize;

/// A validated slot address in `0..=8`, row-major.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotId(u8);

impl SlotId {
    /// Returns the slot at `row`, `col`, if both are on the board.
    pub fn at(row: i32, col: i32) -> Option<Self> {
        let dim = i32::from(BOARD_DIM);
        if (0..dim).contains(&row) && (0..dim).contains(&col) {
            Some(Self((row * dim + col) as u8))
        } else {
            None
        }
    }

    /// Every slot in board order.
    pub fn all() -> impl Iterator<Item = SlotId> {
        (0..SLOT_COUNT as u8).map(SlotId)
    }

    pub fn index(self) -> usize {
        usize::from(self.0)
    }

    pub fn row(self) -> i32 {
        i32::from(self.0 / BOARD_DIM)
    }

    pub fn col(self) -> i32 {
        i32::from(self.0 % BOARD_DIM)
    }

    pub fn into_inner(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for SlotId {
    type Error = EngineError;

    fn try_from(raw: i64) -> Result<Self, Self::Error> {
        u8::try_from(raw)
            .ok()
            .filter(|id| usize::from(*id) < SLOT_COUNT)
            .map(SlotId)
            .ok_or(EngineError::InvalidSlot(raw))
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slot-{}", self.0)
    }
}

/// One board cell and its effect stack. The last element is the top.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    id: SlotId,
    effects: Vec<MarkEffect>,
}

impl Slot {
    pub fn id(&self) -> SlotId {
        self.id
    }

    /// The stack, bottom first.
    pub fn effects(&self) -> &[MarkEffect] {
        &self.effects
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// `true` if any stacked effect blocks placement.
    pub fn is_blocked(&self) -> bool {
        self.effects.iter().any(|e| e.blocking)
    }

    /// `true` if `player` owns a win-eligible effect here.
    pub fn counts_for(&self, player: PlayerId) -> bool {
        self.effects
            .iter()
            .any(|e| e.win_eligible && e.owner == Some(player))
    }

    /// The top-most displayable effect.
    pub fn visible(&self) -> Option<&MarkEffect> {
        self.effects.iter().rev().find(|e| e.displayable)
    }
}

/// The 9 slots of one room. Owned by the room and mutated only under its
/// lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    slots: Vec<Slot>,
}

impl Board {
    /// Creates an empty board.
    pub fn new() -> Self {
        Self {
            slots: SlotId::all()
                .map(|id| Slot {
                    id,
                    effects: Vec::new(),
                })
                .collect(),
        }
    }

    pub fn slot(&self, id: SlotId) -> &Slot {
        &self.slots[id.index()]
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Pushes `effect` onto the slot's stack.
    ///
    /// Non-stackable effects are silently ignored and `false` is returned;
    /// callers that care about occupancy check it beforehand.
    pub fn apply_effect(&mut self, id: SlotId, effect: MarkEffect) -> bool {
        if !effect.stackable {
            tracing::trace!(slot = %id, "effect is not stackable, skipping");
            return false;
        }
        self.slots[id.index()].effects.push(effect);
        true
    }

    /// Deals `effect.damage` once to every destroyable effect on `targets`,
    /// dropping any that reach zero health. Non-destroyable effects are
    /// immune. No-op when the effect carries no damage.
    pub fn apply_damage(&mut self, targets: &[SlotId], effect: &MarkEffect) {
        if effect.damage <= 0 {
            return;
        }
        for id in targets {
            self.slots[id.index()].effects.retain_mut(|existing| {
                if !existing.destroyable {
                    return true;
                }
                existing.health -= effect.damage;
                !existing.is_dead()
            });
        }
    }

    /// Drops every effect with no health left. Idempotent.
    pub fn remove_dead_marks(&mut self) {
        for slot in &mut self.slots {
            slot.effects.retain(|e| !e.is_dead());
        }
    }

    /// Slots where `player` owns a win-eligible effect, in board order.
    pub fn winning_slots(&self, player: PlayerId) -> Vec<SlotId> {
        self.slots
            .iter()
            .filter(|s| s.counts_for(player))
            .map(Slot::id)
            .collect()
    }

    /// The client-facing view: the visible top of each non-empty slot.
    pub fn display_state(&self) -> Vec<SlotMark> {
        self.slots
            .iter()
            .filter_map(|s| {
                s.visible().map(|effect| SlotMark {
                    slot: s.id.into_inner(),
                    effect: effect.clone(),
                })
            })
            .collect()
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}
