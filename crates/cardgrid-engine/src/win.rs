//! Three-in-a-line detection.
//!
//! For each player (join order) the search walks that player's win-eligible
//! slots in board order and, from each, tries every direction in
//! [`LineKind::ALL`] order. The first complete run wins, so the result is
//! fully determined by player-then-slot-then-direction order.

use std::collections::BTreeSet;
use std::fmt;

use cardgrid_protocol::PlayerId;

use crate::{Board, SlotId};

/// Length of a winning run.
pub const RUN_LENGTH: usize = 3;

/// Direction of a run. Diagonal and anti-diagonal are distinct: a run must
/// keep one direction throughout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineKind {
    Column,
    Row,
    Diagonal,
    AntiDiagonal,
}

impl LineKind {
    /// Search order.
    pub const ALL: [LineKind; 4] = [
        LineKind::Column,
        LineKind::Row,
        LineKind::Diagonal,
        LineKind::AntiDiagonal,
    ];

    /// `(d_row, d_col)` between consecutive slots of a run, walking in board
    /// order.
    pub fn step(self) -> (i32, i32) {
        match self {
            LineKind::Column => (1, 0),
            LineKind::Row => (0, 1),
            LineKind::Diagonal => (1, 1),
            LineKind::AntiDiagonal => (1, -1),
        }
    }
}

impl fmt::Display for LineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LineKind::Column => "column",
            LineKind::Row => "row",
            LineKind::Diagonal => "diagonal",
            LineKind::AntiDiagonal => "anti_diagonal",
        };
        f.write_str(name)
    }
}

/// A completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WinLine {
    pub winner: PlayerId,
    pub kind: LineKind,
    pub slots: [SlotId; RUN_LENGTH],
}

/// Returns the first winning run on `board`, or `None`.
pub fn check_win(board: &Board, players: &[PlayerId]) -> Option<WinLine> {
    players.iter().find_map(|&player| {
        let owned: BTreeSet<SlotId> =
            board.winning_slots(player).into_iter().collect();
        if owned.len() < RUN_LENGTH {
            return None;
        }
        owned.iter().find_map(|&start| {
            LineKind::ALL.into_iter().find_map(|kind| {
                run_from(&owned, start, kind).map(|slots| WinLine {
                    winner: player,
                    kind,
                    slots,
                })
            })
        })
    })
}

/// Follows `kind` from `start`; `Some` if every slot of the run is owned.
fn run_from(
    owned: &BTreeSet<SlotId>,
    start: SlotId,
    kind: LineKind,
) -> Option<[SlotId; RUN_LENGTH]> {
    let (d_row, d_col) = kind.step();
    let mut run = [start; RUN_LENGTH];
    for (i, entry) in run.iter_mut().enumerate().skip(1) {
        let offset = i as i32;
        let next =
            SlotId::at(start.row() + d_row * offset, start.col() + d_col * offset)?;
        if !owned.contains(&next) {
            return None;
        }
        *entry = next;
    }
    Some(run)
}
