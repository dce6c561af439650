//! Board and effect engine for Cardgrid.
//!
//! Everything here is synchronous game logic except the [`CardCatalog`],
//! whose draws coordinate with registration through an async `RwLock`.
//!
//! - [`CardCatalog`]: card templates and weighted draws
//! - [`Board`] / [`Slot`] / [`SlotId`]: the 3×3 grid and effect stacks
//! - [`resolve_shape`]: which slots a multi-slot card hits
//! - [`check_win`]: three-in-a-line detection

mod board;
mod catalog;
mod error;
mod shape;
mod win;

pub use board::{BOARD_DIM, Board, SLOT_COUNT, Slot, SlotId};
pub use catalog::{
    CardCatalog, MARK, Roller, ThreadRoller, fallback_card, standard_cards,
};
pub use error::EngineError;
pub use shape::resolve_shape;
pub use win::{LineKind, RUN_LENGTH, WinLine, check_win};
