//! Impact-shape geometry. Pure functions of slot coordinates.

use cardgrid_protocol::ImpactShape;

use crate::SlotId;

/// Returns the slots a card with `shape` affects when aimed at `target`,
/// in board order.
///
/// - `Radius`: Chebyshev distance ≤ 1 (the 3×3 neighborhood, clipped).
/// - `Lines`: same row or same column (a plus through the target).
/// - `None`: the target alone.
pub fn resolve_shape(shape: ImpactShape, target: SlotId) -> Vec<SlotId> {
    SlotId::all()
        .filter(|slot| {
            let d_row = (slot.row() - target.row()).abs();
            let d_col = (slot.col() - target.col()).abs();
            match shape {
                ImpactShape::Radius => d_row <= 1 && d_col <= 1,
                ImpactShape::Lines => d_row == 0 || d_col == 0,
                ImpactShape::None => *slot == target,
            }
        })
        .collect()
}
