//! # Bead Plate Layout
//!
//! Column-major packing of classified blocks into a fixed number of rows.
//!
//! This is plain pagination: block `i` lands at row `i % rows`, column
//! `i / rows`. It does not group streaks of equal classification.

use crate::domain::{
    BlockRecord, Classification, ClassificationAxis, ClassificationTally, GridCell, SyncError,
};

/// One column of a bead plate, top row first.
pub type GridColumn = Vec<GridCell>;

/// Classification of `block` on `axis`.
pub fn classify(block: &BlockRecord, axis: ClassificationAxis) -> Classification {
    match axis {
        ClassificationAxis::Parity => block.block_type.into(),
        ClassificationAxis::Size => block.size_type.into(),
    }
}

/// Lay out `blocks` (ascending, oldest first) into columns of `rows` cells.
///
/// Produces `ceil(len / rows)` columns. Column 0 holds the oldest blocks; the
/// last column may end in empty cells.
///
/// # Errors
/// - `InvalidConfig` if `rows == 0`
pub fn build_bead_grid(
    blocks: &[BlockRecord],
    axis: ClassificationAxis,
    rows: usize,
) -> Result<Vec<GridColumn>, SyncError> {
    if rows == 0 {
        return Err(SyncError::InvalidConfig(
            "bead plate needs at least one row".to_string(),
        ));
    }

    let columns = blocks.len().div_ceil(rows);
    let mut grid = vec![vec![GridCell::empty(); rows]; columns];
    for (index, block) in blocks.iter().enumerate() {
        grid[index / rows][index % rows] = GridCell::filled(classify(block, axis), block.result_value);
    }
    Ok(grid)
}

/// Count both classification values of `axis` in `blocks`.
pub fn tally(blocks: &[BlockRecord], axis: ClassificationAxis) -> ClassificationTally {
    let first = blocks
        .iter()
        .filter(|block| {
            matches!(
                classify(block, axis),
                Classification::Odd | Classification::Big
            )
        })
        .count();
    ClassificationTally {
        first,
        second: blocks.len() - first,
    }
}
