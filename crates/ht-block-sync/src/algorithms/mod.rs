//! # Algorithms Module
//!
//! Pure transforms: alignment, sync planning and bead plate layout.

pub mod alignment;
pub mod bead_grid;
pub mod sync_plan;

pub use alignment::{align_down, is_aligned, sample_view};
pub use bead_grid::{build_bead_grid, classify, tally, GridColumn};
pub use sync_plan::{backfill_targets, gap_range};
