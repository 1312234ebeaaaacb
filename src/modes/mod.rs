mod holder;
mod mover;
mod repeater;
mod selector;
mod suppressor;

pub use self::holder::{Holder, HoldRelease};
pub use self::mover::Mover;
pub use self::repeater::Repeater;
pub use self::selector::Selector;
pub use self::suppressor::Suppressor;

use crate::grid_state::SharedGrid;
use crate::selection::Selection;

/// Cells a hold or suppress session applies to. An empty selection means every occupied cell.
pub fn target_cells (selection: &Selection, grid: &SharedGrid) -> Vec<usize> {
    if selection.is_empty() {
        grid.occupied()
    } else {
        selection.to_vec()
    }
}
