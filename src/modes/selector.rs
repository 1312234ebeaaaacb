use crate::grid::CELL_COUNT;
use crate::grid_state::SharedGrid;
use crate::selection::Selection;

/// While active, pad presses toggle cells in and out of the shared selection.
pub struct Selector {
    active: bool
}

impl Selector {
    pub fn new () -> Self {
        Selector { active: false }
    }

    pub fn start (&mut self, grid: &mut SharedGrid) {
        grid.clear_selection();
        self.active = true;
    }

    /// Leaves the selection in place and returns it.
    pub fn stop (&mut self, grid: &SharedGrid) -> Selection {
        self.active = false;
        grid.selection().clone()
    }

    pub fn clear (&mut self, grid: &mut SharedGrid) {
        grid.clear_selection();
    }

    /// Returns false when the press was not consumed.
    pub fn press (&mut self, grid: &mut SharedGrid, index: usize) -> bool {
        if !self.active {
            return false
        }
        if index >= CELL_COUNT {
            log::debug!("selector ignoring out of range cell {}", index);
            return true
        }
        grid.toggle_selected(index);
        true
    }
}
