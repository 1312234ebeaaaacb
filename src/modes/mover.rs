use std::collections::HashSet;
use crate::grid::{Coords, CellMove};
use crate::grid_state::SharedGrid;
use crate::selection::Selection;

/// Waits for one target press, then shifts the selected cells so the
/// first selected cell lands on the target.
///
/// Offsets are applied in row/column space. A cell whose destination would
/// leave the grid is not moved and keeps its content; it is also dropped
/// from the resulting selection. A selected cell whose destination is such a
/// staying cell stays put too. Moved cells overwrite whatever unselected
/// content sits at their destination.
pub struct Mover {
    pending: Option<Selection>
}

impl Mover {
    pub fn new () -> Self {
        Mover { pending: None }
    }

    /// Replaces any move that was still waiting for a target.
    pub fn start (&mut self, selection: Selection) {
        self.pending = if selection.is_empty() { None } else { Some(selection) };
    }

    pub fn stop (&mut self) {
        self.pending = None;
    }

    /// Commits the pending move onto `target`. Returns the applied moves and
    /// the selection at the new location, or None if nothing was pending or
    /// the target is off the grid (the move stays pending then).
    pub fn press (&mut self, grid: &mut SharedGrid, target: usize) -> Option<(Vec<CellMove>, Selection)> {
        let target_coords = match Coords::from(target) {
            Some(coords) => coords,
            None => {
                log::debug!("move target {} out of range", target);
                return None
            }
        };

        let selection = self.pending.take()?;
        let (moves, moved) = plan(&selection, target_coords, grid);
        grid.relocate(&moves);
        Some((moves, moved))
    }
}

fn plan (selection: &Selection, target: Coords, grid: &SharedGrid) -> (Vec<CellMove>, Selection) {
    let anchor = match selection.first().and_then(Coords::from) {
        Some(anchor) => anchor,
        None => return (Vec::new(), Selection::new())
    };
    let delta = anchor.delta_to(target);
    let destination = |index: usize| Coords::from(index).and_then(|coords| coords.offset(delta)).map(|coords| coords.index());

    let mut staying: HashSet<usize> = selection.iter().filter(|index| destination(*index).is_none()).collect();
    loop {
        let blocked: Vec<usize> = selection.iter().filter(|index| {
            !staying.contains(index) && destination(*index).map_or(false, |to| {
                staying.contains(&to) && grid.is_occupied(to)
            })
        }).collect();
        if blocked.is_empty() {
            break
        }
        for index in blocked {
            log::debug!("cell {} stays, its destination is not moving", index);
            staying.insert(index);
        }
    }

    let mut moves = Vec::new();
    let mut moved = Selection::new();

    for index in selection.iter().filter(|index| !staying.contains(index)) {
        if let Some(to) = destination(index) {
            moved.toggle(to);
            if grid.is_occupied(index) && to != index {
                moves.push(CellMove { from: index, to });
            }
        }
    }

    (moves, moved)
}
