use std::collections::BTreeSet;

/// Drops trigger requests for a set of cells while the suppress button is down.
pub struct Suppressor {
    cells: Option<BTreeSet<usize>>
}

impl Suppressor {
    pub fn new () -> Self {
        Suppressor { cells: None }
    }

    /// Starting again while suppressing replaces the current set.
    pub fn start (&mut self, cells: Vec<usize>) {
        log::debug!("suppress {} cells", cells.len());
        self.cells = Some(cells.into_iter().collect());
    }

    /// Returns the cells that were suppressed.
    pub fn stop (&mut self) -> Vec<usize> {
        match self.cells.take() {
            Some(cells) => cells.into_iter().collect(),
            None => Vec::new()
        }
    }

    pub fn allows (&self, index: usize) -> bool {
        match self.cells {
            Some(ref cells) => !cells.contains(&index),
            None => true
        }
    }

    pub fn suppressed (&self) -> Vec<usize> {
        match self.cells {
            Some(ref cells) => cells.iter().cloned().collect(),
            None => Vec::new()
        }
    }
}
