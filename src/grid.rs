use serde::{Deserialize, Serialize};
use std::fmt;

pub const ROWS: u32 = 8;
pub const COLS: u32 = 8;
pub const CELL_COUNT: usize = (ROWS * COLS) as usize;

/// Opaque handle to loop content owned by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LoopId(pub String);

impl LoopId {
    pub fn new (id: &str) -> LoopId {
        LoopId(String::from(id))
    }
}

impl fmt::Display for LoopId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Eq, PartialEq, Copy, Clone, Hash, Serialize, Deserialize)]
pub struct Coords {
    pub row: u32,
    pub col: u32
}

impl Coords {
    pub fn new (row: u32, col: u32) -> Coords {
        Coords { row, col }
    }

    pub fn from (index: usize) -> Option<Coords> {
        if index < CELL_COUNT {
            Some(Coords {
                row: index as u32 / COLS,
                col: index as u32 % COLS
            })
        } else {
            None
        }
    }

    pub fn index (&self) -> usize {
        (self.row * COLS + self.col) as usize
    }

    /// Row/column distance from `self` to `other`.
    pub fn delta_to (&self, other: Coords) -> (i32, i32) {
        (other.row as i32 - self.row as i32, other.col as i32 - self.col as i32)
    }

    /// Shifted position, or `None` once it leaves the grid. Never wraps.
    pub fn offset (&self, delta: (i32, i32)) -> Option<Coords> {
        let row = self.row as i32 + delta.0;
        let col = self.col as i32 + delta.1;
        if row < 0 || col < 0 || row >= ROWS as i32 || col >= COLS as i32 {
            None
        } else {
            Some(Coords::new(row as u32, col as u32))
        }
    }
}

#[derive(Debug, Eq, PartialEq, Copy, Clone, Serialize, Deserialize)]
pub struct Shape {
    pub rows: u32,
    pub cols: u32
}

impl Shape {
    pub fn new (rows: u32, cols: u32) -> Shape {
        Shape { rows, cols }
    }

    pub fn contains (&self, origin: Coords, coords: Coords) -> bool {
        coords.row >= origin.row && coords.row < origin.row + self.rows &&
            coords.col >= origin.col && coords.col < origin.col + self.cols
    }
}

/// Fixed 8x8 plane of values addressed by linear index.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Grid<T> {
    data: Vec<T>
}

impl<T: Clone + Default> Grid<T> {
    pub fn new () -> Self {
        Grid { data: vec![T::default(); CELL_COUNT] }
    }
}

impl<T> Grid<T> {
    pub fn get (&self, index: usize) -> Option<&T> {
        self.data.get(index)
    }

    /// Out-of-range writes are ignored; returns whether the write landed.
    pub fn set (&mut self, index: usize, value: T) -> bool {
        match self.data.get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            },
            None => false
        }
    }

    pub fn iter (&self) -> impl Iterator<Item=(usize, &T)> {
        self.data.iter().enumerate()
    }
}

/// Everything a cell carries, as relocated by the mover.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CellContent {
    pub id: Option<LoopId>,
    pub playing: bool,
    pub active: bool,
    pub recording: bool,
    pub no_repeat: bool
}

#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub struct CellMove {
    pub from: usize,
    pub to: usize
}
