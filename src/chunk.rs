use serde::{Deserialize, Serialize};
use crate::grid::{Coords, Shape, LoopId};

/// A named rectangle of pads that shares one output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    pub coords: Coords,
    pub shape: Shape,
    pub trigger_ids: Vec<u8>
}

impl Chunk {
    /// Position of the cell inside this chunk, row-major.
    pub fn local_id (&self, index: usize) -> Option<u32> {
        let coords = Coords::from(index)?;
        if self.shape.contains(self.coords, coords) {
            Some((coords.row - self.coords.row) * self.shape.cols + (coords.col - self.coords.col))
        } else {
            None
        }
    }

    pub fn loop_id (&self, index: usize) -> Option<LoopId> {
        self.local_id(index).map(|id| LoopId(format!("{}/{}", self.id, id)))
    }

    pub fn indexes (&self) -> impl Iterator<Item=usize> + '_ {
        let origin = self.coords;
        (0..self.shape.rows).flat_map(move |row| {
            (0..self.shape.cols).filter_map(move |col| {
                origin.offset((row as i32, col as i32)).map(|coords| coords.index())
            })
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChunkSummary {
    pub id: String,
    pub coords: Coords,
    pub shape: Shape,
    pub occupied: usize,
    pub playing: usize
}
