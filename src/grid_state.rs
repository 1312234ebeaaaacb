use serde::Serialize;
use crate::chunk::{Chunk, ChunkSummary};
use crate::grid::{Grid, LoopId, CellContent, CellMove};
use crate::observ::{Observ, Computed};
use crate::selection::Selection;

/// What an external UI renders for one occupied cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CellState {
    pub id: LoopId,
    pub is_playing: bool,
    pub is_active: bool,
    pub is_selected: bool,
    pub is_recording: bool,
    pub no_repeat: bool
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridState {
    pub grid: Grid<Option<CellState>>,
    pub chunks: Vec<ChunkSummary>,
    pub port_choices: Vec<String>
}

/// Cell ids, flag planes, selection and port list, plus the derived `GridState`.
pub struct SharedGrid {
    sources: Sources,
    state: Computed<GridState>
}

struct Sources {
    ids: Observ<Grid<Option<LoopId>>>,
    playing: Observ<Grid<bool>>,
    active: Observ<Grid<bool>>,
    recording: Observ<Grid<bool>>,
    no_repeat: Observ<Grid<bool>>,
    selection: Observ<Selection>,
    port_choices: Observ<Vec<String>>,
    chunks: Vec<Chunk>
}

impl Sources {
    fn versions (&self) -> [u64; 7] {
        [
            self.ids.version(),
            self.playing.version(),
            self.active.version(),
            self.recording.version(),
            self.no_repeat.version(),
            self.selection.version(),
            self.port_choices.version()
        ]
    }

    fn project (&self) -> GridState {
        let ids = self.ids.get();
        let playing = self.playing.get();
        let selection = self.selection.get();

        let mut grid = Grid::new();
        for (index, id) in ids.iter() {
            if let Some(id) = id {
                grid.set(index, Some(CellState {
                    id: id.clone(),
                    is_playing: flag(playing, index),
                    is_active: flag(self.active.get(), index),
                    is_selected: selection.contains(index),
                    is_recording: flag(self.recording.get(), index),
                    no_repeat: flag(self.no_repeat.get(), index)
                }));
            }
        }

        let chunks = self.chunks.iter().map(|chunk| {
            let occupied: Vec<usize> = chunk.indexes()
                .filter(|index| ids.get(*index).map_or(false, |id| id.is_some()))
                .collect();
            ChunkSummary {
                id: chunk.id.clone(),
                coords: chunk.coords,
                shape: chunk.shape,
                playing: occupied.iter().filter(|index| flag(playing, **index)).count(),
                occupied: occupied.len()
            }
        }).collect();

        GridState { grid, chunks, port_choices: self.port_choices.get().clone() }
    }
}

impl SharedGrid {
    pub fn new (chunks: Vec<Chunk>) -> Self {
        SharedGrid {
            sources: Sources {
                ids: Observ::new(Grid::new()),
                playing: Observ::new(Grid::new()),
                active: Observ::new(Grid::new()),
                recording: Observ::new(Grid::new()),
                no_repeat: Observ::new(Grid::new()),
                selection: Observ::new(Selection::new()),
                port_choices: Observ::new(Vec::new()),
                chunks
            },
            state: Computed::new()
        }
    }

    pub fn id (&self, index: usize) -> Option<&LoopId> {
        self.sources.ids.get().get(index).and_then(|id| id.as_ref())
    }

    pub fn is_occupied (&self, index: usize) -> bool {
        self.id(index).is_some()
    }

    pub fn is_no_repeat (&self, index: usize) -> bool {
        self.is_occupied(index) && flag(self.sources.no_repeat.get(), index)
    }

    pub fn occupied (&self) -> Vec<usize> {
        self.sources.ids.get().iter().filter(|(_, id)| id.is_some()).map(|(index, _)| index).collect()
    }

    pub fn set_id (&mut self, index: usize, id: Option<LoopId>) -> bool {
        set_plane(&mut self.sources.ids, index, id)
    }

    pub fn set_playing (&mut self, index: usize, value: bool) -> bool {
        set_plane(&mut self.sources.playing, index, value)
    }

    pub fn set_active (&mut self, index: usize, value: bool) -> bool {
        set_plane(&mut self.sources.active, index, value)
    }

    pub fn set_recording (&mut self, index: usize, value: bool) -> bool {
        set_plane(&mut self.sources.recording, index, value)
    }

    pub fn set_no_repeat (&mut self, index: usize, value: bool) -> bool {
        set_plane(&mut self.sources.no_repeat, index, value)
    }

    pub fn set_port_choices (&mut self, ports: Vec<String>) -> bool {
        self.sources.port_choices.set(ports)
    }

    pub fn selection (&self) -> &Selection {
        self.sources.selection.get()
    }

    pub fn toggle_selected (&mut self, index: usize) -> bool {
        let mut selected = false;
        self.sources.selection.update(|selection| {
            selected = selection.toggle(index);
            true
        });
        selected
    }

    pub fn set_selection (&mut self, selection: Selection) -> bool {
        self.sources.selection.set(selection)
    }

    pub fn clear_selection (&mut self) -> bool {
        self.sources.selection.update(|selection| selection.clear())
    }

    pub fn content (&self, index: usize) -> CellContent {
        let sources = &self.sources;
        CellContent {
            id: self.id(index).cloned(),
            playing: flag(sources.playing.get(), index),
            active: flag(sources.active.get(), index),
            recording: flag(sources.recording.get(), index),
            no_repeat: flag(sources.no_repeat.get(), index)
        }
    }

    pub fn set_content (&mut self, index: usize, content: CellContent) {
        self.set_id(index, content.id);
        self.set_playing(index, content.playing);
        self.set_active(index, content.active);
        self.set_recording(index, content.recording);
        self.set_no_repeat(index, content.no_repeat);
    }

    /// Sources are read before anything is written, so overlapping moves are safe.
    pub fn relocate (&mut self, moves: &[CellMove]) {
        let contents: Vec<CellContent> = moves.iter().map(|m| self.content(m.from)).collect();
        for m in moves {
            self.set_content(m.from, CellContent::default());
        }
        for (m, content) in moves.iter().zip(contents) {
            self.set_content(m.to, content);
        }
    }

    /// Recompute `GridState` if any source changed. Returns true when rebuilt.
    pub fn refresh (&mut self) -> bool {
        let sources = &self.sources;
        self.state.refresh(&sources.versions(), || sources.project())
    }

    pub fn state (&mut self) -> &GridState {
        let sources = &self.sources;
        self.state.current(&sources.versions(), || sources.project())
    }

    pub fn state_version (&self) -> u64 {
        self.state.version()
    }
}

fn flag (plane: &Grid<bool>, index: usize) -> bool {
    plane.get(index).cloned().unwrap_or(false)
}

fn set_plane<T: PartialEq> (plane: &mut Observ<Grid<T>>, index: usize, value: T) -> bool {
    plane.update(|grid| {
        let changed = grid.get(index).map_or(false, |current| *current != value);
        changed && grid.set(index, value)
    })
}
