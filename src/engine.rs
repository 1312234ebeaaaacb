use std::collections::{HashMap, HashSet};
use crate::chunk::Chunk;
use crate::clock::ScheduleRange;
use crate::grid::{CellMove, LoopId, CELL_COUNT};
use crate::loop_state::TransformHistory;
use crate::midi_connection::MidiSink;
use crate::midi_time::MidiTime;
use crate::modes::HoldRelease;

#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum Trigger {
    On(u8),
    Off
}

#[derive(Debug, Eq, PartialEq, Copy, Clone, Default)]
pub struct CellFlags {
    pub playing: bool,
    pub active: bool,
    pub recording: bool
}

/// The loop engine the surface drives.
pub trait LoopEngine {
    fn current_position (&self) -> MidiTime;
    fn schedule (&mut self, _range: ScheduleRange) {}
    fn trigger (&mut self, index: usize, value: Trigger);
    fn cell_id (&self, index: usize) -> Option<LoopId>;
    fn cell_flags (&self, index: usize) -> CellFlags;
    fn relocate (&mut self, moves: &[CellMove]);
    /// Pins `cells` to `position` until the matching `release_hold`.
    fn hold (&mut self, _cells: &[usize], _position: MidiTime) {}
    fn release_hold (&mut self, _release: &HoldRelease) {}
    fn transform_count (&self) -> usize;
    fn recording_len (&self) -> usize;
    fn store (&mut self);
    fn flatten (&mut self);
    fn undo (&mut self);
    fn redo (&mut self);
}

#[derive(Debug, Clone)]
struct Voice {
    id: LoopId,
    note: u8
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct RecordedEvent {
    pos: MidiTime,
    index: usize,
    value: Trigger
}

/// Plays each configured chunk cell as a MIDI note and keeps what was
/// played as stored transforms.
pub struct TriggerEngine<S: MidiSink> {
    output: S,
    channel: u8,
    cells: Vec<Option<Voice>>,
    sounding: HashSet<usize>,
    position: MidiTime,
    held: HashMap<usize, MidiTime>,
    recording: Vec<RecordedEvent>,
    history: TransformHistory<Vec<RecordedEvent>>,
    base: Vec<RecordedEvent>
}

impl<S: MidiSink> TriggerEngine<S> {
    pub fn new (output: S, channel: u8, chunks: &[Chunk]) -> Self {
        let mut cells = vec![None; CELL_COUNT];
        for chunk in chunks {
            if chunk.trigger_ids.is_empty() {
                continue
            }
            for index in chunk.indexes() {
                if let (Some(id), Some(local)) = (chunk.loop_id(index), chunk.local_id(index)) {
                    let note = chunk.trigger_ids[local as usize % chunk.trigger_ids.len()];
                    cells[index] = Some(Voice { id, note });
                }
            }
        }

        TriggerEngine {
            output,
            channel: channel.max(1).min(16),
            cells,
            sounding: HashSet::new(),
            position: MidiTime::zero(),
            held: HashMap::new(),
            recording: Vec::new(),
            history: TransformHistory::new(),
            base: Vec::new()
        }
    }

    pub fn output (&self) -> &S {
        &self.output
    }

    fn send (&mut self, message: &[u8]) {
        if let Err(err) = self.output.send(message) {
            log::warn!("trigger output: {}", err);
        }
    }

    /// Held cells play from their pinned position, the rest from the clock.
    pub fn cell_position (&self, index: usize) -> MidiTime {
        self.held.get(&index).cloned().unwrap_or(self.position)
    }

    fn is_stored (&self, index: usize) -> bool {
        self.base.iter().chain(self.history.iter().flatten()).any(|event| event.index == index)
    }
}

impl<S: MidiSink> LoopEngine for TriggerEngine<S> {
    fn current_position (&self) -> MidiTime {
        self.position
    }

    fn schedule (&mut self, range: ScheduleRange) {
        self.position = range.to;
    }

    fn trigger (&mut self, index: usize, value: Trigger) {
        let note = match self.cells.get(index) {
            Some(Some(voice)) => voice.note,
            _ => return
        };

        match value {
            Trigger::On(velocity) => {
                let message = [144 - 1 + self.channel, note, velocity];
                self.send(&message);
                self.sounding.insert(index);
            },
            Trigger::Off => {
                if !self.sounding.remove(&index) {
                    return
                }
                let message = [128 - 1 + self.channel, note, 0];
                self.send(&message);
            }
        }

        let pos = self.cell_position(index);
        self.recording.push(RecordedEvent { pos, index, value });
    }

    fn cell_id (&self, index: usize) -> Option<LoopId> {
        self.cells.get(index).and_then(|cell| cell.as_ref()).map(|voice| voice.id.clone())
    }

    fn cell_flags (&self, index: usize) -> CellFlags {
        CellFlags {
            playing: self.is_stored(index),
            active: self.sounding.contains(&index),
            recording: self.recording.iter().any(|event| event.index == index)
        }
    }

    fn relocate (&mut self, moves: &[CellMove]) {
        let voices: Vec<Option<Voice>> = moves.iter().map(|m| self.cells.get(m.from).cloned().unwrap_or(None)).collect();
        for m in moves {
            if let Some(cell) = self.cells.get_mut(m.from) {
                *cell = None;
            }
        }
        for (m, voice) in moves.iter().zip(voices) {
            if let Some(cell) = self.cells.get_mut(m.to) {
                *cell = voice;
            }
        }

        let remap = |index: usize| moves.iter().find(|m| m.from == index).map_or(index, |m| m.to);
        self.sounding = self.sounding.iter().map(|index| remap(*index)).collect();
        self.held = self.held.iter().map(|(index, pos)| (remap(*index), *pos)).collect();
        for event in self.recording.iter_mut().chain(self.base.iter_mut()) {
            event.index = remap(event.index);
        }
        self.history.for_each_mut(|events| {
            for event in events.iter_mut() {
                event.index = remap(event.index);
            }
        });
    }

    fn hold (&mut self, cells: &[usize], position: MidiTime) {
        self.held = cells.iter().map(|index| (*index, position)).collect();
        log::debug!("{} cells pinned at tick {}", cells.len(), position.ticks());
    }

    fn release_hold (&mut self, release: &HoldRelease) {
        for index in &release.cells {
            self.held.remove(index);
        }
        log::debug!("{} cells resume at tick {}", release.cells.len(), release.resume_at.ticks());
    }

    fn transform_count (&self) -> usize {
        self.history.len()
    }

    fn recording_len (&self) -> usize {
        self.recording.len()
    }

    fn store (&mut self) {
        if !self.recording.is_empty() {
            let events = std::mem::replace(&mut self.recording, Vec::new());
            log::info!("stored {} events as transform {}", events.len(), self.history.len() + 1);
            self.history.push(events);
        }
    }

    fn flatten (&mut self) {
        for events in self.history.take_all() {
            self.base.extend(events);
        }
        log::info!("flattened into {} base events", self.base.len());
    }

    fn undo (&mut self) {
        self.history.undo();
    }

    fn redo (&mut self) {
        self.history.redo();
    }
}
