use indexmap::IndexMap;
use crate::grid_state::SharedGrid;
use crate::midi_time::MidiTime;

/// Subdivision used while repeating continuously.
const FASTEST_DIVISION: u32 = 8;

/// Retriggers held pads.
///
/// With a length below 2 the repeater is continuously active: every held
/// pad retriggers at the fastest subdivision, phased from when it was
/// pressed. From 2 upwards it repeats at one beat / length, only on the
/// global subdivision boundaries.
pub struct Repeater {
    length: u32,
    held: IndexMap<usize, MidiTime>
}

impl Repeater {
    pub fn new (length: u32) -> Self {
        Repeater { length, held: IndexMap::new() }
    }

    pub fn set_length (&mut self, length: u32) {
        let was_active = self.is_active();
        self.length = length;
        if was_active != self.is_active() {
            log::debug!("repeater continuous mode {}", if self.is_active() { "on" } else { "off" });
        }
    }

    pub fn is_active (&self) -> bool {
        self.length < 2
    }

    pub fn rate (&self) -> MidiTime {
        if self.is_active() {
            MidiTime::beat_division(FASTEST_DIVISION)
        } else {
            MidiTime::beat_division(self.length)
        }
    }

    pub fn press (&mut self, index: usize, position: MidiTime) {
        self.held.insert(index, position);
    }

    pub fn release (&mut self, index: usize) {
        self.held.shift_remove(&index);
    }

    pub fn is_held (&self, index: usize) -> bool {
        self.held.contains_key(&index)
    }

    /// Cells to retrigger in `from..to`. Empty cells and no-repeat cells never repeat.
    pub fn tick (&self, from: MidiTime, to: MidiTime, grid: &SharedGrid) -> Vec<usize> {
        let rate = self.rate();
        let continuous = self.is_active();

        self.held.iter().filter(|&(&index, &pressed_at)| {
            if !grid.is_occupied(index) || grid.is_no_repeat(index) {
                return false
            }

            let boundary = if continuous {
                // shift into the pad's own phase
                let offset = pressed_at % rate;
                MidiTime::boundary_within(from - offset, to - offset, rate).map(|b| b + offset)
            } else {
                MidiTime::boundary_within(from, to, rate)
            };

            match boundary {
                Some(boundary) => boundary > pressed_at,
                None => false
            }
        }).map(|(&index, _)| index).collect()
    }
}
