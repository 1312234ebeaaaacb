use crate::midi_time::MidiTime;

struct HoldSession {
    position: MidiTime,
    cells: Vec<usize>
}

/// Released cells and the boundary at which they line up with the clock again.
#[derive(Debug, Clone, PartialEq)]
pub struct HoldRelease {
    pub cells: Vec<usize>,
    pub resume_at: MidiTime
}

/// Pins the playback position of a set of cells while the hold button is down.
pub struct Holder {
    session: Option<HoldSession>,
    length: u32
}

impl Holder {
    pub fn new (length: u32) -> Self {
        Holder { session: None, length }
    }

    /// Starting again while holding replaces the current session.
    pub fn start (&mut self, position: MidiTime, cells: Vec<usize>) {
        log::debug!("hold {} cells at tick {}", cells.len(), position.ticks());
        self.session = Some(HoldSession { position, cells });
    }

    /// No-op while idle.
    pub fn stop (&mut self, now: MidiTime) -> Option<HoldRelease> {
        let session = self.session.take()?;
        Some(HoldRelease {
            cells: session.cells,
            resume_at: now.quantize_up(self.quantize())
        })
    }

    pub fn set_length (&mut self, length: u32) {
        self.length = length;
    }

    pub fn quantize (&self) -> MidiTime {
        MidiTime::beat_division(self.length)
    }

    /// Position a cell should play from given the live clock.
    pub fn position (&self, index: usize, live: MidiTime) -> MidiTime {
        match self.session {
            Some(ref session) if session.cells.contains(&index) => session.position,
            _ => live
        }
    }
}
