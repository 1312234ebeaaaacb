//! Launchpad Mini wire format.
//!
//! Pads are notes `row * 16 + col`, the right-hand column (col 8) is the
//! repeat buttons, and the top row sends CC 104-111.

use std::collections::HashMap;
use thiserror::Error;
use crate::buttons::{Button, REPEAT_BUTTON_COUNT};
use crate::grid::{Coords, CELL_COUNT};
use crate::lights::{Light, LightFrame};
use crate::midi_connection::MidiSink;

pub const RESET_MESSAGE: [u8; 3] = [176, 0, 0];

const NOTE_ON: u8 = 144;
const NOTE_OFF: u8 = 128;
const CONTROL_CHANGE: u8 = 176;

const TOP_BUTTONS: [(u8, Button); 6] = [
    (104, Button::LoopRange),
    (105, Button::Undo),
    (106, Button::Redo),
    (107, Button::Hold),
    (108, Button::Suppress),
    (109, Button::Select)
];

#[derive(Debug, Error, PartialEq)]
pub enum DeviceError {
    #[error("expected 3 bytes, got {0}")]
    Truncated(usize)
}

#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum SurfaceEvent {
    Pad(usize, bool),
    Button(Button, bool)
}

/// Decode one inbound message. Messages the surface does not use give `Ok(None)`.
pub fn parse (message: &[u8]) -> Result<Option<SurfaceEvent>, DeviceError> {
    if message.len() < 3 {
        return Err(DeviceError::Truncated(message.len()))
    }

    let pressed = message[0] != NOTE_OFF && message[2] > 0;

    match message[0] {
        NOTE_ON | NOTE_OFF => {
            let row = message[1] / 16;
            let col = message[1] % 16;
            if row >= 8 {
                Ok(None)
            } else if col < 8 {
                Ok(Some(SurfaceEvent::Pad(Coords::new(row as u32, col as u32).index(), pressed)))
            } else if col == 8 {
                Ok(Some(SurfaceEvent::Button(Button::Repeat(row), pressed)))
            } else {
                Ok(None)
            }
        },
        CONTROL_CHANGE => {
            let button = TOP_BUTTONS.iter().find(|(id, _)| *id == message[1]).map(|(_, button)| *button);
            Ok(button.map(|button| SurfaceEvent::Button(button, pressed)))
        },
        _ => Ok(None)
    }
}

fn cell_address (index: usize) -> Option<(u8, u8)> {
    let coords = Coords::from(index)?;
    Some((NOTE_ON, (coords.row * 16 + coords.col) as u8))
}

fn button_address (button: Button) -> Option<(u8, u8)> {
    match button {
        Button::Repeat(row) if row < REPEAT_BUTTON_COUNT => Some((NOTE_ON, row * 16 + 8)),
        Button::Repeat(_) => None,
        button => TOP_BUTTONS.iter().find(|(_, b)| *b == button).map(|(id, _)| (CONTROL_CHANGE, *id))
    }
}

/// Writes only the lights that differ from what the device last accepted.
pub struct LightWriter {
    sent: HashMap<(u8, u8), u8>
}

impl LightWriter {
    pub fn new () -> Self {
        LightWriter { sent: HashMap::new() }
    }

    /// Forget what was sent; the next frame is written in full.
    pub fn forget (&mut self) {
        self.sent.clear();
    }

    pub fn reset<S: MidiSink> (&mut self, sink: &mut S) {
        self.forget();
        if let Err(err) = sink.send(&RESET_MESSAGE) {
            log::warn!("light reset failed: {}", err);
        }
    }

    pub fn write<S: MidiSink> (&mut self, frame: &LightFrame, sink: &mut S) {
        let cells = (0..CELL_COUNT).filter_map(|index| cell_address(index).map(|address| (address, frame.cell(index))));
        let buttons = frame.buttons.iter().filter_map(|(button, light)| button_address(*button).map(|address| (address, *light)));

        for (address, light) in cells.chain(buttons) {
            self.write_light(address, light, sink);
        }
    }

    fn write_light<S: MidiSink> (&mut self, (status, id): (u8, u8), light: Light, sink: &mut S) {
        let value = light.value();
        let last = self.sent.get(&(status, id)).cloned().unwrap_or(0);
        if last == value {
            return
        }
        match sink.send(&[status, id, value]) {
            Ok(()) => {
                self.sent.insert((status, id), value);
            },
            // left unrecorded so the next frame tries again
            Err(err) => log::warn!("light write failed: {}", err)
        }
    }
}
