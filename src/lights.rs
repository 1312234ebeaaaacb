use std::collections::BTreeMap;
use crate::buttons::{Button, LearnMode, REPEAT_BUTTON_COUNT};
use crate::grid::CELL_COUNT;
use crate::grid_state::GridState;
use crate::mode::PrimaryMode;

#[derive(Debug, Eq, PartialEq, Ord, PartialOrd, Copy, Clone, Hash)]
pub enum Light {
    Off = 0,
    Yellow = 127,
    YellowMed = 110,
    Lime = 126,
    LimeLow = 109,
    Green = 124,
    GreenMed = 108,
    GreenLow = 92,
    Orange = 95,
    OrangeMed = 111,
    OrangeLow = 93,
    Red = 79,
    RedMed = 78,
    RedLow = 77
}

impl Light {
    pub fn value (&self) -> u8 {
        *self as u8
    }
}

/// Mode and session flags the projection reads besides the grid.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceFlags {
    pub mode: PrimaryMode,
    pub holding: bool,
    pub suppressing: bool,
    pub suppressed: Vec<usize>,
    pub learn_mode: LearnMode,
    pub has_recording_notes: bool,
    pub held_repeat: Option<u8>,
    pub flashes: Vec<(Button, Light)>
}

impl Default for SurfaceFlags {
    fn default () -> Self {
        SurfaceFlags {
            mode: PrimaryMode::Idle,
            holding: false,
            suppressing: false,
            suppressed: Vec::new(),
            learn_mode: LearnMode::Store,
            has_recording_notes: false,
            held_repeat: None,
            flashes: Vec::new()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LightFrame {
    pub cells: Vec<Light>,
    pub buttons: BTreeMap<Button, Light>
}

impl LightFrame {
    pub fn cell (&self, index: usize) -> Light {
        self.cells.get(index).cloned().unwrap_or(Light::Off)
    }

    pub fn button (&self, button: Button) -> Light {
        self.buttons.get(&button).cloned().unwrap_or(Light::Off)
    }
}

/// Derives every light on the surface from grid and mode state.
pub fn project (state: &GridState, flags: &SurfaceFlags) -> LightFrame {
    let highlight_selection = flags.mode != PrimaryMode::Idle;

    let cells = (0..CELL_COUNT).map(|index| {
        if flags.suppressing && flags.suppressed.contains(&index) {
            return Light::Red
        }

        match state.grid.get(index) {
            Some(Some(cell)) => {
                if highlight_selection && cell.is_selected {
                    Light::Green
                } else if cell.is_recording {
                    Light::Red
                } else if cell.is_active {
                    Light::Yellow
                } else if cell.is_playing {
                    Light::GreenMed
                } else {
                    Light::OrangeLow
                }
            },
            _ => Light::Off
        }
    }).collect();

    let mut buttons = BTreeMap::new();

    buttons.insert(Button::Select, if highlight_selection { Light::Green } else { Light::Off });
    buttons.insert(Button::Hold, if flags.holding { Light::Yellow } else { Light::Off });
    buttons.insert(Button::Suppress, if flags.suppressing { Light::Red } else { Light::Off });
    buttons.insert(Button::LoopRange, match flags.learn_mode {
        LearnMode::Flatten => Light::GreenLow,
        LearnMode::Store if flags.has_recording_notes => Light::RedLow,
        LearnMode::Store => Light::Off
    });
    buttons.insert(Button::Undo, Light::RedLow);
    buttons.insert(Button::Redo, Light::RedLow);

    for id in 0..REPEAT_BUTTON_COUNT {
        let light = if flags.held_repeat == Some(id) { Light::Green } else { Light::GreenLow };
        buttons.insert(Button::Repeat(id), light);
    }

    for &(button, light) in &flags.flashes {
        buttons.insert(button, light);
    }

    LightFrame { cells, buttons }
}
