use std::collections::HashMap;
use std::time::{Duration, Instant};
use crate::lights::Light;

pub const REPEAT_BUTTON_COUNT: u8 = 8;

#[derive(Debug, Eq, PartialEq, Ord, PartialOrd, Copy, Clone, Hash)]
pub enum Button {
    Select,
    Hold,
    Suppress,
    LoopRange,
    Undo,
    Redo,
    Repeat(u8)
}

/// What the loop-range button does when pressed.
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum LearnMode {
    Store,
    Flatten
}

impl LearnMode {
    pub fn from_history (transform_count: usize) -> LearnMode {
        if transform_count > 0 {
            LearnMode::Flatten
        } else {
            LearnMode::Store
        }
    }
}

/// Press/release edge detection. Repeated identical values are ignored.
#[derive(Debug, Default)]
pub struct ButtonStates {
    pressed: HashMap<Button, bool>
}

impl ButtonStates {
    pub fn new () -> Self {
        ButtonStates { pressed: HashMap::new() }
    }

    /// Some(pressed) on a transition, None when the value did not change.
    pub fn edge (&mut self, button: Button, pressed: bool) -> Option<bool> {
        let last = self.pressed.insert(button, pressed).unwrap_or(false);
        if last == pressed {
            None
        } else {
            Some(pressed)
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Flash {
    light: Light,
    until: Instant
}

/// Temporary button colors that override the resting state.
#[derive(Debug, Default)]
pub struct Flashes {
    flashes: HashMap<Button, Flash>
}

impl Flashes {
    pub fn new () -> Self {
        Flashes { flashes: HashMap::new() }
    }

    pub fn flash (&mut self, button: Button, light: Light, duration: Duration, now: Instant) {
        self.flashes.insert(button, Flash { light, until: now + duration });
    }

    /// Drops expired flashes and returns the ones still showing.
    pub fn active (&mut self, now: Instant) -> Vec<(Button, Light)> {
        self.flashes.retain(|_, flash| flash.until > now);
        let mut result: Vec<(Button, Light)> = self.flashes.iter().map(|(button, flash)| (*button, flash.light)).collect();
        result.sort();
        result
    }
}
