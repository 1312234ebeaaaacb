/// Select and move share one exclusive slot. Hold and suppress sit beside it.
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum PrimaryMode {
    Idle,
    Selecting,
    Moving
}

#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum ModeEvent {
    SelectPressed,
    SelectReleased { has_selection: bool },
    MoveCommitted,
    SelectionCleared
}

impl PrimaryMode {
    /// Guarded transition. Events that do not apply to the current mode leave it unchanged.
    pub fn next (self, event: ModeEvent) -> PrimaryMode {
        use self::ModeEvent::*;
        use self::PrimaryMode::*;

        match (self, event) {
            (_, SelectPressed) => Selecting,
            (Selecting, SelectReleased { has_selection: true }) => Moving,
            (Selecting, SelectReleased { has_selection: false }) => Idle,
            (Moving, MoveCommitted) => Idle,
            (_, SelectionCleared) => Idle,
            (mode, _) => mode
        }
    }
}

/// Orthogonal sessions tracked next to the primary mode.
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub struct ModeState {
    pub primary: PrimaryMode,
    pub holding: bool,
    pub suppressing: bool
}

impl ModeState {
    pub fn new () -> Self {
        ModeState { primary: PrimaryMode::Idle, holding: false, suppressing: false }
    }

    /// Applies the event and returns the mode it left.
    pub fn apply (&mut self, event: ModeEvent) -> PrimaryMode {
        let from = self.primary;
        self.primary = from.next(event);
        if from != self.primary {
            log::debug!("mode {:?} -> {:?}", from, self.primary);
        }
        from
    }
}
