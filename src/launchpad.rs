use std::collections::HashSet;
use std::time::{Duration, Instant};
use crate::buttons::{Button, ButtonStates, Flashes, LearnMode};
use crate::chunk::Chunk;
use crate::clock::ScheduleRange;
use crate::config::Config;
use crate::device::{self, LightWriter, SurfaceEvent};
use crate::engine::{LoopEngine, Trigger};
use crate::grid::CELL_COUNT;
use crate::grid_state::{GridState, SharedGrid};
use crate::lights::{self, Light, LightFrame, SurfaceFlags};
use crate::midi_connection::MidiSink;
use crate::midi_time::MidiTime;
use crate::mode::{ModeEvent, ModeState, PrimaryMode};
use crate::modes::{self, Holder, Mover, Repeater, Selector, Suppressor};
use crate::observ::{Computed, Observ, Version};
use crate::selection::Selection;

const VELOCITY: u8 = 127;
const UNDO_FLASH: Duration = Duration::from_millis(100);

pub enum LaunchpadMessage {
    Input(Vec<u8>),
    Surface(SurfaceEvent),
    RepeatLength(u32),
    Schedule(ScheduleRange),
    NoRepeat(usize, bool),
    PortChoices(Vec<String>),
    Switch,
    Shutdown
}

#[derive(Debug, Clone)]
pub struct LaunchpadParams {
    pub chunks: Vec<Chunk>,
    pub no_repeat: Vec<usize>,
    pub repeat_lengths: [u32; 8],
    pub default_repeat_length: u32,
    pub flash_duration: Duration
}

impl LaunchpadParams {
    pub fn from_config (config: &Config) -> Self {
        LaunchpadParams {
            chunks: config.chunks.clone(),
            no_repeat: config.no_repeat.clone(),
            repeat_lengths: config.repeat_lengths,
            default_repeat_length: config.default_repeat_length,
            flash_duration: Duration::from_millis(config.flash_duration_ms)
        }
    }
}

type Release = Box<dyn FnOnce() + Send>;
type GridStateListener = Box<dyn FnMut(&GridState) + Send>;

/// Owns the shared grid and every mode component, and turns surface events
/// into engine calls and light writes. Everything happens on the thread that
/// calls `handle`; derived state is flushed before `handle` returns.
pub struct LoopGridLaunchpad<E: LoopEngine, S: MidiSink> {
    engine: E,
    output: S,
    params: LaunchpadParams,

    grid: SharedGrid,
    mode: ModeState,
    selector: Selector,
    mover: Mover,
    holder: Holder,
    suppressor: Suppressor,
    repeater: Repeater,

    buttons: ButtonStates,
    pads: HashSet<usize>,
    held_repeat: Option<u8>,
    flashes: Flashes,

    repeat_length: Observ<u32>,
    transforms: Observ<usize>,
    recording_notes: Observ<usize>,
    surface: Observ<SurfaceFlags>,
    lights: Computed<LightFrame>,
    writer: LightWriter,
    painted: Option<Version>,
    notified: Option<Version>,

    grid_state_listeners: Vec<GridStateListener>,
    releases: Vec<Release>,
    disposed: bool
}

impl<E: LoopEngine, S: MidiSink> LoopGridLaunchpad<E, S> {
    pub fn new (engine: E, output: S, params: LaunchpadParams) -> Self {
        let mut grid = SharedGrid::new(params.chunks.clone());
        for index in &params.no_repeat {
            grid.set_no_repeat(*index, true);
        }

        let length = params.default_repeat_length;
        let mut launchpad = LoopGridLaunchpad {
            engine,
            output,
            grid,
            mode: ModeState::new(),
            selector: Selector::new(),
            mover: Mover::new(),
            holder: Holder::new(length),
            suppressor: Suppressor::new(),
            repeater: Repeater::new(length),
            buttons: ButtonStates::new(),
            pads: HashSet::new(),
            held_repeat: None,
            flashes: Flashes::new(),
            repeat_length: Observ::new(length),
            transforms: Observ::new(0),
            recording_notes: Observ::new(0),
            surface: Observ::new(SurfaceFlags::default()),
            lights: Computed::new(),
            writer: LightWriter::new(),
            painted: None,
            notified: None,
            grid_state_listeners: Vec::new(),
            releases: Vec::new(),
            disposed: false,
            params
        };

        launchpad.writer.reset(&mut launchpad.output);
        launchpad.flush(Instant::now());
        launchpad
    }

    pub fn handle (&mut self, message: LaunchpadMessage, now: Instant) {
        if self.disposed {
            return
        }

        self.sync_engine();

        match message {
            LaunchpadMessage::Input(data) => match device::parse(&data) {
                Ok(Some(event)) => self.on_surface(event, now),
                Ok(None) => (),
                Err(err) => log::debug!("ignoring input {:?}: {}", data, err)
            },
            LaunchpadMessage::Surface(event) => self.on_surface(event, now),
            LaunchpadMessage::RepeatLength(length) => self.set_repeat_length(length),
            LaunchpadMessage::Schedule(range) => self.on_schedule(range),
            LaunchpadMessage::NoRepeat(index, value) => {
                self.grid.set_no_repeat(index, value);
            },
            LaunchpadMessage::PortChoices(ports) => {
                self.grid.set_port_choices(ports);
            },
            LaunchpadMessage::Switch => {
                self.writer.reset(&mut self.output);
                self.painted = None;
            },
            LaunchpadMessage::Shutdown => {
                self.dispose();
                return
            }
        }

        self.flush(now);
    }

    fn on_surface (&mut self, event: SurfaceEvent, now: Instant) {
        match event {
            SurfaceEvent::Pad(index, pressed) => {
                if index >= CELL_COUNT {
                    log::debug!("ignoring pad {}", index);
                    return
                }
                let changed = if pressed { self.pads.insert(index) } else { self.pads.remove(&index) };
                if changed {
                    self.on_pad(index, pressed);
                }
            },
            SurfaceEvent::Button(button, value) => {
                if let Some(pressed) = self.buttons.edge(button, value) {
                    self.on_button(button, pressed, now);
                }
            }
        }
    }

    fn on_pad (&mut self, index: usize, pressed: bool) {
        if !pressed {
            if self.repeater.is_held(index) {
                self.repeater.release(index);
                self.engine.trigger(index, Trigger::Off);
            }
            return
        }

        match self.mode.primary {
            PrimaryMode::Selecting => {
                self.selector.press(&mut self.grid, index);
            },
            PrimaryMode::Moving => {
                if let Some((moves, moved)) = self.mover.press(&mut self.grid, index) {
                    self.engine.relocate(&moves);
                    self.grid.set_selection(moved);
                    self.selector.stop(&self.grid);
                    self.mode.apply(ModeEvent::MoveCommitted);
                }
            },
            PrimaryMode::Idle => {
                self.repeater.press(index, self.engine.current_position());
                self.request_trigger(index);
            }
        }
    }

    fn request_trigger (&mut self, index: usize) {
        if self.suppressor.allows(index) {
            self.engine.trigger(index, Trigger::On(VELOCITY));
        }
    }

    fn on_schedule (&mut self, range: ScheduleRange) {
        self.engine.schedule(range);
        for index in self.repeater.tick(range.from, range.to, &self.grid) {
            if self.suppressor.allows(index) {
                self.engine.trigger(index, Trigger::Off);
                self.engine.trigger(index, Trigger::On(VELOCITY));
            }
        }
    }

    fn on_button (&mut self, button: Button, pressed: bool, now: Instant) {
        match (button, pressed) {
            (Button::Select, true) => {
                self.mover.stop();
                self.selector.start(&mut self.grid);
                self.mode.apply(ModeEvent::SelectPressed);
            },
            (Button::Select, false) => {
                if self.mode.primary != PrimaryMode::Selecting {
                    return
                }
                let selection = self.selector.stop(&self.grid);
                let has_selection = !selection.is_empty();
                if has_selection {
                    self.mover.start(selection);
                }
                self.mode.apply(ModeEvent::SelectReleased { has_selection });
            },
            (Button::Hold, true) => {
                let cells = modes::target_cells(self.grid.selection(), &self.grid);
                let position = self.engine.current_position();
                self.engine.hold(&cells, position);
                self.holder.start(position, cells);
                self.mode.holding = true;
            },
            (Button::Hold, false) => {
                if let Some(release) = self.holder.stop(self.engine.current_position()) {
                    self.engine.release_hold(&release);
                }
                self.mode.holding = false;
            },
            (Button::Suppress, true) => {
                let cells = modes::target_cells(self.grid.selection(), &self.grid);
                self.suppressor.start(cells);
                self.mode.suppressing = true;
            },
            (Button::Suppress, false) => {
                self.suppressor.stop();
                self.mode.suppressing = false;
            },
            (Button::LoopRange, true) => {
                self.flashes.flash(Button::LoopRange, Light::Green, self.params.flash_duration, now);
                match self.learn_mode() {
                    LearnMode::Store => self.engine.store(),
                    LearnMode::Flatten => {
                        self.engine.flatten();
                        self.clear_selection();
                    }
                }
            },
            (Button::Undo, true) => {
                self.flashes.flash(Button::Undo, Light::Red, UNDO_FLASH, now);
                self.engine.undo();
            },
            (Button::Redo, true) => {
                self.flashes.flash(Button::Redo, Light::Red, UNDO_FLASH, now);
                self.engine.redo();
            },
            (Button::Repeat(id), true) => {
                if let Some(length) = self.params.repeat_lengths.get(id as usize).cloned() {
                    self.held_repeat = Some(id);
                    self.set_repeat_length(length);
                }
            },
            (Button::Repeat(id), false) => {
                if self.held_repeat == Some(id) {
                    self.held_repeat = None;
                    let length = self.params.default_repeat_length;
                    self.set_repeat_length(length);
                }
            },
            _ => ()
        }
    }

    fn clear_selection (&mut self) {
        self.mover.stop();
        self.selector.clear(&mut self.grid);
        self.selector.stop(&self.grid);
        self.mode.apply(ModeEvent::SelectionCleared);
    }

    fn set_repeat_length (&mut self, length: u32) {
        if self.repeat_length.set(length) {
            self.repeater.set_length(length);
            self.holder.set_length(length);
        }
    }

    fn sync_engine (&mut self) {
        for index in 0..CELL_COUNT {
            let flags = self.engine.cell_flags(index);
            self.grid.set_id(index, self.engine.cell_id(index));
            self.grid.set_playing(index, flags.playing);
            self.grid.set_active(index, flags.active);
            self.grid.set_recording(index, flags.recording);
        }
        self.transforms.set(self.engine.transform_count());
        self.recording_notes.set(self.engine.recording_len());
    }

    fn flush (&mut self, now: Instant) {
        self.sync_engine();

        let flags = SurfaceFlags {
            mode: self.mode.primary,
            holding: self.mode.holding,
            suppressing: self.mode.suppressing,
            suppressed: self.suppressor.suppressed(),
            learn_mode: self.learn_mode(),
            has_recording_notes: *self.recording_notes.get() > 0,
            held_repeat: self.held_repeat,
            flashes: self.flashes.active(now)
        };
        self.surface.set(flags);

        self.grid.refresh();
        let state_version = self.grid.state_version();
        if self.notified != Some(state_version) {
            let state = self.grid.state();
            for listener in self.grid_state_listeners.iter_mut() {
                listener(state);
            }
            self.notified = Some(state_version);
        }

        let sources = [state_version, self.surface.version()];
        let grid = &mut self.grid;
        let surface = self.surface.get();
        self.lights.refresh(&sources, || lights::project(grid.state(), surface));

        let version = self.lights.version();
        if self.painted != Some(version) {
            if let Some(frame) = self.lights.get() {
                self.writer.write(frame, &mut self.output);
            }
            self.painted = Some(version);
        }
    }

    pub fn add_grid_state_listener<F> (&mut self, listener: F)
    where F: FnMut(&GridState) + Send + 'static {
        let mut listener = listener;
        listener(self.grid.state());
        self.grid_state_listeners.push(Box::new(listener));
    }

    /// Registered cleanups run once, after the lights are reset and the port is closed.
    pub fn add_release<F> (&mut self, release: F)
    where F: FnOnce() + Send + 'static {
        self.releases.push(Box::new(release));
    }

    /// Lights off, port closed, then registered releases. Runs at most once.
    pub fn dispose (&mut self) {
        if self.disposed {
            return
        }
        self.disposed = true;
        log::info!("disposing launchpad");

        self.writer.reset(&mut self.output);
        self.output.close();
        for release in self.releases.drain(..) {
            release();
        }
    }

    pub fn is_disposed (&self) -> bool {
        self.disposed
    }

    pub fn learn_mode (&self) -> LearnMode {
        LearnMode::from_history(*self.transforms.get())
    }

    pub fn mode (&self) -> ModeState {
        self.mode
    }

    pub fn selection (&self) -> &Selection {
        self.grid.selection()
    }

    pub fn repeat_length (&self) -> u32 {
        *self.repeat_length.get()
    }

    pub fn is_repeating (&self) -> bool {
        self.repeater.is_active()
    }

    /// Where a cell plays from: pinned while held, otherwise the live clock.
    pub fn playback_position (&self, index: usize) -> MidiTime {
        self.holder.position(index, self.engine.current_position())
    }

    pub fn grid_state (&mut self) -> &GridState {
        self.grid.state()
    }

    pub fn lights (&self) -> Option<&LightFrame> {
        self.lights.get()
    }

    pub fn engine (&self) -> &E {
        &self.engine
    }

    pub fn output (&self) -> &S {
        &self.output
    }

    pub fn output_mut (&mut self) -> &mut S {
        &mut self.output
    }
}

impl<E: LoopEngine, S: MidiSink> Drop for LoopGridLaunchpad<E, S> {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use crate::device::RESET_MESSAGE;
    use crate::engine::CellFlags;
    use crate::grid::{CellMove, LoopId};
    use crate::midi_connection::ConnectionError;
    use crate::modes::HoldRelease;

    type Log = Arc<Mutex<Vec<&'static str>>>;

    struct FakeEngine {
        ids: Vec<Option<LoopId>>,
        position: MidiTime,
        triggers: Vec<(usize, Trigger)>,
        relocations: Vec<Vec<CellMove>>,
        holds: Vec<(Vec<usize>, MidiTime)>,
        released: Vec<HoldRelease>,
        transforms: usize,
        recording: usize,
        calls: Vec<&'static str>
    }

    impl FakeEngine {
        fn new (occupied: &[usize]) -> Self {
            let mut ids = vec![None; CELL_COUNT];
            for index in occupied {
                ids[*index] = Some(LoopId::new(&format!("loop{}", index)));
            }
            FakeEngine {
                ids,
                position: MidiTime::zero(),
                triggers: Vec::new(),
                relocations: Vec::new(),
                holds: Vec::new(),
                released: Vec::new(),
                transforms: 0,
                recording: 0,
                calls: Vec::new()
            }
        }
    }

    impl LoopEngine for FakeEngine {
        fn current_position (&self) -> MidiTime {
            self.position
        }

        fn schedule (&mut self, range: ScheduleRange) {
            self.position = range.to;
        }

        fn trigger (&mut self, index: usize, value: Trigger) {
            self.triggers.push((index, value));
        }

        fn cell_id (&self, index: usize) -> Option<LoopId> {
            self.ids[index].clone()
        }

        fn cell_flags (&self, _index: usize) -> CellFlags {
            CellFlags::default()
        }

        fn relocate (&mut self, moves: &[CellMove]) {
            let taken: Vec<Option<LoopId>> = moves.iter().map(|m| self.ids[m.from].take()).collect();
            for (m, id) in moves.iter().zip(taken) {
                self.ids[m.to] = id;
            }
            self.relocations.push(moves.to_vec());
        }

        fn hold (&mut self, cells: &[usize], position: MidiTime) {
            self.holds.push((cells.to_vec(), position));
        }

        fn release_hold (&mut self, release: &HoldRelease) {
            self.released.push(release.clone());
        }

        fn transform_count (&self) -> usize {
            self.transforms
        }

        fn recording_len (&self) -> usize {
            self.recording
        }

        fn store (&mut self) {
            self.calls.push("store");
            self.transforms += 1;
            self.recording = 0;
        }

        fn flatten (&mut self) {
            self.calls.push("flatten");
            self.transforms = 0;
        }

        fn undo (&mut self) {
            self.calls.push("undo");
        }

        fn redo (&mut self) {
            self.calls.push("redo");
        }
    }

    struct TestSink {
        sent: Vec<Vec<u8>>,
        log: Log
    }

    impl MidiSink for TestSink {
        fn send (&mut self, message: &[u8]) -> Result<(), ConnectionError> {
            if message == RESET_MESSAGE {
                self.log.lock().unwrap().push("reset");
            }
            self.sent.push(message.to_vec());
            Ok(())
        }

        fn close (&mut self) {
            self.log.lock().unwrap().push("close");
        }
    }

    fn params () -> LaunchpadParams {
        LaunchpadParams {
            chunks: Vec::new(),
            no_repeat: Vec::new(),
            repeat_lengths: [1, 2, 3, 4, 6, 8, 12, 16],
            default_repeat_length: 2,
            flash_duration: Duration::from_millis(100)
        }
    }

    fn launchpad (occupied: &[usize]) -> (LoopGridLaunchpad<FakeEngine, TestSink>, Log) {
        let log: Log = Arc::new(Mutex::new(Vec::new()));
        let sink = TestSink { sent: Vec::new(), log: log.clone() };
        let launchpad = LoopGridLaunchpad::new(FakeEngine::new(occupied), sink, params());
        log.lock().unwrap().clear();
        (launchpad, log)
    }

    fn pad<E: LoopEngine, S: MidiSink> (launchpad: &mut LoopGridLaunchpad<E, S>, index: usize, pressed: bool, now: Instant) {
        launchpad.handle(LaunchpadMessage::Surface(SurfaceEvent::Pad(index, pressed)), now);
    }

    fn tap<E: LoopEngine, S: MidiSink> (launchpad: &mut LoopGridLaunchpad<E, S>, index: usize, now: Instant) {
        pad(launchpad, index, true, now);
        pad(launchpad, index, false, now);
    }

    fn button<E: LoopEngine, S: MidiSink> (launchpad: &mut LoopGridLaunchpad<E, S>, button: Button, pressed: bool, now: Instant) {
        launchpad.handle(LaunchpadMessage::Surface(SurfaceEvent::Button(button, pressed)), now);
    }

    fn schedule<E: LoopEngine, S: MidiSink> (launchpad: &mut LoopGridLaunchpad<E, S>, from: i32, to: i32, now: Instant) {
        for tick in from..to {
            let range = ScheduleRange { from: MidiTime::from_ticks(tick), to: MidiTime::from_ticks(tick + 1) };
            launchpad.handle(LaunchpadMessage::Schedule(range), now);
        }
    }

    fn light<E: LoopEngine, S: MidiSink> (launchpad: &LoopGridLaunchpad<E, S>, button: Button) -> Light {
        launchpad.lights().unwrap().button(button)
    }

    #[test]
    fn moves_selection_relative_to_first_selected () {
        let now = Instant::now();
        let (mut launchpad, _) = launchpad(&[3, 5, 12]);

        button(&mut launchpad, Button::Select, true, now);
        tap(&mut launchpad, 3, now);
        tap(&mut launchpad, 5, now);
        tap(&mut launchpad, 12, now);
        assert_eq!(launchpad.lights().unwrap().cell(5), Light::Green);
        button(&mut launchpad, Button::Select, false, now);
        assert_eq!(launchpad.mode().primary, PrimaryMode::Moving);

        tap(&mut launchpad, 20, now);

        let engine = launchpad.engine();
        for (from, to) in &[(3, 20), (5, 22), (12, 29)] {
            assert_eq!(engine.ids[*from], None);
            assert_eq!(engine.ids[*to], Some(LoopId::new(&format!("loop{}", from))));
        }
        assert_eq!(engine.relocations.len(), 1);
        assert!(engine.triggers.is_empty());
        assert_eq!(launchpad.selection().to_vec(), vec![20, 22, 29]);
        assert_eq!(launchpad.mode().primary, PrimaryMode::Idle);

        let state = launchpad.grid_state();
        assert!(state.grid.get(3).unwrap().is_none());
        assert!(state.grid.get(22).unwrap().as_ref().unwrap().is_selected);
    }

    #[test]
    fn empty_selection_returns_to_idle () {
        let now = Instant::now();
        let (mut launchpad, _) = launchpad(&[1]);

        button(&mut launchpad, Button::Select, true, now);
        assert_eq!(light(&launchpad, Button::Select), Light::Green);
        button(&mut launchpad, Button::Select, false, now);
        assert_eq!(launchpad.mode().primary, PrimaryMode::Idle);
        assert_eq!(light(&launchpad, Button::Select), Light::Off);

        pad(&mut launchpad, 1, true, now);
        assert_eq!(launchpad.engine().triggers, vec![(1, Trigger::On(127))]);
    }

    #[test]
    fn select_press_cancels_pending_move () {
        let now = Instant::now();
        let (mut launchpad, _) = launchpad(&[3]);

        button(&mut launchpad, Button::Select, true, now);
        tap(&mut launchpad, 3, now);
        button(&mut launchpad, Button::Select, false, now);
        assert_eq!(launchpad.mode().primary, PrimaryMode::Moving);

        button(&mut launchpad, Button::Select, true, now);
        assert!(launchpad.selection().is_empty());
        tap(&mut launchpad, 20, now);

        assert!(launchpad.engine().relocations.is_empty());
        assert_eq!(launchpad.selection().to_vec(), vec![20]);
    }

    #[test]
    fn suppress_blocks_new_triggers () {
        let now = Instant::now();
        let (mut launchpad, _) = launchpad(&[1, 2]);

        button(&mut launchpad, Button::Suppress, true, now);
        assert_eq!(launchpad.lights().unwrap().cell(1), Light::Red);
        assert_eq!(light(&launchpad, Button::Suppress), Light::Red);
        pad(&mut launchpad, 1, true, now);
        pad(&mut launchpad, 3, true, now);
        assert_eq!(launchpad.engine().triggers, vec![(3, Trigger::On(127))]);

        button(&mut launchpad, Button::Suppress, false, now);
        pad(&mut launchpad, 1, false, now);
        tap(&mut launchpad, 1, now);
        assert_eq!(launchpad.engine().triggers, vec![
            (3, Trigger::On(127)),
            (1, Trigger::Off),
            (1, Trigger::On(127)),
            (1, Trigger::Off)
        ]);
    }

    #[test]
    fn hold_pins_cells_until_release () {
        let now = Instant::now();
        let (mut launchpad, _) = launchpad(&[1, 2]);

        schedule(&mut launchpad, 0, 5, now);
        button(&mut launchpad, Button::Hold, true, now);
        assert_eq!(light(&launchpad, Button::Hold), Light::Yellow);
        schedule(&mut launchpad, 5, 9, now);

        assert_eq!(launchpad.playback_position(1), MidiTime::from_ticks(5));
        assert_eq!(launchpad.playback_position(7), MidiTime::from_ticks(9));

        // a repeated pressed value does not restart the hold
        button(&mut launchpad, Button::Hold, true, now);
        assert_eq!(launchpad.playback_position(2), MidiTime::from_ticks(5));

        button(&mut launchpad, Button::Hold, false, now);
        button(&mut launchpad, Button::Hold, false, now);
        assert_eq!(launchpad.engine().released, vec![HoldRelease {
            cells: vec![1, 2],
            resume_at: MidiTime::from_ticks(12)
        }]);
        assert_eq!(launchpad.playback_position(1), MidiTime::from_ticks(9));
        assert_eq!(light(&launchpad, Button::Hold), Light::Off);
        assert_eq!(launchpad.engine().holds, vec![(vec![1, 2], MidiTime::from_ticks(5))]);
        assert!(!launchpad.mode().holding);
    }

    fn select<E: LoopEngine, S: MidiSink> (launchpad: &mut LoopGridLaunchpad<E, S>, cells: &[usize], now: Instant) {
        button(launchpad, Button::Select, true, now);
        for index in cells {
            tap(launchpad, *index, now);
        }
        button(launchpad, Button::Select, false, now);
    }

    #[test]
    fn hold_covers_only_selected_cells () {
        let now = Instant::now();
        let (mut launchpad, _) = launchpad(&[1, 2]);
        select(&mut launchpad, &[1], now);
        assert_eq!(launchpad.mode().primary, PrimaryMode::Moving);

        schedule(&mut launchpad, 0, 5, now);
        button(&mut launchpad, Button::Hold, true, now);
        schedule(&mut launchpad, 5, 9, now);

        assert_eq!(launchpad.engine().holds, vec![(vec![1], MidiTime::from_ticks(5))]);
        assert_eq!(launchpad.playback_position(1), MidiTime::from_ticks(5));
        assert_eq!(launchpad.playback_position(2), MidiTime::from_ticks(9));

        button(&mut launchpad, Button::Hold, false, now);
        assert_eq!(launchpad.engine().released[0].cells, vec![1]);
    }

    #[test]
    fn suppress_covers_only_selected_cells () {
        let now = Instant::now();
        let (mut launchpad, _) = launchpad(&[1, 2]);
        launchpad.handle(LaunchpadMessage::RepeatLength(1), now);
        select(&mut launchpad, &[1], now);
        button(&mut launchpad, Button::Suppress, true, now);

        // an empty selection drops back to idle, the suppressed set stays
        button(&mut launchpad, Button::Select, true, now);
        button(&mut launchpad, Button::Select, false, now);
        assert_eq!(launchpad.mode().primary, PrimaryMode::Idle);
        assert_eq!(launchpad.lights().unwrap().cell(1), Light::Red);
        assert_eq!(launchpad.lights().unwrap().cell(2), Light::OrangeLow);

        pad(&mut launchpad, 1, true, now);
        pad(&mut launchpad, 2, true, now);
        schedule(&mut launchpad, 0, 7, now);

        let triggers = &launchpad.engine().triggers;
        assert!(triggers.iter().all(|(index, _)| *index == 2));
        assert_eq!(triggers.iter().filter(|(_, value)| *value == Trigger::On(127)).count(), 3);
    }

    #[test]
    fn hold_and_suppress_overlap () {
        let now = Instant::now();
        let (mut launchpad, _) = launchpad(&[1, 2, 3]);
        schedule(&mut launchpad, 0, 4, now);

        select(&mut launchpad, &[1, 2], now);
        button(&mut launchpad, Button::Hold, true, now);
        select(&mut launchpad, &[2, 3], now);
        button(&mut launchpad, Button::Suppress, true, now);
        schedule(&mut launchpad, 4, 8, now);
        let mode = launchpad.mode();
        assert!(mode.holding && mode.suppressing);
        assert_eq!(light(&launchpad, Button::Hold), Light::Yellow);
        assert_eq!(light(&launchpad, Button::Suppress), Light::Red);

        assert_eq!(launchpad.playback_position(1), MidiTime::from_ticks(4));
        assert_eq!(launchpad.playback_position(2), MidiTime::from_ticks(4));
        assert_eq!(launchpad.playback_position(3), MidiTime::from_ticks(8));

        launchpad.engine.triggers.clear();
        button(&mut launchpad, Button::Select, true, now);
        button(&mut launchpad, Button::Select, false, now);
        for index in 1..4 {
            pad(&mut launchpad, index, true, now);
        }
        assert_eq!(launchpad.engine().triggers, vec![(1, Trigger::On(127))]);

        button(&mut launchpad, Button::Hold, false, now);
        assert_eq!(launchpad.playback_position(2), MidiTime::from_ticks(8));
        assert!(launchpad.mode().suppressing);
        pad(&mut launchpad, 2, false, now);
        pad(&mut launchpad, 2, true, now);
        assert_eq!(launchpad.engine().triggers.last(), Some(&(2, Trigger::Off)));

        button(&mut launchpad, Button::Suppress, false, now);
        assert_eq!(light(&launchpad, Button::Suppress), Light::Off);
        pad(&mut launchpad, 2, false, now);
        pad(&mut launchpad, 2, true, now);
        assert_eq!(launchpad.engine().triggers.last(), Some(&(2, Trigger::On(127))));
    }

    #[test]
    fn repeat_buttons_set_length_while_held () {
        let now = Instant::now();
        let (mut launchpad, _) = launchpad(&[]);

        button(&mut launchpad, Button::Repeat(0), true, now);
        assert_eq!(launchpad.repeat_length(), 1);
        assert!(launchpad.is_repeating());
        assert_eq!(light(&launchpad, Button::Repeat(0)), Light::Green);
        assert_eq!(light(&launchpad, Button::Repeat(1)), Light::GreenLow);

        button(&mut launchpad, Button::Repeat(0), false, now);
        assert_eq!(launchpad.repeat_length(), 2);
        assert!(!launchpad.is_repeating());

        launchpad.handle(LaunchpadMessage::RepeatLength(4), now);
        assert_eq!(launchpad.repeat_length(), 4);
        assert!(!launchpad.is_repeating());
    }

    #[test]
    fn held_pads_retrigger () {
        let now = Instant::now();
        let (mut launchpad, _) = launchpad(&[1]);

        launchpad.handle(LaunchpadMessage::RepeatLength(1), now);
        pad(&mut launchpad, 1, true, now);
        schedule(&mut launchpad, 0, 7, now);
        assert_eq!(launchpad.engine().triggers, vec![
            (1, Trigger::On(127)),
            (1, Trigger::Off),
            (1, Trigger::On(127)),
            (1, Trigger::Off),
            (1, Trigger::On(127))
        ]);

        launchpad.handle(LaunchpadMessage::RepeatLength(4), now);
        schedule(&mut launchpad, 7, 13, now);
        assert_eq!(launchpad.engine().triggers.len(), 7);

        pad(&mut launchpad, 1, false, now);
        schedule(&mut launchpad, 13, 30, now);
        assert_eq!(launchpad.engine().triggers.len(), 8);
        assert_eq!(launchpad.engine().triggers[7], (1, Trigger::Off));
    }

    #[test]
    fn loop_range_stores_then_flattens () {
        let now = Instant::now();
        let (mut launchpad, _) = launchpad(&[1]);
        launchpad.engine.recording = 3;
        launchpad.handle(LaunchpadMessage::PortChoices(vec![]), now);
        assert_eq!(light(&launchpad, Button::LoopRange), Light::RedLow);

        button(&mut launchpad, Button::LoopRange, true, now);
        button(&mut launchpad, Button::LoopRange, false, now);
        assert_eq!(launchpad.engine().calls, vec!["store"]);
        assert_eq!(launchpad.learn_mode(), LearnMode::Flatten);
        assert_eq!(light(&launchpad, Button::LoopRange), Light::Green);

        let later = now + Duration::from_millis(200);
        launchpad.handle(LaunchpadMessage::PortChoices(vec![]), later);
        assert_eq!(light(&launchpad, Button::LoopRange), Light::GreenLow);

        button(&mut launchpad, Button::Select, true, later);
        tap(&mut launchpad, 1, later);
        button(&mut launchpad, Button::Select, false, later);
        assert_eq!(launchpad.mode().primary, PrimaryMode::Moving);

        button(&mut launchpad, Button::LoopRange, true, later);
        assert_eq!(launchpad.engine().calls, vec!["store", "flatten"]);
        assert!(launchpad.selection().is_empty());
        assert_eq!(launchpad.mode().primary, PrimaryMode::Idle);
        assert_eq!(launchpad.learn_mode(), LearnMode::Store);
    }

    #[test]
    fn undo_flashes_then_settles () {
        let now = Instant::now();
        let (mut launchpad, _) = launchpad(&[]);
        assert_eq!(light(&launchpad, Button::Undo), Light::RedLow);

        button(&mut launchpad, Button::Undo, true, now);
        button(&mut launchpad, Button::Redo, true, now);
        assert_eq!(launchpad.engine().calls, vec!["undo", "redo"]);
        assert_eq!(light(&launchpad, Button::Undo), Light::Red);

        launchpad.handle(LaunchpadMessage::PortChoices(vec![]), now + Duration::from_millis(150));
        assert_eq!(light(&launchpad, Button::Undo), Light::RedLow);
        assert_eq!(light(&launchpad, Button::Redo), Light::RedLow);
    }

    #[test]
    fn ignores_malformed_input () {
        let now = Instant::now();
        let (mut launchpad, _) = launchpad(&[1]);
        launchpad.handle(LaunchpadMessage::Input(vec![144]), now);
        assert!(launchpad.engine().triggers.is_empty());
        launchpad.handle(LaunchpadMessage::Input(vec![144, 1, 127]), now);
        assert_eq!(launchpad.engine().triggers, vec![(1, Trigger::On(127))]);
    }

    #[test]
    fn switch_repaints_everything () {
        let now = Instant::now();
        let (mut launchpad, _) = launchpad(&[]);
        launchpad.output_mut().sent.clear();

        launchpad.handle(LaunchpadMessage::PortChoices(vec![]), now);
        assert!(launchpad.output().sent.is_empty());

        launchpad.handle(LaunchpadMessage::Switch, now);
        let sent = &launchpad.output().sent;
        assert_eq!(sent[0], RESET_MESSAGE.to_vec());
        assert_eq!(sent.len(), 11);
    }

    #[test]
    fn grid_state_listeners_follow_changes () {
        let now = Instant::now();
        let (mut launchpad, _) = launchpad(&[]);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_listener = seen.clone();
        launchpad.add_grid_state_listener(move |state| {
            seen_listener.lock().unwrap().push(state.port_choices.len());
        });

        launchpad.handle(LaunchpadMessage::PortChoices(vec![String::from("UM-ONE")]), now);
        launchpad.handle(LaunchpadMessage::PortChoices(vec![String::from("UM-ONE")]), now);
        assert_eq!(*seen.lock().unwrap(), vec![0, 1]);
    }

    #[test]
    fn teardown_runs_once_in_order () {
        let (mut launchpad, log) = launchpad(&[]);
        let release_log = log.clone();
        launchpad.add_release(move || release_log.lock().unwrap().push("release"));

        launchpad.dispose();
        launchpad.dispose();
        launchpad.handle(LaunchpadMessage::Switch, Instant::now());
        drop(launchpad);

        assert_eq!(*log.lock().unwrap(), vec!["reset", "close", "release"]);
    }

    #[test]
    fn shutdown_message_tears_down () {
        let (mut launchpad, log) = launchpad(&[1]);
        let release_log = log.clone();
        launchpad.add_release(move || release_log.lock().unwrap().push("release"));

        launchpad.handle(LaunchpadMessage::Shutdown, Instant::now());
        assert!(launchpad.is_disposed());
        assert_eq!(*log.lock().unwrap(), vec!["reset", "close", "release"]);

        let sent = launchpad.output().sent.len();
        pad(&mut launchpad, 1, true, Instant::now());
        assert!(launchpad.engine().triggers.is_empty());
        assert_eq!(launchpad.output().sent.len(), sent);
    }
}
