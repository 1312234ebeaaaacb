use circular_queue::CircularQueue;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use crate::midi_connection;
use crate::midi_time::{MidiTime, TICKS_PER_BEAT};

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ScheduleRange {
    pub from: MidiTime,
    pub to: MidiTime
}

const TEMPO_LOG_BEATS: i32 = 4;

type Listener = Box<dyn FnMut(ScheduleRange) + Send>;

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ListenerId(usize);

struct ClockState {
    position: MidiTime,
    last_stamp: Option<u64>,
    tick_durations: CircularQueue<Duration>,
    listeners: BTreeMap<ListenerId, Listener>,
    next_id: usize
}

impl ClockState {
    fn new () -> Self {
        ClockState {
            position: MidiTime::zero(),
            last_stamp: None,
            tick_durations: CircularQueue::with_capacity(24),
            listeners: BTreeMap::new(),
            next_id: 0
        }
    }

    fn restart (&mut self) {
        self.position = MidiTime::zero();
        self.last_stamp = None;
    }

    fn tick (&mut self, stamp: u64) {
        if let Some(last_stamp) = self.last_stamp {
            let duration = Duration::from_micros(stamp.saturating_sub(last_stamp));
            if duration < Duration::from_millis(500) {
                self.tick_durations.push(duration);
            }
        }
        self.last_stamp = Some(stamp);

        let range = ScheduleRange {
            from: self.position,
            to: self.position + MidiTime::from_ticks(1)
        };
        self.position = range.to;
        for listener in self.listeners.values_mut() {
            listener(range);
        }

        if self.position.ticks() % (TICKS_PER_BEAT * TEMPO_LOG_BEATS) == 0 {
            if let Some(bpm) = self.bpm() {
                log::debug!("clock tempo {:.1} bpm", bpm);
            }
        }
    }

    fn bpm (&self) -> Option<f64> {
        let count = self.tick_durations.len() as u32;
        if count > 1 {
            let average = self.tick_durations.iter().sum::<Duration>() / count;
            Some(60.0 / (average.as_secs_f64() * TICKS_PER_BEAT as f64))
        } else {
            None
        }
    }
}

/// Follows an external MIDI clock and fans ticks out to listeners.
#[derive(Clone)]
pub struct Clock {
    state: Arc<Mutex<ClockState>>
}

impl Clock {
    pub fn new () -> Self {
        Clock { state: Arc::new(Mutex::new(ClockState::new())) }
    }

    pub fn follow (port_name: &str) -> (Self, midi_connection::ThreadReference) {
        let clock = Clock::new();
        let input_clock = clock.clone();
        let input = midi_connection::get_input(port_name, move |stamp, message| {
            match message.first() {
                Some(&248) => input_clock.tick(stamp),
                Some(&250) => input_clock.restart(),
                _ => ()
            }
        });
        (clock, input)
    }

    pub fn tick (&self, stamp: u64) {
        if let Ok(mut state) = self.state.lock() {
            state.tick(stamp);
        }
    }

    pub fn restart (&self) {
        if let Ok(mut state) = self.state.lock() {
            log::info!("clock restart");
            state.restart();
        }
    }

    pub fn current_position (&self) -> MidiTime {
        self.state.lock().map(|state| state.position).unwrap_or_else(|_| MidiTime::zero())
    }

    pub fn add_listener<F> (&self, listener: F) -> ListenerId
    where F: FnMut(ScheduleRange) + Send + 'static {
        let mut state = match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner()
        };
        let id = ListenerId(state.next_id);
        state.next_id += 1;
        state.listeners.insert(id, Box::new(listener));
        id
    }

    pub fn remove_listener (&self, id: ListenerId) -> bool {
        match self.state.lock() {
            Ok(mut state) => state.listeners.remove(&id).is_some(),
            Err(poisoned) => poisoned.into_inner().listeners.remove(&id).is_some()
        }
    }
}
