use std::ops::{Add, Sub, Rem};

pub const TICKS_PER_BEAT: i32 = 24;

#[derive(Clone, Copy, PartialEq, PartialOrd, Eq, Ord, Debug, Hash)]
pub struct MidiTime {
    ticks: i32,
    fraction: u8
}

impl MidiTime {
    pub fn new (ticks: i32, fraction: u8) -> MidiTime {
        MidiTime { ticks, fraction }
    }

    pub fn from_ticks (ticks: i32) -> MidiTime {
        MidiTime { ticks, fraction: 0 }
    }

    pub fn zero () -> MidiTime {
        MidiTime::from_ticks(0)
    }

    /// One beat divided into `divider` parts, never shorter than a tick.
    pub fn beat_division (divider: u32) -> MidiTime {
        let divider = divider.max(1) as i32;
        MidiTime::from_ticks((TICKS_PER_BEAT / divider).max(1))
    }

    pub fn ticks (&self) -> i32 {
        self.ticks
    }

    pub fn is_zero (&self) -> bool {
        self.ticks == 0 && self.fraction == 0
    }

    /// Next multiple of `length` at or after this position.
    pub fn quantize_up (&self, length: MidiTime) -> MidiTime {
        if length.ticks <= 0 {
            return *self
        }
        let remainder = *self % length;
        if remainder.is_zero() {
            *self
        } else {
            MidiTime::from_ticks(self.ticks - remainder.ticks + length.ticks)
        }
    }

    /// First multiple of `length` inside `from..to`, if any.
    pub fn boundary_within (from: MidiTime, to: MidiTime, length: MidiTime) -> Option<MidiTime> {
        let boundary = from.quantize_up(length);
        if boundary < to {
            Some(boundary)
        } else {
            None
        }
    }
}

impl Sub for MidiTime {
    type Output = MidiTime;

    fn sub(self, other: MidiTime) -> MidiTime {
        let ticks = if self.fraction < other.fraction {
            self.ticks - other.ticks - 1
        } else {
            self.ticks - other.ticks
        };
        MidiTime { ticks, fraction: self.fraction.wrapping_sub(other.fraction) }
    }
}

impl Add for MidiTime {
    type Output = MidiTime;

    fn add(self, other: MidiTime) -> MidiTime {
        let ticks = if (self.fraction as u32) + (other.fraction as u32) > u8::max_value() as u32 {
            self.ticks + other.ticks + 1
        } else {
            self.ticks + other.ticks
        };
        MidiTime { ticks, fraction: self.fraction.wrapping_add(other.fraction) }
    }
}

impl Rem<MidiTime> for MidiTime {
    type Output = MidiTime;

    fn rem(self, modulus: MidiTime) -> Self {
        // ignore fraction on modulus
        MidiTime { ticks: modulo(self.ticks, modulus.ticks), fraction: self.fraction }
    }
}

fn modulo (n: i32, m: i32) -> i32 {
    ((n % m) + m) % m
}
