use std::fmt;

use crate::tide::TideReading;

/// How far a curtain is closed: 0 is fully open, 100 fully closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ClosurePercent(u8);

impl ClosurePercent {
    pub const OPEN: ClosurePercent = ClosurePercent(0);
    pub const HALF: ClosurePercent = ClosurePercent(50);
    pub const CLOSED: ClosurePercent = ClosurePercent(100);

    pub fn new(value: u8) -> Option<Self> {
        (value <= 100).then_some(Self(value))
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for ClosurePercent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// Maps a reading onto the curtain, inverted: high tide opens the curtain,
/// low tide closes it.
///
/// The fill level is truncated toward zero, not rounded, so 49.9% of the
/// range yields a raw level of 49 and a closure of 51. A flat range
/// (`range_min == range_max`) maps to [`ClosurePercent::HALF`].
pub fn closure_percent(reading: &TideReading) -> ClosurePercent {
    let TideReading {
        current_height,
        range_min,
        range_max,
        ..
    } = *reading;

    if range_max == range_min {
        return ClosurePercent::HALF;
    }

    let fill = (current_height - range_min) / (range_max - range_min) * 100.0;
    // `as` truncates toward zero and saturates; NaN becomes 0.
    let raw = (fill as i64).clamp(0, 100) as u8;

    ClosurePercent(100 - raw)
}
