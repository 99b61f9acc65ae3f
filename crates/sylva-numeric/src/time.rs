// src/time.rs
//
// Time units and `timescale` values.

use std::fmt;

/// A physical time unit suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TimeUnit {
    Seconds,
    Milliseconds,
    Microseconds,
    Nanoseconds,
    Picoseconds,
    Femtoseconds,
}

impl TimeUnit {
    pub fn from_suffix(s: &str) -> Option<TimeUnit> {
        match s {
            "s" => Some(TimeUnit::Seconds),
            "ms" => Some(TimeUnit::Milliseconds),
            "us" => Some(TimeUnit::Microseconds),
            "ns" => Some(TimeUnit::Nanoseconds),
            "ps" => Some(TimeUnit::Picoseconds),
            "fs" => Some(TimeUnit::Femtoseconds),
            _ => None,
        }
    }

    pub fn suffix(self) -> &'static str {
        match self {
            TimeUnit::Seconds => "s",
            TimeUnit::Milliseconds => "ms",
            TimeUnit::Microseconds => "us",
            TimeUnit::Nanoseconds => "ns",
            TimeUnit::Picoseconds => "ps",
            TimeUnit::Femtoseconds => "fs",
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

/// One half of a timescale: a magnitude of 1, 10, or 100 and a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeScaleValue {
    pub magnitude: u16,
    pub unit: TimeUnit,
}

impl TimeScaleValue {
    pub fn new(magnitude: u16, unit: TimeUnit) -> Option<TimeScaleValue> {
        if matches!(magnitude, 1 | 10 | 100) {
            Some(TimeScaleValue { magnitude, unit })
        } else {
            None
        }
    }
}

impl fmt::Display for TimeScaleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.magnitude, self.unit)
    }
}

/// A `timescale` pair: time unit and precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeScale {
    pub unit: TimeScaleValue,
    pub precision: TimeScaleValue,
}

impl fmt::Display for TimeScale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {}", self.unit, self.precision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn magnitudes_are_validated() {
        assert!(TimeScaleValue::new(10, TimeUnit::Nanoseconds).is_some());
        assert!(TimeScaleValue::new(5, TimeUnit::Nanoseconds).is_none());
    }

    #[test]
    fn suffix_roundtrip() {
        for u in [
            TimeUnit::Seconds,
            TimeUnit::Milliseconds,
            TimeUnit::Microseconds,
            TimeUnit::Nanoseconds,
            TimeUnit::Picoseconds,
            TimeUnit::Femtoseconds,
        ] {
            assert_eq!(TimeUnit::from_suffix(u.suffix()), Some(u));
        }
    }
}
