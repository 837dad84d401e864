//! Channel sinuosity SI = channel length / straight-line distance.

use std::fmt;

use hydromorph_core::StreamSegment;

/// `None` for segments shorter than `min_length` or closed loops.
pub fn sinuosity(segment: &StreamSegment, min_length: f64) -> Option<f64> {
    let length = segment.length();
    if length < min_length {
        return None;
    }
    crate::statistics::ratio(length, segment.straight_length())
}

/// Planform class of a mean sinuosity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinuosityClass {
    Straight,
    Irregular,
    Sinuous,
    Meandering,
    Unknown,
}

impl SinuosityClass {
    pub fn from_sinuosity(si: Option<f64>) -> Self {
        match si {
            None => Self::Unknown,
            Some(v) if v < 1.05 => Self::Straight,
            Some(v) if v < 1.3 => Self::Irregular,
            Some(v) if v < 1.5 => Self::Sinuous,
            Some(_) => Self::Meandering,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Straight => "Straight (structural control)",
            Self::Irregular => "Irregular",
            Self::Sinuous => "Sinuous",
            Self::Meandering => "Meandering",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for SinuosityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
