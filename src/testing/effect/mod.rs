//! Effect annotations attached to each outcome comparison.

use crate::testing::SampleValue;
use std::fmt;

/// Ratio of the second group's summary to the first's.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Effect {
    Numeric(f64),
    /// The first group's summary is zero.
    Undefined,
}

impl Effect {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Effect::Numeric(v) => Some(*v),
            Effect::Undefined => None,
        }
    }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Effect::Numeric(v) => write!(f, "{}", v),
            Effect::Undefined => write!(f, "NaN"),
        }
    }
}

pub fn multiplicative_effect(summary1: f64, summary2: f64) -> Effect {
    if summary1 == 0.0 {
        Effect::Undefined
    } else {
        Effect::Numeric(summary2 / summary1)
    }
}

/// +1 when the second group's summary is at least the first's, otherwise -1.
pub fn effect_sign(summary1: f64, summary2: f64) -> i8 {
    if summary2 - summary1 >= 0.0 { 1 } else { -1 }
}

/// The most outlying sample of a group in one direction.
#[derive(Debug, Clone, PartialEq)]
pub struct Extremum {
    pub sample_identifier: String,
    pub value: f64,
}

impl Extremum {
    /// Placeholder for an empty group.
    pub fn none() -> Self {
        Extremum {
            sample_identifier: "none".to_string(),
            value: -1.0,
        }
    }
}

/// Largest value when `direction` is positive, smallest otherwise.
///
/// Ties keep the earliest sample in input order.
pub fn extremum(values: &[SampleValue], direction: i8) -> Extremum {
    let mut best: Option<&SampleValue> = None;
    for candidate in values {
        best = match best {
            None => Some(candidate),
            Some(current) => {
                let more_extreme = if direction > 0 {
                    candidate.value > current.value
                } else {
                    candidate.value < current.value
                };
                if more_extreme { Some(candidate) } else { Some(current) }
            }
        };
    }

    match best {
        Some(v) => Extremum {
            sample_identifier: v.sample_identifier.clone(),
            value: v.value,
        },
        None => Extremum::none(),
    }
}
