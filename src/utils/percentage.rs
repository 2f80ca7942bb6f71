use std::{fmt::Display, ops::Deref};

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Percentage(f64);

impl Display for Percentage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.1}%", self.0)
    }
}

impl Percentage {
    pub fn new_opt(value: f64) -> Option<Percentage> {
        if value < 0. {
            None
        } else {
            Some(Percentage(value))
        }
    }
}

impl Deref for Percentage {
    type Target = f64;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Share of `value` seconds within `whole` seconds. A zero whole yields 0%,
/// which happens for days without any recorded usage.
pub fn seconds_percentage(value: i64, whole: i64) -> Percentage {
    if whole == 0 {
        return Percentage(0.);
    }
    Percentage::new_opt(value as f64 / whole as f64 * 100.)
        .expect("Percentage should always be at least 0")
}
