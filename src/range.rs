use serde::{Deserialize, Serialize};
use std::ops::Sub;

/// A closed range with a lower and an upper bound.
///
/// `lower <= upper` is not checked; callers that build a `Range` own that
/// invariant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Range<T> {
    lower: T,
    upper: T,
}

impl<T> Range<T> {
    pub fn new(lower: T, upper: T) -> Self {
        Self { lower, upper }
    }

    pub fn lower(&self) -> &T {
        &self.lower
    }

    pub fn upper(&self) -> &T {
        &self.upper
    }
}

impl<T: PartialOrd> Range<T> {
    /// True if `value` lies within the range, bounds included.
    pub fn contains(&self, value: &T) -> bool {
        *value >= self.lower && *value <= self.upper
    }
}

impl<T: Sub<Output = T> + Copy> Range<T> {
    pub fn length(&self) -> T {
        self.upper - self.lower
    }
}
