use std::{
    fmt::{Debug, Formatter},
    ops::Sub,
};

use chrono::NaiveDateTime;
use serde::Serialize;

/// Half-open time span on the scheduling timeline.
pub type Interval = RangeExclusive<NaiveDateTime>;

#[must_use]
#[derive(Copy, Clone, PartialEq, Eq, Serialize)]
pub struct RangeExclusive<T: Copy> {
    pub start: T,
    pub end: T,
}

impl<T: Copy + Debug> Debug for RangeExclusive<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}..{:?}", self.start, self.end)
    }
}

impl<T: Copy + Sub> RangeExclusive<T> {
    #[must_use]
    pub fn len(self) -> <T as Sub>::Output {
        self.end - self.start
    }
}

impl<T: Copy + PartialOrd> RangeExclusive<T> {
    #[must_use]
    pub fn contains(self, other: T) -> bool {
        (self.start <= other) && (other < self.end)
    }

    #[must_use]
    pub fn overlaps(self, other: Self) -> bool {
        (self.start < other.end) && (other.start < self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains() {
        let range = RangeExclusive { start: 1, end: 3 };
        assert!(range.contains(1));
        assert!(range.contains(2));
        assert!(!range.contains(3));
    }

    /// Touching ranges do not overlap: the bound is shared, the time is not.
    #[test]
    fn overlaps() {
        let range = RangeExclusive { start: 10, end: 20 };
        assert!(range.overlaps(RangeExclusive { start: 15, end: 25 }));
        assert!(range.overlaps(RangeExclusive { start: 0, end: 30 }));
        assert!(!range.overlaps(RangeExclusive { start: 20, end: 30 }));
        assert!(!range.overlaps(RangeExclusive { start: 0, end: 10 }));
    }

    #[test]
    fn len() {
        assert_eq!(RangeExclusive { start: 2, end: 7 }.len(), 5);
    }
}
