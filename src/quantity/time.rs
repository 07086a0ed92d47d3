use std::{
    fmt::{Debug, Display, Formatter},
    str::FromStr,
};

use chrono::TimeDelta;

use crate::prelude::*;

quantity!(Minutes, i64, "min");

impl Minutes {
    pub const PER_DAY: Self = Self(24 * 60);

    pub fn to_delta(self) -> TimeDelta {
        TimeDelta::minutes(self.0)
    }
}

impl From<TimeDelta> for Minutes {
    fn from(delta: TimeDelta) -> Self {
        Self(delta.num_minutes())
    }
}

/// Wall-clock time on the 48-hour scheduling clock: `"26:30"` is 02:30 on the
/// lookahead day, `"24:00"` is midnight at the end of the event's own day.
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct ClockTime(pub Minutes);

impl From<ClockTime> for Minutes {
    fn from(clock: ClockTime) -> Self {
        clock.0
    }
}

impl FromStr for ClockTime {
    type Err = Error;

    fn from_str(string: &str) -> Result<Self> {
        let (hours, minutes) =
            string.split_once(':').with_context(|| format!("expected `HH:MM`, got `{string}`"))?;
        let hours: i64 = hours.parse().with_context(|| format!("bad hours in `{string}`"))?;
        let minutes: i64 = minutes.parse().with_context(|| format!("bad minutes in `{string}`"))?;
        ensure!((0..60).contains(&minutes), "minutes out of range in `{string}`");
        ensure!((0..=48).contains(&hours), "hours out of range in `{string}`");
        let total = Minutes(hours * 60 + minutes);
        ensure!(total <= Minutes(48 * 60), "`{string}` is past the 48-hour clock");
        Ok(Self(total))
    }
}

impl Display for ClockTime {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}", self.0.0 / 60, self.0.0 % 60)
    }
}

impl Debug for ClockTime {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}
