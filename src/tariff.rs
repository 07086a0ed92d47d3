use std::fmt::{Display, Formatter};

use chrono::{NaiveDateTime, NaiveTime, Timelike};
use itertools::Itertools;

use crate::{
    ops::Interval,
    prelude::*,
    quantity::{
        cost::Cost,
        power::Kilowatts,
        rate::KilowattHourRate,
        time::{ClockTime, Minutes},
    },
};

const LOW: KilowattHourRate = KilowattHourRate(0.15);
const HIGH: KilowattHourRate = KilowattHourRate(0.30);

/// One priced stretch of the day, `[start, end)` in minutes since midnight.
#[derive(Copy, Clone, Debug)]
pub struct TariffPeriod {
    pub start: Minutes,
    pub end: Minutes,
    pub rate: KilowattHourRate,
}

impl TariffPeriod {
    const fn covers(&self, minute: Minutes) -> bool {
        (self.start.0 <= minute.0) && (minute.0 < self.end.0)
    }
}

/// Immutable set of recurring priced periods covering the full day.
///
/// The rate at any timestamp is the rate of the period containing its time of
/// day, so the model applies to the lookahead day as well as the original one.
#[must_use]
pub struct TariffModel {
    name: String,
    periods: Vec<TariffPeriod>,
}

impl TariffModel {
    pub fn new(name: impl Into<String>, mut periods: Vec<TariffPeriod>) -> Result<Self> {
        let name = name.into();
        ensure!(!periods.is_empty(), "tariff `{name}` defines no periods");
        periods.sort_by_key(|period| period.start);
        for period in &periods {
            ensure!(
                period.start < period.end,
                "tariff `{name}`: period {}–{} is inverted or empty",
                ClockTime(period.start),
                ClockTime(period.end),
            );
            ensure!(
                period.rate >= KilowattHourRate::zero(),
                "tariff `{name}`: negative rate at {}",
                ClockTime(period.start),
            );
        }
        ensure!(
            periods[0].start == Minutes::zero(),
            "tariff `{name}` does not start at 00:00",
        );
        ensure!(
            periods[periods.len() - 1].end == Minutes::PER_DAY,
            "tariff `{name}` does not run until 24:00",
        );
        for (leading, trailing) in periods.iter().tuple_windows() {
            ensure!(
                leading.end == trailing.start,
                "tariff `{name}`: gap or overlap at {}",
                ClockTime(trailing.start),
            );
        }
        Ok(Self { name, periods })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn periods(&self) -> &[TariffPeriod] {
        &self.periods
    }

    pub fn rate_at(&self, at: NaiveDateTime) -> KilowattHourRate {
        self.period_at(at).rate
    }

    /// Integrate `power × rate` over the window, splitting it at every tariff
    /// boundary (including midnights) it straddles.
    pub fn cost_of(&self, window: Interval, power: Kilowatts) -> Cost {
        let mut cursor = window.start;
        let mut total = Cost::zero();
        while cursor < window.end {
            let period = self.period_at(cursor);
            let day_start = cursor.date().and_time(NaiveTime::MIN);
            let period_end = day_start + period.end.to_delta();
            let segment_end = window.end.min(period_end);
            total += power * (segment_end - cursor) * period.rate;
            cursor = segment_end;
        }
        total
    }

    fn period_at(&self, at: NaiveDateTime) -> &TariffPeriod {
        let minute =
            Minutes(i64::from(at.time().hour()) * 60 + i64::from(at.time().minute()));
        // Coverage is validated at construction, the fallback is unreachable.
        self.periods.iter().find(|period| period.covers(minute)).unwrap_or(&self.periods[0])
    }
}

/// Built-in time-of-use schemes, named by their aggregate low-price hours.
#[derive(Debug, clap::ValueEnum, enumset::EnumSetType)]
pub enum TariffScheme {
    /// Seven cheap hours overnight.
    Economy7,

    /// Ten cheap hours spread over night, afternoon and evening.
    Economy10,
}

impl Display for TariffScheme {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Economy7 => write!(f, "Economy 7"),
            Self::Economy10 => write!(f, "Economy 10"),
        }
    }
}

impl TariffScheme {
    pub fn model(self) -> TariffModel {
        let periods = match self {
            Self::Economy7 => vec![
                period(0, 30, HIGH),
                period(30, 450, LOW),
                period(450, 1440, HIGH),
            ],
            Self::Economy10 => vec![
                period(0, 60, HIGH),
                period(60, 360, LOW),
                period(360, 780, HIGH),
                period(780, 960, LOW),
                period(960, 1200, HIGH),
                period(1200, 1320, LOW),
                period(1320, 1440, HIGH),
            ],
        };
        TariffModel { name: self.to_string(), periods }
    }
}

const fn period(start: i64, end: i64, rate: KilowattHourRate) -> TariffPeriod {
    TariffPeriod { start: Minutes(start), end: Minutes(end), rate }
}
