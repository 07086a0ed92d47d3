use chrono::{NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::{
    ops::Interval,
    quantity::{energy::KilowattHours, power::Kilowatts, time::Minutes},
};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Shiftability {
    /// Always-on background load, never moved.
    Base,

    /// Operated on demand, moving it would be noticed.
    NonShiftable,

    /// May legally be moved within its constraints.
    Shiftable,
}

/// One observed operating run of an appliance.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ApplianceEvent {
    pub id: String,
    pub appliance: String,

    /// Events sharing a group must never run concurrently.
    pub resource_group: String,

    pub start: NaiveDateTime,
    pub duration: Minutes,
    pub energy: KilowattHours,
    pub shiftability: Shiftability,

    /// Set on sub-events produced by splitting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
}

impl ApplianceEvent {
    pub fn window(&self) -> Interval {
        Interval { start: self.start, end: self.start + self.duration.to_delta() }
    }

    /// Average draw over the event, the rate the cost integral runs at.
    pub fn power(&self) -> Kilowatts {
        self.energy / self.duration.to_delta()
    }

    /// Midnight of the event's original day, origin of the scheduling clock.
    pub fn day_start(&self) -> NaiveDateTime {
        self.start.date().and_time(NaiveTime::MIN)
    }

    /// Minutes between the day's start and the original start.
    pub fn start_minute(&self) -> Minutes {
        Minutes::from(self.start - self.day_start())
    }

    /// Decompose into consecutive sub-events of the given durations.
    ///
    /// Durations must sum to the event's duration. Energy is apportioned by
    /// duration share, with the last sub-event taking the exact remainder so
    /// the total is conserved bit for bit.
    #[expect(clippy::cast_precision_loss)]
    pub fn split(&self, durations: &[Minutes]) -> Vec<Self> {
        debug_assert_eq!(durations.iter().copied().sum::<Minutes>(), self.duration);
        let mut start = self.start;
        let mut remaining = self.energy;
        let mut sub_events = Vec::with_capacity(durations.len());
        for (index, &duration) in durations.iter().enumerate() {
            let energy = if index + 1 == durations.len() {
                remaining
            } else {
                self.energy * (duration.0 as f64 / self.duration.0 as f64)
            };
            remaining -= energy;
            sub_events.push(Self {
                id: format!("{}.{}", self.id, index + 1),
                appliance: self.appliance.clone(),
                resource_group: self.resource_group.clone(),
                start,
                duration,
                energy,
                shiftability: Shiftability::Shiftable,
                parent: Some(self.id.clone()),
            });
            start += duration.to_delta();
        }
        sub_events
    }
}
