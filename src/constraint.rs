use std::{
    collections::BTreeMap,
    fmt::{Display, Formatter},
};

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};

use crate::{
    ops::RangeExclusive,
    prelude::*,
    quantity::time::{ClockTime, Minutes},
};

/// Which way an event may legally be moved relative to its original start.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftRule {
    /// Candidate windows must finish by the original start.
    Earlier,

    /// Candidate windows must start at or after the original start.
    Later,

    Either,

    /// The event stays at its original window.
    None,
}

/// Daily-recurring window during which the appliance must not run.
#[serde_as]
#[derive(Copy, Clone, Debug, Deserialize)]
pub struct ForbiddenWindow {
    #[serde_as(as = "DisplayFromStr")]
    pub start: ClockTime,

    #[serde_as(as = "DisplayFromStr")]
    pub end: ClockTime,
}

/// Legality rules bound to an appliance, applied to each of its events.
#[serde_as]
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ConstraintRecord {
    pub forbidden: Vec<ForbiddenWindow>,

    /// Shortest legal run, also the floor for split sub-events.
    pub min_duration: Minutes,

    /// Latest permissible finish on the 48-hour clock.
    #[serde_as(as = "DisplayFromStr")]
    pub latest_finish: ClockTime,

    pub shift_rule: ShiftRule,

    /// Granularity of the candidate search.
    pub step: Minutes,
}

impl Default for ConstraintRecord {
    fn default() -> Self {
        Self {
            forbidden: Vec::new(),
            min_duration: Minutes(5),
            latest_finish: ClockTime(Minutes::PER_DAY),
            shift_rule: ShiftRule::Later,
            step: Minutes(15),
        }
    }
}

impl ConstraintRecord {
    /// Expand the daily-recurring forbidden windows over `[0, horizon)` of the
    /// scheduling clock, splitting cross-midnight windows and merging overlaps.
    ///
    /// Malformed windows (empty, or not anchored within the day) are rejected.
    pub fn forbidden_over(&self, horizon: Minutes) -> Result<Vec<RangeExclusive<Minutes>>> {
        let mut expanded = Vec::new();
        for window in &self.forbidden {
            let (start, end) = (Minutes::from(window.start), Minutes::from(window.end));
            ensure!(start != end, "forbidden window {window:?} is empty");
            ensure!(
                start < Minutes::PER_DAY && end <= Minutes::PER_DAY,
                "forbidden window {window:?} must be anchored within the day",
            );
            let daily = if end < start {
                // Crosses midnight: the tail belongs to the next morning.
                vec![
                    RangeExclusive { start: Minutes::zero(), end },
                    RangeExclusive { start, end: Minutes::PER_DAY },
                ]
            } else {
                vec![RangeExclusive { start, end }]
            };
            for day in 0..2 {
                let offset = Minutes(day * Minutes::PER_DAY.0);
                for piece in &daily {
                    let start = piece.start + offset;
                    let end = (piece.end + offset).min(horizon);
                    if start < end {
                        expanded.push(RangeExclusive { start, end });
                    }
                }
            }
        }
        expanded.sort_by_key(|window| (window.start, window.end));
        Ok(expanded
            .into_iter()
            .coalesce(|leading, trailing| {
                if trailing.start <= leading.end {
                    Ok(RangeExclusive {
                        start: leading.start,
                        end: leading.end.max(trailing.end),
                    })
                } else {
                    Err((leading, trailing))
                }
            })
            .collect())
    }
}

/// Per-appliance constraint records; appliances without one get the defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(transparent)]
pub struct ConstraintSet(BTreeMap<String, ConstraintRecord>);

impl ConstraintSet {
    #[must_use]
    pub fn for_appliance(&self, appliance: &str) -> ConstraintRecord {
        self.0.get(appliance).cloned().unwrap_or_default()
    }
}

impl From<BTreeMap<String, ConstraintRecord>> for ConstraintSet {
    fn from(records: BTreeMap<String, ConstraintRecord>) -> Self {
        Self(records)
    }
}

/// Why an event's constraints could not be honored.
///
/// Flaws never abort a run: the event keeps its original window and the flaw
/// travels with the assignment for downstream reporting.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintFlaw {
    /// A forbidden window or the search step failed normalization.
    Malformed,

    /// The minimum legal duration exceeds the event's own duration.
    MinDurationExceedsEvent,

    /// The latest permissible finish precedes the original start.
    LatestFinishBeforeStart,

    /// The forbidden windows swallow every legal placement.
    NoLegalWindow,
}

impl Display for ConstraintFlaw {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed => write!(f, "malformed record"),
            Self::MinDurationExceedsEvent => write!(f, "min duration exceeds the event"),
            Self::LatestFinishBeforeStart => write!(f, "latest finish precedes the start"),
            Self::NoLegalWindow => write!(f, "no legal window"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(toml: &str) -> ConstraintRecord {
        toml::from_str(toml).unwrap()
    }

    #[test]
    fn defaults() {
        let record = record("");
        assert_eq!(record.min_duration, Minutes(5));
        assert_eq!(Minutes::from(record.latest_finish), Minutes::PER_DAY);
        assert_eq!(record.shift_rule, ShiftRule::Later);
        assert_eq!(record.step, Minutes(15));
    }

    #[test]
    fn parses_toml() {
        let record = record(
            r#"
            forbidden = [{ start = "23:30", end = "06:00" }]
            min_duration = 30
            latest_finish = "38:00"
            shift_rule = "either"
            "#,
        );
        assert_eq!(record.forbidden.len(), 1);
        assert_eq!(Minutes::from(record.latest_finish), Minutes(2280));
        assert_eq!(record.shift_rule, ShiftRule::Either);
    }

    /// A cross-midnight window lands on both mornings and both evenings.
    #[test]
    fn cross_midnight_expansion() -> Result {
        let record = record(r#"forbidden = [{ start = "23:30", end = "06:00" }]"#);
        let expanded = record.forbidden_over(Minutes(2280))?;
        assert_eq!(
            expanded,
            vec![
                RangeExclusive { start: Minutes(0), end: Minutes(360) },
                RangeExclusive { start: Minutes(1410), end: Minutes(1800) },
            ],
        );
        Ok(())
    }

    #[test]
    fn same_day_expansion_is_clipped_to_horizon() -> Result {
        let record = record(r#"forbidden = [{ start = "09:00", end = "17:00" }]"#);
        let expanded = record.forbidden_over(Minutes(1500))?;
        assert_eq!(
            expanded,
            vec![RangeExclusive { start: Minutes(540), end: Minutes(1020) }],
        );
        Ok(())
    }

    #[test]
    fn overlapping_windows_merge() -> Result {
        let record = record(
            r#"forbidden = [
                { start = "08:00", end = "10:00" },
                { start = "09:00", end = "11:00" },
            ]"#,
        );
        let expanded = record.forbidden_over(Minutes::PER_DAY)?;
        assert_eq!(
            expanded,
            vec![RangeExclusive { start: Minutes(480), end: Minutes(660) }],
        );
        Ok(())
    }

    #[test]
    fn reject_empty_window() {
        let record = record(r#"forbidden = [{ start = "08:00", end = "08:00" }]"#);
        assert!(record.forbidden_over(Minutes::PER_DAY).is_err());
    }

    #[test]
    fn missing_appliance_gets_defaults() {
        let set = ConstraintSet::default();
        assert_eq!(set.for_appliance("kettle").step, Minutes(15));
    }
}
