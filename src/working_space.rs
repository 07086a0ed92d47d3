use bon::Builder;
use itertools::Itertools;

use crate::{
    constraint::{ConstraintFlaw, ConstraintRecord, ShiftRule},
    event::{ApplianceEvent, Shiftability},
    ops::{Interval, RangeExclusive},
    prelude::*,
    quantity::{cost::Cost, time::Minutes},
    tariff::TariffModel,
};

/// Lookahead beyond the event's own midnight covered by the candidate search.
pub const HORIZON: Minutes = Minutes(38 * 60);

/// One legal placement of an event, priced as if the event ran there.
#[derive(Copy, Clone, Debug)]
pub struct Candidate {
    pub window: Interval,
    pub cost: Cost,
}

/// The ordered set of legal candidate placements for one event.
///
/// Candidates are sorted by ascending cost, then smallest shift from the
/// original start, then earliest start — the one total order used wherever a
/// best or next-best placement is taken. Placements pricier than the original
/// window are not retained: the event would never migrate to them.
#[must_use]
pub struct WorkingSpace {
    candidates: Vec<Candidate>,
    runs: Vec<Interval>,
    flaw: Option<ConstraintFlaw>,
    original_cost: Cost,
}

impl WorkingSpace {
    pub fn best(&self) -> Option<&Candidate> {
        self.candidates.first()
    }

    #[must_use]
    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    /// Maximal legal stretches the event may run in, regardless of duration.
    #[must_use]
    pub fn runs(&self) -> &[Interval] {
        &self.runs
    }

    #[must_use]
    pub const fn flaw(&self) -> Option<ConstraintFlaw> {
        self.flaw
    }

    #[must_use]
    pub const fn original_cost(&self) -> Cost {
        self.original_cost
    }

    fn pinned(original: Interval, original_cost: Cost) -> Self {
        Self {
            candidates: vec![Candidate { window: original, cost: original_cost }],
            runs: Vec::new(),
            flaw: None,
            original_cost,
        }
    }

    const fn flawed(flaw: ConstraintFlaw, original_cost: Cost) -> Self {
        Self { candidates: Vec::new(), runs: Vec::new(), flaw: Some(flaw), original_cost }
    }
}

#[derive(Builder)]
pub struct Generator<'a> {
    event: &'a ApplianceEvent,
    constraints: &'a ConstraintRecord,
    tariff: &'a TariffModel,
}

impl Generator<'_> {
    /// Compute every legal candidate window of the event's duration.
    ///
    /// Constraint inconsistencies never fail the run: they yield an empty
    /// working space carrying the flaw, and the event falls back to its
    /// original window downstream.
    #[instrument(skip_all, fields(event = %self.event.id))]
    pub fn generate(self) -> WorkingSpace {
        let original = self.event.window();
        let original_cost = self.tariff.cost_of(original, self.event.power());

        if self.event.shiftability != Shiftability::Shiftable
            || self.constraints.shift_rule == ShiftRule::None
        {
            return WorkingSpace::pinned(original, original_cost);
        }
        if let Some(flaw) = self.flaw() {
            debug!(%flaw, "constraints cannot be honored");
            return WorkingSpace::flawed(flaw, original_cost);
        }

        let bound = HORIZON.min(Minutes::from(self.constraints.latest_finish));
        let forbidden = match self.constraints.forbidden_over(bound) {
            Ok(forbidden) => forbidden,
            Err(error) => {
                warn!(error = %error, "rejecting malformed constraint record");
                return WorkingSpace::flawed(ConstraintFlaw::Malformed, original_cost);
            }
        };

        let runs = self.runs(bound, &forbidden);
        if runs.is_empty() {
            return WorkingSpace::flawed(ConstraintFlaw::NoLegalWindow, original_cost);
        }

        let day_start = self.event.day_start();
        let runs = runs
            .into_iter()
            .map(|run| Interval {
                start: day_start + run.start.to_delta(),
                end: day_start + run.end.to_delta(),
            })
            .collect_vec();

        let candidates = self.candidates(&runs, original, original_cost);
        trace!(n_runs = runs.len(), n_candidates = candidates.len(), "generated");
        WorkingSpace { candidates, runs, flaw: None, original_cost }
    }

    fn flaw(&self) -> Option<ConstraintFlaw> {
        if self.constraints.step <= Minutes::zero()
            || self.constraints.min_duration < Minutes::zero()
        {
            return Some(ConstraintFlaw::Malformed);
        }
        if self.event.duration < self.constraints.min_duration {
            return Some(ConstraintFlaw::MinDurationExceedsEvent);
        }
        let latest_finish = Minutes::from(self.constraints.latest_finish);
        if latest_finish <= self.event.start_minute() {
            return Some(ConstraintFlaw::LatestFinishBeforeStart);
        }
        None
    }

    /// Maximal legal stretches on the scheduling clock: the horizon minus the
    /// forbidden windows, clipped by the allowed shift direction.
    fn runs(
        &self,
        bound: Minutes,
        forbidden: &[RangeExclusive<Minutes>],
    ) -> Vec<RangeExclusive<Minutes>> {
        let free = subtract(RangeExclusive { start: Minutes::zero(), end: bound }, forbidden);
        let original_start = self.event.start_minute();
        free.into_iter()
            .filter_map(|run| match self.constraints.shift_rule {
                ShiftRule::Later => (run.end > original_start).then(|| RangeExclusive {
                    start: run.start.max(original_start),
                    end: run.end,
                }),
                ShiftRule::Earlier => (run.start < original_start).then(|| RangeExclusive {
                    start: run.start,
                    end: run.end.min(original_start),
                }),
                ShiftRule::Either => Some(run),
                ShiftRule::None => unreachable!("pinned before run generation"),
            })
            .filter(|run| run.start < run.end)
            .collect()
    }

    fn candidates(
        &self,
        runs: &[Interval],
        original: Interval,
        original_cost: Cost,
    ) -> Vec<Candidate> {
        let duration = self.event.duration.to_delta();
        let step = self.constraints.step.to_delta();
        let power = self.event.power();
        let mut candidates = Vec::new();
        for run in runs {
            let mut start = run.start;
            while start + duration <= run.end {
                let window = Interval { start, end: start + duration };
                let cost = self.tariff.cost_of(window, power);
                if cost <= original_cost {
                    candidates.push(Candidate { window, cost });
                }
                start += step;
            }
        }
        candidates
            .into_iter()
            .sorted_by_key(|candidate| {
                let shift = Minutes::from((candidate.window.start - original.start).abs());
                (candidate.cost, shift, candidate.window.start)
            })
            .collect()
    }
}

/// Remove the forbidden stretches from the base range, keeping what is left.
fn subtract(
    base: RangeExclusive<Minutes>,
    forbidden: &[RangeExclusive<Minutes>],
) -> Vec<RangeExclusive<Minutes>> {
    let mut free = Vec::with_capacity(forbidden.len() + 1);
    let mut cursor = base.start;
    for window in forbidden {
        if window.end <= base.start || window.start >= base.end {
            continue;
        }
        if cursor < window.start {
            free.push(RangeExclusive { start: cursor, end: window.start });
        }
        cursor = cursor.max(window.end);
    }
    if cursor < base.end {
        free.push(RangeExclusive { start: cursor, end: base.end });
    }
    free
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use chrono::{NaiveDate, NaiveDateTime};

    use super::*;
    use crate::{
        constraint::ForbiddenWindow,
        quantity::{energy::KilowattHours, time::ClockTime},
        tariff::TariffScheme,
    };

    fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2013, 7, day).unwrap().and_hms_opt(hour, minute, 0).unwrap()
    }

    fn clock(minutes: i64) -> ClockTime {
        ClockTime(Minutes(minutes))
    }

    fn event(start: NaiveDateTime, duration: i64, energy: f64) -> ApplianceEvent {
        ApplianceEvent {
            id: "wm-1".to_owned(),
            appliance: "washing_machine".to_owned(),
            resource_group: "washing_machine".to_owned(),
            start,
            duration: Minutes(duration),
            energy: KilowattHours(energy),
            shiftability: Shiftability::Shiftable,
            parent: None,
        }
    }

    fn generate(
        event: &ApplianceEvent,
        constraints: &ConstraintRecord,
        tariff: &TariffModel,
    ) -> WorkingSpace {
        Generator::builder().event(event).constraints(constraints).tariff(tariff).build().generate()
    }

    #[test]
    fn subtract_splits_around_forbidden() {
        let free = subtract(
            RangeExclusive { start: Minutes(0), end: Minutes(100) },
            &[
                RangeExclusive { start: Minutes(10), end: Minutes(20) },
                RangeExclusive { start: Minutes(50), end: Minutes(60) },
            ],
        );
        assert_eq!(
            free,
            vec![
                RangeExclusive { start: Minutes(0), end: Minutes(10) },
                RangeExclusive { start: Minutes(20), end: Minutes(50) },
                RangeExclusive { start: Minutes(60), end: Minutes(100) },
            ],
        );
    }

    /// A one-hour run originally at 22:00, forbidden 23:30–06:00, latest
    /// finish 14:00 on the lookahead day: the cheapest legal placement is the
    /// first whole low-price hour after the forbidden window ends.
    #[test]
    fn night_event_lands_after_forbidden_window() {
        let event = event(at(12, 22, 0), 60, 1.5);
        let constraints = ConstraintRecord {
            forbidden: vec![ForbiddenWindow { start: clock(1410), end: clock(360) }],
            min_duration: Minutes(30),
            latest_finish: clock(2280),
            shift_rule: ShiftRule::Later,
            step: Minutes(15),
        };
        let space = generate(&event, &constraints, &TariffScheme::Economy7.model());

        assert_abs_diff_eq!(space.original_cost().0, 0.45);
        let best = space.best().unwrap();
        assert_eq!(best.window, Interval { start: at(13, 6, 0), end: at(13, 7, 0) });
        assert_abs_diff_eq!(best.cost.0, 0.225);
    }

    /// Shift rule `none` pins the event to its original window.
    #[test]
    fn shift_rule_none_pins_the_original_window() {
        let event = event(at(12, 22, 0), 60, 1.5);
        let constraints =
            ConstraintRecord { shift_rule: ShiftRule::None, ..ConstraintRecord::default() };
        let space = generate(&event, &constraints, &TariffScheme::Economy7.model());

        assert_eq!(space.candidates().len(), 1);
        assert_eq!(space.best().unwrap().window, event.window());
        assert!(space.flaw().is_none());
    }

    #[test]
    fn base_load_is_never_moved() {
        let mut event = event(at(12, 12, 0), 60, 0.2);
        event.shiftability = Shiftability::Base;
        let space = generate(&event, &ConstraintRecord::default(), &TariffScheme::Economy7.model());
        assert_eq!(space.candidates().len(), 1);
        assert_eq!(space.best().unwrap().window, event.window());
    }

    #[test]
    fn later_rule_admits_no_earlier_window() {
        let event = event(at(12, 12, 0), 60, 1.0);
        let constraints = ConstraintRecord {
            latest_finish: clock(2280),
            shift_rule: ShiftRule::Later,
            ..ConstraintRecord::default()
        };
        let space = generate(&event, &constraints, &TariffScheme::Economy7.model());
        assert!(
            space.candidates().iter().all(|candidate| candidate.window.start >= event.start),
        );
    }

    #[test]
    fn earlier_rule_admits_no_later_window() {
        let event = event(at(12, 12, 0), 60, 1.0);
        let constraints = ConstraintRecord {
            shift_rule: ShiftRule::Earlier,
            ..ConstraintRecord::default()
        };
        let space = generate(&event, &constraints, &TariffScheme::Economy7.model());
        assert!(!space.candidates().is_empty());
        assert!(
            space.candidates().iter().all(|candidate| candidate.window.end <= event.start),
        );
    }

    #[test]
    fn candidates_never_price_above_the_original() {
        let event = event(at(12, 3, 0), 60, 1.0);
        let constraints = ConstraintRecord {
            shift_rule: ShiftRule::Either,
            ..ConstraintRecord::default()
        };
        let space = generate(&event, &constraints, &TariffScheme::Economy7.model());
        // The original already sits in the low window, nothing beats it.
        assert!(!space.candidates().is_empty());
        assert!(
            space
                .candidates()
                .iter()
                .all(|candidate| candidate.cost <= space.original_cost()),
        );
    }

    #[test]
    fn min_duration_flaw_empties_the_space() {
        let event = event(at(12, 22, 0), 20, 0.5);
        let constraints =
            ConstraintRecord { min_duration: Minutes(30), ..ConstraintRecord::default() };
        let space = generate(&event, &constraints, &TariffScheme::Economy7.model());
        assert!(space.candidates().is_empty());
        assert_eq!(space.flaw(), Some(ConstraintFlaw::MinDurationExceedsEvent));
    }

    #[test]
    fn latest_finish_before_start_is_flagged() {
        let event = event(at(12, 22, 0), 60, 1.5);
        let constraints =
            ConstraintRecord { latest_finish: clock(600), ..ConstraintRecord::default() };
        let space = generate(&event, &constraints, &TariffScheme::Economy7.model());
        assert_eq!(space.flaw(), Some(ConstraintFlaw::LatestFinishBeforeStart));
    }

    #[test]
    fn swallowed_horizon_is_flagged() {
        let event = event(at(12, 10, 0), 60, 1.5);
        let constraints = ConstraintRecord {
            forbidden: vec![ForbiddenWindow { start: clock(0), end: clock(1440) }],
            shift_rule: ShiftRule::Either,
            ..ConstraintRecord::default()
        };
        let space = generate(&event, &constraints, &TariffScheme::Economy7.model());
        assert!(space.candidates().is_empty());
        assert_eq!(space.flaw(), Some(ConstraintFlaw::NoLegalWindow));
    }
}
