use itertools::Itertools;
use ordered_float::OrderedFloat;

use crate::{
    constraint::ConstraintRecord,
    event::ApplianceEvent,
    ops::Interval,
    prelude::*,
    quantity::{cost::Cost, time::Minutes},
    tariff::TariffModel,
    working_space::WorkingSpace,
};

/// Decompose an event across several legal runs when no contiguous window of
/// the full duration exists.
///
/// Runs are packed cheapest-first; every piece (and any leftover it would
/// strand) must be at least the minimum legal duration. The plan is a
/// feasibility and cost proof only: the returned sub-events carry slices of
/// the original window and are placed through the regular candidate search,
/// with the shared resource group keeping them from overlapping each other.
///
/// Returns [`None`] when no combination covers the full duration or the
/// packed placement would cost more than the original one — the caller keeps
/// the event whole and unmigrated.
#[instrument(skip_all, fields(event = %event.id))]
pub fn try_split(
    event: &ApplianceEvent,
    space: &WorkingSpace,
    constraints: &ConstraintRecord,
    tariff: &TariffModel,
) -> Option<Vec<ApplianceEvent>> {
    let min_duration = constraints.min_duration.max(Minutes(1));
    let power = event.power();

    // Cheapest runs first; chronological order settles ties.
    #[expect(clippy::cast_precision_loss)]
    let runs = space
        .runs()
        .iter()
        .copied()
        .filter(|run| Minutes::from(run.len()) >= min_duration)
        .sorted_by_key(|run| {
            let minutes = Minutes::from(run.len());
            (OrderedFloat(tariff.cost_of(*run, power).0 / minutes.0 as f64), run.start)
        })
        .collect_vec();

    let mut remaining = event.duration;
    let mut pieces = Vec::new();
    for run in runs {
        if remaining == Minutes::zero() {
            break;
        }
        let available = Minutes::from(run.len());
        let mut take = available.min(remaining);
        // A leftover shorter than the minimum could never be placed: shrink
        // this piece so the tail stays placeable.
        if remaining - take > Minutes::zero() && remaining - take < min_duration {
            take = remaining - min_duration;
        }
        if take < min_duration {
            continue;
        }
        pieces.push((run, take));
        remaining -= take;
    }
    if remaining > Minutes::zero() || pieces.len() < 2 {
        return None;
    }

    let packed_cost: Cost = pieces
        .iter()
        .map(|(run, take)| {
            tariff.cost_of(Interval { start: run.start, end: run.start + take.to_delta() }, power)
        })
        .sum();
    if packed_cost > space.original_cost() {
        debug!(%packed_cost, original_cost = %space.original_cost(), "split not worth it");
        return None;
    }

    pieces.sort_by_key(|(run, _)| run.start);
    let durations = pieces.iter().map(|(_, take)| *take).collect_vec();
    Some(event.split(&durations))
}
