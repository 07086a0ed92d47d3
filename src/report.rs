use std::collections::BTreeMap;

use itertools::Itertools;
use serde::Serialize;

use crate::{
    quantity::cost::Cost,
    scheduler::{Schedule, ScheduleAssignment, ScheduleStatus},
};

/// Costs of one (sub-)event at its original and final placements.
#[derive(Serialize)]
pub struct EventCost {
    pub event_id: String,
    pub appliance: String,
    pub original: Cost,
    pub optimized: Cost,
    pub saving: Cost,
    pub migrated: bool,
    pub status: ScheduleStatus,
}

/// Per-appliance rollup of event counts and costs.
#[derive(Serialize)]
pub struct ApplianceCost {
    pub appliance: String,
    pub n_events: usize,
    pub n_migrated: usize,
    pub original: Cost,
    pub optimized: Cost,
    pub saving: Cost,
}

/// Original versus optimized costs for one tariff run.
///
/// The optimized total never exceeds the original one: events only migrate
/// to placements at or below their original price, and every fallback is the
/// original window itself.
#[derive(Serialize)]
#[must_use]
pub struct CostReport {
    pub tariff: String,
    pub events: Vec<EventCost>,
    pub appliances: Vec<ApplianceCost>,
    pub original_total: Cost,
    pub optimized_total: Cost,
    pub saving: Cost,
    pub saving_ratio: f64,
    pub n_migrated: usize,
    pub n_unresolved: usize,
}

impl CostReport {
    pub fn of(schedule: &Schedule) -> Self {
        let events = schedule.assignments.iter().map(EventCost::of).collect_vec();

        let mut appliances: BTreeMap<&str, ApplianceCost> = BTreeMap::new();
        for assignment in &schedule.assignments {
            let entry = appliances
                .entry(assignment.appliance.as_str())
                .or_insert_with(|| ApplianceCost {
                    appliance: assignment.appliance.clone(),
                    n_events: 0,
                    n_migrated: 0,
                    original: Cost::zero(),
                    optimized: Cost::zero(),
                    saving: Cost::zero(),
                });
            entry.n_events += 1;
            entry.n_migrated += usize::from(assignment.migrated);
            entry.original += assignment.original_cost;
            entry.optimized += assignment.cost;
            entry.saving = entry.original - entry.optimized;
        }

        let original_total: Cost = events.iter().map(|event| event.original).sum();
        let optimized_total: Cost = events.iter().map(|event| event.optimized).sum();
        let saving = original_total - optimized_total;
        let saving_ratio = if original_total > Cost::zero() {
            saving.0 / original_total.0
        } else {
            0.0
        };
        Self {
            tariff: schedule.tariff.clone(),
            n_migrated: events.iter().filter(|event| event.migrated).count(),
            n_unresolved: events
                .iter()
                .filter(|event| event.status == ScheduleStatus::Unresolved)
                .count(),
            events,
            appliances: appliances.into_values().collect_vec(),
            original_total,
            optimized_total,
            saving,
            saving_ratio,
        }
    }
}

impl EventCost {
    fn of(assignment: &ScheduleAssignment) -> Self {
        Self {
            event_id: assignment.event_id.clone(),
            appliance: assignment.appliance.clone(),
            original: assignment.original_cost,
            optimized: assignment.cost,
            saving: assignment.original_cost - assignment.cost,
            migrated: assignment.migrated,
            status: assignment.status,
        }
    }
}

/// Pick the scheme with the lowest optimized total; ties go to the first
/// tariff name in lexicographic order, keeping the recommendation stable.
pub fn recommend<'a>(
    reports: impl IntoIterator<Item = &'a CostReport>,
) -> Option<&'a CostReport> {
    reports.into_iter().min_by(|a, b| {
        a.optimized_total.cmp(&b.optimized_total).then_with(|| a.tariff.cmp(&b.tariff))
    })
}

/// One evaluated tariff: the schedule and its cost report, as serialized by
/// the host.
#[derive(Serialize)]
pub struct Outcome {
    pub schedule: Schedule,
    pub report: CostReport,
}
