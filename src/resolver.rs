use std::collections::BTreeMap;

use crate::{
    event::ApplianceEvent,
    ops::Interval,
    prelude::*,
    scheduler::{ScheduleAssignment, ScheduleStatus},
    working_space::WorkingSpace,
};

/// One event with its working space, queued for finalization.
pub struct Selection {
    pub event: ApplianceEvent,
    pub space: WorkingSpace,
}

/// Finalize the provisional choices in order, repairing overlaps within each
/// resource group.
///
/// Each event is checked against the windows already claimed by its group; on
/// a conflict the working space is re-queried for the next-best candidate
/// that fits. Retries are bounded by the working space, so the pass always
/// terminates. An event whose candidates are exhausted keeps its original
/// window and is flagged unresolved — original windows of unmigrated events
/// are claimed but never conflict-checked, since such appliances ran
/// overlapped in the source data to begin with.
pub fn resolve(selections: &[Selection]) -> Vec<ScheduleAssignment> {
    let mut claimed: BTreeMap<&str, Vec<Interval>> = BTreeMap::new();
    let mut assignments = Vec::with_capacity(selections.len());
    for Selection { event, space } in selections {
        let original = event.window();
        let mut status = ScheduleStatus::Scheduled;
        let group = claimed.get(event.resource_group.as_str()).map_or(&[][..], Vec::as_slice);
        let (window, cost) = match space.best() {
            None => (original, space.original_cost()),
            Some(best) if best.window == original => (best.window, best.cost),
            Some(best) if !overlaps_any(group, best.window) => (best.window, best.cost),
            Some(_) => {
                let repaired = space
                    .candidates()
                    .iter()
                    .find(|candidate| !overlaps_any(group, candidate.window));
                match repaired {
                    Some(candidate) => {
                        debug!(event = %event.id, "collision repaired with the next-best candidate");
                        (candidate.window, candidate.cost)
                    }
                    None => {
                        warn!(event = %event.id, "candidates exhausted, keeping the original window");
                        status = ScheduleStatus::Unresolved;
                        (original, space.original_cost())
                    }
                }
            }
        };
        claimed.entry(event.resource_group.as_str()).or_default().push(window);
        assignments.push(ScheduleAssignment {
            event_id: event.id.clone(),
            appliance: event.appliance.clone(),
            resource_group: event.resource_group.clone(),
            parent: event.parent.clone(),
            original,
            window,
            migrated: window != original,
            status,
            flaw: space.flaw(),
            original_cost: space.original_cost(),
            cost,
        });
    }
    assignments
}

fn overlaps_any(claimed: &[Interval], window: Interval) -> bool {
    claimed.iter().any(|claimed| claimed.overlaps(window))
}
