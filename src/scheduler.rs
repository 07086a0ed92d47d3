use std::fmt::{Display, Formatter};

use comfy_table::Color;
use itertools::Itertools;
use serde::Serialize;

use crate::{
    constraint::{ConstraintFlaw, ConstraintSet},
    event::ApplianceEvent,
    ops::Interval,
    prelude::*,
    quantity::cost::Cost,
    resolver::{self, Selection},
    splitter,
    tariff::TariffModel,
    working_space::Generator,
};

/// The scheduling capability: a pure function of (events, constraints,
/// tariff) into a conflict-free assignment. The heuristic engine below is one
/// realization; an exact solver would be another.
pub trait Scheduler {
    fn schedule(
        &self,
        events: &[ApplianceEvent],
        constraints: &ConstraintSet,
        tariff: &TariffModel,
    ) -> Schedule;
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleStatus {
    /// Placed in a legal, non-conflicting window, possibly the original one.
    Scheduled,

    /// Candidates exhausted during collision repair, kept at the original.
    Unresolved,
}

impl Display for ScheduleStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Scheduled => write!(f, "Scheduled"),
            Self::Unresolved => write!(f, "Unresolved"),
        }
    }
}

impl ScheduleStatus {
    pub const fn color(self) -> Color {
        match self {
            Self::Scheduled => Color::Green,
            Self::Unresolved => Color::Red,
        }
    }
}

/// Final placement of one (sub-)event.
#[derive(Clone, Debug, Serialize)]
pub struct ScheduleAssignment {
    pub event_id: String,
    pub appliance: String,
    pub resource_group: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,

    pub original: Interval,
    pub window: Interval,
    pub migrated: bool,
    pub status: ScheduleStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub flaw: Option<ConstraintFlaw>,

    pub original_cost: Cost,
    pub cost: Cost,
}

#[derive(Serialize)]
#[must_use]
pub struct Schedule {
    pub tariff: String,
    pub assignments: Vec<ScheduleAssignment>,
}

/// Deterministic candidate-window engine: generate each event's working
/// space, pick the cheapest placement, and repair collisions in a fixed
/// order, splitting an event across windows when nothing contiguous fits.
#[derive(Default)]
pub struct HeuristicScheduler;

impl Scheduler for HeuristicScheduler {
    #[instrument(skip_all, fields(tariff = tariff.name()))]
    fn schedule(
        &self,
        events: &[ApplianceEvent],
        constraints: &ConstraintSet,
        tariff: &TariffModel,
    ) -> Schedule {
        let mut ordered = events.iter().collect_vec();
        ordered.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.id.cmp(&b.id)));
        info!(n_events = ordered.len(), "scheduling…");

        let mut selections = Vec::with_capacity(ordered.len());
        for event in ordered {
            let record = constraints.for_appliance(&event.appliance);
            let space = Generator::builder()
                .event(event)
                .constraints(&record)
                .tariff(tariff)
                .build()
                .generate();
            if space.candidates().is_empty()
                && space.flaw().is_none()
                && event.parent.is_none()
                && let Some(sub_events) = splitter::try_split(event, &space, &record, tariff)
            {
                debug!(event = %event.id, n_parts = sub_events.len(), "split across windows");
                for sub_event in sub_events {
                    let sub_space = Generator::builder()
                        .event(&sub_event)
                        .constraints(&record)
                        .tariff(tariff)
                        .build()
                        .generate();
                    selections.push(Selection { event: sub_event, space: sub_space });
                }
                continue;
            }
            selections.push(Selection { event: event.clone(), space });
        }

        let assignments = resolver::resolve(&selections);
        let n_migrated = assignments.iter().filter(|assignment| assignment.migrated).count();
        info!(n_migrated, "scheduled");
        Schedule { tariff: tariff.name().to_owned(), assignments }
    }
}
