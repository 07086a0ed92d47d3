use comfy_table::{Attribute, Cell, CellAlignment, Color, Table, modifiers, presets};

use crate::{
    fmt::FormattedPercentage,
    quantity::{cost::Cost, time::ClockTime},
    report::CostReport,
    scheduler::Schedule,
    tariff::TariffModel,
};

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .apply_modifier(modifiers::UTF8_ROUND_CORNERS)
        .enforce_styling();
    table
}

pub fn build_schedule_table(schedule: &Schedule) -> Table {
    let mut table = new_table();
    table.set_header(vec![
        "Event", "Appliance", "Original", "Scheduled", "End", "Cost", "Saving", "Status",
    ]);
    for assignment in &schedule.assignments {
        let saving = assignment.original_cost - assignment.cost;
        table.add_row(vec![
            Cell::new(&assignment.event_id).add_attribute(Attribute::Dim),
            Cell::new(&assignment.appliance),
            Cell::new(assignment.original.start.format("%b %d %H:%M")),
            Cell::new(assignment.window.start.format("%b %d %H:%M")).fg(
                if assignment.migrated { Color::Green } else { Color::Reset },
            ),
            Cell::new(assignment.window.end.format("%H:%M")).add_attribute(Attribute::Dim),
            Cell::new(assignment.cost).set_alignment(CellAlignment::Right).fg(
                if assignment.cost < assignment.original_cost {
                    Color::Green
                } else {
                    Color::Reset
                },
            ),
            Cell::new(saving)
                .set_alignment(CellAlignment::Right)
                .fg(if saving > Cost::zero() { Color::Green } else { Color::Reset }),
            Cell::new(assignment.status).fg(assignment.status.color()),
        ]);
    }
    table
}

pub fn build_cost_table(report: &CostReport) -> Table {
    let mut table = new_table();
    table.set_header(vec![
        "Appliance", "Events", "Migrated", "Original", "Optimized", "Saving", "Saving %",
    ]);
    for rollup in &report.appliances {
        let ratio = if rollup.original > Cost::zero() {
            rollup.saving.0 / rollup.original.0
        } else {
            0.0
        };
        table.add_row(vec![
            Cell::new(&rollup.appliance),
            Cell::new(rollup.n_events).set_alignment(CellAlignment::Right),
            Cell::new(rollup.n_migrated).set_alignment(CellAlignment::Right),
            Cell::new(rollup.original).set_alignment(CellAlignment::Right),
            Cell::new(rollup.optimized).set_alignment(CellAlignment::Right),
            Cell::new(rollup.saving).set_alignment(CellAlignment::Right).fg(
                if rollup.saving > Cost::zero() { Color::Green } else { Color::Reset },
            ),
            Cell::new(FormattedPercentage(ratio)).set_alignment(CellAlignment::Right),
        ]);
    }
    table.add_row(vec![
        Cell::new("Total").add_attribute(Attribute::Bold),
        Cell::new(report.events.len())
            .set_alignment(CellAlignment::Right)
            .add_attribute(Attribute::Bold),
        Cell::new(report.n_migrated)
            .set_alignment(CellAlignment::Right)
            .add_attribute(Attribute::Bold),
        Cell::new(report.original_total)
            .set_alignment(CellAlignment::Right)
            .add_attribute(Attribute::Bold),
        Cell::new(report.optimized_total)
            .set_alignment(CellAlignment::Right)
            .add_attribute(Attribute::Bold),
        Cell::new(report.saving)
            .set_alignment(CellAlignment::Right)
            .add_attribute(Attribute::Bold)
            .fg(if report.saving > Cost::zero() { Color::Green } else { Color::Reset }),
        Cell::new(FormattedPercentage(report.saving_ratio))
            .set_alignment(CellAlignment::Right)
            .add_attribute(Attribute::Bold),
    ]);
    table
}

pub fn build_tariff_table(tariff: &TariffModel) -> Table {
    let min_rate = tariff.periods().iter().map(|period| period.rate).min();
    let max_rate = tariff.periods().iter().map(|period| period.rate).max();

    let mut table = new_table();
    table.set_header(vec!["Start", "End", "Rate"]);
    for period in tariff.periods() {
        table.add_row(vec![
            Cell::new(ClockTime(period.start)),
            Cell::new(ClockTime(period.end)).add_attribute(Attribute::Dim),
            Cell::new(period.rate).set_alignment(CellAlignment::Right).fg(
                if Some(period.rate) == min_rate && min_rate != max_rate {
                    Color::Green
                } else if Some(period.rate) == max_rate && min_rate != max_rate {
                    Color::Red
                } else {
                    Color::Reset
                },
            ),
        ]);
    }
    table
}
