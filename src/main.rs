#![allow(clippy::doc_markdown)]
#![doc = include_str!("../README.md")]

mod cli;
mod constraint;
mod event;
mod fmt;
mod input;
mod ops;
mod prelude;
mod quantity;
mod report;
mod resolver;
mod scheduler;
mod splitter;
mod tables;
mod tariff;
mod working_space;

use clap::{Parser, crate_version};

use crate::{
    cli::{Args, Command, ShiftArgs},
    prelude::*,
    report::{CostReport, Outcome},
    scheduler::{HeuristicScheduler, Scheduler},
    tables::{build_cost_table, build_schedule_table, build_tariff_table},
    tariff::TariffScheme,
};

fn main() -> Result {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().without_time().compact().init();
    info!(version = crate_version!(), "starting…");

    let args = Args::parse();

    match args.command {
        Command::Shift(args) => {
            shift(&args)?;
        }
        Command::Tariffs => {
            for scheme in enumset::EnumSet::<TariffScheme>::all() {
                let model = scheme.model();
                println!("{}:", model.name());
                println!("{}", build_tariff_table(&model));
            }
        }
    }

    info!("done!");
    Ok(())
}

#[instrument(skip_all)]
fn shift(args: &ShiftArgs) -> Result {
    let events = input::load_events(&args.events)?;
    info!(n_events = events.len(), "loaded the event batch");

    let constraints = args
        .constraints
        .as_deref()
        .map(input::load_constraints)
        .transpose()?
        .unwrap_or_default();

    let mut tariffs = args.schemes().iter().map(TariffScheme::model).collect::<Vec<_>>();
    if let Some(path) = args.tariff.as_deref() {
        tariffs.push(input::load_tariff(path)?);
    }

    let scheduler = HeuristicScheduler;
    let mut outcomes = Vec::with_capacity(tariffs.len());
    for tariff in &tariffs {
        let schedule = scheduler.schedule(&events, &constraints, tariff);
        let report = CostReport::of(&schedule);
        println!("{}:", tariff.name());
        println!("{}", build_schedule_table(&schedule));
        println!("{}", build_cost_table(&report));
        outcomes.push(Outcome { schedule, report });
    }

    if outcomes.len() > 1
        && let Some(best) = report::recommend(outcomes.iter().map(|outcome| &outcome.report))
    {
        info!(
            tariff = %best.tariff,
            optimized = %best.optimized_total,
            saving = %best.saving,
            "recommended scheme",
        );
    }

    if let Some(path) = args.output.as_deref() {
        input::write_outcomes(path, &outcomes)?;
        info!(path = %path.display(), "wrote the schedules");
    }

    Ok(())
}
