use std::path::PathBuf;

use clap::{Parser, Subcommand};
use enumset::EnumSet;

use crate::tariff::TariffScheme;

#[derive(Parser)]
#[command(author, version, about, propagate_version = true)]
#[must_use]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Main command: schedule the event batch into cheaper tariff windows.
    #[clap(name = "shift")]
    Shift(Box<ShiftArgs>),

    /// Print the built-in tariff schemes.
    #[clap(name = "tariffs")]
    Tariffs,
}

#[derive(clap::Args)]
pub struct ShiftArgs {
    /// Event batch produced by the segmentation stage (JSON).
    #[clap(long, env = "OFFPEAK_EVENTS")]
    pub events: PathBuf,

    /// Per-appliance constraint records (TOML); appliances without a record
    /// get the defaults.
    #[clap(long, env = "OFFPEAK_CONSTRAINTS")]
    pub constraints: Option<PathBuf>,

    /// Built-in schemes to evaluate; defaults to all of them.
    #[clap(long = "scheme", value_enum)]
    pub schemes: Vec<TariffScheme>,

    /// Custom tariff definition (TOML), evaluated alongside the schemes.
    #[clap(long, env = "OFFPEAK_TARIFF")]
    pub tariff: Option<PathBuf>,

    /// Write the schedules and cost reports as JSON.
    #[clap(long)]
    pub output: Option<PathBuf>,
}

impl ShiftArgs {
    pub fn schemes(&self) -> EnumSet<TariffScheme> {
        if self.schemes.is_empty() {
            EnumSet::all()
        } else {
            self.schemes.iter().copied().collect()
        }
    }
}
