use std::{fs, path::Path};

use serde::Deserialize;
use serde_with::{DisplayFromStr, serde_as};

use crate::{
    constraint::ConstraintSet,
    event::ApplianceEvent,
    prelude::*,
    quantity::{
        rate::KilowattHourRate,
        time::{ClockTime, Minutes},
    },
    report::Outcome,
    tariff::{TariffModel, TariffPeriod},
};

pub fn load_events(path: &Path) -> Result<Vec<ApplianceEvent>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read events from `{}`", path.display()))?;
    parse_events(&contents).with_context(|| format!("failed to parse `{}`", path.display()))
}

fn parse_events(contents: &str) -> Result<Vec<ApplianceEvent>> {
    let events: Vec<ApplianceEvent> = serde_json::from_str(contents)?;
    for event in &events {
        ensure!(
            event.duration > Minutes::zero(),
            "event `{}` has a non-positive duration",
            event.id,
        );
        ensure!(
            event.energy.0 >= 0.0,
            "event `{}` has a negative energy",
            event.id,
        );
    }
    Ok(events)
}

pub fn load_constraints(path: &Path) -> Result<ConstraintSet> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read constraints from `{}`", path.display()))?;
    toml::from_str(&contents).with_context(|| format!("failed to parse `{}`", path.display()))
}

pub fn load_tariff(path: &Path) -> Result<TariffModel> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read the tariff from `{}`", path.display()))?;
    parse_tariff(&contents).with_context(|| format!("failed to parse `{}`", path.display()))
}

fn parse_tariff(contents: &str) -> Result<TariffModel> {
    #[derive(Deserialize)]
    struct TariffFile {
        name: String,
        periods: Vec<PeriodFile>,
    }

    #[serde_as]
    #[derive(Deserialize)]
    struct PeriodFile {
        #[serde_as(as = "DisplayFromStr")]
        start: ClockTime,
        #[serde_as(as = "DisplayFromStr")]
        end: ClockTime,
        rate: KilowattHourRate,
    }

    let file: TariffFile = toml::from_str(contents)?;
    let periods = file
        .periods
        .into_iter()
        .map(|period| TariffPeriod {
            start: period.start.into(),
            end: period.end.into(),
            rate: period.rate,
        })
        .collect();
    TariffModel::new(file.name, periods)
}

/// Write the evaluated schemes as JSON with stable ordering, so identical
/// inputs produce byte-identical files.
pub fn write_outcomes(path: &Path, outcomes: &[Outcome]) -> Result {
    let contents = serde_json::to_string_pretty(outcomes)?;
    fs::write(path, contents)
        .with_context(|| format!("failed to write the schedule to `{}`", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_an_event_batch() -> Result {
        let events = parse_events(
            r#"[{
                "id": "wm-1",
                "appliance": "washing_machine",
                "resource_group": "washing_machine",
                "start": "2013-07-12T22:00:00",
                "duration": 60,
                "energy": 1.5,
                "shiftability": "shiftable"
            }]"#,
        )?;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].appliance, "washing_machine");
        Ok(())
    }

    #[test]
    fn rejects_a_non_positive_duration() {
        let result = parse_events(
            r#"[{
                "id": "wm-1",
                "appliance": "washing_machine",
                "resource_group": "washing_machine",
                "start": "2013-07-12T22:00:00",
                "duration": 0,
                "energy": 1.5,
                "shiftability": "shiftable"
            }]"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn parses_a_custom_tariff() -> Result {
        let tariff = parse_tariff(
            r#"
            name = "Flat Night"

            [[periods]]
            start = "00:00"
            end = "07:00"
            rate = 0.12

            [[periods]]
            start = "07:00"
            end = "24:00"
            rate = 0.28
            "#,
        )?;
        assert_eq!(tariff.name(), "Flat Night");
        assert_eq!(tariff.periods().len(), 2);
        Ok(())
    }

    /// Gaps in the day are a configuration error, rejected before scheduling.
    #[test]
    fn rejects_a_tariff_with_a_gap() {
        let result = parse_tariff(
            r#"
            name = "Broken"

            [[periods]]
            start = "00:00"
            end = "06:00"
            rate = 0.12

            [[periods]]
            start = "07:00"
            end = "24:00"
            rate = 0.28
            "#,
        );
        assert!(result.is_err());
    }
}
