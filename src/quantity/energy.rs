use std::ops::{Div, Mul};

use chrono::TimeDelta;

use crate::quantity::{cost::Cost, power::Kilowatts, rate::KilowattHourRate};

quantity!(KilowattHours, f64, "kWh", precision: 2);

impl Mul<KilowattHourRate> for KilowattHours {
    type Output = Cost;

    fn mul(self, rhs: KilowattHourRate) -> Self::Output {
        Cost(self.0 * rhs.0)
    }
}

impl Mul<f64> for KilowattHours {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self::Output {
        Self(self.0 * rhs)
    }
}

impl Div<TimeDelta> for KilowattHours {
    type Output = Kilowatts;

    fn div(self, rhs: TimeDelta) -> Self::Output {
        let hours = rhs.as_seconds_f64() / 3600.0;
        assert!(hours.is_finite());
        Kilowatts(self.0 / hours)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn energy_times_rate() {
        let cost = KilowattHours(1.5) * KilowattHourRate(0.30);
        assert_abs_diff_eq!(cost.0, 0.45);
    }

    #[test]
    fn energy_over_duration() {
        let power = KilowattHours(1.5) / TimeDelta::minutes(60);
        assert_abs_diff_eq!(power.0, 1.5);
    }
}
