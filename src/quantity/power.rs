use std::ops::Mul;

use chrono::TimeDelta;

use crate::quantity::energy::KilowattHours;

quantity!(Kilowatts, f64, "kW", precision: 2);

impl Mul<TimeDelta> for Kilowatts {
    type Output = KilowattHours;

    fn mul(self, rhs: TimeDelta) -> Self::Output {
        KilowattHours(self.0 * rhs.as_seconds_f64() / 3600.0)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn power_times_duration() {
        let energy = Kilowatts(1.5) * TimeDelta::minutes(30);
        assert_abs_diff_eq!(energy.0, 0.75);
    }
}
