quantity!(KilowattHourRate, f64, "£/kWh", precision: 3);
