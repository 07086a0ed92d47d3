quantity!(Cost, f64, "£", precision: 2);
