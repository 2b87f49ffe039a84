use std::fmt;

/// One committed snapshot of the charge controller's measurements.
///
/// A snapshot is only ever replaced as a whole; a failed poll leaves the
/// previously committed values in place.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ControllerState {
    /// Controller temperature in Celsius.
    pub temperature: f64,

    /// Photovoltaic array voltage in volts.
    pub pv_voltage: f64,

    /// Photovoltaic array current in amps.
    pub pv_current: f64,

    /// Photovoltaic charging power in watts.
    pub pv_power: f64,

    /// Battery voltage in volts.
    pub battery_voltage: f64,

    /// Battery state of charge in percent.
    pub battery_soc: f64,

    /// Current flowing into the battery in amps.
    pub charging_current: f64,
}

/// Header row of the CSV log. Column order is fixed and must match
/// [`ControllerState::csv_row`].
pub const CSV_HEADER: &str = "temperature_in_celsius,pv_voltage,pv_current_in_amps,pv_power_in_watts,battery_voltage,battery_soc_in_percentage,charging_current_in_amps";

impl ControllerState {
    /// One CSV data row in the fixed column order of [`CSV_HEADER`].
    /// Values keep the default float formatting, no rounding applied.
    pub fn csv_row(&self) -> String {
        format!(
            "{},{},{},{},{},{},{}",
            self.temperature,
            self.pv_voltage,
            self.pv_current,
            self.pv_power,
            self.battery_voltage,
            self.battery_soc,
            self.charging_current,
        )
    }
}

impl fmt::Display for ControllerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "battery {:.1}V {:.0}% | charging {:.2}A | pv {:.1}V {:.2}A {:.0}W | temp {:.0}C",
            self.battery_voltage,
            self.battery_soc,
            self.charging_current,
            self.pv_voltage,
            self.pv_current,
            self.pv_power,
            self.temperature,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_row_matches_header_order() {
        let state = ControllerState {
            temperature: 25.0,
            pv_voltage: 18.4,
            pv_current: 0.95,
            pv_power: 17.0,
            battery_voltage: 13.2,
            battery_soc: 87.0,
            charging_current: 1.2,
        };

        assert_eq!(CSV_HEADER.split(',').count(), 7);
        assert_eq!(state.csv_row(), "25,18.4,0.95,17,13.2,87,1.2");
    }

    #[test]
    fn display_is_a_single_line() {
        let line = ControllerState::default().to_string();
        assert!(!line.contains('\n'));
        assert!(line.contains("battery"));
    }
}
