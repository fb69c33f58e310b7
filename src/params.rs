use serde::{Deserialize, Serialize};
use std::fmt;

/// Operating bands of one measurable engine/generator quantity.
///
/// Bands nest: `critical_low <= warning_low <= normal_min <= normal_max <= warning_high <= critical_high`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterSpec {
    pub key: &'static str,
    pub display_name: &'static str,
    pub unit: &'static str,
    pub normal_min: f64,
    pub normal_max: f64,
    pub warning_low: f64,
    pub warning_high: f64,
    pub critical_low: f64,
    pub critical_high: f64,
    pub description: &'static str,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeverityTier { Normal, Warning, Critical }

impl SeverityTier {
    pub fn as_str(&self) -> &'static str {
        match self { SeverityTier::Normal => "normal", SeverityTier::Warning => "warning", SeverityTier::Critical => "critical" }
    }
}

impl fmt::Display for SeverityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

const fn spec(key: &'static str, display_name: &'static str, unit: &'static str, normal: (f64, f64), warning: (f64, f64), critical: (f64, f64), description: &'static str) -> ParameterSpec {
    ParameterSpec {
        key,
        display_name,
        unit,
        normal_min: normal.0,
        normal_max: normal.1,
        warning_low: warning.0,
        warning_high: warning.1,
        critical_low: critical.0,
        critical_high: critical.1,
        description,
    }
}

static REGISTRY: [ParameterSpec; 12] = [
    spec("oilPressure", "Oil Pressure", "PSI", (30.0, 60.0), (20.0, 70.0), (15.0, 80.0), "Engine lubrication oil pressure"),
    spec("coolantTemp", "Coolant Temperature", "°C", (75.0, 95.0), (60.0, 100.0), (40.0, 105.0), "Engine cooling water temperature"),
    spec("batteryVoltage", "Battery Voltage", "V DC", (24.0, 28.0), (22.0, 30.0), (20.0, 32.0), "Starting battery voltage (24V system)"),
    spec("rpm", "Engine Speed", "RPM", (1480.0, 1520.0), (1450.0, 1550.0), (1400.0, 1600.0), "Engine rotational speed"),
    spec("frequency", "Output Frequency", "Hz", (49.5, 50.5), (49.0, 51.0), (47.0, 53.0), "Generator output frequency"),
    spec("voltageL1N", "Voltage L1-N", "V AC", (220.0, 240.0), (210.0, 250.0), (200.0, 260.0), "Phase to neutral voltage"),
    spec("voltageL1L2", "Voltage L1-L2", "V AC", (380.0, 420.0), (370.0, 430.0), (360.0, 440.0), "Phase to phase voltage"),
    spec("currentL1", "Current L1", "A", (0.0, 500.0), (0.0, 550.0), (0.0, 600.0), "Phase L1 current"),
    spec("loadPercent", "Load Percentage", "%", (30.0, 80.0), (10.0, 90.0), (5.0, 100.0), "Generator load percentage"),
    spec("powerFactor", "Power Factor", "", (0.85, 1.0), (0.75, 1.0), (0.65, 1.0), "Power factor (lagging/leading)"),
    spec("fuelLevel", "Fuel Level", "%", (30.0, 100.0), (20.0, 100.0), (10.0, 100.0), "Fuel tank level percentage"),
    spec("oilTemperature", "Oil Temperature", "°C", (70.0, 100.0), (50.0, 110.0), (30.0, 120.0), "Engine oil temperature"),
];

/// Every registered parameter, in form order.
pub fn all_specs() -> &'static [ParameterSpec] { &REGISTRY }

pub fn lookup(key: &str) -> Option<&'static ParameterSpec> { REGISTRY.iter().find(|s| s.key == key) }

/// Band test. Critical bounds are inclusive; a side whose critical bound equals its warning
/// bound has no critical band. Callers must filter non-finite values first.
pub fn classify(spec: &ParameterSpec, value: f64) -> SeverityTier {
    let critical_below = spec.critical_low < spec.warning_low && value <= spec.critical_low;
    let critical_above = spec.critical_high > spec.warning_high && value >= spec.critical_high;
    if critical_below || critical_above || value < spec.critical_low || value > spec.critical_high {
        SeverityTier::Critical
    } else if value < spec.warning_low || value > spec.warning_high {
        SeverityTier::Warning
    } else if value >= spec.normal_min && value <= spec.normal_max {
        SeverityTier::Normal
    } else {
        SeverityTier::Warning
    }
}

pub fn classify_key(key: &str, value: f64) -> Option<SeverityTier> {
    if !value.is_finite() { return None; }
    lookup(key).map(|s| classify(s, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_bands_are_nested() {
        for s in all_specs() {
            assert!(s.critical_low <= s.warning_low, "{}", s.key);
            assert!(s.warning_low <= s.normal_min, "{}", s.key);
            assert!(s.normal_min <= s.normal_max, "{}", s.key);
            assert!(s.normal_max <= s.warning_high, "{}", s.key);
            assert!(s.warning_high <= s.critical_high, "{}", s.key);
        }
    }

    #[test]
    fn oil_pressure_boundaries() {
        let s = lookup("oilPressure").unwrap();
        assert_eq!(classify(s, 14.999), SeverityTier::Critical);
        assert_eq!(classify(s, 15.0), SeverityTier::Critical);
        assert_eq!(classify(s, 19.999), SeverityTier::Warning);
        assert_eq!(classify(s, 29.999), SeverityTier::Warning);
        assert_eq!(classify(s, 30.0), SeverityTier::Normal);
        assert_eq!(classify(s, 60.0), SeverityTier::Normal);
        assert_eq!(classify(s, 65.0), SeverityTier::Warning);
        assert_eq!(classify(s, 80.0), SeverityTier::Critical);
        assert_eq!(classify(s, 95.0), SeverityTier::Critical);
    }

    #[test]
    fn collapsed_critical_side_is_not_critical() {
        let pf = lookup("powerFactor").unwrap();
        assert_eq!(classify(pf, 1.0), SeverityTier::Normal);
        assert_eq!(classify(pf, 1.02), SeverityTier::Critical);
        let cur = lookup("currentL1").unwrap();
        assert_eq!(classify(cur, 0.0), SeverityTier::Normal);
        let fuel = lookup("fuelLevel").unwrap();
        assert_eq!(classify(fuel, 100.0), SeverityTier::Normal);
        assert_eq!(classify(fuel, 10.0), SeverityTier::Critical);
    }

    #[test]
    fn tiers_are_ordered() {
        assert!(SeverityTier::Critical > SeverityTier::Warning);
        assert!(SeverityTier::Warning > SeverityTier::Normal);
    }

    #[test]
    fn classify_key_skips_unknown_and_nan() {
        assert_eq!(classify_key("oilPressure", f64::NAN), None);
        assert_eq!(classify_key("turboBoost", 10.0), None);
        assert_eq!(classify_key("frequency", 50.0), Some(SeverityTier::Normal));
    }
}
