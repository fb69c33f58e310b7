use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Fuel System")] FuelSystem,
    #[serde(rename = "Cooling System")] CoolingSystem,
    #[serde(rename = "Lubrication")] Lubrication,
    #[serde(rename = "Electrical")] Electrical,
    #[serde(rename = "Turbo/Air Intake")] TurboAirIntake,
    #[serde(rename = "ECM/Sensors")] EcmSensors,
    #[serde(rename = "Air Intake")] AirIntake,
    #[serde(rename = "Exhaust/Emissions")] ExhaustEmissions,
    #[serde(rename = "Engine")] Engine,
    #[serde(rename = "Generator")] Generator,
    #[serde(rename = "Starting System")] StartingSystem,
    #[serde(rename = "General")] General,
}

impl Category {
    pub const ALL: [Category; 12] = [
        Category::FuelSystem, Category::CoolingSystem, Category::Lubrication, Category::Electrical,
        Category::TurboAirIntake, Category::EcmSensors, Category::AirIntake, Category::ExhaustEmissions,
        Category::Engine, Category::Generator, Category::StartingSystem, Category::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::FuelSystem => "Fuel System",
            Category::CoolingSystem => "Cooling System",
            Category::Lubrication => "Lubrication",
            Category::Electrical => "Electrical",
            Category::TurboAirIntake => "Turbo/Air Intake",
            Category::EcmSensors => "ECM/Sensors",
            Category::AirIntake => "Air Intake",
            Category::ExhaustEmissions => "Exhaust/Emissions",
            Category::Engine => "Engine",
            Category::Generator => "Generator",
            Category::StartingSystem => "Starting System",
            Category::General => "General",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FaultSeverity { Info, Warning, Critical }

impl FaultSeverity {
    pub fn as_str(&self) -> &'static str {
        match self { FaultSeverity::Info => "info", FaultSeverity::Warning => "warning", FaultSeverity::Critical => "critical" }
    }
}

impl fmt::Display for FaultSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for FaultSeverity {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "info" => Ok(FaultSeverity::Info),
            "warning" | "warn" => Ok(FaultSeverity::Warning),
            "critical" | "crit" => Ok(FaultSeverity::Critical),
            other => Err(format!("unknown severity '{}' (expected info, warning or critical)", other)),
        }
    }
}

/// Matches when the text contains any of `any` and none of `none` (lower-case substrings).
#[derive(Clone, Copy, Debug)]
pub struct KeywordRule<T: 'static> {
    pub value: T,
    pub any: &'static [&'static str],
    pub none: &'static [&'static str],
}

impl<T: Copy> KeywordRule<T> {
    pub fn matches(&self, text_lower: &str) -> bool {
        self.any.iter().any(|k| text_lower.contains(k)) && !self.none.iter().any(|k| text_lower.contains(k))
    }
}

/// First rule that matches wins.
pub fn first_match<T: Copy>(rules: &[KeywordRule<T>], text: &str, fallback: T) -> T {
    let lower = text.to_lowercase();
    rules.iter().find(|r| r.matches(&lower)).map(|r| r.value).unwrap_or(fallback)
}

const fn rule<T>(value: T, any: &'static [&'static str]) -> KeywordRule<T> { KeywordRule { value, any, none: &[] } }

pub static CATEGORY_RULES: [KeywordRule<Category>; 11] = [
    rule(Category::FuelSystem, &["fuel", "injector"]),
    rule(Category::CoolingSystem, &["coolant", "temperature", "thermo"]),
    KeywordRule { value: Category::Lubrication, any: &["oil"], none: &["solenoid"] },
    rule(Category::Electrical, &["voltage", "current", "phase", "battery"]),
    rule(Category::TurboAirIntake, &["turbo", "boost"]),
    rule(Category::EcmSensors, &["sensor", "ecm", "ecu"]),
    rule(Category::AirIntake, &["air", "filter", "intake"]),
    rule(Category::ExhaustEmissions, &["exhaust", "dpf", "egr", "emission"]),
    rule(Category::Engine, &["engine", "crank", "cam", "compression"]),
    rule(Category::Generator, &["generator", "alternator", "avr"]),
    rule(Category::StartingSystem, &["start", "crank"]),
];

// "critical" outranks "sensor": a failed sensor reads as critical, not info.
pub static SEVERITY_RULES: [KeywordRule<FaultSeverity>; 3] = [
    rule(FaultSeverity::Critical, &["shutdown", "critical", "fail", "overheat", "overspeed", "low pressure"]),
    rule(FaultSeverity::Warning, &["high", "low", "fault"]),
    rule(FaultSeverity::Info, &["sensor", "check", "monitor"]),
];

pub fn categorize(text: &str) -> Category { first_match(&CATEGORY_RULES, text, Category::General) }

pub fn classify_severity(text: &str) -> FaultSeverity { first_match(&SEVERITY_RULES, text, FaultSeverity::Warning) }
