use serde::{Deserialize, Serialize};
use std::fmt;
use crate::classify::{Category, FaultSeverity};

pub const DEFAULT_CONTACT: &str = "a qualified generator technician";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticStep {
    pub step: u32,
    pub action: String,
    pub expected_result: String,
    pub tools: Vec<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty { Easy, Moderate, Advanced, Expert }

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self { Difficulty::Easy => "easy", Difficulty::Moderate => "moderate", Difficulty::Advanced => "advanced", Difficulty::Expert => "expert" })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Solution {
    pub difficulty: Difficulty,
    pub time_estimate: String,
    pub solution: String,
    pub tools: Vec<String>,
    pub parts: Vec<String>,
    pub cost: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Guidance {
    pub diagnostic_steps: Vec<DiagnosticStep>,
    pub solutions: Vec<Solution>,
    pub preventive_measures: Vec<String>,
    pub safety_warnings: Vec<String>,
    pub when_to_call_expert: String,
}

struct StepTemplate { action: &'static str, expected: &'static str, tools: &'static [&'static str] }

struct SolutionTemplate {
    difficulty: Difficulty,
    time: &'static str,
    text: &'static str,
    tools: &'static [&'static str],
    parts: &'static [&'static str],
    cost: &'static str,
}

struct GuidanceTemplate {
    steps: &'static [StepTemplate; 4],
    solutions: &'static [SolutionTemplate; 2],
    preventive: &'static [&'static str],
    hazards: &'static [&'static str],
    escalation: Option<&'static str>,
}

const fn step(action: &'static str, expected: &'static str, tools: &'static [&'static str]) -> StepTemplate {
    StepTemplate { action, expected, tools }
}

const fn sol(difficulty: Difficulty, time: &'static str, text: &'static str, tools: &'static [&'static str], parts: &'static [&'static str], cost: &'static str) -> SolutionTemplate {
    SolutionTemplate { difficulty, time, text, tools, parts, cost }
}

static RESET: SolutionTemplate = sol(
    Difficulty::Easy,
    "15-30 minutes",
    "Clear the fault code using diagnostic tool and restart the generator. Monitor for code return. If code does not return, log the incident and continue monitoring.",
    &["Diagnostic scanner"],
    &[],
    "$0 - Labor only",
);

const UNIVERSAL_PREVENTIVE: [&str; 3] = [
    "Follow manufacturer recommended maintenance intervals",
    "Keep detailed maintenance logs and records",
    "Train operators on proper startup and shutdown procedures",
];

const UNIVERSAL_SAFETY: [&str; 2] = ["Always follow lockout/tagout procedures before service", "Wear appropriate personal protective equipment"];

const ESCALATE_CRITICAL: &str = "immediately if this fault persists after basic troubleshooting. Critical faults can cause permanent equipment damage if not properly addressed.";
const ESCALATE_GENERIC: &str = "if fault persists after completing the troubleshooting steps above, or if you lack the required tools and expertise.";

static FUEL_STEPS: [StepTemplate; 4] = [
    step("Check fuel level in main tank and day tank", "Fuel level above minimum mark, no water or sediment visible", &["Flashlight", "Fuel sampling kit"]),
    step("Inspect primary and secondary fuel filters for restriction", "Filters clean, no excessive debris or water", &["Filter wrench", "Drain pan"]),
    step("Test fuel pressure at injection pump inlet", "Pressure within manufacturer specification (typically 3-7 PSI)", &["Fuel pressure gauge", "Service manual"]),
    step("Bleed fuel system to remove air", "No air bubbles in fuel lines, solid fuel flow", &["Bleed screw tool", "Clean rags"]),
];

static FUEL_SOLUTIONS: [SolutionTemplate; 2] = [
    sol(Difficulty::Moderate, "1-2 hours",
        "Replace primary and secondary fuel filters. Drain water separator. Bleed fuel system completely to remove all air. Check fuel supply lines for restrictions or damage. Verify fuel quality meets specification.",
        &["Filter wrench", "Drain pan", "Bleed tool", "Fuel sampling kit"], &["Primary fuel filter", "Secondary fuel filter", "Filter seals"], "$50-150"),
    sol(Difficulty::Advanced, "2-4 hours",
        "Test fuel transfer pump output pressure and flow rate. Inspect fuel injection pump timing and calibration. Check injector spray patterns and return flow. Clean or replace restricted components.",
        &["Fuel pressure gauge", "Flow meter", "Injector tester", "Timing tools"], &["Fuel pump", "Injector seals", "High-pressure lines"], "$200-800"),
];

static COOLING_STEPS: [StepTemplate; 4] = [
    step("Check coolant level when engine is cold", "Coolant at proper level in reservoir, no contamination", &["Flashlight"]),
    step("Inspect radiator and cooling fins for blockage", "Clear airflow through radiator, no debris or damage", &["Compressed air", "Soft brush"]),
    step("Test thermostat operation", "Thermostat opens at specified temperature (typically 82-88°C)", &["Thermometer", "Container with water"]),
    step("Pressure test cooling system", "System holds pressure (typically 15 PSI) for 10 minutes without drop", &["Cooling system pressure tester"]),
];

static COOLING_SOLUTIONS: [SolutionTemplate; 2] = [
    sol(Difficulty::Moderate, "1-2 hours",
        "Top up coolant to proper level with correct mixture (typically 50/50 antifreeze). Clean radiator fins with compressed air or low-pressure water. Inspect and tighten all hose clamps. Check fan belt tension and condition.",
        &["Coolant tester", "Compressed air", "Belt tension gauge"], &["Coolant", "Hose clamps", "Fan belt"], "$30-100"),
    sol(Difficulty::Advanced, "3-6 hours",
        "Replace thermostat with OEM-specification part. Flush entire cooling system to remove scale and deposits. Test and replace water pump if flow is insufficient. Inspect head gasket for coolant leaks.",
        &["Cooling system flush kit", "Pressure tester", "Gasket scraper"], &["Thermostat", "Water pump", "Gaskets", "Coolant"], "$150-500"),
];

static OIL_STEPS: [StepTemplate; 4] = [
    step("Check oil level on dipstick", "Oil level between MIN and MAX marks", &["Clean rag"]),
    step("Inspect oil for contamination (coolant, fuel, metal)", "Oil clean with proper color and consistency", &["Oil analysis kit", "White paper"]),
    step("Install mechanical oil pressure gauge at gallery port", "Pressure within specification: Idle 10-15 PSI, Full load 40-60 PSI", &["Mechanical oil pressure gauge", "Adapter fittings"]),
    step("Inspect oil filter and bypass valve", "Filter not restricted, bypass valve operating correctly", &["Filter wrench", "Drain pan"]),
];

static OIL_SOLUTIONS: [SolutionTemplate; 2] = [
    sol(Difficulty::Moderate, "1-2 hours",
        "Perform complete oil and filter change using manufacturer-specified oil grade. Inspect for external oil leaks. Check oil pressure sensor wiring and connections. Verify proper oil level after running.",
        &["Filter wrench", "Drain pan", "Torque wrench"], &["Engine oil (full capacity)", "Oil filter", "Drain plug gasket"], "$80-200"),
    sol(Difficulty::Advanced, "4-8 hours",
        "Remove and test oil pump for proper pressure output. Inspect main and rod bearing clearances with Plastigage. Check oil galleries for blockage. Replace oil pressure relief valve if stuck.",
        &["Oil pump tester", "Plastigage", "Micrometers", "Bore gauges"], &["Oil pump", "Bearings", "Relief valve", "Gaskets"], "$300-1500"),
];

static ELECTRICAL_STEPS: [StepTemplate; 4] = [
    step("Measure battery voltage", "12.6V (12V system) or 25.2V (24V system) with engine off", &["Digital multimeter"]),
    step("Check alternator/generator output voltage", "Within ±2% of rated voltage at all phases", &["True RMS multimeter", "Clamp ammeter"]),
    step("Inspect all electrical connections for corrosion or looseness", "All connections clean, tight, properly torqued", &["Torque wrench", "Contact cleaner"]),
    step("Test insulation resistance of windings", "Minimum 1 MΩ per 1000V of rating", &["Megohmmeter (Megger)"]),
];

static ELECTRICAL_SOLUTIONS: [SolutionTemplate; 2] = [
    sol(Difficulty::Moderate, "1-2 hours",
        "Clean and tighten all electrical connections. Apply dielectric grease to prevent corrosion. Check battery terminals and cables. Verify proper grounding at all points.",
        &["Wire brush", "Torque wrench", "Dielectric grease", "Multimeter"], &["Battery terminals", "Ground straps", "Connector seals"], "$20-80"),
    sol(Difficulty::Advanced, "2-4 hours",
        "Test and adjust AVR settings for proper voltage regulation. Check excitation circuit components. Verify rotating diode assembly in brushless generators. Repair or replace damaged windings.",
        &["AVR tester", "Megger", "Oscilloscope", "Soldering equipment"], &["AVR", "Diode assembly", "Brushes", "Capacitors"], "$150-600"),
];

static ECM_STEPS: [StepTemplate; 4] = [
    step("Connect diagnostic tool and retrieve fault codes", "All active and historical fault codes recorded", &["ECM diagnostic scanner", "Laptop with software"]),
    step("Check sensor wiring for damage, shorts, or opens", "Wiring intact with proper resistance values", &["Digital multimeter", "Wiring diagram"]),
    step("Verify sensor signal at ECM connector", "Signal within specified voltage/resistance range", &["Multimeter", "Breakout box"]),
    step("Compare sensor reading to known accurate reference", "Sensor reading matches reference within tolerance", &["Calibration equipment", "Reference sensor"]),
];

static ECM_SOLUTIONS: [SolutionTemplate; 2] = [
    sol(Difficulty::Moderate, "30 min - 1 hour",
        "Clean sensor and connector contacts with electrical cleaner. Check wiring harness for damage or chafing. Verify sensor mounting is secure. Apply dielectric grease to connections.",
        &["Electrical cleaner", "Dielectric grease", "Wire brush"], &["Connector seals", "Wire ties", "Loom tape"], "$10-50"),
    sol(Difficulty::Advanced, "1-3 hours",
        "Replace faulty sensor with OEM-specification replacement. Calibrate new sensor per manufacturer procedure. Update ECM software if available. Verify proper signal at ECM input.",
        &["Diagnostic software", "Calibration tools", "Multimeter"], &["Replacement sensor", "Wiring repair kit"], "$100-400"),
];

static AIR_STEPS: [StepTemplate; 4] = [
    step("Inspect air filter element", "Filter clean, no holes or damage, restriction indicator in green", &["Flashlight", "Replacement filter"]),
    step("Check intake and charge air piping for leaks", "All clamps tight, no holes or cracks in hoses", &["Boost leak tester", "Soapy water"]),
    step("Measure turbocharger boost pressure", "Boost pressure within specification at rated load", &["Boost pressure gauge", "Diagnostic scanner"]),
    step("Inspect turbocharger for shaft play and oil leaks", "Minimal shaft play, no oil in intake or exhaust housing", &["Flashlight", "Borescope"]),
];

static AIR_SOLUTIONS: [SolutionTemplate; 2] = [
    sol(Difficulty::Moderate, "30 min - 1 hour",
        "Replace air filter element. Clean air intake housing and ducting. Inspect and tighten all intake clamps. Check intake restriction indicator.",
        &["Screwdrivers", "Compressed air", "Inspection light"], &["Air filter element", "Intake gaskets"], "$30-100"),
    sol(Difficulty::Advanced, "4-8 hours",
        "Inspect turbocharger for shaft play and damage. Clean or replace wastegate actuator. Check charge air cooler for leaks. Verify boost pressure control system operation.",
        &["Boost leak tester", "Dial indicator", "Pressure gauges"], &["Turbocharger", "Wastegate actuator", "Charge air hoses"], "$500-2500"),
];

static EXHAUST_STEPS: [StepTemplate; 4] = [
    step("Check exhaust backpressure", "Backpressure within manufacturer limits (typically <3\" Hg)", &["Backpressure gauge", "Exhaust tap fitting"]),
    step("Inspect DPF soot loading level", "Soot level below regeneration threshold", &["Diagnostic scanner", "DPF pressure sensor readings"]),
    step("Test EGR valve operation", "Valve opens and closes on command, no carbon binding", &["Diagnostic scanner", "Vacuum gauge"]),
    step("Verify exhaust temperature sensors are accurate", "Sensor readings match actual temperatures within ±20°C", &["IR thermometer", "Diagnostic scanner"]),
];

static EXHAUST_SOLUTIONS: [SolutionTemplate; 2] = [
    sol(Difficulty::Moderate, "1-2 hours",
        "Perform forced DPF regeneration using diagnostic tool. Clean EGR valve and passages. Check exhaust system for leaks. Verify DEF fluid level and quality if equipped.",
        &["Diagnostic scanner", "Cleaning solvent", "Wire brush"], &["DEF fluid", "EGR gaskets", "Exhaust clamps"], "$50-200"),
    sol(Difficulty::Advanced, "4-8 hours",
        "Remove and clean or replace DPF. Replace EGR valve and cooler if clogged. Inspect and replace exhaust temperature sensors. Check SCR catalyst if equipped.",
        &["DPF cleaning equipment", "Exhaust tools", "Torque wrench"], &["DPF", "EGR valve", "Temperature sensors", "Gaskets"], "$500-3000"),
];

static ENGINE_STEPS: [StepTemplate; 4] = [
    step("Perform compression test on all cylinders", "All cylinders within 10% of each other, meeting minimum specification", &["Compression tester", "Engine barring tool"]),
    step("Check engine timing marks alignment", "All timing marks properly aligned per service manual", &["Timing light", "Service manual"]),
    step("Inspect valve clearances", "Clearances within specification", &["Feeler gauge set", "Valve adjustment tools"]),
    step("Listen for abnormal engine noises", "No knocking, rattling, or unusual sounds", &["Mechanics stethoscope", "Experienced ear"]),
];

static ENGINE_SOLUTIONS: [SolutionTemplate; 2] = [
    sol(Difficulty::Moderate, "1-2 hours",
        "Perform valve adjustment to proper clearance. Check and adjust injection timing. Inspect drive belts and tensioners. Verify all engine mounting bolts are secure.",
        &["Feeler gauges", "Timing tools", "Torque wrench"], &["Valve cover gaskets", "Drive belts", "Tensioners"], "$50-200"),
    sol(Difficulty::Expert, "8-24 hours",
        "Perform top-end overhaul including valve and injector service. Replace timing gears or chain if worn. Inspect crankshaft and camshaft bearings. Recondition cylinder head if necessary.",
        &["Engine stand", "Precision measuring tools", "Hydraulic press"], &["Gasket set", "Bearings", "Timing components", "Seals"], "$1000-5000"),
];

static GENERATOR_STEPS: [StepTemplate; 4] = [
    step("Measure output voltage at generator terminals", "Voltage within ±2% of rated output", &["True RMS multimeter"]),
    step("Check frequency/speed at no load and full load", "Frequency stable at 50/60 Hz ±0.5 Hz", &["Frequency meter", "Tachometer"]),
    step("Test AVR operation and settings", "AVR maintains stable voltage across load range", &["AVR test equipment", "Load bank"]),
    step("Inspect generator bearings and cooling", "Bearings smooth, no excessive heat, proper cooling airflow", &["Vibration analyzer", "IR thermometer"]),
];

static GENERATOR_SOLUTIONS: [SolutionTemplate; 2] = [
    sol(Difficulty::Moderate, "1-2 hours",
        "Clean generator cooling passages and air vents. Check brush wear and spring tension. Inspect slip rings for wear or damage. Verify bearing lubrication.",
        &["Compressed air", "Brush gauge", "Cleaning supplies"], &["Brushes", "Bearing grease", "Filters"], "$50-150"),
    sol(Difficulty::Advanced, "4-8 hours",
        "Replace worn brushes and slip rings. Test and replace AVR if faulty. Check stator and rotor windings for shorts or opens. Balance rotating assembly if vibration present.",
        &["Megger", "AVR tester", "Balancing equipment"], &["AVR", "Brushes", "Slip rings", "Bearings"], "$300-1500"),
];

static GENERIC_STEPS: [StepTemplate; 4] = [
    step("Record all displayed fault codes and operating parameters", "Complete list of fault codes with timestamps", &["Diagnostic scanner", "Notepad"]),
    step("Perform visual inspection of related components", "No obvious damage, leaks, or loose connections", &["Flashlight", "Inspection mirror"]),
    step("Check related sensor and actuator wiring", "All wiring intact with proper continuity", &["Digital multimeter", "Wiring diagram"]),
    step("Test component operation per service manual procedure", "Component operates within specification", &["Service manual", "Test equipment"]),
];

static GENERIC_SOLUTIONS: [SolutionTemplate; 2] = [
    sol(Difficulty::Moderate, "1-2 hours",
        "Inspect and clean all related components. Check wiring and connections. Verify sensor readings against specifications. Replace any worn or damaged parts identified.",
        &["Basic hand tools", "Multimeter", "Cleaning supplies"], &["Various depending on findings"], "$50-200"),
    sol(Difficulty::Advanced, "2-6 hours",
        "Perform comprehensive component testing per manufacturer service manual. Replace faulty components with OEM-specification parts. Verify proper operation after repair.",
        &["Manufacturer diagnostic tools", "Specialized equipment"], &["OEM replacement components"], "$200-1000"),
];

const FUEL_PREVENTIVE: &[&str] = &[
    "Change fuel filters at recommended intervals",
    "Use only clean, quality diesel fuel",
    "Keep fuel tanks full to minimize condensation",
    "Drain water separator weekly in humid climates",
];
const COOLING_PREVENTIVE: &[&str] = &[
    "Check coolant level daily before operation",
    "Test coolant concentration annually",
    "Flush cooling system every 2 years or per manufacturer schedule",
    "Inspect radiator for debris monthly",
];
const OIL_PREVENTIVE: &[&str] = &[
    "Check oil level daily before operation",
    "Change oil at manufacturer recommended intervals",
    "Use only approved oil grades and specifications",
    "Send oil samples for analysis every 250 hours",
];
const ELECTRICAL_PREVENTIVE: &[&str] = &[
    "Inspect electrical connections monthly",
    "Test battery condition quarterly",
    "Keep generator clean and dry",
    "Check ground connections annually",
];
const AIR_PREVENTIVE: &[&str] = &[
    "Replace air filter per manufacturer schedule",
    "Check air restriction indicator daily",
    "Inspect intake system monthly for leaks",
    "Allow proper cool-down before shutdown",
];

const FUEL_HAZARDS: &[&str] = &["Fuel is flammable - no smoking or open flames nearby", "Work in well-ventilated area", "Have fire extinguisher readily available"];
const COOLING_HAZARDS: &[&str] = &["Never remove radiator cap when hot - risk of severe burns", "Allow engine to cool before working on cooling system", "Coolant is toxic - dispose of properly"];
const OIL_HAZARDS: &[&str] = &["Hot oil can cause severe burns", "Dispose of used oil at approved collection point", "Clean up oil spills immediately - slip hazard"];
const ELECTRICAL_HAZARDS: &[&str] = &["Disconnect battery before working on electrical system", "Generator produces lethal voltages", "Never work on energized equipment"];
const EXHAUST_HAZARDS: &[&str] = &["Exhaust components are extremely hot", "Exhaust gases are toxic - ensure ventilation", "Turbocharger can cause severe burns"];

static FUEL: GuidanceTemplate = GuidanceTemplate {
    steps: &FUEL_STEPS, solutions: &FUEL_SOLUTIONS, preventive: FUEL_PREVENTIVE, hazards: FUEL_HAZARDS,
    escalation: Some("for injector testing and high-pressure fuel system work - specialized equipment required."),
};
static COOLING: GuidanceTemplate = GuidanceTemplate { steps: &COOLING_STEPS, solutions: &COOLING_SOLUTIONS, preventive: COOLING_PREVENTIVE, hazards: COOLING_HAZARDS, escalation: None };
static LUBRICATION: GuidanceTemplate = GuidanceTemplate { steps: &OIL_STEPS, solutions: &OIL_SOLUTIONS, preventive: OIL_PREVENTIVE, hazards: OIL_HAZARDS, escalation: None };
static ELECTRICAL: GuidanceTemplate = GuidanceTemplate { steps: &ELECTRICAL_STEPS, solutions: &ELECTRICAL_SOLUTIONS, preventive: ELECTRICAL_PREVENTIVE, hazards: ELECTRICAL_HAZARDS, escalation: None };
static TURBO_AIR: GuidanceTemplate = GuidanceTemplate {
    steps: &AIR_STEPS, solutions: &AIR_SOLUTIONS, preventive: AIR_PREVENTIVE, hazards: EXHAUST_HAZARDS,
    escalation: Some("for turbocharger rebuild or replacement - core exchange program available."),
};
static ECM: GuidanceTemplate = GuidanceTemplate {
    steps: &ECM_STEPS, solutions: &ECM_SOLUTIONS, preventive: &[], hazards: &[],
    escalation: Some("if you lack diagnostic software access or if ECM reprogramming is required."),
};
static AIR_INTAKE: GuidanceTemplate = GuidanceTemplate { steps: &AIR_STEPS, solutions: &AIR_SOLUTIONS, preventive: AIR_PREVENTIVE, hazards: &[], escalation: None };
static EXHAUST: GuidanceTemplate = GuidanceTemplate { steps: &EXHAUST_STEPS, solutions: &EXHAUST_SOLUTIONS, preventive: &[], hazards: EXHAUST_HAZARDS, escalation: None };
static ENGINE: GuidanceTemplate = GuidanceTemplate { steps: &ENGINE_STEPS, solutions: &ENGINE_SOLUTIONS, preventive: &[], hazards: &[], escalation: None };
static GENERATOR: GuidanceTemplate = GuidanceTemplate {
    steps: &GENERATOR_STEPS, solutions: &GENERATOR_SOLUTIONS, preventive: &[], hazards: &[],
    escalation: Some("for winding repairs or AVR calibration - requires specialized test equipment."),
};
static GENERIC: GuidanceTemplate = GuidanceTemplate { steps: &GENERIC_STEPS, solutions: &GENERIC_SOLUTIONS, preventive: &[], hazards: &[], escalation: None };

fn template_for(category: Category) -> &'static GuidanceTemplate {
    match category {
        Category::FuelSystem => &FUEL,
        Category::CoolingSystem => &COOLING,
        Category::Lubrication => &LUBRICATION,
        Category::Electrical => &ELECTRICAL,
        Category::TurboAirIntake => &TURBO_AIR,
        Category::EcmSensors => &ECM,
        Category::AirIntake => &AIR_INTAKE,
        Category::ExhaustEmissions => &EXHAUST,
        Category::Engine => &ENGINE,
        Category::Generator => &GENERATOR,
        Category::StartingSystem | Category::General => &GENERIC,
    }
}

fn owned(xs: &[&str]) -> Vec<String> { xs.iter().map(|s| s.to_string()).collect() }

fn to_solution(t: &SolutionTemplate) -> Solution {
    Solution { difficulty: t.difficulty, time_estimate: t.time.to_string(), solution: t.text.to_string(), tools: owned(t.tools), parts: owned(t.parts), cost: t.cost.to_string() }
}

/// Builds repair guidance for a (category, severity) pair from the per-category templates.
#[derive(Clone, Debug)]
pub struct GuidanceSynthesizer { contact: String }

impl Default for GuidanceSynthesizer {
    fn default() -> Self { Self::new(DEFAULT_CONTACT) }
}

impl GuidanceSynthesizer {
    pub fn new(contact: impl Into<String>) -> Self {
        let contact = contact.into();
        let contact = if contact.trim().is_empty() { DEFAULT_CONTACT.to_string() } else { contact.trim().to_string() };
        Self { contact }
    }

    pub fn contact(&self) -> &str { &self.contact }

    pub fn synthesize(&self, category: Category, severity: FaultSeverity) -> Guidance {
        let t = template_for(category);
        let diagnostic_steps = t.steps.iter().enumerate().map(|(i, s)| DiagnosticStep {
            step: i as u32 + 1,
            action: s.action.to_string(),
            expected_result: s.expected.to_string(),
            tools: owned(s.tools),
        }).collect();
        let solutions = std::iter::once(&RESET).chain(t.solutions.iter()).map(to_solution).collect();
        let mut preventive_measures = owned(&UNIVERSAL_PREVENTIVE);
        preventive_measures.extend(owned(t.preventive));
        let mut safety_warnings = owned(&UNIVERSAL_SAFETY);
        safety_warnings.extend(owned(t.hazards));
        safety_warnings.push(format!("If unsure, contact {}", self.contact));
        let tail = if severity == FaultSeverity::Critical { ESCALATE_CRITICAL } else { t.escalation.unwrap_or(ESCALATE_GENERIC) };
        Guidance { diagnostic_steps, solutions, preventive_measures, safety_warnings, when_to_call_expert: format!("Contact {} {}", self.contact, tail) }
    }
}
