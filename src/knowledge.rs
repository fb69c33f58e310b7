use std::collections::HashMap;
use std::sync::OnceLock;
use serde::{Deserialize, Serialize};
use crate::params::{ParameterSpec, SeverityTier};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticContent {
    pub message: String,
    pub possible_causes: Vec<String>,
    pub immediate_actions: Vec<String>,
    pub long_term_fixes: Vec<String>,
    pub related_parameters: Vec<String>,
}

fn strs(xs: &[&str]) -> Vec<String> { xs.iter().map(|s| s.to_string()).collect() }

impl DiagnosticContent {
    fn new(message: String) -> Self { Self { message, ..Default::default() } }
    fn causes(mut self, xs: &[&str]) -> Self { self.possible_causes = strs(xs); self }
    fn actions(mut self, xs: &[&str]) -> Self { self.immediate_actions = strs(xs); self }
    fn fixes(mut self, xs: &[&str]) -> Self { self.long_term_fixes = strs(xs); self }
    fn related(mut self, xs: &[&str]) -> Self { self.related_parameters = strs(xs); self }
}

pub type TemplateFn = fn(f64, &ParameterSpec) -> DiagnosticContent;

#[derive(Clone, Copy)]
pub struct TierTemplates {
    pub normal: TemplateFn,
    pub warning: TemplateFn,
    pub critical: TemplateFn,
}

impl TierTemplates {
    pub fn for_tier(&self, tier: SeverityTier) -> TemplateFn {
        match tier { SeverityTier::Normal => self.normal, SeverityTier::Warning => self.warning, SeverityTier::Critical => self.critical }
    }
}

static KNOWLEDGE: OnceLock<HashMap<&'static str, TierTemplates>> = OnceLock::new();

fn build_knowledge() -> HashMap<&'static str, TierTemplates> {
    let mut m: HashMap<&'static str, TierTemplates> = HashMap::new();
    m.insert("oilPressure", TierTemplates { normal: oil_pressure_normal, warning: oil_pressure_warning, critical: oil_pressure_critical });
    m.insert("coolantTemp", TierTemplates { normal: coolant_normal, warning: coolant_warning, critical: coolant_critical });
    m.insert("batteryVoltage", TierTemplates { normal: battery_normal, warning: battery_warning, critical: battery_critical });
    m.insert("frequency", TierTemplates { normal: frequency_normal, warning: frequency_warning, critical: frequency_critical });
    let voltage = TierTemplates { normal: voltage_normal, warning: voltage_warning, critical: voltage_critical };
    m.insert("voltageL1N", voltage);
    m.insert("voltageL1L2", voltage);
    m.insert("loadPercent", TierTemplates { normal: load_normal, warning: load_warning, critical: load_critical });
    m.insert("powerFactor", TierTemplates { normal: pf_normal, warning: pf_warning, critical: pf_critical });
    m.insert("fuelLevel", TierTemplates { normal: fuel_normal, warning: fuel_warning, critical: fuel_critical });
    m
}

pub const GENERIC: TierTemplates = TierTemplates { normal: generic_normal, warning: generic_warning, critical: generic_critical };

/// Templates for a parameter key; keys without specific knowledge get the generic set.
pub fn templates_for(key: &str) -> TierTemplates {
    KNOWLEDGE.get_or_init(build_knowledge).get(key).copied().unwrap_or(GENERIC)
}

pub fn has_specific_knowledge(key: &str) -> bool { KNOWLEDGE.get_or_init(build_knowledge).contains_key(key) }

pub fn lookup_content(key: &str, tier: SeverityTier, value: f64, spec: &ParameterSpec) -> DiagnosticContent {
    (templates_for(key).for_tier(tier))(value, spec)
}

fn spaced(value: f64, spec: &ParameterSpec) -> String {
    if spec.unit.is_empty() { format!("{}", value) } else { format!("{} {}", value, spec.unit) }
}

fn tight(value: f64, spec: &ParameterSpec) -> String { format!("{}{}", value, spec.unit) }

fn is_low(value: f64, spec: &ParameterSpec) -> bool { value < spec.normal_min }

fn generic_normal(v: f64, s: &ParameterSpec) -> DiagnosticContent {
    DiagnosticContent::new(format!("NORMAL: {} at {} is within operating range.", s.display_name, spaced(v, s)))
        .actions(&["No action required"])
}

fn generic_warning(v: f64, s: &ParameterSpec) -> DiagnosticContent {
    DiagnosticContent::new(format!("WARNING: {} at {} is outside normal range.", s.display_name, spaced(v, s)))
        .causes(&["Sensor drift", "Operating condition variation"])
        .actions(&["Monitor and investigate if persists"])
        .fixes(&["Calibrate sensor", "Review operating conditions"])
}

fn generic_critical(v: f64, s: &ParameterSpec) -> DiagnosticContent {
    DiagnosticContent::new(format!("CRITICAL: {} at {} is at critical level.", s.display_name, spaced(v, s)))
        .causes(&["System fault", "Sensor failure", "Operating condition extreme"])
        .actions(&["Investigate immediately", "Consider shutdown if safety risk"])
        .fixes(&["Full system inspection", "Component replacement if needed"])
}

fn oil_pressure_normal(v: f64, s: &ParameterSpec) -> DiagnosticContent {
    DiagnosticContent::new(format!("NORMAL: Oil pressure at {} is within optimal operating range.", spaced(v, s)))
        .actions(&["No action required - continue monitoring"])
}

fn oil_pressure_warning(v: f64, s: &ParameterSpec) -> DiagnosticContent {
    if is_low(v, s) {
        DiagnosticContent::new(format!("WARNING: Oil pressure at {} is below normal. Monitor closely and investigate cause.", spaced(v, s)))
            .causes(&["Oil level slightly low", "Oil becoming thin due to overheating or dilution", "Sender calibration drift", "Normal for hot idle on some engines"])
            .actions(&["Check oil level and top up if needed", "Monitor oil temperature", "Verify reading with mechanical gauge if available"])
            .fixes(&["Consider oil and filter change", "Investigate any oil consumption issues", "Check sender calibration"])
            .related(&["oilTemperature", "rpm"])
    } else {
        DiagnosticContent::new(format!("WARNING: Oil pressure at {} is above normal. Possible relief valve or sensor issue.", spaced(v, s)))
            .causes(&["Oil pressure relief valve stuck closed", "Faulty oil pressure sender reading high", "Oil too thick for temperature (wrong grade)", "Cold start - pressure will normalize as oil warms"])
            .actions(&["Allow engine to warm up and recheck", "Verify reading with mechanical gauge", "Check oil grade matches specification"])
            .fixes(&["Inspect and clean relief valve", "Replace sender if faulty", "Change to correct oil grade"])
            .related(&["oilTemperature"])
    }
}

fn oil_pressure_critical(v: f64, s: &ParameterSpec) -> DiagnosticContent {
    if is_low(v, s) {
        DiagnosticContent::new(format!("CRITICAL: Oil pressure at {} is dangerously low. STOP ENGINE IMMEDIATELY to prevent catastrophic damage.", spaced(v, s)))
            .causes(&[
                "Low oil level in sump - check dipstick immediately",
                "Faulty oil pressure sender - verify with mechanical gauge",
                "Worn engine bearings allowing excessive oil bypass",
                "Failed or failing oil pump - insufficient pressure generation",
                "Stuck-open pressure relief valve - oil bypassing to sump",
                "Severely clogged oil filter restricting flow",
                "Oil diluted with fuel or coolant reducing viscosity",
            ])
            .actions(&[
                "STOP ENGINE IMMEDIATELY - do not attempt restart",
                "Check oil level on dipstick - add oil if low",
                "Install mechanical gauge to verify actual pressure",
                "Inspect for visible oil leaks under engine",
                "Check oil condition - smell for fuel, look for milky appearance",
            ])
            .fixes(&[
                "Replace oil pressure sender if reading is false",
                "Perform complete oil and filter change with correct grade",
                "Inspect oil pump drive and replace pump if worn",
                "Check relief valve operation and replace spring if weak",
                "If bearing knock present, engine rebuild required",
            ])
            .related(&["oilTemperature", "coolantTemp", "rpm"])
    } else {
        DiagnosticContent::new(format!("CRITICAL: Oil pressure at {} is far above normal. Risk of burst filter or seal failure.", spaced(v, s)))
            .causes(&["Oil pressure relief valve stuck closed", "Blocked oil gallery or filter bypass failure", "Faulty oil pressure sender reading high", "Oil far too thick for operating temperature"])
            .actions(&["Reduce load and stop engine if pressure keeps rising", "Verify reading with mechanical gauge", "Inspect oil filter housing and seals for leaks"])
            .fixes(&["Service or replace relief valve", "Replace sender if faulty", "Change to correct oil grade"])
            .related(&["oilTemperature", "rpm"])
    }
}

fn coolant_normal(v: f64, s: &ParameterSpec) -> DiagnosticContent {
    DiagnosticContent::new(format!("NORMAL: Coolant temperature at {} is within optimal operating range.", spaced(v, s)))
        .actions(&["No action required - continue monitoring"])
}

fn coolant_warning(v: f64, s: &ParameterSpec) -> DiagnosticContent {
    if is_low(v, s) {
        DiagnosticContent::new(format!("WARNING: Coolant temperature at {} is low. Engine may not be at operating temperature.", spaced(v, s)))
            .causes(&["Thermostat stuck open - never reaching operating temp", "Recent cold start - still warming up", "Very low ambient temperature", "Temperature sender fault"])
            .actions(&["Allow engine to warm up under light load", "Check that thermostat is installed", "Verify sender is reading correctly"])
            .fixes(&["Replace thermostat if stuck open", "Consider engine block heater in cold climates"])
            .related(&["oilTemperature"])
    } else {
        DiagnosticContent::new(format!("WARNING: Coolant temperature at {} is elevated. Reduce load and investigate.", spaced(v, s)))
            .causes(&["High ambient temperature", "Heavy load on generator", "Cooling system needs maintenance", "Low coolant level"])
            .actions(&["Reduce generator load if possible", "Check coolant level", "Verify fan is operating", "Inspect radiator for blockage"])
            .fixes(&["Service cooling system", "Consider load management", "Improve ventilation around generator"])
            .related(&["loadPercent", "oilTemperature"])
    }
}

fn coolant_critical(v: f64, s: &ParameterSpec) -> DiagnosticContent {
    if is_low(v, s) {
        DiagnosticContent::new(format!("CRITICAL: Coolant temperature at {} is far below operating range. Engine cannot reach working temperature.", spaced(v, s)))
            .causes(&["Thermostat missing or stuck fully open", "Temperature sender open circuit", "Block heater failed in cold climate", "Engine running unloaded in very low ambient"])
            .actions(&["Verify temperature with an infrared thermometer", "Avoid applying full load until engine warms", "Check sender wiring for open circuit"])
            .fixes(&["Replace thermostat", "Replace temperature sender if reading is false", "Install or repair block heater"])
            .related(&["oilTemperature", "loadPercent"])
    } else {
        DiagnosticContent::new(format!("CRITICAL: Coolant temperature at {} is dangerously high. ENGINE DAMAGE IMMINENT. STOP ENGINE.", spaced(v, s)))
            .causes(&[
                "Low coolant level - check expansion tank and radiator",
                "Cooling fan not running - check belt, motor, or thermal switch",
                "Thermostat stuck closed - blocking coolant flow",
                "Radiator blocked externally with debris",
                "Radiator blocked internally with scale or corrosion",
                "Failed water pump - impeller worn or shaft broken",
                "Head gasket failure - combustion gases in cooling system",
                "Air trapped in cooling system after service",
            ])
            .actions(&[
                "STOP ENGINE IMMEDIATELY to prevent damage",
                "DO NOT open radiator cap while hot - severe burn risk",
                "Allow engine to cool for at least 30-60 minutes",
                "Check for visible coolant leaks",
                "Verify cooling fan rotation when engine is hot",
            ])
            .fixes(&[
                "Top up coolant with correct mixture when cool",
                "Replace thermostat if stuck",
                "Clean or replace radiator if blocked",
                "Replace water pump if failed",
                "Head gasket test if combustion gas contamination suspected",
            ])
            .related(&["oilTemperature", "loadPercent", "rpm"])
    }
}

fn battery_normal(v: f64, s: &ParameterSpec) -> DiagnosticContent {
    DiagnosticContent::new(format!("NORMAL: Battery voltage at {} is within optimal range.", spaced(v, s)))
        .actions(&["No action required - charging system operating correctly"])
}

fn battery_warning(v: f64, s: &ParameterSpec) -> DiagnosticContent {
    if is_low(v, s) {
        DiagnosticContent::new(format!("WARNING: Battery voltage at {} is low. Charging system may not be keeping up.", spaced(v, s)))
            .causes(&["Alternator output low", "High electrical load", "Battery beginning to fail", "Belt slipping on alternator"])
            .actions(&["Check W terminal/charge lamp indicator", "Verify alternator belt tension", "Measure charging voltage at battery"])
            .fixes(&["Service or replace alternator", "Load test battery and replace if needed", "Check belt and tensioner"])
            .related(&["rpm"])
    } else {
        DiagnosticContent::new(format!("WARNING: Battery voltage at {} is high. Overcharging may damage battery.", spaced(v, s)))
            .causes(&["Voltage regulator failed - overcharging", "Wrong battery type installed", "Sensor or meter error"])
            .actions(&["Check for battery boiling or swelling", "Verify reading with separate multimeter", "Check voltage regulator output"])
            .fixes(&["Replace voltage regulator if faulty", "Verify correct battery specification"])
    }
}

fn battery_critical(v: f64, s: &ParameterSpec) -> DiagnosticContent {
    if is_low(v, s) {
        DiagnosticContent::new(format!("CRITICAL: Battery voltage at {} is critically low. Engine may not start.", spaced(v, s)))
            .causes(&["Battery discharged or failed", "Charging system not working - alternator fault", "Loose or corroded battery connections", "Parasitic drain when engine stopped", "Battery past end of life"])
            .actions(&["Check battery connections - clean and tighten", "Attempt jump start or use battery charger", "Check battery age - replace if over 3-5 years", "Verify charging when engine running"])
            .fixes(&["Replace battery if cells are weak", "Test and replace alternator if not charging", "Install battery maintenance charger", "Check for parasitic drains in electrical system"])
            .related(&["rpm"])
    } else {
        DiagnosticContent::new(format!("CRITICAL: Battery voltage at {} is dangerously high. Battery and controller damage likely.", spaced(v, s)))
            .causes(&["Charger or voltage regulator failed in full-output mode", "Wrong battery configuration on a 24V system", "Sensor or meter error"])
            .actions(&["Disconnect the battery charger", "Check for battery boiling, swelling or gassing", "Verify reading with separate multimeter"])
            .fixes(&["Replace voltage regulator or charger", "Verify battery bank wiring and specification"])
    }
}

fn frequency_normal(v: f64, s: &ParameterSpec) -> DiagnosticContent {
    DiagnosticContent::new(format!("NORMAL: Output frequency at {} is within specification.", spaced(v, s)))
        .actions(&["No action required - governor maintaining stable frequency"])
}

fn frequency_warning(v: f64, s: &ParameterSpec) -> DiagnosticContent {
    DiagnosticContent::new(format!("WARNING: Output frequency at {} is outside normal tolerance.", spaced(v, s)))
        .causes(&["Governor needs adjustment", "Load changes faster than governor response", "Minor speed sensor issue"])
        .actions(&["Monitor RPM stability", "Check governor droop/isochronous setting", "Reduce sudden load changes if possible"])
        .fixes(&["Tune governor parameters", "Service governor actuator", "Consider load sequencing"])
        .related(&["rpm", "loadPercent"])
}

fn frequency_critical(v: f64, s: &ParameterSpec) -> DiagnosticContent {
    DiagnosticContent::new(format!("CRITICAL: Output frequency at {} is severely out of specification. Connected equipment at risk.", spaced(v, s)))
        .causes(&["Governor malfunction - not controlling engine speed", "Severe load changes overwhelming governor", "Engine underpowered for load", "Fuel supply problem affecting engine speed", "Speed sensor fault giving wrong feedback"])
        .actions(&["Check engine RPM - frequency tracks speed", "Reduce load immediately", "Check governor actuator operation", "Verify fuel supply and pressure"])
        .fixes(&["Calibrate or replace governor/actuator", "Service speed sensor", "Review load versus generator capacity", "Check fuel system completely"])
        .related(&["rpm", "loadPercent"])
}

fn voltage_normal(v: f64, s: &ParameterSpec) -> DiagnosticContent {
    DiagnosticContent::new(format!("NORMAL: Voltage at {} is within optimal range.", spaced(v, s)))
        .actions(&["No action required - AVR maintaining stable voltage"])
}

fn voltage_warning(v: f64, s: &ParameterSpec) -> DiagnosticContent {
    DiagnosticContent::new(format!("WARNING: Voltage at {} is outside normal range. Monitor and adjust.", spaced(v, s)))
        .causes(&["AVR needs adjustment", "Load power factor affecting voltage", "Sensing circuit calibration drift"])
        .actions(&["Adjust AVR voltage setpoint if accessible", "Check power factor of load", "Monitor for further drift"])
        .fixes(&["Professional AVR calibration", "Correct power factor with capacitors if needed"])
        .related(&["powerFactor", "loadPercent"])
}

fn voltage_critical(v: f64, s: &ParameterSpec) -> DiagnosticContent {
    if is_low(v, s) {
        DiagnosticContent::new(format!("CRITICAL: Voltage at {} is dangerously low. Equipment malfunction likely.", spaced(v, s)))
            .causes(&["AVR (Automatic Voltage Regulator) failure", "Exciter winding fault", "Loss of sensing voltage to AVR", "Severe overload causing voltage collapse", "Generator winding partial failure"])
            .actions(&["Check AVR connections and sensing inputs", "Reduce load immediately", "Check exciter field voltage", "Verify generator is not overloaded"])
            .fixes(&["Replace AVR if faulty", "Service exciter and main generator windings", "Review load versus generator rating"])
            .related(&["loadPercent", "currentL1", "powerFactor"])
    } else {
        DiagnosticContent::new(format!("CRITICAL: Voltage at {} is dangerously high. Equipment damage risk.", spaced(v, s)))
            .causes(&["AVR over-exciting generator", "AVR voltage setpoint too high", "Loss of voltage sensing causing AVR to over-excite", "AVR failure in high-output mode"])
            .actions(&["Stop generator if voltage excessive", "Check AVR settings and sensing", "Verify sensing circuit connections"])
            .fixes(&["Recalibrate or replace AVR", "Verify sensing transformer ratios", "Check all sensing circuit components"])
            .related(&["loadPercent", "powerFactor"])
    }
}

fn load_normal(v: f64, s: &ParameterSpec) -> DiagnosticContent {
    DiagnosticContent::new(format!("NORMAL: Generator load at {} is within optimal operating range.", tight(v, s)))
        .actions(&["No action required - generator operating at healthy load level"])
}

fn load_warning(v: f64, s: &ParameterSpec) -> DiagnosticContent {
    if is_low(v, s) {
        DiagnosticContent::new(format!("WARNING: Generator load at {} is very low. Engine may wet stack.", tight(v, s)))
            .causes(&["Minimal connected load", "Generator oversized for application", "Load shifted to another source"])
            .actions(&["If continuous low load, consider periodic loading", "Check for wet stacking signs (black exhaust, carbon buildup)"])
            .fixes(&["Apply load bank periodically", "Review if smaller generator appropriate", "Implement minimum load controls"])
            .related(&["coolantTemp"])
    } else {
        DiagnosticContent::new(format!("WARNING: Generator load at {} is high. Monitor engine parameters closely.", tight(v, s)))
            .causes(&["Approaching generator capacity", "Power factor may be causing high kVA"])
            .actions(&["Monitor engine temperature and oil pressure", "Be ready to shed loads if parameters deteriorate", "Check power factor - correct if low"])
            .fixes(&["Review connected loads", "Plan for future load growth", "Consider power factor correction"])
            .related(&["coolantTemp", "oilTemperature", "powerFactor"])
    }
}

fn load_critical(v: f64, s: &ParameterSpec) -> DiagnosticContent {
    if is_low(v, s) {
        DiagnosticContent::new(format!("CRITICAL: Generator load at {} is negligible. Extended running will wet stack the engine.", tight(v, s)))
            .causes(&["Load transferred back to utility without stopping generator", "Transfer switch stuck in generator position with no load", "CT wiring fault giving false low reading"])
            .actions(&["Stop the generator if no load is required", "Check transfer switch position", "Verify CT wiring and programming"])
            .fixes(&["Apply load bank to burn off deposits", "Implement minimum load controls", "Review transfer switch sequencing"])
            .related(&["coolantTemp", "currentL1"])
    } else {
        DiagnosticContent::new(format!("CRITICAL: Generator load at {} exceeds rating. Immediate action required.", tight(v, s)))
            .causes(&["Actual load exceeds generator capacity", "Motor starting inrush not accounted for", "Additional loads connected since sizing", "CT ratio incorrect giving false high reading"])
            .actions(&["Shed non-essential loads immediately", "Check for stuck motors or short circuits", "Verify CT programming matches actual CTs", "Listen for engine struggling under load"])
            .fixes(&["Conduct proper load study", "Consider generator upsizing", "Implement load shedding scheme", "Add soft starters to large motors"])
            .related(&["frequency", "voltageL1N", "coolantTemp"])
    }
}

fn pf_normal(v: f64, s: &ParameterSpec) -> DiagnosticContent {
    DiagnosticContent::new(format!("NORMAL: Power factor at {} is good. Generator operating efficiently.", spaced(v, s)))
        .actions(&["No action required - power factor optimal"])
}

fn pf_warning(v: f64, s: &ParameterSpec) -> DiagnosticContent {
    DiagnosticContent::new(format!("WARNING: Power factor at {} is below optimal. Generator output limited.", spaced(v, s)))
        .causes(&["Inductive loads dominating", "PF correction insufficient", "Lighting ballasts or motor loads"])
        .actions(&["Monitor current versus kW", "Generator can deliver less kW at lower PF"])
        .fixes(&["Add or adjust PF correction", "Review motor starting impact"])
        .related(&["currentL1", "loadPercent"])
}

fn pf_critical(v: f64, s: &ParameterSpec) -> DiagnosticContent {
    if is_low(v, s) {
        DiagnosticContent::new(format!("CRITICAL: Power factor at {} is very poor. Generator capacity severely limited.", spaced(v, s)))
            .causes(&["Large inductive loads (motors, transformers) without correction", "Incorrect power factor capacitors", "Variable frequency drives causing harmonics", "Unbalanced or nonlinear loads"])
            .actions(&["Identify major inductive loads", "Check existing PF capacitors if installed", "May need to derate generator for low PF"])
            .fixes(&["Install power factor correction capacitors", "Size capacitors for actual load profile", "Consider active PF correction for variable loads"])
            .related(&["loadPercent", "currentL1"])
    } else {
        DiagnosticContent::new(format!("CRITICAL: Power factor reading of {} is above unity. Metering is unreliable.", spaced(v, s)))
            .causes(&["CT polarity reversed", "CT or VT phase mismatch in controller configuration", "Controller metering fault"])
            .actions(&["Do not rely on kW or PF readings until corrected", "Check CT orientation and phase wiring"])
            .fixes(&["Correct CT polarity", "Recommission controller metering configuration"])
            .related(&["currentL1", "voltageL1N"])
    }
}

fn fuel_normal(v: f64, s: &ParameterSpec) -> DiagnosticContent {
    DiagnosticContent::new(format!("NORMAL: Fuel level at {} is adequate.", tight(v, s)))
        .actions(&["No action required - fuel supply sufficient"])
}

fn fuel_warning(v: f64, s: &ParameterSpec) -> DiagnosticContent {
    DiagnosticContent::new(format!("WARNING: Fuel level at {} is low. Plan for refueling soon.", tight(v, s)))
        .causes(&["Normal consumption", "Increased usage above planned"])
        .actions(&["Schedule fuel delivery", "Estimate remaining run time", "Check fuel consumption rate"])
        .fixes(&["Improve fuel monitoring", "Adjust delivery schedule"])
}

fn fuel_critical(v: f64, s: &ParameterSpec) -> DiagnosticContent {
    if is_low(v, s) {
        DiagnosticContent::new(format!("CRITICAL: Fuel level at {} is critically low. REFUEL IMMEDIATELY.", tight(v, s)))
            .causes(&["Fuel consumed during operation", "Fuel leak from tank or lines", "Fuel theft", "Fuel sender fault giving false low reading"])
            .actions(&["Arrange immediate fuel delivery", "Check for fuel leaks under tank and lines", "Calculate run time remaining and plan accordingly"])
            .fixes(&["Implement fuel monitoring system", "Set up automatic refueling schedule", "Install fuel tank level switch with alarm"])
    } else {
        DiagnosticContent::new(format!("CRITICAL: Fuel level reading of {} exceeds tank capacity. Level sender fault.", tight(v, s)))
            .causes(&["Fuel level sender shorted or miscalibrated", "Tank overfilled during delivery"])
            .actions(&["Check tank level with a dipstick", "Inspect tank vent and overflow for spillage"])
            .fixes(&["Recalibrate or replace fuel level sender"])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{classify, lookup};

    #[test]
    fn every_specific_entry_covers_every_tier() {
        for key in ["oilPressure", "coolantTemp", "batteryVoltage", "frequency", "voltageL1N", "voltageL1L2", "loadPercent", "powerFactor", "fuelLevel"] {
            assert!(has_specific_knowledge(key), "{}", key);
            let s = lookup(key).unwrap();
            for (v, tier) in [(s.normal_min, SeverityTier::Normal), (s.warning_low, SeverityTier::Warning), (s.critical_low - 1.0, SeverityTier::Critical)] {
                let c = lookup_content(key, tier, v, s);
                assert!(c.message.starts_with(&tier.as_str().to_uppercase()), "{} {}", key, c.message);
            }
        }
    }

    #[test]
    fn low_oil_pressure_says_stop_engine() {
        let s = lookup("oilPressure").unwrap();
        let c = lookup_content("oilPressure", classify(s, 12.0), 12.0, s);
        assert!(c.message.contains("STOP ENGINE"));
        assert!(c.message.contains("12 PSI"));
        assert_eq!(c.related_parameters, vec!["oilTemperature", "coolantTemp", "rpm"]);
    }

    #[test]
    fn high_coolant_says_stop_engine() {
        let s = lookup("coolantTemp").unwrap();
        let c = lookup_content("coolantTemp", SeverityTier::Critical, 110.0, s);
        assert!(c.message.contains("STOP ENGINE"));
        assert!(c.immediate_actions.iter().any(|a| a.contains("radiator cap")));
    }

    #[test]
    fn generic_templates_vary_only_by_tier() {
        assert!(!has_specific_knowledge("rpm"));
        let s = lookup("rpm").unwrap();
        let n = lookup_content("rpm", SeverityTier::Normal, 1500.0, s);
        assert_eq!(n.immediate_actions, vec!["No action required"]);
        assert!(n.possible_causes.is_empty());
        let w = lookup_content("rpm", SeverityTier::Warning, 1460.0, s);
        assert_eq!(w.immediate_actions, vec!["Monitor and investigate if persists"]);
        let c = lookup_content("rpm", SeverityTier::Critical, 1700.0, s);
        assert!(c.immediate_actions.contains(&"Consider shutdown if safety risk".to_string()));
        assert!(c.message.contains("Engine Speed at 1700 RPM"));
    }

    #[test]
    fn percent_readings_have_no_space() {
        let s = lookup("fuelLevel").unwrap();
        let c = lookup_content("fuelLevel", SeverityTier::Critical, 5.0, s);
        assert!(c.message.contains("5%"));
        assert!(c.message.contains("REFUEL IMMEDIATELY"));
    }
}
